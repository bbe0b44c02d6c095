use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::SteamError;
use crate::acf::{KvValue, parse_keyvalues};

const LIBRARY_FOLDERS_KEY: &str = "libraryfolders";
const LEGACY_LIBRARY_FOLDERS_KEY: &str = "LibraryFolders";

/// Provides access to Steam directory paths.
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Creates a new `Paths` instance with auto-detected Steam directory.
    pub fn new() -> Result<Self, SteamError> {
        let base_dir = get_base_dir()?;
        Ok(Self { base_dir })
    }

    /// Creates a new `Paths` instance with a custom base directory.
    pub fn with_base(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Returns the Steam base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the steamapps directory of the base installation.
    pub fn steamapps_dir(&self) -> PathBuf {
        self.base_dir.join("steamapps")
    }

    /// Returns the path to libraryfolders.vdf.
    pub fn library_folders_path(&self) -> PathBuf {
        self.steamapps_dir().join("libraryfolders.vdf")
    }

    /// Returns the library folders registered with this installation.
    pub fn library_folders(&self) -> Result<Vec<PathBuf>, SteamError> {
        library_folders(&self.base_dir)
    }
}

/// Reads `<steam_dir>/steamapps/libraryfolders.vdf` and returns every
/// library folder listed in it, ordered by index.
///
/// Handles both the current layout (numbered sections with a `path`
/// value) and the legacy one (numbered keys mapping directly to a path).
/// A missing file yields an empty list.
pub fn library_folders(steam_dir: &Path) -> Result<Vec<PathBuf>, SteamError> {
    let path = Paths::with_base(steam_dir).library_folders_path();
    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(SteamError::Io(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };

    let text = String::from_utf8_lossy(&data);
    let values = parse_keyvalues(&text, LIBRARY_FOLDERS_KEY)
        .or_else(|_| parse_keyvalues(&text, LEGACY_LIBRARY_FOLDERS_KEY))?;

    let mut numbered: Vec<(u32, PathBuf)> = values
        .iter()
        .filter_map(|(key, value)| {
            let index = key.parse::<u32>().ok()?;
            let raw = match value {
                KvValue::Text(path) => path.as_str(),
                KvValue::Section(section) => section.get("path")?.as_str()?,
            };
            Some((index, PathBuf::from(unescape(raw))))
        })
        .collect();
    numbered.sort_by_key(|(index, _)| *index);

    debug!(path = %path.display(), count = numbered.len(), "read library folders");
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

/// Collapses VDF escaped backslashes (`\\`) into single ones.
fn unescape(raw: &str) -> String {
    raw.replace("\\\\", "\\")
}

// Platform-specific base directory detection.
#[cfg(target_os = "linux")]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    crate::paths_linux::get_base_dir()
}

#[cfg(target_os = "windows")]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    crate::paths_windows::get_base_dir()
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    Err(SteamError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_with_base() {
        let paths = Paths::with_base("/tmp/steam");
        assert_eq!(paths.base_dir(), Path::new("/tmp/steam"));
        assert_eq!(paths.steamapps_dir(), PathBuf::from("/tmp/steam/steamapps"));
        assert_eq!(
            paths.library_folders_path(),
            PathBuf::from("/tmp/steam/steamapps/libraryfolders.vdf")
        );
    }

    #[test]
    fn library_folders_current_layout() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("steamapps")).unwrap();
        fs::write(
            tmp.path().join("steamapps").join("libraryfolders.vdf"),
            r#""libraryfolders"
{
	"0"
	{
		"path"		"/home/user/.local/share/Steam"
		"label"		""
		"apps"
		{
			"228980"		"29212173"
		}
	}
	"1"
	{
		"path"		"/mnt/games/SteamLibrary"
	}
}
"#,
        )
        .unwrap();

        let folders = library_folders(tmp.path()).unwrap();
        assert_eq!(
            folders,
            vec![
                PathBuf::from("/home/user/.local/share/Steam"),
                PathBuf::from("/mnt/games/SteamLibrary"),
            ]
        );
    }

    #[test]
    fn library_folders_legacy_layout() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("steamapps")).unwrap();
        fs::write(
            tmp.path().join("steamapps").join("libraryfolders.vdf"),
            "\"LibraryFolders\"\n{\n\t\"TimeNextStatsReport\"\t\t\"1\"\n\t\"1\"\t\t\"D:\\\\SteamLibrary\"\n}\n",
        )
        .unwrap();

        let folders = library_folders(tmp.path()).unwrap();
        assert_eq!(folders, vec![PathBuf::from("D:\\SteamLibrary")]);
    }

    #[test]
    fn library_folders_bad_header() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("steamapps")).unwrap();
        fs::write(
            tmp.path().join("steamapps").join("libraryfolders.vdf"),
            "\"something\"\n{\n}\n",
        )
        .unwrap();

        assert!(matches!(
            library_folders(tmp.path()),
            Err(SteamError::MalformedHeader(_))
        ));
    }

    #[test]
    fn library_folders_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(library_folders(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn unescape_backslashes() {
        assert_eq!(unescape("C:\\\\Games\\\\Steam"), "C:\\Games\\Steam");
        assert_eq!(unescape("/plain/path"), "/plain/path");
    }
}

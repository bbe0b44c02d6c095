//! Steam library roots.
//!
//! A library root is a directory holding a `steamapps/` folder with one
//! `appmanifest_<appid>.acf` per installed title.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::acf::{AppManifest, load_app_manifest};

const MANIFEST_PREFIX: &str = "appmanifest_";
const MANIFEST_SUFFIX: &str = ".acf";

/// One Steam installation root.
///
/// Validity is computed once at construction. Re-check a root by
/// constructing a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRoot {
    path: PathBuf,
    valid: bool,
}

impl LibraryRoot {
    /// Creates a library root, normalizing the path and checking that it
    /// is an existing directory.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = normalize_path(path.as_ref());
        let valid = path.is_dir();
        Self { path, valid }
    }

    /// Returns the normalized root path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if the root existed as a directory when constructed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns `<root>/steamapps`.
    pub fn steamapps_dir(&self) -> PathBuf {
        self.path.join("steamapps")
    }

    /// Returns `<root>/steamapps/common`.
    pub fn common_dir(&self) -> PathBuf {
        self.steamapps_dir().join("common")
    }

    /// Returns the absolute install path for a manifest's `installdir`.
    pub fn install_path(&self, installdir: &str) -> PathBuf {
        self.common_dir().join(installdir)
    }

    /// Lists manifest files directly under `steamapps/`, sorted by appid.
    ///
    /// The appid comes from the file name, not the manifest body.
    pub fn manifest_files(&self) -> Vec<(u32, PathBuf)> {
        let dir = self.steamapps_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %dir.display(), "library has no steamapps directory");
                return Vec::new();
            }
            Err(e) => {
                if self.valid {
                    warn!(path = %dir.display(), error = %e, "cannot list steamapps directory");
                }
                return Vec::new();
            }
        };

        let mut files: Vec<(u32, PathBuf)> = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let appid = manifest_appid(&entry.file_name().to_string_lossy())?;
                Some((appid, entry.path()))
            })
            .collect();

        files.sort_by_key(|(appid, _)| *appid);
        debug!(path = %dir.display(), count = files.len(), "listed app manifests");
        files
    }

    /// Returns every manifest appid found in this library, ascending.
    ///
    /// Includes manifests that would be filtered out by [`manifests`](Self::manifests).
    pub fn appids(&self) -> Vec<u32> {
        self.manifest_files()
            .into_iter()
            .map(|(appid, _)| appid)
            .collect()
    }

    /// Parses manifests lazily, yielding only complete ones.
    ///
    /// Each item is keyed by the file name appid. Files with a malformed
    /// header are logged and skipped; incomplete manifests are skipped
    /// silently.
    pub fn manifests(&self) -> impl Iterator<Item = (u32, AppManifest)> {
        self.manifest_files()
            .into_iter()
            .filter_map(|(appid, path)| match load_app_manifest(&path) {
                Ok(manifest) if manifest.is_complete() => Some((appid, manifest)),
                Ok(_) => None,
                Err(e) => {
                    warn!(appid, path = %path.display(), error = %e, "skipping app manifest");
                    None
                }
            })
    }
}

/// Extracts the appid from an `appmanifest_<digits>.acf` file name.
pub fn manifest_appid(file_name: &str) -> Option<u32> {
    let digits = file_name
        .strip_prefix(MANIFEST_PREFIX)?
        .strip_suffix(MANIFEST_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Normalizes a library path for comparison: redundant separators and
/// `.` components are dropped, the trailing separator is stripped.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.components().collect()
}

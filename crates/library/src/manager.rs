//! Library manager: scans Steam library roots and reconciles them with
//! the game registry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use savekeep_games::GameRegistry;
use savekeep_settings::SettingsStore;
use savekeep_steam::{AppManifest, LibraryRoot, Paths, normalize_path};
use tracing::{debug, info, warn};

use crate::error::LibraryError;
use crate::ignore::IgnoreList;

/// Settings section for Steam options.
pub const SETTINGS_SECTION: &str = "steam";
/// String list of library root paths.
pub const LIBRARIES_KEY: &str = "libraries";
/// Flag: overwrite game names from manifests when reconciling.
pub const UPDATE_NAMES_KEY: &str = "update_names";
/// Ignore list file name in the state directory.
pub const IGNORE_FILE_NAME: &str = "ignore_steamapps.conf";

/// Outcome of [`LibraryManager::add_library`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryAdd {
    Added,
    /// The path is not an existing directory.
    Invalid,
    /// A root with the same normalized path is already present.
    Duplicate,
}

/// An installed title and the library it was found in.
#[derive(Debug, Clone)]
pub struct InstalledApp<'a> {
    pub manifest: AppManifest,
    pub library: &'a LibraryRoot,
}

impl InstalledApp<'_> {
    /// Returns `<library>/steamapps/common/<installdir>`.
    pub fn install_path(&self) -> PathBuf {
        self.library
            .install_path(self.manifest.installdir().unwrap_or_default())
    }
}

/// A manifest whose embedded appid differs from its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppidMismatch {
    /// Appid from the `appmanifest_<appid>.acf` file name.
    pub appid: u32,
    /// Appid from the manifest body, if it parsed.
    pub embedded: Option<u32>,
    pub name: String,
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Ids of games that changed and were saved.
    pub updated: Vec<String>,
    /// Ids of games that changed but failed to save.
    pub failed: Vec<String>,
    pub mismatches: Vec<AppidMismatch>,
}

/// Owns the Steam library roots and the ignore list.
pub struct LibraryManager {
    roots: Vec<LibraryRoot>,
    ignore: IgnoreList,
    ignore_path: PathBuf,
    settings: Box<dyn SettingsStore>,
}

impl LibraryManager {
    /// Loads library roots from `settings` and the ignore list from
    /// `state_dir`.
    ///
    /// Stored roots that no longer exist or repeat are dropped from the
    /// in-memory list; the stored list is left as is until membership
    /// changes.
    pub fn load(settings: Box<dyn SettingsStore>, state_dir: &Path) -> Result<Self, LibraryError> {
        let ignore_path = state_dir.join(IGNORE_FILE_NAME);
        let ignore = IgnoreList::load(&ignore_path)?;

        let mut manager = Self {
            roots: Vec::new(),
            ignore,
            ignore_path,
            settings,
        };

        for path in manager.settings.string_list(SETTINGS_SECTION, LIBRARIES_KEY) {
            match manager.push_root(Path::new(&path)) {
                LibraryAdd::Added => {}
                LibraryAdd::Invalid => warn!(path = %path, "configured steam library does not exist"),
                LibraryAdd::Duplicate => debug!(path = %path, "duplicate steam library in settings"),
            }
        }

        debug!(
            libraries = manager.roots.len(),
            ignored = manager.ignore.len(),
            "library manager loaded"
        );
        Ok(manager)
    }

    /// Returns the library roots in the order they were added.
    pub fn libraries(&self) -> &[LibraryRoot] {
        &self.roots
    }

    /// Returns true if a root with the same normalized path is present.
    pub fn has_library(&self, path: impl AsRef<Path>) -> bool {
        let path = normalize_path(path.as_ref());
        self.roots.iter().any(|root| root.path() == path)
    }

    /// Adds a library root and persists the library list.
    ///
    /// Invalid and duplicate paths change nothing and are not errors.
    pub fn add_library(&mut self, path: impl AsRef<Path>) -> Result<LibraryAdd, LibraryError> {
        let outcome = self.push_root(path.as_ref());
        if outcome == LibraryAdd::Added {
            info!(path = %path.as_ref().display(), "added steam library");
            self.save_libraries()?;
        }
        Ok(outcome)
    }

    /// Removes a library root and persists the library list.
    ///
    /// Returns the removed root, or `None` if no root matched.
    pub fn remove_library(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<Option<LibraryRoot>, LibraryError> {
        let path = normalize_path(path.as_ref());
        let Some(index) = self.roots.iter().position(|root| root.path() == path) else {
            return Ok(None);
        };
        let root = self.roots.remove(index);
        info!(path = %root.path().display(), "removed steam library");
        self.save_libraries()?;
        Ok(Some(root))
    }

    /// Adds the detected Steam installation and every library folder it
    /// lists. Returns how many roots were added.
    pub fn add_detected_libraries(&mut self) -> Result<usize, LibraryError> {
        let paths = Paths::new()?;
        self.add_libraries_from(&paths)
    }

    /// Adds `paths`' base directory and its library folders.
    pub fn add_libraries_from(&mut self, paths: &Paths) -> Result<usize, LibraryError> {
        let mut candidates = vec![paths.base_dir().to_path_buf()];
        match paths.library_folders() {
            Ok(folders) => candidates.extend(folders),
            Err(e) => {
                warn!(path = %paths.library_folders_path().display(), error = %e, "cannot read library folders")
            }
        }

        let added = candidates
            .iter()
            .filter(|path| self.push_root(path) == LibraryAdd::Added)
            .count();
        if added > 0 {
            info!(added, "added detected steam libraries");
            self.save_libraries()?;
        }
        Ok(added)
    }

    pub fn ignore_list(&self) -> &IgnoreList {
        &self.ignore
    }

    /// Ignores an appid and saves the ignore list.
    pub fn ignore_app(&mut self, appid: u32) -> Result<bool, LibraryError> {
        let added = self.ignore.add(appid);
        if added {
            self.ignore.save(&self.ignore_path)?;
        }
        Ok(added)
    }

    /// Stops ignoring an appid and saves the ignore list.
    pub fn unignore_app(&mut self, appid: u32) -> Result<bool, LibraryError> {
        let removed = self.ignore.remove(appid);
        if removed {
            self.ignore.save(&self.ignore_path)?;
        }
        Ok(removed)
    }

    /// Returns every complete installed app, keyed by file name appid.
    ///
    /// Libraries are scanned in the order they were added; when several
    /// report the same appid the last one wins.
    pub fn all_apps(&self) -> BTreeMap<u32, InstalledApp<'_>> {
        let mut apps = BTreeMap::new();
        for library in &self.roots {
            for (appid, manifest) in library.manifests() {
                apps.insert(appid, InstalledApp { manifest, library });
            }
        }
        apps
    }

    /// Installed apps whose appid is indexed by the registry.
    pub fn registered_apps(&self, registry: &GameRegistry) -> BTreeMap<u32, InstalledApp<'_>> {
        self.all_apps()
            .into_iter()
            .filter(|(appid, _)| registry.has_steam_appid(*appid))
            .collect()
    }

    /// Installed apps neither indexed by the registry nor ignored.
    pub fn unregistered_apps(&self, registry: &GameRegistry) -> BTreeMap<u32, InstalledApp<'_>> {
        self.all_apps()
            .into_iter()
            .filter(|(appid, _)| !registry.has_steam_appid(*appid) && !self.ignore.contains(*appid))
            .collect()
    }

    /// Pushes install paths, and names if `update_name` is set, from
    /// installed apps into the registered games that match them.
    ///
    /// Only games whose fields changed are saved. A failed save is logged
    /// and reported; the pass continues with the remaining games.
    pub fn reconcile(&self, registry: &mut GameRegistry, update_name: bool) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for (appid, app) in self.all_apps() {
            let Some(game) = registry.by_steam_appid_mut(appid) else {
                continue;
            };

            let name = app.manifest.name().unwrap_or_default();
            let embedded = app.manifest.appid();
            if embedded != Some(appid) {
                warn!(appid, embedded = ?embedded, name, "app manifest appid does not match its file name");
                report.mismatches.push(AppidMismatch {
                    appid,
                    embedded,
                    name: name.to_string(),
                });
            }

            let mut changed = false;

            let install_path = app.install_path();
            if game.installdir.as_deref() != Some(install_path.as_path()) {
                game.installdir = Some(install_path);
                changed = true;
            }

            if update_name && game.name != name {
                game.name = name.to_string();
                changed = true;
            }

            if !changed {
                continue;
            }

            let id = game.id().to_string();
            match registry.save(&id) {
                Ok(()) => {
                    debug!(id = %id, appid, "updated game from steam library");
                    report.updated.push(id);
                }
                Err(e) => {
                    warn!(id = %id, appid, error = %e, "failed to save reconciled game");
                    report.failed.push(id);
                }
            }
        }

        report
    }

    /// Appends a root if it is valid and not yet present.
    fn push_root(&mut self, path: &Path) -> LibraryAdd {
        let root = LibraryRoot::new(path);
        if !root.is_valid() {
            return LibraryAdd::Invalid;
        }
        if self.roots.iter().any(|r| r.path() == root.path()) {
            return LibraryAdd::Duplicate;
        }
        self.roots.push(root);
        LibraryAdd::Added
    }

    /// Writes the library list to settings, sorted by path.
    fn save_libraries(&mut self) -> Result<(), LibraryError> {
        let mut paths: Vec<String> = self
            .roots
            .iter()
            .map(|root| root.path().to_string_lossy().into_owned())
            .collect();
        paths.sort();
        self.settings
            .set_string_list(SETTINGS_SECTION, LIBRARIES_KEY, paths);
        self.settings.save()?;
        Ok(())
    }
}

//! Application directory layout.
//!
//! Everything lives under `<config dir>/savekeep/`:
//! `settings.json`, `games/` (one definition file per game) and
//! `state/` (user state such as the Steam ignore list).

use std::path::{Path, PathBuf};

use crate::SettingsError;

/// Name of the application directory under the config dir.
pub const APP_DIR_NAME: &str = "savekeep";

/// Resolved application directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    base_dir: PathBuf,
}

impl AppDirs {
    /// Resolves the directories under the platform config dir.
    pub fn new() -> Result<Self, SettingsError> {
        let config = config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::with_base(config.join(APP_DIR_NAME)))
    }

    /// Uses `base_dir` as the application directory.
    pub fn with_base(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    /// Directory holding game definition files.
    pub fn games_dir(&self) -> PathBuf {
        self.base_dir.join("games")
    }

    /// Directory holding user state files.
    pub fn state_dir(&self) -> PathBuf {
        self.base_dir.join("state")
    }

    /// Creates the games and state directories.
    pub fn ensure(&self) -> Result<(), SettingsError> {
        std::fs::create_dir_all(self.games_dir())?;
        std::fs::create_dir_all(self.state_dir())?;
        Ok(())
    }
}

/// Returns the platform-specific config directory.
fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

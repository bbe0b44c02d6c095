//! Settings store and application directories.
//!
//! [`SettingsStore`] is the configuration accessor the rest of the
//! workspace depends on; [`JsonSettings`] is the file-backed
//! implementation. [`AppDirs`] locates the settings file, the game
//! definitions directory and the user state directory.

mod dirs;
mod store;

pub use dirs::{APP_DIR_NAME, AppDirs};
pub use store::{JsonSettings, SettingValue, SettingsStore};

/// Errors from settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config directory not available")]
    NoConfigDir,
}

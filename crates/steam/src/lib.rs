pub mod acf;
pub mod library;
pub mod paths;
#[cfg(target_os = "linux")]
mod paths_linux;
#[cfg(target_os = "windows")]
mod paths_windows;

// Re-export primary types.
pub use acf::{AppManifest, KeyValues, KvValue, load_app_manifest, parse_app_manifest, parse_keyvalues};
pub use library::{LibraryRoot, manifest_appid, normalize_path};
pub use paths::{Paths, library_folders};

/// Errors for Steam operations.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("steam installation not found")]
    NotFound,

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("I/O error: {0}")]
    Io(String),
}

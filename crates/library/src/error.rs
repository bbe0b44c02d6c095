//! Library error types.

use savekeep_settings::SettingsError;
use savekeep_steam::SteamError;

/// Errors produced by library management.
///
/// Scanning and reconciliation never fail as a whole; these come from
/// persisting library membership or the ignore list.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("steam error: {0}")]
    Steam(#[from] SteamError),
}

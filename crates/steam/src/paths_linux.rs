use std::path::PathBuf;

use crate::SteamError;

/// Returns the Steam base directory on Linux.
pub(crate) fn get_base_dir() -> Result<PathBuf, SteamError> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or(SteamError::NotFound)?;

    let candidates = [
        home.join(".steam").join("steam"),
        home.join(".local").join("share").join("Steam"),
        // Flatpak
        home.join(".var")
            .join("app")
            .join("com.valvesoftware.Steam")
            .join(".steam")
            .join("steam"),
    ];

    candidates
        .into_iter()
        .find(|dir| dir.join("steamapps").is_dir())
        .ok_or(SteamError::NotFound)
}

use std::path::PathBuf;

use crate::SteamError;

/// Returns the Steam base directory on Windows using the registry.
pub(crate) fn get_base_dir() -> Result<PathBuf, SteamError> {
    // Per-user install path first, then the machine-wide keys.
    if let Ok(path) = read_user_registry() {
        return Ok(path);
    }

    if let Ok(path) = read_machine_registry(r"SOFTWARE\Wow6432Node\Valve\Steam") {
        return Ok(path);
    }

    read_machine_registry(r"SOFTWARE\Valve\Steam")
}

fn read_user_registry() -> Result<PathBuf, SteamError> {
    use winreg::RegKey;
    use winreg::enums::HKEY_CURRENT_USER;

    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let key = hkcu
        .open_subkey(r"Software\Valve\Steam")
        .map_err(|_| SteamError::NotFound)?;
    let steam_path: String = key.get_value("SteamPath").map_err(|_| SteamError::NotFound)?;
    Ok(PathBuf::from(steam_path))
}

fn read_machine_registry(subkey: &str) -> Result<PathBuf, SteamError> {
    use winreg::RegKey;
    use winreg::enums::HKEY_LOCAL_MACHINE;

    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    let key = hklm.open_subkey(subkey).map_err(|_| SteamError::NotFound)?;
    let install_path: String = key
        .get_value("InstallPath")
        .map_err(|_| SteamError::NotFound)?;
    Ok(PathBuf::from(install_path))
}

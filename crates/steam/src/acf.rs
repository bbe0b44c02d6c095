//! Text KeyValues parser for Steam `.acf` and `.vdf` files.
//!
//! The format is line oriented: a quoted root key, then quoted keys,
//! quoted values and braces, one token group per line. Parsing is
//! tolerant: lines that match no known shape are skipped.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::SteamError;

/// Root key of an app manifest.
pub const APP_STATE_KEY: &str = "AppState";

/// Key injected into every parsed manifest, holding the library root.
pub const LIBRARY_PATH_KEY: &str = "LibraryPath";

/// A section of key/value pairs.
pub type KeyValues = BTreeMap<String, KvValue>;

/// A value in a KeyValues document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvValue {
    Text(String),
    Section(KeyValues),
}

impl KvValue {
    /// Returns the text if this is a plain value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KvValue::Text(s) => Some(s.as_str()),
            KvValue::Section(_) => None,
        }
    }

    /// Returns the nested section if this is one.
    pub fn as_section(&self) -> Option<&KeyValues> {
        match self {
            KvValue::Text(_) => None,
            KvValue::Section(s) => Some(s),
        }
    }
}

/// Parses a KeyValues document whose root key must be `root_key`.
///
/// Returns the contents of the root section. Anything after the root
/// section closes is ignored. A document that ends before the root
/// closes yields whatever was read so far.
pub fn parse_keyvalues(text: &str, root_key: &str) -> Result<KeyValues, SteamError> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let header = lines
        .next()
        .ok_or_else(|| SteamError::MalformedHeader("empty document".into()))?;

    let rest = header
        .strip_prefix('"')
        .and_then(|h| h.strip_prefix(root_key))
        .and_then(|h| h.strip_prefix('"'))
        .ok_or_else(|| {
            SteamError::MalformedHeader(format!("expected root key \"{root_key}\", got `{header}`"))
        })?;

    match rest.trim() {
        "{" => {}
        "" => {
            if lines.next() != Some("{") {
                return Err(SteamError::MalformedHeader(format!(
                    "missing opening brace for \"{root_key}\""
                )));
            }
        }
        other => {
            return Err(SteamError::MalformedHeader(format!(
                "unexpected `{other}` after \"{root_key}\""
            )));
        }
    }

    let mut stack: Vec<(String, KeyValues)> = vec![(root_key.to_string(), KeyValues::new())];
    let mut last_key = String::new();

    for line in lines {
        if line == "{" {
            stack.push((std::mem::take(&mut last_key), KeyValues::new()));
            continue;
        }

        if line == "}" {
            let Some((key, section)) = stack.pop() else {
                break;
            };
            match stack.last_mut() {
                Some((_, parent)) => {
                    parent.insert(key, KvValue::Section(section));
                }
                None => return Ok(section),
            }
            continue;
        }

        let tokens: Vec<&str> = line.split('"').collect();
        match tokens.as_slice() {
            [_, key, tail] => {
                if tail.trim_start().starts_with('{') {
                    stack.push(((*key).to_string(), KeyValues::new()));
                } else {
                    last_key = (*key).to_string();
                }
            }
            [_, key, _, value, _] => {
                if let Some((_, top)) = stack.last_mut() {
                    top.insert((*key).to_string(), KvValue::Text((*value).to_string()));
                }
            }
            _ => {}
        }
    }

    debug!(root_key, depth = stack.len(), "document ended before root section closed");
    Ok(fold_sections(stack))
}

/// Closes every open section into its parent and returns the root.
fn fold_sections(mut stack: Vec<(String, KeyValues)>) -> KeyValues {
    while let Some((key, section)) = stack.pop() {
        match stack.last_mut() {
            Some((_, parent)) => {
                parent.insert(key, KvValue::Section(section));
            }
            None => return section,
        }
    }
    KeyValues::new()
}

/// A decoded `appmanifest_<appid>.acf` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppManifest {
    values: KeyValues,
    library_path: PathBuf,
}

impl AppManifest {
    /// Returns the app ID embedded in the manifest body.
    pub fn appid(&self) -> Option<u32> {
        self.text("appid").and_then(|s| s.parse().ok())
    }

    /// Returns the display name.
    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    /// Returns the install directory, relative to `steamapps/common`.
    pub fn installdir(&self) -> Option<&str> {
        self.text("installdir")
    }

    /// Returns the library root this manifest was read from.
    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    /// Returns a raw top-level value.
    pub fn get(&self, key: &str) -> Option<&KvValue> {
        self.values.get(key)
    }

    /// Returns every top-level value, `LibraryPath` included.
    pub fn values(&self) -> &KeyValues {
        &self.values
    }

    /// True when `appid`, `name` and `installdir` are all present and non-empty.
    pub fn is_complete(&self) -> bool {
        ["appid", "name", "installdir"]
            .iter()
            .all(|key| self.text(key).is_some())
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(KvValue::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Parses app manifest text read from `manifest_path`.
///
/// The library path is the directory two levels above the manifest
/// (`<library>/steamapps/appmanifest_<appid>.acf`).
pub fn parse_app_manifest(text: &str, manifest_path: &Path) -> Result<AppManifest, SteamError> {
    let mut values = parse_keyvalues(text, APP_STATE_KEY)?;

    let library_path = manifest_path
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default();

    values.insert(
        LIBRARY_PATH_KEY.to_string(),
        KvValue::Text(library_path.to_string_lossy().into_owned()),
    );

    Ok(AppManifest {
        values,
        library_path,
    })
}

/// Reads and parses an app manifest file.
pub fn load_app_manifest(path: &Path) -> Result<AppManifest, SteamError> {
    let data = fs::read(path)
        .map_err(|e| SteamError::Io(format!("failed to read {}: {e}", path.display())))?;
    parse_app_manifest(&String::from_utf8_lossy(&data), path)
}

//! Persisted list of Steam appids excluded from reconciliation.
//!
//! File format: one appid per line. Empty lines and lines starting with
//! `#` are skipped; lines that are not integers are logged and skipped.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::LibraryError;

/// Sorted set of ignored Steam appids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    appids: BTreeSet<u32>,
}

impl IgnoreList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an ignore list file. A missing file gives an empty list.
    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = std::fs::read(path)?;
        let list = Self::parse(&String::from_utf8_lossy(&data));
        debug!(path = %path.display(), count = list.len(), "loaded ignore list");
        Ok(list)
    }

    /// Parses ignore list text. Never fails; bad lines are logged.
    pub fn parse(text: &str) -> Self {
        let mut appids = BTreeSet::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.parse::<u32>() {
                Ok(appid) => {
                    appids.insert(appid);
                }
                Err(e) => {
                    warn!(line = index + 1, content = line, error = %e, "skipping ignore list entry");
                }
            }
        }
        Self { appids }
    }

    /// Writes one appid per line, ascending, replacing the file.
    ///
    /// The list goes to a temporary sibling first and is renamed over the
    /// target.
    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut content = String::new();
        for appid in &self.appids {
            content.push_str(&appid.to_string());
            content.push('\n');
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;

        debug!(path = %path.display(), count = self.appids.len(), "saved ignore list");
        Ok(())
    }

    /// Adds an appid. Returns false if it was already present.
    pub fn add(&mut self, appid: u32) -> bool {
        self.appids.insert(appid)
    }

    /// Removes an appid. Returns false if it was not present.
    pub fn remove(&mut self, appid: u32) -> bool {
        self.appids.remove(&appid)
    }

    pub fn contains(&self, appid: u32) -> bool {
        self.appids.contains(&appid)
    }

    /// Returns every ignored appid, ascending.
    pub fn all(&self) -> Vec<u32> {
        self.appids.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.appids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appids.is_empty()
    }
}

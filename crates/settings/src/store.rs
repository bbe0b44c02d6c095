//! Key-value settings grouped in sections.
//!
//! Stored as JSON: `{"section": {"key": "value" | ["a", "b"]}}`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::SettingsError;

/// A single setting: plain text or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Text(String),
    List(Vec<String>),
}

/// Configuration accessor.
///
/// Values are addressed by `(section, key)`. Setters change memory
/// only; [`save`](Self::save) persists.
pub trait SettingsStore {
    /// Returns a text value.
    fn value(&self, section: &str, key: &str) -> Option<String>;

    fn set_value(&mut self, section: &str, key: &str, value: &str);

    /// Returns a string list. Missing keys yield an empty list; a text
    /// value yields a one-element list.
    fn string_list(&self, section: &str, key: &str) -> Vec<String>;

    fn set_string_list(&mut self, section: &str, key: &str, values: Vec<String>);

    /// Returns every text value of a section.
    fn section(&self, section: &str) -> BTreeMap<String, String>;

    /// Persists pending changes.
    fn save(&mut self) -> Result<(), SettingsError>;

    /// Reads a boolean flag (`true`/`yes`/`on`/`1`, case-insensitive).
    fn flag(&self, section: &str, key: &str) -> bool {
        self.value(section, key).is_some_and(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "on" | "1"
            )
        })
    }
}

type Sections = BTreeMap<String, BTreeMap<String, SettingValue>>;

/// JSON file settings store.
#[derive(Debug, Clone, Default)]
pub struct JsonSettings {
    path: Option<PathBuf>,
    sections: Sections,
}

impl JsonSettings {
    /// Opens a settings file. A missing file gives empty settings; an
    /// unparseable one is logged and also gives empty settings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let sections = load_sections(&path)?;
        Ok(Self {
            path: Some(path),
            sections,
        })
    }

    /// Creates settings that are never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Returns the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn get(&self, section: &str, key: &str) -> Option<&SettingValue> {
        self.sections.get(section)?.get(key)
    }

    fn set(&mut self, section: &str, key: &str, value: SettingValue) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}

impl SettingsStore for JsonSettings {
    fn value(&self, section: &str, key: &str) -> Option<String> {
        match self.get(section, key)? {
            SettingValue::Text(text) => Some(text.clone()),
            SettingValue::List(_) => None,
        }
    }

    fn set_value(&mut self, section: &str, key: &str, value: &str) {
        self.set(section, key, SettingValue::Text(value.to_string()));
    }

    fn string_list(&self, section: &str, key: &str) -> Vec<String> {
        match self.get(section, key) {
            Some(SettingValue::List(values)) => values.clone(),
            Some(SettingValue::Text(text)) => vec![text.clone()],
            None => Vec::new(),
        }
    }

    fn set_string_list(&mut self, section: &str, key: &str, values: Vec<String>) {
        self.set(section, key, SettingValue::List(values));
    }

    fn section(&self, section: &str) -> BTreeMap<String, String> {
        self.sections
            .get(section)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|(key, value)| match value {
                        SettingValue::Text(text) => Some((key.clone(), text.clone())),
                        SettingValue::List(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn save(&mut self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.sections)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }
}

fn load_sections(path: &Path) -> Result<Sections, SettingsError> {
    if !path.exists() {
        return Ok(Sections::new());
    }
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Sections>(&content) {
        Ok(sections) => Ok(sections),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse settings, using defaults");
            Ok(Sections::new())
        }
    }
}

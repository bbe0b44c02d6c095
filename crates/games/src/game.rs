//! The tracked game type and its definition file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GamesError;

/// File extension of game definition files.
pub const DEFINITION_EXT: &str = "json";

/// A tracked backup unit.
///
/// `id` and `steam_appid` are indexed by the [`GameRegistry`](crate::GameRegistry)
/// and can only be changed through it. Every other field is plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub(crate) id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) steam_appid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installdir: Option<PathBuf>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Keys owned by other components, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_active() -> bool {
    true
}

impl Game {
    /// Creates an active, unfinished game with no Steam appid.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            steam_appid: None,
            installdir: None,
            finished: false,
            active: true,
            extra: serde_json::Map::new(),
        }
    }

    /// Sets the Steam appid before the game is registered.
    pub fn with_steam_appid(mut self, appid: u32) -> Self {
        self.steam_appid = Some(appid);
        self
    }

    /// Sets the install directory before the game is registered.
    pub fn with_installdir(mut self, installdir: impl Into<PathBuf>) -> Self {
        self.installdir = Some(installdir.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn steam_appid(&self) -> Option<u32> {
        self.steam_appid
    }

    /// Returns the definition file name, `<id>.json`.
    pub fn file_name(&self) -> String {
        definition_file_name(&self.id)
    }

    /// Checks that `id` can name a game and its definition file.
    pub fn validate_id(id: &str) -> Result<(), GamesError> {
        if id.trim().is_empty() {
            return Err(GamesError::InvalidGame("game id is empty".into()));
        }
        if id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(GamesError::InvalidGame(format!(
                "game id `{id}` is not a valid file name"
            )));
        }
        Ok(())
    }

    /// Reads a game definition file.
    pub fn load(path: &Path) -> Result<Self, GamesError> {
        let data = std::fs::read_to_string(path)?;
        let game: Game = serde_json::from_str(&data)?;
        Self::validate_id(&game.id)?;
        Ok(game)
    }

    /// Writes the definition file into `dir`, replacing any previous one.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, GamesError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        let json = serde_json::to_string_pretty(self)?;

        let tmp = dir.join(format!(".{}.tmp", self.file_name()));
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(path)
    }
}

/// Returns the definition file name for a game id.
pub(crate) fn definition_file_name(id: &str) -> String {
    format!("{id}.{DEFINITION_EXT}")
}

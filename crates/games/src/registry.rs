//! Game registry: the authoritative set of tracked games.
//!
//! Games are owned by the id index. The appid index maps a Steam appid
//! to the id of the game claiming it. Both indexes are maintained by the
//! mutation methods only:
//!
//! - every id-index key equals the id of the game stored under it,
//! - every appid-index key equals the `steam_appid` of the game it names,
//! - a game without an appid appears in no appid-index entry.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::GamesError;
use crate::game::{DEFINITION_EXT, Game, definition_file_name};

/// Tracked games, indexed by id and by Steam appid.
#[derive(Debug, Default)]
pub struct GameRegistry {
    games: HashMap<String, Game>,
    by_appid: HashMap<u32, String>,
    dir: Option<PathBuf>,
}

impl GameRegistry {
    /// Creates an empty in-memory registry. Nothing is persisted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a registry backed by a directory of game definition files.
    ///
    /// Every `*.json` file in `dir` is loaded. Files that fail to load,
    /// or whose name is not `<id>.json`, are logged and skipped.
    /// Mutations are written back to `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, GamesError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().is_some_and(|ext| ext == DEFINITION_EXT)
            })
            .collect();
        paths.sort();

        let mut registry = Self {
            dir: Some(dir),
            ..Self::default()
        };

        for path in paths {
            let game = match Game::load(&path) {
                Ok(game) => game,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping game definition");
                    continue;
                }
            };
            // File names are unique, so matching ids are unique too.
            if path.file_name().is_none_or(|name| name != game.file_name().as_str()) {
                warn!(path = %path.display(), id = %game.id, "game definition file name does not match its id, skipping");
                continue;
            }
            registry.insert(game);
        }

        debug!(count = registry.games.len(), "loaded game definitions");
        Ok(registry)
    }

    /// Returns the definitions directory, if this registry persists.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Registers a game, persisting its definition.
    ///
    /// A game with the same id is replaced. If the game has a Steam appid
    /// it takes over the appid index entry for it.
    pub fn add(&mut self, game: Game) -> Result<(), GamesError> {
        Game::validate_id(&game.id)?;
        if let Some(dir) = &self.dir {
            game.save_to(dir)?;
        }
        self.insert(game);
        Ok(())
    }

    /// Unregisters a game and returns it. The definition file is kept.
    pub fn remove(&mut self, id: &str) -> Result<Game, GamesError> {
        let game = self
            .games
            .remove(id)
            .ok_or_else(|| GamesError::NotFound(id.to_string()))?;
        self.release_appid(&game);
        debug!(id, "removed game");
        Ok(game)
    }

    /// Unregisters a game and deletes its definition file.
    pub fn delete(&mut self, id: &str) -> Result<Game, GamesError> {
        let game = self.remove(id)?;
        if let Some(dir) = &self.dir {
            let path = dir.join(game.file_name());
            if let Err(e) = std::fs::remove_file(&path)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                return Err(e.into());
            }
        }
        Ok(game)
    }

    /// Returns the game with the given id.
    pub fn get(&self, id: &str) -> Result<&Game, GamesError> {
        self.games
            .get(id)
            .ok_or_else(|| GamesError::NotFound(id.to_string()))
    }

    /// Returns the game with the given id for editing its plain fields.
    ///
    /// Call [`save`](Self::save) afterwards to persist the change.
    pub fn get_mut(&mut self, id: &str) -> Result<&mut Game, GamesError> {
        self.games
            .get_mut(id)
            .ok_or_else(|| GamesError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.games.contains_key(id)
    }

    /// Returns the game indexed under a Steam appid.
    pub fn by_steam_appid(&self, appid: u32) -> Option<&Game> {
        self.by_appid.get(&appid).and_then(|id| self.games.get(id))
    }

    pub fn by_steam_appid_mut(&mut self, appid: u32) -> Option<&mut Game> {
        let id = self.by_appid.get(&appid)?;
        self.games.get_mut(id)
    }

    /// True if some game is indexed under `appid`.
    pub fn has_steam_appid(&self, appid: u32) -> bool {
        self.by_appid.contains_key(&appid)
    }

    /// Changes a game's id.
    ///
    /// The new definition file is written and the old one removed before
    /// the indexes change; if the old file cannot be removed the new one
    /// is deleted again and the registry is left as it was. Fails with
    /// `AlreadyExists` if `new_id` belongs to another game.
    pub fn rename(&mut self, old_id: &str, new_id: &str) -> Result<(), GamesError> {
        if old_id == new_id {
            return self.get(old_id).map(|_| ());
        }
        Game::validate_id(new_id)?;
        if self.games.contains_key(new_id) {
            return Err(GamesError::AlreadyExists(new_id.to_string()));
        }

        let mut game = self.get(old_id)?.clone();
        game.id = new_id.to_string();
        if let Some(dir) = &self.dir {
            let new_path = game.save_to(dir)?;
            let old_path = dir.join(definition_file_name(old_id));
            if let Err(e) = std::fs::remove_file(&old_path)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %old_path.display(), error = %e, "failed to remove old game definition");
                if let Err(rollback) = std::fs::remove_file(&new_path) {
                    warn!(path = %new_path.display(), error = %rollback, "failed to roll back game definition");
                }
                return Err(e.into());
            }
        }

        self.games.remove(old_id);
        self.on_id_changed(game, old_id);

        debug!(old_id, new_id, "renamed game");
        Ok(())
    }

    /// Sets or clears a game's Steam appid and reindexes it.
    pub fn set_steam_appid(&mut self, id: &str, appid: Option<u32>) -> Result<(), GamesError> {
        let game = self.get_mut(id)?;
        let old = std::mem::replace(&mut game.steam_appid, appid);
        if old == appid {
            return Ok(());
        }
        self.on_appid_changed(id, old);
        self.save(id)
    }

    /// Writes a game's definition file. No-op for in-memory registries.
    pub fn save(&self, id: &str) -> Result<(), GamesError> {
        let game = self.get(id)?;
        if let Some(dir) = &self.dir {
            let path = game.save_to(dir)?;
            debug!(id, path = %path.display(), "saved game definition");
        }
        Ok(())
    }

    /// All game ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.sorted_ids(|_| true)
    }

    /// Ids of finished games, sorted.
    pub fn finished_ids(&self) -> Vec<String> {
        self.sorted_ids(|g| g.finished)
    }

    /// Ids of active games, sorted.
    pub fn active_ids(&self) -> Vec<String> {
        self.sorted_ids(|g| g.active)
    }

    /// Games indexed by Steam appid.
    pub fn steam_games(&self) -> BTreeMap<u32, &Game> {
        self.by_appid
            .iter()
            .filter_map(|(appid, id)| Some((*appid, self.games.get(id)?)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Game> {
        self.games.values()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    fn sorted_ids(&self, filter: impl Fn(&Game) -> bool) -> Vec<String> {
        let mut ids: Vec<String> = self
            .games
            .values()
            .filter(|g| filter(g))
            .map(|g| g.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Inserts into both indexes, replacing a game with the same id.
    fn insert(&mut self, game: Game) {
        if let Some(previous) = self.games.remove(&game.id) {
            self.release_appid(&previous);
        }
        if let Some(appid) = game.steam_appid {
            self.claim_appid(appid, &game.id);
        }
        self.games.insert(game.id.clone(), game);
    }

    /// Reindexes a game whose id changed. The old id key must already
    /// be gone from the id index.
    fn on_id_changed(&mut self, game: Game, old_id: &str) {
        if let Some(appid) = game.steam_appid
            && self.by_appid.get(&appid).is_some_and(|id| id == old_id)
        {
            self.by_appid.insert(appid, game.id.clone());
        }
        self.games.insert(game.id.clone(), game);
    }

    /// Reindexes a game whose appid changed from `old`.
    fn on_appid_changed(&mut self, id: &str, old: Option<u32>) {
        if let Some(old) = old
            && self.by_appid.get(&old).is_some_and(|owner| owner == id)
        {
            self.by_appid.remove(&old);
        }
        if let Some(appid) = self.games.get(id).and_then(|g| g.steam_appid) {
            self.claim_appid(appid, id);
        }
    }

    fn claim_appid(&mut self, appid: u32, id: &str) {
        if let Some(previous) = self.by_appid.insert(appid, id.to_string())
            && previous != id
        {
            warn!(appid, previous = %previous, id, "steam appid reassigned to another game");
        }
    }

    /// Drops the appid index entry for a game, if it still points at it.
    fn release_appid(&mut self, game: &Game) {
        if let Some(appid) = game.steam_appid
            && self.by_appid.get(&appid).is_some_and(|id| *id == game.id)
        {
            self.by_appid.remove(&appid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> GameRegistry {
        let mut registry = GameRegistry::new();
        registry
            .add(Game::new("tf2", "Team Fortress 2").with_steam_appid(440))
            .unwrap();
        registry.add(Game::new("hl", "Half-Life").with_steam_appid(70)).unwrap();
        registry.add(Game::new("doom", "Doom")).unwrap();
        registry
    }

    /// Checks both index invariants.
    fn assert_consistent(registry: &GameRegistry) {
        for (id, game) in &registry.games {
            assert_eq!(id, &game.id);
        }
        for (appid, id) in &registry.by_appid {
            let game = registry.games.get(id).expect("appid index points at missing game");
            assert_eq!(game.steam_appid, Some(*appid));
        }
    }

    #[test]
    fn add_and_get() {
        let registry = registry();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("tf2").unwrap().name, "Team Fortress 2");
        assert_eq!(registry.by_steam_appid(70).unwrap().id(), "hl");
        assert!(registry.by_steam_appid(1).is_none());
        assert_consistent(&registry);
    }

    #[test]
    fn add_rejects_empty_id() {
        let mut registry = GameRegistry::new();
        let err = registry.add(Game::new("", "Nameless")).unwrap_err();
        assert!(matches!(err, GamesError::InvalidGame(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn get_missing_is_not_found() {
        let registry = registry();
        assert!(matches!(registry.get("nope"), Err(GamesError::NotFound(_))));
    }

    #[test]
    fn add_with_claimed_appid_takes_over_index() {
        let mut registry = registry();
        registry
            .add(Game::new("tf2-beta", "TF2 Beta").with_steam_appid(440))
            .unwrap();
        assert_eq!(registry.by_steam_appid(440).unwrap().id(), "tf2-beta");

        // The first holder no longer owns the entry, so removing it keeps it.
        registry.remove("tf2").unwrap();
        assert_eq!(registry.by_steam_appid(440).unwrap().id(), "tf2-beta");
    }

    #[test]
    fn replacing_game_releases_old_appid() {
        let mut registry = registry();
        registry.add(Game::new("hl", "Half-Life Source")).unwrap();
        assert!(!registry.has_steam_appid(70));
        assert_consistent(&registry);
    }

    #[test]
    fn remove_clears_both_indexes() {
        let mut registry = registry();
        let game = registry.remove("tf2").unwrap();
        assert_eq!(game.id(), "tf2");
        assert!(!registry.contains("tf2"));
        assert!(!registry.has_steam_appid(440));
        assert!(matches!(registry.remove("tf2"), Err(GamesError::NotFound(_))));
        assert_consistent(&registry);
    }

    #[test]
    fn rename_keeps_appid_entry() {
        let mut registry = registry();
        registry.rename("tf2", "team-fortress").unwrap();

        assert!(matches!(registry.get("tf2"), Err(GamesError::NotFound(_))));
        assert_eq!(registry.get("team-fortress").unwrap().name, "Team Fortress 2");
        assert_eq!(registry.by_steam_appid(440).unwrap().id(), "team-fortress");
        assert_eq!(registry.len(), 3);
        assert_consistent(&registry);
    }

    #[test]
    fn rename_game_without_appid() {
        let mut registry = registry();
        registry.rename("doom", "doom-1993").unwrap();
        assert!(registry.contains("doom-1993"));
        assert_eq!(registry.steam_games().len(), 2);
        assert_consistent(&registry);
    }

    #[test]
    fn rename_onto_existing_id_fails() {
        let mut registry = registry();
        let err = registry.rename("tf2", "hl").unwrap_err();
        assert!(matches!(err, GamesError::AlreadyExists(_)));
        assert_eq!(registry.get("hl").unwrap().name, "Half-Life");
        assert_eq!(registry.get("tf2").unwrap().name, "Team Fortress 2");
    }

    #[test]
    fn rename_missing_or_invalid() {
        let mut registry = registry();
        assert!(matches!(
            registry.rename("nope", "other"),
            Err(GamesError::NotFound(_))
        ));
        assert!(matches!(
            registry.rename("tf2", ""),
            Err(GamesError::InvalidGame(_))
        ));
        assert!(registry.rename("tf2", "tf2").is_ok());
    }

    #[test]
    fn set_steam_appid_reindexes() {
        let mut registry = registry();
        registry.set_steam_appid("doom", Some(2280)).unwrap();
        assert_eq!(registry.by_steam_appid(2280).unwrap().id(), "doom");

        registry.set_steam_appid("doom", Some(2281)).unwrap();
        assert!(!registry.has_steam_appid(2280));
        assert_eq!(registry.by_steam_appid(2281).unwrap().id(), "doom");

        registry.set_steam_appid("doom", None).unwrap();
        assert!(!registry.has_steam_appid(2281));
        assert_consistent(&registry);
    }

    #[test]
    fn set_steam_appid_keeps_foreign_entry() {
        let mut registry = registry();
        // hl claims 440; tf2 still holds the value but no longer owns the entry.
        registry.set_steam_appid("hl", Some(440)).unwrap();
        assert_eq!(registry.by_steam_appid(440).unwrap().id(), "hl");

        registry.set_steam_appid("tf2", None).unwrap();
        assert_eq!(registry.by_steam_appid(440).unwrap().id(), "hl");
        assert_consistent(&registry);
    }

    #[test]
    fn derived_views() {
        let mut registry = registry();
        registry.get_mut("hl").unwrap().finished = true;
        registry.get_mut("doom").unwrap().active = false;

        assert_eq!(registry.ids(), vec!["doom", "hl", "tf2"]);
        assert_eq!(registry.finished_ids(), vec!["hl"]);
        assert_eq!(registry.active_ids(), vec!["hl", "tf2"]);

        let steam: Vec<u32> = registry.steam_games().keys().copied().collect();
        assert_eq!(steam, vec![70, 440]);
    }

    #[test]
    fn open_persists_mutations() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let mut registry = GameRegistry::open(tmp.path()).unwrap();
            registry
                .add(Game::new("tf2", "Team Fortress 2").with_steam_appid(440))
                .unwrap();
            registry.add(Game::new("hl", "Half-Life")).unwrap();
            registry.rename("tf2", "team-fortress").unwrap();
            registry.set_steam_appid("hl", Some(70)).unwrap();
            registry.get_mut("hl").unwrap().finished = true;
            registry.save("hl").unwrap();
        }

        assert!(!tmp.path().join("tf2.json").exists());
        assert!(tmp.path().join("team-fortress.json").exists());

        let registry = GameRegistry::open(tmp.path()).unwrap();
        assert_eq!(registry.ids(), vec!["hl", "team-fortress"]);
        assert_eq!(registry.by_steam_appid(440).unwrap().id(), "team-fortress");
        assert_eq!(registry.by_steam_appid(70).unwrap().id(), "hl");
        assert!(registry.get("hl").unwrap().finished);
    }

    #[test]
    fn open_skips_bad_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
        Game::new("hl", "Half-Life").save_to(tmp.path()).unwrap();

        let registry = GameRegistry::open(tmp.path()).unwrap();
        assert_eq!(registry.ids(), vec!["hl"]);
    }

    #[test]
    fn delete_removes_definition_file() {
        let tmp = tempfile::tempdir().unwrap();
        let mut registry = GameRegistry::open(tmp.path()).unwrap();
        registry.add(Game::new("hl", "Half-Life")).unwrap();
        assert!(tmp.path().join("hl.json").exists());

        registry.remove("hl").unwrap();
        assert!(tmp.path().join("hl.json").exists());

        registry.add(Game::new("hl", "Half-Life")).unwrap();
        registry.delete("hl").unwrap();
        assert!(!tmp.path().join("hl.json").exists());
        assert!(registry.is_empty());
    }

    #[test]
    fn open_skips_file_named_after_other_id() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("zz-my-copy.json"),
            r#"{"id": "hl", "name": "Half-Life (copy)"}"#,
        )
        .unwrap();

        {
            let mut registry = GameRegistry::open(tmp.path()).unwrap();
            assert!(registry.is_empty());
            registry.add(Game::new("hl", "Half-Life")).unwrap();
            registry.get_mut("hl").unwrap().installdir = Some(PathBuf::from("/games/Half-Life"));
            registry.save("hl").unwrap();
        }

        let registry = GameRegistry::open(tmp.path()).unwrap();
        let hl = registry.get("hl").unwrap();
        assert_eq!(hl.name, "Half-Life");
        assert_eq!(hl.installdir.as_deref(), Some(Path::new("/games/Half-Life")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rename_rolls_back_when_old_file_stays() {
        let tmp = tempfile::tempdir().unwrap();
        let mut registry = GameRegistry::open(tmp.path()).unwrap();
        registry
            .add(Game::new("tf2", "Team Fortress 2").with_steam_appid(440))
            .unwrap();

        // A directory in place of the old file cannot be removed as a file.
        let old_path = tmp.path().join("tf2.json");
        std::fs::remove_file(&old_path).unwrap();
        std::fs::create_dir(&old_path).unwrap();

        assert!(matches!(
            registry.rename("tf2", "team-fortress"),
            Err(GamesError::Io(_))
        ));
        assert!(registry.contains("tf2"));
        assert!(!registry.contains("team-fortress"));
        assert_eq!(registry.by_steam_appid(440).unwrap().id(), "tf2");
        assert!(!tmp.path().join("team-fortress.json").exists());
        assert_consistent(&registry);
    }
}

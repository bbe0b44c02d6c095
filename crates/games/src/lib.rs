//! Tracked game registry.
//!
//! A [`Game`] is one backup unit the user tracks. The [`GameRegistry`]
//! owns every game and keeps two indexes over them: by game id and by
//! Steam appid. Both stay consistent across renames and appid changes
//! because every id or appid mutation goes through the registry.
//!
//! Game definitions are JSON files, one per game, named `<id>.json`.

pub mod error;
pub mod game;
pub mod registry;

// Re-export primary types for convenience.
pub use error::GamesError;
pub use game::Game;
pub use registry::GameRegistry;

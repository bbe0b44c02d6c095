//! Error types for game registry operations.

/// Errors produced by the game registry.
#[derive(Debug, thiserror::Error)]
pub enum GamesError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid game: {0}")]
    InvalidGame(String),

    #[error("game not found: {0}")]
    NotFound(String),

    #[error("game already exists: {0}")]
    AlreadyExists(String),
}

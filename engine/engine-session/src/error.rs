//! Session layer errors.

use engine_core::EngineError;
use engine_maps::MapError;

/// Errors surfaced by the registry and the game service
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Session already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid session id: {0}")]
    InvalidId(String),
    #[error("No free session id after {0} attempts")]
    IdExhausted(usize),
    #[error("Map not found: {0}")]
    MapNotFound(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<MapError> for SessionError {
    fn from(err: MapError) -> Self {
        match err {
            MapError::NotFound(name) => SessionError::MapNotFound(name),
            other => SessionError::Engine(EngineError::InvalidMap(other.to_string())),
        }
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

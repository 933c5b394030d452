//! Error type for engine construction, moves and state restore.

/// Errors produced by the simulation engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid map: {0}")]
    InvalidMap(String),
    #[error("Game is already over")]
    AlreadyOver,
    #[error("Corrupt state: {0}")]
    CorruptState(String),
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),
}

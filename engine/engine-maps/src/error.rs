//! Map loading errors.

/// Errors from loading or listing maps
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Map not found: {0}")]
    NotFound(String),
    #[error("Invalid map '{name}': {reason}")]
    Invalid { name: String, reason: String },
    #[error("Failed to read map '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse map '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl MapError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        MapError::Invalid {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

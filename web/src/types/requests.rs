//! Request types for the web API.

use serde::Deserialize;

/// Request to start a new session.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Map id; the configured default map when omitted
    #[serde(default)]
    pub map: Option<String>,
    /// Explicit session id; generated when omitted
    #[serde(default)]
    pub id: Option<String>,
}

/// Request to make a single move.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    /// "up", "down", "left" or "right" (compass names also accepted)
    pub direction: String,
    /// Reset the session before moving
    #[serde(default)]
    pub reset: bool,
}

/// Request to run several moves in one call.
#[derive(Debug, Deserialize)]
pub struct BulkMoveRequest {
    #[serde(alias = "moves")]
    pub directions: Vec<String>,
    #[serde(default)]
    pub reset: bool,
}

/// Query string for history pages.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    /// "asc" or "desc" (default)
    pub order: Option<String>,
}

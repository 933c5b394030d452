//! Response types for the web API.
//!
//! Session, move and history payloads are the service types from
//! `engine_session` serialized as-is.

use engine_maps::MapSummary;
use engine_session::SessionView;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Sessions currently held in memory
    pub sessions: usize,
}

/// Playable maps.
#[derive(Serialize, Deserialize)]
pub struct MapsResponse {
    pub default_map: String,
    pub maps: Vec<MapSummary>,
}

/// Live sessions, oldest first.
#[derive(Serialize, Deserialize)]
pub struct SessionsResponse {
    pub count: usize,
    pub sessions: Vec<SessionView>,
}

/// Acknowledgement of a deleted session.
#[derive(Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: String,
    pub deleted: bool,
}

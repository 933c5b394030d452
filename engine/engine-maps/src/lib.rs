//! Map provider for the road trip engine
//!
//! Maps are JSON files in a configured directory (`<id>.json`) plus a set of
//! built-in maps. Only structural checks happen here: rectangular layout,
//! known characters, at least one home and one park, and battery bounds.
//!
//! # Usage
//!
//! ```rust
//! use engine_maps::{MapCatalog, MapProvider};
//!
//! let catalog = MapCatalog::builtin_only();
//! let classic = catalog.load_map("classic").unwrap();
//! assert_eq!(classic.total_parks(), 10);
//! ```

mod builtin;
mod catalog;
mod definition;
mod error;

pub use builtin::CLASSIC_ID;
pub use catalog::MapCatalog;
pub use definition::{MapDefinition, MAX_BATTERY, MIN_BATTERY};
pub use error::MapError;

use engine_core::GameMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Listing entry for a playable map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSummary {
    /// Identifier used to create sessions
    pub id: String,
    pub name: String,
    pub description: String,
    pub width: usize,
    pub height: usize,
    pub max_battery: u32,
    pub total_parks: u32,
    pub wall_crash_ends_game: bool,
}

impl MapSummary {
    pub fn new(id: &str, map: &GameMap) -> Self {
        Self {
            id: id.to_string(),
            name: map.name.clone(),
            description: map.description.clone(),
            width: map.width(),
            height: map.height(),
            max_battery: map.max_battery(),
            total_parks: map.total_parks(),
            wall_crash_ends_game: map.wall_crash_ends_game,
        }
    }
}

/// Source of maps for new sessions and for restoring persisted ones
pub trait MapProvider: Send + Sync {
    /// Load a map by id. Repeated loads of the same id may share one `Arc`.
    fn load_map(&self, name: &str) -> Result<Arc<GameMap>, MapError>;

    /// Every loadable map, sorted by id. Invalid maps are skipped.
    fn list_maps(&self) -> Vec<MapSummary>;
}

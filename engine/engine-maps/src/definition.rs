//! On-disk JSON map format.

use crate::error::MapError;
use engine_core::{GameMap, Messages, TileKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Battery bounds accepted from map files
pub const MIN_BATTERY: u32 = 1;
pub const MAX_BATTERY: u32 = 100;

/// A map as stored in `<maps dir>/<id>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Square grids declare their side length; checked when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<usize>,
    pub max_battery: u32,
    pub starting_battery: u32,
    pub layout: Vec<String>,
    /// Layout character to tile name, e.g. `"R": "road"`. Characters missing
    /// here fall back to the standard `R H P S W B` symbols.
    #[serde(default)]
    pub legend: BTreeMap<String, String>,
    #[serde(default)]
    pub wall_crash_ends_game: bool,
    #[serde(default)]
    pub messages: Messages,
}

impl MapDefinition {
    pub fn from_json(id: &str, json: &str) -> Result<Self, MapError> {
        serde_json::from_str(json).map_err(|source| MapError::Parse {
            name: id.to_string(),
            source,
        })
    }

    /// Run the structural checks and build the runtime map.
    pub fn into_game_map(self, id: &str) -> Result<GameMap, MapError> {
        if !(MIN_BATTERY..=MAX_BATTERY).contains(&self.max_battery) {
            return Err(MapError::invalid(
                id,
                format!(
                    "max_battery must be between {} and {}, got {}",
                    MIN_BATTERY, MAX_BATTERY, self.max_battery
                ),
            ));
        }
        if let Some(size) = self.grid_size {
            if self.layout.len() != size || self.layout.iter().any(|r| r.chars().count() != size) {
                return Err(MapError::invalid(
                    id,
                    format!("layout must be {0}x{0} to match grid_size", size),
                ));
            }
        }

        let kinds = self
            .layout
            .iter()
            .enumerate()
            .map(|(y, row)| {
                row.chars()
                    .enumerate()
                    .map(|(x, c)| self.resolve(id, c, x, y))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let name = if self.name.is_empty() {
            id.to_string()
        } else {
            self.name
        };
        let map = GameMap::from_kinds(name, kinds, self.max_battery, self.starting_battery)
            .map_err(|e| MapError::invalid(id, e.to_string()))?
            .with_description(self.description)
            .with_wall_crash(self.wall_crash_ends_game)
            .with_messages(self.messages);

        if map.home_count() == 0 {
            return Err(MapError::invalid(id, "layout must contain at least one home (H)"));
        }
        if map.total_parks() == 0 {
            return Err(MapError::invalid(id, "layout must contain at least one park (P)"));
        }
        Ok(map)
    }

    fn resolve(&self, id: &str, c: char, x: usize, y: usize) -> Result<TileKind, MapError> {
        let from_legend = self.legend.get(c.to_string().as_str()).map(|name| {
            name.parse::<TileKind>()
                .map_err(|e| MapError::invalid(id, format!("legend '{}': {}", c, e)))
        });
        match from_legend {
            Some(kind) => kind,
            None => TileKind::from_symbol(c).ok_or_else(|| {
                MapError::invalid(
                    id,
                    format!("invalid character '{}' at row {}, col {}", c, y + 1, x + 1),
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(layout: &[&str]) -> MapDefinition {
        MapDefinition {
            name: "Test".into(),
            description: "test map".into(),
            grid_size: None,
            max_battery: 10,
            starting_battery: 10,
            layout: layout.iter().map(|s| s.to_string()).collect(),
            legend: BTreeMap::new(),
            wall_crash_ends_game: false,
            messages: Messages::default(),
        }
    }

    #[test]
    fn test_parse_full_definition() {
        let json = r#"{
            "name": "Tiny",
            "description": "A tiny map",
            "grid_size": 3,
            "max_battery": 5,
            "starting_battery": 4,
            "layout": ["HRP", "RWR", "BRS"],
            "legend": {"R": "road", "H": "home", "P": "park", "S": "supercharger", "W": "water", "B": "building"},
            "wall_crash_ends_game": true,
            "messages": {"welcome": "Go!"}
        }"#;
        let map = MapDefinition::from_json("tiny", json)
            .unwrap()
            .into_game_map("tiny")
            .unwrap();
        assert_eq!(map.name, "Tiny");
        assert_eq!(map.description, "A tiny map");
        assert_eq!(map.max_battery(), 5);
        assert_eq!(map.starting_battery(), 4);
        assert!(map.wall_crash_ends_game);
        assert_eq!(map.messages.welcome, "Go!");
        assert_eq!(map.messages.cant_move, Messages::default().cant_move);
    }

    #[test]
    fn test_custom_legend_characters() {
        let mut def = definition(&["h.*"]);
        def.legend.insert("h".into(), "home".into());
        def.legend.insert(".".into(), "road".into());
        def.legend.insert("*".into(), "park".into());
        let map = def.into_game_map("custom").unwrap();
        assert_eq!(map.layout(), vec!["HRP"]);
    }

    #[test]
    fn test_unknown_character_rejected() {
        let err = definition(&["HRX"]).into_game_map("bad").unwrap_err();
        assert!(matches!(err, MapError::Invalid { .. }));
    }

    #[test]
    fn test_requires_home_and_park() {
        assert!(definition(&["RRP"]).into_game_map("x").is_err());
        assert!(definition(&["RRH"]).into_game_map("x").is_err());
    }

    #[test]
    fn test_battery_bounds() {
        let mut def = definition(&["HP"]);
        def.max_battery = 101;
        def.starting_battery = 50;
        assert!(def.into_game_map("x").is_err());

        let mut def = definition(&["HP"]);
        def.starting_battery = 11;
        assert!(def.into_game_map("x").is_err());
    }

    #[test]
    fn test_grid_size_mismatch() {
        let mut def = definition(&["HRP", "RRR"]);
        def.grid_size = Some(3);
        assert!(def.into_game_map("x").is_err());
    }

    #[test]
    fn test_name_falls_back_to_id() {
        let mut def = definition(&["HP"]);
        def.name.clear();
        assert_eq!(def.into_game_map("plain").unwrap().name, "plain");
    }
}

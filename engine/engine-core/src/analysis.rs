//! Read-only diagnostics derived from an engine: neighbourhood views,
//! nearest targets and battery risk. Nothing here affects move legality.

use crate::cell::{Cell, Position, TileKind};
use crate::engine::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compass labels for `Engine::local_view`, clockwise from north
pub const NEIGHBOUR_HEADINGS: [&str; 8] = ["n", "ne", "e", "se", "s", "sw", "w", "nw"];

const NEIGHBOUR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Advisory classification of remaining battery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BatteryRisk {
    /// Battery is empty
    Critical,
    /// No charger on the map
    Warning,
    /// Battery cannot cover the distance to the nearest charger
    Danger,
    /// Less than two moves of slack to the nearest charger
    Caution,
    /// At or below a third of capacity
    Low,
    Safe,
}

impl BatteryRisk {
    pub fn as_str(self) -> &'static str {
        match self {
            BatteryRisk::Critical => "CRITICAL",
            BatteryRisk::Warning => "WARNING",
            BatteryRisk::Danger => "DANGER",
            BatteryRisk::Caution => "CAUTION",
            BatteryRisk::Low => "LOW",
            BatteryRisk::Safe => "SAFE",
        }
    }
}

impl fmt::Display for BatteryRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point of interest with its Manhattan distance from the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub position: Position,
    pub distance: u32,
}

/// One entry of the 8-neighbourhood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Neighbour {
    pub heading: &'static str,
    pub position: Position,
    pub tile: TileKind,
}

impl Engine {
    /// The eight surrounding tiles, clockwise from north. Off-grid cells are
    /// reported as buildings.
    pub fn local_view(&self) -> Vec<Neighbour> {
        let here = self.position();
        NEIGHBOUR_HEADINGS
            .iter()
            .zip(NEIGHBOUR_OFFSETS)
            .map(|(&heading, (dx, dy))| {
                let position = here.offset(dx, dy);
                let tile = match self.tile_at(position) {
                    TileKind::Boundary => TileKind::Building,
                    tile => tile,
                };
                Neighbour {
                    heading,
                    position,
                    tile,
                }
            })
            .collect()
    }

    /// Three text rows centred on the agent (`T`). Visited parks are `✓`,
    /// off-grid cells `B`.
    pub fn local_view_3x3(&self) -> Vec<String> {
        let here = self.position();
        (-1..=1)
            .map(|dy| {
                (-1..=1)
                    .map(|dx| {
                        if dx == 0 && dy == 0 {
                            return 'T';
                        }
                        self.cell_at(here.offset(dx, dy))
                            .map(Cell::symbol)
                            .unwrap_or('B')
                    })
                    .collect()
            })
            .collect()
    }

    fn nearest(&self, wanted: impl Fn(&Cell) -> bool) -> Option<Target> {
        let here = self.position();
        self.grid()
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(move |(x, cell)| (Position::new(x as i32, y as i32), cell))
            })
            .filter(|(_, cell)| wanted(cell))
            .map(|(position, _)| Target {
                position,
                distance: here.manhattan(position),
            })
            .min_by_key(|target| target.distance)
    }

    /// Closest Home or Supercharger by Manhattan distance
    pub fn nearest_charger(&self) -> Option<Target> {
        self.nearest(Cell::is_charger)
    }

    pub fn nearest_unvisited_park(&self) -> Option<Target> {
        self.nearest(|cell| matches!(cell, Cell::Park { visited: false, .. }))
    }

    pub fn battery_risk(&self) -> BatteryRisk {
        let battery = self.battery();
        if battery == 0 {
            return BatteryRisk::Critical;
        }
        let Some(charger) = self.nearest_charger() else {
            return BatteryRisk::Warning;
        };
        if battery <= charger.distance {
            BatteryRisk::Danger
        } else if battery <= charger.distance + 2 {
            BatteryRisk::Caution
        } else if battery <= self.max_battery() / 3 {
            BatteryRisk::Low
        } else {
            BatteryRisk::Safe
        }
    }
}

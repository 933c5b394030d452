//! Static map definition shared by every session played on it.

use crate::cell::{Cell, Position, TileKind};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Status texts shown to the player. `{score}`, `{parks}`, `{battery}` and
/// `{max}` are substituted where they appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub welcome: String,
    pub home_charge: String,
    pub supercharger_charge: String,
    pub park_visited: String,
    pub park_already_visited: String,
    pub victory: String,
    pub out_of_battery: String,
    pub stranded: String,
    pub cant_move: String,
    pub battery_status: String,
    pub hit_wall: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            welcome: "Welcome! Drive your Tesla to collect parks. Watch your battery!".into(),
            home_charge: "Home sweet home! Battery fully charged!".into(),
            supercharger_charge: "Supercharger! Battery fully charged!".into(),
            park_visited: "Park visited! Score: {score}".into(),
            park_already_visited: "Already visited this park".into(),
            victory: "Victory! All {parks} parks visited!".into(),
            out_of_battery: "Out of battery! Game Over!".into(),
            stranded: "Stranded with no battery! Game Over!".into(),
            cant_move: "Can't move there!".into(),
            battery_status: "Battery: {battery}/{max}".into(),
            hit_wall: "Crashed into an obstacle! Game Over!".into(),
        }
    }
}

impl Messages {
    pub fn park_visited(&self, score: u32) -> String {
        fill(&self.park_visited, &[("{score}", score)])
    }

    pub fn victory(&self, parks: u32) -> String {
        fill(&self.victory, &[("{parks}", parks)])
    }

    pub fn battery_status(&self, battery: u32, max: u32) -> String {
        fill(&self.battery_status, &[("{battery}", battery), ("{max}", max)])
    }
}

/// Substitute named placeholders. Positional `%d` markers, as found in older
/// map files, are filled in the same order.
fn fill(template: &str, values: &[(&str, u32)]) -> String {
    let mut out = template.to_string();
    for (name, value) in values {
        let value = value.to_string();
        if out.contains(name) {
            out = out.replace(name, &value);
        } else {
            out = out.replacen("%d", &value, 1);
        }
    }
    out
}

/// Immutable grid plus battery parameters.
///
/// Park cells are numbered `park_0, park_1, ...` in row-major order and the
/// start position is the last Home cell in row-major order.
#[derive(Debug, Clone)]
pub struct GameMap {
    pub name: String,
    pub description: String,
    cells: Vec<Vec<Cell>>,
    width: usize,
    height: usize,
    max_battery: u32,
    starting_battery: u32,
    pub wall_crash_ends_game: bool,
    pub messages: Messages,
    start: Option<Position>,
    total_parks: u32,
}

impl GameMap {
    /// Build a map from layout rows written with `R H P S W B`.
    pub fn from_layout<S: AsRef<str>>(
        name: impl Into<String>,
        layout: &[S],
        max_battery: u32,
        starting_battery: u32,
    ) -> Result<Self, EngineError> {
        let mut kinds = Vec::with_capacity(layout.len());
        for (y, row) in layout.iter().enumerate() {
            let parsed = row
                .as_ref()
                .chars()
                .enumerate()
                .map(|(x, c)| {
                    TileKind::from_symbol(c).ok_or_else(|| {
                        EngineError::InvalidMap(format!("unknown tile '{}' at ({}, {})", c, x, y))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            kinds.push(parsed);
        }
        Self::from_kinds(name, kinds, max_battery, starting_battery)
    }

    /// Build a map from a grid of tile kinds, assigning park ids.
    pub fn from_kinds(
        name: impl Into<String>,
        kinds: Vec<Vec<TileKind>>,
        max_battery: u32,
        starting_battery: u32,
    ) -> Result<Self, EngineError> {
        let height = kinds.len();
        let width = kinds.first().map(Vec::len).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(EngineError::InvalidMap("layout is empty".into()));
        }
        if let Some(y) = kinds.iter().position(|row| row.len() != width) {
            return Err(EngineError::InvalidMap(format!(
                "row {} has {} cells, expected {}",
                y,
                kinds[y].len(),
                width
            )));
        }
        if max_battery == 0 {
            return Err(EngineError::InvalidMap("max battery must be positive".into()));
        }
        if starting_battery == 0 || starting_battery > max_battery {
            return Err(EngineError::InvalidMap(format!(
                "starting battery {} must be within 1..={}",
                starting_battery, max_battery
            )));
        }

        let mut next_park = 0u32;
        let mut start = None;
        let mut cells = Vec::with_capacity(height);
        for (y, row) in kinds.into_iter().enumerate() {
            let mut out = Vec::with_capacity(width);
            for (x, kind) in row.into_iter().enumerate() {
                if kind == TileKind::Home {
                    start = Some(Position::new(x as i32, y as i32));
                }
                out.push(Cell::from_kind(kind, || {
                    let id = format!("park_{}", next_park);
                    next_park += 1;
                    id
                }));
            }
            cells.push(out);
        }

        Ok(Self {
            name: name.into(),
            description: String::new(),
            cells,
            width,
            height,
            max_battery,
            starting_battery,
            wall_crash_ends_game: false,
            messages: Messages::default(),
            start,
            total_parks: next_park,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_wall_crash(mut self, wall_crash_ends_game: bool) -> Self {
        self.wall_crash_ends_game = wall_crash_ends_game;
        self
    }

    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    /// Start cell, `None` when the map has no Home
    pub fn start(&self) -> Option<Position> {
        self.start
    }

    pub fn total_parks(&self) -> u32 {
        self.total_parks
    }

    pub fn max_battery(&self) -> u32 {
        self.max_battery
    }

    /// Always in `1..=max_battery`
    pub fn starting_battery(&self) -> u32 {
        self.starting_battery
    }

    pub fn home_count(&self) -> usize {
        self.count(TileKind::Home)
    }

    pub fn count(&self, kind: TileKind) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.kind() == kind)
            .count()
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(&self.cells[pos.y as usize][pos.x as usize])
    }

    /// Tile kind at `pos`, `Boundary` when off-grid
    pub fn tile(&self, pos: Position) -> TileKind {
        self.cell(pos).map(Cell::kind).unwrap_or(TileKind::Boundary)
    }

    /// Layout rows using the map file characters
    pub fn layout(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.kind().symbol()).collect())
            .collect()
    }
}

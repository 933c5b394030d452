//! Per-session simulation state machine.

use crate::cell::{Cell, Direction, Position, TileKind};
use crate::error::EngineError;
use crate::map::GameMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// One attempted move, successful or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub move_number: usize,
    pub direction: Direction,
    pub from: Position,
    /// Position after the attempt; equals `from` when the move failed
    pub to: Position,
    pub battery_before: u32,
    pub battery_after: u32,
    /// Tile at the attempted target
    pub tile: TileKind,
    pub success: bool,
    /// Unix seconds
    pub timestamp: u64,
}

/// Full serializable engine state, enough to rebuild an engine exactly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub position: Position,
    pub battery: u32,
    pub score: u32,
    pub total_parks: u32,
    pub visited_parks: Vec<String>,
    pub move_history: Vec<MoveRecord>,
    pub game_over: bool,
    pub victory: bool,
    pub message: String,
}

/// Compact view of the engine for API responses (no move history)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatus {
    pub map_name: String,
    pub position: Position,
    pub battery: u32,
    pub max_battery: u32,
    pub score: u32,
    pub total_parks: u32,
    pub visited_parks: Vec<String>,
    pub moves_made: usize,
    pub game_over: bool,
    pub victory: bool,
    pub message: String,
}

/// Mutable game for one session.
///
/// The map is shared; the grid is cloned so park `visited` flags never leak
/// between sessions.
#[derive(Debug, Clone)]
pub struct Engine {
    map: Arc<GameMap>,
    grid: Vec<Vec<Cell>>,
    position: Position,
    battery: u32,
    score: u32,
    total_parks: u32,
    history: Vec<MoveRecord>,
    game_over: bool,
    victory: bool,
    message: String,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Engine {
    /// Start a new game. Fails when the map has no Home or no Park.
    pub fn new(map: Arc<GameMap>) -> Result<Self, EngineError> {
        let start = map
            .start()
            .ok_or_else(|| EngineError::InvalidMap(format!("map '{}' has no home", map.name)))?;
        if map.total_parks() == 0 {
            return Err(EngineError::InvalidMap(format!(
                "map '{}' has no parks",
                map.name
            )));
        }

        Ok(Self {
            grid: map.cells().to_vec(),
            position: start,
            battery: map.starting_battery(),
            score: 0,
            total_parks: map.total_parks(),
            history: Vec::new(),
            game_over: false,
            victory: false,
            message: map.messages.welcome.clone(),
            map,
        })
    }

    /// Start over on the same map. Clears the move history.
    pub fn reset(&mut self) {
        self.grid = self.map.cells().to_vec();
        // Engine::new already proved the map has a start cell
        if let Some(start) = self.map.start() {
            self.position = start;
        }
        self.battery = self.map.starting_battery();
        self.score = 0;
        self.history.clear();
        self.game_over = false;
        self.victory = false;
        self.message = self.map.messages.welcome.clone();
    }

    /// Apply one move.
    ///
    /// Blocked moves are not errors: they return a record with
    /// `success == false`. Only a move on a finished game is rejected, and it
    /// leaves no trace.
    pub fn move_dir(&mut self, dir: Direction) -> Result<MoveRecord, EngineError> {
        if self.game_over {
            return Err(EngineError::AlreadyOver);
        }

        let from = self.position;
        let target = from.step(dir);
        let tile = self.tile_at(target);
        let battery_before = self.battery;
        let messages = &self.map.messages;

        if !tile.is_passable() {
            if self.map.wall_crash_ends_game {
                self.game_over = true;
                self.message = messages.hit_wall.clone();
            } else {
                self.message = messages.cant_move.clone();
            }
            return Ok(self.record(dir, from, from, battery_before, tile, false));
        }

        if self.battery == 0 {
            self.game_over = true;
            self.message = messages.out_of_battery.clone();
            return Ok(self.record(dir, from, from, battery_before, tile, false));
        }

        self.battery -= 1;
        self.position = target;

        let max_battery = self.map.max_battery();
        let (x, y) = (target.x as usize, target.y as usize);
        match &mut self.grid[y][x] {
            Cell::Home => {
                self.battery = max_battery;
                self.message = messages.home_charge.clone();
            }
            Cell::Supercharger => {
                self.battery = max_battery;
                self.message = messages.supercharger_charge.clone();
            }
            Cell::Park { visited, .. } if !*visited => {
                *visited = true;
                self.score += 1;
                if self.score == self.total_parks {
                    self.victory = true;
                    self.game_over = true;
                    self.message = messages.victory(self.total_parks);
                } else {
                    self.message = messages.park_visited(self.score);
                }
            }
            Cell::Park { .. } => {
                self.message = messages.park_already_visited.clone();
            }
            _ => {
                self.message = messages.battery_status(self.battery, max_battery);
            }
        }

        if !self.victory && self.battery == 0 && !tile.is_charger() {
            self.game_over = true;
            self.message = messages.stranded.clone();
        }
        if self.game_over {
            debug!(map = %self.map.name, score = self.score, victory = self.victory, "Game over");
        }

        Ok(self.record(dir, from, target, battery_before, tile, true))
    }

    fn record(
        &mut self,
        direction: Direction,
        from: Position,
        to: Position,
        battery_before: u32,
        tile: TileKind,
        success: bool,
    ) -> MoveRecord {
        let entry = MoveRecord {
            move_number: self.history.len() + 1,
            direction,
            from,
            to,
            battery_before,
            battery_after: self.battery,
            tile,
            success,
            timestamp: now_secs(),
        };
        self.history.push(entry.clone());
        entry
    }

    /// Tile at `pos` in this session's grid, `Boundary` off-grid
    pub fn tile_at(&self, pos: Position) -> TileKind {
        self.cell_at(pos).map(Cell::kind).unwrap_or(TileKind::Boundary)
    }

    pub fn cell_at(&self, pos: Position) -> Option<&Cell> {
        if !self.map.in_bounds(pos) {
            return None;
        }
        Some(&self.grid[pos.y as usize][pos.x as usize])
    }

    /// Whether `dir` leads onto passable terrain. Battery is not considered.
    pub fn can_move(&self, dir: Direction) -> bool {
        self.tile_at(self.position.step(dir)).is_passable()
    }

    pub fn possible_moves(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&dir| self.can_move(dir))
            .collect()
    }

    pub fn map(&self) -> &Arc<GameMap> {
        &self.map
    }

    pub fn grid(&self) -> &[Vec<Cell>] {
        &self.grid
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn battery(&self) -> u32 {
        self.battery
    }

    pub fn max_battery(&self) -> u32 {
        self.map.max_battery()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_parks(&self) -> u32 {
        self.total_parks
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_victory(&self) -> bool {
        self.victory
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.history.last()
    }

    fn parks(&self) -> impl Iterator<Item = (&str, bool)> {
        self.grid.iter().flatten().filter_map(|cell| match cell {
            Cell::Park { id, visited } => Some((id.as_str(), *visited)),
            _ => None,
        })
    }

    /// Ids of visited parks in row-major order
    pub fn visited_parks(&self) -> Vec<String> {
        self.parks()
            .filter(|(_, visited)| *visited)
            .map(|(id, _)| id.to_string())
            .collect()
    }

    pub fn remaining_parks(&self) -> u32 {
        self.total_parks - self.score
    }

    pub fn status(&self) -> GameStatus {
        GameStatus {
            map_name: self.map.name.clone(),
            position: self.position,
            battery: self.battery,
            max_battery: self.map.max_battery(),
            score: self.score,
            total_parks: self.total_parks,
            visited_parks: self.visited_parks(),
            moves_made: self.history.len(),
            game_over: self.game_over,
            victory: self.victory,
            message: self.message.clone(),
        }
    }

    pub fn state(&self) -> EngineState {
        EngineState {
            position: self.position,
            battery: self.battery,
            score: self.score,
            total_parks: self.total_parks,
            visited_parks: self.visited_parks(),
            move_history: self.history.clone(),
            game_over: self.game_over,
            victory: self.victory,
            message: self.message.clone(),
        }
    }

    /// Restore a previously saved state. The engine is left untouched when
    /// the state does not fit this map.
    pub fn set_state(&mut self, state: EngineState) -> Result<(), EngineError> {
        let corrupt = |msg: String| Err(EngineError::CorruptState(msg));

        if state.total_parks != self.map.total_parks() {
            return corrupt(format!(
                "state has {} parks, map '{}' has {}",
                state.total_parks,
                self.map.name,
                self.map.total_parks()
            ));
        }
        let visited: BTreeSet<&str> = state.visited_parks.iter().map(String::as_str).collect();
        if visited.len() != state.visited_parks.len() {
            return corrupt("duplicate visited park ids".into());
        }
        if visited.len() as u32 > self.map.total_parks() {
            return corrupt(format!(
                "{} parks visited but map has {}",
                visited.len(),
                self.map.total_parks()
            ));
        }
        if state.score as usize != visited.len() {
            return corrupt(format!(
                "score {} does not match {} visited parks",
                state.score,
                visited.len()
            ));
        }
        if !self.map.tile(state.position).is_passable() {
            return corrupt(format!(
                "position {} is not on passable terrain",
                state.position
            ));
        }
        if state.battery > self.map.max_battery() {
            return corrupt(format!(
                "battery {} exceeds max {}",
                state.battery, self.map.max_battery()
            ));
        }
        if state.victory && (!state.game_over || state.score != state.total_parks) {
            return corrupt("victory flag set on an unfinished game".into());
        }

        let mut grid = self.map.cells().to_vec();
        let mut matched = 0usize;
        for cell in grid.iter_mut().flatten() {
            if let Cell::Park { id, visited: flag } = cell {
                if visited.contains(id.as_str()) {
                    *flag = true;
                    matched += 1;
                }
            }
        }
        if matched != visited.len() {
            return corrupt("visited park id not present on map".into());
        }

        self.grid = grid;
        self.position = state.position;
        self.battery = state.battery;
        self.score = state.score;
        self.history = state.move_history;
        self.game_over = state.game_over;
        self.victory = state.victory;
        self.message = state.message;
        debug!(
            map = %self.map.name,
            moves = self.history.len(),
            game_over = self.game_over,
            "Engine state restored"
        );
        Ok(())
    }
}

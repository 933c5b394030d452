//! Values returned by the game service.

use engine_core::{
    BatteryRisk, Cell, Direction, Engine, GameStatus, MoveRecord, Position, StopReason, TileKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::session::Session;

/// Session metadata plus the full observable game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: String,
    pub map_id: String,
    pub created_at: u64,
    pub last_accessed_at: u64,
    pub state: GameStatus,
    /// Session-local grid, one string per row
    pub grid: Vec<String>,
    pub possible_moves: Vec<Direction>,
    pub local_view_3x3: Vec<String>,
    pub battery_risk: BatteryRisk,
}

impl SessionView {
    pub(crate) fn new(session: &Session, engine: &Engine) -> Self {
        Self {
            id: session.id().to_string(),
            map_id: session.map_id().to_string(),
            created_at: session.created_at(),
            last_accessed_at: session.last_accessed_at(),
            state: engine.status(),
            grid: render_grid(engine),
            possible_moves: engine.possible_moves(),
            local_view_3x3: engine.local_view_3x3(),
            battery_risk: engine.battery_risk(),
        }
    }
}

fn render_grid(engine: &Engine) -> Vec<String> {
    engine
        .grid()
        .iter()
        .map(|row| row.iter().map(Cell::symbol).collect())
        .collect()
}

/// Something notable that happened while handling a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    Reset,
    Move {
        move_number: usize,
        direction: Direction,
        from: Position,
        to: Position,
        battery: u32,
    },
    Charge {
        tile: TileKind,
        battery: u32,
    },
    ParkVisited {
        park_id: String,
        score: u32,
    },
    Victory {
        score: u32,
    },
    GameOver {
        reason: String,
    },
}

/// Turns move records into events. Seeded with the visited set before the
/// moves ran so revisits are not reported as new parks.
pub(crate) struct EventTracker {
    seen: HashSet<String>,
    score: u32,
    events: Vec<GameEvent>,
}

impl EventTracker {
    pub(crate) fn new(engine: &Engine) -> Self {
        Self {
            seen: engine.visited_parks().into_iter().collect(),
            score: engine.score(),
            events: Vec::new(),
        }
    }

    pub(crate) fn reset(&mut self, engine: &Engine) {
        self.seen = engine.visited_parks().into_iter().collect();
        self.score = engine.score();
        self.events.push(GameEvent::Reset);
    }

    pub(crate) fn step(&mut self, record: &MoveRecord, engine: &Engine) {
        if !record.success {
            return;
        }
        self.events.push(GameEvent::Move {
            move_number: record.move_number,
            direction: record.direction,
            from: record.from,
            to: record.to,
            battery: record.battery_after,
        });
        if record.tile.is_charger() {
            self.events.push(GameEvent::Charge {
                tile: record.tile,
                battery: record.battery_after,
            });
        }
        let park = engine.map().cell(record.to).and_then(Cell::park_id);
        if let Some(park_id) = park {
            if self.seen.insert(park_id.to_string()) {
                self.score += 1;
                self.events.push(GameEvent::ParkVisited {
                    park_id: park_id.to_string(),
                    score: self.score,
                });
            }
        }
    }

    /// Close the batch. `last` is the final move attempted, if any.
    pub(crate) fn finish(mut self, last: Option<&MoveRecord>, engine: &Engine) -> Vec<GameEvent> {
        let Some(last) = last else {
            return self.events;
        };
        match StopReason::for_step(last, engine) {
            Some(StopReason::Victory) => self.events.push(GameEvent::Victory {
                score: engine.score(),
            }),
            Some(reason) if engine.is_game_over() => self.events.push(GameEvent::GameOver {
                reason: reason.as_str().to_string(),
            }),
            _ => {}
        }
        self.events
    }
}

/// Result of a single move request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub success: bool,
    pub state: GameStatus,
    pub message: String,
    /// `None` when the game was already over
    pub step: Option<MoveRecord>,
    pub attempted_to: Position,
    pub events: Vec<GameEvent>,
    pub possible_moves: Vec<Direction>,
    pub local_view_3x3: Vec<String>,
    pub battery_risk: BatteryRisk,
}

/// Result of a bulk move request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkMoveOutcome {
    pub requested: usize,
    pub executed: usize,
    pub succeeded: usize,
    pub truncated: bool,
    pub limit: usize,
    pub stop_reason: StopReason,
    pub stopped_on_move: Option<usize>,
    pub steps: Vec<MoveRecord>,
    pub events: Vec<GameEvent>,
    pub start_position: Position,
    pub end_position: Position,
    pub start_battery: u32,
    pub end_battery: u32,
    pub score_delta: u32,
    pub state: GameStatus,
    pub possible_moves: Vec<Direction>,
    pub local_view_3x3: Vec<String>,
    pub battery_risk: BatteryRisk,
}

/// Ordering of history entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryOrder {
    Asc,
    /// Newest first
    #[default]
    Desc,
}

impl FromStr for HistoryOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(HistoryOrder::Asc),
            "desc" => Ok(HistoryOrder::Desc),
            other => Err(format!("unknown order '{}'", other)),
        }
    }
}

impl fmt::Display for HistoryOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HistoryOrder::Asc => "asc",
            HistoryOrder::Desc => "desc",
        })
    }
}

/// History pagination request. Unset fields fall back to service defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    #[serde(default)]
    pub order: HistoryOrder,
}

/// One page of move history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub session_id: String,
    pub page: usize,
    pub page_size: usize,
    pub order: HistoryOrder,
    pub total_moves: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub entries: Vec<MoveRecord>,
}

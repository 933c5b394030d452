//! Batched moves: repeated `move_dir` that stops at the first failure, the
//! first terminal transition, or the step limit.

use crate::cell::{Direction, TileKind};
use crate::engine::{Engine, MoveRecord};
use serde::{Deserialize, Serialize};

/// Why a bulk move stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every requested direction ran
    Completed,
    /// More directions were requested than the limit allows
    Limit,
    BlockedBoundary,
    BlockedBuilding,
    BlockedWater,
    OutOfBattery,
    Stranded,
    Crashed,
    Victory,
    /// The game was already over before the first step
    GameOver,
}

impl StopReason {
    /// Classify a single move; `None` means the batch may continue
    pub fn for_step(record: &MoveRecord, engine: &Engine) -> Option<StopReason> {
        if record.success {
            if engine.is_victory() {
                Some(StopReason::Victory)
            } else if engine.is_game_over() {
                Some(StopReason::Stranded)
            } else {
                None
            }
        } else if record.tile.is_passable() {
            Some(StopReason::OutOfBattery)
        } else if engine.is_game_over() {
            Some(StopReason::Crashed)
        } else {
            Some(match record.tile {
                TileKind::Water => StopReason::BlockedWater,
                TileKind::Boundary => StopReason::BlockedBoundary,
                _ => StopReason::BlockedBuilding,
            })
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::Completed => "completed",
            StopReason::Limit => "limit",
            StopReason::BlockedBoundary => "blocked_boundary",
            StopReason::BlockedBuilding => "blocked_building",
            StopReason::BlockedWater => "blocked_water",
            StopReason::OutOfBattery => "out_of_battery",
            StopReason::Stranded => "stranded",
            StopReason::Crashed => "crashed",
            StopReason::Victory => "victory",
            StopReason::GameOver => "game_over",
        }
    }
}

/// Result of a bulk move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    pub requested: usize,
    /// Moves actually attempted (including a final failed one)
    pub executed: usize,
    pub succeeded: usize,
    /// True when directions beyond the limit were dropped
    pub truncated: bool,
    pub limit: usize,
    pub stop_reason: StopReason,
    /// 1-based index of the move that ended the batch early
    pub stopped_on_move: Option<usize>,
    pub steps: Vec<MoveRecord>,
}

impl Engine {
    /// Run up to `limit` moves from `directions`.
    pub fn bulk_move(&mut self, directions: &[Direction], limit: usize) -> BulkResult {
        let requested = directions.len();
        let truncated = requested > limit;
        let mut steps = Vec::with_capacity(requested.min(limit));
        let mut stop = None;

        for (index, &dir) in directions.iter().take(limit).enumerate() {
            let record = match self.move_dir(dir) {
                Ok(record) => record,
                Err(_) => {
                    stop = Some((StopReason::GameOver, None));
                    break;
                }
            };
            let reason = StopReason::for_step(&record, self);
            steps.push(record);
            if let Some(reason) = reason {
                stop = Some((reason, Some(index + 1)));
                break;
            }
        }

        let (stop_reason, stopped_on_move) = stop.unwrap_or(if truncated {
            (StopReason::Limit, None)
        } else {
            (StopReason::Completed, None)
        });

        BulkResult {
            requested,
            executed: steps.len(),
            succeeded: steps.iter().filter(|s| s.success).count(),
            truncated,
            limit,
            stop_reason,
            stopped_on_move,
            steps,
        }
    }
}

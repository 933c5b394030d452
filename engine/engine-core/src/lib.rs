//! Core types for the road trip grid simulation
//!
//! This crate provides the per-session game rules:
//! - `GameMap`: immutable grid of typed cells plus battery parameters
//! - `Engine`: mutable state machine enforcing movement, battery and scoring rules
//! - Diagnostics: local views, nearest targets and `BatteryRisk`
//! - `bulk_move`: capped, stop-on-first-failure batches of moves
//!
//! # Example
//!
//! ```rust
//! use engine_core::{Direction, Engine, GameMap};
//! use std::sync::Arc;
//!
//! let map = GameMap::from_layout("demo", &["HRP"], 5, 5).unwrap();
//! let mut engine = Engine::new(Arc::new(map)).unwrap();
//! engine.move_dir(Direction::Right).unwrap();
//! let record = engine.move_dir(Direction::Right).unwrap();
//! assert!(record.success);
//! assert!(engine.is_victory());
//! ```

pub mod analysis;
pub mod bulk;
pub mod cell;
pub mod engine;
pub mod error;
pub mod map;

// Re-export main types for convenience
pub use analysis::{BatteryRisk, Neighbour, Target, NEIGHBOUR_HEADINGS};
pub use bulk::{BulkResult, StopReason};
pub use cell::{Cell, Direction, Position, TileKind};
pub use engine::{Engine, EngineState, GameStatus, MoveRecord};
pub use error::EngineError;
pub use map::{GameMap, Messages};

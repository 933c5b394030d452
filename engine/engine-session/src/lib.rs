//! Sessions for the road trip engine
//!
//! This crate owns everything between a transport layer and the simulation:
//!
//! - [`Session`]: one engine bound to its map, with access timestamps
//! - [`SessionRegistry`]: concurrency-safe create/get/delete with lazy loads
//!   from a [`SessionStore`] and background saves
//! - [`store`]: memory, JSON-file and SQLite persistence backends
//! - [`GameService`]: the request-level operations (move, bulk move, reset,
//!   history) that the web binary wraps
//!
//! # Usage
//!
//! ```rust,ignore
//! use engine_session::{GameService, HistoryQuery};
//!
//! let service = GameService::from_config(&engine_config::load_config())?;
//! service.registry().load_persisted_sessions().await;
//!
//! let view = service.create_session(Some("classic"), None).await?;
//! let outcome = service.bulk_move(&view.id, &directions, false).await?;
//! let page = service.history(&view.id, HistoryQuery::default()).await?;
//! ```

pub mod error;
pub mod registry;
pub mod service;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Result, SessionError};
pub use registry::{normalize_id, SessionRegistry, GENERATED_ID_LEN, MAX_ID_ATTEMPTS};
pub use service::{
    parse_directions, BulkMoveOutcome, GameEvent, GameService, HistoryOrder, HistoryPage,
    HistoryQuery, MoveOutcome, ServiceLimits, SessionView,
};
pub use session::{now_millis, PersistedSession, Session};
pub use store::{
    create_session_store, FileSessionStore, MemorySessionStore, SessionStore, SqliteSessionStore,
};

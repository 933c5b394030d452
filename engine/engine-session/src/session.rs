//! A single playable session: one engine bound to its map and timestamps.

use engine_core::{Engine, EngineError, EngineState, GameMap};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, MutexGuard};

/// Milliseconds since the unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Durable form of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub id: String,
    /// Map id the session was created with
    pub map_name: String,
    /// Unix milliseconds
    pub created_at: u64,
    /// Unix milliseconds
    pub last_accessed_at: u64,
    pub state: EngineState,
}

/// One session. The engine sits behind an async mutex so moves on the same
/// session are serialised while different sessions proceed independently.
#[derive(Debug)]
pub struct Session {
    id: String,
    map_id: String,
    map: Arc<GameMap>,
    created_at: u64,
    last_accessed_at: AtomicU64,
    engine: Mutex<Engine>,
    /// Held for the whole snapshot-and-write of a save
    persist_lock: Mutex<()>,
    deleted: AtomicBool,
}

impl Session {
    pub fn new(id: String, map_id: String, map: Arc<GameMap>) -> Result<Self, EngineError> {
        let engine = Engine::new(Arc::clone(&map))?;
        let now = now_millis();
        Ok(Self {
            id,
            map_id,
            map,
            created_at: now,
            last_accessed_at: AtomicU64::new(now),
            engine: Mutex::new(engine),
            persist_lock: Mutex::new(()),
            deleted: AtomicBool::new(false),
        })
    }

    /// Rebuild a session from storage. Fails with `CorruptState` when the
    /// saved engine state does not fit the map.
    pub fn restore(persisted: PersistedSession, map: Arc<GameMap>) -> Result<Self, EngineError> {
        let mut engine = Engine::new(Arc::clone(&map))?;
        engine.set_state(persisted.state)?;
        Ok(Self {
            id: persisted.id,
            map_id: persisted.map_name,
            map,
            created_at: persisted.created_at,
            last_accessed_at: AtomicU64::new(persisted.last_accessed_at),
            engine: Mutex::new(engine),
            persist_lock: Mutex::new(()),
            deleted: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    pub fn map(&self) -> &Arc<GameMap> {
        &self.map
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn last_accessed_at(&self) -> u64 {
        self.last_accessed_at.load(Ordering::Relaxed)
    }

    pub fn touch(&self) {
        self.last_accessed_at
            .fetch_max(now_millis(), Ordering::Relaxed);
    }

    /// Time since the last touch, relative to `now` (unix millis)
    pub fn idle_for(&self, now: u64) -> Duration {
        Duration::from_millis(now.saturating_sub(self.last_accessed_at()))
    }

    /// Exclusive access to the engine. Counts as a touch.
    pub async fn engine(&self) -> MutexGuard<'_, Engine> {
        self.touch();
        self.engine.lock().await
    }

    pub async fn snapshot(&self) -> PersistedSession {
        let engine = self.engine.lock().await;
        PersistedSession {
            id: self.id.clone(),
            map_name: self.map_id.clone(),
            created_at: self.created_at,
            last_accessed_at: self.last_accessed_at(),
            state: engine.state(),
        }
    }

    pub(crate) async fn persist_guard(&self) -> MutexGuard<'_, ()> {
        self.persist_lock.lock().await
    }

    pub(crate) fn mark_deleted(&self) {
        self.deleted.store(true, Ordering::SeqCst);
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::SeqCst)
    }
}

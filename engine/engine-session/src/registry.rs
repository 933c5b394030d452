//! Concurrency-safe collection of live sessions.
//!
//! The session map sits behind a single reader/writer lock that is never held
//! across an await. Lookups that miss memory fall back to the store, and
//! inserts re-check the map under the write lock so concurrent callers always
//! end up sharing one `Session`.
//!
//! Store reads that fill the cache and deletes of the same id are serialised
//! on a striped async lock, so a delete can never be undone by a load that
//! read the record just before it was removed. Sessions evicted while a
//! caller still holds them are tracked weakly until that caller lets go, so
//! a delete can still stop their pending saves.

use crate::error::{Result, SessionError};
use crate::session::{now_millis, PersistedSession, Session};
use crate::store::SessionStore;
use engine_maps::MapProvider;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Generated ids are 2 random bytes in hex
pub const GENERATED_ID_LEN: usize = 4;

/// Attempts before giving up on finding a free generated id
pub const MAX_ID_ATTEMPTS: usize = 64;

const MAX_ID_LEN: usize = 64;

/// Number of async locks guarding store loads and deletes
const KEY_LOCK_STRIPES: usize = 32;

/// Lowercase and validate a caller-supplied session id
pub fn normalize_id(id: &str) -> Result<String> {
    let trimmed = id.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= MAX_ID_LEN
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(SessionError::InvalidId(id.to_string()));
    }
    Ok(trimmed.to_ascii_lowercase())
}

fn generate_id() -> String {
    let mut bytes = [0u8; GENERATED_ID_LEN / 2];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    /// Evicted sessions some caller may still be using
    evicted: Mutex<HashMap<String, Vec<Weak<Session>>>>,
    key_locks: Vec<tokio::sync::Mutex<()>>,
    maps: Arc<dyn MapProvider>,
    store: Option<Arc<dyn SessionStore>>,
    save_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(
        maps: Arc<dyn MapProvider>,
        store: Option<Arc<dyn SessionStore>>,
        save_timeout: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            evicted: Mutex::new(HashMap::new()),
            key_locks: (0..KEY_LOCK_STRIPES)
                .map(|_| tokio::sync::Mutex::new(()))
                .collect(),
            maps,
            store,
            save_timeout,
        }
    }

    /// Registry without persistence
    pub fn in_memory(maps: Arc<dyn MapProvider>) -> Self {
        Self::new(maps, None, Duration::from_secs(2))
    }

    pub fn maps(&self) -> &Arc<dyn MapProvider> {
        &self.maps
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Session>>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Session>>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn evicted(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Weak<Session>>>> {
        self.evicted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock shared by every load and delete of `key`
    fn key_lock(&self, key: &str) -> &tokio::sync::Mutex<()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.key_locks[hasher.finish() as usize % self.key_locks.len()]
    }

    fn cached(&self, key: &str) -> Option<Arc<Session>> {
        self.read().get(key).cloned()
    }

    async fn stored(&self, key: &str) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        match store.exists(key).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(session_id = %key, error = %e, "Store lookup failed");
                false
            }
        }
    }

    /// Create a session on `map_id`. With no id a fresh one is generated.
    pub async fn create(&self, id: Option<&str>, map_id: &str) -> Result<Arc<Session>> {
        let map = self.maps.load_map(map_id)?;

        let session = match id {
            Some(id) => {
                let key = normalize_id(id)?;
                if self.cached(&key).is_some() || self.stored(&key).await {
                    return Err(SessionError::AlreadyExists(key));
                }
                self.insert_new(&key, map_id, &map)?
                    .ok_or(SessionError::AlreadyExists(key))?
            }
            None => self.create_with_generated_id(map_id, &map).await?,
        };

        info!(session_id = %session.id(), map = %map_id, "Session created");
        self.schedule_save(&session);
        Ok(session)
    }

    async fn create_with_generated_id(
        &self,
        map_id: &str,
        map: &Arc<engine_core::GameMap>,
    ) -> Result<Arc<Session>> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let key = generate_id();
            if self.cached(&key).is_some() || self.stored(&key).await {
                debug!(attempt, "Generated session id collided, retrying");
                continue;
            }
            if let Some(session) = self.insert_new(&key, map_id, map)? {
                return Ok(session);
            }
        }
        Err(SessionError::IdExhausted(MAX_ID_ATTEMPTS))
    }

    /// Build and insert under the write lock. `None` if the key got taken.
    fn insert_new(
        &self,
        key: &str,
        map_id: &str,
        map: &Arc<engine_core::GameMap>,
    ) -> Result<Option<Arc<Session>>> {
        let mut sessions = self.write();
        if sessions.contains_key(key) {
            return Ok(None);
        }
        let session = Arc::new(Session::new(
            key.to_string(),
            map_id.to_string(),
            Arc::clone(map),
        )?);
        sessions.insert(key.to_string(), Arc::clone(&session));
        Ok(Some(session))
    }

    /// Case-insensitive lookup, loading from the store on a miss.
    pub async fn get(&self, id: &str) -> Result<Arc<Session>> {
        let key = normalize_id(id).map_err(|_| SessionError::NotFound(id.to_string()))?;
        if let Some(session) = self.cached(&key) {
            session.touch();
            return Ok(session);
        }
        match self.load_from_store(&key).await {
            Some(session) => {
                session.touch();
                Ok(session)
            }
            None => Err(SessionError::NotFound(key)),
        }
    }

    /// Fetch a persisted session and cache it. Failures are logged and
    /// reported as `None`.
    async fn load_from_store(&self, key: &str) -> Option<Arc<Session>> {
        let store = self.store.as_ref()?;
        let _guard = self.key_lock(key).lock().await;
        if let Some(session) = self.cached(key) {
            return Some(session);
        }
        let persisted = match store.load(key).await {
            Ok(Some(persisted)) => persisted,
            Ok(None) => return None,
            Err(e) => {
                warn!(session_id = %key, error = %e, "Failed to load session");
                return None;
            }
        };
        let session = match self.restore(persisted) {
            Ok(session) => session,
            Err(e) => {
                warn!(session_id = %key, error = %e, "Discarding unreadable session");
                return None;
            }
        };
        Some(self.insert_or_existing(key, session).0)
    }

    fn restore(&self, persisted: PersistedSession) -> Result<Session> {
        let map = self.maps.load_map(&persisted.map_name)?;
        Ok(Session::restore(persisted, map)?)
    }

    /// Insert unless another caller won the race, returning whichever is live
    /// and whether it was inserted here.
    fn insert_or_existing(&self, key: &str, session: Session) -> (Arc<Session>, bool) {
        let mut sessions = self.write();
        if let Some(existing) = sessions.get(key) {
            return (Arc::clone(existing), false);
        }
        let session = Arc::new(session);
        sessions.insert(key.to_string(), Arc::clone(&session));
        (session, true)
    }

    /// Return the session for `id`, creating it on `map_id` if it exists
    /// neither in memory nor in the store. Racing callers share one session.
    pub async fn get_or_create(&self, id: &str, map_id: &str) -> Result<Arc<Session>> {
        let key = normalize_id(id)?;
        if let Some(session) = self.cached(&key) {
            session.touch();
            return Ok(session);
        }
        if let Some(session) = self.load_from_store(&key).await {
            session.touch();
            return Ok(session);
        }

        let map = self.maps.load_map(map_id)?;
        let (session, created) = {
            let mut sessions = self.write();
            match sessions.get(&key) {
                Some(existing) => (Arc::clone(existing), false),
                None => {
                    let session = Arc::new(Session::new(
                        key.clone(),
                        map_id.to_string(),
                        Arc::clone(&map),
                    )?);
                    sessions.insert(key.clone(), Arc::clone(&session));
                    (session, true)
                }
            }
        };

        if created {
            info!(session_id = %key, map = %map_id, "Session created");
            self.schedule_save(&session);
        }
        Ok(session)
    }

    /// Remove from memory and from the store.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let key = normalize_id(id).map_err(|_| SessionError::NotFound(id.to_string()))?;
        let _key_guard = self.key_lock(&key).lock().await;
        let removed = self.write().remove(&key);
        let stale: Vec<Arc<Session>> = self
            .evicted()
            .remove(&key)
            .unwrap_or_default()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        let mut found = removed.is_some();
        for session in removed.iter().chain(stale.iter()) {
            // Wait out any in-flight save so it cannot recreate the record
            session.mark_deleted();
            let _guard = session.persist_guard().await;
        }
        if let Some(store) = &self.store {
            match store.delete(&key).await {
                Ok(existed) => found |= existed,
                Err(e) => warn!(session_id = %key, error = %e, "Failed to delete stored session"),
            }
        }

        if found {
            info!(session_id = %key, "Session deleted");
            Ok(())
        } else {
            Err(SessionError::NotFound(key))
        }
    }

    /// Live sessions, oldest first
    pub fn list(&self) -> Vec<Arc<Session>> {
        let mut sessions: Vec<Arc<Session>> = self.read().values().cloned().collect();
        sessions.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        sessions
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    /// Touch an in-memory session
    pub fn update_last_accessed(&self, id: &str) -> Result<()> {
        let key = normalize_id(id).map_err(|_| SessionError::NotFound(id.to_string()))?;
        let session = self.cached(&key).ok_or(SessionError::NotFound(key))?;
        session.touch();
        Ok(())
    }

    /// Write an in-memory session to the store and wait for the result.
    pub async fn save(&self, id: &str) -> Result<()> {
        let key = normalize_id(id).map_err(|_| SessionError::NotFound(id.to_string()))?;
        let session = self.cached(&key).ok_or(SessionError::NotFound(key))?;
        let Some(store) = &self.store else {
            return Ok(());
        };
        persist(store.as_ref(), &session)
            .await
            .map_err(|e| SessionError::Persistence(e.to_string()))
    }

    /// Save in the background. Failures and timeouts are logged only.
    pub fn schedule_save(&self, session: &Arc<Session>) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let session = Arc::clone(session);
        let timeout = self.save_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, persist(store.as_ref(), &session)).await {
                Ok(Ok(())) => debug!(session_id = %session.id(), "Session saved"),
                Ok(Err(e)) => warn!(session_id = %session.id(), error = %e, "Failed to save session"),
                Err(_) => warn!(
                    session_id = %session.id(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Session save timed out"
                ),
            }
        });
    }

    /// Evict sessions idle for longer than `max_age` from memory. Stored
    /// copies are kept, so a later `get` reloads them.
    pub fn cleanup_expired(&self, max_age: Duration) -> usize {
        let now = now_millis();
        let mut sessions = self.write();
        let mut evicted = self.evicted();
        evicted.retain(|_, held| {
            held.retain(|weak| weak.strong_count() > 0);
            !held.is_empty()
        });

        let before = sessions.len();
        sessions.retain(|key, session| {
            if session.idle_for(now) <= max_age {
                return true;
            }
            evicted
                .entry(key.clone())
                .or_default()
                .push(Arc::downgrade(session));
            false
        });
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Evicted idle sessions");
        }
        removed
    }

    /// Load every stored session into memory. Returns how many were loaded.
    pub async fn load_persisted_sessions(&self) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };
        let ids = match store.list().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Failed to list stored sessions");
                return 0;
            }
        };

        let mut loaded = 0;
        for id in ids {
            let key = match normalize_id(&id) {
                Ok(key) => key,
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Skipping session with invalid id");
                    continue;
                }
            };
            let _guard = self.key_lock(&key).lock().await;
            let mut persisted = match store.load(&id).await {
                Ok(Some(persisted)) => persisted,
                Ok(None) => continue,
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Skipping unreadable session");
                    continue;
                }
            };
            persisted.id = key.clone();
            let session = match self.restore(persisted) {
                Ok(session) => session,
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Skipping corrupt session");
                    continue;
                }
            };
            let (session, inserted) = self.insert_or_existing(&key, session);
            if !inserted {
                continue;
            }
            loaded += 1;
            if id != key {
                self.rename_stored(store.as_ref(), &id, &session).await;
            }
        }
        info!(loaded, "Loaded persisted sessions");
        loaded
    }

    /// Move a record stored under a non-canonical id to its lowercase key.
    async fn rename_stored(&self, store: &dyn SessionStore, old_id: &str, session: &Session) {
        if let Err(e) = persist(store, session).await {
            warn!(session_id = %session.id(), error = %e, "Failed to save renamed session");
            return;
        }
        match store.delete(old_id).await {
            Ok(_) => info!(from = %old_id, to = %session.id(), "Normalised stored session id"),
            Err(e) => warn!(session_id = %old_id, error = %e, "Failed to remove old session record"),
        }
    }

    /// Save every live session, waiting for each. Returns how many succeeded.
    pub async fn save_all_sessions(&self) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };
        let mut saved = 0;
        for session in self.list() {
            match persist(store.as_ref(), &session).await {
                Ok(()) => saved += 1,
                Err(e) => warn!(session_id = %session.id(), error = %e, "Failed to save session"),
            }
        }
        info!(saved, "Saved all sessions");
        saved
    }
}

/// Snapshot and write under the session's persist lock, so saves for one
/// session land in order and never resurrect a deleted session.
async fn persist(store: &dyn SessionStore, session: &Session) -> anyhow::Result<()> {
    let _guard = session.persist_guard().await;
    if session.is_deleted() {
        return Ok(());
    }
    let snapshot = session.snapshot().await;
    store.save(&snapshot).await
}

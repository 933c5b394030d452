//! Persistence backends for sessions.
//!
//! The registry uses a store as a write-behind cache fill: every mutation is
//! saved in the background and sessions missing from memory are loaded on
//! demand.
//!
//! # Usage
//!
//! ```rust,ignore
//! use engine_session::store::create_session_store;
//!
//! let store = create_session_store(&config.sessions)?;
//! ```

mod file;
mod memory;
mod sqlite;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use crate::session::PersistedSession;
use anyhow::Result;
use async_trait::async_trait;
use engine_config::{SessionBackend, SessionsConfig};
use std::sync::Arc;
use tracing::info;

/// Abstract interface for session storage.
///
/// Ids passed in are already lowercase. Implementations must be thread-safe.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace a session
    async fn save(&self, session: &PersistedSession) -> Result<()>;

    /// Load a session, `None` when it was never saved
    async fn load(&self, id: &str) -> Result<Option<PersistedSession>>;

    /// Remove a session, returning whether it existed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Ids of every stored session
    async fn list(&self) -> Result<Vec<String>>;

    async fn exists(&self, id: &str) -> Result<bool>;
}

/// Create the store selected by configuration. `None` means the registry
/// keeps sessions in memory only.
pub fn create_session_store(config: &SessionsConfig) -> Result<Option<Arc<dyn SessionStore>>> {
    let store: Arc<dyn SessionStore> = match config.backend {
        SessionBackend::None => {
            info!("Session persistence disabled");
            return Ok(None);
        }
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        SessionBackend::File => Arc::new(FileSessionStore::new(&config.dir)?),
        SessionBackend::Sqlite => Arc::new(SqliteSessionStore::new(&config.sqlite_path)?),
    };
    info!(backend = %config.backend, "Session store ready");
    Ok(Some(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use engine_core::GameMap;

    async fn sample(id: &str) -> PersistedSession {
        let map = Arc::new(GameMap::from_layout("t", &["HRP"], 5, 5).unwrap());
        Session::new(id.to_string(), "tiny".into(), map)
            .unwrap()
            .snapshot()
            .await
    }

    /// Behaviour every backend must share
    async fn exercise_store(store: &dyn SessionStore) {
        assert!(store.load("ab12").await.unwrap().is_none());
        assert!(!store.exists("ab12").await.unwrap());

        let first = sample("ab12").await;
        store.save(&first).await.unwrap();
        store.save(&sample("cd34").await).await.unwrap();
        assert!(store.exists("ab12").await.unwrap());
        assert_eq!(store.load("ab12").await.unwrap(), Some(first.clone()));

        let mut updated = first.clone();
        updated.state.battery = 3;
        store.save(&updated).await.unwrap();
        assert_eq!(store.load("ab12").await.unwrap().unwrap().state.battery, 3);

        let mut ids = store.list().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["ab12", "cd34"]);

        assert!(store.delete("ab12").await.unwrap());
        assert!(!store.delete("ab12").await.unwrap());
        assert!(store.load("ab12").await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap(), vec!["cd34"]);
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise_store(&MemorySessionStore::new()).await;
    }

    #[tokio::test]
    async fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions")).unwrap();
        exercise_store(&store).await;
    }

    #[tokio::test]
    async fn test_sqlite_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.db");
        let store = SqliteSessionStore::new(path.to_str().unwrap()).unwrap();
        exercise_store(&store).await;
    }

    #[test]
    fn test_factory_honours_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SessionsConfig {
            dir: dir.path().join("s").to_string_lossy().into_owned(),
            sqlite_path: dir.path().join("s.db").to_string_lossy().into_owned(),
            ..SessionsConfig::default()
        };

        config.backend = SessionBackend::None;
        assert!(create_session_store(&config).unwrap().is_none());

        for backend in [
            SessionBackend::Memory,
            SessionBackend::File,
            SessionBackend::Sqlite,
        ] {
            config.backend = backend;
            assert!(create_session_store(&config).unwrap().is_some());
        }
    }
}

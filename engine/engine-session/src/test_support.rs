//! Shared fixtures for registry and service tests.

use crate::registry::SessionRegistry;
use crate::store::{MemorySessionStore, SessionStore};
use engine_core::GameMap;
use engine_maps::{MapError, MapProvider, MapSummary};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// 5x5: home (2,2), parks (0,2) and (4,2), buildings (1,2) and (3,2)
pub const WALLED: [&str; 5] = ["RRRRR", "RRRRR", "PBHBP", "RRRRR", "RRRRR"];

/// Fixed set of maps keyed by id
pub struct TestMaps {
    maps: HashMap<String, Arc<GameMap>>,
}

impl TestMaps {
    pub fn new() -> Arc<Self> {
        let walled = |battery: u32| GameMap::from_layout("Walled", &WALLED, 10, battery).unwrap();
        let mut maps = HashMap::new();
        maps.insert("walled".to_string(), Arc::new(walled(10)));
        maps.insert("low".to_string(), Arc::new(walled(2)));
        maps.insert(
            "crash".to_string(),
            Arc::new(walled(10).with_wall_crash(true)),
        );
        Arc::new(Self { maps })
    }
}

impl MapProvider for TestMaps {
    fn load_map(&self, name: &str) -> Result<Arc<GameMap>, MapError> {
        self.maps
            .get(name)
            .cloned()
            .ok_or_else(|| MapError::NotFound(name.to_string()))
    }

    fn list_maps(&self) -> Vec<MapSummary> {
        let mut list: Vec<MapSummary> = self
            .maps
            .iter()
            .map(|(id, map)| MapSummary::new(id, map))
            .collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }
}

pub fn registry_with_store() -> (Arc<SessionRegistry>, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    let registry = registry_on(store.clone());
    (registry, store)
}

pub fn registry_on(store: Arc<MemorySessionStore>) -> Arc<SessionRegistry> {
    let store: Arc<dyn SessionStore> = store;
    Arc::new(SessionRegistry::new(
        TestMaps::new(),
        Some(store),
        Duration::from_secs(2),
    ))
}

/// Poll until `check` passes or roughly a second has gone by
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

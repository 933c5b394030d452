//! Directory-backed map catalog with an in-memory cache.

use crate::builtin::{builtin, builtin_ids};
use crate::definition::MapDefinition;
use crate::error::MapError;
use crate::{MapProvider, MapSummary};
use engine_core::GameMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Loads maps from `<dir>/<id>.json`, falling back to built-in maps.
///
/// A file with the same id as a built-in map takes precedence. Loaded maps
/// are cached for the lifetime of the catalog (or until `refresh`).
#[derive(Debug)]
pub struct MapCatalog {
    dir: Option<PathBuf>,
    cache: RwLock<HashMap<String, Arc<GameMap>>>,
}

/// Normalise a map reference: strip `.json`, reject anything path-like.
fn map_id(name: &str) -> Option<&str> {
    let id = name.trim();
    let id = id.strip_suffix(".json").unwrap_or(id);
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some(id)
}

impl MapCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Catalog with only the built-in maps
    pub fn builtin_only() -> Self {
        Self {
            dir: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Drop every cached map so the next load re-reads the files
    pub fn refresh(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn file_path(&self, id: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(format!("{}.json", id)))
    }

    fn read_map(&self, id: &str) -> Result<GameMap, MapError> {
        if let Some(path) = self.file_path(id) {
            match std::fs::read_to_string(&path) {
                Ok(json) => {
                    debug!(map = id, path = %path.display(), "Loading map file");
                    return MapDefinition::from_json(id, &json)?.into_game_map(id);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(MapError::Io {
                        name: id.to_string(),
                        source,
                    })
                }
            }
        }
        builtin(id).ok_or_else(|| MapError::NotFound(id.to_string()))
    }

    /// Ids of `*.json` files in the maps directory, sorted
    fn file_ids(&self) -> Vec<String> {
        let Some(dir) = &self.dir else {
            return Vec::new();
        };
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot read maps directory");
                return Vec::new();
            }
        };
        let mut ids: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let id = name.strip_suffix(".json")?;
                map_id(id).map(str::to_string)
            })
            .collect();
        ids.sort();
        ids
    }
}

impl MapProvider for MapCatalog {
    fn load_map(&self, name: &str) -> Result<Arc<GameMap>, MapError> {
        let id = map_id(name).ok_or_else(|| MapError::NotFound(name.to_string()))?;

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(map) = cache.get(id) {
                return Ok(Arc::clone(map));
            }
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have filled it while we waited
        if let Some(map) = cache.get(id) {
            return Ok(Arc::clone(map));
        }

        let map = Arc::new(self.read_map(id)?);
        cache.insert(id.to_string(), Arc::clone(&map));
        Ok(map)
    }

    fn list_maps(&self) -> Vec<MapSummary> {
        let mut ids = self.file_ids();
        for builtin_id in builtin_ids() {
            if !ids.iter().any(|id| id == builtin_id) {
                ids.push(builtin_id.to_string());
            }
        }
        ids.sort();

        ids.into_iter()
            .filter_map(|id| match self.load_map(&id) {
                Ok(map) => Some(MapSummary::new(&id, &map)),
                Err(e) => {
                    warn!(map = %id, error = %e, "Skipping invalid map");
                    None
                }
            })
            .collect()
    }
}

//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::Path;
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",      // Current directory
    "../config.toml",   // Parent directory (when running from subdirectory)
    "/app/config.toml", // Docker container
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by ROADTRIP_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
/// 4. Docker container path (/app/config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var("ROADTRIP_CONFIG") {
        let path = Path::new(&path);
        if path.exists() {
            info!("Loading config from ROADTRIP_CONFIG: {}", path.display());
            return load_from_path(path);
        }
        warn!(
            "ROADTRIP_CONFIG={} not found, searching defaults",
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// A missing or malformed file is not fatal: the built-in defaults are used
/// instead and the problem is logged.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u16, u64, usize, enums with FromStr)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        match std::env::var($key).map(|s| s.parse()) {
            Ok(Ok(v)) => $config.$section.$field = v,
            Ok(Err(_)) => warn!("Ignoring unparsable {}", $key),
            Err(_) => {}
        }
    };
    // Comma separated list
    ($config:expr, $section:ident . $field:ident, $key:expr, list) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: ROADTRIP_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.data_dir, "ROADTRIP_COMMON_DATA_DIR");
    env_override!(config, common.log_level, "ROADTRIP_COMMON_LOG_LEVEL");

    // Maps
    env_override!(config, maps.dir, "ROADTRIP_MAPS_DIR");
    env_override!(config, maps.default_map, "ROADTRIP_MAPS_DEFAULT_MAP");

    // Sessions
    env_override!(
        config,
        sessions.backend,
        "ROADTRIP_SESSIONS_BACKEND",
        parse
    );
    env_override!(config, sessions.dir, "ROADTRIP_SESSIONS_DIR");
    env_override!(config, sessions.sqlite_path, "ROADTRIP_SESSIONS_SQLITE_PATH");
    env_override!(
        config,
        sessions.max_idle_secs,
        "ROADTRIP_SESSIONS_MAX_IDLE_SECS",
        parse
    );
    env_override!(
        config,
        sessions.cleanup_interval_secs,
        "ROADTRIP_SESSIONS_CLEANUP_INTERVAL_SECS",
        parse
    );
    env_override!(
        config,
        sessions.save_timeout_ms,
        "ROADTRIP_SESSIONS_SAVE_TIMEOUT_MS",
        parse
    );

    // Gameplay
    env_override!(
        config,
        gameplay.max_bulk_moves,
        "ROADTRIP_GAMEPLAY_MAX_BULK_MOVES",
        parse
    );
    env_override!(
        config,
        gameplay.history_page_size,
        "ROADTRIP_GAMEPLAY_HISTORY_PAGE_SIZE",
        parse
    );
    env_override!(
        config,
        gameplay.history_max_page_size,
        "ROADTRIP_GAMEPLAY_HISTORY_MAX_PAGE_SIZE",
        parse
    );

    // Web
    env_override!(config, web.host, "ROADTRIP_WEB_HOST");
    env_override!(config, web.port, "ROADTRIP_WEB_PORT", parse);
    env_override!(
        config,
        web.allowed_origins,
        "ROADTRIP_WEB_ALLOWED_ORIGINS",
        list
    );

    config
}

//! Default configuration values loaded from config.defaults.toml.
//!
//! The defaults file is embedded at compile time so the binary never depends
//! on it being present at runtime.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    maps: MapsDefaults,
    sessions: SessionsDefaults,
    gameplay: GameplayDefaults,
    web: WebDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    data_dir: String,
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct MapsDefaults {
    dir: String,
    default_map: String,
}

#[derive(Debug, Deserialize)]
struct SessionsDefaults {
    backend: String,
    dir: String,
    sqlite_path: String,
    max_idle_secs: u64,
    cleanup_interval_secs: u64,
    save_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct GameplayDefaults {
    max_bulk_moves: usize,
    history_page_size: usize,
    history_max_page_size: usize,
}

#[derive(Debug, Deserialize)]
struct WebDefaults {
    host: String,
    port: u16,
    allowed_origins: Vec<String>,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn data_dir() -> &'static str {
    &DEFAULTS.common.data_dir
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// Maps
pub fn maps_dir() -> &'static str {
    &DEFAULTS.maps.dir
}
pub fn default_map() -> &'static str {
    &DEFAULTS.maps.default_map
}

// Sessions
pub fn session_backend() -> &'static str {
    &DEFAULTS.sessions.backend
}
pub fn sessions_dir() -> &'static str {
    &DEFAULTS.sessions.dir
}
pub fn sqlite_path() -> &'static str {
    &DEFAULTS.sessions.sqlite_path
}
pub fn max_idle_secs() -> u64 {
    DEFAULTS.sessions.max_idle_secs
}
pub fn cleanup_interval_secs() -> u64 {
    DEFAULTS.sessions.cleanup_interval_secs
}
pub fn save_timeout_ms() -> u64 {
    DEFAULTS.sessions.save_timeout_ms
}

// Gameplay
pub fn max_bulk_moves() -> usize {
    DEFAULTS.gameplay.max_bulk_moves
}
pub fn history_page_size() -> usize {
    DEFAULTS.gameplay.history_page_size
}
pub fn history_max_page_size() -> usize {
    DEFAULTS.gameplay.history_max_page_size
}

// Web
pub fn host() -> &'static str {
    &DEFAULTS.web.host
}
pub fn port() -> u16 {
    DEFAULTS.web.port
}
pub fn allowed_origins() -> &'static [String] {
    &DEFAULTS.web.allowed_origins
}

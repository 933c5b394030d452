//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// ============================================================================

fn d_data_dir() -> String {
    defaults::data_dir().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_maps_dir() -> String {
    defaults::maps_dir().into()
}
fn d_default_map() -> String {
    defaults::default_map().into()
}
fn d_backend() -> SessionBackend {
    defaults::session_backend().parse().unwrap_or_default()
}
fn d_sessions_dir() -> String {
    defaults::sessions_dir().into()
}
fn d_sqlite_path() -> String {
    defaults::sqlite_path().into()
}
fn d_max_idle_secs() -> u64 {
    defaults::max_idle_secs()
}
fn d_cleanup_interval_secs() -> u64 {
    defaults::cleanup_interval_secs()
}
fn d_save_timeout_ms() -> u64 {
    defaults::save_timeout_ms()
}
fn d_max_bulk_moves() -> usize {
    defaults::max_bulk_moves()
}
fn d_history_page_size() -> usize {
    defaults::history_page_size()
}
fn d_history_max_page_size() -> usize {
    defaults::history_max_page_size()
}
fn d_host() -> String {
    defaults::host().into()
}
fn d_port() -> u16 {
    defaults::port()
}
fn d_allowed_origins() -> Vec<String> {
    defaults::allowed_origins().to_vec()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub maps: MapsConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub gameplay: GameplayConfig,
    #[serde(default)]
    pub web: WebConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_data_dir")]
    pub data_dir: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir().into(),
            log_level: defaults::log_level().into(),
        }
    }
}

/// Where map files live and which one new sessions get by default
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapsConfig {
    #[serde(default = "d_maps_dir")]
    pub dir: String,
    #[serde(default = "d_default_map")]
    pub default_map: String,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            dir: defaults::maps_dir().into(),
            default_map: defaults::default_map().into(),
        }
    }
}

/// Durable storage backend for sessions
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Memory,
    #[default]
    File,
    Sqlite,
    /// In-memory registry only, no crash recovery
    None,
}

impl FromStr for SessionBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(SessionBackend::Memory),
            "file" => Ok(SessionBackend::File),
            "sqlite" => Ok(SessionBackend::Sqlite),
            "none" | "" => Ok(SessionBackend::None),
            other => Err(format!("unknown session backend '{}'", other)),
        }
    }
}

impl fmt::Display for SessionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionBackend::Memory => "memory",
            SessionBackend::File => "file",
            SessionBackend::Sqlite => "sqlite",
            SessionBackend::None => "none",
        };
        f.write_str(name)
    }
}

/// Session lifecycle and persistence configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionsConfig {
    #[serde(default = "d_backend")]
    pub backend: SessionBackend,
    /// Directory for the file backend (one JSON file per session)
    #[serde(default = "d_sessions_dir")]
    pub dir: String,
    /// Database path for the sqlite backend
    #[serde(default = "d_sqlite_path")]
    pub sqlite_path: String,
    /// Sessions idle longer than this are evicted from memory
    #[serde(default = "d_max_idle_secs")]
    pub max_idle_secs: u64,
    /// How often the eviction sweep runs (0 disables it)
    #[serde(default = "d_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
    /// Upper bound on a single background save
    #[serde(default = "d_save_timeout_ms")]
    pub save_timeout_ms: u64,
}

impl SessionsConfig {
    pub fn max_idle(&self) -> Duration {
        Duration::from_secs(self.max_idle_secs)
    }

    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval_secs > 0).then(|| Duration::from_secs(self.cleanup_interval_secs))
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            backend: d_backend(),
            dir: defaults::sessions_dir().into(),
            sqlite_path: defaults::sqlite_path().into(),
            max_idle_secs: defaults::max_idle_secs(),
            cleanup_interval_secs: defaults::cleanup_interval_secs(),
            save_timeout_ms: defaults::save_timeout_ms(),
        }
    }
}

/// Gameplay limits applied by the service layer
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GameplayConfig {
    /// Ceiling on directions executed by one bulk move request
    #[serde(default = "d_max_bulk_moves")]
    pub max_bulk_moves: usize,
    #[serde(default = "d_history_page_size")]
    pub history_page_size: usize,
    #[serde(default = "d_history_max_page_size")]
    pub history_max_page_size: usize,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            max_bulk_moves: defaults::max_bulk_moves(),
            history_page_size: defaults::history_page_size(),
            history_max_page_size: defaults::history_max_page_size(),
        }
    }
}

/// Web server configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WebConfig {
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default = "d_port")]
    pub port: u16,
    /// CORS allowed origins. `["*"]` or empty allows any origin.
    #[serde(default = "d_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: defaults::host().into(),
            port: defaults::port(),
            allowed_origins: defaults::allowed_origins().to_vec(),
        }
    }
}

//! Tests for the configuration module.

use super::*;
use std::io::Write;
use std::sync::Mutex;

/// Serializes tests that mutate process environment variables
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_default_config() {
    let config = CentralConfig::default();
    assert_eq!(config.common.data_dir, "./data");
    assert_eq!(config.common.log_level, "info");
    assert_eq!(config.maps.dir, "./maps");
    assert_eq!(config.maps.default_map, "classic");
    assert_eq!(config.web.host, "0.0.0.0");
    assert_eq!(config.web.port, 8080);
}

#[test]
fn test_session_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.sessions.backend, SessionBackend::File);
    assert_eq!(config.sessions.dir, "./data/sessions");
    assert_eq!(config.sessions.sqlite_path, "./data/sessions.db");
    assert_eq!(config.sessions.max_idle_secs, 86400);
    assert_eq!(config.sessions.cleanup_interval_secs, 300);
    assert_eq!(config.sessions.save_timeout_ms, 2000);
}

#[test]
fn test_gameplay_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.gameplay.max_bulk_moves, 50);
    assert_eq!(config.gameplay.history_page_size, 20);
    assert_eq!(config.gameplay.history_max_page_size, 100);
}

#[test]
fn test_session_duration_helpers() {
    let mut sessions = SessionsConfig::default();
    assert_eq!(sessions.max_idle().as_secs(), 86400);
    assert_eq!(sessions.save_timeout().as_millis(), 2000);
    assert_eq!(sessions.cleanup_interval().map(|d| d.as_secs()), Some(300));

    sessions.cleanup_interval_secs = 0;
    assert!(sessions.cleanup_interval().is_none());
}

#[test]
fn test_backend_parsing() {
    assert_eq!("memory".parse::<SessionBackend>(), Ok(SessionBackend::Memory));
    assert_eq!("FILE".parse::<SessionBackend>(), Ok(SessionBackend::File));
    assert_eq!(" sqlite ".parse::<SessionBackend>(), Ok(SessionBackend::Sqlite));
    assert_eq!("none".parse::<SessionBackend>(), Ok(SessionBackend::None));
    assert!("redis".parse::<SessionBackend>().is_err());
    assert_eq!(SessionBackend::Sqlite.to_string(), "sqlite");
}

#[test]
fn test_parse_config_toml() {
    let toml_content = r#"
[common]
data_dir = "/custom/data"

[maps]
dir = "/srv/maps"
default_map = "easy"

[sessions]
backend = "sqlite"
sqlite_path = "/srv/data/sessions.db"
max_idle_secs = 60

[gameplay]
max_bulk_moves = 10
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.data_dir, "/custom/data");
    assert_eq!(config.maps.dir, "/srv/maps");
    assert_eq!(config.maps.default_map, "easy");
    assert_eq!(config.sessions.backend, SessionBackend::Sqlite);
    assert_eq!(config.sessions.sqlite_path, "/srv/data/sessions.db");
    assert_eq!(config.sessions.max_idle_secs, 60);
    assert_eq!(config.gameplay.max_bulk_moves, 10);
}

#[test]
fn test_partial_config() {
    let toml_content = r#"
[maps]
default_map = "easy"
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.maps.default_map, "easy");
    assert_eq!(config.maps.dir, "./maps"); // Default
    assert_eq!(config.common.data_dir, "./data"); // Default
    assert_eq!(config.sessions.backend, SessionBackend::File); // Default
    assert_eq!(config.web.port, 8080); // Default
}

#[test]
fn test_web_config() {
    let toml_content = r#"
[web]
host = "127.0.0.1"
port = 3000
allowed_origins = ["https://example.com"]
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.web.host, "127.0.0.1");
    assert_eq!(config.web.port, 3000);
    assert_eq!(config.web.allowed_origins, vec!["https://example.com"]);
}

#[test]
fn test_env_overrides() {
    let _guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    std::env::set_var("ROADTRIP_MAPS_DEFAULT_MAP", "hard");
    std::env::set_var("ROADTRIP_SESSIONS_BACKEND", "memory");
    std::env::set_var("ROADTRIP_GAMEPLAY_MAX_BULK_MOVES", "7");
    std::env::set_var("ROADTRIP_WEB_ALLOWED_ORIGINS", "https://a.test, https://b.test");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.maps.default_map, "hard");
    assert_eq!(config.sessions.backend, SessionBackend::Memory);
    assert_eq!(config.gameplay.max_bulk_moves, 7);
    assert_eq!(
        config.web.allowed_origins,
        vec!["https://a.test".to_string(), "https://b.test".to_string()]
    );

    std::env::remove_var("ROADTRIP_MAPS_DEFAULT_MAP");
    std::env::remove_var("ROADTRIP_SESSIONS_BACKEND");
    std::env::remove_var("ROADTRIP_GAMEPLAY_MAX_BULK_MOVES");
    std::env::remove_var("ROADTRIP_WEB_ALLOWED_ORIGINS");
}

#[test]
fn test_unparsable_env_override_is_ignored() {
    let _guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    std::env::set_var("ROADTRIP_WEB_PORT", "not-a-port");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.web.port, 8080);

    std::env::remove_var("ROADTRIP_WEB_PORT");
}

#[test]
fn test_load_from_path() {
    let _guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[web]\nport = 9999").unwrap();

    let config = load_from_path(&path);
    assert_eq!(config.web.port, 9999);
    assert_eq!(config.web.host, "0.0.0.0");
}

#[test]
fn test_load_from_path_falls_back_on_bad_toml() {
    let _guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is [not toml").unwrap();

    let config = load_from_path(&path);
    assert_eq!(config.web.port, 8080);
    assert_eq!(config.maps.default_map, "classic");
}

#[test]
fn test_load_from_missing_path_uses_defaults() {
    let _guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let config = load_from_path(&dir.path().join("absent.toml"));
    assert_eq!(config.gameplay.max_bulk_moves, 50);
}

#[test]
fn test_config_clone() {
    let config = CentralConfig::default();
    let cloned = config.clone();
    assert_eq!(config.maps.default_map, cloned.maps.default_map);
    assert_eq!(config.sessions.backend, cloned.sessions.backend);
}

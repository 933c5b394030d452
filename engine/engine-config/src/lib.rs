//! Centralized configuration loading from config.toml.
//!
//! This crate provides configuration structs and loading logic shared
//! across all Rust components (session registry, web server).
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`ROADTRIP_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults (config.defaults.toml, embedded at compile time)
//!
//! Binaries may layer CLI flags on top of the loaded value.
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! ROADTRIP_<SECTION>_<KEY>=value
//!
//! Examples:
//!     ROADTRIP_COMMON_DATA_DIR=/data
//!     ROADTRIP_MAPS_DEFAULT_MAP=easy
//!     ROADTRIP_SESSIONS_BACKEND=sqlite
//!     ROADTRIP_WEB_PORT=3000
//!     ROADTRIP_GAMEPLAY_MAX_BULK_MOVES=25
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{apply_env_overrides, load_config, load_from_path, CONFIG_SEARCH_PATHS};
pub use structs::*;

#[cfg(test)]
mod tests;

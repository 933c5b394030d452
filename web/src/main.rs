//! Road trip web server
//!
//! HTTP surface over the game service. Endpoints:
//! - GET    /health                 - Health check
//! - GET    /metrics                - Prometheus metrics
//! - GET    /maps                   - List playable maps
//! - GET    /sessions               - List live sessions
//! - POST   /sessions               - Start a session
//! - GET    /sessions/:id           - Session metadata and state
//! - DELETE /sessions/:id           - Delete a session
//! - POST   /sessions/:id/move      - Make one move
//! - POST   /sessions/:id/bulk-move - Make several moves
//! - POST   /sessions/:id/reset     - Restart on the same map
//! - GET    /sessions/:id/history   - Paginated move history

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use clap::Parser;
use engine_config::{load_config, load_from_path, CentralConfig};
use engine_session::GameService;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

mod handlers;
mod metrics;
mod types;

use handlers::{
    bulk_move, create_session, delete_session, get_history, get_session, health, list_maps,
    list_sessions, make_move, metrics_handler, reset_session,
};

/// Shared application state
pub struct AppState {
    pub service: GameService,
}

#[derive(Parser, Debug)]
#[command(name = "roadtrip-web")]
#[command(about = "Road trip battery puzzle - HTTP API")]
#[command(
    long_about = "Serves the road trip game over HTTP.

Configuration is loaded from config.toml with ROADTRIP_* environment variable
overrides. CLI arguments take highest priority."
)]
struct Cli {
    /// Path to config.toml (skips the search path)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Directory of <id>.json map files
    #[arg(long)]
    maps_dir: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn load(&self) -> CentralConfig {
        let mut config = match &self.config {
            Some(path) => load_from_path(path),
            None => load_config(),
        };
        if let Some(host) = &self.host {
            config.web.host = host.clone();
        }
        if let Some(port) = self.port {
            config.web.port = port;
        }
        if let Some(dir) = &self.maps_dir {
            config.maps.dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.common.log_level = level.clone();
        }
        config
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}

/// Create the application router with the given state.
/// This is separated out for testing purposes.
pub fn create_app(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    metrics::init_metrics();

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route("/maps", get(list_maps))
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/move", post(make_move))
        .route("/sessions/:id/bulk-move", post(bulk_move))
        .route("/sessions/:id/reset", post(reset_session))
        .route("/sessions/:id/history", get(get_history))
        .layer(middleware::from_fn(metrics::track_latency))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

/// Create application state for testing: the sample maps shipped with the
/// repository and an in-memory registry.
#[cfg(test)]
pub fn create_test_state() -> Arc<AppState> {
    use engine_maps::MapCatalog;
    use engine_session::{ServiceLimits, SessionRegistry};

    let maps_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../maps");
    let registry = SessionRegistry::in_memory(Arc::new(MapCatalog::new(maps_dir)));
    Arc::new(AppState {
        service: GameService::new(Arc::new(registry), "small", ServiceLimits::default()),
    })
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Periodically evict idle sessions from memory.
fn spawn_cleanup(state: Arc<AppState>, interval: Duration, max_idle: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let registry = state.service.registry();
            let removed = registry.cleanup_expired(max_idle);
            metrics::SESSIONS_ACTIVE.set(registry.count() as i64);
            if removed > 0 {
                info!(removed, "Idle sessions evicted");
            }
        }
    });
}

/// Creates a future that completes when a shutdown signal is received.
/// Handles Ctrl+C on all platforms.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load();
    init_tracing(&config.common.log_level);

    info!(
        maps_dir = %config.maps.dir,
        default_map = %config.maps.default_map,
        backend = %config.sessions.backend,
        "Configuration loaded"
    );

    let service = GameService::from_config(&config)?;
    let loaded = service.registry().load_persisted_sessions().await;
    metrics::init_metrics();
    metrics::SESSIONS_ACTIVE.set(loaded as i64);

    let state = Arc::new(AppState { service });

    if let Some(interval) = config.sessions.cleanup_interval() {
        spawn_cleanup(
            Arc::clone(&state),
            interval,
            config.sessions.max_idle(),
        );
    }

    let app = create_app(Arc::clone(&state), &config.web.allowed_origins);

    let addr = format!("{}:{}", config.web.host, config.web.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let saved = state.service.registry().save_all_sessions().await;
    info!(saved, "Server shut down gracefully");
    Ok(())
}

#[cfg(test)]
mod tests;

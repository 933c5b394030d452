//! Prometheus metrics for the web server component.
//!
//! Session lifecycle, moves played, finished games by outcome and request
//! latency per route.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use engine_session::GameEvent;
use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Once;
use tracing::warn;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ========== Session Metrics ==========

    /// Total sessions created
    pub static ref SESSIONS_CREATED: IntCounter = IntCounter::with_opts(
        Opts::new("roadtrip_sessions_created_total", "Total sessions created")
    ).unwrap();

    /// Sessions currently held in memory
    pub static ref SESSIONS_ACTIVE: IntGauge = IntGauge::with_opts(
        Opts::new("roadtrip_sessions_active", "Sessions currently held in memory")
    ).unwrap();

    // ========== Gameplay Metrics ==========

    /// Moves attempted across all sessions
    pub static ref MOVES_PLAYED: IntCounter = IntCounter::with_opts(
        Opts::new("roadtrip_moves_played_total", "Moves attempted across all sessions")
    ).unwrap();

    /// Finished games by outcome (victory, stranded, crashed, out_of_battery)
    pub static ref GAMES_COMPLETED: IntCounterVec = IntCounterVec::new(
        Opts::new("roadtrip_games_completed_total", "Games finished, by outcome"),
        &["outcome"]
    ).unwrap();

    // ========== Request Latency ==========

    /// HTTP request latency by endpoint and method
    pub static ref REQUEST_LATENCY: HistogramVec = HistogramVec::new(
        HistogramOpts::new("roadtrip_request_duration_seconds", "HTTP request latency")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["endpoint", "method"]
    ).unwrap();
}

static INIT: Once = Once::new();

/// Initialize and register all metrics with the registry.
/// Safe to call multiple times - only initializes once.
pub fn init_metrics() {
    INIT.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(SESSIONS_CREATED.clone()),
            Box::new(SESSIONS_ACTIVE.clone()),
            Box::new(MOVES_PLAYED.clone()),
            Box::new(GAMES_COMPLETED.clone()),
            Box::new(REQUEST_LATENCY.clone()),
        ];
        for collector in collectors {
            if let Err(e) = REGISTRY.register(collector) {
                warn!(error = %e, "Failed to register metric");
            }
        }
    });
}

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Count moves and finished games from a request's results
pub fn record_moves(attempted: usize, events: &[GameEvent]) {
    MOVES_PLAYED.inc_by(attempted as u64);
    for event in events {
        match event {
            GameEvent::Victory { .. } => GAMES_COMPLETED.with_label_values(&["victory"]).inc(),
            GameEvent::GameOver { reason } => {
                GAMES_COMPLETED.with_label_values(&[reason.as_str()]).inc()
            }
            _ => {}
        }
    }
}

/// Middleware timing every routed request
pub async fn track_latency(req: Request, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = req.method().to_string();

    let timer = REQUEST_LATENCY
        .with_label_values(&[endpoint.as_str(), method.as_str()])
        .start_timer();
    let response = next.run(req).await;
    timer.observe_duration();
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_init() {
        init_metrics();
        init_metrics();
    }

    #[test]
    fn test_encode_metrics() {
        init_metrics();
        SESSIONS_CREATED.inc();
        record_moves(
            2,
            &[GameEvent::GameOver {
                reason: "stranded".into(),
            }],
        );
        let output = encode_metrics();
        assert!(output.contains("roadtrip_sessions_created_total"));
        assert!(output.contains("roadtrip_moves_played_total"));
        assert!(output.contains("outcome=\"stranded\""));
    }
}

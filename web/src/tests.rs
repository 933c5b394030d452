//! Router tests driven through `oneshot`.
//!
//! The test state serves the sample maps from the repository's `maps/`
//! directory with "small" as the default map: start (3,3), parks at (2,0)
//! and (2,4).

use super::*;
use crate::types::{DeleteResponse, HealthResponse, MapsResponse, SessionsResponse};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use engine_core::{Direction, Position};
use engine_session::{BulkMoveOutcome, GameEvent, HistoryPage, MoveOutcome, SessionView};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tower::ServiceExt;

fn app(state: &Arc<AppState>) -> Router {
    create_app(Arc::clone(state), &[])
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_str = String::from_utf8(body.to_vec()).unwrap();
    (status, body_str)
}

/// Helper to make a GET request and return response body as string
async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

/// Helper to make a POST request with JSON body and return response
async fn post_json(app: Router, uri: &str, json: &str) -> (StatusCode, String) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
    )
    .await
}

async fn delete(app: Router, uri: &str) -> (StatusCode, String) {
    send(
        app,
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

fn parse<T: DeserializeOwned>(body: &str) -> T {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("bad body {}: {}", body, e))
}

async fn new_session(state: &Arc<AppState>, json: &str) -> SessionView {
    let (status, body) = post_json(app(state), "/sessions", json).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    parse(&body)
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = create_test_state();
    let (status, body) = get(app(&state), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let response: HealthResponse = parse(&body);
    assert_eq!(response.status, "ok");
    assert_eq!(response.sessions, 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let state = create_test_state();
    new_session(&state, "{}").await;

    let (status, body) = get(app(&state), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("roadtrip_sessions_created_total"));
    assert!(body.contains("roadtrip_request_duration_seconds"));
}

#[tokio::test]
async fn test_list_maps() {
    let state = create_test_state();
    let (status, body) = get(app(&state), "/maps").await;

    assert_eq!(status, StatusCode::OK);
    let response: MapsResponse = parse(&body);
    assert_eq!(response.default_map, "small");
    let ids: Vec<&str> = response.maps.iter().map(|m| m.id.as_str()).collect();
    assert!(ids.contains(&"small"));
    assert!(ids.contains(&"canyon"));
    assert!(ids.contains(&"classic"));
}

#[tokio::test]
async fn test_create_session_defaults() {
    let state = create_test_state();
    let view = new_session(&state, "{}").await;

    assert_eq!(view.id.len(), engine_session::GENERATED_ID_LEN);
    assert_eq!(view.map_id, "small");
    assert_eq!(view.state.position, Position::new(3, 3));
    assert_eq!(view.state.battery, 10);
    assert_eq!(view.state.total_parks, 2);
    assert_eq!(view.grid.len(), 5);

    let (status, body) = get(app(&state), &format!("/sessions/{}", view.id)).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: SessionView = parse(&body);
    assert_eq!(fetched.id, view.id);
}

#[tokio::test]
async fn test_create_session_errors() {
    let state = create_test_state();
    new_session(&state, r#"{"id": "trip"}"#).await;

    let (status, _) = post_json(app(&state), "/sessions", r#"{"id": "TRIP"}"#).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = post_json(app(&state), "/sessions", r#"{"map": "atlantis"}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Map not found"));

    let (status, _) = post_json(app(&state), "/sessions", r#"{"id": "no/slashes"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let state = create_test_state();
    let (status, body) = get(app(&state), "/sessions/zzzz").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Session not found"));

    let (status, _) = post_json(app(&state), "/sessions/zzzz/move", r#"{"direction": "up"}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_move_to_park() {
    let state = create_test_state();
    let id = new_session(&state, "{}").await.id;
    let uri = format!("/sessions/{}/move", id);

    let (status, body) = post_json(app(&state), &uri, r#"{"direction": "down"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let first: MoveOutcome = parse(&body);
    assert!(first.success);
    assert_eq!(first.state.position, Position::new(3, 4));
    assert_eq!(first.state.battery, 9);

    let (status, body) = post_json(app(&state), &uri, r#"{"direction": "LEFT"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let second: MoveOutcome = parse(&body);
    assert_eq!(second.state.score, 1);
    assert!(second.events.contains(&GameEvent::ParkVisited {
        park_id: "park_1".into(),
        score: 1,
    }));
}

#[tokio::test]
async fn test_move_rejects_bad_direction() {
    let state = create_test_state();
    let id = new_session(&state, "{}").await.id;

    let (status, body) = post_json(
        app(&state),
        &format!("/sessions/{}/move", id),
        r#"{"direction": "sideways"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid direction"));
}

#[tokio::test]
async fn test_wall_crash_and_finished_game() {
    let state = create_test_state();
    let id = new_session(&state, r#"{"map": "canyon"}"#).await.id;
    let uri = format!("/sessions/{}/move", id);

    let (status, body) = post_json(app(&state), &uri, r#"{"direction": "up"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let crash: MoveOutcome = parse(&body);
    assert!(!crash.success);
    assert!(crash.state.game_over);
    assert!(!crash.state.victory);
    assert_eq!(crash.state.position, Position::new(3, 3));
    assert_eq!(crash.message, "You scraped the canyon wall! Trip over!");

    // Moving on a finished game is a normal response, not an error
    let (status, body) = post_json(app(&state), &uri, r#"{"direction": "left"}"#).await;
    assert_eq!(status, StatusCode::OK);
    let after: MoveOutcome = parse(&body);
    assert!(!after.success);
    assert!(after.step.is_none());
    assert!(after.message.contains("already over"));

    let (status, body) =
        post_json(app(&state), &uri, r#"{"direction": "left", "reset": true}"#).await;
    assert_eq!(status, StatusCode::OK);
    let restarted: MoveOutcome = parse(&body);
    assert!(restarted.success);
    assert_eq!(restarted.events[0], GameEvent::Reset);
}

#[tokio::test]
async fn test_bulk_move() {
    let state = create_test_state();
    let id = new_session(&state, "{}").await.id;

    let (status, body) = post_json(
        app(&state),
        &format!("/sessions/{}/bulk-move", id),
        r#"{"directions": ["down", "left", "right", "up", "up", "up", "left", "up", "up"]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let outcome: BulkMoveOutcome = parse(&body);
    assert_eq!(outcome.requested, 9);
    assert_eq!(outcome.executed, 8);
    assert_eq!(outcome.stopped_on_move, Some(8));
    assert_eq!(outcome.stop_reason, engine_core::StopReason::Victory);
    assert_eq!(outcome.end_position, Position::new(2, 0));
    assert_eq!(outcome.score_delta, 2);
    assert!(outcome.state.victory);
}

#[tokio::test]
async fn test_bulk_move_limit_and_alias() {
    let state = create_test_state();
    let id = new_session(&state, "{}").await.id;

    let moves: Vec<&str> = (0..60).map(|i| if i % 2 == 0 { "up" } else { "down" }).collect();
    let json = serde_json::json!({ "moves": moves }).to_string();
    let (status, body) = post_json(app(&state), &format!("/sessions/{}/bulk-move", id), &json).await;
    assert_eq!(status, StatusCode::OK);
    let outcome: BulkMoveOutcome = parse(&body);
    assert_eq!(outcome.requested, 60);
    assert_eq!(outcome.executed, 50);
    assert!(outcome.truncated);
    assert_eq!(outcome.stop_reason, engine_core::StopReason::Limit);

    let (status, _) = post_json(
        app(&state),
        &format!("/sessions/{}/bulk-move", id),
        r#"{"directions": ["up", "jump"]}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_and_reset() {
    let state = create_test_state();
    let id = new_session(&state, "{}").await.id;
    post_json(
        app(&state),
        &format!("/sessions/{}/bulk-move", id),
        r#"{"directions": ["up", "down", "up"]}"#,
    )
    .await;

    let (status, body) = get(
        app(&state),
        &format!("/sessions/{}/history?page=1&page_size=2&order=asc", id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let page: HistoryPage = parse(&body);
    assert_eq!(page.total_moves, 3);
    assert_eq!(page.total_pages, 2);
    assert!(page.has_next);
    assert_eq!(page.entries[0].move_number, 1);
    assert_eq!(page.entries[0].direction, Direction::Up);

    let (status, body) = get(app(&state), &format!("/sessions/{}/history", id)).await;
    assert_eq!(status, StatusCode::OK);
    let newest: HistoryPage = parse(&body);
    assert_eq!(newest.entries[0].move_number, 3);

    let (status, _) = get(app(&state), &format!("/sessions/{}/history?order=up", id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(app(&state), &format!("/sessions/{}/reset", id), "").await;
    assert_eq!(status, StatusCode::OK);
    let view: SessionView = parse(&body);
    assert_eq!(view.state.moves_made, 0);
    assert_eq!(view.state.position, Position::new(3, 3));
}

#[tokio::test]
async fn test_list_and_delete_sessions() {
    let state = create_test_state();
    new_session(&state, r#"{"id": "one"}"#).await;
    new_session(&state, r#"{"id": "two", "map": "canyon"}"#).await;

    let (status, body) = get(app(&state), "/sessions").await;
    assert_eq!(status, StatusCode::OK);
    let list: SessionsResponse = parse(&body);
    assert_eq!(list.count, 2);

    let (status, body) = delete(app(&state), "/sessions/ONE").await;
    assert_eq!(status, StatusCode::OK);
    let deleted: DeleteResponse = parse(&body);
    assert_eq!(deleted.id, "one");
    assert!(deleted.deleted);

    let (status, _) = delete(app(&state), "/sessions/one").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get(app(&state), "/health").await;
    let health: HealthResponse = parse(&body);
    assert_eq!(health.sessions, 1);
}

#[test]
fn test_cli_overrides_config() {
    let cli = Cli::parse_from([
        "roadtrip-web",
        "--config",
        "/nonexistent/config.toml",
        "--port",
        "9999",
        "--host",
        "127.0.0.1",
        "--maps-dir",
        "/srv/maps",
    ]);
    let config = cli.load();
    assert_eq!(config.web.port, 9999);
    assert_eq!(config.web.host, "127.0.0.1");
    assert_eq!(config.maps.dir, "/srv/maps");
}

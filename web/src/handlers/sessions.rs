//! Session and gameplay handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use engine_core::{Direction, EngineError};
use engine_session::{
    parse_directions, BulkMoveOutcome, HistoryOrder, HistoryPage, HistoryQuery, MoveOutcome,
    SessionError, SessionView,
};
use std::sync::Arc;
use tracing::{error, warn};

use crate::metrics::{self, SESSIONS_ACTIVE, SESSIONS_CREATED};
use crate::types::{
    BulkMoveRequest, CreateSessionRequest, DeleteResponse, HistoryParams, MapsResponse,
    MoveRequest, SessionsResponse,
};
use crate::AppState;

type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Translate a service error into a status code and message.
pub fn error_response(err: SessionError) -> (StatusCode, String) {
    let status = match &err {
        SessionError::NotFound(_) | SessionError::MapNotFound(_) => StatusCode::NOT_FOUND,
        SessionError::AlreadyExists(_) => StatusCode::CONFLICT,
        SessionError::InvalidId(_) | SessionError::Engine(EngineError::InvalidDirection(_)) => {
            StatusCode::BAD_REQUEST
        }
        SessionError::IdExhausted(_)
        | SessionError::Engine(_)
        | SessionError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    } else {
        warn!(error = %err, status = status.as_u16(), "Request rejected");
    }
    (status, err.to_string())
}

fn refresh_active(state: &AppState) {
    SESSIONS_ACTIVE.set(state.service.registry().count() as i64);
}

/// List playable maps.
pub async fn list_maps(State(state): State<Arc<AppState>>) -> Json<MapsResponse> {
    Json(MapsResponse {
        default_map: state.service.default_map().to_string(),
        maps: state.service.list_maps(),
    })
}

/// List live sessions.
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<SessionsResponse> {
    let sessions = state.service.list_sessions().await;
    Json(SessionsResponse {
        count: sessions.len(),
        sessions,
    })
}

/// Start a new session.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let view = state
        .service
        .create_session(req.map.as_deref(), req.id.as_deref())
        .await
        .map_err(error_response)?;
    SESSIONS_CREATED.inc();
    refresh_active(&state);
    Ok((StatusCode::CREATED, Json(view)))
}

/// Get session metadata and state.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionView>> {
    let view = state.service.get_session(&id).await.map_err(error_response)?;
    Ok(Json(view))
}

/// Delete a session from memory and storage.
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    state
        .service
        .delete_session(&id)
        .await
        .map_err(error_response)?;
    refresh_active(&state);
    Ok(Json(DeleteResponse {
        id: id.to_ascii_lowercase(),
        deleted: true,
    }))
}

/// Make one move.
pub async fn make_move(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<Json<MoveOutcome>> {
    let direction: Direction = req
        .direction
        .parse()
        .map_err(|e: EngineError| error_response(e.into()))?;
    let outcome = state
        .service
        .move_once(&id, direction, req.reset)
        .await
        .map_err(error_response)?;
    metrics::record_moves(usize::from(outcome.step.is_some()), &outcome.events);
    Ok(Json(outcome))
}

/// Run a batch of moves.
pub async fn bulk_move(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<BulkMoveRequest>,
) -> ApiResult<Json<BulkMoveOutcome>> {
    let directions = parse_directions(req.directions.as_slice()).map_err(error_response)?;
    let outcome = state
        .service
        .bulk_move(&id, &directions, req.reset)
        .await
        .map_err(error_response)?;
    metrics::record_moves(outcome.executed, &outcome.events);
    Ok(Json(outcome))
}

/// Reset a session to its map's starting state.
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionView>> {
    let view = state.service.reset(&id).await.map_err(error_response)?;
    Ok(Json(view))
}

/// One page of move history.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<HistoryPage>> {
    let order = match params.order.as_deref() {
        Some(order) => order
            .parse::<HistoryOrder>()
            .map_err(|e| (StatusCode::BAD_REQUEST, e))?,
        None => HistoryOrder::default(),
    };
    let query = HistoryQuery {
        page: params.page,
        page_size: params.page_size,
        order,
    };
    let page = state
        .service
        .history(&id, query)
        .await
        .map_err(error_response)?;
    Ok(Json(page))
}

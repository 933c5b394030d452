//! Game service: the operations transport layers wrap.
//!
//! Every call resolves the session through the registry (which touches it),
//! works on the engine under the session lock, and schedules a background
//! save after any mutation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use engine_session::GameService;
//!
//! let service = GameService::from_config(&config)?;
//! let view = service.create_session(None, None).await?;
//! let outcome = service.move_once(&view.id, Direction::Up, false).await?;
//! ```

mod types;

pub use types::{
    BulkMoveOutcome, GameEvent, HistoryOrder, HistoryPage, HistoryQuery, MoveOutcome,
    SessionView,
};

use crate::error::{Result, SessionError};
use crate::registry::SessionRegistry;
use crate::store::create_session_store;
use engine_config::{CentralConfig, GameplayConfig};
use engine_core::{Direction, EngineError};
use engine_maps::{MapCatalog, MapProvider, MapSummary};
use std::sync::Arc;
use tracing::{debug, info};
use types::EventTracker;

/// Request limits applied by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceLimits {
    pub max_bulk_moves: usize,
    pub history_page_size: usize,
    pub history_max_page_size: usize,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        Self::from(&GameplayConfig::default())
    }
}

impl ServiceLimits {
    /// Page sizes pulled into `1..=history_max_page_size`
    pub fn normalized(self) -> Self {
        let history_max_page_size = self.history_max_page_size.max(1);
        Self {
            max_bulk_moves: self.max_bulk_moves,
            history_page_size: self.history_page_size.clamp(1, history_max_page_size),
            history_max_page_size,
        }
    }
}

impl From<&GameplayConfig> for ServiceLimits {
    fn from(config: &GameplayConfig) -> Self {
        Self {
            max_bulk_moves: config.max_bulk_moves,
            history_page_size: config.history_page_size,
            history_max_page_size: config.history_max_page_size,
        }
        .normalized()
    }
}

pub struct GameService {
    registry: Arc<SessionRegistry>,
    default_map: String,
    limits: ServiceLimits,
}

impl GameService {
    pub fn new(
        registry: Arc<SessionRegistry>,
        default_map: impl Into<String>,
        limits: ServiceLimits,
    ) -> Self {
        Self {
            registry,
            default_map: default_map.into(),
            limits: limits.normalized(),
        }
    }

    /// Wire up maps, persistence and the registry from configuration.
    pub fn from_config(config: &CentralConfig) -> anyhow::Result<Self> {
        let maps: Arc<dyn MapProvider> = Arc::new(MapCatalog::new(&config.maps.dir));
        let store = create_session_store(&config.sessions)?;
        let registry = Arc::new(SessionRegistry::new(
            maps,
            store,
            config.sessions.save_timeout(),
        ));
        info!(
            maps_dir = %config.maps.dir,
            default_map = %config.maps.default_map,
            "Game service ready"
        );
        Ok(Self::new(
            registry,
            config.maps.default_map.clone(),
            ServiceLimits::from(&config.gameplay),
        ))
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn default_map(&self) -> &str {
        &self.default_map
    }

    pub fn limits(&self) -> ServiceLimits {
        self.limits
    }

    pub fn list_maps(&self) -> Vec<MapSummary> {
        self.registry.maps().list_maps()
    }

    /// Start a session on `map_ref`, or on the default map when unset.
    pub async fn create_session(
        &self,
        map_ref: Option<&str>,
        id: Option<&str>,
    ) -> Result<SessionView> {
        let map_id = map_ref
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_map);
        let session = self.registry.create(id, map_id).await?;
        let engine = session.engine().await;
        Ok(SessionView::new(&session, &engine))
    }

    pub async fn get_session(&self, id: &str) -> Result<SessionView> {
        let session = self.registry.get(id).await?;
        let engine = session.engine().await;
        Ok(SessionView::new(&session, &engine))
    }

    /// Live sessions, oldest first
    pub async fn list_sessions(&self) -> Vec<SessionView> {
        let mut views = Vec::new();
        for session in self.registry.list() {
            let engine = session.engine().await;
            views.push(SessionView::new(&session, &engine));
        }
        views
    }

    pub async fn delete_session(&self, id: &str) -> Result<()> {
        self.registry.delete(id).await
    }

    pub async fn reset(&self, id: &str) -> Result<SessionView> {
        let session = self.registry.get(id).await?;
        let view = {
            let mut engine = session.engine().await;
            engine.reset();
            SessionView::new(&session, &engine)
        };
        debug!(session_id = %session.id(), "Session reset");
        self.registry.schedule_save(&session);
        Ok(view)
    }

    /// One move. A move on a finished game is reported as an unsuccessful
    /// outcome rather than an error.
    pub async fn move_once(
        &self,
        id: &str,
        direction: Direction,
        reset_first: bool,
    ) -> Result<MoveOutcome> {
        let session = self.registry.get(id).await?;
        let outcome = {
            let mut engine = session.engine().await;
            let mut tracker = EventTracker::new(&engine);
            if reset_first {
                engine.reset();
                tracker.reset(&engine);
            }

            let attempted_to = engine.position().step(direction);
            let (step, message) = match engine.move_dir(direction) {
                Ok(record) => {
                    tracker.step(&record, &engine);
                    (Some(record), engine.message().to_string())
                }
                Err(EngineError::AlreadyOver) => (None, EngineError::AlreadyOver.to_string()),
                Err(e) => return Err(e.into()),
            };
            let events = tracker.finish(step.as_ref(), &engine);

            MoveOutcome {
                success: step.as_ref().is_some_and(|s| s.success),
                state: engine.status(),
                message,
                step,
                attempted_to,
                events,
                possible_moves: engine.possible_moves(),
                local_view_3x3: engine.local_view_3x3(),
                battery_risk: engine.battery_risk(),
            }
        };

        debug!(
            session_id = %session.id(),
            direction = %direction.as_str(),
            success = outcome.success,
            "Move"
        );
        self.registry.schedule_save(&session);
        Ok(outcome)
    }

    /// Run directions in order, stopping at the first failure, the first
    /// terminal transition or `max_bulk_moves`.
    pub async fn bulk_move(
        &self,
        id: &str,
        directions: &[Direction],
        reset_first: bool,
    ) -> Result<BulkMoveOutcome> {
        let session = self.registry.get(id).await?;
        let outcome = {
            let mut engine = session.engine().await;
            let mut tracker = EventTracker::new(&engine);
            if reset_first {
                engine.reset();
                tracker.reset(&engine);
            }

            let start_position = engine.position();
            let start_battery = engine.battery();
            let start_score = engine.score();

            let result = engine.bulk_move(directions, self.limits.max_bulk_moves);
            for step in &result.steps {
                tracker.step(step, &engine);
            }
            let events = tracker.finish(result.steps.last(), &engine);

            BulkMoveOutcome {
                requested: result.requested,
                executed: result.executed,
                succeeded: result.succeeded,
                truncated: result.truncated,
                limit: result.limit,
                stop_reason: result.stop_reason,
                stopped_on_move: result.stopped_on_move,
                steps: result.steps,
                events,
                start_position,
                end_position: engine.position(),
                start_battery,
                end_battery: engine.battery(),
                score_delta: engine.score().saturating_sub(start_score),
                state: engine.status(),
                possible_moves: engine.possible_moves(),
                local_view_3x3: engine.local_view_3x3(),
                battery_risk: engine.battery_risk(),
            }
        };

        debug!(
            session_id = %session.id(),
            executed = outcome.executed,
            stop_reason = %outcome.stop_reason.as_str(),
            "Bulk move"
        );
        self.registry.schedule_save(&session);
        Ok(outcome)
    }

    /// One page of the move history.
    pub async fn history(&self, id: &str, query: HistoryQuery) -> Result<HistoryPage> {
        let session = self.registry.get(id).await?;
        let engine = session.engine().await;
        let history = engine.history();

        let page_size = query
            .page_size
            .unwrap_or(self.limits.history_page_size)
            .clamp(1, self.limits.history_max_page_size);
        let page = query.page.unwrap_or(1).max(1);
        let total_moves = history.len();
        let total_pages = total_moves.div_ceil(page_size).max(1);
        let offset = (page - 1).saturating_mul(page_size);

        let entries = match query.order {
            HistoryOrder::Asc => history.iter().skip(offset).take(page_size).cloned().collect(),
            HistoryOrder::Desc => history
                .iter()
                .rev()
                .skip(offset)
                .take(page_size)
                .cloned()
                .collect(),
        };

        Ok(HistoryPage {
            session_id: session.id().to_string(),
            page,
            page_size,
            order: query.order,
            total_moves,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
            entries,
        })
    }
}

/// Parse direction names, failing on the first unknown one.
pub fn parse_directions<S: AsRef<str>>(names: &[S]) -> Result<Vec<Direction>> {
    names
        .iter()
        .map(|name| {
            name.as_ref()
                .parse::<Direction>()
                .map_err(SessionError::from)
        })
        .collect()
}

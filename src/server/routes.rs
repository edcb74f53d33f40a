//! HTTP control and delivery surface
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | `POST` | `/sessions/:session` | Start or restart a session |
//! | `DELETE` | `/sessions/:session` | Stop a session |
//! | `GET` | `/sessions/:session` | Current source and labels |
//! | `POST` | `/sessions/:session/pause` | Pause deliveries |
//! | `POST` | `/sessions/:session/resume` | Resume deliveries |
//! | `GET` | `/sessions/:session/paused` | Pause state |
//! | `GET` | `/sessions/:session/on-court` | Players on court |
//! | `GET` | `/sessions/:session/stats` | Session statistics |
//! | `POST` | `/sessions/:session/consumers/:consumer/pop` | Next shot, acknowledged |
//! | `GET` | `/sessions/:session/consumers/:consumer/peek` | Next shot, not acknowledged |
//! | `POST` | `/sessions/:session/consumers/:consumer/ack/:sequence` | Acknowledge a shot |
//! | `GET` | `/health` | Liveness and session count |
//!
//! A delivery with nothing to hand out (paused, or drained) is `204 No
//! Content`; a pending reset is `200 {"reset": true}`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::feed::FeedSource;
use crate::ingest::RosterSnapshot;
use crate::registry::entry::{DEFAULT_AWAY_LABEL, DEFAULT_HOME_LABEL};
use crate::registry::{Delivery, RegistryError, SessionInfo, SessionRegistry, TeamLabels};
use crate::stats::SessionStats;

/// Error returned by route handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError::Registry(err) = self;
        let (status, code) = match &err {
            RegistryError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            RegistryError::InvalidId(_) | RegistryError::UnknownSequence(_) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            RegistryError::PollerJoin(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if !err.is_client_error() {
            tracing::error!(error = %err, "Request failed");
        }

        let body = Json(json!({
            "error": code,
            "message": err.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Body of a start request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub source_id: String,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
}

impl StartRequest {
    fn labels(&self) -> Option<TeamLabels> {
        if self.home_team.is_none() && self.away_team.is_none() {
            return None;
        }
        Some(TeamLabels::new(
            self.home_team.as_deref().unwrap_or(DEFAULT_HOME_LABEL),
            self.away_team.as_deref().unwrap_or(DEFAULT_AWAY_LABEL),
        ))
    }
}

#[derive(Debug, Serialize)]
struct PausedResponse {
    paused: bool,
}

#[derive(Debug, Serialize)]
struct AckResponse {
    sequence: u64,
    acknowledged: bool,
}

/// Wire form of a [`Delivery`]
struct DeliveryResponse(Delivery);

impl IntoResponse for DeliveryResponse {
    fn into_response(self) -> Response {
        match self.0 {
            Delivery::Reset => Json(json!({ "reset": true })).into_response(),
            Delivery::Event(event) => Json(event).into_response(),
            Delivery::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

type AppState<F> = Arc<SessionRegistry<F>>;

/// Build the router over a registry
pub fn router<F: FeedSource>(registry: AppState<F>) -> Router {
    Router::new()
        .route("/health", get(health::<F>))
        .route(
            "/sessions/:session",
            post(start::<F>).get(current::<F>).delete(stop::<F>),
        )
        .route("/sessions/:session/pause", post(pause::<F>))
        .route("/sessions/:session/resume", post(resume::<F>))
        .route("/sessions/:session/paused", get(paused::<F>))
        .route("/sessions/:session/on-court", get(on_court::<F>))
        .route("/sessions/:session/stats", get(stats::<F>))
        .route("/sessions/:session/consumers/:consumer/pop", post(pop::<F>))
        .route("/sessions/:session/consumers/:consumer/peek", get(peek::<F>))
        .route(
            "/sessions/:session/consumers/:consumer/ack/:sequence",
            post(acknowledge::<F>),
        )
        .with_state(registry)
}

async fn health<F: FeedSource>(State(registry): State<AppState<F>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "sessions": registry.session_count().await,
    }))
}

async fn start<F: FeedSource>(
    State(registry): State<AppState<F>>,
    Path(session): Path<String>,
    Json(request): Json<StartRequest>,
) -> Result<Json<SessionInfo>, ApiError> {
    let info = registry
        .start(&session, &request.source_id, request.labels())
        .await?;
    Ok(Json(info))
}

async fn stop<F: FeedSource>(
    State(registry): State<AppState<F>>,
    Path(session): Path<String>,
) -> Result<StatusCode, ApiError> {
    registry.stop(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn current<F: FeedSource>(
    State(registry): State<AppState<F>>,
    Path(session): Path<String>,
) -> Result<Json<SessionInfo>, ApiError> {
    Ok(Json(registry.current_source(&session).await?))
}

async fn pause<F: FeedSource>(
    State(registry): State<AppState<F>>,
    Path(session): Path<String>,
) -> Result<Json<PausedResponse>, ApiError> {
    registry.pause(&session).await?;
    Ok(Json(PausedResponse { paused: true }))
}

async fn resume<F: FeedSource>(
    State(registry): State<AppState<F>>,
    Path(session): Path<String>,
) -> Result<Json<PausedResponse>, ApiError> {
    registry.resume(&session).await?;
    Ok(Json(PausedResponse { paused: false }))
}

async fn paused<F: FeedSource>(
    State(registry): State<AppState<F>>,
    Path(session): Path<String>,
) -> Result<Json<PausedResponse>, ApiError> {
    let paused = registry.is_paused(&session).await?;
    Ok(Json(PausedResponse { paused }))
}

async fn on_court<F: FeedSource>(
    State(registry): State<AppState<F>>,
    Path(session): Path<String>,
) -> Result<Json<RosterSnapshot>, ApiError> {
    Ok(Json(registry.on_court(&session).await?))
}

async fn stats<F: FeedSource>(
    State(registry): State<AppState<F>>,
    Path(session): Path<String>,
) -> Result<Json<SessionStats>, ApiError> {
    Ok(Json(registry.session_stats(&session).await?))
}

async fn pop<F: FeedSource>(
    State(registry): State<AppState<F>>,
    Path((session, consumer)): Path<(String, String)>,
) -> Result<DeliveryResponse, ApiError> {
    Ok(DeliveryResponse(registry.pop(&session, &consumer).await?))
}

async fn peek<F: FeedSource>(
    State(registry): State<AppState<F>>,
    Path((session, consumer)): Path<(String, String)>,
) -> Result<DeliveryResponse, ApiError> {
    Ok(DeliveryResponse(registry.peek(&session, &consumer).await?))
}

async fn acknowledge<F: FeedSource>(
    State(registry): State<AppState<F>>,
    Path((session, consumer, sequence)): Path<(String, String, u64)>,
) -> Result<Json<AckResponse>, ApiError> {
    let acknowledged = registry.acknowledge(&session, &consumer, sequence).await?;
    Ok(Json(AckResponse {
        sequence,
        acknowledged,
    }))
}

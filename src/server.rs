//! HTTP host – SSE egress plus the thin publish ingress.
//!
//! The CRUD town routes live in a separate service; this host carries only
//! the surfaces the sync core owns:
//!
//! | Route                     | Purpose                                  |
//! |---------------------------|------------------------------------------|
//! | `GET /events`             | SSE stream (one session per connection)  |
//! | `POST /api/cursor/update` | Publish a collaborative cursor event     |
//! | `GET /health`             | Liveness probe                           |
//!
//! `EventSource` cannot send custom headers, so the identity (`name`) and
//! the auth token ride in as query parameters on `/events`.

use crate::bus::EventBus;
use crate::presence::PresenceRegistry;
use crate::protocol::{Event, Frame};
use crate::session::SessionManager;
use crate::store::SnapshotStore;
use crate::types::Vec3;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared state accessible from every handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub bus: Arc<EventBus>,
    pub store: Arc<SnapshotStore>,
    pub presence: Arc<PresenceRegistry>,
    /// When set, `/events` rejects connections without a matching token.
    /// Token *policy* (issuing, expiry) belongs to the auth service.
    pub auth_token: Option<String>,
}

/// Build the router with all sync routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events", get(events_handler))
        .route("/api/cursor/update", post(cursor_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /events
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct EventsQuery {
    name: Option<String>,
    token: Option<String>,
}

async fn events_handler(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, (StatusCode, &'static str)> {
    // Rejected before the session state machine starts.
    if let Some(expected) = &state.auth_token {
        if query.token.as_deref() != Some(expected.as_str()) {
            return Err((StatusCode::UNAUTHORIZED, "Not authenticated"));
        }
    }

    let session = state.sessions.open_session(query.name);
    let stream = session.map(|frame| {
        Ok(match frame {
            Frame::Data(json) => SseEvent::default().data(json),
            Frame::Keepalive => SseEvent::default().comment("keepalive"),
        })
    });

    Ok(Sse::new(stream))
}

// ---------------------------------------------------------------------------
// POST /api/cursor/update
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CursorUpdateRequest {
    username: Option<String>,
    position: Vec3,
    camera_position: Vec3,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    message: &'static str,
}

async fn cursor_handler(
    State(state): State<AppState>,
    Json(update): Json<CursorUpdateRequest>,
) -> Json<StatusResponse> {
    state
        .bus
        .publish(&Event::Cursor {
            username: update.username.unwrap_or_else(|| "unknown".to_owned()),
            position: update.position,
            camera_position: update.camera_position,
        })
        .await;

    Json(StatusResponse {
        status: "success",
        message: "Cursor position updated",
    })
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    active_users: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        active_users: state.presence.list_active().len(),
    })
}

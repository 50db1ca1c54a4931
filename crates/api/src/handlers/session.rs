//! Handlers for session administration and the session check.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pfe_core::session::{EventName, GateStatus};
use pfe_core::types::DbId;
use pfe_db::models::event::Event;
use serde::Deserialize;

use crate::engine::session_gate::{self, NewSession, SessionCreated, SessionWindowUpdate};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /sessions/check`.
#[derive(Debug, Deserialize)]
pub struct CheckSessionQuery {
    pub name: EventName,
}

/// Query parameters for `GET /admin/sessions`.
#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    pub calendar_year: Option<i32>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/sessions
pub async fn create_session(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<NewSession>,
) -> AppResult<(StatusCode, Json<DataResponse<SessionCreated>>)> {
    let created = session_gate::set_event(&state.pool, &state.notifier, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// PUT /api/v1/admin/sessions/{id}
pub async fn update_session(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<SessionWindowUpdate>,
) -> AppResult<Json<DataResponse<Event>>> {
    let event = session_gate::update_event(&state.pool, id, &input).await?;
    Ok(Json(DataResponse { data: event }))
}

/// GET /api/v1/admin/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ListSessionsQuery>,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    let events = session_gate::list_events(&state.pool, params.calendar_year).await?;
    Ok(Json(DataResponse { data: events }))
}

/// GET /api/v1/sessions/check?name=TEAM_CREATION
///
/// A closed gate is reported in the body, never as an error status.
pub async fn check_session(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<CheckSessionQuery>,
) -> AppResult<Json<DataResponse<GateStatus>>> {
    let status = session_gate::is_session_open(&state.pool, &user, params.name).await?;
    Ok(Json(DataResponse { data: status }))
}

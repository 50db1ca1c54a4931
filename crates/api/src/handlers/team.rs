//! Handlers for teams: the student side under `/teams` and administration
//! under `/admin/teams`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pfe_core::cohort::Year;
use pfe_core::types::DbId;
use pfe_db::models::team::{Team, TeamSummary};
use serde::Deserialize;

use crate::engine::organizer::{self, OrganizeRequest, OrganizerReport};
use crate::engine::team::{self, DestroyOutcome, LeaveOutcome, MoveOutcome, TeamDetail};
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireStudent};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /teams`.
#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
}

/// Query parameters for `GET /admin/teams`.
#[derive(Debug, Deserialize)]
pub struct ListTeamsQuery {
    pub year: Option<Year>,
}

/// Request body for the admin membership endpoints.
#[derive(Debug, Deserialize)]
pub struct StudentIdsRequest {
    pub student_ids: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Student handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/teams
pub async fn create_team(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Json(input): Json<CreateTeamRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Team>>)> {
    let team = team::create_team(&state.pool, &state.policy, &user, &input.name).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: team })))
}

/// GET /api/v1/teams/mine
pub async fn get_my_team(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> AppResult<Json<DataResponse<TeamDetail>>> {
    let detail = team::get_my_team(&state.pool, &user).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/teams/leave
pub async fn leave_team(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> AppResult<Json<DataResponse<LeaveOutcome>>> {
    let outcome = team::leave_team(&state.pool, &user).await?;
    Ok(Json(DataResponse { data: outcome }))
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/teams
pub async fn list_teams(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ListTeamsQuery>,
) -> AppResult<Json<DataResponse<Vec<TeamSummary>>>> {
    let teams = team::list_teams(&state.pool, params.year).await?;
    Ok(Json(DataResponse { data: teams }))
}

/// POST /api/v1/admin/teams/{id}/students
pub async fn add_students(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<StudentIdsRequest>,
) -> AppResult<Json<DataResponse<TeamDetail>>> {
    let detail = team::add_students_to_team(&state.pool, id, &input.student_ids).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/admin/teams/{id}/move
pub async fn move_students(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<StudentIdsRequest>,
) -> AppResult<Json<DataResponse<MoveOutcome>>> {
    let outcome = team::move_students_to_another_team(&state.pool, id, &input.student_ids).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// DELETE /api/v1/admin/teams/{id}
pub async fn destroy_team(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DestroyOutcome>>> {
    let outcome = team::destroy_team(&state.pool, id).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/admin/teams/organize
pub async fn organize(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<OrganizeRequest>,
) -> AppResult<Json<DataResponse<OrganizerReport>>> {
    let report = organizer::organize(&state.pool, &state.policy, input).await?;
    Ok(Json(DataResponse { data: report }))
}

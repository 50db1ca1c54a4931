//! Handlers for the `/projects` resource and project validation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pfe_core::preflist::ProjectStatus;
use pfe_core::types::DbId;
use pfe_db::models::project::Project;
use serde::Deserialize;

use crate::engine::project::{self, NewProject, ProjectDetail};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireProjectOwner};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/projects/{id}/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateProjectRequest {
    pub status: ProjectStatus,
}

/// POST /api/v1/projects
pub async fn create_project(
    State(state): State<AppState>,
    RequireProjectOwner(user): RequireProjectOwner,
    Json(input): Json<NewProject>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectDetail>>)> {
    let detail = project::create_project(&state.pool, &user, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectDetail>>> {
    let detail = project::get_project(&state.pool, id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/admin/projects/{id}/validate
pub async fn validate_project(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ValidateProjectRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = project::validate_project(&state.pool, id, input.status).await?;
    Ok(Json(DataResponse { data: project }))
}

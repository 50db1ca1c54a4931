//! Handlers for the `/join-requests` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pfe_core::types::DbId;
use pfe_db::models::join_request::JoinRequest;
use serde::Deserialize;

use crate::engine::join_request;
use crate::error::AppResult;
use crate::middleware::rbac::RequireStudent;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /join-requests`.
#[derive(Debug, Deserialize)]
pub struct SendJoinRequest {
    pub team_id: DbId,
}

/// POST /api/v1/join-requests
pub async fn send_join_request(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Json(input): Json<SendJoinRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<JoinRequest>>)> {
    let request =
        join_request::send_join_request(&state.pool, &state.notifier, &user, input.team_id)
            .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// POST /api/v1/join-requests/{id}/accept
pub async fn accept_join_request(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<JoinRequest>>> {
    let request = join_request::accept_join_request(
        &state.pool,
        &state.notifier,
        &state.policy,
        &user,
        id,
    )
    .await?;
    Ok(Json(DataResponse { data: request }))
}

/// POST /api/v1/join-requests/{id}/reject
pub async fn reject_join_request(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<JoinRequest>>> {
    let request = join_request::reject_join_request(&state.pool, &user, id).await?;
    Ok(Json(DataResponse { data: request }))
}

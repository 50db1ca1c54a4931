//! Handlers for the `/preflists` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use pfe_core::types::DbId;
use pfe_db::models::preflist::PreflistEntry;
use serde::Deserialize;

use crate::engine::preflist::{self, PreflistApproved};
use crate::error::AppResult;
use crate::middleware::rbac::RequireStudent;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /preflists`. Ranks follow array order.
#[derive(Debug, Deserialize)]
pub struct SubmitPreflistRequest {
    pub pfe_ids: Vec<DbId>,
}

/// POST /api/v1/preflists
pub async fn submit_preflist(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Json(input): Json<SubmitPreflistRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<PreflistEntry>>>)> {
    let entries = preflist::create_preflist(&state.pool, &user, &input.pfe_ids).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: entries })))
}

/// POST /api/v1/preflists/approve
pub async fn approve_preflist(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> AppResult<Json<DataResponse<PreflistApproved>>> {
    let approved = preflist::approve_preflist(&state.pool, &state.notifier, &user).await?;
    Ok(Json(DataResponse { data: approved }))
}

/// GET /api/v1/preflists/mine
pub async fn get_my_preflist(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> AppResult<Json<DataResponse<Vec<PreflistEntry>>>> {
    let entries = preflist::get_my_preflist(&state.pool, &user).await?;
    Ok(Json(DataResponse { data: entries }))
}

//! Handlers for supervision requests.

use axum::extract::{Path, State};
use axum::Json;
use pfe_core::supervision::RequestStatus;
use pfe_core::types::DbId;
use serde::Deserialize;

use crate::engine::supervision::{
    self, BatchAcceptRequest, BatchOutcome, RequestResponded, SweepReport,
};
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireSupervisor};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /supervision-requests/{id}/respond`.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub status: RequestStatus,
}

/// POST /api/v1/supervision-requests/{id}/respond
pub async fn respond(
    State(state): State<AppState>,
    RequireSupervisor(user): RequireSupervisor,
    Path(id): Path<DbId>,
    Json(input): Json<RespondRequest>,
) -> AppResult<Json<DataResponse<RequestResponded>>> {
    let responded =
        supervision::respond_to_request(&state.pool, &state.notifier, &user, id, input.status)
            .await?;
    Ok(Json(DataResponse { data: responded }))
}

/// POST /api/v1/admin/supervision-requests/batch-accept
///
/// Per-project failures are reported in the body with a 200 status.
pub async fn batch_accept(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<BatchAcceptRequest>,
) -> AppResult<Json<DataResponse<Vec<BatchOutcome>>>> {
    let outcomes = supervision::batch_accept(
        &state.pool,
        &state.notifier,
        state.config.supervision.batch_reject_policy,
        &input,
    )
    .await?;
    Ok(Json(DataResponse { data: outcomes }))
}

/// POST /api/v1/admin/supervision-requests/sweep
///
/// Run the timeout sweep once with the configured window.
pub async fn sweep(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<SweepReport>>> {
    let config = &state.config.supervision;
    let report = supervision::sweep_stale_requests(
        &state.pool,
        &state.notifier,
        config.staleness(),
        config.sweep_batch_size,
    )
    .await?;
    Ok(Json(DataResponse { data: report }))
}

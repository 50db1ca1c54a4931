//! Handlers for the `/invitations` resource.

use axum::extract::{Path, State};
use axum::Json;
use pfe_core::invitation::InvitationOutcome;
use pfe_core::types::DbId;
use pfe_db::models::invitation::Invitation;
use serde::Deserialize;

use crate::engine::invitation::{self, InvitationAccepted};
use crate::error::AppResult;
use crate::middleware::rbac::RequireStudent;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /invitations`.
#[derive(Debug, Deserialize)]
pub struct SendInvitationsRequest {
    pub emails: Vec<String>,
}

/// POST /api/v1/invitations
///
/// Returns 200 with one outcome per email, even when some of them failed.
pub async fn send_invitations(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Json(input): Json<SendInvitationsRequest>,
) -> AppResult<Json<DataResponse<Vec<InvitationOutcome>>>> {
    let outcomes = invitation::send_invitations(
        &state.pool,
        &state.notifier,
        &state.policy,
        &user,
        &input.emails,
    )
    .await?;
    Ok(Json(DataResponse { data: outcomes }))
}

/// GET /api/v1/invitations/mine
pub async fn list_my_invitations(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
) -> AppResult<Json<DataResponse<Vec<Invitation>>>> {
    let invitations = invitation::list_my_invitations(&state.pool, &user).await?;
    Ok(Json(DataResponse { data: invitations }))
}

/// POST /api/v1/invitations/{id}/accept
pub async fn accept_invitation(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<InvitationAccepted>>> {
    let accepted = invitation::accept_invitation(&state.pool, &state.notifier, &user, id).await?;
    Ok(Json(DataResponse { data: accepted }))
}

/// POST /api/v1/invitations/{id}/decline
pub async fn decline_invitation(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Invitation>>> {
    let declined = invitation::decline_invitation(&state.pool, &user, id).await?;
    Ok(Json(DataResponse { data: declined }))
}

/// POST /api/v1/invitations/{id}/cancel
pub async fn cancel_invitation(
    State(state): State<AppState>,
    RequireStudent(user): RequireStudent,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Invitation>>> {
    let cancelled = invitation::cancel_invitation(&state.pool, &user, id).await?;
    Ok(Json(DataResponse { data: cancelled }))
}

//! Handlers for the `/admin/users` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use pfe_db::models::user::UserResponse;

use crate::engine::user::{self, NewUser};
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/admin/users
///
/// Create an actor with its role profile. Returns 201 with the safe
/// [`UserResponse`].
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<NewUser>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let user = user::create_user(&state.pool, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

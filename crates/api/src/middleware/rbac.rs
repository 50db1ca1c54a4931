//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! match. Use these in route handlers to enforce authorization at the type
//! level.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use pfe_core::error::CoreError;
use pfe_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn require(
    parts: &mut Parts,
    state: &AppState,
    allowed: &[Role],
    message: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !allowed.contains(&user.role) {
        return Err(AppError::Core(CoreError::Forbidden(message.to_string())));
    }
    Ok(user)
}

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(parts, state, &[Role::Admin], "Admin role required")
            .await
            .map(RequireAdmin)
    }
}

/// Requires the `student` role.
pub struct RequireStudent(pub AuthUser);

impl FromRequestParts<AppState> for RequireStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(parts, state, &[Role::Student], "Student role required")
            .await
            .map(RequireStudent)
    }
}

/// Requires a role that may own projects (`teacher` or `company`).
pub struct RequireProjectOwner(pub AuthUser);

impl FromRequestParts<AppState> for RequireProjectOwner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(
            parts,
            state,
            &[Role::Teacher, Role::Company],
            "Teacher or Company role required",
        )
        .await
        .map(RequireProjectOwner)
    }
}

/// Requires an actor who may answer supervision requests (`teacher`,
/// `company`, or `admin`).
pub struct RequireSupervisor(pub AuthUser);

impl FromRequestParts<AppState> for RequireSupervisor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(
            parts,
            state,
            &[Role::Teacher, Role::Company, Role::Admin],
            "Teacher, Company or Admin role required",
        )
        .await
        .map(RequireSupervisor)
    }
}

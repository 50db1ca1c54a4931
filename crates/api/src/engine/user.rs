//! Actor provisioning. Each user is created together with exactly one role
//! profile.

use pfe_core::error::CoreError;
use pfe_core::roles::ActorProfile;
use pfe_db::models::user::{CreateUser, UserResponse};
use pfe_db::repositories::UserRepo;
use pfe_db::DbPool;
use serde::Deserialize;

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};

/// Minimum password length enforced on user creation.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Input of [`create_user`]. The profile's `role` tag selects the profile
/// table.
#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub profile: ActorProfile,
}

pub async fn create_user(pool: &DbPool, input: NewUser) -> AppResult<UserResponse> {
    let email = input.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(CoreError::InvalidInput(format!(
            "'{}' is not a valid email address",
            input.email
        ))
        .into());
    }
    if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
        return Err(CoreError::InvalidInput("First and last name are required".into()).into());
    }
    input.profile.validate()?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::InvalidInput(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let (user, profile_id) = UserRepo::create_with_profile(
        pool,
        &CreateUser {
            email,
            password_hash,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
        },
        &input.profile,
    )
    .await?;

    tracing::info!(user_id = user.id, role = %user.role, profile_id, "User created");
    Ok(UserResponse::new(user, profile_id))
}

//! User entity model, profile rows, and DTOs.

use pfe_core::error::CoreError;
use pfe_core::roles::Role;
use pfe_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn role(&self) -> Result<Role, CoreError> {
        self.role.parse()
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    /// Id of the role-specific profile row (`students.id`, `teachers.id`, ...).
    pub profile_id: DbId,
    pub created_at: Timestamp,
}

impl UserResponse {
    pub fn new(user: User, profile_id: DbId) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            profile_id,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user. The role comes from the profile variant.
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// A row from the `teachers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Teacher {
    pub id: DbId,
    pub user_id: DbId,
    pub grade: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

//! Join request model.

use pfe_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `join_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JoinRequest {
    pub id: DbId,
    pub student_id: DbId,
    pub team_id: DbId,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

//! Invitation model.

use pfe_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `invitations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invitation {
    pub id: DbId,
    pub sender_student_id: DbId,
    pub receiver_email: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

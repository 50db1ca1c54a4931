//! Notification entity model.

use pfe_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub kind: String,
    pub content: String,
    pub metadata: serde_json::Value,
    pub is_read: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

//! Supervision request model.

use pfe_core::error::CoreError;
use pfe_core::supervision::RequestStatus;
use pfe_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `supervision_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SupervisionRequest {
    pub id: DbId,
    pub team_id: DbId,
    pub pfe_id: DbId,
    pub status: String,
    pub requested_at: Timestamp,
    pub responded_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SupervisionRequest {
    pub fn status(&self) -> Result<RequestStatus, CoreError> {
        self.status.parse()
    }
}

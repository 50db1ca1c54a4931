//! Session (event) model and DTOs.

use pfe_core::session::SessionWindow;
use pfe_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub name: String,
    pub targeted: String,
    pub year: Option<String>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub max_number: Option<i32>,
    pub calendar_year: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Event {
    pub fn window(&self) -> SessionWindow {
        SessionWindow {
            start_time: self.start_time,
            end_time: self.end_time,
            max_number: self.max_number,
        }
    }
}

/// DTO for inserting a session.
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub name: String,
    pub targeted: String,
    pub year: Option<String>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub max_number: Option<i32>,
    pub calendar_year: i32,
}

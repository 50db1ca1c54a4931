//! Team entity model and DTOs.

use pfe_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `teams` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Team {
    pub id: DbId,
    pub name: String,
    pub max_number: i32,
    pub is_full: bool,
    pub supervisor_id: Option<DbId>,
    pub pfe_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Team row with its current member count, for admin listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TeamSummary {
    pub id: DbId,
    pub name: String,
    pub max_number: i32,
    pub is_full: bool,
    pub supervisor_id: Option<DbId>,
    pub pfe_id: Option<DbId>,
    pub member_count: i64,
    pub year: Option<String>,
    pub specialite: Option<String>,
}

/// Aggregate of a team as seen by the auto-organizer for one cohort.
#[derive(Debug, Clone, FromRow)]
pub struct CohortTeamRow {
    pub team_id: DbId,
    pub max_number: i32,
    pub member_count: i64,
    pub cohort_member_count: i64,
    pub year: Option<String>,
    pub specialite: Option<String>,
}

/// DTO for inserting a team.
#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub name: String,
    pub max_number: i32,
    pub is_full: bool,
}

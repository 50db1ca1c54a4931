//! Project (PFE) entity model and DTOs.

use pfe_core::cohort::Specialty;
use pfe_core::error::CoreError;
use pfe_core::preflist::ProjectSnapshot;
use pfe_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `pfes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub year: String,
    pub specialization: Vec<String>,
    pub status: String,
    pub creator_user_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn snapshot(&self) -> Result<ProjectSnapshot, CoreError> {
        let specialization = self
            .specialization
            .iter()
            .map(|s| s.parse::<Specialty>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProjectSnapshot {
            id: self.id,
            status: self.status.parse()?,
            year: self.year.parse()?,
            specialization,
        })
    }
}

/// DTO for inserting a project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub title: String,
    pub description: Option<String>,
    pub year: String,
    pub specialization: Vec<String>,
    pub creator_user_id: DbId,
}

//! Student profile model.

use pfe_core::cohort::{parse_specialty, Specialty, Year};
use pfe_core::error::CoreError;
use pfe_core::team::MemberCohort;
use pfe_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

pub const STATUS_AVAILABLE: &str = "available";
pub const STATUS_IN_TEAM: &str = "in_team";

/// A row from the `students` table joined with the owning user's email.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Student {
    pub id: DbId,
    pub user_id: DbId,
    pub email: String,
    pub matricule: String,
    pub year: String,
    pub specialite: Option<String>,
    pub team_id: Option<DbId>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Student {
    pub fn year(&self) -> Result<Year, CoreError> {
        self.year.parse()
    }

    pub fn specialty(&self) -> Result<Option<Specialty>, CoreError> {
        parse_specialty(self.specialite.as_deref())
    }

    pub fn cohort(&self) -> Result<MemberCohort, CoreError> {
        Ok(MemberCohort {
            student_id: self.id,
            year: self.year()?,
            specialite: self.specialty()?,
        })
    }
}

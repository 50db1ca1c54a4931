//! Team preference lists over projects.
//!
//! A team submits exactly [`PREFLIST_LEN`] distinct projects, ranked
//! 1..=5 by input order. The list can be replaced freely until it is
//! approved, after which it is locked.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cohort::{project_accepts_specialty, Specialty, Year};
use crate::error::CoreError;
use crate::types::DbId;

/// Number of ranked entries in every preference list.
pub const PREFLIST_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    NotValide,
    Valide,
    Rejected,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::NotValide => "NOT_VALIDE",
            ProjectStatus::Valide => "VALIDE",
            ProjectStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_VALIDE" => Ok(ProjectStatus::NotValide),
            "VALIDE" => Ok(ProjectStatus::Valide),
            "REJECTED" => Ok(ProjectStatus::Rejected),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown project status '{other}'"
            ))),
        }
    }
}

/// Validate an admin decision on a project awaiting validation.
pub fn validate_project_decision(
    current: ProjectStatus,
    decision: ProjectStatus,
) -> Result<(), CoreError> {
    if decision == ProjectStatus::NotValide {
        return Err(CoreError::InvalidInput(
            "Decision must be VALIDE or REJECTED".into(),
        ));
    }
    if current != ProjectStatus::NotValide {
        return Err(CoreError::InvalidState(format!(
            "Project has already been marked {current}"
        )));
    }
    Ok(())
}

/// Validate the shape of a submitted list: exactly five distinct
/// positive project ids.
pub fn validate_preflist_ids(pfe_ids: &[DbId]) -> Result<(), CoreError> {
    if pfe_ids.len() != PREFLIST_LEN {
        return Err(CoreError::InvalidInput(format!(
            "A preference list must contain exactly {PREFLIST_LEN} projects, got {}",
            pfe_ids.len()
        )));
    }
    if let Some(bad) = pfe_ids.iter().find(|id| **id <= 0) {
        return Err(CoreError::InvalidInput(format!(
            "Project id {bad} is not a valid id"
        )));
    }
    let mut seen = HashSet::with_capacity(PREFLIST_LEN);
    for id in pfe_ids {
        if !seen.insert(*id) {
            return Err(CoreError::InvalidInput(format!(
                "Project {id} appears more than once in the preference list"
            )));
        }
    }
    Ok(())
}

/// Project fields relevant to preference-list eligibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSnapshot {
    pub id: DbId,
    pub status: ProjectStatus,
    pub year: Year,
    pub specialization: Vec<Specialty>,
}

/// Check that a referenced project may appear in a team's list.
pub fn check_project_eligibility(
    pfe_id: DbId,
    project: Option<&ProjectSnapshot>,
    team_year: Year,
    student_specialty: Option<Specialty>,
) -> Result<(), CoreError> {
    let project = project.ok_or(CoreError::NotFound {
        entity: "Project",
        id: pfe_id,
    })?;
    if project.status != ProjectStatus::Valide {
        return Err(CoreError::InvalidInput(format!(
            "Project {} is not validated (status {})",
            project.id, project.status
        )));
    }
    if project.year != team_year {
        return Err(CoreError::InvalidInput(format!(
            "Project {} targets year {} but the team is in year {}",
            project.id, project.year, team_year
        )));
    }
    if !project_accepts_specialty(&project.specialization, student_specialty) {
        let spec = student_specialty.map(Specialty::as_str).unwrap_or("none");
        return Err(CoreError::InvalidInput(format!(
            "Project {} does not accept specialty {spec}",
            project.id
        )));
    }
    Ok(())
}

/// One ranked entry of a team's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankedChoice {
    pub pfe_id: DbId,
    pub order: i32,
}

/// Assign dense ranks 1..=5 in input order.
pub fn rank_in_input_order(pfe_ids: &[DbId]) -> Vec<RankedChoice> {
    pfe_ids
        .iter()
        .enumerate()
        .map(|(i, pfe_id)| RankedChoice {
            pfe_id: *pfe_id,
            order: i as i32 + 1,
        })
        .collect()
}

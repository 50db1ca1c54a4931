//! Auto-organizer: places every unteamed student of a cohort into a team.
//!
//! The cohort snapshot is read and the plan applied inside one transaction.

use std::collections::BTreeMap;

use chrono::Utc;
use pfe_core::cohort::{validate_student_cohort, Specialty, Year};
use pfe_core::error::CoreError;
use pfe_core::organizer::{plan, CohortStudent, CohortTeam, OrganizerInput, TeamSlot};
use pfe_core::session::{EventName, Targeted};
use pfe_core::team::TeamPolicy;
use pfe_core::types::DbId;
use pfe_db::models::team::{CohortTeamRow, CreateTeam};
use pfe_db::repositories::{EventRepo, StudentRepo, TeamRepo};
use pfe_db::DbPool;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::session_gate::calendar_year;
use super::team::release_members;
use crate::error::AppResult;

/// Input of [`organize`].
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrganizeRequest {
    pub year: Year,
    #[serde(default)]
    pub specialite: Option<Specialty>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub student_id: DbId,
    pub team_id: DbId,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizerReport {
    pub year: Year,
    pub specialite: Option<Specialty>,
    pub capacity: i32,
    pub deleted_team_ids: Vec<DbId>,
    pub created_team_ids: Vec<DbId>,
    /// Existing teams that reached capacity.
    pub filled_team_ids: Vec<DbId>,
    pub assignments: Vec<Placement>,
}

pub async fn organize(
    pool: &DbPool,
    policy: &TeamPolicy,
    request: OrganizeRequest,
) -> AppResult<OrganizerReport> {
    let mut rng = StdRng::from_os_rng();
    organize_with_rng(pool, policy, request, &mut rng).await
}

/// [`organize`] with an injected random source.
pub async fn organize_with_rng<R: Rng + Send>(
    pool: &DbPool,
    policy: &TeamPolicy,
    request: OrganizeRequest,
    rng: &mut R,
) -> AppResult<OrganizerReport> {
    let OrganizeRequest { year, specialite } = request;
    if specialite.is_some() {
        validate_student_cohort(year, specialite)?;
    }
    let year_str = year.as_str();
    let spec_str = specialite.map(Specialty::as_str);

    let session = EventRepo::find_current(
        pool,
        EventName::TeamCreation.as_str(),
        Targeted::Students.as_str(),
        Some(year_str),
        calendar_year(Utc::now()),
    )
    .await?;
    let capacity = policy.capacity_for(year, session.and_then(|e| e.max_number));

    let mut tx = pool.begin().await?;
    let students = StudentRepo::list_cohort(&mut *tx, year_str, spec_str)
        .await?
        .iter()
        .map(|s| {
            Ok(CohortStudent {
                student_id: s.id,
                year: s.year()?,
                specialite: s.specialty()?,
                team_id: s.team_id,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;
    let teams = TeamRepo::list_cohort_teams(&mut *tx, year_str, spec_str)
        .await?
        .iter()
        .map(cohort_team)
        .collect::<Result<Vec<_>, CoreError>>()?;
    for team in &teams {
        TeamRepo::lock(&mut *tx, team.team_id).await?;
    }

    let input = OrganizerInput {
        year,
        capacity,
        students,
        teams,
    };
    let plan = plan(&input, policy, rng);

    for team_id in &plan.dissolved {
        release_members(&mut tx, *team_id).await?;
        TeamRepo::delete(&mut *tx, *team_id).await?;
    }

    let label = match specialite {
        Some(spec) => format!("{year} {spec}"),
        None => year.to_string(),
    };
    let mut created_team_ids = Vec::with_capacity(plan.new_teams.len());
    for (i, new_team) in plan.new_teams.iter().enumerate() {
        let team = TeamRepo::create(
            &mut *tx,
            &CreateTeam {
                name: format!("Auto {label} #{}", i + 1),
                max_number: new_team.max_number,
                is_full: false,
            },
        )
        .await?;
        created_team_ids.push(team.id);
    }

    let mut by_team: BTreeMap<DbId, Vec<DbId>> = BTreeMap::new();
    let mut assignments = Vec::with_capacity(plan.assignments.len());
    for assignment in &plan.assignments {
        let team_id = match assignment.team {
            TeamSlot::Existing(id) => id,
            TeamSlot::New(index) => created_team_ids[index],
        };
        by_team.entry(team_id).or_default().push(assignment.student_id);
        assignments.push(Placement {
            student_id: assignment.student_id,
            team_id,
        });
    }
    for (team_id, student_ids) in &by_team {
        StudentRepo::move_to_team(&mut *tx, student_ids, *team_id).await?;
        TeamRepo::refresh_full(&mut *tx, *team_id).await?;
    }
    tx.commit().await?;

    tracing::info!(
        year = %year,
        specialite = ?specialite,
        capacity,
        dissolved = plan.dissolved.len(),
        created = created_team_ids.len(),
        assigned = assignments.len(),
        "Cohort organized"
    );
    Ok(OrganizerReport {
        year,
        specialite,
        capacity,
        deleted_team_ids: plan.dissolved,
        created_team_ids,
        filled_team_ids: plan.filled,
        assignments,
    })
}

fn cohort_team(row: &CohortTeamRow) -> Result<CohortTeam, CoreError> {
    Ok(CohortTeam {
        team_id: row.team_id,
        max_number: row.max_number,
        member_count: row.member_count,
        cohort_member_count: row.cohort_member_count,
        year: row.year.as_deref().map(str::parse).transpose()?,
        specialite: row.specialite.as_deref().map(str::parse).transpose()?,
    })
}

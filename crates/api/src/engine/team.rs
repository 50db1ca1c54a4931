//! Team aggregate: creation, leaving, admin membership changes, and
//! destruction.
//!
//! Any mutation that can shrink a team ends with
//! [`check_and_destroy_empty_team`] so a team never outlives its last member.

use std::collections::BTreeSet;

use pfe_core::cohort::Year;
use pfe_core::error::CoreError;
use pfe_core::session::EventName;
use pfe_core::team::{is_full, validate_incoming_members, validate_team_name, TeamPolicy};
use pfe_core::types::DbId;
use pfe_db::models::student::Student;
use pfe_db::models::team::{CreateTeam, Team, TeamSummary};
use pfe_db::repositories::{InvitationRepo, JoinRequestRepo, StudentRepo, TeamRepo};
use pfe_db::DbPool;
use serde::Serialize;
use sqlx::{PgConnection, PgExecutor};

use super::session_gate::check_gate;
use super::{require_student, require_team};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

/// A team with its members and supervisors.
#[derive(Debug, Serialize)]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<Student>,
    pub supervisor_ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct LeaveOutcome {
    pub team_id: DbId,
    pub team_deleted: bool,
    pub invitations_withdrawn: u64,
}

#[derive(Debug, Serialize)]
pub struct MoveOutcome {
    pub team: TeamDetail,
    /// Source teams destroyed because the move emptied them.
    pub deleted_team_ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct DestroyOutcome {
    pub team_id: DbId,
    pub released_students: u64,
}

pub async fn load_detail(pool: &DbPool, team_id: DbId) -> AppResult<TeamDetail> {
    let team = TeamRepo::find_by_id(pool, team_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Team",
            id: team_id,
        })?;
    let members = StudentRepo::list_by_team(pool, team_id).await?;
    let supervisor_ids = TeamRepo::list_supervisor_ids(pool, team_id).await?;
    Ok(TeamDetail {
        team,
        members,
        supervisor_ids,
    })
}

/// Create a team with the acting student as its first member.
///
/// Capacity comes from the TEAM_CREATION session override, else the year
/// default.
pub async fn create_team(
    pool: &DbPool,
    policy: &TeamPolicy,
    actor: &AuthUser,
    name: &str,
) -> AppResult<Team> {
    let gate = check_gate(pool, actor, EventName::TeamCreation).await?;
    validate_team_name(name)?;

    let student = require_student(pool, actor).await?;
    if student.team_id.is_some() {
        return Err(CoreError::Conflict("Student is already in a team".into()).into());
    }
    let max_number = policy.capacity_for(student.year()?, gate.max_number);

    let mut tx = pool.begin().await?;
    let team = TeamRepo::create(
        &mut *tx,
        &CreateTeam {
            name: name.trim().to_string(),
            max_number,
            is_full: is_full(1, max_number),
        },
    )
    .await?;
    if !StudentRepo::join_team(&mut *tx, student.id, team.id).await? {
        return Err(CoreError::Conflict("Student is already in a team".into()).into());
    }
    tx.commit().await?;

    tracing::info!(team_id = team.id, student_id = student.id, max_number, "Team created");
    Ok(team)
}

pub async fn get_my_team(pool: &DbPool, actor: &AuthUser) -> AppResult<TeamDetail> {
    let student = require_student(pool, actor).await?;
    let team_id = require_team(&student)?;
    load_detail(pool, team_id).await
}

pub async fn list_teams(pool: &DbPool, year: Option<Year>) -> AppResult<Vec<TeamSummary>> {
    Ok(TeamRepo::list(pool, year.map(Year::as_str)).await?)
}

/// Remove the acting student from their team.
///
/// Pending invitations the student sent are withdrawn, and the team is
/// destroyed if nobody is left.
pub async fn leave_team(pool: &DbPool, actor: &AuthUser) -> AppResult<LeaveOutcome> {
    let student = require_student(pool, actor).await?;
    let team_id = require_team(&student)?;

    let mut tx = pool.begin().await?;
    TeamRepo::lock(&mut *tx, team_id).await?;
    if !StudentRepo::clear_team(&mut *tx, student.id).await? {
        return Err(CoreError::InvalidState(format!(
            "Student {} is not in a team",
            student.id
        ))
        .into());
    }
    let invitations_withdrawn = InvitationRepo::delete_pending_by_sender(&mut *tx, student.id).await?;
    let team_deleted = check_and_destroy_empty_team(&mut tx, team_id).await?;
    tx.commit().await?;

    tracing::info!(team_id, student_id = student.id, team_deleted, "Student left team");
    Ok(LeaveOutcome {
        team_id,
        team_deleted,
        invitations_withdrawn,
    })
}

/// Delete the team if it has no members, else recompute its `full` flag.
/// Returns `true` if the team was deleted.
pub async fn check_and_destroy_empty_team(
    conn: &mut PgConnection,
    team_id: DbId,
) -> AppResult<bool> {
    if TeamRepo::delete_if_empty(&mut *conn, team_id).await? {
        tracing::info!(team_id, "Empty team destroyed");
        return Ok(true);
    }
    TeamRepo::refresh_full(&mut *conn, team_id).await?;
    Ok(false)
}

// ---------------------------------------------------------------------------
// Admin membership changes
// ---------------------------------------------------------------------------

/// Add unteamed students to a team.
pub async fn add_students_to_team(
    pool: &DbPool,
    team_id: DbId,
    student_ids: &[DbId],
) -> AppResult<TeamDetail> {
    let mut tx = pool.begin().await?;
    let team = lock_team(&mut *tx, team_id).await?;
    let existing = StudentRepo::list_by_team(&mut *tx, team_id).await?;
    let incoming = load_incoming(&mut *tx, student_ids).await?;

    if let Some(teamed) = incoming.iter().find(|s| s.team_id.is_some()) {
        return Err(CoreError::Conflict(format!(
            "Student {} is already in a team",
            teamed.id
        ))
        .into());
    }
    validate_membership(&existing, &incoming, team.max_number)?;

    let ids: Vec<DbId> = incoming.iter().map(|s| s.id).collect();
    StudentRepo::move_to_team(&mut *tx, &ids, team_id).await?;
    TeamRepo::refresh_full(&mut *tx, team_id).await?;
    tx.commit().await?;

    tracing::info!(team_id, added = ids.len(), "Students added to team");
    load_detail(pool, team_id).await
}

/// Move students (teamed or not) into another team.
///
/// Source teams left empty are destroyed; moved students' pending
/// invitations are withdrawn since they were sent on behalf of the old team.
pub async fn move_students_to_another_team(
    pool: &DbPool,
    target_team_id: DbId,
    student_ids: &[DbId],
) -> AppResult<MoveOutcome> {
    let mut tx = pool.begin().await?;
    let team = lock_team(&mut *tx, target_team_id).await?;
    let existing = StudentRepo::list_by_team(&mut *tx, target_team_id).await?;
    let incoming = load_incoming(&mut *tx, student_ids).await?;

    if let Some(member) = incoming.iter().find(|s| s.team_id == Some(target_team_id)) {
        return Err(CoreError::Conflict(format!(
            "Student {} is already a member of team {target_team_id}",
            member.id
        ))
        .into());
    }
    validate_membership(&existing, &incoming, team.max_number)?;

    let sources: BTreeSet<DbId> = incoming.iter().filter_map(|s| s.team_id).collect();
    for source in &sources {
        TeamRepo::lock(&mut *tx, *source).await?;
    }

    let ids: Vec<DbId> = incoming.iter().map(|s| s.id).collect();
    StudentRepo::move_to_team(&mut *tx, &ids, target_team_id).await?;
    for student in incoming.iter().filter(|s| s.team_id.is_some()) {
        InvitationRepo::delete_pending_by_sender(&mut *tx, student.id).await?;
    }

    let mut deleted_team_ids = Vec::new();
    for source in sources {
        if check_and_destroy_empty_team(&mut tx, source).await? {
            deleted_team_ids.push(source);
        }
    }
    TeamRepo::refresh_full(&mut *tx, target_team_id).await?;
    tx.commit().await?;

    tracing::info!(
        team_id = target_team_id,
        moved = ids.len(),
        deleted = deleted_team_ids.len(),
        "Students moved to team"
    );
    Ok(MoveOutcome {
        team: load_detail(pool, target_team_id).await?,
        deleted_team_ids,
    })
}

/// Release every member and delete the team.
pub async fn destroy_team(pool: &DbPool, team_id: DbId) -> AppResult<DestroyOutcome> {
    let mut tx = pool.begin().await?;
    lock_team(&mut *tx, team_id).await?;
    let released_students = release_members(&mut tx, team_id).await?;
    TeamRepo::delete(&mut *tx, team_id).await?;
    tx.commit().await?;

    tracing::info!(team_id, released_students, "Team destroyed");
    Ok(DestroyOutcome {
        team_id,
        released_students,
    })
}

/// Reset every member of a team to unteamed and purge the team's pending
/// recruitment. The team row itself is left in place.
pub(crate) async fn release_members(conn: &mut PgConnection, team_id: DbId) -> AppResult<u64> {
    let members = StudentRepo::list_by_team(&mut *conn, team_id).await?;
    for member in &members {
        InvitationRepo::delete_pending_by_sender(&mut *conn, member.id).await?;
    }
    JoinRequestRepo::delete_by_team(&mut *conn, team_id).await?;
    Ok(StudentRepo::clear_team_members(&mut *conn, team_id).await?)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn lock_team(executor: impl PgExecutor<'_>, team_id: DbId) -> AppResult<Team> {
    TeamRepo::lock(executor, team_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Team",
                id: team_id,
            }
            .into()
        })
}

/// Load the requested students in input order, failing on the first
/// unknown id.
async fn load_incoming(executor: impl PgExecutor<'_>, student_ids: &[DbId]) -> AppResult<Vec<Student>> {
    let mut ids: Vec<DbId> = Vec::with_capacity(student_ids.len());
    for id in student_ids {
        if !ids.contains(id) {
            ids.push(*id);
        }
    }
    let mut found = StudentRepo::find_by_ids(executor, &ids).await?;

    let mut ordered = Vec::with_capacity(ids.len());
    for id in ids {
        let index = found
            .iter()
            .position(|s| s.id == id)
            .ok_or(CoreError::NotFound {
                entity: "Student",
                id,
            })?;
        ordered.push(found.swap_remove(index));
    }
    Ok(ordered)
}

fn validate_membership(existing: &[Student], incoming: &[Student], max_number: i32) -> AppResult<()> {
    let existing = existing
        .iter()
        .map(Student::cohort)
        .collect::<Result<Vec<_>, _>>()?;
    let incoming = incoming
        .iter()
        .map(Student::cohort)
        .collect::<Result<Vec<_>, _>>()?;
    validate_incoming_members(&existing, &incoming, max_number)?;
    Ok(())
}

//! Join-request workflow: a student asks to join a team, a member decides.

use pfe_core::error::CoreError;
use pfe_core::invitation::{ensure_pending, RecruitmentStatus};
use pfe_core::session::EventName;
use pfe_core::team::{is_full, TeamPolicy};
use pfe_core::types::DbId;
use pfe_db::models::join_request::JoinRequest;
use pfe_db::models::student::Student;
use pfe_db::repositories::{JoinRequestRepo, StudentRepo, TeamRepo};
use pfe_db::DbPool;
use pfe_events::{NotificationKind, Notifier};
use sqlx::PgExecutor;

use super::session_gate::check_gate;
use super::{notify_students, require_student, require_team};
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::auth::AuthUser;

/// Ask to join a team.
pub async fn send_join_request(
    pool: &DbPool,
    notifier: &Notifier,
    actor: &AuthUser,
    team_id: DbId,
) -> AppResult<JoinRequest> {
    check_gate(pool, actor, EventName::TeamCreation).await?;
    let student = require_student(pool, actor).await?;
    if student.team_id.is_some() {
        return Err(CoreError::Conflict("Student is already in a team".into()).into());
    }

    let team = TeamRepo::find_by_id(pool, team_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Team",
            id: team_id,
        })?;
    let member_count = StudentRepo::count_by_team(pool, team_id).await?;
    if is_full(member_count, team.max_number) {
        return Err(CoreError::Conflict(format!("Team {team_id} is full")).into());
    }
    if JoinRequestRepo::exists_pending(pool, student.id, team_id).await? {
        return Err(CoreError::Conflict(
            "A pending join request to this team already exists".into(),
        )
        .into());
    }

    let request = match JoinRequestRepo::create(pool, student.id, team_id).await {
        Ok(request) => request,
        Err(e) if is_unique_violation(&e) => {
            return Err(CoreError::Conflict(
                "A pending join request to this team already exists".into(),
            )
            .into())
        }
        Err(e) => return Err(AppError::Database(e)),
    };

    tracing::info!(request_id = request.id, team_id, student_id = student.id, "Join request sent");
    let members = StudentRepo::list_by_team(pool, team_id).await?;
    notify_students(
        notifier,
        &members,
        NotificationKind::JoinRequest,
        &format!("{} asked to join your team", student.email),
        serde_json::json!({ "join_request_id": request.id, "team_id": team_id }),
    )
    .await;
    Ok(request)
}

/// Accept a join request on behalf of the team.
///
/// The acting student must be a member of the requested team. Besides the
/// team's own capacity, the fixed recruitment ceiling applies.
pub async fn accept_join_request(
    pool: &DbPool,
    notifier: &Notifier,
    policy: &TeamPolicy,
    actor: &AuthUser,
    request_id: DbId,
) -> AppResult<JoinRequest> {
    check_gate(pool, actor, EventName::TeamCreation).await?;
    let member = require_student(pool, actor).await?;

    let mut tx = pool.begin().await?;
    let request = find_request(&mut *tx, request_id).await?;
    ensure_member_of(&member, request.team_id)?;
    ensure_pending("Join request", &request.status)?;

    let team = TeamRepo::lock(&mut *tx, request.team_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Team",
            id: request.team_id,
        })?;
    let member_count = StudentRepo::count_by_team(&mut *tx, team.id).await?;
    if !policy.can_accept_join(member_count) || is_full(member_count, team.max_number) {
        return Err(CoreError::Conflict(format!("Team {} is full", team.id)).into());
    }

    let requester = StudentRepo::find_by_id(&mut *tx, request.student_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Student",
            id: request.student_id,
        })?;
    if requester.team_id.is_some()
        || !StudentRepo::join_team(&mut *tx, requester.id, team.id).await?
    {
        return Err(CoreError::Conflict("Student is already in a team".into()).into());
    }
    let request = JoinRequestRepo::transition(
        &mut *tx,
        request_id,
        RecruitmentStatus::Accepted.as_str(),
    )
    .await?
    .ok_or_else(|| CoreError::InvalidState("Join request has already been decided".into()))?;
    TeamRepo::refresh_full(&mut *tx, team.id).await?;
    tx.commit().await?;

    tracing::info!(
        request_id,
        team_id = team.id,
        student_id = requester.id,
        "Join request accepted"
    );
    notifier
        .notify(
            requester.user_id,
            NotificationKind::JoinRequestAccepted,
            &format!("Your request to join {} was accepted", team.name),
            serde_json::json!({ "join_request_id": request.id, "team_id": team.id }),
        )
        .await;
    Ok(request)
}

/// Reject a join request on behalf of the team.
pub async fn reject_join_request(
    pool: &DbPool,
    actor: &AuthUser,
    request_id: DbId,
) -> AppResult<JoinRequest> {
    let member = require_student(pool, actor).await?;
    let request = find_request(pool, request_id).await?;
    ensure_member_of(&member, request.team_id)?;
    ensure_pending("Join request", &request.status)?;

    let request =
        JoinRequestRepo::transition(pool, request_id, RecruitmentStatus::Rejected.as_str())
            .await?
            .ok_or_else(|| {
                CoreError::InvalidState("Join request has already been decided".into())
            })?;
    tracing::info!(request_id, team_id = request.team_id, "Join request rejected");
    Ok(request)
}

async fn find_request(executor: impl PgExecutor<'_>, id: DbId) -> AppResult<JoinRequest> {
    JoinRequestRepo::find_by_id(executor, id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "JoinRequest",
                id,
            }
            .into()
        })
}

fn ensure_member_of(student: &Student, team_id: DbId) -> AppResult<()> {
    if require_team(student)? != team_id {
        return Err(CoreError::Forbidden(
            "Only members of the requested team can decide on this request".into(),
        )
        .into());
    }
    Ok(())
}

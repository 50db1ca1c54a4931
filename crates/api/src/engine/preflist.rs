//! Preference lists: submission, approval, and reads.
//!
//! A team moves from no list to a submitted list (freely replaceable) to an
//! approved list (locked). Approval opens the first supervision request.

use pfe_core::error::CoreError;
use pfe_core::preflist::{check_project_eligibility, rank_in_input_order, validate_preflist_ids};
use pfe_core::session::EventName;
use pfe_core::supervision::first_request;
use pfe_core::types::DbId;
use pfe_db::models::preflist::PreflistEntry;
use pfe_db::models::supervision_request::SupervisionRequest;
use pfe_db::repositories::{PreflistRepo, ProjectRepo, SupervisionRequestRepo, TeamRepo};
use pfe_db::DbPool;
use pfe_events::{NotificationKind, Notifier};
use serde::Serialize;

use super::session_gate::check_gate;
use super::{require_student, require_team};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

#[derive(Debug, Serialize)]
pub struct PreflistApproved {
    pub entries: Vec<PreflistEntry>,
    pub request: SupervisionRequest,
}

/// Submit (or resubmit) the team's five ranked projects.
///
/// Ranks follow input order. Resubmission replaces the previous list
/// entirely until the list is approved.
pub async fn create_preflist(
    pool: &DbPool,
    actor: &AuthUser,
    pfe_ids: &[DbId],
) -> AppResult<Vec<PreflistEntry>> {
    check_gate(pool, actor, EventName::PfeAssignment).await?;
    let student = require_student(pool, actor).await?;
    let team_id = require_team(&student)?;
    validate_preflist_ids(pfe_ids)?;
    ensure_not_approved(pool, team_id).await?;

    let year = student.year()?;
    let specialty = student.specialty()?;
    let projects = ProjectRepo::find_by_ids(pool, pfe_ids).await?;
    for pfe_id in pfe_ids {
        let snapshot = projects
            .iter()
            .find(|p| p.id == *pfe_id)
            .map(|p| p.snapshot())
            .transpose()?;
        check_project_eligibility(*pfe_id, snapshot.as_ref(), year, specialty)?;
    }

    let choices = rank_in_input_order(pfe_ids);
    let mut tx = pool.begin().await?;
    TeamRepo::lock(&mut *tx, team_id).await?;
    ensure_not_approved(&mut *tx, team_id).await?;
    let entries = PreflistRepo::replace(&mut tx, team_id, &choices).await?;
    tx.commit().await?;

    tracing::info!(team_id, ?pfe_ids, "Preference list submitted");
    Ok(entries)
}

/// Lock the team's list and offer the team to its rank-1 project.
pub async fn approve_preflist(
    pool: &DbPool,
    notifier: &Notifier,
    actor: &AuthUser,
) -> AppResult<PreflistApproved> {
    check_gate(pool, actor, EventName::PfeAssignment).await?;
    let student = require_student(pool, actor).await?;
    let team_id = require_team(&student)?;

    let mut tx = pool.begin().await?;
    TeamRepo::lock(&mut *tx, team_id).await?;
    ensure_not_approved(&mut *tx, team_id).await?;
    let entries = PreflistRepo::list_for_team(&mut *tx, team_id).await?;
    let choices: Vec<_> = entries.iter().map(PreflistEntry::choice).collect();
    let first = first_request(&choices).ok_or_else(|| {
        CoreError::InvalidState(format!("Team {team_id} has no preference list to approve"))
    })?;

    PreflistRepo::approve(&mut *tx, team_id).await?;
    let request = SupervisionRequestRepo::create(&mut *tx, team_id, first.pfe_id)
        .await?
        .ok_or_else(|| {
            CoreError::Conflict(format!(
                "Team {team_id} has already been offered to project {}",
                first.pfe_id
            ))
        })?;
    let entries = PreflistRepo::list_for_team(&mut *tx, team_id).await?;
    tx.commit().await?;

    tracing::info!(team_id, pfe_id = first.pfe_id, request_id = request.id, "Preference list approved");
    notify_project_owner(pool, notifier, &request).await?;
    Ok(PreflistApproved { entries, request })
}

pub async fn get_my_preflist(pool: &DbPool, actor: &AuthUser) -> AppResult<Vec<PreflistEntry>> {
    let student = require_student(pool, actor).await?;
    let team_id = require_team(&student)?;
    Ok(PreflistRepo::list_for_team(pool, team_id).await?)
}

async fn ensure_not_approved(executor: impl sqlx::PgExecutor<'_>, team_id: DbId) -> AppResult<()> {
    if PreflistRepo::has_approved(executor, team_id).await? {
        return Err(CoreError::Conflict(format!(
            "Team {team_id} has already approved its preference list"
        ))
        .into());
    }
    Ok(())
}

/// Tell a project's creator a team is waiting for their answer.
pub(crate) async fn notify_project_owner(
    pool: &DbPool,
    notifier: &Notifier,
    request: &SupervisionRequest,
) -> AppResult<()> {
    if let Some(project) = ProjectRepo::find_by_id(pool, request.pfe_id).await? {
        notifier
            .notify(
                project.creator_user_id,
                NotificationKind::SupervisionRequest,
                &format!("A team asked to work on \"{}\"", project.title),
                serde_json::json!({
                    "request_id": request.id,
                    "team_id": request.team_id,
                    "pfe_id": request.pfe_id,
                }),
            )
            .await;
    }
    Ok(())
}

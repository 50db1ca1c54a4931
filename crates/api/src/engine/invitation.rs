//! Invitation workflow: a team member invites students by email.
//!
//! Sending is a fan-out with per-email outcomes; only malformed input or
//! an exceeded budget fails the whole call.

use pfe_core::error::CoreError;
use pfe_core::invitation::{
    check_receiver, ensure_pending, normalize_invitation_emails, InvitationOutcome,
    ReceiverSnapshot, RecruitmentStatus, SenderCohort,
};
use pfe_core::session::EventName;
use pfe_core::team::{is_full, TeamPolicy};
use pfe_core::types::DbId;
use pfe_db::models::invitation::Invitation;
use pfe_db::models::student::Student;
use pfe_db::repositories::{InvitationRepo, StudentRepo, TeamRepo};
use pfe_db::DbPool;
use pfe_events::{NotificationKind, Notifier};
use serde::Serialize;
use sqlx::PgExecutor;

use super::session_gate::check_gate;
use super::{require_student, require_team};
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::auth::AuthUser;

#[derive(Debug, Serialize)]
pub struct InvitationAccepted {
    pub invitation: Invitation,
    pub team_id: DbId,
    /// Other pending invitations to the same receiver that were rejected.
    pub auto_rejected: u64,
}

/// Invite students to the acting student's team.
///
/// The remaining budget is `recruitment_ceiling - member_count`, not the
/// team's own capacity.
pub async fn send_invitations(
    pool: &DbPool,
    notifier: &Notifier,
    policy: &TeamPolicy,
    actor: &AuthUser,
    receiver_emails: &[String],
) -> AppResult<Vec<InvitationOutcome>> {
    check_gate(pool, actor, EventName::TeamCreation).await?;
    let sender = require_student(pool, actor).await?;
    let team_id = require_team(&sender)?;

    let member_count = StudentRepo::count_by_team(pool, team_id).await?;
    let emails =
        normalize_invitation_emails(receiver_emails, policy.invitation_budget(member_count))?;
    let cohort = SenderCohort {
        year: sender.year()?,
        specialite: sender.specialty()?,
    };

    let mut outcomes = Vec::with_capacity(emails.len());
    for email in emails {
        match invite_one(pool, &sender, cohort, &email).await {
            Ok((invitation, receiver_user_id)) => {
                notifier
                    .notify(
                        receiver_user_id,
                        NotificationKind::TeamInvitation,
                        &format!("{} invited you to join their team", sender.email),
                        serde_json::json!({
                            "invitation_id": invitation.id,
                            "team_id": team_id,
                        }),
                    )
                    .await;
                outcomes.push(InvitationOutcome::sent(email, invitation.id));
            }
            Err(AppError::Core(e)) => outcomes.push(InvitationOutcome::failed(email, &e)),
            Err(AppError::Database(e)) if is_unique_violation(&e) => {
                let e = CoreError::Conflict(
                    "A pending invitation to this student already exists".into(),
                );
                outcomes.push(InvitationOutcome::failed(email, &e));
            }
            Err(other) => return Err(other),
        }
    }

    let sent = outcomes.iter().filter(|o| o.success).count();
    tracing::info!(
        team_id,
        sender_id = sender.id,
        sent,
        failed = outcomes.len() - sent,
        "Invitations sent"
    );
    Ok(outcomes)
}

/// Validate and create one invitation. Returns it with the receiver's
/// user id.
async fn invite_one(
    pool: &DbPool,
    sender: &Student,
    cohort: SenderCohort,
    email: &str,
) -> AppResult<(Invitation, DbId)> {
    let receiver = StudentRepo::find_by_email(pool, email).await?;
    let snapshot = match &receiver {
        Some(r) => Some(ReceiverSnapshot {
            student_id: r.id,
            year: r.year()?,
            specialite: r.specialty()?,
            team_id: r.team_id,
        }),
        None => None,
    };
    let already_invited = InvitationRepo::exists_pending(pool, sender.id, email).await?;
    check_receiver(cohort, snapshot, already_invited)?;

    let receiver_user_id = receiver.map(|r| r.user_id).ok_or_else(|| {
        CoreError::InvalidInput("No student is registered with this email".into())
    })?;
    let invitation = InvitationRepo::create(pool, sender.id, email).await?;
    Ok((invitation, receiver_user_id))
}

/// Accept an invitation addressed to the acting student.
///
/// Moves the student into the sender's current team and rejects every other
/// pending invitation addressed to them, all in one transaction.
pub async fn accept_invitation(
    pool: &DbPool,
    notifier: &Notifier,
    actor: &AuthUser,
    invitation_id: DbId,
) -> AppResult<InvitationAccepted> {
    check_gate(pool, actor, EventName::TeamCreation).await?;
    let receiver = require_student(pool, actor).await?;

    let mut tx = pool.begin().await?;
    let invitation = find_invitation(&mut *tx, invitation_id).await?;
    ensure_receiver(&invitation, &receiver)?;
    ensure_pending("Invitation", &invitation.status)?;
    if receiver.team_id.is_some() {
        return Err(CoreError::Conflict("Student is already in a team".into()).into());
    }

    let sender = StudentRepo::find_by_id(&mut *tx, invitation.sender_student_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Student",
            id: invitation.sender_student_id,
        })?;
    let team_id = sender.team_id.ok_or_else(|| {
        CoreError::InvalidState("The inviting student is no longer in a team".into())
    })?;
    let team = TeamRepo::lock(&mut *tx, team_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Team",
            id: team_id,
        })?;
    let member_count = StudentRepo::count_by_team(&mut *tx, team_id).await?;
    if is_full(member_count, team.max_number) {
        return Err(CoreError::Conflict(format!("Team {team_id} is full")).into());
    }

    let invitation = InvitationRepo::transition(
        &mut *tx,
        invitation_id,
        RecruitmentStatus::Accepted.as_str(),
    )
    .await?
    .ok_or_else(|| CoreError::InvalidState("Invitation has already been decided".into()))?;
    if !StudentRepo::join_team(&mut *tx, receiver.id, team_id).await? {
        return Err(CoreError::Conflict("Student is already in a team".into()).into());
    }
    let auto_rejected =
        InvitationRepo::reject_other_pending(&mut *tx, &invitation.receiver_email, invitation.id)
            .await?;
    TeamRepo::refresh_full(&mut *tx, team_id).await?;
    tx.commit().await?;

    tracing::info!(
        invitation_id,
        team_id,
        student_id = receiver.id,
        auto_rejected,
        "Invitation accepted"
    );
    notifier
        .notify(
            sender.user_id,
            NotificationKind::InvitationAccepted,
            &format!("{} accepted your invitation", receiver.email),
            serde_json::json!({ "invitation_id": invitation.id, "team_id": team_id }),
        )
        .await;

    Ok(InvitationAccepted {
        invitation,
        team_id,
        auto_rejected,
    })
}

/// Decline an invitation addressed to the acting student.
pub async fn decline_invitation(
    pool: &DbPool,
    actor: &AuthUser,
    invitation_id: DbId,
) -> AppResult<Invitation> {
    let receiver = require_student(pool, actor).await?;
    let invitation = find_invitation(pool, invitation_id).await?;
    ensure_receiver(&invitation, &receiver)?;
    reject(pool, invitation).await
}

/// Withdraw an invitation the acting student sent.
pub async fn cancel_invitation(
    pool: &DbPool,
    actor: &AuthUser,
    invitation_id: DbId,
) -> AppResult<Invitation> {
    let sender = require_student(pool, actor).await?;
    let invitation = find_invitation(pool, invitation_id).await?;
    if invitation.sender_student_id != sender.id {
        return Err(CoreError::Forbidden("Only the sender can cancel an invitation".into()).into());
    }
    reject(pool, invitation).await
}

/// Invitations addressed to the acting student, newest first.
pub async fn list_my_invitations(pool: &DbPool, actor: &AuthUser) -> AppResult<Vec<Invitation>> {
    let student = require_student(pool, actor).await?;
    Ok(InvitationRepo::list_for_receiver(pool, &student.email).await?)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_invitation(executor: impl PgExecutor<'_>, id: DbId) -> AppResult<Invitation> {
    InvitationRepo::find_by_id(executor, id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Invitation",
                id,
            }
            .into()
        })
}

fn ensure_receiver(invitation: &Invitation, student: &Student) -> AppResult<()> {
    if !invitation.receiver_email.eq_ignore_ascii_case(&student.email) {
        return Err(
            CoreError::Forbidden("Invitation is addressed to another student".into()).into(),
        );
    }
    Ok(())
}

async fn reject(pool: &DbPool, invitation: Invitation) -> AppResult<Invitation> {
    ensure_pending("Invitation", &invitation.status)?;
    let rejected =
        InvitationRepo::transition(pool, invitation.id, RecruitmentStatus::Rejected.as_str())
            .await?
            .ok_or_else(|| CoreError::InvalidState("Invitation has already been decided".into()))?;
    tracing::info!(invitation_id = rejected.id, "Invitation rejected");
    Ok(rejected)
}

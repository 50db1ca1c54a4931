//! Supervision assignment: responses, queue advancement, the timeout sweep,
//! and capacity-constrained batch acceptance.
//!
//! Manual rejection, the sweep, and (under
//! [`BatchRejectPolicy::AdvanceQueue`]) batch rejection all advance a team
//! through [`advance_queue`].

use chrono::{Duration, Utc};
use pfe_core::error::CoreError;
use pfe_core::roles::Role;
use pfe_core::supervision::{
    next_request, plan_batch_acceptance, validate_response, BatchRejectPolicy, RequestStatus,
};
use pfe_core::types::DbId;
use pfe_db::models::preflist::PreflistEntry;
use pfe_db::models::project::Project;
use pfe_db::models::supervision_request::SupervisionRequest;
use pfe_db::repositories::{
    PreflistRepo, ProjectRepo, StudentRepo, SupervisionRequestRepo, TeamRepo, UserRepo,
};
use pfe_db::DbPool;
use pfe_events::{NotificationKind, Notifier};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use super::notify_students;
use super::preflist::notify_project_owner;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

#[derive(Debug, Serialize)]
pub struct RequestResponded {
    pub request: SupervisionRequest,
    /// The follow-up request opened by a rejection, if the list had one.
    pub next_request: Option<SupervisionRequest>,
}

/// Totals of one sweep run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub expired: usize,
    pub advanced: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Input of [`batch_accept`].
#[derive(Debug, Clone, Deserialize)]
pub struct BatchAcceptRequest {
    pub pfe_ids: Vec<DbId>,
    pub number_to_accept: u32,
}

/// Per-project result of a batch acceptance.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub pfe_id: DbId,
    pub success: bool,
    pub accepted_team_ids: Vec<DbId>,
    pub rejected_team_ids: Vec<DbId>,
    /// Follow-up requests opened for rejected teams.
    pub advanced_request_ids: Vec<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchOutcome {
    fn failed(pfe_id: DbId, err: &CoreError) -> Self {
        Self {
            pfe_id,
            success: false,
            accepted_team_ids: Vec::new(),
            rejected_team_ids: Vec::new(),
            advanced_request_ids: Vec::new(),
            error_kind: Some(err.kind()),
            error: Some(err.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Manual response
// ---------------------------------------------------------------------------

/// Accept or reject a PENDING request on behalf of the project.
///
/// Allowed for administrators, the project's supervising teachers, and its
/// creator.
pub async fn respond_to_request(
    pool: &DbPool,
    notifier: &Notifier,
    actor: &AuthUser,
    request_id: DbId,
    response: RequestStatus,
) -> AppResult<RequestResponded> {
    let request = SupervisionRequestRepo::find_by_id(pool, request_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "SupervisionRequest",
            id: request_id,
        })?;
    let project = ProjectRepo::find_by_id(pool, request.pfe_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Project",
            id: request.pfe_id,
        })?;
    ensure_can_respond(pool, actor, &project).await?;
    validate_response(request.status()?, response)?;

    let mut tx = pool.begin().await?;
    TeamRepo::lock(&mut *tx, request.team_id).await?;
    if response == RequestStatus::Accepted
        && SupervisionRequestRepo::has_accepted(&mut *tx, request.team_id).await?
    {
        return Err(CoreError::Conflict(format!(
            "Team {} has already been accepted on another project",
            request.team_id
        ))
        .into());
    }
    let request = SupervisionRequestRepo::respond(&mut *tx, request_id, response.as_str())
        .await?
        .ok_or_else(|| {
            CoreError::InvalidState("Supervision request has already been decided".into())
        })?;

    let next_request = match response {
        RequestStatus::Accepted => {
            apply_acceptance(&mut tx, request.team_id, request.pfe_id).await?;
            None
        }
        _ => advance_queue(&mut tx, request.team_id, request.pfe_id).await?,
    };
    tx.commit().await?;

    tracing::info!(
        request_id,
        team_id = request.team_id,
        pfe_id = request.pfe_id,
        status = %response,
        next_request_id = next_request.as_ref().map(|r| r.id),
        "Supervision request answered"
    );
    notify_team(pool, notifier, request.team_id, &project, response).await?;
    if let Some(next) = &next_request {
        notify_project_owner(pool, notifier, next).await?;
    }

    Ok(RequestResponded {
        request,
        next_request,
    })
}

async fn ensure_can_respond(pool: &DbPool, actor: &AuthUser, project: &Project) -> AppResult<()> {
    if actor.is_admin() || project.creator_user_id == actor.user_id {
        return Ok(());
    }
    if actor.role == Role::Teacher {
        if let Some(teacher) = UserRepo::find_teacher_by_user_id(pool, actor.user_id).await? {
            let supervisors = ProjectRepo::list_supervisor_ids(pool, project.id).await?;
            if supervisors.contains(&teacher.id) {
                return Ok(());
            }
        }
    }
    Err(CoreError::Forbidden(format!(
        "Only supervisors of project {} can answer its requests",
        project.id
    ))
    .into())
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// Offer the team to the preference ranked right after `rejected_pfe_id`.
///
/// Returns the new PENDING request, or `None` when the list is exhausted
/// or the next project was already offered.
pub async fn advance_queue(
    conn: &mut PgConnection,
    team_id: DbId,
    rejected_pfe_id: DbId,
) -> AppResult<Option<SupervisionRequest>> {
    let entries = PreflistRepo::list_for_team(&mut *conn, team_id).await?;
    let choices: Vec<_> = entries.iter().map(PreflistEntry::choice).collect();
    let requested = SupervisionRequestRepo::requested_pfe_ids(&mut *conn, team_id).await?;

    let Some(next) = next_request(&choices, rejected_pfe_id, &requested) else {
        tracing::debug!(team_id, rejected_pfe_id, "Preference list exhausted");
        return Ok(None);
    };
    Ok(SupervisionRequestRepo::create(&mut *conn, team_id, next.pfe_id).await?)
}

/// Record the project on the team and hand it the project's supervisors.
async fn apply_acceptance(conn: &mut PgConnection, team_id: DbId, pfe_id: DbId) -> AppResult<()> {
    let supervisors = ProjectRepo::list_supervisor_ids(&mut *conn, pfe_id).await?;
    TeamRepo::assign_project(&mut *conn, team_id, pfe_id, supervisors.first().copied()).await?;
    TeamRepo::add_supervisors(&mut *conn, team_id, &supervisors).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Timeout sweep
// ---------------------------------------------------------------------------

enum SweepStep {
    Expired { advanced: bool },
    Skipped,
}

/// Expire PENDING requests older than `staleness` and advance their teams.
///
/// Teams already holding an ACCEPTED request are left alone. Each request
/// is handled in its own transaction; a failing row is logged and counted
/// without stopping the sweep.
pub async fn sweep_stale_requests(
    pool: &DbPool,
    notifier: &Notifier,
    staleness: Duration,
    batch_size: i64,
) -> AppResult<SweepReport> {
    let cutoff = Utc::now() - staleness;
    let stale = SupervisionRequestRepo::list_stale(pool, cutoff, batch_size).await?;

    let mut report = SweepReport {
        scanned: stale.len(),
        ..SweepReport::default()
    };
    for request in stale {
        match expire_one(pool, notifier, &request).await {
            Ok(SweepStep::Expired { advanced }) => {
                report.expired += 1;
                if advanced {
                    report.advanced += 1;
                }
            }
            Ok(SweepStep::Skipped) => report.skipped += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(request_id = request.id, error = %e, "Failed to expire supervision request");
            }
        }
    }
    Ok(report)
}

async fn expire_one(
    pool: &DbPool,
    notifier: &Notifier,
    request: &SupervisionRequest,
) -> AppResult<SweepStep> {
    let mut tx = pool.begin().await?;
    TeamRepo::lock(&mut *tx, request.team_id).await?;
    if SupervisionRequestRepo::has_accepted(&mut *tx, request.team_id).await? {
        return Ok(SweepStep::Skipped);
    }
    let Some(expired) =
        SupervisionRequestRepo::respond(&mut *tx, request.id, RequestStatus::Rejected.as_str())
            .await?
    else {
        return Ok(SweepStep::Skipped);
    };
    let next = advance_queue(&mut tx, expired.team_id, expired.pfe_id).await?;
    tx.commit().await?;

    tracing::info!(
        request_id = expired.id,
        team_id = expired.team_id,
        next_request_id = next.as_ref().map(|r| r.id),
        "Stale supervision request expired"
    );
    if let Some(project) = ProjectRepo::find_by_id(pool, expired.pfe_id).await? {
        notify_team(pool, notifier, expired.team_id, &project, RequestStatus::Rejected).await?;
    }
    if let Some(next) = &next {
        notify_project_owner(pool, notifier, next).await?;
    }
    Ok(SweepStep::Expired {
        advanced: next.is_some(),
    })
}

// ---------------------------------------------------------------------------
// Batch acceptance
// ---------------------------------------------------------------------------

/// For each project, accept `number_to_accept` of its PENDING requests at
/// random and reject the rest.
///
/// Whether rejected teams move on to their next preference is decided by
/// `policy`. Projects are processed independently; a domain failure on one
/// is reported in its outcome.
pub async fn batch_accept(
    pool: &DbPool,
    notifier: &Notifier,
    policy: BatchRejectPolicy,
    input: &BatchAcceptRequest,
) -> AppResult<Vec<BatchOutcome>> {
    let mut rng = StdRng::from_os_rng();
    batch_accept_with_rng(pool, notifier, policy, input, &mut rng).await
}

pub async fn batch_accept_with_rng<R: Rng + Send>(
    pool: &DbPool,
    notifier: &Notifier,
    policy: BatchRejectPolicy,
    input: &BatchAcceptRequest,
    rng: &mut R,
) -> AppResult<Vec<BatchOutcome>> {
    if input.pfe_ids.is_empty() {
        return Err(CoreError::InvalidInput("At least one project id must be provided".into()).into());
    }

    let mut pfe_ids: Vec<DbId> = Vec::with_capacity(input.pfe_ids.len());
    for id in &input.pfe_ids {
        if !pfe_ids.contains(id) {
            pfe_ids.push(*id);
        }
    }

    let mut outcomes = Vec::with_capacity(pfe_ids.len());
    for pfe_id in pfe_ids {
        match accept_for_project(pool, notifier, policy, pfe_id, input.number_to_accept as usize, rng)
            .await
        {
            Ok(outcome) => outcomes.push(outcome),
            Err(AppError::Core(e)) => outcomes.push(BatchOutcome::failed(pfe_id, &e)),
            Err(other) => return Err(other),
        }
    }
    Ok(outcomes)
}

async fn accept_for_project<R: Rng + Send>(
    pool: &DbPool,
    notifier: &Notifier,
    policy: BatchRejectPolicy,
    pfe_id: DbId,
    number_to_accept: usize,
    rng: &mut R,
) -> AppResult<BatchOutcome> {
    let project = ProjectRepo::find_by_id(pool, pfe_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Project",
            id: pfe_id,
        })?;

    let mut tx = pool.begin().await?;
    let pending = SupervisionRequestRepo::lock_pending_for_pfe(&mut *tx, pfe_id).await?;

    // Teams already accepted elsewhere cannot take a second project.
    let mut eligible = Vec::with_capacity(pending.len());
    let mut rejected_requests = Vec::new();
    for request in &pending {
        if SupervisionRequestRepo::has_accepted(&mut *tx, request.team_id).await? {
            rejected_requests.push(request.id);
        } else {
            eligible.push(request.id);
        }
    }
    let plan = plan_batch_acceptance(&eligible, number_to_accept, rng);
    rejected_requests.extend(plan.reject);

    let mut outcome = BatchOutcome {
        pfe_id,
        success: true,
        accepted_team_ids: Vec::with_capacity(plan.accept.len()),
        rejected_team_ids: Vec::with_capacity(rejected_requests.len()),
        advanced_request_ids: Vec::new(),
        error_kind: None,
        error: None,
    };
    let mut advanced = Vec::new();

    for request_id in plan.accept {
        if let Some(request) =
            SupervisionRequestRepo::respond(&mut *tx, request_id, RequestStatus::Accepted.as_str())
                .await?
        {
            apply_acceptance(&mut tx, request.team_id, pfe_id).await?;
            outcome.accepted_team_ids.push(request.team_id);
        }
    }
    for request_id in rejected_requests {
        if let Some(request) =
            SupervisionRequestRepo::respond(&mut *tx, request_id, RequestStatus::Rejected.as_str())
                .await?
        {
            outcome.rejected_team_ids.push(request.team_id);
            if policy.advances_queue() {
                if let Some(next) = advance_queue(&mut tx, request.team_id, pfe_id).await? {
                    outcome.advanced_request_ids.push(next.id);
                    advanced.push(next);
                }
            }
        }
    }
    tx.commit().await?;

    tracing::info!(
        pfe_id,
        accepted = outcome.accepted_team_ids.len(),
        rejected = outcome.rejected_team_ids.len(),
        advanced = outcome.advanced_request_ids.len(),
        ?policy,
        "Batch acceptance applied"
    );
    for team_id in &outcome.accepted_team_ids {
        notify_team(pool, notifier, *team_id, &project, RequestStatus::Accepted).await?;
    }
    for team_id in &outcome.rejected_team_ids {
        notify_team(pool, notifier, *team_id, &project, RequestStatus::Rejected).await?;
    }
    for next in &advanced {
        notify_project_owner(pool, notifier, next).await?;
    }
    Ok(outcome)
}

async fn notify_team(
    pool: &DbPool,
    notifier: &Notifier,
    team_id: DbId,
    project: &Project,
    status: RequestStatus,
) -> AppResult<()> {
    let members = StudentRepo::list_by_team(pool, team_id).await?;
    let verb = match status {
        RequestStatus::Accepted => "accepted",
        _ => "declined",
    };
    notify_students(
        notifier,
        &members,
        NotificationKind::SupervisionResponse,
        &format!("Your request for \"{}\" was {verb}", project.title),
        serde_json::json!({ "team_id": team_id, "pfe_id": project.id, "status": status }),
    )
    .await;
    Ok(())
}

//! Engine-level tests for the supervision timeout sweep and batch
//! acceptance.

mod common;

use assert_matches::assert_matches;
use chrono::Duration;
use common::{open_session, project, student, teacher, team_of, test_state, Actor};
use pfe_api::engine::preflist::{approve_preflist, create_preflist};
use pfe_api::engine::supervision::{
    batch_accept_with_rng, respond_to_request, sweep_stale_requests, BatchAcceptRequest,
};
use pfe_api::error::AppError;
use pfe_api::state::AppState;
use pfe_core::cohort::Year;
use pfe_core::error::CoreError;
use pfe_core::preflist::ProjectStatus;
use pfe_core::session::EventName;
use pfe_core::supervision::{BatchRejectPolicy, RequestStatus};
use pfe_core::types::DbId;
use pfe_db::models::supervision_request::SupervisionRequest;
use pfe_db::repositories::{SupervisionRequestRepo, TeamRepo};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::PgPool;

const STALENESS_HOURS: i64 = 72;

struct Cohort {
    state: AppState,
    teacher: Actor,
    projects: Vec<DbId>,
}

async fn cohort(pool: &PgPool) -> Cohort {
    open_session(pool, EventName::PfeAssignment, Some(Year::SecondPrep), None).await;
    let teacher = teacher(pool, "prof@esi.dz").await;
    let mut projects = Vec::new();
    for i in 1..=5 {
        projects.push(project(pool, &teacher, &format!("P{i}"), Year::SecondPrep, &[], ProjectStatus::Valide).await);
    }
    Cohort {
        state: test_state(pool.clone()),
        teacher,
        projects,
    }
}

/// A one-member team that has submitted and approved `projects` in order.
async fn approved_team(c: &Cohort, email: &str) -> (DbId, SupervisionRequest) {
    let pool = &c.state.pool;
    let member = student(pool, email, Year::SecondPrep, None).await;
    let team_id = team_of(pool, email, 5, &[&member]).await;
    create_preflist(pool, &member.auth(), &c.projects).await.unwrap();
    let approved = approve_preflist(pool, &c.state.notifier, &member.auth()).await.unwrap();
    (team_id, approved.request)
}

async fn backdate(pool: &PgPool, request_id: DbId, hours: i64) {
    sqlx::query("UPDATE supervision_requests SET requested_at = NOW() - make_interval(hours => $2::INT) WHERE id = $1")
        .bind(request_id)
        .bind(hours as i32)
        .execute(pool)
        .await
        .unwrap();
}

async fn pending_for(pool: &PgPool, team_id: DbId) -> Vec<SupervisionRequest> {
    SupervisionRequestRepo::list_for_team(pool, team_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.status == "PENDING")
        .collect()
}

// ---------------------------------------------------------------------------
// Timeout sweep
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_expires_stale_request_and_advances(pool: PgPool) {
    let c = cohort(&pool).await;
    let (stale_team, stale) = approved_team(&c, "alice@esi.dz").await;
    let (fresh_team, _) = approved_team(&c, "bob@esi.dz").await;
    backdate(&pool, stale.id, STALENESS_HOURS + 1).await;

    let report = sweep_stale_requests(&pool, &c.state.notifier, Duration::hours(STALENESS_HOURS), 100)
        .await
        .unwrap();

    assert_eq!(report.scanned, 1);
    assert_eq!(report.expired, 1);
    assert_eq!(report.advanced, 1);
    assert_eq!(report.failed, 0);

    let pending = pending_for(&pool, stale_team).await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].pfe_id, c.projects[1]);

    let untouched = pending_for(&pool, fresh_team).await;
    assert_eq!(untouched.len(), 1);
    assert_eq!(untouched[0].pfe_id, c.projects[0]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_leaves_recent_requests_alone(pool: PgPool) {
    let c = cohort(&pool).await;
    let (_, request) = approved_team(&c, "alice@esi.dz").await;
    backdate(&pool, request.id, STALENESS_HOURS - 1).await;

    let report = sweep_stale_requests(&pool, &c.state.notifier, Duration::hours(STALENESS_HOURS), 100)
        .await
        .unwrap();

    assert_eq!(report.scanned, 0);
    let request = SupervisionRequestRepo::find_by_id(&pool, request.id).await.unwrap().unwrap();
    assert_eq!(request.status, "PENDING");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_skips_teams_already_accepted(pool: PgPool) {
    let c = cohort(&pool).await;
    let (team_id, first) = approved_team(&c, "alice@esi.dz").await;
    let second = SupervisionRequestRepo::create(&pool, team_id, c.projects[1])
        .await
        .unwrap()
        .unwrap();
    respond_to_request(&pool, &c.state.notifier, &c.teacher.auth(), first.id, RequestStatus::Accepted)
        .await
        .unwrap();
    backdate(&pool, second.id, STALENESS_HOURS * 2).await;

    let report = sweep_stale_requests(&pool, &c.state.notifier, Duration::hours(STALENESS_HOURS), 100)
        .await
        .unwrap();

    assert_eq!(report.scanned, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.expired, 0);
    let second = SupervisionRequestRepo::find_by_id(&pool, second.id).await.unwrap().unwrap();
    assert_eq!(second.status, "PENDING");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_at_end_of_list_opens_nothing(pool: PgPool) {
    let c = cohort(&pool).await;
    let (team_id, mut request) = approved_team(&c, "alice@esi.dz").await;
    for _ in 0..4 {
        let responded =
            respond_to_request(&pool, &c.state.notifier, &c.teacher.auth(), request.id, RequestStatus::Rejected)
                .await
                .unwrap();
        request = responded.next_request.unwrap();
    }
    assert_eq!(request.pfe_id, c.projects[4]);
    backdate(&pool, request.id, STALENESS_HOURS + 1).await;

    let report = sweep_stale_requests(&pool, &c.state.notifier, Duration::hours(STALENESS_HOURS), 100)
        .await
        .unwrap();

    assert_eq!(report.expired, 1);
    assert_eq!(report.advanced, 0);
    assert!(pending_for(&pool, team_id).await.is_empty());
}

// ---------------------------------------------------------------------------
// Batch acceptance
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn batch_close_list_does_not_advance_rejected_teams(pool: PgPool) {
    let c = cohort(&pool).await;
    let (alpha, _) = approved_team(&c, "alice@esi.dz").await;
    let (beta, _) = approved_team(&c, "bob@esi.dz").await;
    let input = BatchAcceptRequest {
        pfe_ids: vec![c.projects[0]],
        number_to_accept: 1,
    };

    let outcomes = batch_accept_with_rng(
        &pool,
        &c.state.notifier,
        BatchRejectPolicy::CloseList,
        &input,
        &mut StdRng::seed_from_u64(7),
    )
    .await
    .unwrap();

    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert!(outcome.success);
    assert_eq!(outcome.accepted_team_ids.len(), 1);
    assert_eq!(outcome.rejected_team_ids.len(), 1);
    assert!(outcome.advanced_request_ids.is_empty());

    let accepted = outcome.accepted_team_ids[0];
    let rejected = outcome.rejected_team_ids[0];
    assert!([alpha, beta].contains(&accepted));
    assert_ne!(accepted, rejected);

    let team = TeamRepo::find_by_id(&pool, accepted).await.unwrap().unwrap();
    assert_eq!(team.pfe_id, Some(c.projects[0]));
    assert_eq!(team.supervisor_id, Some(c.teacher.profile_id));
    assert!(pending_for(&pool, rejected).await.is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn batch_advance_queue_offers_next_preference(pool: PgPool) {
    let c = cohort(&pool).await;
    approved_team(&c, "alice@esi.dz").await;
    approved_team(&c, "bob@esi.dz").await;
    approved_team(&c, "carol@esi.dz").await;
    let input = BatchAcceptRequest {
        pfe_ids: vec![c.projects[0]],
        number_to_accept: 1,
    };

    let outcomes = batch_accept_with_rng(
        &pool,
        &c.state.notifier,
        BatchRejectPolicy::AdvanceQueue,
        &input,
        &mut StdRng::seed_from_u64(11),
    )
    .await
    .unwrap();

    let outcome = &outcomes[0];
    assert_eq!(outcome.accepted_team_ids.len(), 1);
    assert_eq!(outcome.rejected_team_ids.len(), 2);
    assert_eq!(outcome.advanced_request_ids.len(), 2);
    for team_id in &outcome.rejected_team_ids {
        let pending = pending_for(&pool, *team_id).await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].pfe_id, c.projects[1]);
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn batch_accepting_more_than_pending_accepts_all(pool: PgPool) {
    let c = cohort(&pool).await;
    approved_team(&c, "alice@esi.dz").await;
    approved_team(&c, "bob@esi.dz").await;
    let input = BatchAcceptRequest {
        pfe_ids: vec![c.projects[0]],
        number_to_accept: 5,
    };

    let outcomes = batch_accept_with_rng(
        &pool,
        &c.state.notifier,
        BatchRejectPolicy::CloseList,
        &input,
        &mut StdRng::seed_from_u64(3),
    )
    .await
    .unwrap();

    assert_eq!(outcomes[0].accepted_team_ids.len(), 2);
    assert!(outcomes[0].rejected_team_ids.is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn batch_reports_unknown_project_per_outcome(pool: PgPool) {
    let c = cohort(&pool).await;
    approved_team(&c, "alice@esi.dz").await;
    let input = BatchAcceptRequest {
        pfe_ids: vec![999_999, c.projects[0]],
        number_to_accept: 1,
    };

    let outcomes = batch_accept_with_rng(
        &pool,
        &c.state.notifier,
        BatchRejectPolicy::CloseList,
        &input,
        &mut StdRng::seed_from_u64(5),
    )
    .await
    .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(!outcomes[0].success);
    assert_eq!(outcomes[0].error_kind, Some("NOT_FOUND"));
    assert!(outcomes[1].success);
    assert_eq!(outcomes[1].accepted_team_ids.len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn batch_without_projects_is_invalid(pool: PgPool) {
    let c = cohort(&pool).await;
    let input = BatchAcceptRequest {
        pfe_ids: vec![],
        number_to_accept: 1,
    };

    let result = batch_accept_with_rng(
        &pool,
        &c.state.notifier,
        BatchRejectPolicy::CloseList,
        &input,
        &mut StdRng::seed_from_u64(1),
    )
    .await;

    assert_matches!(result, Err(AppError::Core(CoreError::InvalidInput(_))));
}

//! Integration tests for the session gate and the `/teams` resource.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{
    admin, body_json, delete_auth, expect_status, get_auth, open_session, post_auth,
    post_json_auth, student, student_row, team_of, Actor,
};
use pfe_core::cohort::{Specialty, Year};
use pfe_core::session::EventName;
use pfe_core::types::DbId;
use pfe_db::models::student::STATUS_AVAILABLE;
use pfe_db::repositories::{InvitationRepo, JoinRequestRepo, TeamRepo};
use serde_json::json;
use sqlx::PgPool;

async fn invite(pool: &PgPool, sender: &Actor, email: &str) -> DbId {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, "/api/v1/invitations", &sender.token, json!({ "emails": [email] })).await;
    let json = expect_status(response, StatusCode::OK).await;
    assert_eq!(json["data"][0]["success"], true, "body: {json}");
    json["data"][0]["invitation_id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Session gate
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn create_team_uses_year_default_capacity(pool: PgPool) {
    open_session(&pool, EventName::TeamCreation, Some(Year::SecondPrep), None).await;
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    let app = common::build_test_app(pool.clone());

    let response = post_json_auth(app, "/api/v1/teams", &alice.token, json!({ "name": "Alpha" })).await;
    let json = expect_status(response, StatusCode::CREATED).await;

    assert_eq!(json["data"]["name"], "Alpha");
    assert_eq!(json["data"]["max_number"], 5);
    assert_eq!(json["data"]["is_full"], false);
    assert!(json["data"]["supervisor_id"].is_null());

    let row = student_row(&pool, &alice).await;
    assert_eq!(row.team_id, json["data"]["id"].as_i64());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn final_year_team_defaults_to_two_members(pool: PgPool) {
    open_session(&pool, EventName::TeamCreation, Some(Year::ThirdCs), None).await;
    let alice = student(&pool, "alice@esi.dz", Year::ThirdCs, Some(Specialty::Isi)).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(app, "/api/v1/teams", &alice.token, json!({ "name": "Duo" })).await;
    let json = expect_status(response, StatusCode::CREATED).await;

    assert_eq!(json["data"]["max_number"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn session_override_sets_team_capacity(pool: PgPool) {
    open_session(&pool, EventName::TeamCreation, Some(Year::FirstCs), Some(4)).await;
    let alice = student(&pool, "alice@esi.dz", Year::FirstCs, None).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(app, "/api/v1/teams", &alice.token, json!({ "name": "Quad" })).await;
    let json = expect_status(response, StatusCode::CREATED).await;

    assert_eq!(json["data"]["max_number"], 4);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_team_without_session_returns_403(pool: PgPool) {
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    let app = common::build_test_app(pool.clone());

    let response = post_json_auth(app, "/api/v1/teams", &alice.token, json!({ "name": "Alpha" })).await;
    let json = expect_status(response, StatusCode::FORBIDDEN).await;

    assert_eq!(json["code"], "FORBIDDEN");
    assert!(student_row(&pool, &alice).await.team_id.is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn session_of_another_year_does_not_open_the_gate(pool: PgPool) {
    open_session(&pool, EventName::TeamCreation, Some(Year::FirstCs), None).await;
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(app, "/api/v1/teams", &alice.token, json!({ "name": "Alpha" })).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn second_team_for_same_student_returns_409(pool: PgPool) {
    open_session(&pool, EventName::TeamCreation, Some(Year::SecondPrep), None).await;
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    team_of(&pool, "Existing", 5, &[&alice]).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(app, "/api/v1/teams", &alice.token, json!({ "name": "Beta" })).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn session_check_reports_open_and_closed(pool: PgPool) {
    open_session(&pool, EventName::TeamCreation, Some(Year::SecondPrep), Some(4)).await;
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/sessions/check?name=TEAM_CREATION", &alice.token).await;
    let json = expect_status(response, StatusCode::OK).await;
    assert_eq!(json["data"]["open"], true);
    assert_eq!(json["data"]["max_number"], 4);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/sessions/check?name=PFE_ASSIGNMENT", &alice.token).await;
    let json = expect_status(response, StatusCode::OK).await;
    assert_eq!(json["data"]["open"], false);
    assert!(json["data"]["reason"].as_str().unwrap().contains("PFE_ASSIGNMENT"));
}

// ---------------------------------------------------------------------------
// Leaving
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn last_member_leaving_destroys_the_team(pool: PgPool) {
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    let team_id = team_of(&pool, "Alpha", 5, &[&alice]).await;
    let app = common::build_test_app(pool.clone());

    let response = post_auth(app, "/api/v1/teams/leave", &alice.token).await;
    let json = expect_status(response, StatusCode::OK).await;

    assert_eq!(json["data"]["team_deleted"], true);
    assert!(TeamRepo::find_by_id(&pool, team_id).await.unwrap().is_none());
    assert!(student_row(&pool, &alice).await.team_id.is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn leaving_keeps_team_with_remaining_members(pool: PgPool) {
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    let bob = student(&pool, "bob@esi.dz", Year::SecondPrep, None).await;
    let team_id = team_of(&pool, "Alpha", 5, &[&alice, &bob]).await;
    let app = common::build_test_app(pool.clone());

    let response = post_auth(app, "/api/v1/teams/leave", &alice.token).await;
    let json = expect_status(response, StatusCode::OK).await;

    assert_eq!(json["data"]["team_deleted"], false);
    assert!(TeamRepo::find_by_id(&pool, team_id).await.unwrap().is_some());
    assert_eq!(student_row(&pool, &bob).await.team_id, Some(team_id));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn leaving_withdraws_pending_invitations(pool: PgPool) {
    open_session(&pool, EventName::TeamCreation, Some(Year::SecondPrep), None).await;
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    let bob = student(&pool, "bob@esi.dz", Year::SecondPrep, None).await;
    let carol = student(&pool, "carol@esi.dz", Year::SecondPrep, None).await;
    team_of(&pool, "Alpha", 5, &[&alice, &carol]).await;
    let invitation_id = invite(&pool, &alice, "bob@esi.dz").await;

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, "/api/v1/teams/leave", &alice.token).await;
    let json = expect_status(response, StatusCode::OK).await;
    assert_eq!(json["data"]["invitations_withdrawn"], 1);
    assert_eq!(json["data"]["team_deleted"], false);

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/invitations/mine", &bob.token).await;
    let json = expect_status(response, StatusCode::OK).await;
    let inbox = json["data"].as_array().unwrap();
    assert!(inbox.iter().all(|i| i["status"] != "pending"), "inbox: {json}");
    assert!(InvitationRepo::find_by_id(&pool, invitation_id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn leaving_keeps_invitations_sent_by_teammates(pool: PgPool) {
    open_session(&pool, EventName::TeamCreation, Some(Year::SecondPrep), None).await;
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    let carol = student(&pool, "carol@esi.dz", Year::SecondPrep, None).await;
    student(&pool, "bob@esi.dz", Year::SecondPrep, None).await;
    team_of(&pool, "Alpha", 5, &[&alice, &carol]).await;
    let invitation_id = invite(&pool, &carol, "bob@esi.dz").await;

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, "/api/v1/teams/leave", &alice.token).await;
    let json = expect_status(response, StatusCode::OK).await;

    assert_eq!(json["data"]["invitations_withdrawn"], 0);
    let kept = InvitationRepo::find_by_id(&pool, invitation_id).await.unwrap().unwrap();
    assert_eq!(kept.status, "pending");
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_creates_session_and_lists_it(pool: PgPool) {
    let root = admin(&pool, "root@esi.dz").await;
    let now = Utc::now();

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/admin/sessions",
        &root.token,
        json!({
            "name": "TEAM_CREATION",
            "year": "1CS",
            "start_time": now - Duration::hours(1),
            "end_time": now + Duration::days(7),
            "max_number": 6,
        }),
    )
    .await;
    let json = expect_status(response, StatusCode::CREATED).await;
    assert_eq!(json["data"]["event"]["targeted"], "students");
    assert_eq!(json["data"]["event"]["max_number"], 6);

    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/admin/sessions", &root.token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn assignment_session_requires_team_creation_first(pool: PgPool) {
    let root = admin(&pool, "root@esi.dz").await;
    let now = Utc::now();
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/admin/sessions",
        &root.token,
        json!({
            "name": "PFE_ASSIGNMENT",
            "year": "2CP",
            "start_time": now,
            "end_time": now + Duration::days(7),
        }),
    )
    .await;
    let json = expect_status(response, StatusCode::UNPROCESSABLE_ENTITY).await;

    assert!(json["error"].as_str().unwrap().contains("TEAM_CREATION"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn student_cannot_reach_admin_routes(pool: PgPool) {
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/admin/teams", &alice.token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_move_destroys_emptied_source_team(pool: PgPool) {
    let root = admin(&pool, "root@esi.dz").await;
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    let bob = student(&pool, "bob@esi.dz", Year::SecondPrep, None).await;
    let source = team_of(&pool, "Source", 5, &[&alice]).await;
    let target = team_of(&pool, "Target", 5, &[&bob]).await;
    let app = common::build_test_app(pool.clone());

    let response = post_json_auth(
        app,
        &format!("/api/v1/admin/teams/{target}/move"),
        &root.token,
        json!({ "student_ids": [alice.profile_id] }),
    )
    .await;
    let json = expect_status(response, StatusCode::OK).await;

    assert_eq!(json["data"]["deleted_team_ids"], json!([source]));
    assert_eq!(json["data"]["team"]["members"].as_array().unwrap().len(), 2);
    assert!(TeamRepo::find_by_id(&pool, source).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_cannot_mix_cohorts_in_a_team(pool: PgPool) {
    let root = admin(&pool, "root@esi.dz").await;
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    let carol = student(&pool, "carol@esi.dz", Year::FirstCs, None).await;
    let team_id = team_of(&pool, "Alpha", 5, &[&alice]).await;
    let app = common::build_test_app(pool.clone());

    let response = post_json_auth(
        app,
        &format!("/api/v1/admin/teams/{team_id}/students"),
        &root.token,
        json!({ "student_ids": [carol.profile_id] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(student_row(&pool, &carol).await.team_id.is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_move_withdraws_moved_students_invitations(pool: PgPool) {
    open_session(&pool, EventName::TeamCreation, Some(Year::SecondPrep), None).await;
    let root = admin(&pool, "root@esi.dz").await;
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    let carol = student(&pool, "carol@esi.dz", Year::SecondPrep, None).await;
    let dave = student(&pool, "dave@esi.dz", Year::SecondPrep, None).await;
    student(&pool, "bob@esi.dz", Year::SecondPrep, None).await;
    let source = team_of(&pool, "Source", 5, &[&alice, &carol]).await;
    let target = team_of(&pool, "Target", 5, &[&dave]).await;
    let moved_invitation = invite(&pool, &alice, "bob@esi.dz").await;
    let stayed_invitation = invite(&pool, &carol, "bob@esi.dz").await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/admin/teams/{target}/move"),
        &root.token,
        json!({ "student_ids": [alice.profile_id] }),
    )
    .await;
    let json = expect_status(response, StatusCode::OK).await;

    assert_eq!(json["data"]["deleted_team_ids"], json!([]));
    assert_eq!(student_row(&pool, &alice).await.team_id, Some(target));
    assert_eq!(student_row(&pool, &carol).await.team_id, Some(source));
    assert!(InvitationRepo::find_by_id(&pool, moved_invitation).await.unwrap().is_none());
    assert!(InvitationRepo::find_by_id(&pool, stayed_invitation).await.unwrap().is_some());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_destroy_releases_members_and_purges_recruitment(pool: PgPool) {
    open_session(&pool, EventName::TeamCreation, Some(Year::SecondPrep), None).await;
    let root = admin(&pool, "root@esi.dz").await;
    let alice = student(&pool, "alice@esi.dz", Year::SecondPrep, None).await;
    let bob = student(&pool, "bob@esi.dz", Year::SecondPrep, None).await;
    let dave = student(&pool, "dave@esi.dz", Year::SecondPrep, None).await;
    student(&pool, "erin@esi.dz", Year::SecondPrep, None).await;
    let team_id = team_of(&pool, "Alpha", 5, &[&alice, &bob]).await;
    let invitation_id = invite(&pool, &alice, "erin@esi.dz").await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, "/api/v1/join-requests", &dave.token, json!({ "team_id": team_id })).await;
    let json = expect_status(response, StatusCode::CREATED).await;
    let request_id = json["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &format!("/api/v1/admin/teams/{team_id}"), &root.token).await;
    let json = expect_status(response, StatusCode::OK).await;
    assert_eq!(json["data"]["team_id"], team_id);
    assert_eq!(json["data"]["released_students"], 2);

    for member in [&alice, &bob] {
        let row = student_row(&pool, member).await;
        assert!(row.team_id.is_none());
        assert_eq!(row.status, STATUS_AVAILABLE);
    }
    assert!(TeamRepo::find_by_id(&pool, team_id).await.unwrap().is_none());
    assert!(JoinRequestRepo::find_by_id(&pool, request_id).await.unwrap().is_none());
    assert!(InvitationRepo::find_by_id(&pool, invitation_id).await.unwrap().is_none());
    assert!(student_row(&pool, &dave).await.team_id.is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_destroy_unknown_team_returns_404(pool: PgPool) {
    let root = admin(&pool, "root@esi.dz").await;
    let app = common::build_test_app(pool);

    let response = delete_auth(app, "/api/v1/admin/teams/9999", &root.token).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

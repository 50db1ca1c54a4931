#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use chrono::{Datelike, Duration, Utc};
use http_body_util::BodyExt;
use pfe_api::auth::jwt::{generate_access_token, JwtConfig};
use pfe_api::config::{ServerConfig, SupervisionConfig};
use pfe_api::middleware::auth::AuthUser;
use pfe_api::router::build_app_router;
use pfe_api::state::AppState;
use pfe_core::cohort::{Specialty, Year};
use pfe_core::preflist::ProjectStatus;
use pfe_core::roles::{ActorProfile, Role};
use pfe_core::session::EventName;
use pfe_core::types::DbId;
use pfe_db::models::event::CreateEvent;
use pfe_db::models::project::CreateProject;
use pfe_db::models::student::Student;
use pfe_db::models::team::CreateTeam;
use pfe_db::models::user::CreateUser;
use pfe_db::repositories::{EventRepo, ProjectRepo, StudentRepo, TeamRepo, UserRepo};
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
        supervision: SupervisionConfig::default(),
    }
}

pub fn test_state(pool: PgPool) -> AppState {
    AppState::new(pool, test_config())
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    build_app_router(AppState::new(pool, config.clone()), &config)
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// A provisioned user: identity, profile row, and a bearer token.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: DbId,
    pub profile_id: DbId,
    pub role: Role,
    pub email: String,
    pub token: String,
}

impl Actor {
    pub fn auth(&self) -> AuthUser {
        AuthUser {
            user_id: self.user_id,
            role: self.role,
        }
    }
}

async fn provision(pool: &PgPool, email: &str, profile: ActorProfile) -> Actor {
    let role = profile.role();
    let (user, profile_id) = UserRepo::create_with_profile(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        },
        &profile,
    )
    .await
    .expect("user creation should succeed");
    let token = generate_access_token(user.id, role, &test_config().jwt)
        .expect("token generation should succeed");
    Actor {
        user_id: user.id,
        profile_id,
        role,
        email: user.email,
        token,
    }
}

pub async fn student(pool: &PgPool, email: &str, year: Year, spec: Option<Specialty>) -> Actor {
    let profile = ActorProfile::Student {
        matricule: email.to_string(),
        year,
        specialite: spec,
    };
    provision(pool, email, profile).await
}

pub async fn teacher(pool: &PgPool, email: &str) -> Actor {
    provision(pool, email, ActorProfile::Teacher { grade: None }).await
}

pub async fn admin(pool: &PgPool, email: &str) -> Actor {
    provision(pool, email, ActorProfile::Admin).await
}

// ---------------------------------------------------------------------------
// Sessions and projects
// ---------------------------------------------------------------------------

/// Insert a session of the current calendar year open from one hour ago to
/// one hour from now.
pub async fn open_session(
    pool: &PgPool,
    name: EventName,
    year: Option<Year>,
    max_number: Option<i32>,
) -> DbId {
    let now = Utc::now();
    EventRepo::create(
        pool,
        &CreateEvent {
            name: name.as_str().to_string(),
            targeted: name.primary_target().as_str().to_string(),
            year: year.map(|y| y.as_str().to_string()),
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(1),
            max_number,
            calendar_year: now.year(),
        },
    )
    .await
    .expect("session creation should succeed")
    .id
}

/// Insert a session of the current calendar year that ran from three days
/// ago until yesterday.
pub async fn closed_session(pool: &PgPool, name: EventName, year: Option<Year>) -> DbId {
    let now = Utc::now();
    EventRepo::create(
        pool,
        &CreateEvent {
            name: name.as_str().to_string(),
            targeted: name.primary_target().as_str().to_string(),
            year: year.map(|y| y.as_str().to_string()),
            start_time: now - Duration::days(3),
            end_time: now - Duration::days(1),
            max_number: None,
            calendar_year: now.year(),
        },
    )
    .await
    .expect("session creation should succeed")
    .id
}

/// Create a project owned by `owner`, supervised by `owner`'s teacher
/// profile, in the given status.
pub async fn project(
    pool: &PgPool,
    owner: &Actor,
    title: &str,
    year: Year,
    specs: &[Specialty],
    status: ProjectStatus,
) -> DbId {
    let created = ProjectRepo::create(
        pool,
        &CreateProject {
            title: title.to_string(),
            description: None,
            year: year.as_str().to_string(),
            specialization: specs.iter().map(|s| s.as_str().to_string()).collect(),
            creator_user_id: owner.user_id,
        },
    )
    .await
    .expect("project creation should succeed");
    if owner.role == Role::Teacher {
        ProjectRepo::add_supervisors(pool, created.id, &[owner.profile_id])
            .await
            .expect("supervisor insert should succeed");
    }
    if status != ProjectStatus::NotValide {
        ProjectRepo::decide(pool, created.id, status.as_str())
            .await
            .expect("project decision should succeed");
    }
    created.id
}

/// Create a team directly in the database holding `members`.
pub async fn team_of(pool: &PgPool, name: &str, max_number: i32, members: &[&Actor]) -> DbId {
    let team = TeamRepo::create(
        pool,
        &CreateTeam {
            name: name.to_string(),
            max_number,
            is_full: false,
        },
    )
    .await
    .expect("team creation should succeed");
    for member in members {
        assert!(
            StudentRepo::join_team(pool, member.profile_id, team.id)
                .await
                .expect("join should succeed"),
            "student {} was already in a team",
            member.email
        );
    }
    TeamRepo::refresh_full(pool, team.id)
        .await
        .expect("refresh should succeed");
    team.id
}

pub async fn student_row(pool: &PgPool, actor: &Actor) -> Student {
    StudentRepo::find_by_id(pool, actor.profile_id)
        .await
        .expect("query should succeed")
        .expect("student should exist")
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Assert a response status, printing the body on mismatch.
pub async fn expect_status(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    let actual = response.status();
    let json = body_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json
}

//! Route definitions for projects, preference lists, and supervision.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{preflist, project, supervision};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// POST   /                 -> create_project (teacher, company)
/// GET    /{id}             -> get_project
/// ```
pub fn projects() -> Router<AppState> {
    Router::new()
        .route("/", post(project::create_project))
        .route("/{id}", get(project::get_project))
}

/// Routes mounted at `/preflists`.
///
/// ```text
/// POST   /                 -> submit_preflist
/// POST   /approve          -> approve_preflist
/// GET    /mine             -> get_my_preflist
/// ```
pub fn preflists() -> Router<AppState> {
    Router::new()
        .route("/", post(preflist::submit_preflist))
        .route("/approve", post(preflist::approve_preflist))
        .route("/mine", get(preflist::get_my_preflist))
}

/// Routes mounted at `/supervision-requests`.
///
/// ```text
/// POST   /{id}/respond     -> respond (supervisors, creator, admin)
/// ```
pub fn supervision_requests() -> Router<AppState> {
    Router::new().route("/{id}/respond", post(supervision::respond))
}

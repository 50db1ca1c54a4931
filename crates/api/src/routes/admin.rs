//! Route definitions for the `/admin` resource.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{admin, project, session, supervision, team};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require the `admin` role (enforced by handler extractors).
///
/// ```text
/// POST   /users                               -> create_user
///
/// GET    /sessions                            -> list_sessions
/// POST   /sessions                            -> create_session
/// PUT    /sessions/{id}                       -> update_session
///
/// GET    /teams                               -> list_teams
/// POST   /teams/organize                      -> organize
/// POST   /teams/{id}/students                 -> add_students
/// POST   /teams/{id}/move                     -> move_students
/// DELETE /teams/{id}                          -> destroy_team
///
/// POST   /projects/{id}/validate              -> validate_project
///
/// POST   /supervision-requests/batch-accept   -> batch_accept
/// POST   /supervision-requests/sweep          -> sweep
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(admin::create_user))
        .route(
            "/sessions",
            get(session::list_sessions).post(session::create_session),
        )
        .route("/sessions/{id}", put(session::update_session))
        .route("/teams", get(team::list_teams))
        .route("/teams/organize", post(team::organize))
        .route("/teams/{id}/students", post(team::add_students))
        .route("/teams/{id}/move", post(team::move_students))
        .route("/teams/{id}", delete(team::destroy_team))
        .route("/projects/{id}/validate", post(project::validate_project))
        .route(
            "/supervision-requests/batch-accept",
            post(supervision::batch_accept),
        )
        .route("/supervision-requests/sweep", post(supervision::sweep))
}

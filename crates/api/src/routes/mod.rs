pub mod admin;
pub mod assignment;
pub mod health;
pub mod recruitment;
pub mod team;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /admin/users                                     create (admin only)
/// /admin/sessions                                  list, create
/// /admin/sessions/{id}                             update window
/// /admin/teams                                     list
/// /admin/teams/organize                            auto-organizer (POST)
/// /admin/teams/{id}/students                       add students (POST)
/// /admin/teams/{id}/move                           move students (POST)
/// /admin/teams/{id}                                destroy (DELETE)
/// /admin/projects/{id}/validate                    validate (POST)
/// /admin/supervision-requests/batch-accept         batch acceptance (POST)
/// /admin/supervision-requests/sweep                run timeout sweep (POST)
///
/// /sessions/check?name=..                          gate status for the caller
///
/// /teams                                           create (student)
/// /teams/mine                                      own team
/// /teams/leave                                     leave (POST)
///
/// /invitations                                     send (student)
/// /invitations/mine                                received invitations
/// /invitations/{id}/accept|decline|cancel          transitions (POST)
///
/// /join-requests                                   send (student)
/// /join-requests/{id}/accept|reject                transitions (POST)
///
/// /projects                                        create (teacher, company)
/// /projects/{id}                                   get
///
/// /preflists                                       submit (student)
/// /preflists/approve                               approve (POST)
/// /preflists/mine                                  own list
///
/// /supervision-requests/{id}/respond               accept or reject (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/admin", admin::router())
        .route("/sessions/check", get(handlers::session::check_session))
        .nest("/teams", team::router())
        .nest("/invitations", recruitment::invitations())
        .nest("/join-requests", recruitment::join_requests())
        .nest("/projects", assignment::projects())
        .nest("/preflists", assignment::preflists())
        .nest("/supervision-requests", assignment::supervision_requests())
}

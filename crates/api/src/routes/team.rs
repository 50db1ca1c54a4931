//! Route definitions for the student-facing `/teams` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::team;
use crate::state::AppState;

/// Routes mounted at `/teams`.
///
/// ```text
/// POST   /                 -> create_team
/// GET    /mine             -> get_my_team
/// POST   /leave            -> leave_team
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(team::create_team))
        .route("/mine", get(team::get_my_team))
        .route("/leave", post(team::leave_team))
}

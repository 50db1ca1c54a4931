//! Route definitions for invitations and join requests.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{invitation, join_request};
use crate::state::AppState;

/// Routes mounted at `/invitations`.
///
/// ```text
/// POST   /                 -> send_invitations
/// GET    /mine             -> list_my_invitations
/// POST   /{id}/accept      -> accept_invitation
/// POST   /{id}/decline     -> decline_invitation
/// POST   /{id}/cancel      -> cancel_invitation
/// ```
pub fn invitations() -> Router<AppState> {
    Router::new()
        .route("/", post(invitation::send_invitations))
        .route("/mine", get(invitation::list_my_invitations))
        .route("/{id}/accept", post(invitation::accept_invitation))
        .route("/{id}/decline", post(invitation::decline_invitation))
        .route("/{id}/cancel", post(invitation::cancel_invitation))
}

/// Routes mounted at `/join-requests`.
///
/// ```text
/// POST   /                 -> send_join_request
/// POST   /{id}/accept      -> accept_join_request
/// POST   /{id}/reject      -> reject_join_request
/// ```
pub fn join_requests() -> Router<AppState> {
    Router::new()
        .route("/", post(join_request::send_join_request))
        .route("/{id}/accept", post(join_request::accept_join_request))
        .route("/{id}/reject", post(join_request::reject_join_request))
}

//! Notification collaborator.
//!
//! [`Notifier`] writes a row to `notifications` and announces it on the
//! [`EventBus`] as a [`NotificationEvent`] for live delivery.
//! Delivery is best effort: a failed insert is logged and swallowed so the
//! lifecycle operation that triggered it still succeeds.

use std::sync::Arc;

use pfe_core::cohort::Year;
use pfe_core::types::DbId;
use pfe_db::repositories::NotificationRepo;
use pfe_db::DbPool;

use crate::bus::{EventBus, NotificationEvent};

/// Kinds of notification raised by the lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    TeamInvitation,
    InvitationAccepted,
    JoinRequest,
    JoinRequestAccepted,
    SupervisionRequest,
    SupervisionResponse,
    SessionOpened,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::TeamInvitation => "team_invitation",
            NotificationKind::InvitationAccepted => "invitation_accepted",
            NotificationKind::JoinRequest => "join_request",
            NotificationKind::JoinRequestAccepted => "join_request_accepted",
            NotificationKind::SupervisionRequest => "supervision_request",
            NotificationKind::SupervisionResponse => "supervision_response",
            NotificationKind::SessionOpened => "session_opened",
        }
    }
}

/// Recipients of a bulk notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every student of one study year.
    StudentsOfYear(Year),
    /// Every teacher and company account.
    ProjectOwners,
}

/// Persists notifications and publishes them on the bus.
#[derive(Clone)]
pub struct Notifier {
    pool: DbPool,
    bus: Arc<EventBus>,
}

impl Notifier {
    pub fn new(pool: DbPool, bus: Arc<EventBus>) -> Self {
        Self { pool, bus }
    }

    /// Notify one user. Returns the notification id, or `None` if the
    /// insert failed (the failure is logged).
    pub async fn notify(
        &self,
        user_id: DbId,
        kind: NotificationKind,
        content: &str,
        metadata: serde_json::Value,
    ) -> Option<DbId> {
        let created =
            NotificationRepo::create(&self.pool, user_id, kind.as_str(), content, &metadata).await;
        match created {
            Ok(id) => {
                self.bus.publish(NotificationEvent::to_user(
                    kind.as_str(),
                    content,
                    metadata,
                    user_id,
                    id,
                ));
                Some(id)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    user_id,
                    kind = kind.as_str(),
                    "Failed to create notification"
                );
                None
            }
        }
    }

    /// Notify a whole audience with one `INSERT ... SELECT`, then broadcast
    /// a single event. Returns the number of rows created.
    pub async fn notify_audience(
        &self,
        audience: Audience,
        kind: NotificationKind,
        content: &str,
        metadata: serde_json::Value,
    ) -> u64 {
        let result = match audience {
            Audience::StudentsOfYear(year) => {
                NotificationRepo::create_for_students_of_year(
                    &self.pool,
                    year.as_str(),
                    kind.as_str(),
                    content,
                    &metadata,
                )
                .await
            }
            Audience::ProjectOwners => {
                NotificationRepo::create_for_project_owners(
                    &self.pool,
                    kind.as_str(),
                    content,
                    &metadata,
                )
                .await
            }
        };

        match result {
            Ok(count) => {
                let audience_label = match audience {
                    Audience::StudentsOfYear(year) => format!("students:{year}"),
                    Audience::ProjectOwners => "teachers".to_string(),
                };
                self.bus.publish(NotificationEvent::to_audience(
                    kind.as_str(),
                    content,
                    metadata,
                    audience_label,
                    count,
                ));
                tracing::debug!(count, kind = kind.as_str(), "Audience notified");
                count
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    kind = kind.as_str(),
                    "Failed to fan out notification"
                );
                0
            }
        }
    }
}

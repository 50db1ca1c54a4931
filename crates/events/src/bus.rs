//! In-process notification bus backed by a `tokio::sync::broadcast` channel.
//!
//! Every notification the [`Notifier`](crate::Notifier) persists is announced
//! here as a [`NotificationEvent`] so live transports (websocket, SSE) can
//! push it without polling the `notifications` table.

use chrono::{DateTime, Utc};
use pfe_core::types::DbId;
use serde::Serialize;
use tokio::sync::broadcast;

/// Who a published notification was delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delivery {
    /// A single user; carries the persisted notification id.
    User { user_id: DbId, notification_id: DbId },
    /// A bulk audience such as `students:2CP`, with the row count written.
    Audience { label: String, recipients: u64 },
}

/// A notification that has been written and is ready for live delivery.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent {
    pub kind: &'static str,
    pub content: String,
    pub metadata: serde_json::Value,
    pub delivery: Delivery,
    pub at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn to_user(
        kind: &'static str,
        content: impl Into<String>,
        metadata: serde_json::Value,
        user_id: DbId,
        notification_id: DbId,
    ) -> Self {
        Self {
            kind,
            content: content.into(),
            metadata,
            delivery: Delivery::User {
                user_id,
                notification_id,
            },
            at: Utc::now(),
        }
    }

    pub fn to_audience(
        kind: &'static str,
        content: impl Into<String>,
        metadata: serde_json::Value,
        label: impl Into<String>,
        recipients: u64,
    ) -> Self {
        Self {
            kind,
            content: content.into(),
            metadata,
            delivery: Delivery::Audience {
                label: label.into(),
                recipients,
            },
            at: Utc::now(),
        }
    }

    /// The single recipient, if this was a per-user notification.
    pub fn recipient(&self) -> Option<DbId> {
        match self.delivery {
            Delivery::User { user_id, .. } => Some(user_id),
            Delivery::Audience { .. } => None,
        }
    }
}

/// Buffered events per subscriber before the slowest one starts lagging.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out bus shared as `Arc<EventBus>` between the notifier and transports.
pub struct EventBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Announce a notification. Returns how many subscribers saw it.
    ///
    /// Zero subscribers is normal (no live client connected); the row is
    /// already in the database.
    pub fn publish(&self, event: NotificationEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn user_delivery_reaches_every_subscriber() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let seen = bus.publish(NotificationEvent::to_user(
            "team_invitation",
            "Team Alpha invited you",
            serde_json::json!({"team_id": 42}),
            7,
            100,
        ));
        assert_eq!(seen, 2);

        for rx in [&mut rx1, &mut rx2] {
            let event = rx.recv().await.expect("subscriber should receive");
            assert_eq!(event.kind, "team_invitation");
            assert_eq!(event.recipient(), Some(7));
            assert_eq!(event.metadata["team_id"], 42);
        }
    }

    #[test]
    fn publish_without_subscribers_reports_zero() {
        let bus = EventBus::default();
        let seen = bus.publish(NotificationEvent::to_audience(
            "session_opened",
            "Team creation is open",
            serde_json::json!({}),
            "students:2CP",
            30,
        ));
        assert_eq!(seen, 0);
    }

    #[test]
    fn audience_delivery_serializes_with_tag() {
        let event = NotificationEvent::to_audience(
            "session_opened",
            "PFE submission is open",
            serde_json::json!({}),
            "teachers",
            12,
        );
        assert_eq!(event.recipient(), None);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["delivery"]["type"], "audience");
        assert_eq!(json["delivery"]["label"], "teachers");
        assert_eq!(json["delivery"]["recipients"], 12);
    }
}

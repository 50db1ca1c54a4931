//! Event bus and notification delivery for the PFE platform.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`, consumed by live UI transports.
//! - [`NotificationEvent`]: what the bus carries, tagged with its
//!   [`Delivery`] target.
//! - [`Notifier`]: persists notification rows and announces them on the bus.

pub mod bus;
pub mod notifier;

pub use bus::{Delivery, EventBus, NotificationEvent};
pub use notifier::{Audience, NotificationKind, Notifier};

use std::sync::Arc;

use pfe_core::team::TeamPolicy;
use pfe_events::{EventBus, Notifier};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: pfe_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<EventBus>,
    /// Persists notifications and publishes them on the bus.
    pub notifier: Notifier,
    /// Team sizing rules.
    pub policy: TeamPolicy,
}

impl AppState {
    pub fn new(pool: pfe_db::DbPool, config: ServerConfig) -> Self {
        let event_bus = Arc::new(EventBus::default());
        let notifier = Notifier::new(pool.clone(), Arc::clone(&event_bus));
        Self {
            pool,
            config: Arc::new(config),
            event_bus,
            notifier,
            policy: TeamPolicy::default(),
        }
    }
}

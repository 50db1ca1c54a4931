use pfe_core::supervision::{
    BatchRejectPolicy, DEFAULT_STALENESS_HOURS, DEFAULT_SWEEP_BATCH_SIZE,
    DEFAULT_SWEEP_INTERVAL_SECS,
};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT validation settings for tokens issued by the identity service.
    pub jwt: JwtConfig,
    /// Supervision queue timing and batch policy.
    pub supervision: SupervisionConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            supervision: SupervisionConfig::from_env(),
        }
    }
}

/// Settings of the supervision-request queue.
#[derive(Debug, Clone, Copy)]
pub struct SupervisionConfig {
    /// Age after which a PENDING request is swept.
    pub staleness_hours: i64,
    /// Seconds between two sweeps.
    pub sweep_interval_secs: u64,
    /// Maximum stale requests handled per sweep.
    pub sweep_batch_size: i64,
    /// What batch acceptance does with the teams it rejects.
    pub batch_reject_policy: BatchRejectPolicy,
}

impl Default for SupervisionConfig {
    fn default() -> Self {
        Self {
            staleness_hours: DEFAULT_STALENESS_HOURS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            sweep_batch_size: DEFAULT_SWEEP_BATCH_SIZE,
            batch_reject_policy: BatchRejectPolicy::default(),
        }
    }
}

impl SupervisionConfig {
    /// Load supervision settings from environment variables.
    ///
    /// | Env Var                           | Default |
    /// |-----------------------------------|---------|
    /// | `SUPERVISION_STALENESS_HOURS`     | `72`    |
    /// | `SUPERVISION_SWEEP_INTERVAL_SECS` | `3600`  |
    /// | `SUPERVISION_SWEEP_BATCH_SIZE`    | `100`   |
    /// | `BATCH_REJECT_ADVANCES_QUEUE`     | `false` |
    pub fn from_env() -> Self {
        let staleness_hours: i64 = std::env::var("SUPERVISION_STALENESS_HOURS")
            .unwrap_or_else(|_| DEFAULT_STALENESS_HOURS.to_string())
            .parse()
            .expect("SUPERVISION_STALENESS_HOURS must be a valid i64");
        assert!(staleness_hours > 0, "SUPERVISION_STALENESS_HOURS must be positive");

        let sweep_interval_secs: u64 = std::env::var("SUPERVISION_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_SWEEP_INTERVAL_SECS.to_string())
            .parse()
            .expect("SUPERVISION_SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(sweep_interval_secs > 0, "SUPERVISION_SWEEP_INTERVAL_SECS must be positive");

        let sweep_batch_size: i64 = std::env::var("SUPERVISION_SWEEP_BATCH_SIZE")
            .unwrap_or_else(|_| DEFAULT_SWEEP_BATCH_SIZE.to_string())
            .parse()
            .expect("SUPERVISION_SWEEP_BATCH_SIZE must be a valid i64");

        let advance: bool = std::env::var("BATCH_REJECT_ADVANCES_QUEUE")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("BATCH_REJECT_ADVANCES_QUEUE must be true or false");

        Self {
            staleness_hours,
            sweep_interval_secs,
            sweep_batch_size,
            batch_reject_policy: BatchRejectPolicy::from_flag(advance),
        }
    }

    pub fn staleness(&self) -> chrono::Duration {
        chrono::Duration::hours(self.staleness_hours)
    }
}

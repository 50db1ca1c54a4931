//! Periodic expiry of stale supervision requests.
//!
//! Every tick runs [`sweep_stale_requests`], which rejects PENDING requests
//! older than the staleness window and advances each team to its next
//! preference. Runs on a fixed interval using `tokio::time::interval`.

use std::time::Duration;

use pfe_db::DbPool;
use pfe_events::Notifier;
use tokio_util::sync::CancellationToken;

use crate::config::SupervisionConfig;
use crate::engine::supervision::sweep_stale_requests;

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    notifier: Notifier,
    config: SupervisionConfig,
    cancel: CancellationToken,
) {
    tracing::info!(
        staleness_hours = config.staleness_hours,
        interval_secs = config.sweep_interval_secs,
        batch_size = config.sweep_batch_size,
        "Supervision timeout sweep started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.sweep_interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Supervision timeout sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep_stale_requests(&pool, &notifier, config.staleness(), config.sweep_batch_size).await {
                    Ok(report) if report.scanned > 0 => {
                        tracing::info!(
                            scanned = report.scanned,
                            expired = report.expired,
                            advanced = report.advanced,
                            skipped = report.skipped,
                            failed = report.failed,
                            "Supervision sweep: expired stale requests"
                        );
                    }
                    Ok(_) => tracing::debug!("Supervision sweep: no stale requests"),
                    Err(e) => {
                        tracing::error!(error = %e, "Supervision sweep failed");
                    }
                }
            }
        }
    }
}

//! In-process drip loop, for deployments without an external cron.
//!
//! Calls [`DripScheduler::run`] every `DRIP_INTERVAL_SECS`. The next tick
//! waits for the current run to finish. A tick that collides with a
//! cron-triggered run is skipped.

use std::sync::Arc;
use std::time::Duration;

use fundpath_events::{DripError, DripScheduler};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run the drip loop until `cancel` is triggered.
pub async fn run(scheduler: Arc<DripScheduler>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Drip schedule started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Drip schedule stopping");
                break;
            }
            _ = ticker.tick() => {
                match scheduler.run().await {
                    Ok(summary) => {
                        if summary.sent > 0 || !summary.errors.is_empty() {
                            tracing::info!(
                                sent = summary.sent,
                                errors = summary.errors.len(),
                                "Drip schedule: run complete"
                            );
                        } else {
                            tracing::debug!("Drip schedule: nothing to send");
                        }
                    }
                    Err(DripError::AlreadyRunning) => {
                        tracing::info!("Drip schedule: a run is already in progress, skipping");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Drip schedule: run failed");
                    }
                }
            }
        }
    }
}

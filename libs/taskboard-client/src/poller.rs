//! Background list refresh.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::dashboard::Dashboard;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Re-fetches the task list at a fixed interval until cancelled.
///
/// Each refresh is awaited before the next tick is taken, so polls never
/// overlap; a slow refresh delays the schedule instead of bunching ticks.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    every: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl Poller {
    pub fn new(every: Duration) -> Self {
        Self { every }
    }

    pub fn spawn(self, dashboard: Dashboard, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(dashboard, cancel))
    }

    pub async fn run(self, dashboard: Dashboard, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; callers load the board themselves.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match dashboard.refresh().await {
                        Ok(count) => tracing::debug!(count, "poll refreshed board"),
                        Err(e) if e.is_unauthorized() => {
                            tracing::warn!(error = %e, "poll rejected, session may have expired");
                        }
                        Err(e) => tracing::debug!(error = %e, "poll failed"),
                    }
                }
            }
        }
        tracing::debug!("poller stopped");
    }
}

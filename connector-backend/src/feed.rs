//! Background refresh of the connector feed.
//!
//! The backend has no push channel for connector records, so the feed is
//! kept current by re-fetching the list on a fixed interval.

use connector_flow::ConnectorRepository;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Periodically re-fetches the connector list and publishes it.
pub struct FeedPoller {
    repository: Arc<ConnectorRepository>,
    period: Duration,
}

/// Counters kept by the polling loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollStats {
    pub polls: u64,
    pub errors: u64,
}

impl FeedPoller {
    pub fn new(repository: Arc<ConnectorRepository>, period: Duration) -> Self {
        Self {
            repository,
            period: period.max(Duration::from_millis(10)),
        }
    }

    /// Runs one refresh. Failures are logged and counted, never fatal.
    pub async fn poll_once(&self, stats: &mut PollStats) {
        stats.polls += 1;
        match self.repository.refresh().await {
            Ok(connectors) => {
                debug!(count = connectors.len(), "Connector feed refreshed")
            }
            Err(e) => {
                stats.errors += 1;
                warn!(error = %e, "Connector feed refresh failed, will retry next tick");
            }
        }
    }

    /// Spawns the polling loop. Abort the handle to stop it.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                search_space_id = self.repository.search_space_id(),
                interval_ms = self.period.as_millis() as u64,
                "Starting connector feed poller"
            );

            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut stats = PollStats::default();

            loop {
                ticker.tick().await;
                self.poll_once(&mut stats).await;
            }
        })
    }
}

//! Optimistic "currently indexing" tracker.
//!
//! Indexing jobs run on the backend and report completion only by changing a
//! connector's `last_indexed_at`. The tracker marks a connector pending as
//! soon as indexing is requested and clears it when the feed shows that
//! timestamp move. There is no timeout: a job that fails silently stays
//! pending until an error path calls [`IndexingTracker::stop`].

use crate::connector::Connector;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::{debug, info};

/// Observed value of `last_indexed_at` (which may itself be absent).
pub type Observed = Option<DateTime<Utc>>;

/// Per-connector indexing state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexingState {
    Idle,
    /// Waiting for `last_indexed_at` to move. `None` until the first
    /// observation seeds the baseline.
    Pending(Option<Observed>),
}

/// Pending-indexing set reconciled against the connector feed.
#[derive(Default)]
pub struct IndexingTracker {
    states: DashMap<i64, IndexingState>,
    /// Last `last_indexed_at` seen per connector, for every connector.
    observed: DashMap<i64, Observed>,
}

impl IndexingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a connector as indexing. Idempotent: an existing pending entry
    /// keeps its baseline.
    pub fn start(&self, connector_id: i64) {
        let baseline = self.observed.get(&connector_id).map(|v| *v);
        let mut state = self
            .states
            .entry(connector_id)
            .or_insert(IndexingState::Idle);
        if *state == IndexingState::Idle {
            *state = IndexingState::Pending(baseline);
            debug!(connector_id, ?baseline, "Indexing marked pending");
        }
    }

    /// Clears the pending mark. No-op for connectors that are not pending.
    pub fn stop(&self, connector_id: i64) {
        if self.states.remove(&connector_id).is_some() {
            debug!(connector_id, "Indexing mark cleared");
        }
    }

    pub fn is_indexing(&self, connector_id: i64) -> bool {
        matches!(
            self.states.get(&connector_id).map(|s| *s),
            Some(IndexingState::Pending(_))
        )
    }

    pub fn state(&self, connector_id: i64) -> IndexingState {
        self.states
            .get(&connector_id)
            .map(|s| *s)
            .unwrap_or(IndexingState::Idle)
    }

    /// Connector ids currently believed to be indexing, sorted.
    pub fn pending(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .states
            .iter()
            .filter(|e| matches!(e.value(), IndexingState::Pending(_)))
            .map(|e| *e.key())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Reducer applied to every feed emission. Returns the ids that
    /// finished indexing.
    pub fn observe(&self, connectors: &[Connector]) -> Vec<i64> {
        let mut finished = Vec::new();

        for connector in connectors {
            let id = connector.id;
            let current = connector.last_indexed_at;
            // Both steps run under the entry's shard lock; never re-insert.
            let moved = self.states.remove_if(&id, |_, state| {
                matches!(state, IndexingState::Pending(Some(previous)) if *previous != current)
            });
            if moved.is_some() {
                finished.push(id);
            } else if let Some(mut state) = self.states.get_mut(&id) {
                if *state == IndexingState::Pending(None) {
                    *state = IndexingState::Pending(Some(current));
                }
            }

            self.observed.insert(id, current);
        }

        if !finished.is_empty() {
            info!(connectors = ?finished, "Indexing finished");
        }
        finished
    }

    /// Consumes the feed until it closes, reducing every emission.
    pub async fn run(&self, feed: watch::Receiver<Vec<Connector>>) {
        let mut stream = WatchStream::new(feed);
        while let Some(connectors) = stream.next().await {
            self.observe(&connectors);
        }
        debug!("Connector feed closed, indexing tracker stopping");
    }
}

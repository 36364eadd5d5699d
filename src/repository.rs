//! Connector repository adapter.
//!
//! Wraps the backend's create/update/delete/index/list operations, validates
//! response shapes, and owns the reactive feed that carries the latest
//! connector list to the dialog and the indexing tracker.
//!
//! # Architecture
//!
//! ```text
//!   ConnectorDialog ──commands──▶ ConnectorRepository ──▶ ConnectorBackend (HTTP)
//!                                        │
//!                                  refresh()/publish
//!                                        ▼
//!                                  ConnectorFeed (watch)
//!                                   │            │
//!                              dialog lookups   IndexingTracker
//! ```

use crate::connector::{Connector, ConnectorUpdate, IndexOptions, NewConnector};
use crate::error::DialogError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Backend operations consumed by this subsystem.
///
/// Implementations return raw JSON; shape validation happens in
/// [`ConnectorRepository`], so a malformed record is reported as an
/// invalid response rather than a transport failure.
#[async_trait]
pub trait ConnectorBackend: Send + Sync {
    async fn create(&self, data: &NewConnector, search_space_id: i64) -> anyhow::Result<Value>;

    async fn update(&self, connector_id: i64, update: &ConnectorUpdate) -> anyhow::Result<Value>;

    async fn delete(&self, connector_id: i64) -> anyhow::Result<()>;

    async fn list(&self, search_space_id: i64) -> anyhow::Result<Value>;

    /// Starts an indexing job. Fire-and-forget: the response only confirms
    /// the job was accepted.
    async fn index(
        &self,
        connector_id: i64,
        search_space_id: i64,
        options: &IndexOptions,
    ) -> anyhow::Result<Value>;
}

/// Dependent data a mutation invalidated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Refresh {
    ConnectorList,
    Connector(i64),
}

/// Result of a mutating repository call plus what it invalidated.
#[derive(Clone, Debug, PartialEq)]
pub struct Mutation<T> {
    pub value: T,
    pub refresh: Vec<Refresh>,
}

impl<T> Mutation<T> {
    fn new(value: T, refresh: Vec<Refresh>) -> Self {
        Self { value, refresh }
    }
}

/// Latest connector list, observable by any number of subscribers.
#[derive(Clone)]
pub struct ConnectorFeed {
    tx: Arc<watch::Sender<Vec<Connector>>>,
}

impl ConnectorFeed {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self { tx: Arc::new(tx) }
    }

    /// Replaces the list and notifies subscribers.
    pub fn publish(&self, connectors: Vec<Connector>) {
        self.tx.send_replace(connectors);
    }

    pub fn snapshot(&self) -> Vec<Connector> {
        self.tx.borrow().clone()
    }

    pub fn find(&self, connector_id: i64) -> Option<Connector> {
        self.tx.borrow().iter().find(|c| c.id == connector_id).cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Connector>> {
        self.tx.subscribe()
    }
}

impl Default for ConnectorFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Thin adapter over a [`ConnectorBackend`] scoped to one search space.
pub struct ConnectorRepository {
    backend: Arc<dyn ConnectorBackend>,
    search_space_id: i64,
    feed: ConnectorFeed,
}

impl ConnectorRepository {
    pub fn new(backend: Arc<dyn ConnectorBackend>, search_space_id: i64) -> Self {
        Self {
            backend,
            search_space_id,
            feed: ConnectorFeed::new(),
        }
    }

    pub fn search_space_id(&self) -> i64 {
        self.search_space_id
    }

    pub fn feed(&self) -> &ConnectorFeed {
        &self.feed
    }

    pub fn snapshot(&self) -> Vec<Connector> {
        self.feed.snapshot()
    }

    pub fn find(&self, connector_id: i64) -> Option<Connector> {
        self.feed.find(connector_id)
    }

    /// Re-fetches the list and publishes it to the feed.
    pub async fn refresh(&self) -> Result<Vec<Connector>, DialogError> {
        const OP: &str = "load connectors";
        let raw = self
            .backend
            .list(self.search_space_id)
            .await
            .map_err(|e| DialogError::transport(OP, e))?;
        let connectors: Vec<Connector> =
            serde_json::from_value(raw).map_err(|e| DialogError::invalid_response(OP, e))?;

        for connector in connectors.iter().filter(|c| !c.schedule_is_consistent()) {
            warn!(
                connector_id = connector.id,
                kind = %connector.connector_type,
                "Connector has periodic indexing enabled without a usable schedule"
            );
        }

        debug!(
            search_space_id = self.search_space_id,
            count = connectors.len(),
            "Connector list refreshed"
        );
        self.feed.publish(connectors.clone());
        Ok(connectors)
    }

    /// Applies the invalidations returned by a mutation. Failures are
    /// logged; the next feed emission corrects the view.
    pub async fn apply(&self, refresh: &[Refresh]) {
        if refresh.is_empty() {
            return;
        }
        if let Err(e) = self.refresh().await {
            warn!(error = %e, ?refresh, "Failed to refresh connectors after mutation");
        }
    }

    pub async fn create(&self, data: &NewConnector) -> Result<Mutation<Connector>, DialogError> {
        const OP: &str = "create connector";
        let raw = self
            .backend
            .create(data, self.search_space_id)
            .await
            .map_err(|e| DialogError::transport(OP, e))?;
        let connector = parse_connector(OP, raw)?;
        info!(
            connector_id = connector.id,
            kind = %connector.connector_type,
            "Connector created"
        );
        Ok(Mutation::new(connector, vec![Refresh::ConnectorList]))
    }

    pub async fn update(
        &self,
        connector_id: i64,
        update: &ConnectorUpdate,
    ) -> Result<Mutation<Connector>, DialogError> {
        const OP: &str = "update connector";
        let raw = self
            .backend
            .update(connector_id, update)
            .await
            .map_err(|e| DialogError::transport(OP, e))?;
        let connector = parse_connector(OP, raw)?;
        if connector.id != connector_id {
            return Err(DialogError::invalid_response(
                OP,
                format!("expected connector {}, got {}", connector_id, connector.id),
            ));
        }
        info!(connector_id, "Connector updated");
        Ok(Mutation::new(
            connector,
            vec![Refresh::ConnectorList, Refresh::Connector(connector_id)],
        ))
    }

    pub async fn delete(&self, connector_id: i64) -> Result<Mutation<()>, DialogError> {
        self.backend
            .delete(connector_id)
            .await
            .map_err(|e| DialogError::transport("delete connector", e))?;
        info!(connector_id, "Connector deleted");
        Ok(Mutation::new((), vec![Refresh::ConnectorList]))
    }

    pub async fn index(
        &self,
        connector_id: i64,
        options: &IndexOptions,
    ) -> Result<Mutation<Value>, DialogError> {
        let accepted = self
            .backend
            .index(connector_id, self.search_space_id, options)
            .await
            .map_err(|e| DialogError::transport("start indexing", e))?;
        info!(
            connector_id,
            start_date = ?options.start_date_param(),
            end_date = ?options.end_date_param(),
            "Indexing job accepted"
        );
        Ok(Mutation::new(accepted, vec![Refresh::Connector(connector_id)]))
    }
}

fn parse_connector(op: &'static str, raw: Value) -> Result<Connector, DialogError> {
    serde_json::from_value(raw).map_err(|e| DialogError::invalid_response(op, e))
}

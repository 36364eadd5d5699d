// Shared fixtures for dialog integration tests: an in-memory connector
// backend, a scripted authorization endpoint and a recording redirector.
#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use connector_flow::address::{AddressParams, AddressState, MemoryHistory, NavWrite};
use connector_flow::config::FlowConfig;
use connector_flow::{
    AuthorizationEndpoint, Connector, ConnectorBackend, ConnectorDialog, ConnectorKind,
    ConnectorRepository, ConnectorUpdate, DialogEvent, EventBus, IndexOptions, IndexingTracker,
    NewConnector, Notice, OAuthInitiator, Redirector,
};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A backend call as observed by [`MockBackend`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Create(NewConnector),
    Update(i64, ConnectorUpdate),
    Delete(i64),
    List,
    Index(i64, IndexOptions),
}

/// In-memory connector store. Every call yields once before answering so
/// concurrent dialog operations interleave the way network calls do.
#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<Call>>,
    connectors: Mutex<Vec<Connector>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MockBackend {
    pub fn with(connectors: Vec<Connector>) -> Self {
        Self {
            connectors: Mutex::new(connectors),
            ..Self::default()
        }
    }

    /// Makes every subsequent call of `op` fail ("create", "update",
    /// "delete", "list" or "index").
    pub fn fail_on(&self, op: &'static str) {
        self.failing.lock().insert(op);
    }

    pub fn insert(&self, connector: Connector) {
        self.connectors.lock().push(connector);
    }

    pub fn set_last_indexed(&self, connector_id: i64, at: DateTime<Utc>) {
        if let Some(c) = self.connectors.lock().iter_mut().find(|c| c.id == connector_id) {
            c.last_indexed_at = Some(at);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Calls other than list re-fetches.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| *c != Call::List).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    async fn enter(&self, op: &'static str, call: Call) -> anyhow::Result<()> {
        self.calls.lock().push(call);
        tokio::task::yield_now().await;
        if self.failing.lock().contains(op) {
            return Err(anyhow!("{} failed with status 500 Internal Server Error", op));
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectorBackend for MockBackend {
    async fn create(&self, data: &NewConnector, _search_space_id: i64) -> anyhow::Result<Value> {
        self.enter("create", Call::Create(data.clone())).await?;
        let mut connectors = self.connectors.lock();
        let id = connectors.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let connector = Connector {
            id,
            connector_type: data.connector_type,
            name: data.name.clone(),
            config: data.config.clone(),
            is_indexable: data.is_indexable,
            is_active: true,
            periodic_indexing_enabled: data.periodic_indexing_enabled,
            indexing_frequency_minutes: data.indexing_frequency_minutes,
            last_indexed_at: None,
            next_scheduled_at: None,
        };
        connectors.push(connector.clone());
        Ok(serde_json::to_value(connector)?)
    }

    async fn update(&self, connector_id: i64, update: &ConnectorUpdate) -> anyhow::Result<Value> {
        self.enter("update", Call::Update(connector_id, update.clone())).await?;
        let mut connectors = self.connectors.lock();
        let connector = connectors
            .iter_mut()
            .find(|c| c.id == connector_id)
            .ok_or_else(|| anyhow!("connector {} not found", connector_id))?;
        if let Some(name) = &update.name {
            connector.name = name.clone();
        }
        if let Some(config) = &update.config {
            connector.config = config.clone();
        }
        if let Some(enabled) = update.periodic_indexing_enabled {
            connector.periodic_indexing_enabled = enabled;
        }
        if let Some(minutes) = update.indexing_frequency_minutes {
            connector.indexing_frequency_minutes = minutes;
        }
        Ok(serde_json::to_value(connector.clone())?)
    }

    async fn delete(&self, connector_id: i64) -> anyhow::Result<()> {
        self.enter("delete", Call::Delete(connector_id)).await?;
        self.connectors.lock().retain(|c| c.id != connector_id);
        Ok(())
    }

    async fn list(&self, _search_space_id: i64) -> anyhow::Result<Value> {
        self.enter("list", Call::List).await?;
        Ok(serde_json::to_value(self.connectors.lock().clone())?)
    }

    async fn index(
        &self,
        connector_id: i64,
        _search_space_id: i64,
        options: &IndexOptions,
    ) -> anyhow::Result<Value> {
        self.enter("index", Call::Index(connector_id, options.clone())).await?;
        Ok(json!({ "message": "Indexing started" }))
    }
}

/// Authorization endpoint answering with a fixed body, or failing when none
/// is set.
#[derive(Default)]
pub struct MockEndpoint {
    body: Mutex<Option<Value>>,
    requests: Mutex<Vec<(String, i64, Option<String>)>>,
}

impl MockEndpoint {
    pub fn respond(&self, body: Value) {
        *self.body.lock() = Some(body);
    }

    pub fn requests(&self) -> Vec<(String, i64, Option<String>)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl AuthorizationEndpoint for MockEndpoint {
    async fn request(&self, path: &str, search_space_id: i64, toolkit: Option<&str>) -> anyhow::Result<Value> {
        self.requests
            .lock()
            .push((path.to_string(), search_space_id, toolkit.map(str::to_string)));
        tokio::task::yield_now().await;
        self.body
            .lock()
            .clone()
            .ok_or_else(|| anyhow!("connection refused"))
    }
}

#[derive(Default)]
pub struct RecordingRedirector {
    urls: Mutex<Vec<String>>,
}

impl RecordingRedirector {
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

impl Redirector for RecordingRedirector {
    fn redirect(&self, url: &reqwest::Url) {
        self.urls.lock().push(url.to_string());
    }
}

pub const SEARCH_SPACE_ID: i64 = 1;

/// A dialog wired to mock collaborators.
pub struct Harness {
    pub backend: Arc<MockBackend>,
    pub endpoint: Arc<MockEndpoint>,
    pub redirector: Arc<RecordingRedirector>,
    pub history: Arc<MemoryHistory>,
    pub dialog: ConnectorDialog,
    events: broadcast::Receiver<DialogEvent>,
}

impl Harness {
    /// Builds a dialog over `connectors` with the feed already loaded and
    /// the call log cleared.
    pub async fn new(connectors: Vec<Connector>) -> Self {
        Self::at(connectors, "").await
    }

    /// Like [`Harness::new`], with the address starting at `query`.
    pub async fn at(connectors: Vec<Connector>, query: &str) -> Self {
        let backend = Arc::new(MockBackend::with(connectors));
        let endpoint = Arc::new(MockEndpoint::default());
        let redirector = Arc::new(RecordingRedirector::default());
        let history = Arc::new(MemoryHistory::starting_at(
            AddressParams::from_query(query).unwrap(),
        ));

        let repository = Arc::new(ConnectorRepository::new(backend.clone(), SEARCH_SPACE_ID));
        repository.refresh().await.unwrap();
        backend.clear_calls();

        let oauth = Arc::new(OAuthInitiator::new(endpoint.clone(), redirector.clone()));
        let events = EventBus::from_config(&FlowConfig::default().events);
        let receiver = events.subscribe();
        let dialog = ConnectorDialog::new(
            repository,
            oauth,
            history.clone(),
            Arc::new(IndexingTracker::new()),
            events,
        );

        Self {
            backend,
            endpoint,
            redirector,
            history,
            dialog,
            events: receiver,
        }
    }

    /// Simulates navigation to `query` (e.g. a provider redirect) followed
    /// by the dialog reconciling with it.
    pub async fn navigate(&self, query: &str) {
        self.history
            .write(AddressParams::from_query(query).unwrap(), NavWrite::Push);
        self.dialog.sync_from_address().await;
    }

    pub fn address(&self) -> AddressParams {
        self.history.current()
    }

    /// Drains the notices published so far.
    pub fn notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if let DialogEvent::Notice(notice) = event {
                notices.push(notice);
            }
        }
        notices
    }
}

pub fn connector(id: i64, kind: ConnectorKind, name: &str) -> Connector {
    Connector {
        id,
        connector_type: kind,
        name: name.to_string(),
        config: Map::new(),
        is_indexable: kind.traits().indexable,
        is_active: true,
        periodic_indexing_enabled: false,
        indexing_frequency_minutes: None,
        last_indexed_at: None,
        next_scheduled_at: None,
    }
}

pub fn config(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

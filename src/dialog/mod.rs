//! The connector dialog state machine.
//!
//! [`ConnectorDialog`] owns the active [`ViewState`] and its navigation
//! stack, runs validation, gates mutating calls through the submission
//! guard, and keeps the address params in step with the view.
//!
//! Operations take `&self`. Internal state sits behind a mutex that is never
//! held across an `.await`, so two operations may interleave at suspension
//! points the way UI callbacks do. Each view transition bumps an epoch; an
//! async operation that resumes under a newer epoch still clears its flags
//! and reports its notices but leaves the view and address untouched.

mod connect;
mod edit;
mod indexing;

use crate::address::{self, AddressState, NavWrite};
use crate::connector::{Connector, DateRange, PeriodicSettings};
use crate::error::{DialogError, ErrorClass, ValidationError};
use crate::events::{DialogEvent, EventBus, Notice};
use crate::guard::{BusyFlags, Operation, SubmissionGuard};
use crate::kind::ConnectorKind;
use crate::oauth::OAuthInitiator;
use crate::repository::{ConnectorRepository, Refresh};
use crate::tracker::IndexingTracker;
use crate::validation;
use crate::view::{NavStack, Tab, ViewState};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of a dialog operation. Failures, including calls refused for
/// being made from the wrong view, have already been published as an error
/// [`Notice`] by the time this is returned.
#[derive(Debug)]
pub enum Outcome {
    Completed,
    /// Another guarded operation is in flight; nothing was done.
    Busy,
    Failed(DialogError),
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }

    pub fn error(&self) -> Option<&DialogError> {
        match self {
            Outcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Raw periodic-sync form input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeriodicInput {
    pub enabled: bool,
    /// One of the allowed minute values, as entered.
    pub frequency: String,
}

impl PeriodicInput {
    pub fn every(frequency: impl Into<String>) -> Self {
        Self {
            enabled: true,
            frequency: frequency.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    fn parse(&self) -> Result<PeriodicSettings, ValidationError> {
        validation::check_frequency(self.enabled, &self.frequency)
    }
}

/// Connect form contents for a non-OAuth kind.
#[derive(Clone, Debug, Default)]
pub struct ConnectFormSubmission {
    pub name: String,
    pub config: Map<String, Value>,
    pub periodic: PeriodicInput,
    pub date_range: DateRange,
}

impl ConnectFormSubmission {
    pub fn new(name: impl Into<String>, config: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            config,
            ..Self::default()
        }
    }

    pub fn with_periodic(mut self, periodic: PeriodicInput) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = date_range;
        self
    }
}

/// Choices made on the indexing configuration view.
#[derive(Clone, Debug, Default)]
pub struct IndexingRequest {
    pub date_range: DateRange,
    pub periodic: PeriodicInput,
}

/// Edits to an existing connector. `None` fields are left unchanged.
#[derive(Clone, Debug, Default)]
pub struct EditSubmission {
    pub name: Option<String>,
    pub config: Option<Map<String, Value>>,
    pub periodic: Option<PeriodicInput>,
}

#[derive(Debug, Default)]
struct DialogState {
    nav: NavStack,
    epoch: u64,
}

/// How a transition moves through the navigation stack.
#[derive(Clone, Copy, Debug)]
enum Step {
    /// Discard history; the view becomes the root.
    Reset,
    /// Enter as a child of the current view.
    Enter,
    /// Overwrite the current view in place.
    Replace,
}

/// Orchestrates one connector dialog.
pub struct ConnectorDialog {
    session_id: Uuid,
    state: Mutex<DialogState>,
    repository: Arc<ConnectorRepository>,
    oauth: Arc<OAuthInitiator>,
    address: Arc<dyn AddressState>,
    tracker: Arc<IndexingTracker>,
    guard: SubmissionGuard,
    busy: BusyFlags,
    events: EventBus,
}

impl ConnectorDialog {
    pub fn new(
        repository: Arc<ConnectorRepository>,
        oauth: Arc<OAuthInitiator>,
        address: Arc<dyn AddressState>,
        tracker: Arc<IndexingTracker>,
        events: EventBus,
    ) -> Self {
        let session_id = Uuid::new_v4();
        debug!(%session_id, search_space_id = repository.search_space_id(), "Connector dialog created");
        Self {
            session_id,
            state: Mutex::new(DialogState::default()),
            repository,
            oauth,
            address,
            tracker,
            guard: SubmissionGuard::new(),
            busy: BusyFlags::new(),
            events,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn view(&self) -> ViewState {
        self.state.lock().nav.current().clone()
    }

    pub fn nav(&self) -> NavStack {
        self.state.lock().nav.clone()
    }

    pub fn is_busy(&self, op: Operation) -> bool {
        self.busy.is_busy(op)
    }

    pub fn is_indexing(&self, connector_id: i64) -> bool {
        self.tracker.is_indexing(connector_id)
    }

    /// Whether an OAuth initiation is in flight (its control is disabled).
    pub fn is_authorizing(&self) -> bool {
        self.oauth.is_initiating()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn repository(&self) -> &Arc<ConnectorRepository> {
        &self.repository
    }

    pub fn tracker(&self) -> &Arc<IndexingTracker> {
        &self.tracker
    }

    /// `Closed --open--> Browse(all)`. No-op while already open.
    pub fn open(&self) {
        if self.view().is_open() {
            return;
        }
        self.transition(ViewState::browse(), Step::Reset, Some(NavWrite::Push));
    }

    /// Closes the dialog and pushes a cleared-params entry.
    pub fn close(&self) {
        if !self.view().is_open() {
            return;
        }
        self.transition(ViewState::Closed, Step::Reset, Some(NavWrite::Push));
    }

    /// Switches the browse tab in place.
    pub fn set_tab(&self, tab: Tab) -> Outcome {
        match self.view() {
            ViewState::Browse { tab: current } if current == tab => Outcome::Completed,
            ViewState::Browse { .. } => {
                self.transition(ViewState::Browse { tab }, Step::Replace, Some(NavWrite::Replace));
                Outcome::Completed
            }
            view => self.reject(&view, "set tab"),
        }
    }

    /// Opens the accounts list of a multi-account kind.
    pub fn open_accounts(&self, kind: ConnectorKind) -> Outcome {
        self.enter_from_browse(ViewState::accounts(kind), "open accounts")
    }

    pub fn open_mcp_list(&self) -> Outcome {
        self.enter_from_browse(ViewState::McpList, "open MCP list")
    }

    pub fn open_youtube(&self) -> Outcome {
        self.enter_from_browse(ViewState::YouTube, "open YouTube")
    }

    pub fn open_composio(&self) -> Outcome {
        self.enter_from_browse(ViewState::ComposioToolkit, "open Composio")
    }

    /// Returns to the view the current one was entered from, or to
    /// `Browse(all)` when no origin is recorded (e.g. after a reload).
    pub fn back(&self) {
        let from = self.view();
        if matches!(from, ViewState::Closed | ViewState::Browse { .. }) {
            return;
        }
        if matches!(from, ViewState::Connecting { .. }) {
            self.oauth.reset();
        }

        debug!(session_id = %self.session_id, from = from.name(), "Navigating back");
        self.back_if_current(self.epoch());
    }

    fn enter_from_browse(&self, view: ViewState, action: &'static str) -> Outcome {
        match self.view() {
            ViewState::Browse { .. } => {
                self.transition(view, Step::Enter, Some(NavWrite::Push));
                Outcome::Completed
            }
            current => self.reject(&current, action),
        }
    }

    fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Applies a transition, bumps the epoch and writes the address.
    fn transition(&self, view: ViewState, step: Step, write: Option<NavWrite>) {
        {
            let mut state = self.state.lock();
            apply_step(&mut state.nav, view.clone(), step);
            state.epoch += 1;
        }
        self.publish_view(&view, write);
    }

    /// Like [`transition`](Self::transition), but only if no other
    /// transition happened since `epoch` was captured.
    fn transition_if_current(&self, epoch: u64, view: ViewState, step: Step, write: Option<NavWrite>) -> bool {
        {
            let mut state = self.state.lock();
            if state.epoch != epoch {
                debug!(
                    session_id = %self.session_id,
                    target = view.name(),
                    "View changed while the operation was in flight, not navigating"
                );
                return false;
            }
            apply_step(&mut state.nav, view.clone(), step);
            state.epoch += 1;
        }
        self.publish_view(&view, write);
        true
    }

    /// Navigates back to the recorded origin if no other transition
    /// happened since `epoch`.
    fn back_if_current(&self, epoch: u64) -> bool {
        let to = {
            let mut state = self.state.lock();
            if state.epoch != epoch {
                return false;
            }
            let to = match state.nav.back() {
                Some(view) => view.clone(),
                None => {
                    state.nav.reset(ViewState::browse());
                    ViewState::browse()
                }
            };
            state.epoch += 1;
            to
        };
        self.publish_view(&to, Some(NavWrite::Replace));
        true
    }

    fn publish_view(&self, view: &ViewState, write: Option<NavWrite>) {
        if let Some(mode) = write {
            self.address.write(address::encode(view), mode);
        }
        debug!(session_id = %self.session_id, view = view.name(), ?write, "View changed");
        self.events.emit(DialogEvent::ViewChanged(view.clone()));
    }

    async fn apply_refresh(&self, refresh: &[Refresh]) {
        self.repository.apply(refresh).await;
        if !refresh.is_empty() {
            self.events.emit(DialogEvent::Refreshed(refresh.to_vec()));
        }
    }

    /// Feed lookup, falling back to one re-fetch for ids not yet seen.
    async fn lookup(&self, connector_id: i64) -> Result<Connector, DialogError> {
        if let Some(connector) = self.repository.find(connector_id) {
            return Ok(connector);
        }
        self.repository
            .refresh()
            .await?
            .into_iter()
            .find(|c| c.id == connector_id)
            .ok_or_else(|| ValidationError::UnknownConnector(connector_id).into())
    }

    fn reject(&self, view: &ViewState, action: &'static str) -> Outcome {
        warn!(session_id = %self.session_id, view = view.name(), action, "Operation not available in this view");
        self.refuse()
    }

    /// Fails an operation that never started.
    fn refuse(&self) -> Outcome {
        let error = DialogError::from(ValidationError::WrongView);
        self.events.notify(Notice::error(error.to_string()));
        Outcome::Failed(error)
    }

    fn busy_outcome(&self, op: Operation) -> Outcome {
        debug!(session_id = %self.session_id, %op, "Another submission is in flight, ignoring");
        Outcome::Busy
    }

    /// Surfaces a failure as an error notice.
    fn fail(&self, op: Operation, error: DialogError) -> Outcome {
        match error.class() {
            ErrorClass::Validation => {
                info!(session_id = %self.session_id, %op, error = %error, "Submission rejected")
            }
            _ => warn!(session_id = %self.session_id, %op, error = %error, "Submission failed"),
        }
        self.events.notify(Notice::error(error.to_string()));
        Outcome::Failed(error)
    }
}

fn apply_step(nav: &mut NavStack, view: ViewState, step: Step) {
    match step {
        Step::Reset => nav.reset(view),
        Step::Enter => nav.enter(view),
        Step::Replace => nav.replace(view),
    }
}

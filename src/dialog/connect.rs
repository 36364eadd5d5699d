//! Connecting new connectors: OAuth initiation, the connect form, and the
//! reconciliation of address changes (including authorization returns).

use super::{ConnectFormSubmission, ConnectorDialog, Outcome, Step};
use crate::address::{self, AddressParams, NavWrite};
use crate::connector::{selection_count, Connector, ConnectorUpdate, NewConnector};
use crate::error::{DialogError, ValidationError};
use crate::events::Notice;
use crate::guard::Operation;
use crate::kind::{AuthMethod, ConnectorKind};
use crate::oauth::AuthorizationReturn;
use crate::validation;
use crate::view::ViewState;
use tracing::{debug, info, warn};

impl ConnectorDialog {
    /// Picks a connector kind from the catalogue.
    ///
    /// OAuth kinds move to `Connecting` and hand off to the authorization
    /// provider; a failed initiation returns to the previous view with an
    /// error notice. Form kinds open the connect form.
    pub async fn select_connector(&self, kind: ConnectorKind) -> Outcome {
        let view = self.view();
        let allowed = match &view {
            ViewState::Browse { .. } => !matches!(kind.traits().auth, AuthMethod::Composio(_)),
            ViewState::AccountsList { kind: listed, .. } => *listed == kind,
            ViewState::ComposioToolkit => matches!(kind.traits().auth, AuthMethod::Composio(_)),
            _ => false,
        };
        if !allowed {
            return self.reject(&view, "select connector");
        }

        if !kind.traits().is_oauth() {
            self.transition(ViewState::ConnectForm { kind }, Step::Enter, Some(NavWrite::Push));
            return Outcome::Completed;
        }

        if self.oauth.is_initiating() {
            debug!(session_id = %self.session_id, kind = %kind, "Authorization already in flight, ignoring");
            return Outcome::Busy;
        }

        // Connecting is transient; the address is left as it was.
        self.transition(ViewState::Connecting { kind }, Step::Enter, None);
        let epoch = self.epoch();

        match self.oauth.initiate(kind, self.repository.search_space_id()).await {
            Ok(true) => Outcome::Completed,
            Ok(false) => Outcome::Busy,
            Err(e) => {
                self.events.notify(Notice::error(e.to_string()));
                self.back_if_current(epoch);
                Outcome::Failed(e)
            }
        }
    }

    /// Picks a toolkit from the Composio view.
    pub async fn select_composio_toolkit(&self, kind: ConnectorKind) -> Outcome {
        if !matches!(kind.traits().auth, AuthMethod::Composio(_)) {
            warn!(session_id = %self.session_id, kind = %kind, "Not a Composio toolkit");
            return self.refuse();
        }
        self.select_connector(kind).await
    }

    /// Submits the connect form.
    ///
    /// Indexable kinds get their periodic settings persisted and a first
    /// indexing run started before the dialog closes. The webhook-driven
    /// kind opens its edit view instead so the generated URL is visible.
    pub async fn submit_connect_form(&self, form: ConnectFormSubmission) -> Outcome {
        let kind = match self.view() {
            ViewState::ConnectForm { kind } => kind,
            view => return self.reject(&view, "submit connect form"),
        };
        let Some(_permit) = self.guard.try_acquire() else {
            return self.busy_outcome(Operation::Create);
        };
        let _busy = self.busy.raise(Operation::Create);
        let epoch = self.epoch();

        match self.connect(kind, form, epoch).await {
            Ok(()) => Outcome::Completed,
            Err(e) => self.fail(Operation::Create, e),
        }
    }

    async fn connect(&self, kind: ConnectorKind, form: ConnectFormSubmission, epoch: u64) -> Result<(), DialogError> {
        let traits = kind.traits();
        let name = form.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        let periodic = form.periodic.parse()?;
        validation::check_periodic(kind, periodic.is_enabled(), traits.indexable, selection_count(&form.config))?;
        validation::check_date_range(kind, &form.date_range)?;

        let created = self
            .repository
            .create(&NewConnector::new(kind, name, form.config))
            .await?;
        self.apply_refresh(&created.refresh).await;
        let connector = created.value;

        if traits.webhook_driven {
            self.events
                .notify(Notice::success(format!("{} connected", connector.name)));
            self.transition_if_current(
                epoch,
                ViewState::EditConnector {
                    connector_id: connector.id,
                },
                Step::Replace,
                Some(NavWrite::Push),
            );
            return Ok(());
        }

        if !connector.is_indexable {
            self.events
                .notify(Notice::success(format!("{} connected", connector.name)));
            self.transition_if_current(epoch, ViewState::Closed, Step::Reset, Some(NavWrite::Push));
            return Ok(());
        }

        if periodic.is_enabled() {
            let updated = self
                .repository
                .update(connector.id, &ConnectorUpdate::periodic(periodic))
                .await?;
            self.apply_refresh(&updated.refresh).await;
        }

        self.run_indexing(&connector, &form.date_range).await?;

        self.events.notify(Notice::success(format!(
            "{} connected, indexing started",
            connector.name
        )));
        self.transition_if_current(epoch, ViewState::Closed, Step::Reset, Some(NavWrite::Push));
        Ok(())
    }

    /// Reconciles the dialog with the current address params.
    ///
    /// Called on start-up, after back/forward navigation and when the
    /// authorization provider returns. An authorization return is consumed:
    /// success lands on the indexing configuration of the authorized
    /// connector, failure on `Browse` with an error notice, and in both cases
    /// the return params are replaced away.
    pub async fn sync_from_address(&self) {
        let params = self.address.current();

        if let Some(ret) = AuthorizationReturn::from_params(&params) {
            self.oauth.reset();
            self.complete_authorization(&params, ret).await;
            return;
        }

        let connectors = self.repository.snapshot();
        let view = match address::try_decode(&params, &connectors) {
            Ok(view) => view,
            Err(e) => {
                warn!(
                    session_id = %self.session_id,
                    error = %e,
                    params = %params.to_query(),
                    "Discarding unresolvable address params, falling back to browse"
                );
                self.transition(ViewState::browse(), Step::Reset, Some(NavWrite::Replace));
                return;
            }
        };

        let (current, origin) = {
            let state = self.state.lock();
            (state.nav.current().clone(), state.nav.origin().cloned())
        };
        if view == current {
            return;
        }
        if origin.as_ref() == Some(&view) {
            // History stepped back to the view this one was entered from.
            {
                let mut state = self.state.lock();
                state.nav.back();
                state.epoch += 1;
            }
            self.publish_view(&view, None);
            return;
        }
        if matches!(current, ViewState::Connecting { .. }) {
            self.oauth.reset();
        }
        self.transition(view, Step::Reset, None);
    }

    async fn complete_authorization(&self, params: &AddressParams, ret: AuthorizationReturn) {
        if let Some(message) = ret.message() {
            info!(session_id = %self.session_id, error = ?params.error, "Authorization was not granted");
            self.events.notify(Notice::error(message));
            self.transition(ViewState::browse(), Step::Reset, Some(NavWrite::Replace));
            return;
        }

        let connectors: Vec<Connector> = match self.repository.refresh().await {
            Ok(list) => list,
            Err(e) => {
                warn!(session_id = %self.session_id, error = %e, "Failed to reload connectors after authorization");
                self.repository.snapshot()
            }
        };

        // Providers may drop the modal param on the way back.
        let mut params = params.clone();
        params.modal.get_or_insert_with(|| address::MODAL.to_string());

        match address::try_decode(&params, &connectors) {
            Ok(ViewState::IndexingConfig(state)) => {
                info!(
                    session_id = %self.session_id,
                    connector_id = state.connector_id,
                    kind = %state.connector_type,
                    "Authorization completed"
                );
                self.events
                    .notify(Notice::success(format!("{} connected", state.connector_title)));
                self.transition(ViewState::IndexingConfig(state), Step::Reset, Some(NavWrite::Replace));
            }
            Ok(view) => self.transition(view, Step::Reset, Some(NavWrite::Replace)),
            Err(e) => {
                warn!(
                    session_id = %self.session_id,
                    error = %e,
                    params = %params.to_query(),
                    "Authorized connector could not be resolved"
                );
                self.events
                    .notify(Notice::error("Connected, but the new connector could not be found"));
                self.transition(ViewState::browse(), Step::Reset, Some(NavWrite::Replace));
            }
        }
    }
}

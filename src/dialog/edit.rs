use super::{ConnectorDialog, EditSubmission, Outcome, PeriodicInput, Step};
use crate::address::NavWrite;
use crate::connector::{selection_count, Connector, ConnectorUpdate};
use crate::error::{DialogError, ValidationError};
use crate::events::Notice;
use crate::guard::Operation;
use crate::validation;
use crate::view::{Tab, ViewState};
use tracing::{debug, info};

impl ConnectorDialog {
    /// Opens the edit view of an existing connector.
    ///
    /// From the unfiltered browse listing, multi-account kinds open their
    /// server list instead.
    pub fn manage_connector(&self, connector_id: i64) -> Outcome {
        let view = self.view();
        let Some(connector) = self.repository.find(connector_id) else {
            debug!(session_id = %self.session_id, connector_id, "Manage requested for unknown connector");
            return Outcome::Failed(ValidationError::UnknownConnector(connector_id).into());
        };

        let target = match &view {
            ViewState::Browse { tab: Tab::All } if connector.connector_type.traits().is_multi_account => {
                ViewState::McpList
            }
            ViewState::Browse { .. } | ViewState::AccountsList { .. } | ViewState::McpList => {
                ViewState::EditConnector { connector_id }
            }
            _ => return self.reject(&view, "manage connector"),
        };
        self.transition(target, Step::Enter, Some(NavWrite::Push));
        Outcome::Completed
    }

    /// Opens one account of an accounts list for editing; back returns to
    /// the list.
    pub fn manage_account(&self, connector_id: i64) -> Outcome {
        match self.view() {
            ViewState::AccountsList { .. } | ViewState::McpList => self.manage_connector(connector_id),
            view => self.reject(&view, "manage account"),
        }
    }

    /// Saves edits and returns to the view the edit was opened from.
    /// On failure the edit view and the address stay as they were.
    pub async fn save_edit(&self, edits: EditSubmission) -> Outcome {
        let connector_id = match self.view() {
            ViewState::EditConnector { connector_id } => connector_id,
            view => return self.reject(&view, "save"),
        };
        let Some(_permit) = self.guard.try_acquire() else {
            return self.busy_outcome(Operation::Save);
        };
        let _busy = self.busy.raise(Operation::Save);
        let epoch = self.epoch();

        match self.save(connector_id, edits).await {
            Ok(Some(connector)) => {
                self.events
                    .notify(Notice::success(format!("{} updated", connector.name)));
                self.back_if_current(epoch);
                Outcome::Completed
            }
            Ok(None) => {
                self.events.notify(Notice::info("No changes to save"));
                Outcome::Completed
            }
            Err(e) => self.fail(Operation::Save, e),
        }
    }

    async fn save(&self, connector_id: i64, edits: EditSubmission) -> Result<Option<Connector>, DialogError> {
        let connector = self.lookup(connector_id).await?;
        let kind = connector.connector_type;

        let mut update = ConnectorUpdate::default();
        if let Some(name) = edits.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(ValidationError::MissingName.into());
            }
            if name != connector.name {
                update.name = Some(name.to_string());
            }
        }
        let requested = edits.periodic.as_ref().map(PeriodicInput::parse).transpose()?;
        if requested.is_some() || edits.config.is_some() {
            // With no schedule requested, the stored one applies.
            let periodic_enabled = requested.map_or(connector.periodic_indexing_enabled, |s| s.is_enabled());
            let selected = edits
                .config
                .as_ref()
                .map(selection_count)
                .unwrap_or_else(|| connector.selected_item_count());
            validation::check_periodic(kind, periodic_enabled, connector.is_indexable, selected)?;
        }
        if let Some(settings) = requested {
            let schedule = ConnectorUpdate::periodic(settings);
            update.periodic_indexing_enabled = schedule.periodic_indexing_enabled;
            update.indexing_frequency_minutes = schedule.indexing_frequency_minutes;
        }
        if let Some(config) = edits.config {
            if config != connector.config {
                update.config = Some(config);
            }
        }

        if update.is_empty() {
            return Ok(None);
        }

        let updated = self.repository.update(connector_id, &update).await?;
        self.apply_refresh(&updated.refresh).await;
        Ok(Some(updated.value))
    }

    /// Deletes the connector being edited. Closes the dialog, or returns to
    /// the MCP server list when the edit was opened from there.
    pub async fn disconnect(&self) -> Outcome {
        let connector_id = match self.view() {
            ViewState::EditConnector { connector_id } => connector_id,
            view => return self.reject(&view, "disconnect"),
        };
        let Some(_permit) = self.guard.try_acquire() else {
            return self.busy_outcome(Operation::Disconnect);
        };
        let _busy = self.busy.raise(Operation::Disconnect);
        let epoch = self.epoch();
        let from_mcp_list = self.state.lock().nav.origin() == Some(&ViewState::McpList);

        let deleted = match self.repository.delete(connector_id).await {
            Ok(deleted) => deleted,
            Err(e) => return self.fail(Operation::Disconnect, e),
        };
        self.tracker.stop(connector_id);
        self.apply_refresh(&deleted.refresh).await;

        info!(session_id = %self.session_id, connector_id, "Connector disconnected");
        self.events.notify(Notice::success("Connector disconnected"));

        if from_mcp_list {
            self.back_if_current(epoch);
        } else {
            self.transition_if_current(epoch, ViewState::Closed, Step::Reset, Some(NavWrite::Push));
        }
        Outcome::Completed
    }
}

use super::{ConnectorDialog, IndexingRequest, Outcome, Step};
use crate::address::NavWrite;
use crate::connector::{Connector, ConnectorUpdate, DateRange, IndexOptions};
use crate::error::DialogError;
use crate::events::Notice;
use crate::guard::Operation;
use crate::kind::IndexingScope;
use crate::validation;
use crate::view::{IndexingConfigState, ViewState};
use tracing::info;

impl ConnectorDialog {
    /// Starts the first indexing run from the configuration view and closes
    /// the dialog.
    ///
    /// The connector is marked as indexing before anything else; every
    /// failure path, validation included, clears the mark again.
    pub async fn start_indexing(&self, request: IndexingRequest) -> Outcome {
        let config = match self.view() {
            ViewState::IndexingConfig(config) => config,
            view => return self.reject(&view, "start indexing"),
        };
        let Some(_permit) = self.guard.try_acquire() else {
            return self.busy_outcome(Operation::StartIndexing);
        };
        let _busy = self.busy.raise(Operation::StartIndexing);
        let epoch = self.epoch();
        let connector_id = config.connector_id;

        self.tracker.start(connector_id);
        match self.configure_and_index(&config, &request).await {
            Ok(()) => {
                self.events.notify(Notice::success(format!(
                    "{}: indexing started",
                    config.connector_title
                )));
                self.transition_if_current(epoch, ViewState::Closed, Step::Reset, Some(NavWrite::Push));
                Outcome::Completed
            }
            Err(e) => {
                self.tracker.stop(connector_id);
                self.fail(Operation::StartIndexing, e)
            }
        }
    }

    /// Leaves the configuration view without indexing.
    pub fn skip_indexing(&self) -> Outcome {
        match self.view() {
            ViewState::IndexingConfig(config) => {
                info!(session_id = %self.session_id, connector_id = config.connector_id, "Initial indexing skipped");
                self.close();
                Outcome::Completed
            }
            view => self.reject(&view, "skip indexing"),
        }
    }

    /// Re-indexes the connector being edited without leaving the view.
    pub async fn index_now(&self, range: DateRange) -> Outcome {
        let connector_id = match self.view() {
            ViewState::EditConnector { connector_id } => connector_id,
            view => return self.reject(&view, "index now"),
        };
        let Some(_permit) = self.guard.try_acquire() else {
            return self.busy_outcome(Operation::StartIndexing);
        };
        let _busy = self.busy.raise(Operation::StartIndexing);

        let result = async {
            let connector = self.lookup(connector_id).await?;
            validation::check_date_range(connector.connector_type, &range)?;
            self.run_indexing(&connector, &range).await?;
            Ok::<_, DialogError>(connector)
        }
        .await;

        match result {
            Ok(connector) => {
                self.events
                    .notify(Notice::success(format!("{}: indexing started", connector.name)));
                Outcome::Completed
            }
            Err(e) => self.fail(Operation::StartIndexing, e),
        }
    }

    async fn configure_and_index(
        &self,
        config: &IndexingConfigState,
        request: &IndexingRequest,
    ) -> Result<(), DialogError> {
        let connector = self.lookup(config.connector_id).await?;
        let kind = connector.connector_type;

        validation::check_selection(&connector)?;
        let periodic = request.periodic.parse()?;
        validation::check_periodic(kind, periodic.is_enabled(), connector.is_indexable, connector.selected_item_count())?;
        validation::check_date_range(kind, &request.date_range)?;

        // Schedule is persisted before the run is triggered.
        if periodic.is_enabled() {
            let updated = self
                .repository
                .update(connector.id, &ConnectorUpdate::periodic(periodic))
                .await?;
            self.apply_refresh(&updated.refresh).await;
        }

        self.run_indexing(&connector, &request.date_range).await
    }

    /// Marks the connector as indexing and triggers the run. The mark is
    /// cleared again if the selection is empty or the call fails.
    pub(super) async fn run_indexing(&self, connector: &Connector, range: &DateRange) -> Result<(), DialogError> {
        self.tracker.start(connector.id);
        if let Err(e) = validation::check_selection(connector) {
            self.tracker.stop(connector.id);
            return Err(e.into());
        }

        let options = index_options(connector, range);
        match self.repository.index(connector.id, &options).await {
            Ok(accepted) => {
                self.apply_refresh(&accepted.refresh).await;
                Ok(())
            }
            Err(e) => {
                self.tracker.stop(connector.id);
                Err(e)
            }
        }
    }
}

/// Date params for range kinds, the selection body for folder kinds,
/// nothing otherwise.
fn index_options(connector: &Connector, range: &DateRange) -> IndexOptions {
    match connector.connector_type.traits().scope {
        IndexingScope::DateRange => IndexOptions {
            start_date: range.start,
            end_date: range.end,
            body: None,
        },
        IndexingScope::FolderSelection => IndexOptions {
            body: Some(connector.selection_body()),
            ..IndexOptions::default()
        },
        IndexingScope::StaticConfig | IndexingScope::None => IndexOptions::default(),
    }
}

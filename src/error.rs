use crate::kind::ConnectorKind;
use thiserror::Error;

/// Failures caught before any network call is issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Start date must be before or equal to end date")]
    InvertedDateRange,

    #[error("Unsupported indexing frequency: {0}")]
    InvalidFrequency(String),

    #[error("Periodic sync is not available for non-indexable connectors")]
    PeriodicOnNonIndexable,

    #[error("Periodic sync is not available for {0}")]
    PeriodicUnsupported(&'static str),

    #[error("Select at least one folder or file before enabling periodic sync")]
    PeriodicWithoutSelection,

    #[error("Select at least one folder or file to index")]
    EmptySelection,

    #[error("Connector name is required")]
    MissingName,

    #[error("Connector {0} is not available")]
    UnknownConnector(i64),

    #[error("This action is not available from the current view")]
    WrongView,
}

/// Error taxonomy surfaced by the dialog.
#[derive(Error, Debug)]
pub enum DialogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to {op}: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to {op}: invalid response from server ({detail})")]
    InvalidResponse { op: &'static str, detail: String },

    #[error("Could not reach the {} authorization endpoint", .kind.title())]
    AuthorizationUnreachable {
        kind: ConnectorKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("The {} authorization endpoint returned an invalid response", .kind.title())]
    AuthorizationInvalid { kind: ConnectorKind, detail: String },
}

/// Coarse classification used for rollback decisions and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Transport,
    ResponseShape,
}

impl DialogError {
    pub fn transport(op: &'static str, source: anyhow::Error) -> Self {
        DialogError::Transport { op, source }
    }

    pub fn invalid_response(op: &'static str, detail: impl ToString) -> Self {
        DialogError::InvalidResponse {
            op,
            detail: detail.to_string(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            DialogError::Validation(_) => ErrorClass::Validation,
            DialogError::Transport { .. } | DialogError::AuthorizationUnreachable { .. } => {
                ErrorClass::Transport
            }
            DialogError::InvalidResponse { .. } | DialogError::AuthorizationInvalid { .. } => {
                ErrorClass::ResponseShape
            }
        }
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            DialogError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

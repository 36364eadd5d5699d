//! Address params: the bookmarkable surface of the dialog.
//!
//! [`encode`] maps every [`ViewState`] to a flat set of optional string
//! params. [`try_decode`] resolves params back to a view using the current
//! connector list; [`decode`] degrades any inconsistency to
//! `Browse { tab: all }` and logs what was discarded.

use crate::connector::Connector;
use crate::kind::ConnectorKind;
use crate::view::{IndexingConfigState, Tab, ViewState};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Value of the `modal` param while the dialog is open.
pub const MODAL: &str = "connectors";

pub const VIEW_CONFIGURE: &str = "configure";
pub const VIEW_EDIT: &str = "edit";
pub const VIEW_CONNECT: &str = "connect";
pub const VIEW_YOUTUBE: &str = "youtube";
pub const VIEW_ACCOUNTS: &str = "accounts";
pub const VIEW_MCP_LIST: &str = "mcp-list";
pub const VIEW_COMPOSIO: &str = "composio";

/// Flat map of optional params carried in the navigable location.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AddressParams {
    /// Parses a query string (with or without the leading `?`). Unknown
    /// keys are ignored and empty values are treated as absent.
    pub fn from_query(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        let query = query.trim_start_matches('?');
        let mut params: AddressParams = serde_urlencoded::from_str(query)?;
        for field in params.fields_mut() {
            if field.as_deref().is_some_and(str::is_empty) {
                *field = None;
            }
        }
        Ok(params)
    }

    pub fn to_query(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// True when the params carry an authorization return.
    pub fn has_authorization_result(&self) -> bool {
        self.success.is_some() || self.error.is_some()
    }

    /// Copy without the authorization-return params.
    pub fn without_authorization_result(&self) -> Self {
        Self {
            connector: None,
            success: None,
            error: None,
            ..self.clone()
        }
    }

    fn fields_mut(&mut self) -> [&mut Option<String>; 8] {
        [
            &mut self.modal,
            &mut self.tab,
            &mut self.view,
            &mut self.connector,
            &mut self.connector_id,
            &mut self.connector_type,
            &mut self.success,
            &mut self.error,
        ]
    }
}

/// Reasons params could not be resolved to a view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown view '{0}'")]
    UnknownView(String),
    #[error("unknown tab '{0}'")]
    UnknownTab(String),
    #[error("view '{0}' requires connectorId")]
    MissingConnectorId(&'static str),
    #[error("connectorId '{0}' is not a positive integer")]
    InvalidConnectorId(String),
    #[error("connector {0} is not in the connector list")]
    UnknownConnector(i64),
    #[error("view '{0}' requires connectorType")]
    MissingConnectorType(&'static str),
    #[error("unknown connector type '{0}'")]
    UnknownConnectorType(String),
    #[error("connector {id} has type {actual}, params say {expected}")]
    TypeMismatch {
        id: i64,
        expected: ConnectorKind,
        actual: ConnectorKind,
    },
    #[error("{0} is authorized through OAuth and has no connect form")]
    NotAFormKind(ConnectorKind),
    #[error("authorization for '{0}' was interrupted before it returned")]
    AuthorizationInterrupted(String),
    #[error("authorized connector could not be found")]
    AuthorizedConnectorNotFound,
    #[error("connector {0} has no usable title")]
    MissingTitle(i64),
}

/// Encodes a view into address params. Total and injective per variant.
pub fn encode(view: &ViewState) -> AddressParams {
    let open = |tab: Tab, view: Option<&str>| AddressParams {
        modal: Some(MODAL.to_string()),
        tab: Some(tab.as_str().to_string()),
        view: view.map(str::to_string),
        ..AddressParams::default()
    };

    match view {
        ViewState::Closed => AddressParams::default(),
        ViewState::Browse { tab } => open(*tab, None),
        ViewState::Connecting { kind } => AddressParams {
            connector: kind.traits().auth_route().map(|r| r.slug.to_string()),
            connector_type: Some(kind.as_str().to_string()),
            ..open(Tab::All, None)
        },
        ViewState::ConnectForm { kind } => AddressParams {
            connector_type: Some(kind.as_str().to_string()),
            ..open(Tab::All, Some(VIEW_CONNECT))
        },
        ViewState::IndexingConfig(state) => AddressParams {
            connector_id: Some(state.connector_id.to_string()),
            connector_type: Some(state.connector_type.as_str().to_string()),
            ..open(Tab::All, Some(VIEW_CONFIGURE))
        },
        ViewState::EditConnector { connector_id } => AddressParams {
            connector_id: Some(connector_id.to_string()),
            ..open(Tab::All, Some(VIEW_EDIT))
        },
        ViewState::AccountsList { kind, .. } => AddressParams {
            connector_type: Some(kind.as_str().to_string()),
            ..open(Tab::All, Some(VIEW_ACCOUNTS))
        },
        ViewState::McpList => open(Tab::All, Some(VIEW_MCP_LIST)),
        ViewState::YouTube => open(Tab::All, Some(VIEW_YOUTUBE)),
        ViewState::ComposioToolkit => open(Tab::All, Some(VIEW_COMPOSIO)),
    }
}

/// Resolves params against the known connectors, failing on any
/// inconsistency.
pub fn try_decode(params: &AddressParams, connectors: &[Connector]) -> Result<ViewState, DecodeError> {
    if params.modal.as_deref() != Some(MODAL) {
        return Ok(ViewState::Closed);
    }

    if params.has_authorization_result() {
        return decode_authorization_return(params, connectors);
    }

    if let (Some(slug), None) = (&params.connector, &params.view) {
        return Err(DecodeError::AuthorizationInterrupted(slug.clone()));
    }

    let tab = match params.tab.as_deref() {
        None => Tab::All,
        Some(t) => Tab::parse(t).ok_or_else(|| DecodeError::UnknownTab(t.to_string()))?,
    };

    let Some(view) = params.view.as_deref() else {
        return Ok(ViewState::Browse { tab });
    };

    match view {
        VIEW_CONFIGURE => {
            let connector = find_connector(params, connectors, VIEW_CONFIGURE)?;
            if let Some(expected) = optional_kind(params)? {
                if expected != connector.connector_type {
                    return Err(DecodeError::TypeMismatch {
                        id: connector.id,
                        expected,
                        actual: connector.connector_type,
                    });
                }
            }
            IndexingConfigState::new(connector.connector_type, connector.id, &connector.name)
                .map(ViewState::IndexingConfig)
                .ok_or(DecodeError::MissingTitle(connector.id))
        }
        VIEW_EDIT => {
            let connector = find_connector(params, connectors, VIEW_EDIT)?;
            Ok(ViewState::EditConnector {
                connector_id: connector.id,
            })
        }
        VIEW_CONNECT => {
            let kind = required_kind(params, VIEW_CONNECT)?;
            if kind.traits().is_oauth() {
                return Err(DecodeError::NotAFormKind(kind));
            }
            Ok(ViewState::ConnectForm { kind })
        }
        VIEW_ACCOUNTS => Ok(ViewState::accounts(required_kind(params, VIEW_ACCOUNTS)?)),
        VIEW_MCP_LIST => Ok(ViewState::McpList),
        VIEW_YOUTUBE => Ok(ViewState::YouTube),
        VIEW_COMPOSIO => Ok(ViewState::ComposioToolkit),
        other => Err(DecodeError::UnknownView(other.to_string())),
    }
}

/// Resolves params, degrading to `Browse { tab: all }` when they cannot be
/// resolved. The discarded params are logged.
pub fn decode(params: &AddressParams, connectors: &[Connector]) -> ViewState {
    match try_decode(params, connectors) {
        Ok(view) => view,
        Err(e) => {
            warn!(
                error = %e,
                params = %params.to_query(),
                "Discarding unresolvable address params, falling back to browse"
            );
            ViewState::browse()
        }
    }
}

fn decode_authorization_return(
    params: &AddressParams,
    connectors: &[Connector],
) -> Result<ViewState, DecodeError> {
    if params.success.as_deref() != Some("true") || params.error.is_some() {
        debug!(error = ?params.error, "Authorization return without success");
        return Ok(ViewState::browse());
    }

    let kind = params.connector.as_deref().and_then(ConnectorKind::from_slug);

    let connector = match params.connector_id.as_deref() {
        Some(raw) => {
            let id = parse_id(raw)?;
            connectors
                .iter()
                .find(|c| c.id == id)
                .ok_or(DecodeError::UnknownConnector(id))?
        }
        None => {
            let kind = kind.ok_or(DecodeError::AuthorizedConnectorNotFound)?;
            connectors
                .iter()
                .filter(|c| c.connector_type == kind)
                .max_by_key(|c| c.id)
                .ok_or(DecodeError::AuthorizedConnectorNotFound)?
        }
    };

    IndexingConfigState::new(connector.connector_type, connector.id, &connector.name)
        .map(ViewState::IndexingConfig)
        .ok_or(DecodeError::MissingTitle(connector.id))
}

fn parse_id(raw: &str) -> Result<i64, DecodeError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| DecodeError::InvalidConnectorId(raw.to_string()))
}

fn find_connector<'a>(
    params: &AddressParams,
    connectors: &'a [Connector],
    view: &'static str,
) -> Result<&'a Connector, DecodeError> {
    let raw = params
        .connector_id
        .as_deref()
        .ok_or(DecodeError::MissingConnectorId(view))?;
    let id = parse_id(raw)?;
    connectors
        .iter()
        .find(|c| c.id == id)
        .ok_or(DecodeError::UnknownConnector(id))
}

fn optional_kind(params: &AddressParams) -> Result<Option<ConnectorKind>, DecodeError> {
    params
        .connector_type
        .as_deref()
        .map(|t| t.parse().map_err(|_| DecodeError::UnknownConnectorType(t.to_string())))
        .transpose()
}

fn required_kind(params: &AddressParams, view: &'static str) -> Result<ConnectorKind, DecodeError> {
    optional_kind(params)?.ok_or(DecodeError::MissingConnectorType(view))
}

/// How an address write interacts with history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavWrite {
    /// Create a new history entry.
    Push,
    /// Overwrite the current entry.
    Replace,
}

/// The application's navigable address, shared with the rest of the host.
pub trait AddressState: Send + Sync {
    fn current(&self) -> AddressParams;
    fn write(&self, params: AddressParams, mode: NavWrite);
}

#[derive(Debug)]
struct HistoryInner {
    entries: Vec<AddressParams>,
    index: usize,
}

/// In-memory history with browser-like push/replace/back/forward.
#[derive(Debug)]
pub struct MemoryHistory {
    inner: Mutex<HistoryInner>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::starting_at(AddressParams::default())
    }

    pub fn starting_at(params: AddressParams) -> Self {
        Self {
            inner: Mutex::new(HistoryInner {
                entries: vec![params],
                index: 0,
            }),
        }
    }

    /// Steps back one entry. Returns false at the start of history.
    pub fn back(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.index == 0 {
            return false;
        }
        inner.index -= 1;
        true
    }

    /// Steps forward one entry. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.index + 1 >= inner.entries.len() {
            return false;
        }
        inner.index += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressState for MemoryHistory {
    fn current(&self) -> AddressParams {
        let inner = self.inner.lock();
        inner.entries[inner.index].clone()
    }

    fn write(&self, params: AddressParams, mode: NavWrite) {
        let mut inner = self.inner.lock();
        match mode {
            NavWrite::Push => {
                let keep = inner.index + 1;
                inner.entries.truncate(keep);
                inner.entries.push(params);
                inner.index = keep;
            }
            NavWrite::Replace => {
                let index = inner.index;
                inner.entries[index] = params;
            }
        }
    }
}

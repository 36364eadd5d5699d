//! Dialog view state and the navigation stack behind "back".

use crate::kind::ConnectorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connector listing tab.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    All,
    Active,
}

impl Tab {
    pub fn as_str(self) -> &'static str {
        match self {
            Tab::All => "all",
            Tab::Active => "active",
        }
    }

    pub fn parse(s: &str) -> Option<Tab> {
        match s {
            "all" => Some(Tab::All),
            "active" => Some(Tab::Active),
            _ => None,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connector awaiting its first indexing run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexingConfigState {
    pub connector_type: ConnectorKind,
    pub connector_id: i64,
    pub connector_title: String,
}

impl IndexingConfigState {
    /// Returns `None` unless the id is positive and the title non-empty.
    pub fn new(connector_type: ConnectorKind, connector_id: i64, connector_title: &str) -> Option<Self> {
        let title = connector_title.trim();
        if connector_id <= 0 || title.is_empty() {
            return None;
        }
        Some(Self {
            connector_type,
            connector_id,
            connector_title: title.to_string(),
        })
    }
}

/// The single active view of the connector dialog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewState {
    #[default]
    Closed,
    Browse {
        tab: Tab,
    },
    Connecting {
        kind: ConnectorKind,
    },
    ConnectForm {
        kind: ConnectorKind,
    },
    IndexingConfig(IndexingConfigState),
    EditConnector {
        connector_id: i64,
    },
    AccountsList {
        kind: ConnectorKind,
        title: String,
    },
    McpList,
    YouTube,
    ComposioToolkit,
}

impl ViewState {
    pub fn browse() -> Self {
        ViewState::Browse { tab: Tab::All }
    }

    /// Accounts view titled after the connector kind.
    pub fn accounts(kind: ConnectorKind) -> Self {
        ViewState::AccountsList {
            kind,
            title: kind.title().to_string(),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, ViewState::Closed)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Closed => "closed",
            ViewState::Browse { .. } => "browse",
            ViewState::Connecting { .. } => "connecting",
            ViewState::ConnectForm { .. } => "connect_form",
            ViewState::IndexingConfig(_) => "indexing_config",
            ViewState::EditConnector { .. } => "edit_connector",
            ViewState::AccountsList { .. } => "accounts_list",
            ViewState::McpList => "mcp_list",
            ViewState::YouTube => "youtube",
            ViewState::ComposioToolkit => "composio_toolkit",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct NavEntry {
    view: ViewState,
    parent: Option<usize>,
}

/// Arena of visited views with parent links.
///
/// Entering a view appends an entry whose parent is the current one, so the
/// origin of a sub-view (e.g. an edit opened from an accounts list) is
/// recoverable when navigating back. Resetting clears the arena. Entries
/// past the current one are unreachable and dropped on enter and back, so
/// the arena only ever holds the path to the current view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavStack {
    entries: Vec<NavEntry>,
    cursor: Option<usize>,
}

impl NavStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current view; `Closed` when empty.
    pub fn current(&self) -> &ViewState {
        const CLOSED: &ViewState = &ViewState::Closed;
        self.cursor
            .and_then(|i| self.entries.get(i))
            .map(|e| &e.view)
            .unwrap_or(CLOSED)
    }

    /// View the current one was entered from.
    pub fn origin(&self) -> Option<&ViewState> {
        let parent = self.entries.get(self.cursor?)?.parent?;
        self.entries.get(parent).map(|e| &e.view)
    }

    /// Discards history and makes `view` the root.
    pub fn reset(&mut self, view: ViewState) {
        self.entries.clear();
        self.cursor = None;
        if view.is_open() {
            self.entries.push(NavEntry { view, parent: None });
            self.cursor = Some(0);
        }
    }

    /// Enters `view` as a child of the current view.
    pub fn enter(&mut self, view: ViewState) {
        if !view.is_open() {
            self.reset(view);
            return;
        }
        let parent = self.cursor;
        self.entries.truncate(parent.map_or(0, |i| i + 1));
        self.entries.push(NavEntry { view, parent });
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Replaces the current view in place, keeping its parent link.
    pub fn replace(&mut self, view: ViewState) {
        match self.cursor.and_then(|i| self.entries.get_mut(i)) {
            Some(entry) if view.is_open() => entry.view = view,
            _ => self.reset(view),
        }
    }

    /// Moves to the parent entry and returns its view, if there is one.
    pub fn back(&mut self) -> Option<&ViewState> {
        let parent = self.entries.get(self.cursor?)?.parent?;
        self.cursor = Some(parent);
        self.entries.truncate(parent + 1);
        self.entries.get(parent).map(|e| &e.view)
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut at = self.cursor;
        while let Some(i) = at {
            depth += 1;
            at = self.entries.get(i).and_then(|e| e.parent);
        }
        depth
    }
}

//! Connector records and the request payloads exchanged with the backend.

use crate::kind::ConnectorKind;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Wire format for dates exchanged with the repository.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A configured connector as reported by the reactive feed.
///
/// This subsystem never owns the authoritative copy; records are replaced
/// wholesale on every feed emission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: i64,
    pub connector_type: ConnectorKind,
    pub name: String,
    #[serde(default)]
    pub config: Map<String, Value>,
    pub is_indexable: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub periodic_indexing_enabled: bool,
    #[serde(default)]
    pub indexing_frequency_minutes: Option<u32>,
    #[serde(default)]
    pub last_indexed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_scheduled_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Connector {
    /// `periodic_indexing_enabled ⇒ frequency present ∧ indexable`.
    pub fn schedule_is_consistent(&self) -> bool {
        !self.periodic_indexing_enabled
            || (self.indexing_frequency_minutes.is_some() && self.is_indexable)
    }

    /// Folders selected for indexing (folder-selection kinds only).
    pub fn selected_folders(&self) -> Vec<Value> {
        array_field(&self.config, "selected_folders")
    }

    /// Individual files selected for indexing (folder-selection kinds only).
    pub fn selected_files(&self) -> Vec<Value> {
        array_field(&self.config, "selected_files")
    }

    pub fn selected_item_count(&self) -> usize {
        selection_count(&self.config)
    }

    /// Request body for indexing a folder-selection connector.
    pub fn selection_body(&self) -> Value {
        serde_json::json!({
            "folders": self.selected_folders(),
            "files": self.selected_files(),
        })
    }
}

/// Number of folders and files selected in a connector config.
pub fn selection_count(config: &Map<String, Value>) -> usize {
    array_field(config, "selected_folders").len() + array_field(config, "selected_files").len()
}

fn array_field(config: &Map<String, Value>, key: &str) -> Vec<Value> {
    config
        .get(key)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Payload for creating a connector.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewConnector {
    pub name: String,
    pub connector_type: ConnectorKind,
    pub config: Map<String, Value>,
    pub is_indexable: bool,
    pub periodic_indexing_enabled: bool,
    pub indexing_frequency_minutes: Option<u32>,
}

impl NewConnector {
    pub fn new(kind: ConnectorKind, name: impl Into<String>, config: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            connector_type: kind,
            config,
            is_indexable: kind.traits().indexable,
            periodic_indexing_enabled: false,
            indexing_frequency_minutes: None,
        }
    }
}

/// Partial update. `None` fields are omitted; `Some(None)` clears a field.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConnectorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periodic_indexing_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexing_frequency_minutes: Option<Option<u32>>,
}

impl ConnectorUpdate {
    pub fn periodic(settings: PeriodicSettings) -> Self {
        match settings {
            PeriodicSettings::Enabled(frequency) => Self {
                periodic_indexing_enabled: Some(true),
                indexing_frequency_minutes: Some(Some(frequency.minutes())),
                ..Self::default()
            },
            PeriodicSettings::Disabled => Self {
                periodic_indexing_enabled: Some(false),
                indexing_frequency_minutes: Some(None),
                ..Self::default()
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Options for an indexing-start call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexOptions {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub body: Option<Value>,
}

impl IndexOptions {
    pub fn start_date_param(&self) -> Option<String> {
        self.start_date.map(|d| d.format(DATE_FORMAT).to_string())
    }

    pub fn end_date_param(&self) -> Option<String> {
        self.end_date.map(|d| d.format(DATE_FORMAT).to_string())
    }
}

/// Optional indexing window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Parses `YYYY-MM-DD` strings; empty strings mean "unbounded".
    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            start: parse_date(start)?,
            end: parse_date(end)?,
        })
    }

    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if start > end)
    }
}

fn parse_date(s: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map(Some)
}

/// Allowed periodic-sync intervals, in minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexingFrequency {
    FiveMinutes,
    FifteenMinutes,
    Hourly,
    SixHours,
    TwelveHours,
    Daily,
    Weekly,
}

impl IndexingFrequency {
    pub const ALL: [IndexingFrequency; 7] = [
        IndexingFrequency::FiveMinutes,
        IndexingFrequency::FifteenMinutes,
        IndexingFrequency::Hourly,
        IndexingFrequency::SixHours,
        IndexingFrequency::TwelveHours,
        IndexingFrequency::Daily,
        IndexingFrequency::Weekly,
    ];

    pub const fn minutes(self) -> u32 {
        match self {
            IndexingFrequency::FiveMinutes => 5,
            IndexingFrequency::FifteenMinutes => 15,
            IndexingFrequency::Hourly => 60,
            IndexingFrequency::SixHours => 360,
            IndexingFrequency::TwelveHours => 720,
            IndexingFrequency::Daily => 1440,
            IndexingFrequency::Weekly => 10080,
        }
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.minutes() == minutes)
    }

    pub fn label(self) -> String {
        frequency_label(self.minutes())
    }
}

impl fmt::Display for IndexingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.minutes())
    }
}

impl FromStr for IndexingFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::from_minutes)
            .ok_or_else(|| s.to_string())
    }
}

/// Human label for a frequency in minutes; unknown values fall back to the
/// literal minute count.
pub fn frequency_label(minutes: u32) -> String {
    match minutes {
        15 => "Every 15 minutes".to_string(),
        60 => "Every hour".to_string(),
        360 => "Every 6 hours".to_string(),
        720 => "Every 12 hours".to_string(),
        1440 => "Daily".to_string(),
        10080 => "Weekly".to_string(),
        n => format!("Every {} minutes", n),
    }
}

/// Requested periodic-sync state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodicSettings {
    Enabled(IndexingFrequency),
    Disabled,
}

impl PeriodicSettings {
    /// Builds settings from raw form input (`enabled`, frequency string).
    pub fn from_form(enabled: bool, frequency: &str) -> Result<Self, String> {
        if !enabled {
            return Ok(PeriodicSettings::Disabled);
        }
        frequency.parse().map(PeriodicSettings::Enabled)
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, PeriodicSettings::Enabled(_))
    }
}

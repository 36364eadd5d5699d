//! Connector kinds and their per-kind capabilities.
//!
//! Every behavioral difference between connector kinds is declared once in
//! [`ConnectorKind::traits`]. Callers branch on the returned [`KindTraits`]
//! instead of comparing type names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of connector types known to the backend.
///
/// Serialized as the backend's SCREAMING_SNAKE_CASE type names
/// (e.g. `SLACK_CONNECTOR`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectorKind {
    SerperApi,
    TavilyApi,
    SearxngApi,
    LinkupApi,
    BaiduSearchApi,
    SlackConnector,
    TeamsConnector,
    NotionConnector,
    GithubConnector,
    LinearConnector,
    DiscordConnector,
    JiraConnector,
    ConfluenceConnector,
    ClickupConnector,
    GoogleCalendarConnector,
    GoogleGmailConnector,
    GoogleDriveConnector,
    AirtableConnector,
    LumaConnector,
    ElasticsearchConnector,
    WebcrawlerConnector,
    BookstackConnector,
    CirclebackConnector,
    ObsidianConnector,
    McpConnector,
    DropboxConnector,
    OnedriveConnector,
    ComposioGoogleDriveConnector,
    ComposioGmailConnector,
    ComposioGoogleCalendarConnector,
}

/// How a connector decides what to index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexingScope {
    /// Optional start/end date window.
    DateRange,
    /// Explicit folder/file selection stored in the connector config.
    FolderSelection,
    /// Everything is described by the static connector config.
    StaticConfig,
    /// Not indexable (live search providers, tool servers).
    None,
}

/// Endpoint used to obtain an authorization URL for an OAuth kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthRoute {
    /// Stable identifier carried in the `connector` address param.
    pub slug: &'static str,
    /// Backend path that returns `{ "auth_url": ... }`.
    pub path: &'static str,
    /// Composio toolkit id, sent as `toolkit_id` when present.
    pub toolkit: Option<&'static str>,
}

/// How a connector is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMethod {
    /// Credentials are entered in a per-kind connect form.
    Form,
    /// Redirect-based authorization with a third-party provider.
    OAuth(AuthRoute),
    /// Redirect-based authorization brokered by Composio.
    Composio(AuthRoute),
}

/// Capabilities of a connector kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindTraits {
    pub indexable: bool,
    pub scope: IndexingScope,
    pub supports_periodic_sync: bool,
    pub is_multi_account: bool,
    pub webhook_driven: bool,
    pub auth: AuthMethod,
}

impl KindTraits {
    pub fn uses_date_range(&self) -> bool {
        self.scope == IndexingScope::DateRange
    }

    pub fn uses_folder_selection(&self) -> bool {
        self.scope == IndexingScope::FolderSelection
    }

    /// Periodic sync is refused until at least one item is selected.
    pub fn requires_item_selection(&self) -> bool {
        self.uses_folder_selection()
    }

    pub fn is_oauth(&self) -> bool {
        !matches!(self.auth, AuthMethod::Form)
    }

    pub fn auth_route(&self) -> Option<AuthRoute> {
        match self.auth {
            AuthMethod::Form => None,
            AuthMethod::OAuth(route) | AuthMethod::Composio(route) => Some(route),
        }
    }
}

const fn form(scope: IndexingScope) -> KindTraits {
    let indexable = !matches!(scope, IndexingScope::None);
    KindTraits {
        indexable,
        scope,
        supports_periodic_sync: indexable,
        is_multi_account: false,
        webhook_driven: false,
        auth: AuthMethod::Form,
    }
}

const fn oauth(scope: IndexingScope, slug: &'static str, path: &'static str) -> KindTraits {
    KindTraits {
        indexable: true,
        scope,
        supports_periodic_sync: true,
        is_multi_account: false,
        webhook_driven: false,
        auth: AuthMethod::OAuth(AuthRoute {
            slug,
            path,
            toolkit: None,
        }),
    }
}

const fn composio(scope: IndexingScope, slug: &'static str, toolkit: &'static str) -> KindTraits {
    KindTraits {
        indexable: true,
        scope,
        supports_periodic_sync: true,
        is_multi_account: false,
        webhook_driven: false,
        auth: AuthMethod::Composio(AuthRoute {
            slug,
            path: "/api/v1/auth/composio/connector/add",
            toolkit: Some(toolkit),
        }),
    }
}

impl ConnectorKind {
    pub const ALL: [ConnectorKind; 30] = [
        ConnectorKind::SerperApi,
        ConnectorKind::TavilyApi,
        ConnectorKind::SearxngApi,
        ConnectorKind::LinkupApi,
        ConnectorKind::BaiduSearchApi,
        ConnectorKind::SlackConnector,
        ConnectorKind::TeamsConnector,
        ConnectorKind::NotionConnector,
        ConnectorKind::GithubConnector,
        ConnectorKind::LinearConnector,
        ConnectorKind::DiscordConnector,
        ConnectorKind::JiraConnector,
        ConnectorKind::ConfluenceConnector,
        ConnectorKind::ClickupConnector,
        ConnectorKind::GoogleCalendarConnector,
        ConnectorKind::GoogleGmailConnector,
        ConnectorKind::GoogleDriveConnector,
        ConnectorKind::AirtableConnector,
        ConnectorKind::LumaConnector,
        ConnectorKind::ElasticsearchConnector,
        ConnectorKind::WebcrawlerConnector,
        ConnectorKind::BookstackConnector,
        ConnectorKind::CirclebackConnector,
        ConnectorKind::ObsidianConnector,
        ConnectorKind::McpConnector,
        ConnectorKind::DropboxConnector,
        ConnectorKind::OnedriveConnector,
        ConnectorKind::ComposioGoogleDriveConnector,
        ConnectorKind::ComposioGmailConnector,
        ConnectorKind::ComposioGoogleCalendarConnector,
    ];

    /// Dispatch table: one entry per kind.
    pub const fn traits(self) -> KindTraits {
        use IndexingScope::{DateRange, FolderSelection, StaticConfig};
        match self {
            ConnectorKind::SerperApi
            | ConnectorKind::TavilyApi
            | ConnectorKind::SearxngApi
            | ConnectorKind::LinkupApi
            | ConnectorKind::BaiduSearchApi => form(IndexingScope::None),
            ConnectorKind::SlackConnector => oauth(
                DateRange,
                "slack-connector",
                "/api/v1/auth/slack/connector/add",
            ),
            ConnectorKind::TeamsConnector => oauth(
                DateRange,
                "teams-connector",
                "/api/v1/auth/teams/connector/add",
            ),
            ConnectorKind::NotionConnector => oauth(
                DateRange,
                "notion-connector",
                "/api/v1/auth/notion/connector/add",
            ),
            ConnectorKind::GithubConnector => form(StaticConfig),
            ConnectorKind::LinearConnector => oauth(
                DateRange,
                "linear-connector",
                "/api/v1/auth/linear/connector/add",
            ),
            ConnectorKind::DiscordConnector => oauth(
                DateRange,
                "discord-connector",
                "/api/v1/auth/discord/connector/add",
            ),
            ConnectorKind::JiraConnector => oauth(
                DateRange,
                "jira-connector",
                "/api/v1/auth/jira/connector/add",
            ),
            ConnectorKind::ConfluenceConnector => oauth(
                DateRange,
                "confluence-connector",
                "/api/v1/auth/confluence/connector/add",
            ),
            ConnectorKind::ClickupConnector => oauth(
                DateRange,
                "clickup-connector",
                "/api/v1/auth/clickup/connector/add",
            ),
            ConnectorKind::GoogleCalendarConnector => oauth(
                DateRange,
                "google-calendar-connector",
                "/api/v1/auth/google/calendar/connector/add",
            ),
            ConnectorKind::GoogleGmailConnector => oauth(
                DateRange,
                "google-gmail-connector",
                "/api/v1/auth/google/gmail/connector/add",
            ),
            ConnectorKind::GoogleDriveConnector => oauth(
                FolderSelection,
                "google-drive-connector",
                "/api/v1/auth/google/drive/connector/add",
            ),
            ConnectorKind::AirtableConnector => oauth(
                DateRange,
                "airtable-connector",
                "/api/v1/auth/airtable/connector/add",
            ),
            ConnectorKind::LumaConnector => form(DateRange),
            ConnectorKind::ElasticsearchConnector => form(StaticConfig),
            ConnectorKind::WebcrawlerConnector => form(StaticConfig),
            ConnectorKind::BookstackConnector => form(DateRange),
            ConnectorKind::CirclebackConnector => KindTraits {
                indexable: true,
                scope: StaticConfig,
                supports_periodic_sync: false,
                is_multi_account: false,
                webhook_driven: true,
                auth: AuthMethod::Form,
            },
            ConnectorKind::ObsidianConnector => form(StaticConfig),
            ConnectorKind::McpConnector => KindTraits {
                indexable: false,
                scope: IndexingScope::None,
                supports_periodic_sync: false,
                is_multi_account: true,
                webhook_driven: false,
                auth: AuthMethod::Form,
            },
            ConnectorKind::DropboxConnector => oauth(
                FolderSelection,
                "dropbox-connector",
                "/api/v1/auth/dropbox/connector/add",
            ),
            ConnectorKind::OnedriveConnector => oauth(
                FolderSelection,
                "onedrive-connector",
                "/api/v1/auth/onedrive/connector/add",
            ),
            ConnectorKind::ComposioGoogleDriveConnector => composio(
                FolderSelection,
                "composio-googledrive-connector",
                "googledrive",
            ),
            ConnectorKind::ComposioGmailConnector => {
                composio(DateRange, "composio-gmail-connector", "gmail")
            }
            ConnectorKind::ComposioGoogleCalendarConnector => composio(
                DateRange,
                "composio-googlecalendar-connector",
                "googlecalendar",
            ),
        }
    }

    /// Backend type name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ConnectorKind::SerperApi => "SERPER_API",
            ConnectorKind::TavilyApi => "TAVILY_API",
            ConnectorKind::SearxngApi => "SEARXNG_API",
            ConnectorKind::LinkupApi => "LINKUP_API",
            ConnectorKind::BaiduSearchApi => "BAIDU_SEARCH_API",
            ConnectorKind::SlackConnector => "SLACK_CONNECTOR",
            ConnectorKind::TeamsConnector => "TEAMS_CONNECTOR",
            ConnectorKind::NotionConnector => "NOTION_CONNECTOR",
            ConnectorKind::GithubConnector => "GITHUB_CONNECTOR",
            ConnectorKind::LinearConnector => "LINEAR_CONNECTOR",
            ConnectorKind::DiscordConnector => "DISCORD_CONNECTOR",
            ConnectorKind::JiraConnector => "JIRA_CONNECTOR",
            ConnectorKind::ConfluenceConnector => "CONFLUENCE_CONNECTOR",
            ConnectorKind::ClickupConnector => "CLICKUP_CONNECTOR",
            ConnectorKind::GoogleCalendarConnector => "GOOGLE_CALENDAR_CONNECTOR",
            ConnectorKind::GoogleGmailConnector => "GOOGLE_GMAIL_CONNECTOR",
            ConnectorKind::GoogleDriveConnector => "GOOGLE_DRIVE_CONNECTOR",
            ConnectorKind::AirtableConnector => "AIRTABLE_CONNECTOR",
            ConnectorKind::LumaConnector => "LUMA_CONNECTOR",
            ConnectorKind::ElasticsearchConnector => "ELASTICSEARCH_CONNECTOR",
            ConnectorKind::WebcrawlerConnector => "WEBCRAWLER_CONNECTOR",
            ConnectorKind::BookstackConnector => "BOOKSTACK_CONNECTOR",
            ConnectorKind::CirclebackConnector => "CIRCLEBACK_CONNECTOR",
            ConnectorKind::ObsidianConnector => "OBSIDIAN_CONNECTOR",
            ConnectorKind::McpConnector => "MCP_CONNECTOR",
            ConnectorKind::DropboxConnector => "DROPBOX_CONNECTOR",
            ConnectorKind::OnedriveConnector => "ONEDRIVE_CONNECTOR",
            ConnectorKind::ComposioGoogleDriveConnector => "COMPOSIO_GOOGLE_DRIVE_CONNECTOR",
            ConnectorKind::ComposioGmailConnector => "COMPOSIO_GMAIL_CONNECTOR",
            ConnectorKind::ComposioGoogleCalendarConnector => {
                "COMPOSIO_GOOGLE_CALENDAR_CONNECTOR"
            }
        }
    }

    /// Human-readable name, used as the title of per-kind views.
    pub const fn title(self) -> &'static str {
        match self {
            ConnectorKind::SerperApi => "Serper",
            ConnectorKind::TavilyApi => "Tavily",
            ConnectorKind::SearxngApi => "SearxNG",
            ConnectorKind::LinkupApi => "Linkup",
            ConnectorKind::BaiduSearchApi => "Baidu Search",
            ConnectorKind::SlackConnector => "Slack",
            ConnectorKind::TeamsConnector => "Microsoft Teams",
            ConnectorKind::NotionConnector => "Notion",
            ConnectorKind::GithubConnector => "GitHub",
            ConnectorKind::LinearConnector => "Linear",
            ConnectorKind::DiscordConnector => "Discord",
            ConnectorKind::JiraConnector => "Jira",
            ConnectorKind::ConfluenceConnector => "Confluence",
            ConnectorKind::ClickupConnector => "ClickUp",
            ConnectorKind::GoogleCalendarConnector => "Google Calendar",
            ConnectorKind::GoogleGmailConnector => "Gmail",
            ConnectorKind::GoogleDriveConnector => "Google Drive",
            ConnectorKind::AirtableConnector => "Airtable",
            ConnectorKind::LumaConnector => "Luma",
            ConnectorKind::ElasticsearchConnector => "Elasticsearch",
            ConnectorKind::WebcrawlerConnector => "Web Pages",
            ConnectorKind::BookstackConnector => "BookStack",
            ConnectorKind::CirclebackConnector => "Circleback",
            ConnectorKind::ObsidianConnector => "Obsidian",
            ConnectorKind::McpConnector => "MCP Server",
            ConnectorKind::DropboxConnector => "Dropbox",
            ConnectorKind::OnedriveConnector => "OneDrive",
            ConnectorKind::ComposioGoogleDriveConnector => "Google Drive (Composio)",
            ConnectorKind::ComposioGmailConnector => "Gmail (Composio)",
            ConnectorKind::ComposioGoogleCalendarConnector => "Google Calendar (Composio)",
        }
    }

    /// Looks up an OAuth kind by the slug carried in the `connector` param.
    pub fn from_slug(slug: &str) -> Option<ConnectorKind> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.traits().auth_route().is_some_and(|r| r.slug == slug))
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown connector type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown connector type '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for ConnectorKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

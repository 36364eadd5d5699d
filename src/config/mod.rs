use serde::Deserialize;

/// Complete connector-flow configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Search space the dialog operates in (the `contextId` of every call)
    #[serde(default = "default_search_space_id")]
    pub search_space_id: i64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_search_space_id() -> i64 {
    1
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_space_id: default_search_space_id(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Reactive feed settings
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// How often the connector list is re-fetched (seconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

fn default_poll_interval() -> u64 {
    5
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
        }
    }
}

/// Notification channel settings
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

fn default_event_capacity() -> usize {
    64
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

impl FlowConfig {
    /// Build from env vars, falling back to defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Overlays `CONNECTOR_FLOW_*` env vars. Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("CONNECTOR_FLOW_BACKEND_URL") {
            self.backend.base_url = v;
        }
        if let Some(n) = var("CONNECTOR_FLOW_SEARCH_SPACE_ID").and_then(|v| v.parse().ok()) {
            self.backend.search_space_id = n;
        }
        if let Some(n) = var("CONNECTOR_FLOW_REQUEST_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
            self.backend.request_timeout_seconds = n;
        }
        if let Some(n) = var("CONNECTOR_FLOW_POLL_INTERVAL_SECONDS").and_then(|v| v.parse().ok()) {
            self.feed.poll_interval_seconds = n;
        }
        if let Some(n) = var("CONNECTOR_FLOW_EVENT_CAPACITY").and_then(|v| v.parse().ok()) {
            self.events.capacity = n;
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> anyhow::Result<FlowConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: FlowConfig = toml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = FlowConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.search_space_id, 1);
        assert_eq!(config.backend.request_timeout_seconds, 30);
        assert_eq!(config.feed.poll_interval_seconds, 5);
        assert_eq!(config.events.capacity, 64);
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [backend]
            base_url = "https://api.example.com"
            search_space_id = 12
            request_timeout_seconds = 10

            [feed]
            poll_interval_seconds = 2

            [events]
            capacity = 16
        "#;

        let config: FlowConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.backend.base_url, "https://api.example.com");
        assert_eq!(config.backend.search_space_id, 12);
        assert_eq!(config.feed.poll_interval_seconds, 2);
        assert_eq!(config.events.capacity, 16);
    }

    #[test]
    fn test_partial_config() {
        // Missing sections use defaults
        let toml = r#"
            [feed]
            poll_interval_seconds = 30
        "#;

        let config: FlowConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.feed.poll_interval_seconds, 30);
        assert_eq!(config.backend.search_space_id, 1);
        assert_eq!(config.events.capacity, 64);
    }

    #[test]
    fn test_env_overlay() {
        let vars: HashMap<&str, &str> = [
            ("CONNECTOR_FLOW_BACKEND_URL", "http://backend:9000"),
            ("CONNECTOR_FLOW_SEARCH_SPACE_ID", "4"),
            ("CONNECTOR_FLOW_POLL_INTERVAL_SECONDS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = FlowConfig::default();
        config.apply_vars(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend.base_url, "http://backend:9000");
        assert_eq!(config.backend.search_space_id, 4);
        assert_eq!(config.feed.poll_interval_seconds, 5);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[backend]\nsearch_space_id = 9").unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.backend.search_space_id, 9);

        assert!(load_config("/nonexistent/connector-flow.toml").is_err());
    }
}

use anyhow::{bail, Context, Result};
use connector_backend::{FeedPoller, HttpAuthorizationEndpoint, HttpConnectorBackend};
use connector_flow::address::{self, AddressParams};
use connector_flow::config::{load_config, FlowConfig};
use connector_flow::{ConnectorKind, ConnectorRepository, IndexingTracker, OAuthInitiator, Redirector};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const USAGE: &str = "usage: connector-backend <resolve QUERY | authorize KIND | watch>";

/// Prints the authorization URL instead of opening a browser.
struct PrintRedirector;

impl Redirector for PrintRedirector {
    fn redirect(&self, url: &reqwest::Url) {
        println!("{}", url);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "connector_flow=info,connector_backend=info".into()),
        )
        .init();

    let config = match std::env::var("CONNECTOR_FLOW_CONFIG") {
        Ok(path) => {
            let mut config = load_config(&path)
                .with_context(|| format!("Failed to load config from {}", path))?;
            config.apply_env();
            config
        }
        Err(_) => FlowConfig::from_env(),
    };
    let token = std::env::var("CONNECTOR_FLOW_TOKEN").ok();

    info!(
        base_url = %config.backend.base_url,
        search_space_id = config.backend.search_space_id,
        "Configuration loaded"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["resolve", query] => resolve(&config, token, query).await,
        ["authorize", kind] => authorize(&config, token, kind).await,
        ["watch"] => watch(&config, token).await,
        _ => bail!(USAGE),
    }
}

fn repository(config: &FlowConfig, token: Option<String>) -> Result<Arc<ConnectorRepository>> {
    let timeout = Duration::from_secs(config.backend.request_timeout_seconds);
    let mut backend = HttpConnectorBackend::new(&config.backend.base_url, timeout)?;
    if let Some(token) = token {
        backend = backend.with_token(token);
    }
    Ok(Arc::new(ConnectorRepository::new(
        Arc::new(backend),
        config.backend.search_space_id,
    )))
}

/// Decodes address params against the live connector list.
async fn resolve(config: &FlowConfig, token: Option<String>, query: &str) -> Result<()> {
    let repository = repository(config, token)?;
    let connectors = repository
        .refresh()
        .await
        .context("Failed to load connectors")?;
    let params = AddressParams::from_query(query).context("Invalid query string")?;

    let view = match address::try_decode(&params, &connectors) {
        Ok(view) => view,
        Err(e) => {
            info!(error = %e, "Params do not resolve, showing fallback view");
            address::decode(&params, &connectors)
        }
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

/// Requests and validates an authorization URL for `kind`.
async fn authorize(config: &FlowConfig, token: Option<String>, kind: &str) -> Result<()> {
    let kind: ConnectorKind = kind.parse()?;
    let timeout = Duration::from_secs(config.backend.request_timeout_seconds);
    let mut endpoint = HttpAuthorizationEndpoint::new(&config.backend.base_url, timeout)?;
    if let Some(token) = token {
        endpoint = endpoint.with_token(token);
    }

    let initiator = OAuthInitiator::new(Arc::new(endpoint), Arc::new(PrintRedirector));
    initiator
        .initiate(kind, config.backend.search_space_id)
        .await?;
    Ok(())
}

/// Polls the feed and logs indexing reconciliation until interrupted.
async fn watch(config: &FlowConfig, token: Option<String>) -> Result<()> {
    let repository = repository(config, token)?;
    let tracker = Arc::new(IndexingTracker::new());

    let poller = FeedPoller::new(
        Arc::clone(&repository),
        Duration::from_secs(config.feed.poll_interval_seconds),
    )
    .start();

    let feed = repository.feed().subscribe();
    let reconciler = {
        let tracker = Arc::clone(&tracker);
        tokio::spawn(async move { tracker.run(feed).await })
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    poller.abort();
    reconciler.abort();
    info!(pending = ?tracker.pending(), "Watcher stopped");
    Ok(())
}

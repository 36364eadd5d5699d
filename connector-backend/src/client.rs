use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use connector_flow::{ConnectorBackend, ConnectorUpdate, IndexOptions, NewConnector};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const CONNECTORS_PATH: &str = "/api/v1/search-source-connectors";

/// HTTP client for the search-source connector API.
///
/// Authenticates with an optional Bearer token.
pub struct HttpConnectorBackend {
    base_url: String,
    token: Option<String>,
    http_client: Client,
}

impl HttpConnectorBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent("connector-backend/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            http_client,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{}{}", self.base_url, CONNECTORS_PATH, suffix)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_json(&self, request: reqwest::RequestBuilder, op: &str) -> Result<Value> {
        let response = self
            .authorize(request)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", op))?;

        check_response(response, op)
            .await?
            .json::<Value>()
            .await
            .with_context(|| format!("Failed to parse {} response", op))
    }
}

#[async_trait]
impl ConnectorBackend for HttpConnectorBackend {
    async fn create(&self, data: &NewConnector, search_space_id: i64) -> Result<Value> {
        debug!(kind = %data.connector_type, search_space_id, "Creating connector");
        let request = self
            .http_client
            .post(self.url(""))
            .query(&[("search_space_id", search_space_id)])
            .json(data);
        self.send_json(request, "create connector").await
    }

    async fn update(&self, connector_id: i64, update: &ConnectorUpdate) -> Result<Value> {
        debug!(connector_id, "Updating connector");
        let request = self
            .http_client
            .put(self.url(&format!("/{}", connector_id)))
            .json(update);
        self.send_json(request, "update connector").await
    }

    async fn delete(&self, connector_id: i64) -> Result<()> {
        debug!(connector_id, "Deleting connector");
        let response = self
            .authorize(self.http_client.delete(self.url(&format!("/{}", connector_id))))
            .send()
            .await
            .context("Failed to send delete connector request")?;
        check_response(response, "delete connector").await?;
        Ok(())
    }

    async fn list(&self, search_space_id: i64) -> Result<Value> {
        let request = self
            .http_client
            .get(self.url(""))
            .query(&[("search_space_id", search_space_id)]);
        self.send_json(request, "list connectors").await
    }

    async fn index(&self, connector_id: i64, search_space_id: i64, options: &IndexOptions) -> Result<Value> {
        let mut query = vec![("search_space_id", search_space_id.to_string())];
        if let Some(start) = options.start_date_param() {
            query.push(("start_date", start));
        }
        if let Some(end) = options.end_date_param() {
            query.push(("end_date", end));
        }

        debug!(connector_id, ?query, "Starting indexing");
        let mut request = self
            .http_client
            .post(self.url(&format!("/{}/index", connector_id)))
            .query(&query);
        if let Some(body) = &options.body {
            request = request.json(body);
        }
        self.send_json(request, "start indexing").await
    }
}

/// Maps non-2xx responses to errors carrying the status and the backend's
/// `detail` message when it sends one.
async fn check_response(response: reqwest::Response, op: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read body>".to_string());
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(anyhow!("{} not permitted ({}): {}", op, status, detail))
        }
        _ => Err(anyhow!("{} failed with status {}: {}", op, status, detail)),
    }
}

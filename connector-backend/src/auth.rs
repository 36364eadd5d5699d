use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use connector_flow::AuthorizationEndpoint;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Requests authorization URLs from the backend's `/auth/...` routes.
///
/// The body is returned as-is; the dialog validates the `auth_url` shape.
pub struct HttpAuthorizationEndpoint {
    base_url: String,
    token: Option<String>,
    http_client: Client,
}

impl HttpAuthorizationEndpoint {
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
}

#[async_trait]
impl AuthorizationEndpoint for HttpAuthorizationEndpoint {
    async fn request(&self, path: &str, search_space_id: i64, toolkit: Option<&str>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut query = vec![("space_id", search_space_id.to_string())];
        if let Some(toolkit) = toolkit {
            query.push(("toolkit_id", toolkit.to_string()));
        }

        debug!(url = %url, ?query, "Requesting authorization URL");
        let mut request = self.http_client.get(&url).query(&query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("Failed to send authorization request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(anyhow!("Authorization endpoint returned {}: {}", status, body));
        }

        response
            .json::<Value>()
            .await
            .context("Failed to parse authorization response")
    }
}

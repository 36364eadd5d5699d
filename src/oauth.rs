//! OAuth initiation and return handling.
//!
//! Implements the client side of the authorization code flow:
//! 1. User picks an OAuth connector in the dialog
//! 2. The authorization endpoint returns `{ "auth_url": ... }`
//! 3. The URL is shape-checked and the host performs a full redirect
//! 4. The provider sends the user back with `success`/`error` address params
//! 5. [`AuthorizationReturn::from_params`] interprets the return

use crate::address::AddressParams;
use crate::error::DialogError;
use crate::kind::ConnectorKind;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Endpoint that issues authorization URLs.
#[async_trait]
pub trait AuthorizationEndpoint: Send + Sync {
    /// `GET {path}?space_id=..` (plus `toolkit_id` for Composio routes).
    /// Returns the raw JSON body.
    async fn request(
        &self,
        path: &str,
        search_space_id: i64,
        toolkit: Option<&str>,
    ) -> anyhow::Result<Value>;
}

/// Performs the full-page handoff to the authorization provider.
pub trait Redirector: Send + Sync {
    fn redirect(&self, url: &Url);
}

/// Requests an authorization URL and redirects to it.
///
/// The triggering control is considered disabled from the moment
/// initiation starts. It stays disabled after a successful redirect (the
/// page is leaving) and is re-enabled on failure so the user may retry.
pub struct OAuthInitiator {
    endpoint: Arc<dyn AuthorizationEndpoint>,
    redirector: Arc<dyn Redirector>,
    initiating: AtomicBool,
}

impl OAuthInitiator {
    pub fn new(endpoint: Arc<dyn AuthorizationEndpoint>, redirector: Arc<dyn Redirector>) -> Self {
        Self {
            endpoint,
            redirector,
            initiating: AtomicBool::new(false),
        }
    }

    pub fn is_initiating(&self) -> bool {
        self.initiating.load(Ordering::SeqCst)
    }

    /// Re-enables the control without a redirect (view torn down).
    pub fn reset(&self) {
        self.initiating.store(false, Ordering::SeqCst);
    }

    /// Starts authorization for `kind`.
    ///
    /// Returns `Ok(false)` without any request when an initiation is already
    /// in flight, `Ok(true)` once the redirect has been issued.
    pub async fn initiate(&self, kind: ConnectorKind, search_space_id: i64) -> Result<bool, DialogError> {
        let Some(route) = kind.traits().auth_route() else {
            return Err(DialogError::AuthorizationInvalid {
                kind,
                detail: "connector kind has no authorization route".to_string(),
            });
        };

        if self
            .initiating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(kind = %kind, "Authorization already in flight, ignoring");
            return Ok(false);
        }

        let result = self
            .endpoint
            .request(route.path, search_space_id, route.toolkit)
            .await
            .map_err(|source| DialogError::AuthorizationUnreachable { kind, source })
            .and_then(|body| parse_auth_url(kind, &body));

        match result {
            Ok(url) => {
                info!(kind = %kind, host = ?url.host_str(), "Redirecting to authorization provider");
                self.redirector.redirect(&url);
                Ok(true)
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "Authorization initiation failed");
                self.reset();
                Err(e)
            }
        }
    }
}

/// Validates the `auth_url` field: an absolute http(s) URL with a host.
pub fn parse_auth_url(kind: ConnectorKind, body: &Value) -> Result<Url, DialogError> {
    let invalid = |detail: String| DialogError::AuthorizationInvalid { kind, detail };

    let raw = body
        .get("auth_url")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing auth_url".to_string()))?;
    let url = Url::parse(raw).map_err(|e| invalid(format!("malformed auth_url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid(format!("auth_url is not an http(s) URL: {}", raw)));
    }
    Ok(url)
}

/// Outcome carried back by the authorization provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizationReturn {
    Granted {
        kind: Option<ConnectorKind>,
        connector_id: Option<i64>,
    },
    Denied {
        code: String,
    },
}

impl AuthorizationReturn {
    /// `None` when the params carry no authorization result.
    pub fn from_params(params: &AddressParams) -> Option<Self> {
        if !params.has_authorization_result() {
            return None;
        }
        let kind = params.connector.as_deref().and_then(ConnectorKind::from_slug);

        if let Some(code) = &params.error {
            return Some(AuthorizationReturn::Denied { code: code.clone() });
        }
        if params.success.as_deref() == Some("true") {
            return Some(AuthorizationReturn::Granted {
                kind,
                connector_id: params.connector_id.as_deref().and_then(|s| s.parse().ok()),
            });
        }
        Some(AuthorizationReturn::Denied {
            code: "authorization_failed".to_string(),
        })
    }

    /// User-facing message for a denied return; underscores become spaces.
    pub fn message(&self) -> Option<String> {
        match self {
            AuthorizationReturn::Granted { .. } => None,
            AuthorizationReturn::Denied { code } => {
                Some(format!("Authorization failed: {}", code.replace('_', " ")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use anyhow::anyhow;
    use parking_lot::Mutex;
    use serde_json::json;

    struct StubEndpoint {
        response: Result<Value, String>,
        calls: Mutex<Vec<(String, i64, Option<String>)>>,
    }

    #[async_trait]
    impl AuthorizationEndpoint for StubEndpoint {
        async fn request(&self, path: &str, space: i64, toolkit: Option<&str>) -> anyhow::Result<Value> {
            self.calls
                .lock()
                .push((path.to_string(), space, toolkit.map(str::to_string)));
            self.response.clone().map_err(|e| anyhow!(e))
        }
    }

    #[derive(Default)]
    struct RecordingRedirector {
        urls: Mutex<Vec<String>>,
    }

    impl Redirector for RecordingRedirector {
        fn redirect(&self, url: &Url) {
            self.urls.lock().push(url.to_string());
        }
    }

    fn initiator(response: Result<Value, String>) -> (OAuthInitiator, Arc<StubEndpoint>, Arc<RecordingRedirector>) {
        let endpoint = Arc::new(StubEndpoint {
            response,
            calls: Mutex::new(Vec::new()),
        });
        let redirector = Arc::new(RecordingRedirector::default());
        let initiator = OAuthInitiator::new(endpoint.clone(), redirector.clone());
        (initiator, endpoint, redirector)
    }

    #[tokio::test]
    async fn test_successful_initiation_redirects_and_stays_disabled() {
        let (initiator, endpoint, redirector) =
            initiator(Ok(json!({"auth_url": "https://accounts.example.com/o/oauth2/auth?x=1"})));

        assert!(initiator
            .initiate(ConnectorKind::GoogleDriveConnector, 3)
            .await
            .unwrap());
        assert!(initiator.is_initiating());
        assert_eq!(redirector.urls.lock().len(), 1);
        assert_eq!(
            endpoint.calls.lock()[0],
            ("/api/v1/auth/google/drive/connector/add".to_string(), 3, None)
        );
    }

    #[tokio::test]
    async fn test_second_initiation_is_ignored_while_in_flight() {
        let (initiator, endpoint, _) =
            initiator(Ok(json!({"auth_url": "https://slack.com/oauth/v2/authorize"})));
        initiator.initiate(ConnectorKind::SlackConnector, 1).await.unwrap();

        assert!(!initiator.initiate(ConnectorKind::SlackConnector, 1).await.unwrap());
        assert_eq!(endpoint.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_re_enables() {
        let (initiator, _, redirector) = initiator(Err("connection reset".to_string()));
        let err = initiator
            .initiate(ConnectorKind::NotionConnector, 1)
            .await
            .unwrap_err();

        assert!(matches!(err, DialogError::AuthorizationUnreachable { .. }));
        assert_eq!(err.class(), ErrorClass::Transport);
        assert!(!initiator.is_initiating());
        assert!(redirector.urls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_auth_url_is_invalid_response() {
        let (initiator, _, redirector) = initiator(Ok(json!({"auth_url": "not a url"})));
        let err = initiator
            .initiate(ConnectorKind::NotionConnector, 1)
            .await
            .unwrap_err();

        assert!(matches!(err, DialogError::AuthorizationInvalid { .. }));
        assert_eq!(err.class(), ErrorClass::ResponseShape);
        assert!(!initiator.is_initiating());
        assert!(redirector.urls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_composio_route_sends_toolkit() {
        let (initiator, endpoint, _) =
            initiator(Ok(json!({"auth_url": "https://backend.composio.dev/connect"})));
        initiator
            .initiate(ConnectorKind::ComposioGmailConnector, 2)
            .await
            .unwrap();
        assert_eq!(endpoint.calls.lock()[0].2.as_deref(), Some("gmail"));
    }

    #[tokio::test]
    async fn test_form_kind_has_no_route() {
        let (initiator, endpoint, _) = initiator(Ok(json!({})));
        assert!(initiator.initiate(ConnectorKind::TavilyApi, 1).await.is_err());
        assert!(endpoint.calls.lock().is_empty());
        assert!(!initiator.is_initiating());
    }

    #[test]
    fn test_parse_auth_url_shapes() {
        let kind = ConnectorKind::SlackConnector;
        assert!(parse_auth_url(kind, &json!({"auth_url": "https://slack.com/x"})).is_ok());
        assert!(parse_auth_url(kind, &json!({})).is_err());
        assert!(parse_auth_url(kind, &json!({"auth_url": 42})).is_err());
        assert!(parse_auth_url(kind, &json!({"auth_url": "/relative/path"})).is_err());
        assert!(parse_auth_url(kind, &json!({"auth_url": "javascript:alert(1)"})).is_err());
    }

    #[test]
    fn test_authorization_return_parsing() {
        let granted = AddressParams {
            connector: Some("slack-connector".to_string()),
            connector_id: Some("7".to_string()),
            success: Some("true".to_string()),
            ..Default::default()
        };
        assert_eq!(
            AuthorizationReturn::from_params(&granted),
            Some(AuthorizationReturn::Granted {
                kind: Some(ConnectorKind::SlackConnector),
                connector_id: Some(7),
            })
        );

        let denied = AddressParams {
            error: Some("access_denied_by_user".to_string()),
            ..Default::default()
        };
        let ret = AuthorizationReturn::from_params(&denied).unwrap();
        assert_eq!(
            ret.message().as_deref(),
            Some("Authorization failed: access denied by user")
        );

        assert_eq!(AuthorizationReturn::from_params(&AddressParams::default()), None);
    }
}

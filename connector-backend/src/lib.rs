//! HTTP implementations of the collaborators consumed by `connector_flow`.
//!
//! ```text
//!   ConnectorDialog
//!        │
//!        ├── ConnectorRepository ──▶ HttpConnectorBackend ──▶ /api/v1/search-source-connectors
//!        │          ▲
//!        │          └── FeedPoller (interval refresh)
//!        │
//!        └── OAuthInitiator ───────▶ HttpAuthorizationEndpoint ──▶ /api/v1/auth/...
//! ```

pub mod auth;
pub mod client;
pub mod feed;

pub use auth::HttpAuthorizationEndpoint;
pub use client::HttpConnectorBackend;
pub use feed::{FeedPoller, PollStats};

//! Connector dialog orchestration.
//!
//! Drives the lifecycle of third-party data-source connectors inside a single
//! modal workflow: discovery, authorization, initial indexing configuration,
//! editing, periodic sync and disconnection.
//!
//! # Architecture
//!
//! ```text
//!   user actions          address changes (back/forward, reload, OAuth return)
//!        │                          │
//!        ▼                          ▼
//! ┌─────────────────────────────────────────┐
//! │          ConnectorDialog                 │
//! │  - ViewState + navigation stack          │
//! │  - validation, submission guard          │
//! └─────────────────────────────────────────┘
//!     │              │                  │
//!     ▼              ▼                  ▼
//!  address      repository          OAuth initiator
//!  serializer   (backend + feed)    (auth URL + redirect)
//!                    │
//!                    ▼
//!             IndexingTracker (reconciles against the feed)
//! ```
//!
//! The backend, the authorization endpoint, the redirect mechanism and the
//! navigable address are external collaborators, consumed through the traits
//! in [`repository`], [`oauth`] and [`address`].

// Connector kinds and their dispatch table
pub mod kind;

// Connector records and request payloads
pub mod connector;

// View state and navigation stack
pub mod view;

// Address params encode/decode and history
pub mod address;

// Repository adapter and reactive feed
pub mod repository;

// Optimistic indexing tracker
pub mod tracker;

// OAuth initiation and return handling
pub mod oauth;

// Submission guard and busy flags
pub mod guard;

// Pre-flight validation
pub mod validation;

// Notification channel
pub mod events;

pub mod config;
pub mod dialog;
pub mod error;

pub use address::{AddressParams, AddressState, MemoryHistory, NavWrite};
pub use connector::{Connector, ConnectorUpdate, DateRange, IndexOptions, IndexingFrequency, NewConnector};
pub use dialog::{ConnectFormSubmission, ConnectorDialog, EditSubmission, IndexingRequest, Outcome, PeriodicInput};
pub use error::{DialogError, ErrorClass, ValidationError};
pub use events::{DialogEvent, EventBus, Notice, NoticeLevel};
pub use kind::{AuthMethod, ConnectorKind, IndexingScope, KindTraits};
pub use oauth::{AuthorizationEndpoint, OAuthInitiator, Redirector};
pub use repository::{ConnectorBackend, ConnectorFeed, ConnectorRepository, Mutation, Refresh};
pub use tracker::IndexingTracker;
pub use view::{IndexingConfigState, NavStack, Tab, ViewState};

//! MealBridge core - session management and API client for the MealBridge
//! food redistribution platform.
//!
//! UI shells (GUI/TUI) build an [`ApiClient`] from a [`Config`] and consume
//! the platform through its endpoint methods or the generic
//! [`ApiClient::send`]. The client owns the session lifecycle: tokens are
//! persisted across restarts, expired access tokens are renewed behind a
//! single-flight coordinator, and a failed renewal ends the session with one
//! session-ended notification (subscribe via
//! [`ApiClient::subscribe_session_ended`]).

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{RefreshError, Session, SessionState};
pub use config::Config;

//! REST API client module for the MealBridge platform.
//!
//! This module provides the `ApiClient` request pipeline: every outbound
//! call gets the current access token attached, token expiry (401) is
//! detected and repaired through a single-flight session renewal, and the
//! request is resent at most once.
//!
//! The API uses JWT bearer token authentication (`POST token/` to obtain a
//! pair, `POST token/refresh/` to renew).

pub mod client;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use transport::{HttpTransport, Transport, TransportError, TransportRequest, TransportResponse};

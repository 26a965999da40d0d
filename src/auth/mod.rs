//! Session lifecycle management.
//!
//! This module provides:
//! - `TokenStore`: durable holder of the access/refresh token pair
//! - `RefreshCoordinator`: single-flight renewal against the auth endpoint
//! - `SessionTerminator`: token teardown plus the session-ended notification
//!
//! The token pair is persisted to disk and survives restarts until cleared.

pub mod refresh;
pub mod terminator;
pub mod token_store;

pub use refresh::{RefreshCoordinator, RefreshError};
pub use terminator::SessionTerminator;
pub use token_store::{Session, TokenStore};

/// Where the session currently stands. `Anonymous` is terminal until a new
/// login; a failed renewal lands back here via the terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
    Refreshing,
}

//! Single-flight session renewal.
//!
//! Any number of requests can hit token expiry at the same time; the
//! coordinator guarantees they collapse onto one `POST token/refresh/` call
//! and all observe its single outcome. The in-flight slot is filled
//! synchronously, before the first suspension point, so two callers can
//! never both conclude "no renewal running" and start one each - the race
//! that would burn a freshly rotated refresh token.
//!
//! The renewal itself runs on a spawned task: a caller that abandons its
//! request while waiting simply drops its handle to the shared future, and
//! the remaining waiters still get the outcome.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::transport::{Transport, TransportRequest};

use super::terminator::SessionTerminator;
use super::token_store::TokenStore;

/// Renewal endpoint, relative to the API base URL.
pub(crate) const REFRESH_PATH: &str = "token/refresh/";

/// Why a renewal failed. Terminal for the session in every case: the
/// coordinator fires the session terminator before waiters see the error.
/// Clone because one outcome is broadcast to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("no refresh token available")]
    MissingRefreshToken,

    #[error("refresh token rejected by server (status {0})")]
    Rejected(u16),

    #[error("network error during session renewal: {0}")]
    Network(String),

    #[error("invalid renewal response: {0}")]
    InvalidResponse(String),

    #[error("failed to persist renewed session: {0}")]
    Storage(String),
}

#[derive(Deserialize)]
struct RenewalResponse {
    access: String,
    /// Present only when the server rotates the refresh token.
    #[serde(default)]
    refresh: Option<String>,
}

type SharedRenewal = Shared<BoxFuture<'static, Result<(), RefreshError>>>;

pub struct RefreshCoordinator<T: Transport> {
    inner: Arc<Inner<T>>,
}

struct Inner<T: Transport> {
    transport: Arc<T>,
    tokens: Arc<TokenStore>,
    terminator: Arc<SessionTerminator>,
    refresh_url: String,
    in_flight: Mutex<Option<SharedRenewal>>,
}

impl<T: Transport> RefreshCoordinator<T> {
    pub fn new(
        transport: Arc<T>,
        tokens: Arc<TokenStore>,
        terminator: Arc<SessionTerminator>,
        base_url: &str,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                tokens,
                terminator,
                refresh_url: format!("{base_url}{REFRESH_PATH}"),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Renew the session, or join the renewal already underway. The returned
    /// future settles with the shared outcome.
    pub fn refresh(&self) -> impl Future<Output = Result<(), RefreshError>> + Send {
        let mut slot = lock(&self.inner.in_flight);

        if let Some(existing) = slot.as_ref() {
            debug!("Joining in-flight session renewal");
            return existing.clone();
        }

        debug!("Starting session renewal");
        let inner = Arc::clone(&self.inner);
        let shared: SharedRenewal = async move { inner.run().await }.boxed().shared();

        // The slot is filled before the renewal future is ever polled, so no
        // other caller can observe "nothing in flight" and start a second
        // one.
        *slot = Some(shared.clone());

        // Detached driver: an abandoned caller cannot stall the renewal for
        // the remaining waiters.
        tokio::spawn(shared.clone());

        shared
    }

    /// True while a renewal is outstanding.
    pub fn is_in_flight(&self) -> bool {
        lock(&self.inner.in_flight).is_some()
    }
}

impl<T: Transport> Inner<T> {
    async fn run(self: Arc<Self>) -> Result<(), RefreshError> {
        let result = self.renew().await;

        match &result {
            Ok(()) => debug!("Session renewal succeeded"),
            Err(e) => {
                warn!(error = %e, "Session renewal failed, terminating session");
                // Exactly once, from the owning task - waiters never
                // re-trigger termination.
                self.terminator.terminate().await;
            }
        }

        // Clear the slot before waiters observe the outcome so a later
        // expiry starts a fresh renewal.
        *lock(&self.in_flight) = None;

        result
    }

    async fn renew(&self) -> Result<(), RefreshError> {
        let refresh_token = self
            .tokens
            .get()
            .await
            .refresh_token
            .ok_or(RefreshError::MissingRefreshToken)?;

        let request = TransportRequest {
            method: Method::POST,
            url: self.refresh_url.clone(),
            headers: HeaderMap::new(),
            body: Some(serde_json::json!({ "refresh": refresh_token })),
        };

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        if !response.is_success() {
            return Err(RefreshError::Rejected(response.status.as_u16()));
        }

        let renewed: RenewalResponse = serde_json::from_str(&response.body)
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        // New tokens land in the store before any waiter wakes up to retry.
        self.tokens
            .update(renewed.access, renewed.refresh)
            .await
            .map_err(|e| RefreshError::Storage(e.to_string()))?;

        Ok(())
    }
}

fn lock<V>(mutex: &Mutex<V>) -> std::sync::MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

//! API client for communicating with the MealBridge REST API.
//!
//! `ApiClient` is the request pipeline every outbound call goes through: it
//! attaches the current access token, forwards to the transport, and on a
//! 401 renews the session through the single-flight coordinator and resends
//! the request exactly once. The typed endpoint methods underneath are thin
//! wrappers over `send`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::auth::{RefreshCoordinator, SessionState, SessionTerminator, TokenStore};
use crate::config::Config;
use crate::models::{
    ClaimedDonation, DemandDataPoint, DonationMatch, DonationPatch, Feedback, FoodCategory,
    FoodDonation, FoodRequest, ForecastPoint, NewDonation, NewFeedback, NewRequest, ProfileUpdate,
    Registration, UserProfile,
};

use super::error::ApiError;
use super::transport::{HttpTransport, Transport, TransportRequest, TransportResponse};

// ============================================================================
// Constants
// ============================================================================

/// Login endpoint, relative to the API base URL.
const LOGIN_PATH: &str = "token/";

/// Maximum number of retries for rate-limited (429) requests.
/// 3 retries with exponential backoff usually succeeds without excessive delay.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
/// 1 second is polite to the server while not making users wait too long.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Deserialize)]
struct TokenPair {
    access: String,
    refresh: String,
}

pub struct ApiClient<T: Transport = HttpTransport> {
    transport: Arc<T>,
    tokens: Arc<TokenStore>,
    terminator: Arc<SessionTerminator>,
    refresh: RefreshCoordinator<T>,
    base_url: String,
}

impl ApiClient<HttpTransport> {
    /// Create a client against the configured API, loading any persisted
    /// session from disk.
    pub fn new(config: &Config) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new()?);
        let tokens = Arc::new(TokenStore::load_or_empty(config.data_dir()?)?);
        Ok(Self::from_parts(transport, tokens, config.api_base_url.clone()))
    }
}

impl<T: Transport> ApiClient<T> {
    /// Assemble a client from its collaborators. The terminator starts armed
    /// when a persisted session was loaded.
    pub fn from_parts(transport: Arc<T>, tokens: Arc<TokenStore>, base_url: String) -> Self {
        let armed = tokens.current().is_authenticated();
        let terminator = Arc::new(SessionTerminator::new(Arc::clone(&tokens), armed));
        let refresh = RefreshCoordinator::new(
            Arc::clone(&transport),
            Arc::clone(&tokens),
            Arc::clone(&terminator),
            &base_url,
        );
        Self {
            transport,
            tokens,
            terminator,
            refresh,
            base_url,
        }
    }

    // ===== Session lifecycle =====

    /// Exchange credentials for a token pair and start a session. Goes
    /// straight to the transport: no bearer header, no 401 retry.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let request = TransportRequest {
            method: Method::POST,
            url: format!("{}{}", self.base_url, LOGIN_PATH),
            headers: HeaderMap::new(),
            body: Some(serde_json::json!({
                "username": username,
                "password": password,
            })),
        };

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }

        let pair: TokenPair = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {e}")))?;

        self.tokens
            .set(pair.access, pair.refresh)
            .await
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        self.terminator.arm();

        info!(username, "Logged in");
        Ok(())
    }

    /// End the session locally: clear tokens and notify subscribers.
    pub async fn logout(&self) {
        self.terminator.terminate().await;
    }

    /// Session-ended notifications for the UI shell.
    pub fn subscribe_session_ended(&self) -> broadcast::Receiver<()> {
        self.terminator.subscribe()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.get().await.is_authenticated()
    }

    pub async fn session_state(&self) -> SessionState {
        if self.refresh.is_in_flight() {
            SessionState::Refreshing
        } else if self.tokens.get().await.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    // ===== Request pipeline =====

    /// Send an authenticated request. On a 401 the session is renewed
    /// (single-flight across concurrent callers) and the request is resent
    /// once with the fresh token; a second 401 fails the request for good.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        headers: Option<HeaderMap>,
    ) -> Result<TransportResponse, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut retried = false;
        let mut rate_limit_retries = 0u32;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request_headers = headers.clone().unwrap_or_default();
            if let Some(access) = self.tokens.get().await.access_token {
                let value = HeaderValue::from_str(&format!("Bearer {access}"))
                    .map_err(|e| ApiError::InvalidCredential(e.to_string()))?;
                request_headers.insert(AUTHORIZATION, value);
            }

            let response = self
                .transport
                .execute(TransportRequest {
                    method: method.clone(),
                    url: url.clone(),
                    headers: request_headers,
                    body: body.clone(),
                })
                .await
                .map_err(|e| ApiError::Network(e.to_string()))?;

            match response.status.as_u16() {
                401 => {
                    if retried {
                        debug!(path, "Still unauthorized after renewal, giving up");
                        return Err(ApiError::StillUnauthorized);
                    }
                    debug!(path, "Access token rejected, renewing session");
                    if self.refresh.refresh().await.is_err() {
                        // The renewal failure is reported once through the
                        // terminator; this caller just sees the rejection.
                        return Err(ApiError::Unauthorized);
                    }
                    retried = true;
                }
                429 => {
                    rate_limit_retries += 1;
                    if rate_limit_retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(path, retry = rate_limit_retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
                _ if response.is_success() => return Ok(response),
                _ => return Err(ApiError::from_status(response.status, &response.body)),
            }
        }
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<R, ApiError> {
        let response = self.send(method, path, body, None).await?;
        serde_json::from_str(&response.body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {path}: {e}"))
        })
    }

    fn to_body<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
        serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to serialize request body: {e}")))
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<R: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        self.request(Method::POST, path, Some(Self::to_body(body)?)).await
    }

    pub async fn put<R: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        self.request(Method::PUT, path, Some(Self::to_body(body)?)).await
    }

    pub async fn patch<R: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        self.request(Method::PATCH, path, Some(Self::to_body(body)?)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, path, None, None).await?;
        Ok(())
    }

    // ===== Account =====

    pub async fn register(&self, registration: &Registration) -> Result<UserProfile, ApiError> {
        self.post("register/", registration).await
    }

    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.get("user/").await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        self.put("user/", update).await
    }

    // ===== Donations =====

    pub async fn categories(&self) -> Result<Vec<FoodCategory>, ApiError> {
        self.get("categories/").await
    }

    /// Donations owned by the current user.
    pub async fn donations(&self) -> Result<Vec<FoodDonation>, ApiError> {
        self.get("donations/").await
    }

    /// Unclaimed donations visible to requesters.
    pub async fn available_donations(&self) -> Result<Vec<FoodDonation>, ApiError> {
        self.get("donations/available/").await
    }

    pub async fn create_donation(&self, donation: &NewDonation) -> Result<FoodDonation, ApiError> {
        self.post("donations/", donation).await
    }

    pub async fn update_donation(
        &self,
        donation_id: i64,
        patch: &DonationPatch,
    ) -> Result<FoodDonation, ApiError> {
        self.patch(&format!("donations/{donation_id}/"), patch).await
    }

    pub async fn delete_donation(&self, donation_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("donations/{donation_id}/")).await
    }

    pub async fn claim_donation(&self, donation_id: i64) -> Result<ClaimedDonation, ApiError> {
        self.request(Method::POST, &format!("donations/{donation_id}/claim/"), None)
            .await
    }

    pub async fn claims(&self) -> Result<Vec<ClaimedDonation>, ApiError> {
        self.get("claims/").await
    }

    // ===== Requests =====

    pub async fn requests(&self) -> Result<Vec<FoodRequest>, ApiError> {
        self.get("requests/").await
    }

    pub async fn create_request(&self, request: &NewRequest) -> Result<FoodRequest, ApiError> {
        self.post("requests/", request).await
    }

    /// Top scored donation matches for a pending request.
    pub async fn request_matches(&self, request_id: i64) -> Result<Vec<DonationMatch>, ApiError> {
        self.get(&format!("requests/{request_id}/matches/")).await
    }

    pub async fn submit_feedback(&self, feedback: &NewFeedback) -> Result<Feedback, ApiError> {
        self.post("feedback/", feedback).await
    }

    // ===== Demand forecasting =====

    pub async fn demand_forecast(&self) -> Result<Vec<ForecastPoint>, ApiError> {
        self.get("demand/forecast/").await
    }

    pub async fn submit_demand(&self, point: &DemandDataPoint) -> Result<DemandDataPoint, ApiError> {
        self.post("demand/submit/", point).await
    }
}

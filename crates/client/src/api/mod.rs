//! Request Gateway - the single chokepoint for all outbound API calls.
//!
//! Every request flows through [`ApiClient`]. The gateway reads the current
//! access token from the durable token store immediately before dispatch and
//! attaches it as a bearer credential; callers never set `Authorization`
//! themselves.
//!
//! # Authorization-failure recovery
//!
//! A response reporting an authorization failure triggers exactly one
//! refresh-and-retry cycle per logical request:
//!
//! 1. Read the refresh token from the store. If absent, the session is over.
//! 2. Exchange it at `/auth/refresh-token`. The exchange bypasses the normal
//!    interceptor path so a rejected refresh can never recurse.
//! 3. On success, persist the new pair and replay the original request once.
//! 4. On refresh failure, or on a second authorization failure from the
//!    replayed request, clear both tokens, drop the current user from the
//!    session, and surface the failure to the caller.
//!
//! The retry position is carried as an explicit [`Attempt`] value alongside
//! the request rather than a flag mutated on shared request state.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::SessionCell;
use crate::store::{TokenPair, TokenStore};

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Pantry ordering API.
///
/// Cheaply cloneable; all clones share the same HTTP connection pool and
/// token store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    session: SessionCell,
}

/// Which dispatch of a logical request this is.
///
/// A request is replayed at most once; `Replay` never triggers another
/// refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Initial,
    Replay,
}

/// An outbound request descriptor.
///
/// Immutable once built, so it can be dispatched again verbatim after a
/// token refresh.
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            body: None,
        }
    }

    fn with_body(method: Method, path: &str, body: &impl Serialize) -> Result<Self, ApiError> {
        Ok(Self {
            method,
            path: path.to_string(),
            body: Some(serde_json::to_value(body)?),
        })
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn TokenStore>,
        session: SessionCell,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
                store,
                session,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    // =========================================================================
    // Core send path (token attachment + refresh protocol)
    // =========================================================================

    /// Dispatch a request once, attaching the current access token if one is
    /// stored. The store is re-read on every dispatch so a logout or refresh
    /// from another code path is picked up immediately.
    async fn dispatch(
        &self,
        req: &ApiRequest,
        attempt: Attempt,
    ) -> Result<reqwest::Response, ApiError> {
        let mut builder = self
            .inner
            .http
            .request(req.method.clone(), self.url(&req.path));

        if let Some(pair) = self.inner.store.load()? {
            builder = builder.bearer_auth(&pair.access_token);
        }

        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        debug!(method = %req.method, path = %req.path, ?attempt, "dispatching request");
        Ok(builder.send().await?)
    }

    /// Send an authenticated request, recovering from at most one
    /// authorization failure via the refresh protocol.
    pub(crate) async fn send(&self, req: ApiRequest) -> Result<reqwest::Response, ApiError> {
        let resp = self.dispatch(&req, Attempt::Initial).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Self::check_status(resp).await;
        }

        if let Err(err) = self.refresh_tokens().await {
            self.expire_session();
            return Err(err);
        }

        let resp = self.dispatch(&req, Attempt::Replay).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            // Already replayed once; a second authorization failure must not
            // re-enter the refresh cycle.
            self.expire_session();
            return Err(ApiError::Unauthorized);
        }
        Self::check_status(resp).await
    }

    /// Exchange the stored refresh token for a new pair and persist it.
    ///
    /// Bypasses [`Self::send`] entirely: no bearer attachment, no retry.
    async fn refresh_tokens(&self) -> Result<(), ApiError> {
        let Some(pair) = self.inner.store.load()? else {
            return Err(ApiError::Unauthorized);
        };

        debug!("access token rejected; attempting refresh");
        let resp = self
            .inner
            .http
            .post(self.url("/auth/refresh-token"))
            .json(&serde_json::json!({ "refresh_token": pair.refresh_token }))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized);
        }
        let resp = Self::check_status(resp).await?;

        let fresh: TokenPair = Self::decode(resp).await?;
        self.inner.store.save(&fresh)?;
        debug!("token refresh succeeded");
        Ok(())
    }

    /// Terminal authorization failure: clear both tokens and drop the
    /// current user so the application returns to the sign-in entry point.
    fn expire_session(&self) {
        warn!("session expired; clearing tokens and signing out");
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "failed to clear token store");
        }
        self.inner.session.clear_user();
    }

    // =========================================================================
    // Response handling
    // =========================================================================

    /// Map non-success statuses into the error taxonomy, surfacing the
    /// server's `message` field when the error body carries one.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        #[derive(serde::Deserialize)]
        struct ErrorBody {
            message: String,
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text).map_or_else(
            |_| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            },
            |body| body.message,
        );

        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Decode a success response body.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let text = resp.text().await?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %text.chars().take(500).collect::<String>(),
                    "failed to parse API response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    // =========================================================================
    // Typed entry points used by the endpoint modules
    // =========================================================================

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.send(ApiRequest::new(Method::GET, path)).await?;
        Self::decode(resp).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let req = ApiRequest::with_body(Method::POST, path, body)?;
        let resp = self.send(req).await?;
        Self::decode(resp).await
    }

    pub(crate) async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let req = ApiRequest::with_body(Method::PUT, path, body)?;
        let resp = self.send(req).await?;
        Self::decode(resp).await
    }

    /// POST where the response body is deliberately discarded (the caller
    /// refetches authoritative state instead of trusting a partial view).
    pub(crate) async fn post_discard(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<(), ApiError> {
        let req = ApiRequest::with_body(Method::POST, path, body)?;
        self.send(req).await?;
        Ok(())
    }

    /// PUT counterpart of [`Self::post_discard`].
    pub(crate) async fn put_discard(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<(), ApiError> {
        let req = ApiRequest::with_body(Method::PUT, path, body)?;
        self.send(req).await?;
        Ok(())
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::new(Method::DELETE, path)).await?;
        Ok(())
    }

    // =========================================================================
    // Unauthenticated entry points (sign-in / sign-up / refresh)
    // =========================================================================

    /// POST a JSON body without bearer attachment or retry.
    pub(crate) async fn post_json_unauthenticated<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let resp = self
            .inner
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        Self::decode(resp).await
    }

    /// POST a form-encoded body without bearer attachment or retry.
    pub(crate) async fn post_form_unauthenticated<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let resp = self
            .inner
            .http
            .post(self.url(path))
            .form(params)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        Self::decode(resp).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryTokenStore;

    fn test_client() -> ApiClient {
        let config = ClientConfig::new("http://localhost:8000/api/v1").unwrap();
        ApiClient::new(
            &config,
            Arc::new(MemoryTokenStore::new()),
            SessionCell::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let client = test_client();
        assert_eq!(client.url("/cart"), "http://localhost:8000/api/v1/cart");
        assert_eq!(
            client.url("/cart/items/3"),
            "http://localhost:8000/api/v1/cart/items/3"
        );
    }

    #[test]
    fn test_request_body_is_reusable_between_attempts() {
        let req = ApiRequest::with_body(
            Method::POST,
            "/cart/items",
            &serde_json::json!({ "product_id": 7, "quantity": 1 }),
        )
        .unwrap();

        // The descriptor is immutable; both dispatches see the same payload.
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path, "/cart/items");
        assert_eq!(
            req.body,
            Some(serde_json::json!({ "product_id": 7, "quantity": 1 }))
        );
    }
}

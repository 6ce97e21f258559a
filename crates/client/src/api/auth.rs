//! Authentication endpoints.
//!
//! Credential exchange is performed here, on behalf of the Session Manager:
//! sign-in and sign-up never attach a bearer token and never enter the
//! refresh-retry path. Identity resolution (`/auth/me`) is an ordinary
//! authenticated request and benefits from transparent refresh.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use super::ApiClient;
use crate::error::ApiError;
use crate::store::TokenPair;
use crate::types::UserProfile;

/// Acknowledgement body returned by message-only auth endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthMessage {
    /// Human-readable outcome (e.g., "verification code sent").
    pub message: String,
}

impl ApiClient {
    /// Create an account.
    ///
    /// The account starts unverified; the backend sends a one-time code to
    /// the given email, to be confirmed via [`Self::verify_otp`].
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered or the request
    /// fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        password: &SecretString,
    ) -> Result<AuthMessage, ApiError> {
        let body = serde_json::json!({
            "name": name,
            "email": email,
            "phone": phone,
            "password": password.expose_secret(),
        });
        self.post_json_unauthenticated("/auth/signup", &body).await
    }

    /// Exchange credentials for an access/refresh token pair.
    ///
    /// Credentials are sent form-encoded. The returned pair is NOT persisted
    /// here; pass it to the Session Manager's `login`.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<TokenPair, ApiError> {
        self.post_form_unauthenticated(
            "/auth/signin",
            &[("username", email), ("password", password.expose_secret())],
        )
        .await
    }

    /// Confirm a one-time verification code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is wrong or expired.
    #[instrument(skip(self, code), fields(email = %email))]
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<AuthMessage, ApiError> {
        let body = serde_json::json!({ "email": email, "otp": code });
        self.post_json_unauthenticated("/auth/verify-otp", &body)
            .await
    }

    /// Request a fresh one-time verification code.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is unknown or the request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn resend_otp(&self, email: &str) -> Result<AuthMessage, ApiError> {
        let body = serde_json::json!({ "email": email });
        self.post_json_unauthenticated("/auth/resend-otp", &body)
            .await
    }

    /// Resolve the identity behind the current access token.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid session exists or the request fails.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.get_json("/auth/me").await
    }
}

//! Storefront facade - the composition root.
//!
//! Wires one Request Gateway, one Session Manager, and one Cart Manager
//! around a shared session cell and token store. All state is
//! constructor-injected, so tests can stand up as many isolated storefronts
//! as they need.
//!
//! The facade also owns the session-to-cart reactive link: signing in
//! refreshes the cart once the identity resolves, and signing out drops the
//! local mirror before the session is cleared.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::instrument;

use crate::api::ApiClient;
use crate::api::auth::AuthMessage;
use crate::cart::CartManager;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::{SessionCell, SessionManager};
use crate::store::TokenStore;
use crate::types::UserProfile;

/// A fully wired storefront client.
#[derive(Clone)]
pub struct Storefront {
    api: ApiClient,
    session: SessionManager,
    cart: CartManager,
}

impl Storefront {
    /// Wire a storefront over the given configuration and token store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let cell = SessionCell::new();
        let api = ApiClient::new(config, Arc::clone(&store), cell.clone())?;
        let session = SessionManager::new(api.clone(), store, cell.clone());
        let cart = CartManager::new(api.clone(), cell);

        Ok(Self { api, session, cart })
    }

    /// Restore a persisted session (once per process) and bring the cart
    /// mirror in step with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the post-bootstrap cart fetch fails. Session
    /// restoration itself never errors: unresolvable tokens are discarded.
    pub async fn bootstrap(&self) -> Result<(), ApiError> {
        self.session.bootstrap().await;
        self.cart.refresh().await
    }

    /// Create an account. The account must be verified via
    /// [`Self::verify_otp`] before it can sign in.
    ///
    /// # Errors
    ///
    /// Returns an error if the signup is rejected or the request fails.
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        password: &SecretString,
    ) -> Result<AuthMessage, ApiError> {
        self.api.sign_up(name, email, phone, password).await
    }

    /// Confirm a one-time verification code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is wrong or expired.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<AuthMessage, ApiError> {
        self.api.verify_otp(email, code).await
    }

    /// Request a fresh one-time verification code.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is unknown or the request fails.
    pub async fn resend_otp(&self, email: &str) -> Result<AuthMessage, ApiError> {
        self.api.resend_otp(email).await
    }

    /// Sign in: exchange credentials for tokens, resolve the identity, then
    /// refresh the cart for the new user.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected, identity resolution
    /// fails, or the cart fetch fails. On credential rejection no session
    /// state changes.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserProfile, ApiError> {
        let tokens = self.api.sign_in(email, password).await?;
        let profile = self.session.login(tokens).await?;
        self.cart.refresh().await?;
        Ok(profile)
    }

    /// Sign out: drop the local cart mirror first, then clear tokens and the
    /// current user. Entirely local - no network calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be cleared.
    pub fn sign_out(&self) -> Result<(), ApiError> {
        self.cart.reset();
        self.session.logout()?;
        Ok(())
    }

    /// The Request Gateway (catalog, orders, and admin calls live here).
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The Session Manager.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// The Cart Manager.
    #[must_use]
    pub fn cart(&self) -> &CartManager {
        &self.cart
    }
}

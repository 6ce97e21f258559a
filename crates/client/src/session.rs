//! Session Manager - authentication lifecycle and current-user resolution.
//!
//! The manager owns the session state exclusively; every other component
//! reads it through [`SessionCell`] handles or `watch` subscriptions. Tokens
//! themselves live only in the durable token store, which is re-read on
//! every use (a logout from one code path is immediately visible to the next
//! outgoing request).

use std::sync::Arc;

use tokio::sync::{OnceCell, watch};
use tracing::{debug, instrument, warn};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::store::{StoreError, TokenPair, TokenStore};
use crate::types::UserProfile;

// =============================================================================
// Session state
// =============================================================================

/// Observable session state.
///
/// `current_user` is present iff the last resolution of the stored access
/// token against `/auth/me` succeeded. An absent user with stored tokens is
/// a transient state that only exists while resolution is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// The resolved identity, if signed in.
    pub current_user: Option<UserProfile>,
    /// True from process start until the first bootstrap completes.
    pub is_loading: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            current_user: None,
            is_loading: true,
        }
    }
}

/// Shared handle to the session state.
///
/// Writes go through the Session Manager (and, for terminal authorization
/// failures, the Request Gateway); everything else is read-only access.
#[derive(Clone)]
pub struct SessionCell {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionCell {
    /// Create a cell in the initial (loading, signed-out) state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    /// A point-in-time copy of the session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// The resolved identity, if signed in.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.tx.borrow().current_user.clone()
    }

    /// True iff a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().current_user.is_some()
    }

    /// Subscribe to session-state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub(crate) fn set_user(&self, user: Option<UserProfile>) {
        self.tx.send_modify(|state| state.current_user = user);
    }

    pub(crate) fn clear_user(&self) {
        self.set_user(None);
    }

    pub(crate) fn set_loading(&self, is_loading: bool) {
        self.tx.send_modify(|state| state.is_loading = is_loading);
    }
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SessionManager
// =============================================================================

/// Owns the authentication lifecycle: bootstrap, login, logout, and
/// profile replacement.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

struct SessionManagerInner {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
    cell: SessionCell,
    bootstrapped: OnceCell<()>,
}

impl SessionManager {
    /// Create a session manager over the given gateway, token store, and
    /// state cell.
    #[must_use]
    pub fn new(api: ApiClient, store: Arc<dyn TokenStore>, cell: SessionCell) -> Self {
        Self {
            inner: Arc::new(SessionManagerInner {
                api,
                store,
                cell,
                bootstrapped: OnceCell::new(),
            }),
        }
    }

    /// Restore a persisted session at process start.
    ///
    /// Runs at most once per manager; later calls are no-ops. If tokens are
    /// stored, resolves them against `/auth/me`; a resolution failure is
    /// treated as "never signed in" and clears both tokens. `is_loading`
    /// drops to `false` on completion regardless of outcome.
    pub async fn bootstrap(&self) {
        self.inner
            .bootstrapped
            .get_or_init(|| self.bootstrap_inner())
            .await;
    }

    async fn bootstrap_inner(&self) {
        let stored = match self.inner.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "token store unreadable at startup");
                None
            }
        };

        if stored.is_some() {
            match self.inner.api.fetch_profile().await {
                Ok(profile) => {
                    debug!(user = %profile.id, "session restored from stored tokens");
                    self.inner.cell.set_user(Some(profile));
                }
                Err(e) => {
                    // A stale or invalid token is the same as never signed in.
                    debug!(error = %e, "stored session could not be resolved; discarding");
                    if let Err(e) = self.inner.store.clear() {
                        warn!(error = %e, "failed to clear token store");
                    }
                    self.inner.cell.set_user(None);
                }
            }
        }

        self.inner.cell.set_loading(false);
    }

    /// Persist a freshly issued token pair and resolve the identity behind
    /// it.
    ///
    /// Unlike [`Self::bootstrap`], a resolution failure here leaves the
    /// just-written tokens in place: the caller decides whether a failed
    /// login attempt should clear them or be retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the tokens cannot be persisted or identity
    /// resolution fails.
    #[instrument(skip(self, tokens))]
    pub async fn login(&self, tokens: TokenPair) -> Result<UserProfile, ApiError> {
        self.inner.store.save(&tokens)?;

        let profile = self.inner.api.fetch_profile().await?;
        debug!(user = %profile.id, "signed in");
        self.inner.cell.set_user(Some(profile.clone()));
        Ok(profile)
    }

    /// End the session: clear both tokens and drop the current user.
    ///
    /// Purely local - no server-side invalidation call is made.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be cleared.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.inner.store.clear()?;
        self.inner.cell.set_user(None);
        debug!("signed out");
        Ok(())
    }

    /// Replace the current user after an out-of-band profile-edit round
    /// trip. No validation is performed; the caller is expected to hold the
    /// authoritative server copy.
    pub fn update_user(&self, profile: UserProfile) {
        self.inner.cell.set_user(Some(profile));
    }

    /// The resolved identity, if signed in.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.inner.cell.current_user()
    }

    /// True iff a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.cell.is_authenticated()
    }

    /// True from process start until the first bootstrap completes.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.cell.snapshot().is_loading
    }

    /// Subscribe to session-state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.cell.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pantry_core::{Email, UserId, UserRole};

    fn profile(id: i64) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            name: "Test User".to_string(),
            email: Email::parse("test@example.com").unwrap(),
            phone: None,
            role: UserRole::Customer,
            is_verified: true,
            is_active: true,
        }
    }

    #[test]
    fn test_cell_starts_loading_and_signed_out() {
        let cell = SessionCell::new();
        let snapshot = cell.snapshot();
        assert!(snapshot.is_loading);
        assert!(snapshot.current_user.is_none());
        assert!(!cell.is_authenticated());
    }

    #[test]
    fn test_set_and_clear_user() {
        let cell = SessionCell::new();
        cell.set_user(Some(profile(1)));
        assert!(cell.is_authenticated());
        assert_eq!(cell.current_user().unwrap().id, UserId::new(1));

        cell.clear_user();
        assert!(!cell.is_authenticated());
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let cell = SessionCell::new();
        let mut rx = cell.subscribe();

        cell.set_user(Some(profile(2)));
        rx.changed().await.unwrap();
        assert!(rx.borrow().current_user.is_some());

        cell.clear_user();
        rx.changed().await.unwrap();
        assert!(rx.borrow().current_user.is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let cell = SessionCell::new();
        let other = cell.clone();
        cell.set_user(Some(profile(3)));
        assert!(other.is_authenticated());
    }
}

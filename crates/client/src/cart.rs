//! Cart Manager - local mirror of the server-side cart.
//!
//! The backend owns the cart. Every mutation here is immediately followed
//! by a full refetch, and the local copy is replaced wholesale - there is no
//! optimistic insertion and no local recomputation of totals.
//!
//! Overlapping mutations from rapid interaction are deliberately NOT
//! serialized: each call independently mutates then refetches, so the final
//! local state is whichever refresh response lands last, which is not
//! necessarily the one belonging to the last mutation issued.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, instrument};

use pantry_core::{CartItemId, ProductId};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::session::SessionCell;
use crate::types::Cart;

/// Observable cart state.
///
/// `cart` is `None` (absent, not merely empty) whenever no user is signed
/// in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// The mirrored cart, if a user is signed in.
    pub cart: Option<Cart>,
    /// True while a fetch or mutation is in flight.
    pub is_loading: bool,
}

/// Keeps the local cart mirror in sync with every mutation.
#[derive(Clone)]
pub struct CartManager {
    inner: Arc<CartManagerInner>,
}

struct CartManagerInner {
    api: ApiClient,
    session: SessionCell,
    state: watch::Sender<CartState>,
}

impl CartManager {
    /// Create a cart manager over the given gateway and session handle.
    #[must_use]
    pub fn new(api: ApiClient, session: SessionCell) -> Self {
        let (state, _rx) = watch::channel(CartState::default());
        Self {
            inner: Arc::new(CartManagerInner {
                api,
                session,
                state,
            }),
        }
    }

    /// Replace the local mirror with the server's authoritative cart.
    ///
    /// With no user signed in this sets the mirror to absent and returns
    /// immediately, without a network call.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails; the loading flag is reset first.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), ApiError> {
        if !self.inner.session.is_authenticated() {
            self.reset();
            return Ok(());
        }

        self.set_loading(true);
        match self.inner.api.fetch_cart().await {
            Ok(cart) => {
                debug!(items = cart.items.len(), "cart mirror replaced");
                self.inner.state.send_modify(|state| {
                    state.cart = Some(cart);
                    state.is_loading = false;
                });
                Ok(())
            }
            Err(e) => {
                self.set_loading(false);
                Err(e)
            }
        }
    }

    /// Add a product to the cart, then refetch authoritative totals.
    ///
    /// How duplicate products combine is the server's merge policy; the
    /// mirror reflects whatever the post-mutation refresh returns.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for a quantity below 1 (checked before
    /// any dispatch), or the propagated failure of the mutation or refresh.
    #[instrument(skip(self))]
    pub async fn add_item(&self, product_id: ProductId, quantity: i64) -> Result<(), ApiError> {
        if quantity < 1 {
            return Err(ApiError::Validation(format!(
                "quantity must be at least 1 (got {quantity})"
            )));
        }

        self.set_loading(true);
        if let Err(e) = self.inner.api.add_cart_item(product_id, quantity).await {
            self.set_loading(false);
            return Err(e);
        }
        self.refresh().await
    }

    /// Change a cart item's quantity, then refetch authoritative totals.
    ///
    /// The quantity floor is the caller's responsibility (the UI clamps to
    /// >= 1 before calling).
    ///
    /// # Errors
    ///
    /// Returns the propagated failure of the mutation or refresh; the
    /// loading flag is reset first.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        item_id: CartItemId,
        quantity: i64,
    ) -> Result<(), ApiError> {
        self.set_loading(true);
        if let Err(e) = self.inner.api.update_cart_item(item_id, quantity).await {
            self.set_loading(false);
            return Err(e);
        }
        self.refresh().await
    }

    /// Remove a cart item, then refetch authoritative totals.
    ///
    /// # Errors
    ///
    /// Returns the propagated failure of the mutation or refresh; the
    /// loading flag is reset first.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, item_id: CartItemId) -> Result<(), ApiError> {
        self.set_loading(true);
        if let Err(e) = self.inner.api.remove_cart_item(item_id).await {
            self.set_loading(false);
            return Err(e);
        }
        self.refresh().await
    }

    /// Empty the cart server-side, then refetch.
    ///
    /// For a still-signed-in user this yields an empty (not absent) cart.
    ///
    /// # Errors
    ///
    /// Returns the propagated failure of the mutation or refresh; the
    /// loading flag is reset first.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), ApiError> {
        self.set_loading(true);
        if let Err(e) = self.inner.api.clear_cart().await {
            self.set_loading(false);
            return Err(e);
        }
        self.refresh().await
    }

    /// Drop the local mirror without touching the server.
    ///
    /// Called synchronously on sign-out so the cart is absent before any
    /// in-flight network completion could repopulate a view of it.
    pub fn reset(&self) {
        self.inner.state.send_modify(|state| {
            state.cart = None;
            state.is_loading = false;
        });
    }

    /// A point-in-time copy of the mirrored cart.
    #[must_use]
    pub fn cart(&self) -> Option<Cart> {
        self.inner.state.borrow().cart.clone()
    }

    /// A point-in-time copy of the full cart state.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to cart-state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    fn set_loading(&self, is_loading: bool) {
        self.inner.state.send_modify(|state| state.is_loading = is_loading);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::store::MemoryTokenStore;

    // Port 9 (discard) is never listened on; any dispatch would error, so a
    // successful call proves no network was attempted.
    fn offline_manager() -> (CartManager, SessionCell) {
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        let session = SessionCell::new();
        let api = ApiClient::new(
            &config,
            Arc::new(MemoryTokenStore::new()),
            session.clone(),
        )
        .unwrap();
        (CartManager::new(api, session.clone()), session)
    }

    #[tokio::test]
    async fn test_add_item_rejects_zero_quantity_before_dispatch() {
        let (cart, _session) = offline_manager();
        let err = cart
            .add_item(ProductId::new(7), 0)
            .await
            .expect_err("zero quantity must be rejected");
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(!cart.state().is_loading);
    }

    #[tokio::test]
    async fn test_refresh_without_user_is_local_only() {
        let (cart, _session) = offline_manager();
        cart.refresh().await.expect("no network call expected");
        assert!(cart.cart().is_none());
        assert!(!cart.state().is_loading);
    }

    #[test]
    fn test_reset_clears_mirror_synchronously() {
        let (cart, _session) = offline_manager();
        cart.reset();
        let state = cart.state();
        assert!(state.cart.is_none());
        assert!(!state.is_loading);
    }
}

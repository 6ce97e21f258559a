//! Cart endpoints.
//!
//! Mutation responses are discarded on purpose: the Cart Manager refetches
//! the authoritative cart after every mutation instead of trusting a
//! partial view of the aggregate state.

use pantry_core::{CartItemId, ProductId};
use tracing::instrument;

use super::ApiClient;
use crate::error::ApiError;
use crate::types::Cart;

impl ApiClient {
    /// Fetch the signed-in user's authoritative cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<Cart, ApiError> {
        self.get_json("/cart").await
    }

    /// Add a product to the cart.
    ///
    /// How duplicate products are combined (merged line vs. separate lines)
    /// is the server's decision; the response body is discarded either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn add_cart_item(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "product_id": product_id, "quantity": quantity });
        self.post_discard("/cart/items", &body).await
    }

    /// Change the quantity of an existing cart item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn update_cart_item(
        &self,
        item_id: CartItemId,
        quantity: i64,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "quantity": quantity });
        self.put_discard(&format!("/cart/items/{item_id}"), &body)
            .await
    }

    /// Remove a cart item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_cart_item(&self, item_id: CartItemId) -> Result<(), ApiError> {
        self.delete(&format!("/cart/items/{item_id}")).await
    }

    /// Remove every item from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        self.delete("/cart").await
    }
}

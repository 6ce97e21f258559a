//! Order history endpoints.

use pantry_core::OrderId;
use tracing::instrument;

use super::ApiClient;
use crate::error::ApiError;
use crate::types::Order;

impl ApiClient {
    /// List the signed-in user's orders, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get_json("/orders/").await
    }

    /// Fetch a single order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the request fails.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ApiError> {
        self.get_json(&format!("/orders/{id}")).await
    }
}

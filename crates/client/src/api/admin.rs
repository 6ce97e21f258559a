//! Back-office endpoints (admin role required).

use pantry_core::{OrderId, OrderStatus, UserId};
use tracing::instrument;

use super::ApiClient;
use crate::error::ApiError;
use crate::types::{AdminStats, Order, UserProfile};

impl ApiClient {
    /// Fetch dashboard statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the request fails.
    #[instrument(skip(self))]
    pub async fn get_admin_stats(&self) -> Result<AdminStats, ApiError> {
        self.get_json("/admin/stats").await
    }

    /// List every registered user.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the request fails.
    #[instrument(skip(self))]
    pub async fn get_admin_users(&self) -> Result<Vec<UserProfile>, ApiError> {
        self.get_json("/admin/users").await
    }

    /// Activate or deactivate a user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the request fails.
    #[instrument(skip(self))]
    pub async fn set_user_active(
        &self,
        user_id: UserId,
        is_active: bool,
    ) -> Result<UserProfile, ApiError> {
        let body = serde_json::json!({ "is_active": is_active });
        self.put_json(&format!("/admin/users/{user_id}"), &body).await
    }

    /// Delete a user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the request fails.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), ApiError> {
        self.delete(&format!("/admin/users/{user_id}")).await
    }

    /// List every order across all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the request fails.
    #[instrument(skip(self))]
    pub async fn get_admin_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get_json("/admin/orders").await
    }

    /// Move an order to a new lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the request fails.
    #[instrument(skip(self))]
    pub async fn set_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let body = serde_json::json!({ "status": status });
        self.put_json(&format!("/admin/orders/{order_id}"), &body)
            .await
    }
}

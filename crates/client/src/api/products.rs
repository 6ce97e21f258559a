//! Product catalog endpoints.
//!
//! Reads are public to any signed-in user; writes are admin-gated by the
//! backend.

use pantry_core::ProductId;
use tracing::instrument;

use super::ApiClient;
use crate::error::ApiError;
use crate::types::{NewProduct, Product, ProductUpdate};

impl ApiClient {
    /// List catalog products, optionally filtered by a search term and/or
    /// category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        search: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<Product>, ApiError> {
        let mut query = Vec::new();
        if let Some(search) = search {
            query.push(format!("search={}", urlencoding::encode(search)));
        }
        if let Some(category) = category {
            query.push(format!("category={}", urlencoding::encode(category)));
        }

        let path = if query.is_empty() {
            "/products".to_string()
        } else {
            format!("/products?{}", query.join("&"))
        };

        self.get_json(&path).await
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.get_json(&format!("/products/{id}")).await
    }

    /// Create a product (admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the request fails.
    #[instrument(skip(self, product), fields(sku = %product.sku))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ApiError> {
        self.post_json("/products", product).await
    }

    /// Update a product (admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the request fails.
    #[instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, ApiError> {
        self.put_json(&format!("/products/{id}"), update).await
    }

    /// Delete a product (admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not an admin or the request fails.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        self.delete(&format!("/products/{id}")).await
    }
}

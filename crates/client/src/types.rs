//! Domain types for the ordering API.
//!
//! These are the wire shapes returned by the backend. Monetary amounts are
//! decimals serialized as strings to preserve precision.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pantry_core::{CartId, CartItemId, Email, OrderId, OrderStatus, ProductId, UserId, UserRole};

// =============================================================================
// User Types
// =============================================================================

/// Read-only projection of the authenticated identity.
///
/// Owned by the Session Manager; replaced only via an explicit
/// `update_user` after a profile-edit round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: Email,
    /// Phone number.
    pub phone: Option<String>,
    /// Role (customer or admin).
    pub role: UserRole,
    /// Whether the email address has been verified.
    pub is_verified: bool,
    /// Whether the account is active.
    pub is_active: bool,
}

// =============================================================================
// Product Types
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Current unit price.
    pub price: Decimal,
    /// Image URL.
    pub image_url: Option<String>,
    /// SKU code.
    pub sku: String,
    /// Units in stock.
    pub stock: i64,
    /// Category name (e.g., "produce", "bakery").
    pub category: String,
    /// Whether the product can currently be ordered.
    pub is_available: bool,
}

/// Input for creating a product (admin-gated).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    /// Product name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Unit price.
    pub price: Decimal,
    /// Image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// SKU code.
    pub sku: String,
    /// Units in stock.
    pub stock: i64,
    /// Category name.
    pub category: String,
}

/// Input for updating a product (admin-gated). All fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New unit price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// New stock level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    /// New availability flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Denormalized product snapshot carried on a cart item for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product name.
    pub name: String,
    /// Image URL.
    pub image_url: Option<String>,
    /// SKU code.
    pub sku: String,
    /// Units in stock at the time the cart was fetched.
    pub stock: i64,
}

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart item ID.
    pub id: CartItemId,
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Quantity (always >= 1).
    pub quantity: i64,
    /// Unit price snapshotted when the item was first added. Immutable even
    /// if the catalog price later changes.
    pub price_at_addition: Decimal,
    /// Display snapshot of the product.
    pub product: Option<ProductSnapshot>,
}

/// The authenticated user's server-side cart.
///
/// `total_item_count` and `subtotal` are computed by the backend. The local
/// copy is a cache replaced in full after every mutation; it is never
/// recomputed locally and trusted independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// The user who owns this cart.
    pub owner_user_id: UserId,
    /// Line items, in insertion order.
    pub items: Vec<CartItem>,
    /// Sum of all item quantities (server-computed).
    pub total_item_count: i64,
    /// Sum of `quantity * price_at_addition` over all items (server-computed).
    pub subtotal: Decimal,
}

// =============================================================================
// Order Types
// =============================================================================

/// A line item on a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Product name at order time.
    pub name: String,
    /// Quantity ordered.
    pub quantity: i64,
    /// Unit price paid.
    pub unit_price: Decimal,
}

/// A placed order, as returned by the order-history endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// The user who placed the order.
    pub user_id: UserId,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Line items.
    pub items: Vec<OrderItem>,
    /// Order total.
    pub total: Decimal,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Admin Types
// =============================================================================

/// Back-office dashboard statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    /// Total registered users.
    pub total_users: i64,
    /// Total placed orders.
    pub total_orders: i64,
    /// Total products in the catalog.
    pub total_products: i64,
    /// Lifetime revenue.
    pub total_revenue: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_deserializes_from_wire_shape() {
        let json = r#"{
            "id": 1,
            "owner_user_id": 5,
            "items": [
                {
                    "id": 10,
                    "product_id": 7,
                    "quantity": 2,
                    "price_at_addition": "4.50",
                    "product": {
                        "name": "Sourdough Loaf",
                        "image_url": null,
                        "sku": "BAK-001",
                        "stock": 12
                    }
                }
            ],
            "total_item_count": 2,
            "subtotal": "9.00"
        }"#;

        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.id, CartId::new(1));
        assert_eq!(cart.items.len(), 1);
        let item = cart.items.first().unwrap();
        assert_eq!(item.quantity, 2);
        assert_eq!(item.price_at_addition, Decimal::new(450, 2));
        assert_eq!(cart.subtotal, Decimal::new(900, 2));
    }

    #[test]
    fn test_product_update_skips_absent_fields() {
        let update = ProductUpdate {
            stock: Some(3),
            ..ProductUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "stock": 3 }));
    }

    #[test]
    fn test_user_profile_roundtrip() {
        let profile = UserProfile {
            id: UserId::new(5),
            name: "Dana".to_string(),
            email: Email::parse("dana@example.com").unwrap(),
            phone: None,
            role: UserRole::Customer,
            is_verified: true,
            is_active: true,
        };
        let json = serde_json::to_string(&profile).unwrap();
        let back: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}

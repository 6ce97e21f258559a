//! End-to-end tests of the cart mirror: refresh-after-mutate, server-owned
//! totals, the sign-out clear, and the documented refresh race.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use uuid::Uuid;

use pantry_client::store::{MemoryTokenStore, TokenStore};
use pantry_client::{ApiError, Storefront};
use pantry_core::{CartItemId, ProductId, UserId};
use pantry_integration_tests::MockApi;

const PASSWORD: &str = "correct-horse-battery";

struct Scenario {
    api: MockApi,
    shop: Storefront,
    store: Arc<MemoryTokenStore>,
    user: UserId,
    bread: ProductId,
    tomatoes: ProductId,
}

/// Mock backend with a seeded catalog and a signed-in customer.
async fn signed_in_scenario() -> Scenario {
    let api = MockApi::spawn().await;
    let bread = api.seed_product("Sourdough Loaf", Decimal::new(450, 2), 12, "bakery");
    let tomatoes = api.seed_product("Heirloom Tomatoes", Decimal::new(325, 2), 40, "produce");

    let email = format!("shopper-{}@example.com", Uuid::new_v4());
    let user = api.seed_user("Shopper", &email, PASSWORD);

    let store = Arc::new(MemoryTokenStore::new());
    let shop =
        Storefront::new(&api.client_config(), store.clone()).expect("storefront wires up");
    shop.sign_in(&email, &SecretString::from(PASSWORD))
        .await
        .expect("sign in");

    Scenario {
        api,
        shop,
        store,
        user,
        bread,
        tomatoes,
    }
}

// ============================================================================
// Server-owned totals
// ============================================================================

#[tokio::test]
async fn test_totals_match_server_computation() {
    let s = signed_in_scenario().await;
    s.shop.cart().add_item(s.bread, 2).await.expect("add bread");
    s.shop
        .cart()
        .add_item(s.tomatoes, 3)
        .await
        .expect("add tomatoes");

    let cart = s.shop.cart().cart().expect("cart mirrored");

    let quantity_sum: i64 = cart.items.iter().map(|i| i.quantity).sum();
    let subtotal_sum: Decimal = cart
        .items
        .iter()
        .map(|i| Decimal::from(i.quantity) * i.price_at_addition)
        .sum();

    assert_eq!(cart.total_item_count, quantity_sum);
    assert_eq!(cart.subtotal, subtotal_sum);
    assert_eq!(cart.subtotal, Decimal::new(1875, 2)); // 2*4.50 + 3*3.25
    assert_eq!(cart.owner_user_id, s.user);
}

#[tokio::test]
async fn test_duplicate_add_mirrors_server_merge_policy() {
    let s = signed_in_scenario().await;
    s.shop.cart().add_item(s.bread, 1).await.expect("first add");
    s.shop
        .cart()
        .add_item(s.bread, 2)
        .await
        .expect("second add of the same product");

    let local = s.shop.cart().cart().expect("cart mirrored");
    let server = s.api.server_cart(s.user).expect("server cart exists");

    // Whatever the server's merge policy produced (here: one line, summed
    // quantity) the mirror matches it exactly - no client-side merging.
    assert_eq!(local, server);
    assert_eq!(local.items.len(), 1);
    assert_eq!(local.items.first().expect("one line").quantity, 3);
    assert_eq!(local.total_item_count, 3);
}

#[tokio::test]
async fn test_price_at_addition_survives_catalog_price_change() {
    let s = signed_in_scenario().await;
    s.shop.cart().add_item(s.bread, 1).await.expect("add bread");
    let item_id = s
        .shop
        .cart()
        .cart()
        .expect("cart mirrored")
        .items
        .first()
        .expect("one line")
        .id;

    // The catalog price changes after the item was added.
    s.api.set_product_price(s.bread, Decimal::new(999, 2));

    s.shop
        .cart()
        .update_quantity(item_id, 3)
        .await
        .expect("update quantity");

    let cart = s.shop.cart().cart().expect("cart mirrored");
    let line = cart.items.first().expect("one line");
    // The snapshot taken at insertion time is immutable.
    assert_eq!(line.price_at_addition, Decimal::new(450, 2));
    assert_eq!(cart.subtotal, Decimal::new(1350, 2));
}

// ============================================================================
// Sign-out and absence semantics
// ============================================================================

#[tokio::test]
async fn test_sign_out_clears_cart_before_any_network() {
    let s = signed_in_scenario().await;
    s.shop.cart().add_item(s.bread, 1).await.expect("add bread");
    assert!(s.shop.cart().cart().is_some());

    let requests_before = s.api.request_count();
    s.shop.sign_out().expect("sign out");

    // Absent (not empty) immediately, with zero network traffic.
    assert!(s.shop.cart().cart().is_none());
    assert_eq!(s.api.request_count(), requests_before);
    assert!(s.store.load().expect("store readable").is_none());
}

#[tokio::test]
async fn test_clear_yields_empty_not_absent_cart() {
    let s = signed_in_scenario().await;
    s.shop.cart().add_item(s.bread, 2).await.expect("add bread");

    s.shop.cart().clear().await.expect("clear cart");

    let cart = s
        .shop
        .cart()
        .cart()
        .expect("a signed-in user keeps an (empty) cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_item_count, 0);
    assert_eq!(cart.subtotal, Decimal::ZERO);
}

#[tokio::test]
async fn test_unauthenticated_refresh_makes_no_network_call() {
    let api = MockApi::spawn().await;
    let store = Arc::new(MemoryTokenStore::new());
    let shop = Storefront::new(&api.client_config(), store).expect("storefront wires up");

    let requests_before = api.request_count();
    shop.cart().refresh().await.expect("local-only refresh");

    assert!(shop.cart().cart().is_none());
    assert_eq!(api.request_count(), requests_before);
}

// ============================================================================
// Failure propagation
// ============================================================================

#[tokio::test]
async fn test_mutation_failure_resets_loading_and_propagates() {
    let s = signed_in_scenario().await;

    let err = s
        .shop
        .cart()
        .update_quantity(CartItemId::new(999_999), 2)
        .await
        .expect_err("unknown cart item");
    assert!(matches!(err, ApiError::Api { status: 404, .. }));
    assert!(!s.shop.cart().state().is_loading);

    let err = s
        .shop
        .cart()
        .add_item(ProductId::new(999_999), 1)
        .await
        .expect_err("unknown product");
    assert!(matches!(err, ApiError::Api { status: 404, .. }));
    assert!(!s.shop.cart().state().is_loading);
}

#[tokio::test]
async fn test_zero_quantity_add_never_reaches_the_server() {
    let s = signed_in_scenario().await;
    let requests_before = s.api.request_count();

    let err = s
        .shop
        .cart()
        .add_item(s.bread, 0)
        .await
        .expect_err("zero quantity rejected");
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(s.api.request_count(), requests_before);
}

// ============================================================================
// The documented refresh race
// ============================================================================

/// Two near-simultaneous quantity updates: the final local state belongs to
/// whichever refresh response lands LAST, which is not necessarily the later
/// mutation. Mutations are deliberately not serialized client-side.
#[tokio::test]
async fn test_overlapping_updates_last_refresh_response_wins() {
    let s = signed_in_scenario().await;
    s.shop.cart().add_item(s.bread, 1).await.expect("add bread");
    let item_id = s
        .shop
        .cart()
        .cart()
        .expect("cart mirrored")
        .items
        .first()
        .expect("one line")
        .id;

    // The first update's refresh response is held back so it lands after
    // the second update's refresh, carrying a stale snapshot.
    s.api.delay_next_cart_fetch(Duration::from_millis(400));

    let slow_cart = s.shop.cart().clone();
    let slow = tokio::spawn(async move { slow_cart.update_quantity(item_id, 2).await });

    // Give the slow update time to issue its PUT and start its delayed GET.
    tokio::time::sleep(Duration::from_millis(150)).await;

    s.shop
        .cart()
        .update_quantity(item_id, 5)
        .await
        .expect("fast update");
    let after_fast = s.shop.cart().cart().expect("cart mirrored");
    assert_eq!(after_fast.items.first().expect("one line").quantity, 5);

    slow.await.expect("join").expect("slow update");

    // The stale refresh overwrote the newer one: local says 2, server holds 5.
    let final_local = s.shop.cart().cart().expect("cart mirrored");
    assert_eq!(final_local.items.first().expect("one line").quantity, 2);

    let server = s.api.server_cart(s.user).expect("server cart exists");
    assert_eq!(server.items.first().expect("one line").quantity, 5);
}

// ============================================================================
// Remove
// ============================================================================

#[tokio::test]
async fn test_remove_item_refetches_authoritative_state() {
    let s = signed_in_scenario().await;
    s.shop.cart().add_item(s.bread, 1).await.expect("add bread");
    s.shop
        .cart()
        .add_item(s.tomatoes, 2)
        .await
        .expect("add tomatoes");

    let bread_line = s
        .shop
        .cart()
        .cart()
        .expect("cart mirrored")
        .items
        .iter()
        .find(|i| i.product_id == s.bread)
        .expect("bread line")
        .id;

    s.shop
        .cart()
        .remove_item(bread_line)
        .await
        .expect("remove bread");

    let cart = s.shop.cart().cart().expect("cart mirrored");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(
        cart.items.first().expect("one line").product_id,
        s.tomatoes
    );
    assert_eq!(cart.total_item_count, 2);
    assert_eq!(cart.subtotal, Decimal::new(650, 2));
}

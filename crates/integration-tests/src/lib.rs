//! In-process mock of the Pantry ordering API.
//!
//! Spins up a real axum server on an ephemeral port so the client SDK is
//! exercised over actual HTTP, including the bearer attachment and the
//! refresh-and-retry protocol. Test knobs let individual tests revoke
//! tokens, fail specific endpoints, and delay cart responses to surface the
//! documented refresh-after-mutate race.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Form, Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use pantry_client::ClientConfig;
use pantry_client::types::{
    AdminStats, Cart, CartItem, Order, OrderItem, Product, ProductSnapshot, UserProfile,
};
use pantry_core::{CartId, CartItemId, Email, OrderId, OrderStatus, ProductId, UserId, UserRole};

/// The one-time code "sent" to every new account.
pub const TEST_OTP: &str = "123456";

type Shared = Arc<Mutex<MockState>>;

// =============================================================================
// Server state
// =============================================================================

struct MockUser {
    id: UserId,
    name: String,
    email: String,
    phone: Option<String>,
    password: String,
    role: UserRole,
    is_verified: bool,
    is_active: bool,
}

#[derive(Default)]
struct MockState {
    users: Vec<MockUser>,
    access_tokens: HashMap<String, UserId>,
    refresh_tokens: HashMap<String, UserId>,
    products: Vec<Product>,
    carts: HashMap<UserId, Cart>,
    orders: Vec<Order>,
    user_seq: i64,
    product_seq: i64,
    cart_seq: i64,
    cart_item_seq: i64,
    order_seq: i64,
    token_seq: u64,
    refresh_calls: u64,
    request_log: Vec<String>,
    /// When set, freshly minted access tokens are never registered, so the
    /// replayed request fails again after a "successful" refresh.
    mint_unusable_access: bool,
    /// One-shot override: the next `/auth/me` returns this status.
    fail_next_me: Option<u16>,
    /// FIFO of artificial delays applied to `GET /cart` responses. The cart
    /// snapshot is taken BEFORE the delay, so a delayed response carries a
    /// stale view.
    get_cart_delays: VecDeque<Duration>,
}

impl MockState {
    fn user_by_email(&self, email: &str) -> Option<&MockUser> {
        self.users.iter().find(|u| u.email == email)
    }

    fn profile_of(&self, id: UserId) -> Option<UserProfile> {
        self.users.iter().find(|u| u.id == id).map(profile_json)
    }

    fn mint_tokens(&mut self, user: UserId) -> (String, String) {
        self.token_seq += 1;
        let access = format!("access-{user}-{}", self.token_seq);
        let refresh = format!("refresh-{user}-{}", self.token_seq);
        if !self.mint_unusable_access {
            self.access_tokens.insert(access.clone(), user);
        }
        self.refresh_tokens.insert(refresh.clone(), user);
        (access, refresh)
    }

    fn cart_mut(&mut self, user: UserId) -> &mut Cart {
        if !self.carts.contains_key(&user) {
            self.cart_seq += 1;
            self.carts.insert(
                user,
                Cart {
                    id: CartId::new(self.cart_seq),
                    owner_user_id: user,
                    items: Vec::new(),
                    total_item_count: 0,
                    subtotal: Decimal::ZERO,
                },
            );
        }
        self.carts.get_mut(&user).expect("cart just inserted")
    }
}

fn profile_json(user: &MockUser) -> UserProfile {
    UserProfile {
        id: user.id,
        name: user.name.clone(),
        email: Email::parse(&user.email).expect("seeded email is valid"),
        phone: user.phone.clone(),
        role: user.role,
        is_verified: user.is_verified,
        is_active: user.is_active,
    }
}

/// Recompute the aggregates the backend owns.
fn recompute(cart: &mut Cart) {
    cart.total_item_count = cart.items.iter().map(|i| i.quantity).sum();
    cart.subtotal = cart
        .items
        .iter()
        .map(|i| Decimal::from(i.quantity) * i.price_at_addition)
        .sum();
}

// =============================================================================
// Response helpers
// =============================================================================

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn unauthorized() -> Response {
    error(StatusCode::UNAUTHORIZED, "could not validate credentials")
}

fn authed_user(state: &MockState, headers: &HeaderMap) -> Option<UserId> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    state.access_tokens.get(token).copied()
}

fn admin_user(state: &MockState, headers: &HeaderMap) -> Result<UserId, Response> {
    let Some(user) = authed_user(state, headers) else {
        return Err(unauthorized());
    };
    let is_admin = state
        .users
        .iter()
        .any(|u| u.id == user && u.role == UserRole::Admin);
    if is_admin {
        Ok(user)
    } else {
        Err(error(StatusCode::FORBIDDEN, "admin access required"))
    }
}

// =============================================================================
// Auth handlers
// =============================================================================

#[derive(Deserialize)]
struct SignupBody {
    name: String,
    email: String,
    phone: Option<String>,
    password: String,
}

async fn auth_signup(State(state): State<Shared>, Json(body): Json<SignupBody>) -> Response {
    let mut state = lock(&state);
    if state.user_by_email(&body.email).is_some() {
        return error(StatusCode::CONFLICT, "email already registered");
    }

    state.user_seq += 1;
    let id = UserId::new(state.user_seq);
    state.users.push(MockUser {
        id,
        name: body.name,
        email: body.email,
        phone: body.phone,
        password: body.password,
        role: UserRole::Customer,
        is_verified: false,
        is_active: true,
    });

    (
        StatusCode::CREATED,
        Json(json!({ "message": "verification code sent" })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct VerifyBody {
    email: String,
    otp: String,
}

async fn auth_verify(State(state): State<Shared>, Json(body): Json<VerifyBody>) -> Response {
    let mut state = lock(&state);
    if body.otp != TEST_OTP {
        return error(StatusCode::BAD_REQUEST, "invalid verification code");
    }
    let Some(user) = state.users.iter_mut().find(|u| u.email == body.email) else {
        return error(StatusCode::NOT_FOUND, "no such account");
    };
    user.is_verified = true;
    Json(json!({ "message": "account verified" })).into_response()
}

#[derive(Deserialize)]
struct ResendBody {
    email: String,
}

async fn auth_resend(State(state): State<Shared>, Json(body): Json<ResendBody>) -> Response {
    let state = lock(&state);
    if state.user_by_email(&body.email).is_none() {
        return error(StatusCode::NOT_FOUND, "no such account");
    }
    Json(json!({ "message": "verification code sent" })).into_response()
}

#[derive(Deserialize)]
struct SigninForm {
    username: String,
    password: String,
}

async fn auth_signin(State(state): State<Shared>, Form(form): Form<SigninForm>) -> Response {
    let mut state = lock(&state);
    let Some(user) = state.user_by_email(&form.username) else {
        return error(StatusCode::UNAUTHORIZED, "invalid credentials");
    };
    if user.password != form.password {
        return error(StatusCode::UNAUTHORIZED, "invalid credentials");
    }
    if !user.is_verified {
        return error(StatusCode::FORBIDDEN, "account not verified");
    }
    if !user.is_active {
        return error(StatusCode::FORBIDDEN, "account deactivated");
    }

    let id = user.id;
    let (access, refresh) = state.mint_tokens(id);
    Json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
    }))
    .into_response()
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh_token: String,
}

async fn auth_refresh(State(state): State<Shared>, Json(body): Json<RefreshBody>) -> Response {
    let mut state = lock(&state);
    state.refresh_calls += 1;

    let Some(user) = state.refresh_tokens.get(&body.refresh_token).copied() else {
        return error(StatusCode::UNAUTHORIZED, "invalid refresh token");
    };

    // Rotation: the old refresh token is single-use.
    state.refresh_tokens.remove(&body.refresh_token);
    let (access, refresh) = state.mint_tokens(user);
    Json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
    }))
    .into_response()
}

async fn auth_me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    if let Some(status) = state.fail_next_me.take() {
        let status = StatusCode::from_u16(status).expect("valid status code");
        return error(status, "identity resolution unavailable");
    }
    let Some(user) = authed_user(&state, &headers) else {
        return unauthorized();
    };
    match state.profile_of(user) {
        Some(profile) => Json(profile).into_response(),
        None => unauthorized(),
    }
}

// =============================================================================
// Cart handlers
// =============================================================================

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    // Snapshot under the lock, THEN sleep: a delayed response carries the
    // cart as it was when the request was processed, not when it lands.
    let (snapshot, delay) = {
        let mut state = lock(&state);
        let Some(user) = authed_user(&state, &headers) else {
            return unauthorized();
        };
        let delay = state.get_cart_delays.pop_front();
        (state.cart_mut(user).clone(), delay)
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    Json(snapshot).into_response()
}

#[derive(Deserialize)]
struct AddItemBody {
    product_id: ProductId,
    quantity: i64,
}

async fn add_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<AddItemBody>,
) -> Response {
    let mut state = lock(&state);
    let Some(user) = authed_user(&state, &headers) else {
        return unauthorized();
    };
    if body.quantity < 1 {
        return error(StatusCode::BAD_REQUEST, "quantity must be at least 1");
    }
    let Some(product) = state.products.iter().find(|p| p.id == body.product_id).cloned() else {
        return error(StatusCode::NOT_FOUND, "product not found");
    };

    state.cart_item_seq += 1;
    let item_id = CartItemId::new(state.cart_item_seq);
    let cart = state.cart_mut(user);

    // Merge policy: one line per product, quantity summed. The price
    // snapshot taken at first insertion is kept.
    if let Some(line) = cart.items.iter_mut().find(|i| i.product_id == product.id) {
        line.quantity += body.quantity;
    } else {
        cart.items.push(CartItem {
            id: item_id,
            product_id: product.id,
            quantity: body.quantity,
            price_at_addition: product.price,
            product: Some(ProductSnapshot {
                name: product.name.clone(),
                image_url: product.image_url.clone(),
                sku: product.sku.clone(),
                stock: product.stock,
            }),
        });
    }
    recompute(cart);

    (StatusCode::CREATED, Json(cart.clone())).into_response()
}

#[derive(Deserialize)]
struct UpdateItemBody {
    quantity: i64,
}

async fn update_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateItemBody>,
) -> Response {
    let mut state = lock(&state);
    let Some(user) = authed_user(&state, &headers) else {
        return unauthorized();
    };
    if body.quantity < 1 {
        return error(StatusCode::BAD_REQUEST, "quantity must be at least 1");
    }
    let cart = state.cart_mut(user);
    let Some(line) = cart
        .items
        .iter_mut()
        .find(|i| i.id == CartItemId::new(id))
    else {
        return error(StatusCode::NOT_FOUND, "cart item not found");
    };
    line.quantity = body.quantity;
    recompute(cart);
    Json(cart.clone()).into_response()
}

async fn remove_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut state = lock(&state);
    let Some(user) = authed_user(&state, &headers) else {
        return unauthorized();
    };
    let cart = state.cart_mut(user);
    let before = cart.items.len();
    cart.items.retain(|i| i.id != CartItemId::new(id));
    if cart.items.len() == before {
        return error(StatusCode::NOT_FOUND, "cart item not found");
    }
    recompute(cart);
    Json(cart.clone()).into_response()
}

async fn clear_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    let Some(user) = authed_user(&state, &headers) else {
        return unauthorized();
    };
    let cart = state.cart_mut(user);
    cart.items.clear();
    recompute(cart);
    Json(cart.clone()).into_response()
}

// =============================================================================
// Product handlers
// =============================================================================

#[derive(Deserialize)]
struct ProductQuery {
    search: Option<String>,
    category: Option<String>,
}

async fn list_products(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<ProductQuery>,
) -> Response {
    let state = lock(&state);
    if authed_user(&state, &headers).is_none() {
        return unauthorized();
    }

    let needle = query.search.map(|s| s.to_lowercase());
    let products: Vec<Product> = state
        .products
        .iter()
        .filter(|p| {
            needle
                .as_ref()
                .is_none_or(|n| p.name.to_lowercase().contains(n))
        })
        .filter(|p| query.category.as_ref().is_none_or(|c| &p.category == c))
        .cloned()
        .collect();
    Json(products).into_response()
}

async fn get_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let state = lock(&state);
    if authed_user(&state, &headers).is_none() {
        return unauthorized();
    }
    match state
        .products
        .iter()
        .find(|p| p.id == ProductId::new(id))
    {
        Some(product) => Json(product.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "product not found"),
    }
}

#[derive(Deserialize)]
struct NewProductBody {
    name: String,
    description: String,
    price: Decimal,
    image_url: Option<String>,
    sku: String,
    stock: i64,
    category: String,
}

async fn create_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewProductBody>,
) -> Response {
    let mut state = lock(&state);
    if let Err(resp) = admin_user(&state, &headers) {
        return resp;
    }

    state.product_seq += 1;
    let product = Product {
        id: ProductId::new(state.product_seq),
        name: body.name,
        description: body.description,
        price: body.price,
        image_url: body.image_url,
        sku: body.sku,
        stock: body.stock,
        category: body.category,
        is_available: body.stock > 0,
    };
    state.products.push(product.clone());
    (StatusCode::CREATED, Json(product)).into_response()
}

#[derive(Deserialize)]
struct ProductUpdateBody {
    name: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    stock: Option<i64>,
    is_available: Option<bool>,
}

async fn update_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<ProductUpdateBody>,
) -> Response {
    let mut state = lock(&state);
    if let Err(resp) = admin_user(&state, &headers) {
        return resp;
    }
    let Some(product) = state
        .products
        .iter_mut()
        .find(|p| p.id == ProductId::new(id))
    else {
        return error(StatusCode::NOT_FOUND, "product not found");
    };

    if let Some(name) = body.name {
        product.name = name;
    }
    if let Some(description) = body.description {
        product.description = description;
    }
    if let Some(price) = body.price {
        product.price = price;
    }
    if let Some(stock) = body.stock {
        product.stock = stock;
    }
    if let Some(is_available) = body.is_available {
        product.is_available = is_available;
    }
    Json(product.clone()).into_response()
}

async fn delete_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut state = lock(&state);
    if let Err(resp) = admin_user(&state, &headers) {
        return resp;
    }
    let before = state.products.len();
    state.products.retain(|p| p.id != ProductId::new(id));
    if state.products.len() == before {
        return error(StatusCode::NOT_FOUND, "product not found");
    }
    Json(json!({ "message": "product deleted" })).into_response()
}

// =============================================================================
// Order handlers
// =============================================================================

async fn list_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let Some(user) = authed_user(&state, &headers) else {
        return unauthorized();
    };
    let mut orders: Vec<Order> = state
        .orders
        .iter()
        .filter(|o| o.user_id == user)
        .cloned()
        .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(orders).into_response()
}

async fn get_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let state = lock(&state);
    let Some(user) = authed_user(&state, &headers) else {
        return unauthorized();
    };
    match state.orders.iter().find(|o| o.id == OrderId::new(id)) {
        Some(order) if order.user_id == user => Json(order.clone()).into_response(),
        Some(_) => error(StatusCode::FORBIDDEN, "not your order"),
        None => error(StatusCode::NOT_FOUND, "order not found"),
    }
}

// =============================================================================
// Admin handlers
// =============================================================================

async fn admin_stats(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if let Err(resp) = admin_user(&state, &headers) {
        return resp;
    }
    let stats = AdminStats {
        total_users: state.users.len() as i64,
        total_orders: state.orders.len() as i64,
        total_products: state.products.len() as i64,
        total_revenue: state.orders.iter().map(|o| o.total).sum(),
    };
    Json(stats).into_response()
}

async fn admin_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if let Err(resp) = admin_user(&state, &headers) {
        return resp;
    }
    let users: Vec<UserProfile> = state.users.iter().map(profile_json).collect();
    Json(users).into_response()
}

#[derive(Deserialize)]
struct AdminUserBody {
    is_active: bool,
}

async fn admin_update_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<AdminUserBody>,
) -> Response {
    let mut state = lock(&state);
    if let Err(resp) = admin_user(&state, &headers) {
        return resp;
    }
    let Some(user) = state.users.iter_mut().find(|u| u.id == UserId::new(id)) else {
        return error(StatusCode::NOT_FOUND, "user not found");
    };
    user.is_active = body.is_active;
    let profile = profile_json(user);
    Json(profile).into_response()
}

async fn admin_delete_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut state = lock(&state);
    if let Err(resp) = admin_user(&state, &headers) {
        return resp;
    }
    let before = state.users.len();
    state.users.retain(|u| u.id != UserId::new(id));
    if state.users.len() == before {
        return error(StatusCode::NOT_FOUND, "user not found");
    }
    Json(json!({ "message": "user deleted" })).into_response()
}

async fn admin_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if let Err(resp) = admin_user(&state, &headers) {
        return resp;
    }
    Json(state.orders.clone()).into_response()
}

#[derive(Deserialize)]
struct AdminOrderBody {
    status: OrderStatus,
}

async fn admin_update_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<AdminOrderBody>,
) -> Response {
    let mut state = lock(&state);
    if let Err(resp) = admin_user(&state, &headers) {
        return resp;
    }
    let Some(order) = state.orders.iter_mut().find(|o| o.id == OrderId::new(id)) else {
        return error(StatusCode::NOT_FOUND, "order not found");
    };
    order.status = body.status;
    Json(order.clone()).into_response()
}

// =============================================================================
// Router + public handle
// =============================================================================

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().expect("mock state lock")
}

async fn track_requests(
    State(state): State<Shared>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let line = format!("{} {}", request.method(), request.uri().path());
    lock(&state).request_log.push(line);
    next.run(request).await
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/auth/signup", post(auth_signup))
        .route("/auth/signin", post(auth_signin))
        .route("/auth/refresh-token", post(auth_refresh))
        .route("/auth/me", get(auth_me))
        .route("/auth/verify-otp", post(auth_verify))
        .route("/auth/resend-otp", post(auth_resend))
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_cart_item))
        .route(
            "/cart/items/{id}",
            put(update_cart_item).delete(remove_cart_item),
        )
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/orders/", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/admin/stats", get(admin_stats))
        .route("/admin/users", get(admin_users))
        .route(
            "/admin/users/{id}",
            put(admin_update_user).delete(admin_delete_user),
        )
        .route("/admin/orders", get(admin_orders))
        .route("/admin/orders/{id}", put(admin_update_order))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            track_requests,
        ))
        .with_state(state)
}

/// Handle to a running mock backend.
pub struct MockApi {
    base_url: String,
    state: Shared,
}

impl MockApi {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::default()));
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("mock listener addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Base URL of the running server.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A client configuration pointing at this server.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is somehow invalid.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url).expect("mock base url is valid")
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Insert a verified customer account directly.
    pub fn seed_user(&self, name: &str, email: &str, password: &str) -> UserId {
        self.seed_account(name, email, password, UserRole::Customer)
    }

    /// Insert a verified admin account directly.
    pub fn seed_admin(&self, name: &str, email: &str, password: &str) -> UserId {
        self.seed_account(name, email, password, UserRole::Admin)
    }

    fn seed_account(&self, name: &str, email: &str, password: &str, role: UserRole) -> UserId {
        let mut state = lock(&self.state);
        state.user_seq += 1;
        let id = UserId::new(state.user_seq);
        state.users.push(MockUser {
            id,
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            password: password.to_string(),
            role,
            is_verified: true,
            is_active: true,
        });
        id
    }

    /// Insert a catalog product directly.
    pub fn seed_product(&self, name: &str, price: Decimal, stock: i64, category: &str) -> ProductId {
        let mut state = lock(&self.state);
        state.product_seq += 1;
        let id = ProductId::new(state.product_seq);
        state.products.push(Product {
            id,
            name: name.to_string(),
            description: format!("{name} from the mock catalog"),
            price,
            image_url: None,
            sku: format!("SKU-{id}"),
            stock,
            category: category.to_string(),
            is_available: stock > 0,
        });
        id
    }

    /// Insert a placed order directly.
    pub fn seed_order(&self, user: UserId, items: &[(ProductId, i64)]) -> OrderId {
        let mut state = lock(&self.state);
        state.order_seq += 1;
        let id = OrderId::new(state.order_seq);

        let order_items: Vec<OrderItem> = items
            .iter()
            .map(|(product_id, quantity)| {
                let product = state
                    .products
                    .iter()
                    .find(|p| p.id == *product_id)
                    .expect("seeded order references a seeded product");
                OrderItem {
                    product_id: *product_id,
                    name: product.name.clone(),
                    quantity: *quantity,
                    unit_price: product.price,
                }
            })
            .collect();
        let total = order_items
            .iter()
            .map(|i| Decimal::from(i.quantity) * i.unit_price)
            .sum();

        state.orders.push(Order {
            id,
            user_id: user,
            status: OrderStatus::Pending,
            items: order_items,
            total,
            created_at: Utc::now(),
        });
        id
    }

    // =========================================================================
    // Knobs
    // =========================================================================

    /// Invalidate every outstanding access token. Refresh tokens stay valid,
    /// so the next authenticated request exercises the refresh path.
    pub fn revoke_access_tokens(&self) {
        lock(&self.state).access_tokens.clear();
    }

    /// Invalidate every outstanding token of both kinds, making the next
    /// refresh attempt fail terminally.
    pub fn revoke_all_tokens(&self) {
        let mut state = lock(&self.state);
        state.access_tokens.clear();
        state.refresh_tokens.clear();
    }

    /// When enabled, freshly minted access tokens are dead on arrival: a
    /// refresh "succeeds" but the replayed request still gets a 401.
    pub fn set_mint_unusable_access(&self, enabled: bool) {
        lock(&self.state).mint_unusable_access = enabled;
    }

    /// Make the next `/auth/me` call fail with the given status.
    pub fn fail_next_me(&self, status: u16) {
        lock(&self.state).fail_next_me = Some(status);
    }

    /// Queue an artificial delay for an upcoming `GET /cart` response.
    pub fn delay_next_cart_fetch(&self, delay: Duration) {
        lock(&self.state).get_cart_delays.push_back(delay);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// How many times `/auth/refresh-token` has been hit.
    #[must_use]
    pub fn refresh_calls(&self) -> u64 {
        lock(&self.state).refresh_calls
    }

    /// Total requests served so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        lock(&self.state).request_log.len()
    }

    /// The server-side cart for a user, if one exists.
    #[must_use]
    pub fn server_cart(&self, user: UserId) -> Option<Cart> {
        lock(&self.state).carts.get(&user).cloned()
    }

    /// Overwrite a product's catalog price (simulates a price change after
    /// items were added to carts).
    pub fn set_product_price(&self, product: ProductId, price: Decimal) {
        let mut state = lock(&self.state);
        let item = state
            .products
            .iter_mut()
            .find(|p| p.id == product)
            .expect("product exists");
        item.price = price;
    }
}

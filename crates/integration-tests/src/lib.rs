//! End-to-end tests for the Online Shop client.
//!
//! The tests drive the real [`ShopContext`] against [`MockBackend`], an axum
//! server bound to an ephemeral localhost port that speaks the same routes
//! and error bodies as the shop backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p onlineshop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_lifecycle` - Hydration, login, logout, refresh
//! - `access_guard` - Route guards over a live session
//! - `http_adapter` - Bearer injection, auth routes, binary bodies
//! - `error_envelope` - Failure normalization for every failure class
//! - `product_screen` - Concurrent product and image loading
//!
//! Multipart uploads are recorded part by part (see [`RecordedPart`]) so the
//! tests can check field names, content types and file names.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Multipart, Path, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use onlineshop_core::{
    Credentials, Customer, CustomerId, Order, OrderId, OrderStatus, Product, ProductId, Role,
};
use onlineshop_storefront::ShopContext;
use onlineshop_storefront::config::StorefrontConfig;
use onlineshop_storefront::storage::CredentialStore;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::task::JoinHandle;

/// Bytes served for product images.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nmock";

/// Bytes served for order receipts.
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\nmock receipt";

/// Bytes served for the customers report.
pub const REPORT_BYTES: &[u8] = b"%PDF-1.4\nmock customers report";

/// One request as the backend saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

/// One part of a multipart upload as the backend saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

struct Account {
    customer: Customer,
    password: String,
    image: Option<Vec<u8>>,
}

struct StoredProduct {
    product: Product,
    image: Option<Vec<u8>>,
}

#[derive(Default)]
struct MockState {
    accounts: Mutex<BTreeMap<i64, Account>>,
    tokens: Mutex<HashMap<String, i64>>,
    products: Mutex<BTreeMap<i64, StoredProduct>>,
    requests: Mutex<Vec<RecordedRequest>>,
    uploads: Mutex<Vec<(String, Vec<RecordedPart>)>>,
    next_id: AtomicI64,
    delay: Mutex<Option<Duration>>,
    path_delays: Mutex<HashMap<String, Duration>>,
    customer_failure: Mutex<Option<u16>>,
    malformed_catalog: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockState {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn issue_token(&self, user: i64) -> String {
        let token = format!("token-{user}-{}", self.next_id());
        lock(&self.tokens).insert(token.clone(), user);
        token
    }

    /// The account behind the request's bearer token.
    fn caller(&self, headers: &HeaderMap) -> Option<Customer> {
        let token = headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let user = *lock(&self.tokens).get(token)?;
        lock(&self.accounts).get(&user).map(|a| a.customer.clone())
    }

    /// Resolve the caller and require them to be `owner` or an admin.
    fn require_owner_or_admin(
        &self,
        headers: &HeaderMap,
        owner: i64,
        path: &str,
    ) -> Result<Customer, Response> {
        let caller = self.caller(headers).ok_or_else(|| unauthorized(path))?;
        if caller.id.as_i64() == owner || caller.role == Role::Admin {
            Ok(caller)
        } else {
            Err(forbidden(path))
        }
    }

    fn record_upload(&self, path: &str, parts: &[RecordedPart]) {
        lock(&self.uploads).push((path.to_string(), parts.to_vec()));
    }

    fn has_username(&self, username: &str) -> bool {
        lock(&self.accounts)
            .values()
            .any(|a| a.customer.username == username)
    }
}

/// In-process stand-in for the shop backend.
///
/// The server task is aborted when the backend is dropped.
pub struct MockBackend {
    base_url: String,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Bind an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");

        let app = router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self, credentials_path: impl Into<PathBuf>) -> StorefrontConfig {
        StorefrontConfig::for_base_url(&self.base_url, credentials_path)
    }

    /// A context over `store` with default configuration.
    #[must_use]
    pub fn context(&self, store: Arc<dyn CredentialStore>) -> ShopContext {
        ShopContext::with_store(self.config("/nonexistent/credentials.json"), store)
            .expect("build shop context")
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fixtures
    // ─────────────────────────────────────────────────────────────────────────

    /// Register an account directly.
    pub fn add_user(&self, username: &str, password: &str, role: Role) -> CustomerId {
        let id = CustomerId::new(self.state.next_id());
        let customer = Customer {
            id,
            username: username.to_string(),
            role,
            phone: Some("555-555-5555".to_string()),
            address: Some("Istanbul".to_string()),
            has_image: false,
            image_url: None,
            orders: Vec::new(),
        };
        lock(&self.state.accounts).insert(
            id.as_i64(),
            Account {
                customer,
                password: password.to_string(),
                image: None,
            },
        );
        id
    }

    /// Add a catalog entry, optionally with an image.
    pub fn add_product(&self, name: &str, price: Decimal, with_image: bool) -> ProductId {
        let id = ProductId::new(self.state.next_id());
        let product = Product {
            id,
            name: name.to_string(),
            supplier: "Acme".to_string(),
            price,
        };
        lock(&self.state.products).insert(
            id.as_i64(),
            StoredProduct {
                product,
                image: with_image.then(|| PNG_BYTES.to_vec()),
            },
        );
        id
    }

    /// Credentials as a previous login would have persisted them.
    #[must_use]
    pub fn credentials_for(&self, user: CustomerId) -> Credentials {
        let token = self.state.issue_token(user.as_i64());
        Credentials::new(SecretString::from(token), user)
    }

    /// Invalidate every issued token, as a backend restart with a new
    /// signing key would.
    pub fn revoke_tokens(&self) {
        lock(&self.state.tokens).clear();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Failure Switches
    // ─────────────────────────────────────────────────────────────────────────

    /// Hold every response for `delay`.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.state.delay) = delay;
    }

    /// Hold responses to `path` for `delay`, in place of the global delay.
    pub fn set_delay_for(&self, path: &str, delay: Option<Duration>) {
        let mut delays = lock(&self.state.path_delays);
        match delay {
            Some(delay) => delays.insert(path.to_string(), delay),
            None => delays.remove(path),
        };
    }

    /// Answer `GET /customers/{id}` with `status` and a JSON error body.
    pub fn fail_customer_lookups(&self, status: Option<u16>) {
        *lock(&self.state.customer_failure) = status;
    }

    /// Answer `GET /products` with an HTML page instead of JSON.
    pub fn serve_malformed_catalog(&self, enabled: bool) {
        self.state.malformed_catalog.store(enabled, Ordering::Relaxed);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    /// How many `method path` requests were received.
    #[must_use]
    pub fn hits(&self, method: &str, path: &str) -> usize {
        lock(&self.state.requests)
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Parts of the most recent multipart upload to `path`, in wire order.
    #[must_use]
    pub fn last_upload(&self, path: &str) -> Option<Vec<RecordedPart>> {
        lock(&self.state.uploads)
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, parts)| parts.clone())
    }

    /// The most recent request to `path`.
    #[must_use]
    pub fn last_request(&self, path: &str) -> Option<RecordedRequest> {
        lock(&self.state.requests)
            .iter()
            .rev()
            .find(|r| r.path == path)
            .cloned()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A localhost URL nothing is listening on.
#[must_use]
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("reserve port");
    let port = listener.local_addr().expect("reserved address").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

// =============================================================================
// Routes
// =============================================================================

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/admin/add", post(add_admin))
        .route("/customers", get(list_customers))
        .route("/customers/report", get(customers_report))
        .route("/customers/{id}", get(get_customer))
        .route("/customers/{id}/image", get(customer_image))
        .route("/customers/updateById/{id}", put(update_customer))
        .route("/customers/deleteById/{id}", delete(delete_customer))
        .route("/products", get(list_products))
        .route("/products/add", post(add_product))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}/image", get(product_image))
        .route("/products/updateById/{id}", put(update_product))
        .route("/products/deleteById/{id}", delete(delete_product))
        .route("/orders", get(list_orders))
        .route("/orders/buy", post(buy))
        .route("/orders/{id}", get(get_order))
        .route("/orders/deleteById/{id}", delete(delete_order))
        .route("/orders/{id}/receipt", get(order_receipt))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

async fn record(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    lock(&state.requests).push(RecordedRequest {
        method: request.method().to_string(),
        path: path.clone(),
        authorization: request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
    });

    let path_delay = lock(&state.path_delays).get(&path).copied();
    let delay = path_delay.or(*lock(&state.delay));
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    next.run(request).await
}

/// JSON error body in the backend's exception-handler shape.
fn error_body(status: StatusCode, message: &str, path: &str) -> Response {
    let body = json!({
        "timestamp": "2025-01-01T12:00:00",
        "status": status.as_u16(),
        "error": status.canonical_reason().unwrap_or_default(),
        "message": message,
        "path": path,
    });
    (status, Json(body)).into_response()
}

fn unauthorized(path: &str) -> Response {
    error_body(
        StatusCode::UNAUTHORIZED,
        "Full authentication is required to access this resource",
        path,
    )
}

fn forbidden(path: &str) -> Response {
    error_body(StatusCode::FORBIDDEN, "Access is denied", path)
}

/// Resolve the caller and require the admin role.
fn require_admin(state: &MockState, headers: &HeaderMap, path: &str) -> Result<Customer, Response> {
    let caller = state.caller(headers).ok_or_else(|| unauthorized(path))?;
    if caller.role == Role::Admin {
        Ok(caller)
    } else {
        Err(forbidden(path))
    }
}

/// Validation failures carry the timestamp as a date array.
fn bad_request(message: &str, path: &str) -> Response {
    let body = json!({
        "timestamp": [2025, 1, 1, 12, 0, 0],
        "status": 400,
        "error": "Bad Request",
        "message": message,
        "path": path,
    });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn not_found(what: &str, id: i64, path: &str) -> Response {
    error_body(
        StatusCode::NOT_FOUND,
        &format!("{what} not found with id: {id}"),
        path,
    )
}

/// Drain a multipart body and record it against `path`.
async fn read_parts(
    state: &MockState,
    mut multipart: Multipart,
    path: &str,
) -> Result<Vec<RecordedPart>, Response> {
    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&e.body_text(), path))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(ToString::to_string);
        let content_type = field.content_type().map(ToString::to_string);
        let body = field
            .bytes()
            .await
            .map_err(|e| bad_request(&e.body_text(), path))?;
        parts.push(RecordedPart {
            name,
            file_name,
            content_type,
            body: body.to_vec(),
        });
    }
    state.record_upload(path, &parts);
    Ok(parts)
}

/// Decode the JSON part called `name`, if it was sent.
fn json_part<T: DeserializeOwned>(
    parts: &[RecordedPart],
    name: &str,
    path: &str,
) -> Result<Option<T>, Response> {
    parts
        .iter()
        .find(|p| p.name == name)
        .map(|p| serde_json::from_slice(&p.body))
        .transpose()
        .map_err(|e| bad_request(&e.to_string(), path))
}

/// Bytes of the `file` part, if one was sent.
fn file_part(parts: &[RecordedPart]) -> Option<Vec<u8>> {
    parts.iter().find(|p| p.name == "file").map(|p| p.body.clone())
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<LoginBody>) -> Response {
    let user = lock(&state.accounts)
        .values()
        .find(|a| a.customer.username == body.username && a.password == body.password)
        .map(|a| a.customer.id);

    match user {
        Some(id) => {
            let token = state.issue_token(id.as_i64());
            // The backend sends the id as a string
            Json(json!({ "token": token, "userId": id.to_string() })).into_response()
        }
        None => error_body(
            StatusCode::UNAUTHORIZED,
            "Invalid username or password",
            "/auth/login",
        ),
    }
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    password: String,
    phone: String,
    address: String,
}

async fn register(State(state): State<Arc<MockState>>, Json(body): Json<RegisterBody>) -> Response {
    if state.has_username(&body.username) {
        return (StatusCode::BAD_REQUEST, "Username is already taken").into_response();
    }

    let id = CustomerId::new(state.next_id());
    lock(&state.accounts).insert(
        id.as_i64(),
        Account {
            customer: Customer {
                id,
                username: body.username,
                role: Role::Customer,
                phone: Some(body.phone),
                address: Some(body.address),
                has_image: false,
                image_url: None,
                orders: Vec::new(),
            },
            password: body.password,
            image: None,
        },
    );
    Json(json!({ "message": "Customer registered successfully" })).into_response()
}

#[derive(Deserialize)]
struct AddAdminBody {
    username: String,
    phone: String,
    address: String,
}

async fn add_admin(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<AddAdminBody>,
) -> Response {
    if let Err(response) = require_admin(&state, &headers, "/admin/add") {
        return response;
    }
    if state.has_username(&body.username) {
        return (StatusCode::BAD_REQUEST, "Username is already taken").into_response();
    }

    let id = CustomerId::new(state.next_id());
    lock(&state.accounts).insert(
        id.as_i64(),
        Account {
            customer: Customer {
                id,
                username: body.username,
                role: Role::Admin,
                phone: Some(body.phone),
                address: Some(body.address),
                has_image: false,
                image_url: None,
                orders: Vec::new(),
            },
            password: String::new(),
            image: None,
        },
    );
    Json(json!({ "message": "Admin added successfully" })).into_response()
}

async fn customers_report(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(response) = require_admin(&state, &headers, "/customers/report") {
        return response;
    }
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/pdf"),
            (CONTENT_DISPOSITION, "attachment; filename=customers_report.pdf"),
        ],
        REPORT_BYTES,
    )
        .into_response()
}

async fn list_customers(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(response) = require_admin(&state, &headers, "/customers") {
        return response;
    }
    let customers: Vec<Customer> = lock(&state.accounts)
        .values()
        .map(|a| a.customer.clone())
        .collect();
    Json(customers).into_response()
}

async fn get_customer(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let path = format!("/customers/{id}");
    let failure = *lock(&state.customer_failure);
    if let Some(status) = failure {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return error_body(status, "Database unavailable", &path);
    }

    let Some(caller) = state.caller(&headers) else {
        return unauthorized(&path);
    };
    if caller.id.as_i64() != id && caller.role != Role::Admin {
        return forbidden(&path);
    }

    match lock(&state.accounts).get(&id) {
        Some(account) => Json(account.customer.clone()).into_response(),
        None => error_body(
            StatusCode::NOT_FOUND,
            &format!("Customer not found with id: {id}"),
            &path,
        ),
    }
}

async fn customer_image(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> Response {
    let image = lock(&state.accounts).get(&id).and_then(|a| a.image.clone());
    match image {
        Some(bytes) => (StatusCode::OK, [(CONTENT_TYPE, "image/png")], bytes).into_response(),
        None => error_body(
            StatusCode::NOT_FOUND,
            "Customer has no image",
            &format!("/customers/{id}/image"),
        ),
    }
}

#[derive(Deserialize)]
struct ProfileBody {
    username: String,
    phone: String,
    address: String,
}

async fn update_customer(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let path = format!("/customers/updateById/{id}");
    if let Err(response) = state.require_owner_or_admin(&headers, id, &path) {
        return response;
    }
    let parts = match read_parts(&state, multipart, &path).await {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    let profile = match json_part::<ProfileBody>(&parts, "updateCustomerRequest", &path) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    let mut accounts = lock(&state.accounts);
    let Some(account) = accounts.get_mut(&id) else {
        return not_found("Customer", id, &path);
    };
    if let Some(profile) = profile {
        account.customer.username = profile.username;
        account.customer.phone = Some(profile.phone);
        account.customer.address = Some(profile.address);
    }
    if let Some(image) = file_part(&parts) {
        account.image = Some(image);
        account.customer.has_image = true;
    }
    "Customer updated successfully".into_response()
}

async fn delete_customer(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let path = format!("/customers/deleteById/{id}");
    if let Err(response) = state.require_owner_or_admin(&headers, id, &path) {
        return response;
    }
    match lock(&state.accounts).remove(&id) {
        Some(_) => "Customer deleted successfully".into_response(),
        None => not_found("Customer", id, &path),
    }
}

async fn list_products(State(state): State<Arc<MockState>>) -> Response {
    if state.malformed_catalog.load(Ordering::Relaxed) {
        return (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/html")],
            "<html><body>Maintenance</body></html>",
        )
            .into_response();
    }
    let products: Vec<Product> = lock(&state.products)
        .values()
        .map(|p| p.product.clone())
        .collect();
    Json(products).into_response()
}

async fn get_product(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> Response {
    match lock(&state.products).get(&id) {
        Some(stored) => Json(stored.product.clone()).into_response(),
        None => error_body(
            StatusCode::NOT_FOUND,
            &format!("Product not found with id: {id}"),
            &format!("/products/{id}"),
        ),
    }
}

async fn product_image(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> Response {
    let image = lock(&state.products).get(&id).and_then(|p| p.image.clone());
    match image {
        Some(bytes) => (StatusCode::OK, [(CONTENT_TYPE, "image/png")], bytes).into_response(),
        None => error_body(
            StatusCode::NOT_FOUND,
            "Image not found",
            &format!("/products/{id}/image"),
        ),
    }
}

#[derive(Deserialize)]
struct ProductBody {
    name: String,
    supplier: String,
    price: Decimal,
}

async fn add_product(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let path = "/products/add";
    if let Err(response) = require_admin(&state, &headers, path) {
        return response;
    }
    let parts = match read_parts(&state, multipart, path).await {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    let body = match json_part::<ProductBody>(&parts, "addProductRequest", path) {
        Ok(Some(body)) => body,
        Ok(None) => {
            return bad_request("Required part 'addProductRequest' is not present.", path);
        }
        Err(response) => return response,
    };
    if body.price <= Decimal::ZERO {
        return bad_request("Price must be positive", path);
    }

    let id = ProductId::new(state.next_id());
    lock(&state.products).insert(
        id.as_i64(),
        StoredProduct {
            product: Product {
                id,
                name: body.name,
                supplier: body.supplier,
                price: body.price,
            },
            image: file_part(&parts),
        },
    );
    "Product added successfully".into_response()
}

async fn update_product(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let path = format!("/products/updateById/{id}");
    if let Err(response) = require_admin(&state, &headers, &path) {
        return response;
    }
    let parts = match read_parts(&state, multipart, &path).await {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    let body = match json_part::<ProductBody>(&parts, "updateProductRequest", &path) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let mut products = lock(&state.products);
    let Some(stored) = products.get_mut(&id) else {
        return not_found("Product", id, &path);
    };
    if let Some(body) = body {
        stored.product.name = body.name;
        stored.product.supplier = body.supplier;
        stored.product.price = body.price;
    }
    if let Some(image) = file_part(&parts) {
        stored.image = Some(image);
    }
    "Product updated successfully".into_response()
}

async fn delete_product(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let path = format!("/products/deleteById/{id}");
    if let Err(response) = require_admin(&state, &headers, &path) {
        return response;
    }
    match lock(&state.products).remove(&id) {
        Some(_) => "Product deleted successfully".into_response(),
        None => error_body(
            StatusCode::NOT_FOUND,
            &format!("Product not found with id: {id}"),
            &path,
        ),
    }
}

async fn list_orders(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(response) = require_admin(&state, &headers, "/orders") {
        return response;
    }
    let orders: Vec<Order> = lock(&state.accounts)
        .values()
        .flat_map(|a| a.customer.orders.clone())
        .collect();
    Json(orders).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuyBody {
    customer_id: i64,
    product_id: i64,
}

async fn buy(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<BuyBody>,
) -> Response {
    let Some(caller) = state.caller(&headers) else {
        return unauthorized("/orders/buy");
    };
    if caller.id.as_i64() != body.customer_id && caller.role != Role::Admin {
        return forbidden("/orders/buy");
    }

    let product = lock(&state.products)
        .get(&body.product_id)
        .map(|p| p.product.clone());
    let Some(product) = product else {
        return error_body(
            StatusCode::NOT_FOUND,
            &format!("Product not found with id: {}", body.product_id),
            "/orders/buy",
        );
    };

    let order_id = OrderId::new(state.next_id());
    let mut accounts = lock(&state.accounts);
    let Some(account) = accounts.get_mut(&body.customer_id) else {
        return error_body(StatusCode::NOT_FOUND, "Customer not found", "/orders/buy");
    };
    account.customer.orders.push(Order {
        id: order_id,
        date: Some(chrono::Utc::now().naive_utc()),
        city: account.customer.address.clone().unwrap_or_default(),
        status: OrderStatus::Pending,
        product: Some(product),
    });
    "Order placed successfully".into_response()
}

async fn get_order(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let path = format!("/orders/{id}");
    if let Err(response) = require_admin(&state, &headers, &path) {
        return response;
    }
    let order = lock(&state.accounts)
        .values()
        .flat_map(|a| a.customer.orders.iter())
        .find(|o| o.id.as_i64() == id)
        .cloned();
    match order {
        Some(order) => Json(order).into_response(),
        None => not_found("Order", id, &path),
    }
}

async fn delete_order(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let path = format!("/orders/deleteById/{id}");
    if let Err(response) = require_admin(&state, &headers, &path) {
        return response;
    }
    let mut removed = false;
    for account in lock(&state.accounts).values_mut() {
        let before = account.customer.orders.len();
        account.customer.orders.retain(|o| o.id.as_i64() != id);
        removed |= account.customer.orders.len() != before;
    }
    if removed {
        format!("Order with id {id} deleted successfully.").into_response()
    } else {
        not_found("Order", id, &path)
    }
}

async fn order_receipt(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let path = format!("/orders/{id}/receipt");
    if let Err(response) = require_admin(&state, &headers, &path) {
        return response;
    }
    let exists = lock(&state.accounts)
        .values()
        .any(|a| a.customer.orders.iter().any(|o| o.id.as_i64() == id));
    if exists {
        (StatusCode::OK, [(CONTENT_TYPE, "application/pdf")], PDF_BYTES).into_response()
    } else {
        error_body(StatusCode::NOT_FOUND, &format!("Order not found with id: {id}"), &path)
    }
}

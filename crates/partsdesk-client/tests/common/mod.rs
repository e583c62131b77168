//! In-process stand-in for the PartsDesk REST API.
//!
//! Serves just enough of the backend for the client to be exercised end to
//! end: cookie login, `/me`, paged products and debtors, raw and wrapped
//! reference lists, field-error bodies, sale creation, khata payments,
//! payment-status updates and the admin users screen.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use partsdesk_client::{ApiClient, ClientConfig};
use partsdesk_core::{Debtor, Money};
use serde_json::{json, Value};

pub const ADMIN_TOKEN: &str = "tok-admin";
pub const CLERK_TOKEN: &str = "tok-clerk";
pub const PASSWORD: &str = "secret1";

/// Product that the backend refuses to delete.
pub const PROTECTED_PRODUCT: i64 = 3;

pub struct Backend {
    pub products: Vec<Value>,
    pub sales: Vec<Value>,
    pub debtors: Vec<Value>,
    pub payments: Vec<Value>,
    pub status_updates: Vec<Value>,
    pub users: Vec<Value>,
    /// Server-side session revocation: `/me` answers 401 from now on.
    pub revoked: bool,
    /// Mutations answer `{"message": ..}` instead of the stored record.
    pub bare_replies: bool,
}

impl Default for Backend {
    fn default() -> Self {
        Backend {
            products: Vec::new(),
            sales: Vec::new(),
            debtors: debtors(),
            payments: Vec::new(),
            status_updates: Vec::new(),
            users: vec![
                user_json(ADMIN_TOKEN).unwrap_or_default(),
                user_json(CLERK_TOKEN).unwrap_or_default(),
            ],
            revoked: false,
            bare_replies: false,
        }
    }
}

#[derive(Clone, Default)]
pub struct Stub {
    pub backend: Arc<Mutex<Backend>>,
}

impl Stub {
    pub fn with_products(products: Vec<Value>) -> Self {
        let stub = Stub::default();
        stub.backend.lock().unwrap().products = products;
        stub
    }

    pub fn revoke_sessions(&self) {
        self.backend.lock().unwrap().revoked = true;
    }

    pub fn product_count(&self) -> usize {
        self.backend.lock().unwrap().products.len()
    }

    pub fn recorded_sales(&self) -> Vec<Value> {
        self.backend.lock().unwrap().sales.clone()
    }

    pub fn recorded_payments(&self) -> Vec<Value> {
        self.backend.lock().unwrap().payments.clone()
    }

    pub fn recorded_status_updates(&self) -> Vec<Value> {
        self.backend.lock().unwrap().status_updates.clone()
    }

    /// From now on mutations reply with a bare message.
    pub fn reply_without_records(&self) {
        self.backend.lock().unwrap().bare_replies = true;
    }

    fn bare_replies(&self) -> bool {
        self.backend.lock().unwrap().bare_replies
    }
}

pub fn product(id: i64, name: &str, stock: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "sku": format!("SKU-{:03}", id),
        "brand": {"id": 1, "name": "Honda"},
        "quantityInStock": stock,
        "purchasePrice": 80.0,
        "sellingPrice": 100.0
    })
}

/// `count` products; every third one is a brake part.
pub fn catalogue(count: i64) -> Vec<Value> {
    (1..=count)
        .map(|id| {
            let name = if id % 3 == 0 {
                format!("Brake Shoe {}", id)
            } else {
                format!("Chain Kit {}", id)
            };
            product(id, &name, id)
        })
        .collect()
}

/// Three customers on khata, Rs 700 owed in total:
/// - 1 Bilal Autos: Rs 300 (1 Mar) + Rs 200 left of Rs 250 (5 Mar)
/// - 2 Kashif Motors: Rs 120, listed without transactions
/// - 3 Rana Bikes: Rs 80 (2 Mar)
pub fn debtors() -> Vec<Value> {
    vec![
        json!({
            "id": 1,
            "name": "Bilal Autos",
            "phone": "0321-5550001",
            "totalCredit": 500.0,
            "transactions": [
                {"id": 11, "saleId": 40, "amount": 300.0, "paid": 0.0, "remaining": 300.0,
                 "date": "2024-03-01T10:00:00"},
                {"id": 12, "saleId": 41, "amount": 250.0, "paid": 50.0, "remaining": 200.0,
                 "date": "2024-03-05T10:00:00"}
            ]
        }),
        json!({"id": 2, "name": "Kashif Motors", "totalCredit": 120.0}),
        json!({
            "id": 3,
            "name": "Rana Bikes",
            "totalCredit": 80.0,
            "transactions": [
                {"id": 31, "amount": 80.0, "paid": 0.0, "remaining": 80.0,
                 "date": "2024-03-02T09:30:00"}
            ]
        }),
    ]
}

/// A stored sale of Rs 189 with Rs 100 paid.
pub fn partial_sale(id: i64) -> Value {
    json!({
        "id": id,
        "customerName": "Imran Motors",
        "items": [],
        "quantitySoldSummary": 2,
        "totalAmountSummary": 189.0,
        "amountPaid": 100.0,
        "paymentStatus": "PARTIAL",
        "createdAt": "2024-05-01T10:00:00"
    })
}

// =============================================================================
// Server
// =============================================================================

pub struct TestServer {
    pub base_url: String,
    pub stub: Stub,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(stub: Stub) -> Self {
        let app = router(stub.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            stub,
            handle,
        }
    }

    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.api.base_url = self.base_url.clone();
        config.api.timeout_secs = 5;
        config
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config()).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router(stub: Stub) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/low-stock", get(low_stock))
        .route("/api/v1/products/{id}", delete(delete_product))
        .route("/api/v1/brands", get(list_brands).post(create_brand))
        .route("/api/v1/suppliers", get(list_suppliers))
        .route("/api/v1/sales", post(create_sale))
        .route("/api/v1/sales/{id}/payment-status", patch(update_payment_status))
        .route("/api/v1/debtors", get(list_debtors))
        .route("/api/v1/debtors/{id}", delete(delete_debtor))
        .route("/api/v1/debtors/{id}/payments", post(record_payment))
        .route("/api/auth/users", get(list_users))
        .route("/api/auth/users/{id}", put(update_user).delete(delete_user))
        .with_state(stub)
}

// =============================================================================
// Auth
// =============================================================================

fn user_json(token: &str) -> Option<Value> {
    match token {
        ADMIN_TOKEN => Some(json!({"id": 1, "username": "admin", "roles": ["ROLE_ADMIN"]})),
        CLERK_TOKEN => Some(json!({"id": 2, "username": "clerk", "roles": ["ROLE_USER"]})),
        _ => None,
    }
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "token")
        .map(|(_, value)| value.to_string())
}

fn session_user(stub: &Stub, headers: &HeaderMap) -> Option<Value> {
    if stub.backend.lock().unwrap().revoked {
        return None;
    }
    user_json(&cookie_token(headers)?)
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({"message": text}))).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Full authentication is required"})),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let token = match (body["username"].as_str(), body["password"].as_str()) {
        (Some("admin"), Some(PASSWORD)) => ADMIN_TOKEN,
        (Some("clerk"), Some(PASSWORD)) => CLERK_TOKEN,
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Bad credentials"})),
            )
                .into_response()
        }
    };

    let cookie = format!("token={}; Path=/; HttpOnly; SameSite=Lax", token);
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({"message": "Login successful", "user": user_json(token)})),
    )
        .into_response()
}

async fn logout() -> Response {
    (
        [(header::SET_COOKIE, "token=; Path=/; Max-Age=0".to_string())],
        Json(json!({"message": "Logged out"})),
    )
        .into_response()
}

async fn me(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    match session_user(&stub, &headers) {
        Some(user) => Json(json!({"data": user})).into_response(),
        None => unauthorized(),
    }
}

// =============================================================================
// Products
// =============================================================================

async fn list_products(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if session_user(&stub, &headers).is_none() {
        return unauthorized();
    }

    let search = params.get("search").map(|s| s.to_lowercase());

    let rows: Vec<Value> = stub
        .backend
        .lock()
        .unwrap()
        .products
        .iter()
        .filter(|p| match &search {
            Some(term) => p["name"].as_str().unwrap_or_default().to_lowercase().contains(term),
            None => true,
        })
        .cloned()
        .collect();

    paged(rows, &params)
}

/// `{data, pagination}` for the requested `page`/`limit` of `rows`.
fn paged(rows: Vec<Value>, params: &HashMap<String, String>) -> Response {
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);

    let total = rows.len();
    let total_pages = total.div_ceil(limit).max(1);
    let data: Vec<Value> = rows
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();

    Json(json!({
        "data": data,
        "pagination": {"page": page, "limit": limit, "total": total, "totalPages": total_pages}
    }))
    .into_response()
}

async fn low_stock(
    State(stub): State<Stub>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let threshold: i64 = params
        .get("threshold")
        .and_then(|t| t.parse().ok())
        .unwrap_or(10);
    let rows: Vec<Value> = stub
        .backend
        .lock()
        .unwrap()
        .products
        .iter()
        .filter(|p| p["quantityInStock"].as_i64().unwrap_or_default() <= threshold)
        .cloned()
        .collect();
    Json(Value::Array(rows)).into_response()
}

async fn delete_product(State(stub): State<Stub>, Path(id): Path<i64>) -> Response {
    if id == PROTECTED_PRODUCT {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "Product has sales"})),
        )
            .into_response();
    }
    stub.backend
        .lock()
        .unwrap()
        .products
        .retain(|p| p["id"].as_i64() != Some(id));
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Reference Lists
// =============================================================================

async fn list_brands() -> Response {
    Json(json!([{"id": 1, "name": "Honda"}, {"id": 2, "name": "Yamaha"}])).into_response()
}

async fn create_brand(Json(body): Json<Value>) -> Response {
    if body["name"] == "Honda" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"name": "Brand already exists"})),
        )
            .into_response();
    }
    Json(json!({"data": {"id": 9, "name": body["name"]}})).into_response()
}

async fn list_suppliers() -> Response {
    Json(json!({"data": [
        {"id": 1, "name": "Atlas Traders", "phone": "0300-1234567"},
        {"id": 2, "name": "Lahore Auto Parts"}
    ]}))
    .into_response()
}

// =============================================================================
// Sales
// =============================================================================

async fn create_sale(State(stub): State<Stub>, Json(body): Json<Value>) -> Response {
    if stub.bare_replies() {
        stub.backend.lock().unwrap().sales.push(body);
        return message(StatusCode::CREATED, "Sale recorded");
    }
    let sale = json!({
        "id": 100,
        "customerName": body["customerName"],
        "items": body["items"],
        "quantitySoldSummary": body["quantitySoldSummary"],
        "totalAmountSummary": body["totalAmountSummary"],
        "amountPaid": body["amountPaid"],
        "paymentStatus": body["paymentStatus"],
        "createdAt": "2024-05-01T10:00:00"
    });
    stub.backend.lock().unwrap().sales.push(body);
    (StatusCode::CREATED, Json(json!({"data": sale}))).into_response()
}

async fn update_payment_status(
    State(stub): State<Stub>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let bare = stub.bare_replies();
    stub.backend.lock().unwrap().status_updates.push(body.clone());
    if bare {
        return message(StatusCode::OK, "Payment status updated");
    }

    let mut sale = partial_sale(id);
    sale["amountPaid"] = body["amountPaid"].clone();
    sale["paymentStatus"] = body["paymentStatus"].clone();
    Json(json!({"data": sale})).into_response()
}

// =============================================================================
// Debtors (Khata)
// =============================================================================

async fn list_debtors(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if session_user(&stub, &headers).is_none() {
        return unauthorized();
    }
    let rows = stub.backend.lock().unwrap().debtors.clone();
    if params.contains_key("page") {
        paged(rows, &params)
    } else {
        Json(Value::Array(rows)).into_response()
    }
}

async fn delete_debtor(State(stub): State<Stub>, Path(id): Path<i64>) -> Response {
    stub.backend
        .lock()
        .unwrap()
        .debtors
        .retain(|d| d["id"].as_i64() != Some(id));
    StatusCode::NO_CONTENT.into_response()
}

/// Settles oldest first with the same ledger rules the client applies.
async fn record_payment(
    State(stub): State<Stub>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut backend = stub.backend.lock().unwrap();
    let Some(row) = backend.debtors.iter_mut().find(|d| d["id"].as_i64() == Some(id)) else {
        return message(StatusCode::NOT_FOUND, "Debtor not found");
    };

    let mut debtor: Debtor = serde_json::from_value(row.clone()).unwrap();
    let amount = Money::from_decimal(body["amount"].as_f64().unwrap_or_default());
    if debtor.apply_payment(amount).is_err() {
        return message(StatusCode::BAD_REQUEST, "Invalid payment amount");
    }
    *row = serde_json::to_value(&debtor).unwrap();
    let bare = backend.bare_replies;
    backend.payments.push(body);

    if bare {
        message(StatusCode::OK, "Payment recorded")
    } else {
        Json(json!({"data": debtor})).into_response()
    }
}

// =============================================================================
// Users
// =============================================================================

fn is_admin_session(stub: &Stub, headers: &HeaderMap) -> Option<bool> {
    let user = session_user(stub, headers)?;
    Some(
        user["roles"]
            .as_array()
            .is_some_and(|roles| roles.iter().any(|r| r == "ROLE_ADMIN")),
    )
}

async fn list_users(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    match is_admin_session(&stub, &headers) {
        None => unauthorized(),
        Some(false) => message(StatusCode::FORBIDDEN, "Admins only"),
        Some(true) => {
            let rows = stub.backend.lock().unwrap().users.clone();
            paged(rows, &params)
        }
    }
}

async fn update_user(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if is_admin_session(&stub, &headers) != Some(true) {
        return message(StatusCode::FORBIDDEN, "Admins only");
    }
    let mut backend = stub.backend.lock().unwrap();
    let Some(user) = backend.users.iter_mut().find(|u| u["id"].as_i64() == Some(id)) else {
        return message(StatusCode::NOT_FOUND, "User not found");
    };
    for key in ["username", "email", "roles"] {
        if !body[key].is_null() {
            user[key] = body[key].clone();
        }
    }
    Json(json!({"data": user.clone()})).into_response()
}

async fn delete_user(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if is_admin_session(&stub, &headers) != Some(true) {
        return message(StatusCode::FORBIDDEN, "Admins only");
    }
    stub.backend
        .lock()
        .unwrap()
        .users
        .retain(|u| u["id"].as_i64() != Some(id));
    StatusCode::NO_CONTENT.into_response()
}

//! End-to-end tests for the Sudanese Bazaar client.
//!
//! [`FakeApi`] serves the bazaar REST API from memory on a random local
//! port. It answers like the production server wherever the client can
//! observe the difference: bearer sessions expire after 30 days, the cart
//! merges repeated adds server-side, a new default address clears the old
//! one, and placing an order empties the cart. Errors carry the server's
//! Arabic messages.
//!
//! Tests drive a real [`Bazaar`] against it:
//!
//! ```rust,ignore
//! let api = FakeApi::spawn().await?;
//! api.seed_user("Amna Osman", "amna@example.sd", "secret123");
//!
//! let dir = tempfile::tempdir()?;
//! let mut bazaar = api.bazaar(dir.path().join("state.json"))?;
//! bazaar.login("amna@example.sd", &SecretString::from("secret123".to_string())).await?;
//! ```
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use bazaar_client::{Bazaar, ClientConfig};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

/// Session lifetime granted at login and registration.
pub const SESSION_DAYS: i64 = 30;

/// White cotton jalabiya, 12.50 KWD, sizes S/M/L.
pub const JALABIYA: &str = "prod-jalabiya";
/// Toub on sale, 25.00 KWD (was 30.00).
pub const TOUB: &str = "prod-toub";
/// Bakhoor incense, 4.75 KWD, out of stock.
pub const BAKHOOR: &str = "prod-bakhoor";

/// Credentials used by most tests.
pub const EMAIL: &str = "amna@example.sd";
pub const PASSWORD: &str = "secret123";

pub const CLOTHING: &str = "cat-clothing";
pub const PERFUME: &str = "cat-perfume";

const UNAUTHORIZED: &str = "غير مصرح";

type Shared = Arc<Mutex<FakeDb>>;
type Reply = (StatusCode, Json<Value>);

// =============================================================================
// Storage
// =============================================================================

struct UserRow {
    id: String,
    name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
}

impl UserRow {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "phone": self.phone,
        })
    }
}

struct SessionRow {
    user_id: String,
    expires_at: DateTime<Utc>,
}

/// A server-side cart row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRow {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub quantity: Option<i64>,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
}

struct WishlistRow {
    id: String,
    user_id: String,
    product_id: String,
}

#[derive(Default)]
struct FakeDb {
    categories: Vec<Value>,
    products: Vec<Value>,
    users: Vec<UserRow>,
    sessions: HashMap<String, SessionRow>,
    addresses: Vec<Value>,
    wishlist: Vec<WishlistRow>,
    cart: Vec<CartRow>,
    /// Newest first.
    orders: Vec<Value>,
    fail_orders: bool,
    requests: Vec<String>,
}

impl FakeDb {
    fn seeded() -> Self {
        Self {
            categories: vec![
                json!({
                    "id": CLOTHING,
                    "name": "Clothing",
                    "nameAr": "ملابس",
                    "icon": "shirt",
                    "image": "https://cdn.example.sd/categories/clothing.jpg",
                    "productCount": 2,
                }),
                json!({
                    "id": PERFUME,
                    "name": "Perfume",
                    "nameAr": "عطور",
                    "icon": null,
                    "image": null,
                    "productCount": null,
                }),
            ],
            products: vec![
                json!({
                    "id": JALABIYA,
                    "name": "White Jalabiya",
                    "nameAr": "جلابية بيضاء",
                    "description": "Cotton jalabiya",
                    "descriptionAr": "جلابية قطن",
                    "price": "12.50",
                    "originalPrice": null,
                    "images": ["https://cdn.example.sd/products/jalabiya.jpg"],
                    "categoryId": CLOTHING,
                    "rating": "4.5",
                    "reviewCount": 12,
                    "variants": {
                        "sizes": ["S", "M", "L"],
                        "colors": [{ "name": "White", "value": "#FFFFFF" }],
                    },
                    "inStock": true,
                    "sellerId": "seller-omdurman",
                    "sellerName": "Omdurman Textiles",
                }),
                json!({
                    "id": TOUB,
                    "name": "Sudanese Toub",
                    "nameAr": "توب سوداني",
                    "description": "Hand-dyed toub",
                    "descriptionAr": "توب مصبوغ يدويا",
                    "price": "25.00",
                    "originalPrice": "30.00",
                    "images": ["https://cdn.example.sd/products/toub.jpg"],
                    "categoryId": CLOTHING,
                    "rating": "4.8",
                    "reviewCount": 31,
                    "variants": null,
                    "inStock": true,
                    "sellerId": "seller-omdurman",
                    "sellerName": "Omdurman Textiles",
                }),
                json!({
                    "id": BAKHOOR,
                    "name": "Bakhoor",
                    "nameAr": "بخور",
                    "description": "Sandalwood incense",
                    "descriptionAr": "بخور صندل",
                    "price": "4.75",
                    "originalPrice": null,
                    "images": null,
                    "categoryId": PERFUME,
                    "rating": null,
                    "reviewCount": null,
                    "variants": null,
                    "inStock": false,
                    "sellerId": null,
                    "sellerName": null,
                }),
            ],
            ..Self::default()
        }
    }

    /// User id for a valid, unexpired bearer token. Expired sessions are
    /// deleted on sight.
    fn authenticate(&mut self, headers: &HeaderMap) -> Option<String> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let expires_at = self.sessions.get(token)?.expires_at;
        if expires_at < Utc::now() {
            self.sessions.remove(token);
            return None;
        }
        self.sessions.get(token).map(|s| s.user_id.clone())
    }

    fn open_session(&mut self, user_id: &str) -> String {
        let token = generate_token();
        self.sessions.insert(
            token.clone(),
            SessionRow {
                user_id: user_id.to_string(),
                expires_at: Utc::now() + Duration::days(SESSION_DAYS),
            },
        );
        token
    }

    fn product(&self, id: &str) -> Option<&Value> {
        self.products.iter().find(|p| p["id"] == id)
    }

    fn user(&self, id: &str) -> Option<&UserRow> {
        self.users.iter().find(|u| u.id == id)
    }

    fn insert_user(&mut self, name: &str, email: &str, phone: Option<&str>, password: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.users.push(UserRow {
            id: id.clone(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.map(ToString::to_string),
            password_hash: hash_password(password),
        });
        id
    }
}

fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().fold(String::with_capacity(64), |mut token, b| {
        let _ = write!(token, "{b:02x}");
        token
    })
}

fn lock(db: &Shared) -> MutexGuard<'_, FakeDb> {
    db.lock().unwrap_or_else(PoisonError::into_inner)
}

fn ok(body: Value) -> Reply {
    (StatusCode::OK, Json(body))
}

fn error(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "error": message })))
}

fn unauthorized() -> Reply {
    error(StatusCode::UNAUTHORIZED, UNAUTHORIZED)
}

/// Validation failures carry a list of issues rather than a message.
fn invalid(field: &str) -> Reply {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": [{ "path": [field], "message": "Required" }] })),
    )
}

fn text<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

// =============================================================================
// Router
// =============================================================================

fn router(db: Shared) -> Router {
    let api = Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{id}", get(get_category))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .route("/addresses", get(list_addresses).post(add_address))
        .route("/addresses/{id}", delete(delete_address))
        .route("/wishlist", get(list_wishlist))
        .route("/wishlist/{product_id}", post(toggle_wishlist))
        .route("/cart", get(list_cart).post(add_to_cart).delete(clear_cart))
        .route("/cart/{id}", put(update_cart_item).delete(remove_cart_item))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(Arc::clone(&db), record))
        .with_state(db)
}

/// Log `METHOD /path` of every request for later assertions.
async fn record(State(db): State<Shared>, request: Request, next: Next) -> Response {
    let line = format!("{} {}", request.method(), request.uri().path());
    lock(&db).requests.push(line);
    next.run(request).await
}

// =============================================================================
// Catalog
// =============================================================================

async fn list_categories(State(db): State<Shared>) -> Reply {
    ok(Value::Array(lock(&db).categories.clone()))
}

async fn get_category(State(db): State<Shared>, Path(id): Path<String>) -> Reply {
    lock(&db)
        .categories
        .iter()
        .find(|c| c["id"] == id.as_str())
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "Category not found"),
            |c| ok(c.clone()),
        )
}

async fn list_products(
    State(db): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let db = lock(&db);
    let search = params.get("search").map(|s| s.to_lowercase());
    let limit = params
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(usize::MAX);

    let products: Vec<Value> = db
        .products
        .iter()
        .filter(|p| {
            params
                .get("categoryId")
                .is_none_or(|category| p["categoryId"] == category.as_str())
        })
        .filter(|p| {
            search.as_deref().is_none_or(|term| {
                ["name", "nameAr", "description"].iter().any(|field| {
                    p[*field]
                        .as_str()
                        .is_some_and(|value| value.to_lowercase().contains(term))
                })
            })
        })
        .take(limit)
        .cloned()
        .collect();
    ok(Value::Array(products))
}

async fn get_product(State(db): State<Shared>, Path(id): Path<String>) -> Reply {
    lock(&db).product(&id).map_or_else(
        || error(StatusCode::NOT_FOUND, "Product not found"),
        |p| ok(p.clone()),
    )
}

// =============================================================================
// Auth
// =============================================================================

async fn register(State(db): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut db = lock(&db);
    let Some(name) = text(&body, "name") else {
        return invalid("name");
    };
    let Some(email) = text(&body, "email") else {
        return invalid("email");
    };
    let Some(password) = text(&body, "password").filter(|p| p.chars().count() >= 6) else {
        return invalid("password");
    };
    if db.users.iter().any(|u| u.email == email) {
        return error(StatusCode::BAD_REQUEST, "البريد الإلكتروني مستخدم بالفعل");
    }

    let user_id = db.insert_user(name, email, text(&body, "phone"), password);
    let token = db.open_session(&user_id);
    let user = db.user(&user_id).map(UserRow::to_json);
    ok(json!({ "user": user, "token": token }))
}

async fn login(State(db): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut db = lock(&db);
    let (Some(email), Some(password)) = (text(&body, "email"), text(&body, "password")) else {
        return invalid("email");
    };
    let hash = hash_password(password);
    let Some(user) = db
        .users
        .iter()
        .find(|u| u.email == email && u.password_hash == hash)
    else {
        return error(
            StatusCode::UNAUTHORIZED,
            "البريد الإلكتروني أو كلمة المرور غير صحيحة",
        );
    };

    let (user_id, user_json) = (user.id.clone(), user.to_json());
    let token = db.open_session(&user_id);
    ok(json!({ "user": user_json, "token": token }))
}

async fn me(State(db): State<Shared>, headers: HeaderMap) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    db.user(&user_id).map_or_else(
        || error(StatusCode::NOT_FOUND, "المستخدم غير موجود"),
        |u| ok(u.to_json()),
    )
}

async fn logout(State(db): State<Shared>, headers: HeaderMap) -> Reply {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));
    if let Some(token) = token {
        lock(&db).sessions.remove(token);
    }
    ok(json!({ "success": true }))
}

// =============================================================================
// Addresses
// =============================================================================

async fn list_addresses(State(db): State<Shared>, headers: HeaderMap) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    let addresses = db
        .addresses
        .iter()
        .filter(|a| a["userId"] == user_id.as_str())
        .cloned()
        .collect();
    ok(Value::Array(addresses))
}

async fn add_address(
    State(db): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    for field in ["label", "fullName", "phone", "area", "block", "street", "building"] {
        if text(&body, field).is_none() {
            return invalid(field);
        }
    }

    let is_default = body["isDefault"].as_bool().unwrap_or(false);
    if is_default {
        for address in db.addresses.iter_mut().filter(|a| a["userId"] == user_id.as_str()) {
            address["isDefault"] = json!(false);
        }
    }

    let address = json!({
        "id": Uuid::new_v4().to_string(),
        "userId": user_id,
        "label": body["label"],
        "fullName": body["fullName"],
        "phone": body["phone"],
        "area": body["area"],
        "block": body["block"],
        "street": body["street"],
        "building": body["building"],
        "floor": body.get("floor").cloned().unwrap_or(Value::Null),
        "apartment": body.get("apartment").cloned().unwrap_or(Value::Null),
        "notes": body.get("notes").cloned().unwrap_or(Value::Null),
        "isDefault": is_default,
        "createdAt": Utc::now(),
    });
    db.addresses.push(address.clone());
    ok(address)
}

async fn delete_address(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    db.addresses
        .retain(|a| !(a["id"] == id.as_str() && a["userId"] == user_id.as_str()));
    ok(json!({ "success": true }))
}

// =============================================================================
// Wishlist
// =============================================================================

async fn list_wishlist(State(db): State<Shared>, headers: HeaderMap) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    let rows = db
        .wishlist
        .iter()
        .filter(|w| w.user_id == user_id)
        .map(|w| {
            json!({
                "id": w.id,
                "productId": w.product_id,
                "product": db.product(&w.product_id),
            })
        })
        .collect();
    ok(Value::Array(rows))
}

async fn toggle_wishlist(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    let before = db.wishlist.len();
    db.wishlist
        .retain(|w| !(w.user_id == user_id && w.product_id == product_id));
    if db.wishlist.len() < before {
        return ok(json!({ "added": false }));
    }

    db.wishlist.push(WishlistRow {
        id: Uuid::new_v4().to_string(),
        user_id,
        product_id,
    });
    ok(json!({ "added": true }))
}

// =============================================================================
// Cart
// =============================================================================

async fn list_cart(State(db): State<Shared>, headers: HeaderMap) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    let rows = db
        .cart
        .iter()
        .filter(|row| row.user_id == user_id)
        .map(|row| {
            json!({
                "id": row.id,
                "quantity": row.quantity,
                "selectedSize": row.selected_size,
                "selectedColor": row.selected_color,
                "product": db.product(&row.product_id),
            })
        })
        .collect();
    ok(Value::Array(rows))
}

/// Adds to an existing row for the same product. A size or color only
/// narrows the match when the request names one.
async fn add_to_cart(
    State(db): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    let Some(product_id) = text(&body, "productId").map(ToString::to_string) else {
        return invalid("productId");
    };
    let quantity = body["quantity"].as_i64().unwrap_or(1);
    let size = text(&body, "selectedSize").map(ToString::to_string);
    let color = text(&body, "selectedColor").map(ToString::to_string);

    let existing = db.cart.iter_mut().find(|row| {
        row.user_id == user_id
            && row.product_id == product_id
            && size.as_ref().is_none_or(|s| row.selected_size.as_ref() == Some(s))
            && color.as_ref().is_none_or(|c| row.selected_color.as_ref() == Some(c))
    });
    if let Some(row) = existing {
        row.quantity = Some(row.quantity.unwrap_or(0) + quantity);
    } else {
        db.cart.push(CartRow {
            id: Uuid::new_v4().to_string(),
            user_id,
            product_id,
            quantity: Some(quantity),
            selected_size: size,
            selected_color: color,
        });
    }
    ok(json!({ "success": true }))
}

async fn update_cart_item(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    let quantity = body["quantity"].as_i64().unwrap_or(0);
    if quantity <= 0 {
        db.cart.retain(|row| !(row.id == id && row.user_id == user_id));
    } else if let Some(row) = db
        .cart
        .iter_mut()
        .find(|row| row.id == id && row.user_id == user_id)
    {
        row.quantity = Some(quantity);
    }
    ok(json!({ "success": true }))
}

async fn remove_cart_item(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    db.cart.retain(|row| !(row.id == id && row.user_id == user_id));
    ok(json!({ "success": true }))
}

async fn clear_cart(State(db): State<Shared>, headers: HeaderMap) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    db.cart.retain(|row| row.user_id != user_id);
    ok(json!({ "success": true }))
}

// =============================================================================
// Orders
// =============================================================================

async fn list_orders(State(db): State<Shared>, headers: HeaderMap) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    let orders = db
        .orders
        .iter()
        .filter(|o| o["userId"] == user_id.as_str())
        .cloned()
        .collect();
    ok(Value::Array(orders))
}

async fn get_order(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    db.orders
        .iter()
        .find(|o| o["id"] == id.as_str() && o["userId"] == user_id.as_str())
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "الطلب غير موجود"),
            |o| ok(o.clone()),
        )
}

async fn create_order(
    State(db): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&db);
    let Some(user_id) = db.authenticate(&headers) else {
        return unauthorized();
    };
    if db.fail_orders {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "فشل في إنشاء الطلب");
    }

    let now = Utc::now();
    let order = json!({
        "id": Uuid::new_v4().to_string(),
        "userId": user_id,
        "items": body["items"],
        "total": body["total"],
        "deliveryFee": body["deliveryFee"],
        "addressId": body.get("addressId").cloned().unwrap_or(Value::Null),
        "addressSnapshot": body["addressSnapshot"],
        "status": "pending",
        "estimatedDelivery": now + Duration::days(3),
        "createdAt": now,
    });
    db.orders.insert(0, order.clone());
    db.cart.retain(|row| row.user_id != user_id);
    ok(order)
}

// =============================================================================
// FakeApi
// =============================================================================

/// In-process bazaar API bound to `127.0.0.1` on a random port.
///
/// The server task is aborted when the handle is dropped.
pub struct FakeApi {
    addr: SocketAddr,
    db: Shared,
    server: JoinHandle<()>,
}

impl FakeApi {
    /// Bind and start serving the seeded catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn spawn() -> std::io::Result<Self> {
        let db: Shared = Arc::new(Mutex::new(FakeDb::seeded()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let app = router(Arc::clone(&db));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, db, server })
    }

    /// `http://127.0.0.1:<port>`
    #[must_use]
    pub fn origin(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("socket address is a valid origin")
    }

    #[must_use]
    pub fn config(&self, state_path: PathBuf) -> ClientConfig {
        ClientConfig::for_origin(self.origin(), state_path)
    }

    /// A client restored from `state_path` (fresh if the file is missing).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the state file
    /// is unreadable.
    pub fn bazaar(&self, state_path: PathBuf) -> bazaar_client::Result<Bazaar> {
        Bazaar::from_config(&self.config(state_path))
    }

    // -------------------------------------------------------------------------
    // Seeding
    // -------------------------------------------------------------------------

    /// Create an account. Returns the user id.
    pub fn seed_user(&self, name: &str, email: &str, password: &str) -> String {
        lock(&self.db).insert_user(name, email, None, password)
    }

    /// Insert a raw cart row, bypassing merge rules.
    pub fn seed_cart_row(&self, user_id: &str, product_id: &str, quantity: Option<i64>) -> String {
        let id = Uuid::new_v4().to_string();
        lock(&self.db).cart.push(CartRow {
            id: id.clone(),
            user_id: user_id.to_string(),
            product_id: product_id.to_string(),
            quantity,
            selected_size: None,
            selected_color: None,
        });
        id
    }

    pub fn seed_wishlist(&self, user_id: &str, product_id: &str) {
        lock(&self.db).wishlist.push(WishlistRow {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            product_id: product_id.to_string(),
        });
    }

    /// Insert an address in Salmiya. Returns its id.
    pub fn seed_address(&self, user_id: &str, label: &str, is_default: bool) -> String {
        let id = Uuid::new_v4().to_string();
        lock(&self.db).addresses.push(json!({
            "id": id,
            "userId": user_id,
            "label": label,
            "fullName": "Amna Osman",
            "phone": "+965 5000 0001",
            "area": "Salmiya",
            "block": "4",
            "street": "12",
            "building": "7",
            "floor": null,
            "apartment": null,
            "notes": null,
            "isDefault": is_default,
            "createdAt": Utc::now(),
        }));
        id
    }

    // -------------------------------------------------------------------------
    // Fault injection
    // -------------------------------------------------------------------------

    /// Move an order along its delivery lifecycle.
    pub fn set_order_status(&self, order_id: &str, status: &str) {
        let mut db = lock(&self.db);
        if let Some(order) = db.orders.iter_mut().find(|o| o["id"] == order_id) {
            order["status"] = json!(status);
        }
    }

    /// Make `POST /orders` answer 500 until turned off.
    pub fn fail_orders(&self, fail: bool) {
        lock(&self.db).fail_orders = fail;
    }

    /// Backdate every session past its expiry.
    pub fn expire_sessions(&self) {
        let expired = Utc::now() - Duration::seconds(1);
        for session in lock(&self.db).sessions.values_mut() {
            session.expires_at = expired;
        }
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn cart_rows(&self, user_id: &str) -> Vec<CartRow> {
        lock(&self.db)
            .cart
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Product ids on the user's wishlist.
    #[must_use]
    pub fn wishlist_of(&self, user_id: &str) -> Vec<String> {
        lock(&self.db)
            .wishlist
            .iter()
            .filter(|w| w.user_id == user_id)
            .map(|w| w.product_id.clone())
            .collect()
    }

    #[must_use]
    pub fn addresses_of(&self, user_id: &str) -> Vec<Value> {
        lock(&self.db)
            .addresses
            .iter()
            .filter(|a| a["userId"] == user_id)
            .cloned()
            .collect()
    }

    /// The user's orders, newest first.
    #[must_use]
    pub fn orders_of(&self, user_id: &str) -> Vec<Value> {
        lock(&self.db)
            .orders
            .iter()
            .filter(|o| o["userId"] == user_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        lock(&self.db).sessions.len()
    }

    /// Every request received so far, as `METHOD /path`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.db).requests.clone()
    }

    /// Whether any request matched `METHOD /path` exactly.
    #[must_use]
    pub fn received(&self, request: &str) -> bool {
        lock(&self.db).requests.iter().any(|r| r == request)
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_password_hash_is_sha256_hex() {
        assert_eq!(
            hash_password("secret123"),
            "fcf730b6d95236ecd3c9fc2d92d7b6b2bb061514961aec041d6c7a7192f592e4"
        );
    }

    #[test]
    fn test_expired_session_is_deleted_on_lookup() {
        let mut db = FakeDb::seeded();
        let user_id = db.insert_user("Amna", "amna@example.sd", None, "secret123");
        let token = db.open_session(&user_id);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        assert_eq!(db.authenticate(&headers), Some(user_id));

        for session in db.sessions.values_mut() {
            session.expires_at = Utc::now() - Duration::seconds(1);
        }
        assert_eq!(db.authenticate(&headers), None);
        assert!(db.sessions.is_empty());
    }
}

//! Remote API gateway for the bazaar REST API.
//!
//! A thin request/response mapping over `reqwest`: one shared bearer token,
//! no retries, no caching, no queuing. Every non-2xx response becomes an
//! [`ApiError`] carrying the server's message, and every 2xx body is
//! converted to `bazaar_core` types before it leaves this module.

mod conversions;
mod error;
pub mod types;

use std::sync::{Arc, PoisonError, RwLock};

use bazaar_core::{
    Address, AddressId, CartItem, CartLineId, Category, CategoryId, Order, OrderId, Product,
    ProductId, User,
};
use reqwest::{Method, RequestBuilder, header};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::token::SessionToken;

pub use error::{ApiError, ErrorKind};
pub use types::{AddToCartRequest, AddressInput, CreateOrderRequest, ProductQuery};

use conversions::{
    convert_address, convert_all, convert_cart, convert_category, convert_order, convert_product,
    convert_user, convert_wishlist,
};
use types::{
    ApiAddress, ApiCartItem, ApiCategory, ApiOrder, ApiProduct, ApiUser, ApiWishlistItem,
    AuthResponse, LoginRequest, RegisterRequest, SuccessResponse, ToggleWishlistResponse,
    UpdateCartRequest,
};

/// Longest slice of a response body copied into logs.
const LOG_BODY_LIMIT: usize = 500;

/// User and token returned by login and register.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: SessionToken,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the bazaar REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and the token, so a
/// background write issued from a clone authenticates as the current session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    api_root: Url,
    token: RwLock<Option<SessionToken>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_root", &self.inner.api_root.as_str())
            .field("authenticated", &self.has_token())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the API described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. no TLS
    /// backend is available).
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                api_root: config.api_root(),
                token: RwLock::new(None),
            }),
        })
    }

    /// Replace the bearer token attached to every subsequent request.
    pub fn set_token(&self, token: Option<SessionToken>) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Whether a bearer token is currently attached.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.current_token().is_some()
    }

    /// Root URL every path is resolved against.
    #[must_use]
    pub fn api_root(&self) -> &Url {
        &self.inner.api_root
    }

    fn current_token(&self) -> Option<SessionToken> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve path segments under the API root. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.api_root.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Endpoint(self.inner.api_root.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json");

        match self.current_token() {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    /// Send a request and decode its JSON body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Read as text first so failures can be logged with the body
        let body = response.text().await?;

        if !status.is_success() {
            debug!(
                status = %status,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "API returned non-success status"
            );
            return Err(ApiError::from_response(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Decode(e)
        })
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        self.execute(self.request(Method::GET, url)).await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), ApiError> {
        let url = self.endpoint(segments)?;
        let _: SuccessResponse = self.execute(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// List every category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a row cannot be converted.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>, ApiError> {
        let rows: Vec<ApiCategory> = self.get(&["categories"]).await?;
        convert_all(rows, convert_category)
    }

    /// Get one category.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound`-kind error for an unknown id.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn get_category(&self, id: &CategoryId) -> Result<Category, ApiError> {
        let row: ApiCategory = self.get(&["categories", id.as_str()]).await?;
        convert_category(row)
    }

    /// List products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a row cannot be converted.
    #[instrument(skip(self))]
    pub async fn get_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let mut url = self.endpoint(&["products"])?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        let rows: Vec<ApiProduct> = self.execute(self.request(Method::GET, url)).await?;
        convert_all(rows, convert_product)
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound`-kind error for an unknown id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let row: ApiProduct = self.get(&["products", id.as_str()]).await?;
        convert_product(row)
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Create an account and open a session.
    ///
    /// # Errors
    ///
    /// Returns a `Validation`-kind error if the email is taken or the input
    /// is rejected.
    #[instrument(skip(self, name, phone, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        password: &SecretString,
    ) -> Result<AuthSession, ApiError> {
        let url = self.endpoint(&["auth", "register"])?;
        let body = RegisterRequest {
            name,
            email,
            phone,
            password: password.expose_secret(),
        };
        let response: AuthResponse = self
            .execute(self.request(Method::POST, url).json(&body))
            .await?;
        Ok(auth_session(response))
    }

    /// Open a session with email and password.
    ///
    /// # Errors
    ///
    /// Returns an `Unauthorized`-kind error for bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthSession, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let response: AuthResponse = self
            .execute(self.request(Method::POST, url).json(&body))
            .await?;
        Ok(auth_session(response))
    }

    /// Fetch the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an `Unauthorized`-kind error if the token is missing or
    /// expired.
    #[instrument(skip(self))]
    pub async fn get_me(&self) -> Result<User, ApiError> {
        let user: ApiUser = self.get(&["auth", "me"]).await?;
        Ok(convert_user(user))
    }

    /// Invalidate the current token server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let url = self.endpoint(&["auth", "logout"])?;
        let _: SuccessResponse = self.execute(self.request(Method::POST, url)).await?;
        Ok(())
    }

    // =========================================================================
    // Address Methods
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_addresses(&self) -> Result<Vec<Address>, ApiError> {
        let rows: Vec<ApiAddress> = self.get(&["addresses"]).await?;
        Ok(rows.into_iter().map(convert_address).collect())
    }

    /// Save an address; a default address clears the flag on the others.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the input is rejected.
    #[instrument(skip(self, address), fields(label = %address.label, is_default = address.is_default))]
    pub async fn add_address(&self, address: &AddressInput) -> Result<Address, ApiError> {
        let url = self.endpoint(&["addresses"])?;
        let row: ApiAddress = self
            .execute(self.request(Method::POST, url).json(address))
            .await?;
        Ok(convert_address(row))
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn delete_address(&self, id: &AddressId) -> Result<(), ApiError> {
        self.delete(&["addresses", id.as_str()]).await
    }

    // =========================================================================
    // Wishlist Methods
    // =========================================================================

    /// Wishlisted product ids in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_wishlist(&self) -> Result<Vec<ProductId>, ApiError> {
        let rows: Vec<ApiWishlistItem> = self.get(&["wishlist"]).await?;
        Ok(convert_wishlist(rows))
    }

    /// Flip membership; returns `true` if the product is now wishlisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn toggle_wishlist(&self, product_id: &ProductId) -> Result<bool, ApiError> {
        let url = self.endpoint(&["wishlist", product_id.as_str()])?;
        let response: ToggleWishlistResponse =
            self.execute(self.request(Method::POST, url)).await?;
        Ok(response.added)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails or a line cannot be converted.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Vec<CartItem>, ApiError> {
        let rows: Vec<ApiCartItem> = self.get(&["cart"]).await?;
        convert_cart(rows)
    }

    /// Add units to a line; the server merges on product and variants.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, item), fields(product_id = %item.product_id, quantity = item.quantity))]
    pub async fn add_to_cart(&self, item: &AddToCartRequest) -> Result<(), ApiError> {
        let url = self.endpoint(&["cart"])?;
        let _: SuccessResponse = self
            .execute(self.request(Method::POST, url).json(item))
            .await?;
        Ok(())
    }

    /// Set a line's quantity; zero or less deletes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(line_id = %id))]
    pub async fn update_cart_item(&self, id: &CartLineId, quantity: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&["cart", id.as_str()])?;
        let _: SuccessResponse = self
            .execute(
                self.request(Method::PUT, url)
                    .json(&UpdateCartRequest { quantity }),
            )
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(line_id = %id))]
    pub async fn remove_cart_item(&self, id: &CartLineId) -> Result<(), ApiError> {
        self.delete(&["cart", id.as_str()]).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        self.delete(&["cart"]).await
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Orders, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or an order cannot be converted.
    #[instrument(skip(self))]
    pub async fn get_orders(&self) -> Result<Vec<Order>, ApiError> {
        let rows: Vec<ApiOrder> = self.get(&["orders"]).await?;
        convert_all(rows, convert_order)
    }

    /// # Errors
    ///
    /// Returns a `NotFound`-kind error for an unknown id.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, ApiError> {
        let row: ApiOrder = self.get(&["orders", id.as_str()]).await?;
        convert_order(row)
    }

    /// Submit an order. The server assigns id, status and delivery estimate
    /// and empties the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be
    /// converted.
    #[instrument(skip(self, order), fields(total = %order.total, items = order.items.len()))]
    pub async fn create_order(&self, order: &CreateOrderRequest) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders"])?;
        let row: ApiOrder = self
            .execute(self.request(Method::POST, url).json(order))
            .await?;
        convert_order(row)
    }
}

fn auth_session(response: AuthResponse) -> AuthSession {
    AuthSession {
        user: convert_user(response.user),
        token: SessionToken::new(response.token),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn client(origin: &str) -> ApiClient {
        let config = ClientConfig::for_origin(Url::parse(origin).unwrap(), PathBuf::from("state.json"));
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let api = client("http://localhost:5000");
        let url = api.endpoint(&["products", "p 1/2"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/products/p%201%2F2");
    }

    #[test]
    fn test_token_is_shared_between_clones() {
        let api = client("http://localhost:5000");
        let clone = api.clone();
        assert!(!clone.has_token());

        api.set_token(Some(SessionToken::new("abc")));
        assert!(clone.has_token());

        clone.set_token(None);
        assert!(!api.has_token());
    }

    #[test]
    fn test_debug_hides_token() {
        let api = client("http://localhost:5000");
        api.set_token(Some(SessionToken::new("very-secret")));
        let debug = format!("{api:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("authenticated: true"));
    }
}

//! Root composition: session state machine, synchronization and mutations.
//!
//! [`Bazaar`] owns the [`Store`], the [`ApiClient`] and the background
//! writer. Screens (or the CLI) hold a `&mut Bazaar` and call its methods;
//! nothing reaches the store any other way.
//!
//! # Session transitions
//!
//! - **Guest → Authenticated** (login/register): the guest collections are
//!   discarded, the session is stored, the token is attached to the gateway,
//!   and the four server-owned collections are pulled concurrently.
//! - **Authenticated → Guest** (logout): pending writes are settled, the
//!   server is asked to drop the token (failure ignored), and the store is
//!   reset to a blank guest session.
//! - **Forced logout**: a pull-sync or profile refresh rejected as
//!   unauthorized ends the session locally, exactly like logout but without
//!   the remote call.

use std::fmt;
use std::future::Future;

use bazaar_core::{
    Address, AddressId, CartItem, Email, Language, LineKey, Order, ProductId,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument, warn};

use crate::api::{AddToCartRequest, AddressInput, ApiClient, ApiError, AuthSession};
use crate::background::BackgroundWriter;
use crate::catalog::Catalog;
use crate::config::ClientConfig;
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::store::persist::{FileStorage, StateStorage};
use crate::store::{CartChange, Store};

/// Shortest password the server accepts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Input for account registration.
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: SecretString,
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A server-owned collection kept in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncTarget {
    Cart,
    Wishlist,
    Addresses,
    Orders,
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
            Self::Addresses => "addresses",
            Self::Orders => "orders",
        })
    }
}

/// Outcome of pulling every collection.
///
/// Each collection is applied independently: one failing leaves the others
/// synced.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub failures: Vec<(SyncTarget, AppError)>,
}

impl SyncReport {
    /// Whether every collection was synced.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether the session was ended because the token was rejected.
    #[must_use]
    pub fn session_expired(&self) -> bool {
        self.failures.iter().any(|(_, err)| err.is_unauthorized())
    }
}

// =============================================================================
// Bazaar
// =============================================================================

/// The client application state and everything that mutates it.
pub struct Bazaar {
    pub(crate) store: Store,
    pub(crate) api: ApiClient,
    pub(crate) writer: BackgroundWriter,
    storage: Box<dyn StateStorage>,
}

impl fmt::Debug for Bazaar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bazaar")
            .field("store", &self.store)
            .field("api", &self.api)
            .field("pending_writes", &self.writer.pending())
            .finish_non_exhaustive()
    }
}

impl Bazaar {
    /// A fresh guest session. Nothing is loaded from `storage`.
    #[must_use]
    pub fn new(api: ApiClient, storage: Box<dyn StateStorage>) -> Self {
        api.set_token(None);
        Self {
            store: Store::new(),
            api,
            writer: BackgroundWriter::new(),
            storage,
        }
    }

    /// Resume from the persisted state in `storage`.
    ///
    /// A restored token is attached to the gateway; call [`Bazaar::hydrate`]
    /// afterwards to re-fetch orders and refresh the other collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the saved state exists but cannot be read.
    pub fn restore(api: ApiClient, storage: Box<dyn StateStorage>) -> Result<Self> {
        let store = Store::from_persisted(storage.load()?);
        api.set_token(store.token().cloned());
        if let Some(user) = store.user() {
            set_sentry_user(&user.id, Some(&user.email));
        }
        debug!(
            authenticated = store.is_authenticated(),
            cart_lines = store.cart().len(),
            "State restored"
        );
        Ok(Self {
            store,
            api,
            writer: BackgroundWriter::new(),
            storage,
        })
    }

    /// Build the gateway and file storage from `config` and restore.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the saved
    /// state cannot be read.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api = ApiClient::new(config)?;
        let storage = FileStorage::new(config.state_path.clone());
        Self::restore(api, Box::new(storage))
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Catalog reads over the shared gateway.
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.api.clone())
    }

    #[must_use]
    pub const fn language(&self) -> Language {
        self.store.language()
    }

    /// Number of background writes not yet known to be finished.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.writer.pending()
    }

    /// Wait for every background write to finish.
    pub async fn settle(&mut self) {
        self.writer.settle().await;
    }

    /// Write the persisted subset of the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn persist(&self) -> Result<()> {
        self.storage.save(&self.store.to_persisted())?;
        Ok(())
    }

    /// Persist after a mutation. Failure is logged; the in-memory state
    /// stays authoritative.
    pub(crate) fn save_quietly(&self) {
        if let Err(e) = self.persist() {
            warn!(error = %e, "Failed to persist state");
        }
    }

    /// Mirror a mutation to the server when signed in.
    fn write_behind<F, Fut>(&mut self, operation: &'static str, write: F)
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = std::result::Result<(), ApiError>> + Send + 'static,
    {
        if self.store.is_authenticated() {
            self.writer.spawn(operation, write(self.api.clone()));
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Sign in and pull every collection.
    ///
    /// Sync failures do not fail the login; they are reported in the
    /// returned [`SyncReport`].
    ///
    /// # Errors
    ///
    /// Returns `Validation` for malformed input (no request is made) and the
    /// server's error for rejected credentials. State is unchanged on error.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &SecretString) -> Result<SyncReport> {
        let email = Email::parse(email).map_err(|e| AppError::Validation(e.to_string()))?;
        validate_password(password)?;

        let session = self.api.login(email.as_str(), password).await?;
        Ok(self.authenticate(session).await)
    }

    /// Create an account, sign in and pull every collection.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for malformed input (no request is made) and the
    /// server's error if registration is rejected. State is unchanged on
    /// error.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&mut self, input: RegisterInput) -> Result<SyncReport> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        let email = Email::parse(&input.email).map_err(|e| AppError::Validation(e.to_string()))?;
        validate_password(&input.password)?;
        let phone = input
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let session = self
            .api
            .register(name, email.as_str(), phone, &input.password)
            .await?;
        Ok(self.authenticate(session).await)
    }

    /// Enter the session and replace the guest collections with the
    /// server's. Guest cart contents are discarded, not merged.
    async fn authenticate(&mut self, session: AuthSession) -> SyncReport {
        let AuthSession { user, token } = session;
        info!(user_id = %user.id, "Signed in");
        set_sentry_user(&user.id, Some(&user.email));
        add_breadcrumb("auth", "Signed in", None);

        self.store.clear_session();
        self.store.set_session(user, token.clone());
        self.api.set_token(Some(token));
        self.save_quietly();

        self.sync_all().await
    }

    /// Sign out and reset to a blank guest session.
    ///
    /// Outstanding writes are settled first so they land under the old
    /// token. The remote logout is best effort.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) {
        if self.store.is_authenticated() {
            self.writer.settle().await;
            if let Err(e) = self.api.logout().await {
                warn!(error = %e, "Remote logout failed, clearing local session anyway");
            }
        }
        self.end_session();
        add_breadcrumb("auth", "Signed out", None);
        info!("Signed out");
    }

    /// Re-fetch the signed-in user. No-op as a guest.
    ///
    /// # Errors
    ///
    /// Returns the API error; an unauthorized response also ends the
    /// session.
    #[instrument(skip(self))]
    pub async fn refresh_user(&mut self) -> Result<()> {
        if !self.store.is_authenticated() {
            return Ok(());
        }
        match self.api.get_me().await {
            Ok(user) => {
                self.store.set_user(user);
                self.save_quietly();
                Ok(())
            }
            Err(e) => Err(self.pull_failed("user", e)),
        }
    }

    /// Startup refresh: with a restored session, pull every collection
    /// (orders are never persisted and must be re-fetched).
    #[instrument(skip(self))]
    pub async fn hydrate(&mut self) -> SyncReport {
        if !self.store.is_authenticated() {
            debug!("Guest session, nothing to hydrate");
            return SyncReport::default();
        }
        self.sync_all().await
    }

    fn end_session(&mut self) {
        self.api.set_token(None);
        self.store.clear_session();
        clear_sentry_user();
        self.save_quietly();
    }

    fn force_logout(&mut self) {
        warn!("Session token rejected, signing out");
        add_breadcrumb("auth", "Session expired", None);
        self.end_session();
    }

    // =========================================================================
    // Synchronization
    // =========================================================================

    /// Replace the cart with the server's. No-op as a guest.
    ///
    /// # Errors
    ///
    /// Returns the API error; an unauthorized response also ends the
    /// session.
    #[instrument(skip(self))]
    pub async fn sync_cart(&mut self) -> Result<()> {
        let api = self.api.clone();
        self.pull(SyncTarget::Cart, api.get_cart(), Store::replace_cart)
            .await
    }

    /// Replace the wishlist with the server's. No-op as a guest.
    ///
    /// # Errors
    ///
    /// Returns the API error; an unauthorized response also ends the
    /// session.
    #[instrument(skip(self))]
    pub async fn sync_wishlist(&mut self) -> Result<()> {
        let api = self.api.clone();
        self.pull(SyncTarget::Wishlist, api.get_wishlist(), Store::replace_wishlist)
            .await
    }

    /// Replace the address book with the server's. No-op as a guest.
    ///
    /// # Errors
    ///
    /// Returns the API error; an unauthorized response also ends the
    /// session.
    #[instrument(skip(self))]
    pub async fn sync_addresses(&mut self) -> Result<()> {
        let api = self.api.clone();
        self.pull(SyncTarget::Addresses, api.get_addresses(), Store::replace_addresses)
            .await
    }

    /// Replace the order list with the server's. No-op as a guest.
    ///
    /// # Errors
    ///
    /// Returns the API error; an unauthorized response also ends the
    /// session.
    #[instrument(skip(self))]
    pub async fn sync_orders(&mut self) -> Result<()> {
        let api = self.api.clone();
        self.pull(SyncTarget::Orders, api.get_orders(), Store::replace_orders)
            .await
    }

    /// Pull all four collections concurrently and apply each one that
    /// succeeded. No-op as a guest.
    #[instrument(skip(self))]
    pub async fn sync_all(&mut self) -> SyncReport {
        let mut report = SyncReport::default();
        if !self.store.is_authenticated() {
            return report;
        }

        let api = self.api.clone();
        let (cart, wishlist, addresses, orders) = tokio::join!(
            api.get_cart(),
            api.get_wishlist(),
            api.get_addresses(),
            api.get_orders(),
        );

        match cart {
            Ok(cart) => self.store.replace_cart(cart),
            Err(e) => report.failures.push((SyncTarget::Cart, e.into())),
        }
        match wishlist {
            Ok(wishlist) => self.store.replace_wishlist(wishlist),
            Err(e) => report.failures.push((SyncTarget::Wishlist, e.into())),
        }
        match addresses {
            Ok(addresses) => self.store.replace_addresses(addresses),
            Err(e) => report.failures.push((SyncTarget::Addresses, e.into())),
        }
        match orders {
            Ok(orders) => self.store.replace_orders(orders),
            Err(e) => report.failures.push((SyncTarget::Orders, e.into())),
        }

        for (target, error) in &report.failures {
            warn!(target = %target, error = %error, "Sync failed");
        }
        if report.session_expired() {
            self.force_logout();
        } else {
            self.save_quietly();
        }

        debug!(
            failures = report.failures.len(),
            cart_lines = self.store.cart().len(),
            orders = self.store.orders().len(),
            "Sync finished"
        );
        report
    }

    async fn pull<T, F>(&mut self, target: SyncTarget, fetch: F, apply: fn(&mut Store, T)) -> Result<()>
    where
        F: Future<Output = std::result::Result<T, ApiError>>,
    {
        if !self.store.is_authenticated() {
            debug!(target = %target, "Guest session, skipping sync");
            return Ok(());
        }
        match fetch.await {
            Ok(value) => {
                apply(&mut self.store, value);
                self.save_quietly();
                debug!(target = %target, "Synced");
                Ok(())
            }
            Err(e) => Err(self.pull_failed(target, e)),
        }
    }

    fn pull_failed(&mut self, target: impl fmt::Display, error: ApiError) -> AppError {
        warn!(target = %target, error = %error, "Sync failed");
        if error.is_unauthorized() {
            self.force_logout();
        }
        error.into()
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add to the cart, merging with a matching line.
    pub fn add_to_cart(&mut self, item: CartItem) {
        let request = AddToCartRequest::from(&item);
        if self.store.add_to_cart(item).is_none() {
            return;
        }
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", request.product_id.as_str())]),
        );
        self.write_behind("add_to_cart", move |api| async move {
            api.add_to_cart(&request).await
        });
        self.save_quietly();
    }

    /// Remove every line of a product. Returns the removed lines.
    pub fn remove_from_cart(&mut self, product_id: &ProductId) -> Vec<CartItem> {
        let removed = self.store.remove_from_cart(product_id);
        self.delete_remote_lines(&removed);
        self.save_quietly();
        removed
    }

    /// Remove exactly one variant line.
    pub fn remove_cart_line(&mut self, key: &LineKey) -> Option<CartItem> {
        let removed = self.store.remove_cart_line(key)?;
        self.delete_remote_lines(std::slice::from_ref(&removed));
        self.save_quietly();
        Some(removed)
    }

    /// Set the quantity of a product's lines; zero or less removes them.
    pub fn update_cart_quantity(&mut self, product_id: &ProductId, quantity: i64) -> CartChange {
        let change = self.store.update_cart_quantity(product_id, quantity);
        match &change {
            CartChange::Removed(lines) => self.delete_remote_lines(lines),
            CartChange::Updated(lines) => {
                for line in lines {
                    let Some(id) = line.id.clone() else { continue };
                    let stored = i64::from(line.quantity);
                    self.write_behind("update_cart_item", move |api| async move {
                        api.update_cart_item(&id, stored).await
                    });
                }
            }
        }
        self.save_quietly();
        change
    }

    /// Empty the cart locally and on the server.
    pub fn clear_cart(&mut self) {
        self.store.clear_cart();
        self.write_behind("clear_cart", |api| async move { api.clear_cart().await });
        self.save_quietly();
    }

    /// Lines never synced have no server id and nothing to delete remotely.
    fn delete_remote_lines(&mut self, lines: &[CartItem]) {
        for id in lines.iter().filter_map(|line| line.id.clone()) {
            self.write_behind("remove_cart_item", move |api| async move {
                api.remove_cart_item(&id).await
            });
        }
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Flip wishlist membership. Returns `true` if now wishlisted.
    pub fn toggle_wishlist(&mut self, product_id: &ProductId) -> bool {
        let added = self.store.toggle_wishlist(product_id.clone());
        let id = product_id.clone();
        self.write_behind("toggle_wishlist", move |api| async move {
            api.toggle_wishlist(&id).await.map(|_| ())
        });
        self.save_quietly();
        added
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Add an address; a default one clears the flag on the others.
    pub fn add_address(&mut self, address: Address) {
        let input = AddressInput::from(&address);
        self.store.add_address(address);
        self.write_behind("add_address", move |api| async move {
            api.add_address(&input).await.map(|_| ())
        });
        self.save_quietly();
    }

    /// Remove an address by id.
    ///
    /// An address added while signed in keeps its local id until the next
    /// address sync. Its server row is then found by content once the
    /// pending add has landed, so the delete is not lost.
    pub async fn remove_address(&mut self, id: &AddressId) -> Option<Address> {
        let removed = self.store.remove_address(id)?;
        if !id.is_local() {
            let id = id.clone();
            self.write_behind("delete_address", move |api| async move {
                api.delete_address(&id).await
            });
        } else if self.store.is_authenticated() {
            self.settle().await;
            let snapshot = removed.snapshot();
            let known: Vec<AddressId> = self
                .store
                .addresses()
                .iter()
                .map(|address| address.id.clone())
                .collect();
            self.write_behind("delete_address", move |api| async move {
                let rows = api.get_addresses().await?;
                let Some(row) = rows
                    .into_iter()
                    .find(|row| !known.contains(&row.id) && row.snapshot() == snapshot)
                else {
                    debug!("No server copy of removed local address");
                    return Ok(());
                };
                api.delete_address(&row.id).await
            });
        }
        self.save_quietly();
        Some(removed)
    }

    /// Make one address the default. Local only: the API has no endpoint
    /// for it. Returns `false` if the id is unknown.
    pub fn set_default_address(&mut self, id: &AddressId) -> bool {
        let changed = self.store.set_default_address(id);
        if changed {
            self.save_quietly();
        }
        changed
    }

    // =========================================================================
    // Orders & Preferences
    // =========================================================================

    /// Record an order at the front of the list.
    pub fn add_order(&mut self, order: Order) {
        self.store.add_order(order);
    }

    pub fn set_language(&mut self, language: Language) {
        self.store.set_language(language);
        self.save_quietly();
    }
}

fn validate_password(password: &SecretString) -> Result<()> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use bazaar_core::{CategoryId, Money, Product, User, UserId};
    use rust_decimal::Decimal;
    use url::Url;

    use super::*;
    use crate::store::persist::{MemoryStorage, PersistError, PersistedState};
    use crate::token::SessionToken;

    /// Storage shared with the test so saved documents can be inspected.
    #[derive(Clone, Default)]
    struct SharedStorage(Arc<MemoryStorage>);

    impl StateStorage for SharedStorage {
        fn load(&self) -> std::result::Result<PersistedState, PersistError> {
            self.0.load()
        }

        fn save(&self, state: &PersistedState) -> std::result::Result<(), PersistError> {
            self.0.save(state)
        }
    }

    fn api() -> ApiClient {
        // Nothing listens here; only guest paths make no requests
        let config = ClientConfig::for_origin(
            Url::parse("http://127.0.0.1:9").unwrap(),
            PathBuf::from("unused.json"),
        );
        ApiClient::new(&config).unwrap()
    }

    fn product(id: &str, cents: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            name_ar: format!("منتج {id}"),
            description: String::new(),
            description_ar: String::new(),
            price: Money::from_cents(cents),
            original_price: None,
            images: vec![],
            category_id: CategoryId::new("c-1"),
            rating: Decimal::ZERO,
            review_count: 0,
            variants: None,
            in_stock: true,
            seller_id: String::new(),
            seller_name: String::new(),
        }
    }

    #[tokio::test]
    async fn test_guest_mutations_stay_local_and_persist() {
        let storage = SharedStorage::default();
        let mut bazaar = Bazaar::new(api(), Box::new(storage.clone()));

        bazaar.add_to_cart(CartItem::new(product("p-1", 1000), 2));
        assert!(bazaar.toggle_wishlist(&ProductId::new("p-1")));
        assert_eq!(bazaar.pending_writes(), 0);

        let saved = storage.load().unwrap();
        assert_eq!(saved.cart.len(), 1);
        assert_eq!(saved.wishlist, vec![ProductId::new("p-1")]);
    }

    #[tokio::test]
    async fn test_guest_sync_is_a_no_op() {
        let mut bazaar = Bazaar::new(api(), Box::new(MemoryStorage::new()));
        bazaar.add_to_cart(CartItem::new(product("p-1", 1000), 1));

        bazaar.sync_cart().await.unwrap();
        bazaar.sync_orders().await.unwrap();
        assert!(bazaar.hydrate().await.is_complete());
        assert_eq!(bazaar.store().cart().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_login_input_makes_no_request() {
        let mut bazaar = Bazaar::new(api(), Box::new(MemoryStorage::new()));

        let err = bazaar
            .login("not-an-email", &SecretString::from("secret1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = bazaar
            .login("amna@example.sd", &SecretString::from("12345".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains('6')));

        let err = bazaar
            .register(RegisterInput {
                name: "   ".to_string(),
                email: "amna@example.sd".to_string(),
                phone: None,
                password: SecretString::from("secret1".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!bazaar.store().is_authenticated());
    }

    #[test]
    fn test_restore_attaches_token() {
        let mut store = Store::new();
        store.set_session(
            User {
                id: UserId::new("u-1"),
                name: "Amna".to_string(),
                email: "amna@example.sd".to_string(),
                phone: None,
                avatar: None,
            },
            SessionToken::new("tok"),
        );
        let storage = MemoryStorage::new();
        storage.save(&store.to_persisted()).unwrap();

        let bazaar = Bazaar::restore(api(), Box::new(storage)).unwrap();
        assert!(bazaar.store().is_authenticated());
        assert!(bazaar.api().has_token());
    }

    #[test]
    fn test_set_default_address_unknown_id() {
        let mut bazaar = Bazaar::new(api(), Box::new(MemoryStorage::new()));
        assert!(!bazaar.set_default_address(&AddressId::new("nope")));
    }

    #[test]
    fn test_register_input_debug_redacts_password() {
        let input = RegisterInput {
            name: "Amna".to_string(),
            email: "amna@example.sd".to_string(),
            phone: None,
            password: SecretString::from("hunter22".to_string()),
        };
        assert!(!format!("{input:?}").contains("hunter22"));
    }
}

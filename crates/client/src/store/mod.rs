//! Local state store.
//!
//! `Store` is the single in-process owner of the session, cart, wishlist,
//! address book, orders and display language. Every mutation is synchronous
//! and atomic; derived values (`cart_total`, `cart_item_count`) are computed
//! on read. The store does no I/O: remote writes and persistence are driven
//! by [`crate::Bazaar`].

pub mod persist;

use bazaar_core::{Address, AddressId, CartItem, Language, LineKey, Money, Order, ProductId, User};

use crate::token::SessionToken;
use persist::{CURRENT_VERSION, PersistedState};

/// Result of [`Store::update_cart_quantity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    /// Quantity was zero or less; these lines were removed.
    Removed(Vec<CartItem>),
    /// These lines now carry the new quantity.
    Updated(Vec<CartItem>),
}

impl CartChange {
    /// Lines affected by the change.
    #[must_use]
    pub fn lines(&self) -> &[CartItem] {
        match self {
            Self::Removed(lines) | Self::Updated(lines) => lines,
        }
    }
}

/// Client-side application state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Store {
    user: Option<User>,
    token: Option<SessionToken>,
    cart: Vec<CartItem>,
    wishlist: Vec<ProductId>,
    addresses: Vec<Address>,
    /// Most recent first.
    orders: Vec<Order>,
    language: Language,
}

impl Store {
    /// Empty guest state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Whether a session token is held. No token means guest mode.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    /// Wishlisted product ids in insertion order.
    #[must_use]
    pub fn wishlist(&self) -> &[ProductId] {
        &self.wishlist
    }

    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Orders, most recent first.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Enter an authenticated session.
    pub fn set_session(&mut self, user: User, token: SessionToken) {
        self.user = Some(user);
        self.token = Some(token);
    }

    /// Replace the user record, e.g. after a profile refresh.
    pub fn set_user(&mut self, user: User) {
        self.user = Some(user);
    }

    /// Return to a blank guest session.
    ///
    /// Clears the token, user and every server-owned collection. The display
    /// language is a device preference and survives.
    pub fn clear_session(&mut self) {
        let language = self.language;
        *self = Self {
            language,
            ..Self::default()
        };
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add `item` to the cart, merging into an existing line with the same
    /// product, size and color.
    ///
    /// Returns the resulting line, or `None` if `item.quantity` is zero.
    pub fn add_to_cart(&mut self, item: CartItem) -> Option<&CartItem> {
        if item.quantity == 0 {
            return None;
        }
        let key = item.line_key();
        if let Some(index) = self.cart.iter().position(|line| line.matches(&key)) {
            let line = self.cart.get_mut(index)?;
            line.quantity = line.quantity.saturating_add(item.quantity);
            return Some(&*line);
        }
        self.cart.push(item);
        self.cart.last()
    }

    /// Remove every line of `product_id`, whatever its variant.
    ///
    /// Returns the removed lines.
    pub fn remove_from_cart(&mut self, product_id: &ProductId) -> Vec<CartItem> {
        let (removed, kept): (Vec<CartItem>, Vec<CartItem>) = std::mem::take(&mut self.cart)
            .into_iter()
            .partition(|line| &line.product.id == product_id);
        self.cart = kept;
        removed
    }

    /// Remove exactly the line identified by `key`.
    pub fn remove_cart_line(&mut self, key: &LineKey) -> Option<CartItem> {
        let index = self.cart.iter().position(|line| line.matches(key))?;
        Some(self.cart.remove(index))
    }

    /// Set the quantity of every line of `product_id`.
    ///
    /// A quantity of zero or less removes the lines, exactly like
    /// [`Store::remove_from_cart`].
    pub fn update_cart_quantity(&mut self, product_id: &ProductId, quantity: i64) -> CartChange {
        if quantity <= 0 {
            return CartChange::Removed(self.remove_from_cart(product_id));
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let updated = self
            .cart
            .iter_mut()
            .filter(|line| &line.product.id == product_id)
            .map(|line| {
                line.quantity = quantity;
                line.clone()
            })
            .collect();
        CartChange::Updated(updated)
    }

    /// Empty the cart, returning the removed lines.
    pub fn clear_cart(&mut self) -> Vec<CartItem> {
        std::mem::take(&mut self.cart)
    }

    /// Replace the cart wholesale with the server's version.
    pub fn replace_cart(&mut self, cart: Vec<CartItem>) {
        self.cart = cart;
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn cart_total(&self) -> Money {
        self.cart.iter().map(CartItem::line_total).sum()
    }

    /// Total units across all lines, saturating at `u32::MAX`.
    #[must_use]
    pub fn cart_item_count(&self) -> u32 {
        self.cart
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity))
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Flip membership. Returns `true` if the product is now wishlisted.
    pub fn toggle_wishlist(&mut self, product_id: ProductId) -> bool {
        if let Some(index) = self.wishlist.iter().position(|id| *id == product_id) {
            self.wishlist.remove(index);
            false
        } else {
            self.wishlist.push(product_id);
            true
        }
    }

    #[must_use]
    pub fn is_in_wishlist(&self, product_id: &ProductId) -> bool {
        self.wishlist.contains(product_id)
    }

    pub fn replace_wishlist(&mut self, wishlist: Vec<ProductId>) {
        self.wishlist = wishlist;
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Append an address. A default address clears the flag on all others.
    pub fn add_address(&mut self, address: Address) {
        if address.is_default {
            for existing in &mut self.addresses {
                existing.is_default = false;
            }
        }
        self.addresses.push(address);
    }

    /// Remove an address by id.
    pub fn remove_address(&mut self, id: &AddressId) -> Option<Address> {
        let index = self.addresses.iter().position(|a| &a.id == id)?;
        Some(self.addresses.remove(index))
    }

    /// Make `id` the only default address.
    ///
    /// Returns `false`, leaving every flag untouched, if no address has
    /// that id.
    pub fn set_default_address(&mut self, id: &AddressId) -> bool {
        if !self.addresses.iter().any(|a| &a.id == id) {
            return false;
        }
        for address in &mut self.addresses {
            address.is_default = &address.id == id;
        }
        true
    }

    /// The flagged default address, else the first one.
    #[must_use]
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| self.addresses.first())
    }

    #[must_use]
    pub fn address(&self, id: &AddressId) -> Option<&Address> {
        self.addresses.iter().find(|a| &a.id == id)
    }

    /// Replace the address book with the server's version.
    ///
    /// The server enforces a single default, but if two rows still claim it
    /// only the first keeps the flag.
    pub fn replace_addresses(&mut self, addresses: Vec<Address>) {
        self.addresses = addresses;
        let mut seen_default = false;
        for address in &mut self.addresses {
            if address.is_default {
                address.is_default = !seen_default;
                seen_default = true;
            }
        }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Record a new order at the front of the list.
    pub fn add_order(&mut self, order: Order) {
        self.orders.insert(0, order);
    }

    pub fn replace_orders(&mut self, orders: Vec<Order>) {
        self.orders = orders;
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    pub const fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// The persisted subset. Orders are deliberately absent.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            version: CURRENT_VERSION,
            user: self.user.clone(),
            token: self.token.clone(),
            cart: self.cart.clone(),
            wishlist: self.wishlist.clone(),
            addresses: self.addresses.clone(),
            language: self.language,
        }
    }

    /// Rebuild a store from its persisted subset. Orders start empty.
    #[must_use]
    pub fn from_persisted(state: PersistedState) -> Self {
        let mut store = Self {
            user: state.user,
            token: state.token,
            cart: state.cart.into_iter().filter(|line| line.quantity > 0).collect(),
            wishlist: Vec::new(),
            addresses: Vec::new(),
            orders: Vec::new(),
            language: state.language,
        };
        // A token without a user (or the reverse) is not a usable session
        if store.user.is_none() || store.token.is_none() {
            store.user = None;
            store.token = None;
        }
        for id in state.wishlist {
            if !store.wishlist.contains(&id) {
                store.wishlist.push(id);
            }
        }
        store.replace_addresses(state.addresses);
        store
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use bazaar_core::{CategoryId, OrderId, OrderItem, OrderStatus, Product, UserId};
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::*;

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

    fn address(id: &str, is_default: bool) -> Address {
        Address {
            id: AddressId::new(id),
            label: "Home".to_string(),
            full_name: "Amna Osman".to_string(),
            phone: "+965 5000 0000".to_string(),
            area: "Salmiya".to_string(),
            block: "4".to_string(),
            street: "12".to_string(),
            building: "7".to_string(),
            floor: None,
            apartment: None,
            notes: None,
            is_default,
        }
    }

    fn order(id: &str) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(id),
            items: vec![OrderItem::from(&CartItem::new(product("p-1", 1000), 1))],
            total: Money::from_cents(1200),
            delivery_fee: Money::from_cents(200),
            status: OrderStatus::Pending,
            address_id: None,
            address: address("a-1", true).snapshot(),
            created_at: now,
            estimated_delivery: Some(Order::estimate_delivery(now)),
        }
    }

    fn signed_in() -> Store {
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
        store
    }

    #[test]
    fn test_add_to_cart_merges_matching_lines() {
        let mut store = Store::new();
        store.add_to_cart(CartItem::new(product("p-1", 1000), 1).with_size("M"));
        store.add_to_cart(CartItem::new(product("p-1", 1000), 2).with_size("M"));
        store.add_to_cart(CartItem::new(product("p-1", 1000), 1).with_size("L"));

        assert_eq!(store.cart().len(), 2);
        assert_eq!(store.cart()[0].quantity, 3);
        assert_eq!(store.cart()[1].selected_size.as_deref(), Some("L"));
        assert_eq!(store.cart_item_count(), 4);
    }

    #[test]
    fn test_add_zero_quantity_is_ignored() {
        let mut store = Store::new();
        assert!(store.add_to_cart(CartItem::new(product("p-1", 1000), 0)).is_none());
        assert!(store.cart().is_empty());
    }

    #[test]
    fn test_cart_total_is_recomputed() {
        let mut store = Store::new();
        store.add_to_cart(CartItem::new(product("p-1", 1000), 2));
        store.add_to_cart(CartItem::new(product("p-2", 500), 1));
        assert_eq!(store.cart_total(), Money::from_cents(2500));

        store.update_cart_quantity(&ProductId::new("p-2"), 3);
        assert_eq!(store.cart_total(), Money::from_cents(3500));

        store.clear_cart();
        assert_eq!(store.cart_total(), Money::ZERO);
        assert_eq!(store.cart_item_count(), 0);
    }

    #[test]
    fn test_remove_from_cart_removes_every_variant() {
        let mut store = Store::new();
        store.add_to_cart(CartItem::new(product("p-1", 1000), 1).with_color("Red"));
        store.add_to_cart(CartItem::new(product("p-1", 1000), 1).with_color("Blue"));
        store.add_to_cart(CartItem::new(product("p-2", 500), 1));

        let removed = store.remove_from_cart(&ProductId::new("p-1"));
        assert_eq!(removed.len(), 2);
        assert_eq!(store.cart().len(), 1);
        assert_eq!(store.cart()[0].product.id, ProductId::new("p-2"));
    }

    #[test]
    fn test_remove_cart_line_is_variant_precise() {
        let mut store = Store::new();
        store.add_to_cart(CartItem::new(product("p-1", 1000), 1).with_color("Red"));
        store.add_to_cart(CartItem::new(product("p-1", 1000), 1).with_color("Blue"));

        let key = LineKey {
            product_id: ProductId::new("p-1"),
            selected_size: None,
            selected_color: Some("Blue".to_string()),
        };
        let removed = store.remove_cart_line(&key).unwrap();
        assert_eq!(removed.selected_color.as_deref(), Some("Blue"));
        assert_eq!(store.cart().len(), 1);
        assert!(store.remove_cart_line(&key).is_none());
    }

    #[test]
    fn test_update_to_zero_equals_remove() {
        let mut a = Store::new();
        a.add_to_cart(CartItem::new(product("p-1", 1000), 2));
        a.add_to_cart(CartItem::new(product("p-2", 500), 1));
        let mut b = a.clone();

        let change = a.update_cart_quantity(&ProductId::new("p-1"), 0);
        let removed = b.remove_from_cart(&ProductId::new("p-1"));
        assert_eq!(change, CartChange::Removed(removed));
        assert_eq!(a, b);

        let change = a.update_cart_quantity(&ProductId::new("p-2"), -4);
        assert!(matches!(change, CartChange::Removed(lines) if lines.len() == 1));
        assert!(a.cart().is_empty());
    }

    #[test]
    fn test_item_count_saturates_across_variant_lines() {
        let mut store = Store::new();
        store.add_to_cart(CartItem::new(product("p-1", 1000), 1).with_size("M"));
        store.add_to_cart(CartItem::new(product("p-1", 1000), 1).with_size("L"));

        store.update_cart_quantity(&ProductId::new("p-1"), 3_000_000_000);

        assert!(store.cart().iter().all(|line| line.quantity == 3_000_000_000));
        assert_eq!(store.cart_item_count(), u32::MAX);
    }

    #[test]
    fn test_wishlist_toggle() {
        let mut store = Store::new();
        assert!(store.toggle_wishlist(ProductId::new("p-1")));
        assert!(store.toggle_wishlist(ProductId::new("p-2")));
        assert!(store.is_in_wishlist(&ProductId::new("p-1")));
        assert!(!store.toggle_wishlist(ProductId::new("p-1")));
        assert_eq!(store.wishlist(), &[ProductId::new("p-2")]);
    }

    #[test]
    fn test_default_address_is_unique() {
        let mut store = Store::new();
        store.add_address(address("a-1", true));
        store.add_address(address("a-2", true));
        assert!(!store.addresses()[0].is_default);
        assert!(store.addresses()[1].is_default);

        assert!(store.set_default_address(&AddressId::new("a-1")));
        assert!(store.addresses()[0].is_default);
        assert!(!store.addresses()[1].is_default);
        assert_eq!(store.default_address().unwrap().id, AddressId::new("a-1"));

        assert!(!store.set_default_address(&AddressId::new("missing")));
        assert!(store.addresses()[0].is_default);
    }

    #[test]
    fn test_default_address_falls_back_to_first() {
        let mut store = Store::new();
        assert!(store.default_address().is_none());
        store.add_address(address("a-1", false));
        store.add_address(address("a-2", false));
        assert_eq!(store.default_address().unwrap().id, AddressId::new("a-1"));

        assert!(store.remove_address(&AddressId::new("a-1")).is_some());
        assert_eq!(store.default_address().unwrap().id, AddressId::new("a-2"));
    }

    #[test]
    fn test_orders_are_prepended() {
        let mut store = Store::new();
        store.add_order(order("o-1"));
        store.add_order(order("o-2"));
        assert_eq!(store.orders()[0].id, OrderId::new("o-2"));
        assert_eq!(store.orders()[1].id, OrderId::new("o-1"));
    }

    #[test]
    fn test_clear_session_resets_everything_but_language() {
        let mut store = signed_in();
        store.set_language(Language::En);
        store.add_to_cart(CartItem::new(product("p-1", 1000), 1));
        store.toggle_wishlist(ProductId::new("p-1"));
        store.add_address(address("a-1", true));
        store.add_order(order("o-1"));

        store.clear_session();

        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        assert!(store.cart().is_empty());
        assert!(store.wishlist().is_empty());
        assert!(store.addresses().is_empty());
        assert!(store.orders().is_empty());
        assert_eq!(store.language(), Language::En);
    }

    #[test]
    fn test_persisted_round_trip_drops_orders() {
        let mut store = signed_in();
        store.add_to_cart(CartItem::new(product("p-1", 1000), 2));
        store.add_address(address("a-1", true));
        store.add_order(order("o-1"));

        let restored = Store::from_persisted(store.to_persisted());
        assert!(restored.orders().is_empty());
        assert_eq!(restored.cart(), store.cart());
        assert_eq!(restored.addresses(), store.addresses());
        assert!(restored.is_authenticated());
    }

    #[test]
    fn test_half_session_is_discarded_on_restore() {
        let state = PersistedState {
            token: Some(SessionToken::new("orphan")),
            ..PersistedState::default()
        };
        assert!(!Store::from_persisted(state).is_authenticated());
    }

    // =========================================================================
    // Properties
    // =========================================================================

    fn variant() -> impl Strategy<Value = Option<String>> {
        prop::option::of(prop::sample::select(vec!["S".to_string(), "M".to_string()]))
    }

    proptest! {
        #[test]
        fn prop_identical_adds_collapse_into_one_line(
            quantities in prop::collection::vec(1u32..20, 1..12),
            size in variant(),
            color in variant(),
        ) {
            let mut store = Store::new();
            for quantity in &quantities {
                let mut item = CartItem::new(product("p-1", 750), *quantity);
                item.selected_size.clone_from(&size);
                item.selected_color.clone_from(&color);
                store.add_to_cart(item);
            }
            prop_assert_eq!(store.cart().len(), 1);
            prop_assert_eq!(store.cart()[0].quantity, quantities.iter().sum::<u32>());
        }

        #[test]
        fn prop_at_most_one_default_address(
            ops in prop::collection::vec((0usize..6, any::<bool>(), any::<bool>()), 0..40),
        ) {
            let mut store = Store::new();
            for (index, is_default, set_default) in ops {
                let id = format!("a-{index}");
                if set_default {
                    store.set_default_address(&AddressId::new(id));
                } else {
                    store.add_address(address(&id, is_default));
                }
                let defaults = store.addresses().iter().filter(|a| a.is_default).count();
                prop_assert!(defaults <= 1);
            }
        }

        #[test]
        fn prop_total_matches_lines(
            lines in prop::collection::vec((0u8..5, 1u32..50_000, 1u32..10), 0..15),
        ) {
            let mut store = Store::new();
            for (id, cents, quantity) in lines {
                store.add_to_cart(CartItem::new(product(&format!("p-{id}"), cents), quantity));
            }
            let expected: Money = store
                .cart()
                .iter()
                .map(|line| line.product.price.times(line.quantity))
                .sum();
            prop_assert_eq!(store.cart_total(), expected);
        }
    }
}

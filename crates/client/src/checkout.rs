//! Order placement.
//!
//! An order is built from snapshots taken at the moment of placement: the
//! cart lines become [`OrderItem`]s and the delivery address becomes an
//! [`AddressSnapshot`]. Later edits to the cart or address book never reach
//! a placed order.

use bazaar_core::{
    Address, AddressId, AddressSnapshot, Money, Order, OrderId, OrderItem, OrderStatus,
};
use chrono::Utc;
use tracing::{info, instrument};

use crate::api::CreateOrderRequest;
use crate::bazaar::Bazaar;
use crate::error::{AppError, Result, add_breadcrumb};

/// Flat delivery fee in hundredths (2.00), charged on every order.
pub const DELIVERY_FEE_CENTS: u32 = 200;

/// Delivery fee applied to every order.
#[must_use]
pub fn delivery_fee() -> Money {
    Money::from_cents(DELIVERY_FEE_CENTS)
}

/// Amounts shown on the checkout screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

impl CheckoutSummary {
    /// Summary for a cart worth `subtotal`.
    #[must_use]
    pub fn for_subtotal(subtotal: Money) -> Self {
        let delivery_fee = delivery_fee();
        Self {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }
}

/// Everything an order is made of, captured before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderDraft {
    items: Vec<OrderItem>,
    summary: CheckoutSummary,
    address_id: Option<AddressId>,
    address: AddressSnapshot,
    /// Address to add to the book once the order succeeds, when none existed.
    fallback: Option<Address>,
}

impl OrderDraft {
    fn to_request(&self) -> CreateOrderRequest {
        CreateOrderRequest {
            items: self.items.clone(),
            total: self.summary.total.to_wire(),
            delivery_fee: self.summary.delivery_fee.to_wire(),
            // Locally generated ids do not exist server-side
            address_id: self.address_id.clone().filter(|id| !id.is_local()),
            address_snapshot: self.address.clone(),
        }
    }

    fn into_guest_order(self) -> Order {
        let created_at = Utc::now();
        Order {
            id: OrderId::guest(created_at),
            items: self.items,
            total: self.summary.total,
            delivery_fee: self.summary.delivery_fee,
            status: OrderStatus::Pending,
            address_id: self.address_id,
            address: self.address,
            created_at,
            estimated_delivery: Some(Order::estimate_delivery(created_at)),
        }
    }
}

/// Last-resort address for a user with an empty address book.
fn fallback_address() -> Address {
    Address {
        id: AddressId::local(),
        label: "Home".to_string(),
        full_name: "Guest User".to_string(),
        phone: "+965 5000 0000".to_string(),
        area: "Kuwait City".to_string(),
        block: "1".to_string(),
        street: "1".to_string(),
        building: "1".to_string(),
        floor: None,
        apartment: None,
        notes: None,
        is_default: true,
    }
}

impl Bazaar {
    /// Subtotal, delivery fee and total for the current cart.
    #[must_use]
    pub fn checkout_summary(&self) -> CheckoutSummary {
        CheckoutSummary::for_subtotal(self.store.cart_total())
    }

    /// Resolve the delivery address: the selected one, else the default,
    /// else the first, else a synthesized fallback.
    fn resolve_address(&self, selected: Option<&AddressId>) -> Result<(Address, bool)> {
        if let Some(id) = selected {
            return self
                .store
                .address(id)
                .cloned()
                .map(|address| (address, false))
                .ok_or_else(|| AppError::NotFound(format!("address {id}")));
        }
        Ok(self
            .store
            .default_address()
            .cloned()
            .map_or_else(|| (fallback_address(), true), |address| (address, false)))
    }

    fn draft_order(&self, selected: Option<&AddressId>) -> Result<OrderDraft> {
        if self.store.cart().is_empty() {
            return Err(AppError::EmptyCart);
        }
        let (address, synthesized) = self.resolve_address(selected)?;

        Ok(OrderDraft {
            items: self.store.cart().iter().map(OrderItem::from).collect(),
            summary: self.checkout_summary(),
            address_id: Some(address.id.clone()),
            address: address.snapshot(),
            fallback: synthesized.then_some(address),
        })
    }

    /// Place an order for the whole cart, delivered to `address_id` (or the
    /// default address when `None`).
    ///
    /// Signed in, the server assigns id, status and delivery estimate and
    /// its order is the one recorded. As a guest, those fields are
    /// generated locally. On success the order is prepended to the order
    /// list and the cart is emptied.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart`, `NotFound` for an unknown address, or the
    /// server's error. On error nothing changes: the cart is kept and no
    /// order is recorded.
    #[instrument(skip(self), fields(authenticated = self.store.is_authenticated()))]
    pub async fn place_order(&mut self, address_id: Option<&AddressId>) -> Result<Order> {
        let draft = self.draft_order(address_id)?;
        let fallback = draft.fallback.clone();

        let order = if self.store.is_authenticated() {
            // Writes issued before checkout must land before the server
            // clears its cart
            self.writer.settle().await;
            self.api.create_order(&draft.to_request()).await?
        } else {
            draft.into_guest_order()
        };

        self.store.add_order(order.clone());
        // The server already emptied its cart as part of the order
        self.store.clear_cart();
        if let Some(address) = fallback {
            self.store.add_address(address);
        }
        self.save_quietly();

        let total = order.total.to_wire();
        add_breadcrumb(
            "checkout",
            "Order placed",
            Some(&[("order_id", order.id.as_str()), ("total", total.as_str())]),
        );
        info!(order_id = %order.id, total = %order.total, "Order placed");
        Ok(order)
    }

    /// Look up an order: from the server when signed in, otherwise from the
    /// local order list.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if a guest has no such order, or the API error.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order> {
        if self.store.is_authenticated() {
            return Ok(self.api.get_order(id).await?);
        }
        self.store
            .orders()
            .iter()
            .find(|order| &order.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))
    }
}

//! Orders and their item snapshots.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::address::AddressSnapshot;
use super::cart::CartItem;
use super::id::{AddressId, OrderId, ProductId};
use super::money::Money;
use super::status::OrderStatus;

/// Days between placement and the estimated delivery date.
pub const DELIVERY_DAYS: i64 = 3;

/// A purchased line, frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_name_ar: String,
    /// Unit price at the time of purchase.
    pub price: Money,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl OrderItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product.id.clone(),
            product_name: item.product.name.clone(),
            product_name_ar: item.product.name_ar.clone(),
            price: item.product.price,
            quantity: item.quantity,
            selected_size: item.selected_size.clone(),
            selected_color: item.selected_color.clone(),
            image: item.product.thumbnail().map(str::to_owned),
        }
    }
}

/// A placed order.
///
/// `status` and `estimated_delivery` are server-assigned for authenticated
/// orders and never modified by the client. `address` is a snapshot, not a
/// reference into the address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderItem>,
    /// Subtotal plus delivery fee.
    pub total: Money,
    pub delivery_fee: Money,
    pub status: OrderStatus,
    /// Address book entry the snapshot was taken from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_id: Option<AddressId>,
    pub address: AddressSnapshot,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl Order {
    /// Estimated delivery date for an order placed at `created_at`.
    #[must_use]
    pub fn estimate_delivery(created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::days(DELIVERY_DAYS)
    }

    /// Sum of the item lines, excluding delivery.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

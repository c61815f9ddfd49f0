//! Wire records exchanged with the bazaar REST API.
//!
//! These mirror the JSON the server sends, nullable columns and decimal
//! strings included. Nothing outside the gateway sees them: every record is
//! converted to its `bazaar_core` counterpart in [`super::conversions`].

use bazaar_core::{
    AddressId, AddressSnapshot, CartLineId, CategoryId, OrderId, OrderItem, ProductId,
    ProductVariants, UserId, WishlistEntryId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog
// =============================================================================

/// `GET /categories` element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategory {
    pub id: CategoryId,
    pub name: String,
    pub name_ar: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub product_count: Option<i64>,
}

/// `GET /products` element; also embedded in cart and wishlist rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProduct {
    pub id: ProductId,
    pub name: String,
    pub name_ar: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub description_ar: String,
    /// Decimal string, e.g. `"12.50"`.
    pub price: String,
    #[serde(default)]
    pub original_price: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Decimal string with one fractional digit, e.g. `"4.5"`.
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub review_count: Option<i64>,
    #[serde(default)]
    pub variants: Option<ProductVariants>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub seller_id: Option<String>,
    #[serde(default)]
    pub seller_name: Option<String>,
}

/// Filters for `GET /products`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub limit: Option<u32>,
}

impl ProductQuery {
    /// Products of one category.
    #[must_use]
    pub fn in_category(category_id: CategoryId) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    /// Free-text search over English and Arabic names.
    #[must_use]
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs, skipping unset filters.
    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category_id) = &self.category_id {
            pairs.push(("categoryId", category_id.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Response of login and register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: ApiUser,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    pub password: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `{"success": true}`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

// =============================================================================
// Addresses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAddress {
    pub id: AddressId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub area: String,
    pub block: String,
    pub street: String,
    pub building: String,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub apartment: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_default: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /addresses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub area: String,
    pub block: String,
    pub street: String,
    pub building: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl From<&bazaar_core::Address> for AddressInput {
    fn from(address: &bazaar_core::Address) -> Self {
        Self {
            label: address.label.clone(),
            full_name: address.full_name.clone(),
            phone: address.phone.clone(),
            area: address.area.clone(),
            block: address.block.clone(),
            street: address.street.clone(),
            building: address.building.clone(),
            floor: address.floor.clone(),
            apartment: address.apartment.clone(),
            notes: address.notes.clone(),
            is_default: address.is_default,
        }
    }
}

// =============================================================================
// Wishlist
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWishlistItem {
    pub id: WishlistEntryId,
    pub product_id: ProductId,
    /// Left join; null when the product row is gone.
    #[serde(default)]
    pub product: Option<ApiProduct>,
}

/// Response of `POST /wishlist/:productId`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ToggleWishlistResponse {
    pub added: bool,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCartItem {
    pub id: CartLineId,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub selected_size: Option<String>,
    #[serde(default)]
    pub selected_color: Option<String>,
    /// Left join; null when the product row is gone.
    #[serde(default)]
    pub product: Option<ApiProduct>,
}

/// Body of `POST /cart`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
}

impl From<&bazaar_core::CartItem> for AddToCartRequest {
    fn from(item: &bazaar_core::CartItem) -> Self {
        Self {
            product_id: item.product.id.clone(),
            quantity: item.quantity,
            selected_size: item.selected_size.clone(),
            selected_color: item.selected_color.clone(),
        }
    }
}

/// Body of `PUT /cart/:id`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: i64,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOrder {
    pub id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub items: Vec<OrderItem>,
    pub total: String,
    #[serde(default)]
    pub delivery_fee: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub address_id: Option<AddressId>,
    #[serde(default)]
    pub address_snapshot: Option<AddressSnapshot>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItem>,
    /// Decimal string.
    pub total: String,
    /// Decimal string.
    pub delivery_fee: String,
    /// Only server-issued address ids; local ones would break the foreign key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_id: Option<AddressId>,
    pub address_snapshot: AddressSnapshot,
}

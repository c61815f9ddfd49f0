//! Conversion from wire records to domain records.
//!
//! Decimal strings are parsed here and nowhere else. Nullable columns get
//! their documented defaults. A value that cannot be parsed fails the whole
//! conversion with [`ApiError::InvalidData`].

use bazaar_core::{
    Address, CartItem, Category, CategoryId, Money, Order, OrderStatus, Product, ProductId, User,
};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::warn;

use super::error::ApiError;
use super::types::{
    ApiAddress, ApiCartItem, ApiCategory, ApiOrder, ApiProduct, ApiUser, ApiWishlistItem,
};

/// Delivery fee the server records when the column is null.
const DEFAULT_DELIVERY_FEE: &str = "2";

fn parse_money(field: &'static str, raw: &str) -> Result<Money, ApiError> {
    Money::parse(raw).map_err(|e| ApiError::InvalidData {
        field,
        reason: e.to_string(),
    })
}

fn non_negative(field: &'static str, value: Option<i64>) -> Result<u32, ApiError> {
    let value = value.unwrap_or(0);
    u32::try_from(value).map_err(|_| ApiError::InvalidData {
        field,
        reason: format!("expected a non-negative count, got {value}"),
    })
}

// =============================================================================
// Catalog
// =============================================================================

/// Convert a category row.
///
/// # Errors
///
/// Returns `InvalidData` if `productCount` is negative.
pub fn convert_category(category: ApiCategory) -> Result<Category, ApiError> {
    Ok(Category {
        id: category.id,
        name: category.name,
        name_ar: category.name_ar,
        icon: category.icon.unwrap_or_default(),
        image: category.image.unwrap_or_default(),
        product_count: non_negative("productCount", category.product_count)?,
    })
}

/// Convert a product row.
///
/// # Errors
///
/// Returns `InvalidData` if a price or the rating is not a decimal, or a
/// count is negative.
pub fn convert_product(product: ApiProduct) -> Result<Product, ApiError> {
    let price = parse_money("price", &product.price)?;
    let original_price = product
        .original_price
        .as_deref()
        .map(|raw| parse_money("originalPrice", raw))
        .transpose()?;
    let rating = match product.rating.as_deref().map(str::trim) {
        None | Some("") => Decimal::ZERO,
        Some(raw) => raw.parse::<Decimal>().map_err(|e| ApiError::InvalidData {
            field: "rating",
            reason: e.to_string(),
        })?,
    };

    Ok(Product {
        id: product.id,
        name: product.name,
        name_ar: product.name_ar,
        description: product.description,
        description_ar: product.description_ar,
        price,
        original_price,
        images: product.images.unwrap_or_default(),
        category_id: product
            .category_id
            .unwrap_or_else(|| CategoryId::new(String::new())),
        rating,
        review_count: non_negative("reviewCount", product.review_count)?,
        variants: product.variants,
        in_stock: product.in_stock.unwrap_or(true),
        seller_id: product.seller_id.unwrap_or_default(),
        seller_name: product.seller_name.unwrap_or_default(),
    })
}

// =============================================================================
// Account
// =============================================================================

#[must_use]
pub fn convert_user(user: ApiUser) -> User {
    User {
        id: user.id,
        name: user.name,
        email: user.email,
        phone: user.phone,
        avatar: user.avatar,
    }
}

#[must_use]
pub fn convert_address(address: ApiAddress) -> Address {
    Address {
        id: address.id,
        label: address.label,
        full_name: address.full_name,
        phone: address.phone,
        area: address.area,
        block: address.block,
        street: address.street,
        building: address.building,
        floor: address.floor,
        apartment: address.apartment,
        notes: address.notes,
        is_default: address.is_default.unwrap_or(false),
    }
}

// =============================================================================
// Cart & Wishlist
// =============================================================================

/// Convert cart rows, dropping lines the client cannot represent.
///
/// Rows whose product was deleted (null join) or whose quantity is not
/// positive are skipped with a warning. A null quantity counts as one.
///
/// # Errors
///
/// Returns `InvalidData` if an embedded product fails to convert.
pub fn convert_cart(items: Vec<ApiCartItem>) -> Result<Vec<CartItem>, ApiError> {
    let mut cart = Vec::with_capacity(items.len());
    for item in items {
        let Some(product) = item.product else {
            warn!(line_id = %item.id, "Skipping cart line whose product no longer exists");
            continue;
        };
        let quantity = item.quantity.unwrap_or(1);
        let Ok(quantity) = u32::try_from(quantity) else {
            warn!(line_id = %item.id, quantity, "Skipping cart line with invalid quantity");
            continue;
        };
        if quantity == 0 {
            warn!(line_id = %item.id, "Skipping empty cart line");
            continue;
        }
        cart.push(CartItem {
            id: Some(item.id),
            product: convert_product(product)?,
            quantity,
            selected_size: item.selected_size,
            selected_color: item.selected_color,
        });
    }
    Ok(cart)
}

/// Product ids of the wishlist in server order, without duplicates.
#[must_use]
pub fn convert_wishlist(items: Vec<ApiWishlistItem>) -> Vec<ProductId> {
    let mut ids: Vec<ProductId> = Vec::with_capacity(items.len());
    for item in items {
        if !ids.contains(&item.product_id) {
            ids.push(item.product_id);
        }
    }
    ids
}

// =============================================================================
// Orders
// =============================================================================

/// Convert an order row.
///
/// A null status reads as `pending`, a null delivery fee as the standard
/// fee, and a null creation time as now. A missing address snapshot is an
/// error: historical orders must show where they went.
///
/// # Errors
///
/// Returns `InvalidData` for unparseable amounts, an unknown status or a
/// missing address snapshot.
pub fn convert_order(order: ApiOrder) -> Result<Order, ApiError> {
    let total = parse_money("total", &order.total)?;
    let delivery_fee = parse_money(
        "deliveryFee",
        order.delivery_fee.as_deref().unwrap_or(DEFAULT_DELIVERY_FEE),
    )?;
    let status = match order.status.as_deref() {
        None => OrderStatus::Pending,
        Some(raw) => raw
            .parse::<OrderStatus>()
            .map_err(|e| ApiError::InvalidData {
                field: "status",
                reason: e.to_string(),
            })?,
    };
    let address = order.address_snapshot.ok_or_else(|| ApiError::InvalidData {
        field: "addressSnapshot",
        reason: format!("order {} has no address snapshot", order.id),
    })?;

    Ok(Order {
        id: order.id,
        items: order.items,
        total,
        delivery_fee,
        status,
        address_id: order.address_id,
        address,
        created_at: order.created_at.unwrap_or_else(Utc::now),
        estimated_delivery: order.estimated_delivery,
    })
}

/// Convert every row of a list endpoint.
///
/// # Errors
///
/// Returns the first conversion failure.
pub fn convert_all<T, U>(
    rows: Vec<T>,
    convert: impl Fn(T) -> Result<U, ApiError>,
) -> Result<Vec<U>, ApiError> {
    rows.into_iter().map(convert).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{CartLineId, WishlistEntryId};

    use super::*;

    fn api_product(id: &str, price: &str) -> ApiProduct {
        ApiProduct {
            id: ProductId::new(id),
            name: "Jalabiya".to_string(),
            name_ar: "جلابية".to_string(),
            description: String::new(),
            description_ar: String::new(),
            price: price.to_string(),
            original_price: None,
            images: None,
            category_id: None,
            rating: None,
            review_count: None,
            variants: None,
            in_stock: None,
            seller_id: None,
            seller_name: None,
        }
    }

    #[test]
    fn test_product_defaults_for_null_columns() {
        let product = convert_product(api_product("p-1", "12.50")).unwrap();
        assert_eq!(product.price, Money::from_cents(1250));
        assert!(product.images.is_empty());
        assert!(product.in_stock);
        assert_eq!(product.rating, Decimal::ZERO);
        assert_eq!(product.review_count, 0);
        assert_eq!(product.category_id.as_str(), "");
    }

    #[test]
    fn test_product_parses_decimal_strings() {
        let mut wire = api_product("p-1", "8.000");
        wire.original_price = Some("10.00".to_string());
        wire.rating = Some("4.5".to_string());
        let product = convert_product(wire).unwrap();
        assert_eq!(product.original_price, Some(Money::from_cents(1000)));
        assert_eq!(product.rating.to_string(), "4.5");
        assert_eq!(product.discount_percent(), Some(20));
    }

    #[test]
    fn test_bad_price_is_rejected() {
        let err = convert_product(api_product("p-1", "twelve")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidData { field: "price", .. }));
    }

    #[test]
    fn test_cart_skips_orphaned_and_empty_lines() {
        let line = |id: &str, quantity: Option<i64>, product: Option<ApiProduct>| ApiCartItem {
            id: CartLineId::new(id),
            quantity,
            selected_size: None,
            selected_color: None,
            product,
        };
        let cart = convert_cart(vec![
            line("c-1", Some(2), Some(api_product("p-1", "10"))),
            line("c-2", Some(1), None),
            line("c-3", Some(0), Some(api_product("p-3", "5"))),
            line("c-4", None, Some(api_product("p-4", "5"))),
        ])
        .unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart[0].quantity, 2);
        assert_eq!(cart[0].id, Some(CartLineId::new("c-1")));
        assert_eq!(cart[1].quantity, 1);
    }

    #[test]
    fn test_wishlist_keeps_order_and_dedups() {
        let entry = |id: &str, product: &str| ApiWishlistItem {
            id: WishlistEntryId::new(id),
            product_id: ProductId::new(product),
            product: None,
        };
        let ids = convert_wishlist(vec![entry("w-1", "p-2"), entry("w-2", "p-1"), entry("w-3", "p-2")]);
        assert_eq!(ids, vec![ProductId::new("p-2"), ProductId::new("p-1")]);
    }

    #[test]
    fn test_order_defaults_and_status() {
        let json = r#"{
            "id": "o-1",
            "userId": "u-1",
            "items": [{"productId":"p-1","productName":"A","productNameAr":"أ","price":10,"quantity":2}],
            "total": "22.00",
            "deliveryFee": null,
            "status": null,
            "addressId": null,
            "addressSnapshot": {"label":"Home","fullName":"Amna","phone":"+965","area":"Salmiya","block":"4","street":"12","building":"7"},
            "estimatedDelivery": null,
            "createdAt": "2025-01-10T08:00:00Z"
        }"#;
        let order = convert_order(serde_json::from_str(json).unwrap()).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.delivery_fee, Money::from_cents(200));
        assert_eq!(order.total, Money::from_cents(2200));
        assert_eq!(order.items[0].price, Money::from_cents(1000));

        let mut wire: ApiOrder = serde_json::from_str(json).unwrap();
        wire.status = Some("shipped".to_string());
        assert!(matches!(
            convert_order(wire),
            Err(ApiError::InvalidData { field: "status", .. })
        ));
    }
}

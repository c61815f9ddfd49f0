//! Cart line items.

use serde::{Deserialize, Serialize};

use super::id::{CartLineId, ProductId};
use super::money::Money;
use super::product::Product;

/// Identity of a cart line for merge purposes.
///
/// Two lines are the same line item iff product, size and color all match;
/// adding a matching item increments quantity instead of appending a line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: ProductId,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
}

impl LineKey {
    /// Key for a product with no selected variant.
    #[must_use]
    pub const fn plain(product_id: ProductId) -> Self {
        Self {
            product_id,
            selected_size: None,
            selected_color: None,
        }
    }
}

/// A product in the cart with a quantity and selected variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Server line id. Absent for guest lines that were never synced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CartLineId>,
    pub product: Product,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
}

impl CartItem {
    /// A new unsynced line.
    #[must_use]
    pub const fn new(product: Product, quantity: u32) -> Self {
        Self {
            id: None,
            product,
            quantity,
            selected_size: None,
            selected_color: None,
        }
    }

    /// Set the selected size.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.selected_size = Some(size.into());
        self
    }

    /// Set the selected color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.selected_color = Some(color.into());
        self
    }

    /// Merge identity of this line.
    #[must_use]
    pub fn line_key(&self) -> LineKey {
        LineKey {
            product_id: self.product.id.clone(),
            selected_size: self.selected_size.clone(),
            selected_color: self.selected_color.clone(),
        }
    }

    /// Whether this line has the given merge identity.
    #[must_use]
    pub fn matches(&self, key: &LineKey) -> bool {
        self.product.id == key.product_id
            && self.selected_size == key.selected_size
            && self.selected_color == key.selected_color
    }

    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.product.price.times(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::product::fixtures::product;

    #[test]
    fn test_line_identity_includes_variants() {
        let plain = CartItem::new(product("p-1", 100), 1);
        let large = CartItem::new(product("p-1", 100), 1).with_size("L");
        let large_red = CartItem::new(product("p-1", 100), 3)
            .with_size("L")
            .with_color("Red");

        assert!(plain.matches(&LineKey::plain(ProductId::new("p-1"))));
        assert!(!large.matches(&plain.line_key()));
        assert!(!large_red.matches(&large.line_key()));
        assert!(large_red.matches(&large_red.clone().line_key()));
    }

    #[test]
    fn test_line_total() {
        let item = CartItem::new(product("p-1", 1000), 3);
        assert_eq!(item.line_total(), Money::from_cents(3000));
    }
}

//! Catalog records: products and categories.
//!
//! These are the domain forms, with every wire decimal string already parsed.
//! The store persists them (cart lines embed a full product), so they
//! serialize in the same camelCase shape the API uses.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::money::Money;
use super::status::Language;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub name_ar: String,
    /// Icon name from the app's icon set.
    pub icon: String,
    /// Image URL; empty when the category has none.
    pub image: String,
    pub product_count: u32,
}

impl Category {
    /// Name in the given language.
    #[must_use]
    pub fn display_name(&self, language: Language) -> &str {
        match language {
            Language::Ar => &self.name_ar,
            Language::En => &self.name,
        }
    }
}

/// A named color swatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorOption {
    pub name: String,
    /// CSS color value (e.g. `#1A1A1A`).
    pub value: String,
}

/// Selectable variants of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariants {
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<ColorOption>,
}

/// A catalog product. Read-only from the client's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub name_ar: String,
    pub description: String,
    pub description_ar: String,
    pub price: Money,
    /// Pre-discount price, when the product is on sale.
    pub original_price: Option<Money>,
    pub images: Vec<String>,
    /// Empty when the product is uncategorised.
    pub category_id: CategoryId,
    /// Average review score, 0 when unrated.
    pub rating: Decimal,
    pub review_count: u32,
    pub variants: Option<ProductVariants>,
    pub in_stock: bool,
    pub seller_id: String,
    pub seller_name: String,
}

impl Product {
    /// Name in the given language.
    #[must_use]
    pub fn display_name(&self, language: Language) -> &str {
        match language {
            Language::Ar => &self.name_ar,
            Language::En => &self.name,
        }
    }

    /// Description in the given language.
    #[must_use]
    pub fn display_description(&self, language: Language) -> &str {
        match language {
            Language::Ar => &self.description_ar,
            Language::En => &self.description,
        }
    }

    /// First image URL, used as the thumbnail.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Percentage saved against `original_price`, rounded to the nearest
    /// whole percent. `None` unless the product is actually discounted.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?.amount();
        let price = self.price.amount();
        if original <= price || original.is_zero() {
            return None;
        }
        ((original - price) / original * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .filter(|percent| *percent > 0)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A minimal in-stock product with the given id and price in hundredths.
    pub(crate) fn product(id: &str, cents: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            name_ar: format!("منتج {id}"),
            description: String::new(),
            description_ar: String::new(),
            price: Money::from_cents(cents),
            original_price: None,
            images: vec![format!("https://img.example/{id}.jpg")],
            category_id: CategoryId::new("c-1"),
            rating: Decimal::ZERO,
            review_count: 0,
            variants: None,
            in_stock: true,
            seller_id: "s-1".to_owned(),
            seller_name: "Omdurman Crafts".to_owned(),
        }
    }
}

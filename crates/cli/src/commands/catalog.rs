//! Catalog browsing.

use bazaar_client::{Bazaar, ProductQuery};
use bazaar_core::{CategoryId, Product, ProductId};
use tracing::info;

pub async fn categories(bazaar: &Bazaar) -> bazaar_client::Result<()> {
    let language = bazaar.language();
    let categories = bazaar.catalog().list_categories().await?;

    info!("{} categories", categories.len());
    for category in &categories {
        info!(
            "  {} {} ({} products) [{}]",
            category.icon,
            category.display_name(language),
            category.product_count,
            category.id
        );
    }
    Ok(())
}

pub async fn products(
    bazaar: &Bazaar,
    category: Option<String>,
    search: Option<String>,
    limit: Option<u32>,
) -> bazaar_client::Result<()> {
    let query = ProductQuery {
        category_id: category.map(CategoryId::new),
        search,
        limit,
    };
    let products = bazaar.catalog().list_products(&query).await?;

    info!("{} products", products.len());
    for product in &products {
        print_product_line(bazaar, product);
    }
    Ok(())
}

pub async fn product(bazaar: &Bazaar, id: &str) -> bazaar_client::Result<()> {
    let language = bazaar.language();
    let product = bazaar.catalog().get_product(&ProductId::new(id)).await?;

    info!("{}", product.display_name(language));
    info!("  Price: {}", product.price);
    if let Some(original) = &product.original_price {
        info!("  Was: {original}");
    }
    info!(
        "  Rating: {} ({} reviews)",
        product.rating, product.review_count
    );
    info!("  Seller: {}", product.seller_name);
    info!("  In stock: {}", if product.in_stock { "yes" } else { "no" });
    if let Some(variants) = &product.variants {
        if !variants.sizes.is_empty() {
            info!("  Sizes: {}", variants.sizes.join(", "));
        }
        if !variants.colors.is_empty() {
            let colors: Vec<&str> = variants.colors.iter().map(|c| c.name.as_str()).collect();
            info!("  Colors: {}", colors.join(", "));
        }
    }
    let description = product.display_description(language);
    if !description.is_empty() {
        info!("  {description}");
    }
    if bazaar.store().is_in_wishlist(&product.id) {
        info!("  ♥ In your wishlist");
    }
    Ok(())
}

fn print_product_line(bazaar: &Bazaar, product: &Product) {
    let discount = product
        .discount_percent()
        .map(|pct| format!(" -{pct}%"))
        .unwrap_or_default();
    let stock = if product.in_stock { "" } else { " (out of stock)" };
    info!(
        "  [{}] {} - {}{discount}{stock}",
        product.id,
        product.display_name(bazaar.language()),
        product.price
    );
}

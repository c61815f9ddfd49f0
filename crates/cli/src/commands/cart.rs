//! Cart and wishlist commands.

use bazaar_client::{AppError, Bazaar, CartChange};
use bazaar_core::{CartItem, LineKey, ProductId};
use tracing::{info, warn};

pub fn show(bazaar: &Bazaar) {
    let store = bazaar.store();
    if store.cart().is_empty() {
        info!("Your cart is empty");
        return;
    }

    let language = bazaar.language();
    for line in store.cart() {
        let variant = [line.selected_size.as_deref(), line.selected_color.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ");
        info!(
            "  {} x{} {}{} = {}",
            line.product.display_name(language),
            line.quantity,
            line.product.price,
            if variant.is_empty() { String::new() } else { format!(" ({variant})") },
            line.line_total()
        );
    }

    let summary = bazaar.checkout_summary();
    info!("Items: {}", store.cart_item_count());
    info!("Subtotal: {}", summary.subtotal);
    info!("Delivery: {}", summary.delivery_fee);
    info!("Total: {}", summary.total);
}

pub async fn add(
    bazaar: &mut Bazaar,
    product_id: &str,
    quantity: u32,
    size: Option<String>,
    color: Option<String>,
) -> bazaar_client::Result<()> {
    let product = bazaar
        .catalog()
        .get_product(&ProductId::new(product_id))
        .await?;
    if !product.in_stock {
        return Err(AppError::Validation(format!(
            "{} is out of stock",
            product.name
        )));
    }
    if let (Some(size), Some(variants)) = (&size, &product.variants) {
        if !variants.sizes.is_empty() && !variants.sizes.contains(size) {
            warn!("Size {size} is not listed for {}", product.name);
        }
    }

    let mut item = CartItem::new(product, quantity);
    if let Some(size) = size {
        item = item.with_size(size);
    }
    if let Some(color) = color {
        item = item.with_color(color);
    }
    let name = item.product.display_name(bazaar.language()).to_owned();
    bazaar.add_to_cart(item);

    info!("Added {quantity} x {name}");
    info!("Cart now holds {} items", bazaar.store().cart_item_count());
    Ok(())
}

pub fn remove(bazaar: &mut Bazaar, product_id: &str, size: Option<String>, color: Option<String>) {
    let product_id = ProductId::new(product_id);

    let removed = if size.is_some() || color.is_some() {
        let key = LineKey {
            product_id,
            selected_size: size,
            selected_color: color,
        };
        bazaar.remove_cart_line(&key).into_iter().collect()
    } else {
        bazaar.remove_from_cart(&product_id)
    };

    if removed.is_empty() {
        warn!("Nothing to remove");
    } else {
        info!("Removed {} line(s)", removed.len());
    }
}

pub fn update(bazaar: &mut Bazaar, product_id: &str, quantity: i64) {
    match bazaar.update_cart_quantity(&ProductId::new(product_id), quantity) {
        CartChange::Removed(lines) if lines.is_empty() => warn!("Product is not in the cart"),
        CartChange::Updated(lines) if lines.is_empty() => warn!("Product is not in the cart"),
        CartChange::Removed(lines) => info!("Removed {} line(s)", lines.len()),
        CartChange::Updated(lines) => info!("Updated {} line(s) to {quantity}", lines.len()),
    }
}

pub fn show_wishlist(bazaar: &Bazaar) {
    let wishlist = bazaar.store().wishlist();
    if wishlist.is_empty() {
        info!("Your wishlist is empty");
        return;
    }
    info!("{} wishlisted products", wishlist.len());
    for id in wishlist {
        info!("  {id}");
    }
}

pub fn toggle_wishlist(bazaar: &mut Bazaar, product_id: &str) {
    let product_id = ProductId::new(product_id);
    if bazaar.toggle_wishlist(&product_id) {
        info!("Added {product_id} to wishlist");
    } else {
        info!("Removed {product_id} from wishlist");
    }
}

//! Checkout and order tracking.

use bazaar_client::Bazaar;
use bazaar_core::{AddressId, Order, OrderId};
use tracing::info;

pub async fn checkout(bazaar: &mut Bazaar, address: Option<String>) -> bazaar_client::Result<()> {
    let summary = bazaar.checkout_summary();
    info!(
        "Subtotal {} + delivery {} = {}",
        summary.subtotal, summary.delivery_fee, summary.total
    );

    let address = address.map(AddressId::new);
    let order = bazaar.place_order(address.as_ref()).await?;

    info!("Order {} placed", order.id);
    print_order(bazaar, &order);
    Ok(())
}

/// Refresh from the server when signed in, then list.
pub async fn list(bazaar: &mut Bazaar) -> bazaar_client::Result<()> {
    if bazaar.store().is_authenticated() {
        bazaar.sync_orders().await?;
    }
    print_orders(bazaar);
    Ok(())
}

pub async fn show(bazaar: &Bazaar, id: &str) -> bazaar_client::Result<()> {
    let order = bazaar.get_order(&OrderId::new(id)).await?;
    print_order(bazaar, &order);
    Ok(())
}

pub fn print_orders(bazaar: &Bazaar) {
    let language = bazaar.language();
    let orders = bazaar.store().orders();
    if orders.is_empty() {
        info!("No orders yet");
        return;
    }
    for order in orders {
        info!(
            "  [{}] {} - {} items - {} - {}",
            order.id,
            order.created_at.format("%Y-%m-%d"),
            order.item_count(),
            order.total,
            order.status.label(language)
        );
    }
}

fn print_order(bazaar: &Bazaar, order: &Order) {
    let language = bazaar.language();

    info!("Order {} ({})", order.id, order.created_at.format("%Y-%m-%d %H:%M"));
    for item in &order.items {
        let name = match language {
            bazaar_core::Language::Ar => &item.product_name_ar,
            bazaar_core::Language::En => &item.product_name,
        };
        info!("  {name} x{} = {}", item.quantity, item.line_total());
    }
    info!("  Delivery: {}", order.delivery_fee);
    info!("  Total: {}", order.total);
    info!("  Deliver to: {}", order.address.summary());
    if let Some(eta) = order.estimated_delivery {
        info!("  Estimated delivery: {}", eta.format("%Y-%m-%d"));
    }

    for (status, reached) in order.status.progress_steps() {
        let mark = if reached { "●" } else { "○" };
        info!("  {mark} {}", status.label(language));
    }
}

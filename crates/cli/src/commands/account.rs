//! Sign-in, registration and sync.

use bazaar_client::{Bazaar, RegisterInput, SyncReport};
use secrecy::SecretString;
use tracing::{info, warn};

pub async fn login(bazaar: &mut Bazaar, email: &str, password: String) -> bazaar_client::Result<()> {
    let password = SecretString::from(password);
    let report = bazaar.login(email, &password).await?;

    if let Some(user) = bazaar.store().user() {
        info!("Welcome back, {}", user.name);
    }
    print_report(bazaar, &report);
    Ok(())
}

pub async fn register(
    bazaar: &mut Bazaar,
    name: String,
    email: String,
    phone: Option<String>,
    password: String,
) -> bazaar_client::Result<()> {
    let report = bazaar
        .register(RegisterInput {
            name,
            email,
            phone,
            password: SecretString::from(password),
        })
        .await?;

    if let Some(user) = bazaar.store().user() {
        info!("Account created for {} <{}>", user.name, user.email);
    }
    print_report(bazaar, &report);
    Ok(())
}

pub async fn whoami(bazaar: &mut Bazaar) -> bazaar_client::Result<()> {
    if !bazaar.store().is_authenticated() {
        info!("Browsing as guest");
        return Ok(());
    }
    bazaar.refresh_user().await?;

    if let Some(user) = bazaar.store().user() {
        info!("{} <{}>", user.name, user.email);
        if let Some(phone) = &user.phone {
            info!("  Phone: {phone}");
        }
        info!("  Id: {}", user.id);
    }
    Ok(())
}

/// Re-fetch every collection and report what failed.
pub async fn sync(bazaar: &mut Bazaar) {
    if !bazaar.store().is_authenticated() {
        info!("Nothing to sync: browsing as guest");
        return;
    }
    let report = bazaar.hydrate().await;
    print_report(bazaar, &report);
}

fn print_report(bazaar: &Bazaar, report: &SyncReport) {
    let store = bazaar.store();
    info!(
        "Cart: {} items, wishlist: {}, addresses: {}, orders: {}",
        store.cart_item_count(),
        store.wishlist().len(),
        store.addresses().len(),
        store.orders().len()
    );
    for (target, error) in &report.failures {
        warn!("Could not sync {target}: {}", error.user_message(bazaar.language()));
    }
    if report.session_expired() {
        warn!("Session expired, please sign in again");
    }
}

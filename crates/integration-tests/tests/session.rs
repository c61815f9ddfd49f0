//! Sign-in, registration, logout and session expiry against the fake API.

#![allow(clippy::unwrap_used)]

use bazaar_client::{Bazaar, ErrorKind, RegisterInput};
use bazaar_core::{CartItem, Language, ProductId};
use bazaar_integration_tests::{EMAIL, FakeApi, JALABIYA, PASSWORD};
use secrecy::SecretString;
use tempfile::TempDir;

fn password(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

async fn setup() -> (FakeApi, TempDir, Bazaar) {
    let api = FakeApi::spawn().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let bazaar = api.bazaar(dir.path().join("state.json")).unwrap();
    (api, dir, bazaar)
}

#[tokio::test]
async fn test_login_pulls_every_collection() {
    let (api, _dir, mut bazaar) = setup().await;
    let user_id = api.seed_user("Amna Osman", EMAIL, PASSWORD);
    api.seed_cart_row(&user_id, JALABIYA, Some(2));
    api.seed_wishlist(&user_id, JALABIYA);
    api.seed_address(&user_id, "Home", true);

    let report = bazaar.login(EMAIL, &password(PASSWORD)).await.unwrap();

    assert!(report.is_complete());
    let store = bazaar.store();
    assert!(store.is_authenticated());
    assert_eq!(store.user().unwrap().name, "Amna Osman");
    assert_eq!(store.cart().len(), 1);
    assert_eq!(store.cart()[0].quantity, 2);
    assert!(store.cart()[0].id.is_some());
    assert_eq!(store.wishlist(), [ProductId::new(JALABIYA)]);
    assert_eq!(store.addresses().len(), 1);
    assert!(store.addresses()[0].is_default);
    assert!(store.orders().is_empty());
}

#[tokio::test]
async fn test_login_discards_guest_cart() {
    let (api, _dir, mut bazaar) = setup().await;
    let user_id = api.seed_user("Amna Osman", EMAIL, PASSWORD);

    let product = bazaar
        .catalog()
        .get_product(&ProductId::new(JALABIYA))
        .await
        .unwrap();
    bazaar.add_to_cart(CartItem::new(product, 3));
    assert_eq!(bazaar.store().cart_item_count(), 3);

    bazaar.login(EMAIL, &password(PASSWORD)).await.unwrap();
    bazaar.settle().await;

    assert!(bazaar.store().cart().is_empty());
    assert!(api.cart_rows(&user_id).is_empty());
    assert!(!api.received("POST /api/cart"));
}

#[tokio::test]
async fn test_wrong_password_leaves_guest_session() {
    let (api, _dir, mut bazaar) = setup().await;
    api.seed_user("Amna Osman", EMAIL, PASSWORD);

    let err = bazaar
        .login(EMAIL, &password("not-the-password"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
    assert_eq!(
        err.user_message(Language::En),
        "البريد الإلكتروني أو كلمة المرور غير صحيحة"
    );
    assert!(!bazaar.store().is_authenticated());
    assert!(!bazaar.api().has_token());
}

#[tokio::test]
async fn test_malformed_credentials_never_reach_the_server() {
    let (api, _dir, mut bazaar) = setup().await;

    let err = bazaar.login("not-an-email", &password(PASSWORD)).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));

    let err = bazaar.login(EMAIL, &password("12345")).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));

    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_register_signs_in() {
    let (api, _dir, mut bazaar) = setup().await;

    let report = bazaar
        .register(RegisterInput {
            name: "Mohamed Ali".to_string(),
            email: "mohamed@example.sd".to_string(),
            phone: Some("+249 91 234 5678".to_string()),
            password: password(PASSWORD),
        })
        .await
        .unwrap();

    assert!(report.is_complete());
    let user = bazaar.store().user().unwrap();
    assert_eq!(user.email, "mohamed@example.sd");
    assert_eq!(user.phone.as_deref(), Some("+249 91 234 5678"));
    assert_eq!(api.session_count(), 1);
}

#[tokio::test]
async fn test_register_duplicate_email_shows_server_message() {
    let (api, _dir, mut bazaar) = setup().await;
    api.seed_user("Amna Osman", EMAIL, PASSWORD);

    let err = bazaar
        .register(RegisterInput {
            name: "Someone Else".to_string(),
            email: EMAIL.to_string(),
            phone: None,
            password: password(PASSWORD),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::Validation));
    assert_eq!(
        err.user_message(Language::Ar),
        "البريد الإلكتروني مستخدم بالفعل"
    );
    assert!(!bazaar.store().is_authenticated());
}

#[tokio::test]
async fn test_logout_revokes_token_and_keeps_language() {
    let (api, _dir, mut bazaar) = setup().await;
    let user_id = api.seed_user("Amna Osman", EMAIL, PASSWORD);
    api.seed_cart_row(&user_id, JALABIYA, Some(1));
    api.seed_wishlist(&user_id, JALABIYA);
    api.seed_address(&user_id, "Home", true);

    bazaar.set_language(Language::En);
    bazaar.login(EMAIL, &password(PASSWORD)).await.unwrap();
    bazaar.place_order(None).await.unwrap();
    let product = bazaar
        .catalog()
        .get_product(&ProductId::new(JALABIYA))
        .await
        .unwrap();
    bazaar.add_to_cart(CartItem::new(product, 2));

    let store = bazaar.store();
    assert_eq!(store.cart_item_count(), 2);
    assert_eq!(store.wishlist().len(), 1);
    assert_eq!(store.orders().len(), 1);
    assert_eq!(api.session_count(), 1);

    bazaar.logout().await;

    assert_eq!(api.session_count(), 0);
    assert!(!bazaar.api().has_token());
    let store = bazaar.store();
    assert!(!store.is_authenticated());
    assert!(store.user().is_none());
    assert!(store.cart().is_empty());
    assert!(store.wishlist().is_empty());
    assert!(store.addresses().is_empty());
    assert!(store.orders().is_empty());
    assert_eq!(store.language(), Language::En);
    // Server-side data is untouched by logout
    assert_eq!(api.cart_rows(&user_id).len(), 1);
    assert_eq!(api.wishlist_of(&user_id).len(), 1);
    assert_eq!(api.orders_of(&user_id).len(), 1);
}

#[tokio::test]
async fn test_expired_session_forces_logout_on_sync() {
    let (api, _dir, mut bazaar) = setup().await;
    api.seed_user("Amna Osman", EMAIL, PASSWORD);
    bazaar.login(EMAIL, &password(PASSWORD)).await.unwrap();

    api.expire_sessions();
    let err = bazaar.sync_cart().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(Language::Ar), "غير مصرح");
    assert!(!bazaar.store().is_authenticated());
    assert!(!bazaar.api().has_token());
    assert_eq!(api.session_count(), 0);
}

#[tokio::test]
async fn test_expired_session_reported_by_full_sync() {
    let (api, _dir, mut bazaar) = setup().await;
    api.seed_user("Amna Osman", EMAIL, PASSWORD);
    bazaar.login(EMAIL, &password(PASSWORD)).await.unwrap();

    api.expire_sessions();
    let report = bazaar.hydrate().await;

    assert!(report.session_expired());
    assert_eq!(report.failures.len(), 4);
    assert!(!bazaar.store().is_authenticated());
}

#[tokio::test]
async fn test_restored_session_hydrates_orders() {
    let api = FakeApi::spawn().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let user_id = api.seed_user("Amna Osman", EMAIL, PASSWORD);

    {
        let mut bazaar = api.bazaar(state_path.clone()).unwrap();
        bazaar.login(EMAIL, &password(PASSWORD)).await.unwrap();
        let product = bazaar
            .catalog()
            .get_product(&ProductId::new(JALABIYA))
            .await
            .unwrap();
        bazaar.add_to_cart(CartItem::new(product, 1));
        bazaar.place_order(None).await.unwrap();
        bazaar.persist().unwrap();
    }

    let mut bazaar = api.bazaar(state_path).unwrap();
    assert!(bazaar.store().is_authenticated());
    assert!(bazaar.api().has_token());
    // Orders are not persisted
    assert!(bazaar.store().orders().is_empty());

    let report = bazaar.hydrate().await;

    assert!(report.is_complete());
    assert_eq!(bazaar.store().orders().len(), 1);
    assert_eq!(api.orders_of(&user_id).len(), 1);
}

#[tokio::test]
async fn test_refresh_user_after_restore() {
    let api = FakeApi::spawn().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    api.seed_user("Amna Osman", EMAIL, PASSWORD);

    {
        let mut bazaar = api.bazaar(state_path.clone()).unwrap();
        bazaar.login(EMAIL, &password(PASSWORD)).await.unwrap();
    }

    let mut bazaar = api.bazaar(state_path).unwrap();
    bazaar.refresh_user().await.unwrap();

    assert_eq!(bazaar.store().user().unwrap().email, EMAIL);
    assert!(api.received("GET /api/auth/me"));
}

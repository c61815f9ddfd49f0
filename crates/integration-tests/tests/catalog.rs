//! Catalog reads and error mapping against the fake API.

#![allow(clippy::unwrap_used)]

use bazaar_client::{ApiClient, Catalog, ClientConfig, ErrorKind, ProductQuery};
use bazaar_core::{CategoryId, Language, Money, ProductId};
use bazaar_integration_tests::{BAKHOOR, CLOTHING, FakeApi, JALABIYA, PERFUME, TOUB};
use rust_decimal::Decimal;

async fn catalog() -> (FakeApi, Catalog) {
    let api = FakeApi::spawn().await.unwrap();
    let dir = std::env::temp_dir().join("bazaar-catalog-tests.json");
    let client = ApiClient::new(&api.config(dir)).unwrap();
    (api, Catalog::new(client))
}

#[tokio::test]
async fn test_categories_fill_null_columns() {
    let (_api, catalog) = catalog().await;

    let categories = catalog.list_categories().await.unwrap();

    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].id, CategoryId::new(CLOTHING));
    assert_eq!(categories[0].product_count, 2);
    assert_eq!(categories[0].display_name(Language::Ar), "ملابس");
    let perfume = &categories[1];
    assert_eq!(perfume.id, CategoryId::new(PERFUME));
    assert_eq!(perfume.icon, "");
    assert_eq!(perfume.image, "");
    assert_eq!(perfume.product_count, 0);
}

#[tokio::test]
async fn test_get_category() {
    let (_api, catalog) = catalog().await;

    let category = catalog.get_category(&CategoryId::new(PERFUME)).await.unwrap();
    assert_eq!(category.display_name(Language::En), "Perfume");

    let err = catalog
        .get_category(&CategoryId::new("cat-missing"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    assert_eq!(err.user_message(Language::En), "Category not found");
}

#[tokio::test]
async fn test_product_filters() {
    let (api, catalog) = catalog().await;

    let all = catalog.list_products(&ProductQuery::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let clothing = catalog
        .list_products(&ProductQuery::in_category(CategoryId::new(CLOTHING)))
        .await
        .unwrap();
    assert_eq!(clothing.len(), 2);
    assert!(clothing.iter().all(|p| p.category_id == CategoryId::new(CLOTHING)));

    // Arabic search terms match the Arabic name
    let toub = catalog
        .list_products(&ProductQuery::search("توب"))
        .await
        .unwrap();
    assert_eq!(toub.len(), 1);
    assert_eq!(toub[0].id, ProductId::new(TOUB));

    let limited = catalog
        .list_products(&ProductQuery::default().with_limit(1))
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);

    // A blank search is not sent at all
    let blank = catalog
        .list_products(&ProductQuery::search("   "))
        .await
        .unwrap();
    assert_eq!(blank.len(), 3);
    assert!(api.received("GET /api/products"));
}

#[tokio::test]
async fn test_product_conversion() {
    let (_api, catalog) = catalog().await;

    let toub = catalog.get_product(&ProductId::new(TOUB)).await.unwrap();
    assert_eq!(toub.price, Money::parse("25.00").unwrap());
    assert_eq!(toub.original_price, Some(Money::parse("30.00").unwrap()));
    assert_eq!(toub.discount_percent(), Some(17));
    assert_eq!(toub.rating, Decimal::new(48, 1));

    let jalabiya = catalog.get_product(&ProductId::new(JALABIYA)).await.unwrap();
    let variants = jalabiya.variants.as_ref().unwrap();
    assert_eq!(variants.sizes, ["S", "M", "L"]);
    assert_eq!(variants.colors[0].value, "#FFFFFF");
    assert_eq!(jalabiya.thumbnail(), Some("https://cdn.example.sd/products/jalabiya.jpg"));

    let bakhoor = catalog.get_product(&ProductId::new(BAKHOOR)).await.unwrap();
    assert!(!bakhoor.in_stock);
    assert!(bakhoor.images.is_empty());
    assert_eq!(bakhoor.rating, Decimal::ZERO);
    assert_eq!(bakhoor.review_count, 0);
    assert_eq!(bakhoor.discount_percent(), None);
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let (_api, catalog) = catalog().await;

    let err = catalog
        .get_product(&ProductId::new("prod-missing"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    assert_eq!(err.user_message(Language::Ar), "Product not found");
}

#[tokio::test]
async fn test_unreachable_server_is_transient() {
    // Bind and release a port so nothing is listening on it
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let origin = url::Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();

    let config = ClientConfig::for_origin(origin, std::env::temp_dir().join("unused.json"));
    let catalog = Catalog::new(ApiClient::new(&config).unwrap());

    let err = catalog.list_categories().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Transient));
    assert_eq!(
        err.user_message(Language::En),
        "Could not reach the server, please try again"
    );
}

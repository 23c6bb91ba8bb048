//! Integration tests for product extraction and SKU assignment.

use sitemirror::catalog::{extract_product, legacy_product_id, SkuRegistry};
use url::Url;

#[test]
fn extracts_a_product_from_json_ld_on_a_realistic_page() {
    let html = r#"<!DOCTYPE html><html><head>
        <title>Trail Boots</title>
        <script type="application/ld+json">
        {"@context":"https://schema.org","@type":"Product","name":"Trail Boots",
         "description":"Waterproof hiking boots",
         "offers":{"@type":"Offer","price":"89.99","priceCurrency":"USD"},
         "image":["https://shop.example.com/img/boots-1.jpg"]}
        </script>
    </head><body></body></html>"#;

    let product = extract_product(html).expect("product should be extracted");
    assert_eq!(product.name, "Trail Boots");
    assert_eq!(product.price.unwrap().amount, 89.99);
    assert_eq!(product.images.len(), 1);
}

#[test]
fn pages_without_a_product_schema_extract_nothing() {
    let html = "<html><head><title>About us</title></head><body><p>We sell shoes.</p></body></html>";
    assert!(extract_product(html).is_none());
}

#[test]
fn sku_assignment_is_stable_for_the_same_product_key() {
    let mut registry = SkuRegistry::default();
    let first = registry.assign("/p/boots");
    let again = registry.assign("/p/boots");
    let other = registry.assign("/p/sandals");
    assert_eq!(first, again);
    assert_ne!(first, other);
}

#[test]
fn legacy_product_id_reads_known_query_params() {
    let url = Url::parse("https://shop.example.com/index.php?route=product/product&product_id=42").unwrap();
    assert_eq!(legacy_product_id(&url), Some("42".to_string()));

    let no_id = Url::parse("https://shop.example.com/catalog").unwrap();
    assert_eq!(legacy_product_id(&no_id), None);
}

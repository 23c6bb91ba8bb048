//! Integration tests for the HTML rewriter against realistic page markup.

use sitemirror::asset_store::AssetIndex;
use sitemirror::config::{Config, DeviceProfile};
use sitemirror::rewrite::rewrite_page;
use sitemirror::same_site::SameSiteClassifier;
use tempfile::TempDir;
use url::Url;

fn classifier() -> SameSiteClassifier {
    SameSiteClassifier::new(&["https://shop.example.com/".to_string()], Default::default(), None)
}

#[test]
fn same_site_document_links_rewrite_into_the_mirror_tree() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder(dir.path(), "https://shop.example.com/").build().unwrap();
    let assets = AssetIndex::new(dir.path(), config.asset_max_bytes, config.inline_small_assets, true, false);
    let page_url = Url::parse("https://shop.example.com/").unwrap();
    let profile = DeviceProfile::desktop();

    let html = r#"<html><head></head><body><a href="/catalog/widgets">widgets</a></body></html>"#;
    let outcome = rewrite_page(html, &page_url, &config, &classifier(), &assets, &profile, None);

    assert!(outcome.html.contains(r#"href="/catalog/widgets/"#));
}

#[test]
fn cross_site_links_are_left_untouched() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder(dir.path(), "https://shop.example.com/").build().unwrap();
    let assets = AssetIndex::new(dir.path(), config.asset_max_bytes, config.inline_small_assets, true, false);
    let page_url = Url::parse("https://shop.example.com/").unwrap();
    let profile = DeviceProfile::desktop();

    let html = r#"<html><head></head><body><a href="https://other.example.com/page">other</a></body></html>"#;
    let outcome = rewrite_page(html, &page_url, &config, &classifier(), &assets, &profile, None);

    assert!(outcome.html.contains(r#"href="https://other.example.com/page""#));
}

#[test]
fn mobile_profile_injects_viewport_meta_when_absent() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder(dir.path(), "https://shop.example.com/").build().unwrap();
    let assets = AssetIndex::new(dir.path(), config.asset_max_bytes, config.inline_small_assets, true, false);
    let page_url = Url::parse("https://shop.example.com/").unwrap();
    let profile = DeviceProfile::mobile();

    let html = "<html><head></head><body></body></html>";
    let outcome = rewrite_page(html, &page_url, &config, &classifier(), &assets, &profile, None);

    assert_eq!(outcome.html.matches("name=\"viewport\"").count(), 1);
}

#[test]
fn mobile_profile_does_not_duplicate_an_existing_viewport_meta() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder(dir.path(), "https://shop.example.com/").build().unwrap();
    let assets = AssetIndex::new(dir.path(), config.asset_max_bytes, config.inline_small_assets, true, false);
    let page_url = Url::parse("https://shop.example.com/").unwrap();
    let profile = DeviceProfile::mobile();

    let html = r#"<html><head><meta name="viewport" content="width=320"></head><body></body></html>"#;
    let outcome = rewrite_page(html, &page_url, &config, &classifier(), &assets, &profile, None);

    assert_eq!(outcome.html.matches("name=\"viewport\"").count(), 1);
}

#[test]
fn sku_meta_tag_is_prepended_when_a_product_is_extracted() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder(dir.path(), "https://shop.example.com/").build().unwrap();
    let assets = AssetIndex::new(dir.path(), config.asset_max_bytes, config.inline_small_assets, true, false);
    let page_url = Url::parse("https://shop.example.com/p/widget").unwrap();
    let profile = DeviceProfile::desktop();

    let html = "<html><head></head><body></body></html>";
    let outcome =
        rewrite_page(html, &page_url, &config, &classifier(), &assets, &profile, Some("SKU-000001"));

    assert!(outcome.html.contains("SKU-000001"));
}

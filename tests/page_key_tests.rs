//! Tests for page-key and product-key derivation from real-shaped URLs.

use proptest::prelude::*;
use sitemirror::page_key::{derive_page_key, product_key};
use url::Url;

#[test]
fn derive_page_key_collapses_empty_path_to_index() {
    let url = Url::parse("https://example.com/").unwrap();
    assert_eq!(derive_page_key(&url, false), "index");
}

#[test]
fn derive_page_key_strips_trailing_slash() {
    let url = Url::parse("https://example.com/catalog/widgets/").unwrap();
    assert_eq!(derive_page_key(&url, false), "catalog/widgets");
}

#[test]
fn derive_page_key_includes_sorted_query_slug_when_enabled() {
    let url = Url::parse("https://example.com/index.php?route=product/category&path=20").unwrap();
    assert_eq!(derive_page_key(&url, true), "index.php__path_20__route_product_category");
}

#[test]
fn derive_page_key_ignores_query_when_disabled() {
    let url = Url::parse("https://example.com/index.php?route=product/category&path=20").unwrap();
    assert_eq!(derive_page_key(&url, false), "index.php");
}

#[test]
fn product_key_sorts_query_params() {
    let url = Url::parse("https://example.com/index.php?route=product/product&product_id=42").unwrap();
    assert_eq!(product_key(&url), "/index.php::product_id=42&route=product/product");
}

#[test]
fn product_key_has_no_query_suffix_when_url_has_no_query() {
    let url = Url::parse("https://example.com/catalog/widgets").unwrap();
    assert_eq!(product_key(&url), "/catalog/widgets");
}

proptest! {
    /// Reordering a URL's query parameters must never change its page key
    /// or product key: both sort query pairs before building the slug.
    #[test]
    fn key_derivation_is_order_independent_over_two_query_params(
        a_key in "[a-z]{1,6}", a_val in "[a-z0-9]{1,6}",
        b_key in "[a-z]{1,6}", b_val in "[a-z0-9]{1,6}",
    ) {
        prop_assume!(a_key != b_key);
        let forward = Url::parse(&format!("https://x.test/p?{a_key}={a_val}&{b_key}={b_val}")).unwrap();
        let reversed = Url::parse(&format!("https://x.test/p?{b_key}={b_val}&{a_key}={a_val}")).unwrap();

        prop_assert_eq!(derive_page_key(&forward, true), derive_page_key(&reversed, true));
        prop_assert_eq!(product_key(&forward), product_key(&reversed));
    }
}

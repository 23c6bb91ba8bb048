//! Page path key derivation (§3 "Page path key").
//!
//! `pathname` with trailing slashes stripped, empty path -> `"index"`; when
//! query-included mode is on, a deterministic sorted `k_v__k_v` slug is
//! appended with a `__` separator. Keys are stable across equivalent URLs
//! and safe to use as filesystem path components.

use url::Url;

/// Percent-decode and replace filesystem-unsafe characters with `_`.
fn sanitize_segment(segment: &str) -> String {
    let decoded = percent_decode(segment);
    decoded
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

fn percent_decode(s: &str) -> String {
    urlish_decode(s).unwrap_or_else(|| s.to_string())
}

/// Minimal percent-decoding without pulling in a dedicated crate: `url`'s
/// parser already exposes decoded path segments directly, so this is only
/// reached for raw query fragments.
fn urlish_decode(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
            let byte = u8::from_str_radix(hex, 16).ok()?;
            out.push(byte as char);
            i += 3;
        } else {
            out.push(bytes[i] as char);
            i += 1;
        }
    }
    Some(out)
}

/// Derive the page path key / `relPath` for a URL.
///
/// `include_query`: when true, appends a sorted `k_v__k_v` slug built from
/// the URL's query parameters, separated from the path by `__`.
#[must_use]
pub fn derive_page_key(url: &Url, include_query: bool) -> String {
    let raw_path = url.path().trim_end_matches('/');
    let path = raw_path.trim_start_matches('/');

    let mut key = if path.is_empty() {
        "index".to_string()
    } else {
        path.split('/')
            .map(sanitize_segment)
            .collect::<Vec<_>>()
            .join("/")
    };

    if include_query {
        if let Some(query_slug) = query_slug(url) {
            key = format!("{key}__{query_slug}");
        }
    }

    key
}

/// Build the deterministic, sorted `k_v__k_v` query slug used both by page
/// keys (when `includePageQueryInPath`) and by the product key (§4.7),
/// which always includes query params when present.
#[must_use]
pub fn query_slug(url: &Url) -> Option<String> {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (sanitize_segment(&k), sanitize_segment(&v)))
        .collect();
    if pairs.is_empty() {
        return None;
    }
    pairs.sort();
    Some(
        pairs
            .into_iter()
            .map(|(k, v)| format!("{k}_{v}"))
            .collect::<Vec<_>>()
            .join("__"),
    )
}

/// Whether `url` looks like a document rather than a static asset: its
/// last path segment has no extension, or it carries a query string. Used
/// both by link rewriting (§4.4 "Link rewriting") and graph-driven
/// capture ordering (§4.5 "Ordering rule").
#[must_use]
pub fn is_document_like(url: &Url) -> bool {
    let last_segment = url.path_segments().and_then(|mut s| s.next_back()).unwrap_or("");
    !last_segment.contains('.') || url.query().is_some()
}

/// Product key per §4.7: `pathname (trailing-/-stripped)` plus,
/// when query params are present, `"::" + sorted(k=v)` joined by `&`.
#[must_use]
pub fn product_key(url: &Url) -> String {
    let path = url.path().trim_end_matches('/');
    let path = if path.is_empty() { "/" } else { path };

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        return path.to_string();
    }
    pairs.sort();
    let query = pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{path}::{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_becomes_index() {
        let url = Url::parse("https://shop.example.com/").unwrap();
        assert_eq!(derive_page_key(&url, false), "index");
    }

    #[test]
    fn trailing_slash_stripped() {
        let url = Url::parse("https://shop.example.com/catalog/shoes/").unwrap();
        assert_eq!(derive_page_key(&url, false), "catalog/shoes");
    }

    #[test]
    fn query_slug_sorted_and_joined() {
        let url = Url::parse(
            "https://x.test/index.php?route=product/category&path=20",
        )
        .unwrap();
        assert_eq!(derive_page_key(&url, true), "index.php__path_20__route_product_category");
    }

    #[test]
    fn query_ignored_when_disabled() {
        let url = Url::parse("https://x.test/index.php?route=product/category&path=20").unwrap();
        assert_eq!(derive_page_key(&url, false), "index.php");
    }

    #[test]
    fn equivalent_urls_produce_stable_keys() {
        let a = Url::parse("https://x.test/a/b?x=1&y=2").unwrap();
        let b = Url::parse("https://x.test/a/b?y=2&x=1").unwrap();
        assert_eq!(derive_page_key(&a, true), derive_page_key(&b, true));
    }

    #[test]
    fn product_key_matches_spec_example() {
        let url = Url::parse("https://x.test/p/abc").unwrap();
        assert_eq!(product_key(&url), "/p/abc");

        let url2 = Url::parse("https://x.test/index.php?route=product/product&product_id=42").unwrap();
        assert_eq!(product_key(&url2), "/index.php::product_id=42&route=product/product");
    }
}

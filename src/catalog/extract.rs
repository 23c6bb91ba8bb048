//! Product extraction (§4.7 "Extraction"): JSON-LD `@type == Product`
//! (including inside `@graph` arrays) first, heuristic selectors as
//! fallback. Grounded on `page_extractor/schema.rs`'s
//! loosely-typed `serde_json::Value` traversal.

use regex::Regex;
use serde_json::Value;

use super::Price;

#[derive(Debug, Clone)]
pub struct ExtractedProduct {
    pub name: String,
    pub description: String,
    pub price: Option<Price>,
    pub images: Vec<String>,
}

fn find_json_ld_blocks(html: &str) -> Vec<Value> {
    let re = Regex::new(r#"(?is)<script[^>]*type=["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .unwrap_or_else(|_| Regex::new("$^").unwrap());
    re.captures_iter(html).filter_map(|c| c.get(1)).filter_map(|m| serde_json::from_str(m.as_str()).ok()).collect()
}

fn flatten_graph(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.iter().flat_map(flatten_graph).collect(),
        Value::Object(map) if map.contains_key("@graph") => {
            map.get("@graph").map(flatten_graph).unwrap_or_default()
        }
        other => vec![other.clone()],
    }
}

fn is_product(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(s)) => s == "Product",
        Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some("Product")),
        _ => false,
    }
}

fn price_from_json_ld(value: &Value) -> Option<Price> {
    let offers = value.get("offers")?;
    let offers = match offers {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let amount = offers.get("price").and_then(|v| v.as_str().and_then(|s| s.parse().ok()).or_else(|| v.as_f64()))?;
    let currency = offers.get("priceCurrency").and_then(Value::as_str).unwrap_or("USD").to_string();
    Some(Price { amount, currency })
}

fn images_from_json_ld(value: &Value) -> Vec<String> {
    match value.get("image") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}

fn extract_from_json_ld(html: &str) -> Option<ExtractedProduct> {
    for block in find_json_ld_blocks(html) {
        for candidate in flatten_graph(&block) {
            if !is_product(&candidate) {
                continue;
            }
            let name = candidate.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
            let description = candidate.get("description").and_then(Value::as_str).unwrap_or_default().to_string();
            let price = price_from_json_ld(&candidate);
            let images = images_from_json_ld(&candidate);
            if name.is_empty() || price.is_none() || images.is_empty() {
                // Open Question (a), stricter behavior: an imageless (or
                // nameless/priceless) product is rejected even on the
                // JSON-LD path. See DESIGN.md.
                continue;
            }
            return Some(ExtractedProduct { name, description, price, images });
        }
    }
    None
}

fn extract_heuristic(html: &str) -> Option<ExtractedProduct> {
    let h1_re = Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").ok()?;
    let og_title_re = Regex::new(r#"(?i)<meta[^>]+property=["']og:title["'][^>]+content=["']([^"']*)["']"#).ok()?;
    let price_currency_re =
        Regex::new(r#"(?i)<meta[^>]+itemprop=["']priceCurrency["'][^>]+content=["']([^"']*)["']"#).ok()?;
    let price_re = Regex::new(r"[$€£]\s?(\d+(?:[.,]\d{2})?)").ok()?;
    let img_re = Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).ok()?;

    let name = h1_re
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| strip_tags(m.as_str()))
        .or_else(|| og_title_re.captures(html).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))?;

    let currency = price_currency_re.captures(html).and_then(|c| c.get(1)).map(|m| m.as_str().to_string());
    let amount = price_re.captures(html).and_then(|c| c.get(1)).and_then(|m| m.as_str().replace(',', ".").parse().ok());
    let price = amount.map(|amount| Price { amount, currency: currency.unwrap_or_else(|| "USD".to_string()) });

    let images: Vec<String> = img_re.captures_iter(html).filter_map(|c| c.get(1)).map(|m| m.as_str().to_string()).collect();

    if name.trim().is_empty() || price.is_none() || images.is_empty() {
        return None;
    }

    Some(ExtractedProduct { name, description: String::new(), price, images })
}

fn strip_tags(s: &str) -> String {
    let re = Regex::new(r"<[^>]+>").unwrap_or_else(|_| Regex::new("$^").unwrap());
    re.replace_all(s, "").trim().to_string()
}

/// Try JSON-LD first, then the heuristic selector fallback.
#[must_use]
pub fn extract_product(html: &str) -> Option<ExtractedProduct> {
    extract_from_json_ld(html).or_else(|| extract_heuristic(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_product_from_json_ld_with_graph_wrapper() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@graph":[{"@type":"Product","name":"Boots","offers":{"price":"42","priceCurrency":"USD"},"image":"https://x.test/b.jpg"}]}
        </script></head></html>"#;
        let product = extract_product(html).expect("product found");
        assert_eq!(product.name, "Boots");
        assert_eq!(product.price.unwrap().amount, 42.0);
    }

    #[test]
    fn rejects_json_ld_product_without_image() {
        let html = r#"<script type="application/ld+json">
            {"@type":"Product","name":"Boots","offers":{"price":"42","priceCurrency":"USD"}}
        </script>"#;
        assert!(extract_product(html).is_none());
    }

    #[test]
    fn falls_back_to_heuristic_extraction() {
        let html = r#"<h1>Running Shoes</h1><p>$59.99</p><img src="/shoe.jpg">"#;
        let product = extract_product(html).expect("heuristic product found");
        assert_eq!(product.name, "Running Shoes");
        assert_eq!(product.price.unwrap().amount, 59.99);
    }
}

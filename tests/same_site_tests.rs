//! Integration tests for the same-site classifier across all three modes.

use sitemirror::config::SameSiteMode;
use sitemirror::same_site::SameSiteClassifier;

#[test]
fn etld_mode_treats_www_and_apex_as_the_same_site() {
    let classifier =
        SameSiteClassifier::new(&["https://www.example.com/".to_string()], SameSiteMode::Etld, None);
    assert!(classifier.is_same_site("https://example.com/about"));
    assert!(classifier.is_same_site("https://shop.example.com/cart"));
}

#[test]
fn exact_mode_rejects_subdomains() {
    let classifier =
        SameSiteClassifier::new(&["https://www.example.com/".to_string()], SameSiteMode::Exact, None);
    assert!(classifier.is_same_site("https://www.example.com/about"));
    assert!(!classifier.is_same_site("https://shop.example.com/cart"));
}

#[test]
fn subdomains_mode_accepts_any_subdomain_of_a_seed() {
    let classifier =
        SameSiteClassifier::new(&["https://example.com/".to_string()], SameSiteMode::Subdomains, None);
    assert!(classifier.is_same_site("https://shop.example.com/cart"));
    assert!(!classifier.is_same_site("https://other.com/"));
}

#[test]
fn malformed_urls_fail_closed() {
    let classifier =
        SameSiteClassifier::new(&["https://example.com/".to_string()], SameSiteMode::Etld, None);
    assert!(!classifier.is_same_site("not a url"));
}

#[test]
fn extra_regex_matches_regardless_of_mode() {
    let extra = regex::Regex::new(r"^cdn\d+\.other\.com$").unwrap();
    let classifier = SameSiteClassifier::new(
        &["https://example.com/".to_string()],
        SameSiteMode::Exact,
        Some(extra),
    );
    assert!(classifier.is_same_site("https://cdn1.other.com/assets/logo.png"));
    assert!(!classifier.is_same_site("https://cdn.other.com/assets/logo.png"));
}

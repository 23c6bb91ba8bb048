//! Same-site classifier (§4.1).
//!
//! Given the seed URLs and a [`SameSiteMode`], decides whether an arbitrary
//! URL belongs to the target site. Classification fails closed: any URL
//! that fails to parse, or whose host cannot be determined, is treated as
//! not same-site rather than erroring out — a parse failure anywhere in a
//! BFS frontier must never abort the crawl.

use std::collections::HashSet;

use url::Url;

use crate::config::SameSiteMode;

/// Two-label suffixes that make a naive "last two labels" eTLD+1
/// computation wrong (e.g. `co.uk`, not `uk`). Not exhaustive — this is the
/// "small built-in multi-label TLD set" this design calls for, not a full
/// Public Suffix List.
const MULTI_LABEL_TLDS: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "co.jp", "ne.jp", "or.jp", "ac.jp",
    "com.au", "net.au", "org.au", "co.nz", "org.nz", "co.za", "com.br",
    "com.mx", "com.cn", "com.hk", "com.sg", "co.in", "co.id", "com.tw",
];

/// Lowercased host + port-stripped origin, used for `exact` mode membership.
fn origin_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(format!("{}://{}", url.scheme(), host))
}

fn apex_domain(host: &str) -> String {
    let host = host.to_lowercase();
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return host;
    }
    for suffix in MULTI_LABEL_TLDS {
        let suffix_labels = suffix.split('.').count();
        if labels.len() > suffix_labels {
            let candidate = labels[labels.len() - suffix_labels - 1..].join(".");
            if candidate.ends_with(suffix) {
                return candidate;
            }
        }
    }
    labels[labels.len().saturating_sub(2)..].join(".")
}

/// Precomputed membership sets derived from the seed list, so per-URL
/// classification is O(1) set lookups rather than re-parsing every seed.
#[derive(Clone)]
pub struct SameSiteClassifier {
    mode: SameSiteMode,
    origins: HashSet<String>,
    hosts: HashSet<String>,
    apex_domains: HashSet<String>,
    extra_regex: Option<regex::Regex>,
}

impl SameSiteClassifier {
    #[must_use]
    pub fn new(seeds: &[String], mode: SameSiteMode, extra_regex: Option<regex::Regex>) -> Self {
        let mut origins = HashSet::new();
        let mut hosts = HashSet::new();
        let mut apex_domains = HashSet::new();

        for seed in seeds {
            let Ok(url) = Url::parse(seed) else { continue };
            if let Some(origin) = origin_key(&url) {
                origins.insert(origin);
            }
            if let Some(host) = url.host_str() {
                hosts.insert(host.to_lowercase());
                apex_domains.insert(apex_domain(host));
            }
        }

        Self {
            mode,
            origins,
            hosts,
            apex_domains,
            extra_regex,
        }
    }

    /// `isSameSite(url) -> bool` per §4.1.
    #[must_use]
    pub fn is_same_site(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_lowercase();

        if let Some(re) = &self.extra_regex
            && re.is_match(&host)
        {
            return true;
        }

        match self.mode {
            SameSiteMode::Exact => origin_key(&parsed).is_some_and(|o| self.origins.contains(&o)),
            SameSiteMode::Subdomains => {
                self.hosts.contains(&host)
                    || self.hosts.iter().any(|seed_host| host.ends_with(&format!(".{seed_host}")))
            }
            SameSiteMode::Etld => self.apex_domains.contains(&apex_domain(&host)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(mode: SameSiteMode) -> SameSiteClassifier {
        SameSiteClassifier::new(&["https://shop.example.com/".to_string()], mode, None)
    }

    #[test]
    fn etld_treats_www_and_apex_as_same_site() {
        let c = classifier(SameSiteMode::Etld);
        assert!(c.is_same_site("https://shop.example.com/page"));
        assert!(c.is_same_site("https://www.shop.example.com/page"));
        assert!(!c.is_same_site("https://other.com/page"));
    }

    #[test]
    fn etld_handles_multi_label_suffixes() {
        let c = SameSiteClassifier::new(&["https://shop.example.co.uk/".to_string()], SameSiteMode::Etld, None);
        assert!(c.is_same_site("https://www.shop.example.co.uk/x"));
        assert!(!c.is_same_site("https://example.co.uk/x"));
    }

    #[test]
    fn subdomains_is_superset_of_exact() {
        let exact = classifier(SameSiteMode::Exact);
        let subs = classifier(SameSiteMode::Subdomains);
        let urls = ["https://shop.example.com/", "https://cdn.shop.example.com/x"];
        for u in urls {
            if exact.is_same_site(u) {
                assert!(subs.is_same_site(u), "subdomains must be superset of exact for {u}");
            }
        }
        assert!(subs.is_same_site("https://cdn.shop.example.com/x"));
        assert!(!exact.is_same_site("https://cdn.shop.example.com/x"));
    }

    #[test]
    fn reflexive_on_seeds() {
        for mode in [SameSiteMode::Exact, SameSiteMode::Subdomains, SameSiteMode::Etld] {
            let c = classifier(mode);
            assert!(c.is_same_site("https://shop.example.com/"));
        }
    }

    #[test]
    fn fails_closed_on_parse_error() {
        let c = classifier(SameSiteMode::Etld);
        assert!(!c.is_same_site("not a url"));
        assert!(!c.is_same_site(""));
    }

    #[test]
    fn extra_regex_matches_unconditionally() {
        let c = SameSiteClassifier::new(
            &["https://shop.example.com/".to_string()],
            SameSiteMode::Exact,
            Some(regex::Regex::new(r"^cdn\.other\.net$").unwrap()),
        );
        assert!(c.is_same_site("https://cdn.other.net/a.js"));
        assert!(!c.is_same_site("https://other.net/a.js"));
    }
}

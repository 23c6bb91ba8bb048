//! Proxy rotation policy (§4.8 "Proxy rotation"), grounded on the
//! teacher's per-crawl `chrome_data_dir` isolation pattern in
//! `browser_profile.rs`, generalized from profile isolation to proxy
//! selection.

use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;

use crate::config::{ProxyConfig, ProxyEntry};

/// Tracks which proxy a page should use and advances the rotation policy
/// as pages complete. Shared across the worker pool.
pub struct ProxyRotator {
    index: AtomicU32,
    pages_on_current: AtomicU32,
}

impl ProxyRotator {
    #[must_use]
    pub fn new() -> Self {
        Self { index: AtomicU32::new(0), pages_on_current: AtomicU32::new(0) }
    }

    /// Select the proxy for the next page, substituting a fresh
    /// `session-<hex>` token into the username when `rotate_session` is
    /// enabled, per §4.8.
    #[must_use]
    pub fn select(&self, config: &ProxyConfig) -> Option<ProxyEntry> {
        if config.proxies.is_empty() {
            return None;
        }
        let idx = self.index.load(Ordering::Relaxed) as usize % config.proxies.len();
        let mut entry = config.proxies[idx].clone();

        if config.rotate_session
            && let Some(username) = entry.username.as_deref()
        {
            let session: String = (0..8).map(|_| format!("{:x}", rand::rng().random_range(0..16u8))).collect();
            entry.username = Some(substitute_session(username, &session));
        }
        Some(entry)
    }

    /// Advance rotation state after a page completes, per the policy in
    /// §4.8: "When `STABLE_SESSION=false` and `ROTATE_EVERY>0`,
    /// advance `proxyIndex` every N pages."
    pub fn record_page_complete(&self, config: &ProxyConfig) {
        if config.stable_session || config.rotate_every == 0 {
            return;
        }
        let count = self.pages_on_current.fetch_add(1, Ordering::Relaxed) + 1;
        if count >= config.rotate_every {
            self.pages_on_current.store(0, Ordering::Relaxed);
            self.index.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Default for ProxyRotator {
    fn default() -> Self {
        Self::new()
    }
}

fn substitute_session(username: &str, session_hex: &str) -> String {
    if username.contains("session-") {
        let re = regex::Regex::new(r"session-[0-9a-fA-F]+").unwrap();
        re.replace(username, format!("session-{session_hex}")).to_string()
    } else {
        format!("{username}-session-{session_hex}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxies() -> ProxyConfig {
        ProxyConfig {
            proxies: vec![
                ProxyEntry { server: "http://p1:8080".into(), username: Some("user-session-0000".into()), password: None },
                ProxyEntry { server: "http://p2:8080".into(), username: Some("user-session-0000".into()), password: None },
            ],
            stable_session: false,
            rotate_every: 2,
            rotate_session: false,
            disable_http2: false,
        }
    }

    #[test]
    fn rotates_every_n_pages() {
        let rotator = ProxyRotator::new();
        let config = proxies();
        let first = rotator.select(&config).unwrap().server;
        rotator.record_page_complete(&config);
        let still_first = rotator.select(&config).unwrap().server;
        rotator.record_page_complete(&config);
        let rotated = rotator.select(&config).unwrap().server;
        assert_eq!(first, still_first);
        assert_ne!(first, rotated);
    }

    #[test]
    fn stable_session_never_rotates() {
        let rotator = ProxyRotator::new();
        let mut config = proxies();
        config.stable_session = true;
        let first = rotator.select(&config).unwrap().server;
        for _ in 0..10 {
            rotator.record_page_complete(&config);
        }
        let after = rotator.select(&config).unwrap().server;
        assert_eq!(first, after);
    }

    #[test]
    fn session_rotation_substitutes_token() {
        let rotator = ProxyRotator::new();
        let mut config = proxies();
        config.rotate_session = true;
        let entry = rotator.select(&config).unwrap();
        let username = entry.username.unwrap();
        assert!(username.starts_with("user-session-"));
        assert_ne!(username, "user-session-0000");
    }
}

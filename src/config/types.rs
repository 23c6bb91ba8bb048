//! Configuration value types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Browser engine choice. Chromium is the only driver implemented today
/// (via `chromiumoxide`); the other variants exist so the driver
/// abstraction (§9) and config surface are already shaped for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Chromium,
    Firefox,
    Webkit,
}

impl Default for Engine {
    fn default() -> Self {
        Self::Chromium
    }
}

/// Navigation completion condition passed to `goto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
    NetworkIdle,
    Commit,
}

impl Default for WaitUntil {
    fn default() -> Self {
        Self::Load
    }
}

/// Same-site classification mode (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSiteMode {
    Exact,
    Subdomains,
    Etld,
}

impl Default for SameSiteMode {
    fn default() -> Self {
        Self::Etld
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Pretty
    }
}

/// Scope settings: which URLs are same-site, and how cross-origin assets
/// are handled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeConfig {
    pub profiles: Vec<String>,
    pub same_site_mode: SameSiteMode,
    #[serde(with = "serde_regex_option", default)]
    pub internal_hosts_regex: Option<regex::Regex>,
    pub include_cross_origin: bool,
    pub mirror_subdomains: bool,
    pub mirror_cross_origin: bool,
    pub preserve_asset_paths: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            profiles: vec!["desktop".to_string(), "mobile".to_string()],
            same_site_mode: SameSiteMode::default(),
            internal_hosts_regex: None,
            include_cross_origin: false,
            mirror_subdomains: true,
            mirror_cross_origin: false,
            preserve_asset_paths: true,
        }
    }
}

/// HTML rewriting and offline-fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    pub rewrite_internal: bool,
    #[serde(with = "serde_regex_option", default)]
    pub internal_rewrite_regex: Option<regex::Regex>,
    pub rewrite_html_assets: bool,
    pub flatten_root_index: bool,
    pub include_page_query_in_path: bool,
    pub offline_fallback: bool,
    pub offline_map_strip_query: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            rewrite_internal: true,
            internal_rewrite_regex: None,
            rewrite_html_assets: true,
            flatten_root_index: true,
            include_page_query_in_path: false,
            offline_fallback: true,
            offline_map_strip_query: true,
        }
    }
}

/// Consent/popup resolver tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentConfig {
    pub button_texts: Vec<String>,
    pub extra_selectors: Vec<String>,
    pub force_remove_selectors: Vec<String>,
    pub retry_attempts: u32,
    pub retry_interval_ms: u64,
    pub mutation_window_ms: u64,
    pub iframe_scan: bool,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            button_texts: Vec::new(),
            extra_selectors: Vec::new(),
            force_remove_selectors: Vec::new(),
            retry_attempts: 3,
            retry_interval_ms: 400,
            mutation_window_ms: 1500,
            iframe_scan: true,
        }
    }
}

/// One upstream HTTP proxy, with optional per-page session rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyEntry {
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Proxy rotation policy (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProxyConfig {
    pub proxies: Vec<ProxyEntry>,
    pub stable_session: bool,
    pub rotate_every: u32,
    pub rotate_session: bool,
    pub disable_http2: bool,
}

/// Discovery crawler settings (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub discover: bool,
    pub use_discovery_graph: bool,
    pub max_pages: usize,
    pub max_depth: u32,
    #[serde(with = "serde_regex_option", default)]
    pub allow_regex: Option<regex::Regex>,
    #[serde(with = "serde_regex_option", default)]
    pub deny_regex: Option<regex::Regex>,
    pub graph_doc_like_only: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            discover: false,
            use_discovery_graph: false,
            max_pages: 200,
            max_depth: 3,
            allow_regex: None,
            deny_regex: None,
            graph_doc_like_only: false,
        }
    }
}

/// Product catalog / payment-map generation settings (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub enable_catalog: bool,
    pub generate_payment_map: bool,
    pub payment_placeholder: String,
    pub payment_provider: String,
    pub payment_target: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enable_catalog: false,
            generate_payment_map: false,
            payment_placeholder: "PLACEHOLDER".to_string(),
            payment_provider: "manual".to_string(),
            payment_target: String::new(),
        }
    }
}

/// Top-level run configuration. Construct via [`Config::builder`] or
/// [`Config::from_toml_file`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage_dir: PathBuf,
    pub seeds: Vec<String>,
    pub primary_seed: String,

    pub engine: Engine,
    pub headless: bool,
    pub concurrency: usize,
    pub nav_timeout_ms: u64,
    pub page_timeout_ms: u64,
    pub wait_until: WaitUntil,
    pub wait_extra_ms: u64,
    pub quiet_millis: u64,
    pub max_capture_ms: u64,
    pub scroll_passes: u32,
    pub scroll_delay_ms: u64,
    pub asset_max_bytes: u64,
    pub inline_small_assets: u64,
    pub stealth_mode: bool,
    pub block_trackers: bool,

    pub scope: ScopeConfig,
    pub rewrite: RewriteConfig,
    pub consent: ConsentConfig,
    pub proxy: ProxyConfig,
    pub discovery: DiscoveryConfig,
    pub catalog: CatalogConfig,

    /// Log verbosity, in `tracing_subscriber::EnvFilter` syntax.
    pub log_level: String,
    pub log_format: LogFormat,
    /// When set, the orchestrator validates config and plans the run
    /// (seed ordering, directory layout) but never launches a browser.
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./mirror-output"),
            seeds: Vec::new(),
            primary_seed: String::new(),
            engine: Engine::default(),
            headless: true,
            concurrency: 4,
            nav_timeout_ms: 30_000,
            page_timeout_ms: 60_000,
            wait_until: WaitUntil::default(),
            wait_extra_ms: 0,
            quiet_millis: 800,
            max_capture_ms: 45_000,
            scroll_passes: 3,
            scroll_delay_ms: 250,
            asset_max_bytes: 25 * 1024 * 1024,
            inline_small_assets: 8 * 1024,
            stealth_mode: false,
            block_trackers: false,
            scope: ScopeConfig::default(),
            rewrite: RewriteConfig::default(),
            consent: ConsentConfig::default(),
            proxy: ProxyConfig::default(),
            discovery: DiscoveryConfig::default(),
            catalog: CatalogConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            dry_run: false,
        }
    }
}

/// `serde` helper for `Option<Regex>` fields, since `Regex` itself is not
/// `Serialize`/`Deserialize`. Stored as the pattern string.
mod serde_regex_option {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<regex::Regex>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(re) => s.serialize_some(re.as_str()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<regex::Regex>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            Some(pattern) => regex::Regex::new(&pattern)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

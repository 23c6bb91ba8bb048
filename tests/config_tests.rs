//! Tests for the configuration builder and TOML loading.

use sitemirror::config::Config;
use std::io::Write;
use tempfile::TempDir;

#[test]
fn builder_requires_an_absolute_url_primary_seed() {
    let dir = TempDir::new().unwrap();
    let result = Config::builder(dir.path(), "not-a-url").build();
    assert!(result.is_err());
}

#[test]
fn builder_includes_primary_seed_in_seed_list() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder(dir.path(), "https://example.com").build().unwrap();
    assert_eq!(config.seeds, vec!["https://example.com".to_string()]);
    assert_eq!(config.primary_seed, "https://example.com");
}

#[test]
fn builder_appends_additional_seeds() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder(dir.path(), "https://example.com")
        .seed("https://example.com/about")
        .seeds(vec!["https://example.com/contact".to_string()])
        .build()
        .unwrap();
    assert_eq!(config.seeds.len(), 3);
}

#[test]
fn builder_normalizes_storage_dir_to_an_absolute_path() {
    let config = Config::builder("relative/output", "https://example.com").build().unwrap();
    assert!(config.storage_dir.is_absolute());
}

#[test]
fn builder_falls_back_to_desktop_profile_when_none_configured() {
    use sitemirror::config::ScopeConfig;
    let dir = TempDir::new().unwrap();
    let config = Config::builder(dir.path(), "https://example.com")
        .scope(ScopeConfig { profiles: vec![], ..ScopeConfig::default() })
        .build()
        .unwrap();
    assert_eq!(config.scope.profiles, vec!["desktop".to_string()]);
}

#[test]
fn from_toml_file_loads_and_overlays_defaults() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("mirror.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    write!(
        file,
        r#"
storage_dir = "./mirror-output"
seeds = ["https://example.com"]
primary_seed = "https://example.com"
engine = "chromium"
headless = true
concurrency = 2
nav_timeout_ms = 30000
page_timeout_ms = 60000
wait_until = "load"
wait_extra_ms = 0
quiet_millis = 800
max_capture_ms = 45000
scroll_passes = 1
scroll_delay_ms = 100
asset_max_bytes = 1000000
inline_small_assets = 1024
stealth_mode = false
block_trackers = false
log_level = "info"
log_format = "pretty"
dry_run = false

[scope]
profiles = ["desktop"]
same_site_mode = "etld"
include_cross_origin = false
mirror_subdomains = true
mirror_cross_origin = false
preserve_asset_paths = true

[rewrite]
rewrite_internal = true
rewrite_html_assets = true
flatten_root_index = true
include_page_query_in_path = false
offline_fallback = true
offline_map_strip_query = true

[consent]
button_texts = []
extra_selectors = []
force_remove_selectors = []
retry_attempts = 3
retry_interval_ms = 400
mutation_window_ms = 1500
iframe_scan = true

[proxy]
proxies = []
stable_session = false
rotate_every = 0
rotate_session = false
disable_http2 = false

[discovery]
discover = false
use_discovery_graph = false
max_pages = 200
max_depth = 3
graph_doc_like_only = false

[catalog]
enable_catalog = false
generate_payment_map = false
payment_placeholder = "PLACEHOLDER"
payment_provider = "manual"
payment_target = ""
"#
    )
    .unwrap();

    let config = Config::from_toml_file(&config_path).unwrap();
    assert_eq!(config.concurrency, 2);
    assert_eq!(config.seeds, vec!["https://example.com".to_string()]);
}

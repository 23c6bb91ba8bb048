//! Core configuration for a mirror run.
//!
//! `Config` mirrors the configuration surface in §6: engine, scope,
//! rewriting, consent/popup, proxies, discovery, and catalog settings, plus
//! the ambient logging/runtime fields every run carries regardless of which
//! features are turned on.

mod builder;
mod device_profile;
mod types;

pub use builder::ConfigBuilder;
pub use device_profile::DeviceProfile;
pub use types::{
    CatalogConfig, Config, ConsentConfig, DiscoveryConfig, Engine, LogFormat, ProxyConfig,
    ProxyEntry, RewriteConfig, SameSiteMode, ScopeConfig, WaitUntil,
};

impl Config {
    /// Start building a config for the given primary seed and storage dir.
    #[must_use]
    pub fn builder(storage_dir: impl Into<std::path::PathBuf>, primary_seed: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(storage_dir, primary_seed)
    }

    /// Load a config from a TOML file, falling back to `Config::default`
    /// fields for anything unset. Environment variables are applied first
    /// via `dotenvy`, with environment variables taking precedence over
    /// the file.
    pub fn from_toml_file(path: &std::path::Path) -> crate::error::MirrorResult<Self> {
        let _ = dotenvy::dotenv();
        let raw = std::fs::read_to_string(path).map_err(|source| crate::error::MirrorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw)
            .map_err(|e| crate::error::MirrorError::Config(format!("invalid config file: {e}")))
    }
}

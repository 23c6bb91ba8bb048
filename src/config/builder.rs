//! Plain consuming builder over [`Config`], following the same
//! `#[must_use] pub fn with_x(mut self, ...) -> Self` idiom used
//! throughout this crate's optional config extensions.

use std::path::PathBuf;

use super::types::{CatalogConfig, Config, ConsentConfig, DiscoveryConfig, ProxyConfig, RewriteConfig, ScopeConfig};
use crate::error::{MirrorError, MirrorResult};

pub struct ConfigBuilder {
    inner: Config,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new(storage_dir: impl Into<PathBuf>, primary_seed: impl Into<String>) -> Self {
        let primary_seed = primary_seed.into();
        let mut inner = Config {
            storage_dir: storage_dir.into(),
            primary_seed: primary_seed.clone(),
            ..Config::default()
        };
        inner.seeds = vec![primary_seed];
        Self { inner }
    }

    /// Add an additional seed URL (the primary seed is always included).
    #[must_use]
    pub fn seed(mut self, url: impl Into<String>) -> Self {
        self.inner.seeds.push(url.into());
        self
    }

    #[must_use]
    pub fn seeds(mut self, urls: impl IntoIterator<Item = String>) -> Self {
        self.inner.seeds.extend(urls);
        self
    }

    #[must_use]
    pub fn concurrency(mut self, n: usize) -> Self {
        self.inner.concurrency = n.max(1);
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.inner.headless = headless;
        self
    }

    #[must_use]
    pub fn scope(mut self, scope: ScopeConfig) -> Self {
        self.inner.scope = scope;
        self
    }

    #[must_use]
    pub fn rewrite(mut self, rewrite: RewriteConfig) -> Self {
        self.inner.rewrite = rewrite;
        self
    }

    #[must_use]
    pub fn consent(mut self, consent: ConsentConfig) -> Self {
        self.inner.consent = consent;
        self
    }

    #[must_use]
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.inner.proxy = proxy;
        self
    }

    #[must_use]
    pub fn discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.inner.discovery = discovery;
        self
    }

    #[must_use]
    pub fn catalog(mut self, catalog: CatalogConfig) -> Self {
        self.inner.catalog = catalog;
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.inner.dry_run = dry_run;
        self
    }

    /// Finalize the config: normalizes `storage_dir` to an absolute path
    /// (the invariant every downstream module relies on) and validates the
    /// primary seed parses as an absolute URL.
    pub fn build(mut self) -> MirrorResult<Config> {
        if url::Url::parse(&self.inner.primary_seed).is_err() {
            return Err(MirrorError::Config(format!(
                "primary seed is not an absolute URL: {}",
                self.inner.primary_seed
            )));
        }
        if self.inner.scope.profiles.is_empty() {
            self.inner.scope.profiles = vec!["desktop".to_string()];
        }
        self.inner.storage_dir = std::path::absolute(&self.inner.storage_dir).map_err(|source| MirrorError::Io {
            path: self.inner.storage_dir.clone(),
            source,
        })?;
        Ok(self.inner)
    }
}

//! Asset store & index (§4.2).
//!
//! Content-addressed or path-preserving file store with an in-memory map
//! `absolute URL -> AssetRecord`, shared across the profiles of a page.
//! Grounded on the `inline_css` downloader pipeline and
//! `link_index`'s concurrent-map-over-`DashMap` shape, generalized from
//! CSS/image mirroring to arbitrary asset types.

mod extension;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine as _;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::trace;
use url::Url;

pub use extension::guess_extension;

/// `{ absoluteURL, localPath, rewriteTo, inlineDataURI?, contentType, size }`
/// per §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub absolute_url: String,
    pub local_path: String,
    pub rewrite_to: String,
    pub inline_data_uri: Option<String>,
    pub content_type: String,
    pub size: u64,
}

/// Where a decided asset path places the bytes, before anything is
/// written. Returned by [`AssetIndex::decide_path`].
pub struct DecidedPath {
    pub local_path: String,
    pub rewrite_to: String,
}

/// Per-page-group shared asset index. One instance is created per URL (all
/// its device profiles share it) and discarded after that URL's capture
/// group completes, per §3 ownership rules.
pub struct AssetIndex {
    storage_dir: PathBuf,
    records: DashMap<String, AssetRecord>,
    asset_max_bytes: u64,
    inline_small_assets: u64,
    preserve_asset_paths: bool,
    mirror_cross_origin: bool,
}

impl AssetIndex {
    #[must_use]
    pub fn new(
        storage_dir: impl Into<PathBuf>,
        asset_max_bytes: u64,
        inline_small_assets: u64,
        preserve_asset_paths: bool,
        mirror_cross_origin: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            storage_dir: storage_dir.into(),
            records: DashMap::new(),
            asset_max_bytes,
            inline_small_assets,
            preserve_asset_paths,
            mirror_cross_origin,
        })
    }

    /// `decideAssetPath(url, baseOrigin) -> {localPath, rewriteTo, group}`
    /// per §4.2. `same_site` is the already-evaluated classifier
    /// result for `url`; `content_type` feeds extension guessing when the
    /// URL path has no extension of its own.
    #[must_use]
    pub fn decide_path(&self, url: &Url, same_site: bool, content_type: &str) -> DecidedPath {
        let has_ext = Path::new(url.path()).extension().is_some();
        let ext = if has_ext { String::new() } else { guess_extension(content_type) };

        if self.preserve_asset_paths && same_site {
            let local_path = format!("{}{ext}", url.path().trim_start_matches('/'));
            let rewrite_to = format!("/{local_path}");
            return DecidedPath { local_path, rewrite_to };
        }

        if self.mirror_cross_origin && !same_site {
            let host = url.host_str().unwrap_or("unknown-host");
            let local_path = format!("_ext/{host}{}{ext}", url.path());
            let rewrite_to = format!("/{local_path}");
            return DecidedPath { local_path, rewrite_to };
        }

        let mut hasher = Sha256::new();
        hasher.update(url.as_str().as_bytes());
        let digest = hex::encode(hasher.finalize());
        let local_path = format!("assets/{}{ext}", &digest[..16]);
        DecidedPath {
            rewrite_to: local_path.clone(),
            local_path,
        }
    }

    /// `store(url, bytes, contentType)` per §4.2. No-op if the URL
    /// is already indexed (first writer wins). Drops bytes over the byte
    /// cap. Inlines small images as a data URI instead of writing a file.
    pub async fn store(&self, url: &Url, same_site: bool, bytes: &[u8], content_type: &str) -> anyhow::Result<()> {
        let key = url.as_str().to_string();
        if self.records.contains_key(&key) {
            return Ok(());
        }

        let size = bytes.len() as u64;
        if size > self.asset_max_bytes {
            trace!(url = %key, size, cap = self.asset_max_bytes, "dropping oversized asset");
            return Ok(());
        }

        let decided = self.decide_path(url, same_site, content_type);
        let is_image = content_type.starts_with("image/");

        if size <= self.inline_small_assets && is_image {
            let data_uri = format!(
                "data:{content_type};base64,{}",
                base64::engine::general_purpose::STANDARD.encode(bytes)
            );
            self.records.insert(
                key,
                AssetRecord {
                    absolute_url: url.as_str().to_string(),
                    local_path: decided.local_path,
                    rewrite_to: decided.rewrite_to,
                    inline_data_uri: Some(data_uri),
                    content_type: content_type.to_string(),
                    size,
                },
            );
            return Ok(());
        }

        let dest = self.storage_dir.join(&decided.local_path);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if !tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            tokio::fs::write(&dest, bytes).await?;
        }

        self.records.insert(
            key,
            AssetRecord {
                absolute_url: url.as_str().to_string(),
                local_path: decided.local_path,
                rewrite_to: decided.rewrite_to,
                inline_data_uri: None,
                content_type: content_type.to_string(),
                size,
            },
        );
        Ok(())
    }

    #[must_use]
    pub fn get(&self, url: &str) -> Option<AssetRecord> {
        self.records.get(url).map(|r| r.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot `{absoluteURL -> rewriteTo}` for the offline shim, with an
    /// optional query-stripped variant alongside it (§4.4, "Offline
    /// shim").
    #[must_use]
    pub fn shim_map(&self, also_strip_query: bool) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.records.len() * 2);
        for entry in self.records.iter() {
            let record = entry.value();
            let target = record.inline_data_uri.clone().unwrap_or_else(|| record.rewrite_to.clone());
            out.push((record.absolute_url.clone(), target.clone()));
            if also_strip_query
                && let Ok(parsed) = Url::parse(&record.absolute_url)
            {
                let mut stripped = parsed.clone();
                stripped.set_query(None);
                if stripped.as_str() != record.absolute_url {
                    out.push((stripped.as_str().to_string(), target));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dedup_never_loses_a_record_used_by_the_rewriter() {
        let dir = tempfile::tempdir().unwrap();
        let index = AssetIndex::new(dir.path(), 1_000_000, 0, true, false);
        let url = Url::parse("https://shop.example.com/img/a.png").unwrap();

        index.store(&url, true, b"first", "image/png").await.unwrap();
        index.store(&url, true, b"second-should-be-ignored", "image/png").await.unwrap();

        assert_eq!(index.len(), 1);
        let record = index.get(url.as_str()).unwrap();
        assert_eq!(record.size, 5, "first writer wins");
    }

    #[tokio::test]
    async fn oversized_assets_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let index = AssetIndex::new(dir.path(), 4, 0, true, false);
        let url = Url::parse("https://shop.example.com/big.bin").unwrap();
        index.store(&url, true, b"this is too big", "application/octet-stream").await.unwrap();
        assert!(index.get(url.as_str()).is_none());
    }

    #[tokio::test]
    async fn small_images_are_inlined() {
        let dir = tempfile::tempdir().unwrap();
        let index = AssetIndex::new(dir.path(), 1_000_000, 100, true, false);
        let url = Url::parse("https://shop.example.com/icon.png").unwrap();
        index.store(&url, true, b"tiny", "image/png").await.unwrap();
        let record = index.get(url.as_str()).unwrap();
        assert!(record.inline_data_uri.is_some());
    }

    #[test]
    fn same_site_preserves_path() {
        let dir = tempfile::tempdir().unwrap();
        let index = AssetIndex::new(dir.path(), 1_000_000, 0, true, false);
        let url = Url::parse("https://shop.example.com/img/a.png").unwrap();
        let decided = index.decide_path(&url, true, "image/png");
        assert_eq!(decided.local_path, "img/a.png");
        assert_eq!(decided.rewrite_to, "/img/a.png");
    }

    #[test]
    fn cross_origin_falls_back_to_hashed_assets_when_not_mirrored() {
        let dir = tempfile::tempdir().unwrap();
        let index = AssetIndex::new(dir.path(), 1_000_000, 0, true, false);
        let url = Url::parse("https://cdn.other.com/a.js").unwrap();
        let decided = index.decide_path(&url, false, "application/javascript");
        assert!(decided.local_path.starts_with("assets/"));
    }
}

//! Product catalog, SKU registry, and payment map (§4.7), grounded on the
//! teacher's loosely-typed `serde_json::Value` JSON-LD traversal in
//! `page_extractor/schema.rs` and `page_extractor/extractors.rs`'s
//! heuristic-selector fallback pattern, generalized from page metadata
//! extraction to structured product extraction.

mod extract;
mod payment_map;
mod sku;

pub use extract::{extract_product, ExtractedProduct};
pub use payment_map::{legacy_product_id, PaymentMap};
pub use sku::SkuRegistry;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;
use url::Url;

use crate::config::CatalogConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: Option<Price>,
    pub images: Vec<String>,
    pub source: CatalogSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSource {
    pub url: String,
    pub rel_path: String,
}

/// Process-wide catalog, upserted by SKU identity, persisted once at
/// finalization (§5 "Shared resources").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn upsert(&mut self, entry: CatalogEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.sku == entry.sku) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    pub fn write(&self, path: &std::path::Path) -> anyhow::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Process-wide catalog state shared across capture workers (§5 "Shared
/// resources": "writers append/upsert under mutex; persisted once at
/// finalization"). Owned by the run orchestrator, lent to each capture.
pub struct CatalogState {
    config: CatalogConfig,
    catalog: Mutex<Catalog>,
    sku_registry: Mutex<SkuRegistry>,
    payment_map: Mutex<PaymentMap>,
}

impl CatalogState {
    #[must_use]
    pub fn load(run_dir: &Path, config: CatalogConfig) -> Self {
        let catalog_dir = run_dir.join("catalog");
        let sku_registry = SkuRegistry::load_or_default(&catalog_dir.join("sku-map.json"));
        let payment_map =
            PaymentMap::load_or_new(&run_dir.join("_payment-map.json"), &config.payment_provider, &config.payment_target);
        Self { config, catalog: Mutex::new(Catalog::default()), sku_registry: Mutex::new(sku_registry), payment_map: Mutex::new(payment_map) }
    }

    /// Try to extract a product from `html`, assign/reuse its SKU, upsert
    /// the catalog entry, and record the payment-map placeholder. Returns
    /// the assigned SKU so the caller can embed
    /// `<meta name="x-archived-sku">` and `productRefs`.
    pub async fn record_if_product(&self, html: &str, page_url: &Url, rel_path: &str) -> Option<String> {
        if !self.config.enable_catalog {
            return None;
        }
        let extracted = extract_product(html)?;
        let key = product_key(page_url);
        let sku = self.sku_registry.lock().await.assign(&key);

        self.catalog.lock().await.upsert(CatalogEntry {
            sku: sku.clone(),
            name: extracted.name,
            description: extracted.description,
            price: extracted.price,
            images: extracted.images,
            source: CatalogSource { url: page_url.to_string(), rel_path: rel_path.to_string() },
        });

        if self.config.generate_payment_map {
            let legacy_id = legacy_product_id(page_url);
            self.payment_map.lock().await.record(legacy_id.as_deref(), &sku, &self.config.payment_placeholder);
        }

        Some(sku)
    }

    pub async fn finalize(&self, run_dir: &Path) -> anyhow::Result<()> {
        let catalog_dir = run_dir.join("catalog");
        std::fs::create_dir_all(&catalog_dir)?;
        self.catalog.lock().await.write(&catalog_dir.join("catalog.json"))?;
        self.sku_registry.lock().await.write(&catalog_dir.join("sku-map.json"))?;
        self.payment_map.lock().await.write(&run_dir.join("_payment-map.json"))?;
        Ok(())
    }
}

/// `pathname (trailing-/-stripped)` plus, when query params are present,
/// `"::" + sorted(k=v)` joined by `&` — identical derivation to
/// [`crate::page_key::product_key`], re-exported here under the catalog's
/// own name for call-site clarity.
#[must_use]
pub fn product_key(url: &url::Url) -> String {
    crate::page_key::product_key(url)
}

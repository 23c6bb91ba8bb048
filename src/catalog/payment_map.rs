//! Payment map (§3 "Payment map", §4.7 "Payment map"): `{ provider, target,
//! map: {productId → placeholder}, bySku: {sku → placeholder} }`, merged
//! with existing content at finalization, never overwritten wholesale.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentMap {
    pub provider: String,
    pub target: String,
    pub map: HashMap<String, String>,
    #[serde(rename = "bySku")]
    pub by_sku: HashMap<String, String>,
}

impl PaymentMap {
    #[must_use]
    pub fn load_or_new(path: &Path, provider: &str, target: &str) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str::<Self>(&s).ok())
            .unwrap_or_else(|| Self { provider: provider.to_string(), target: target.to_string(), ..Self::default() })
    }

    /// Record a legacy product id (from `product_id=`/`add-to-cart=` query
    /// params) and its SKU against the configured placeholder, merging
    /// with whatever was already present.
    pub fn record(&mut self, legacy_product_id: Option<&str>, sku: &str, placeholder: &str) {
        if let Some(id) = legacy_product_id {
            self.map.entry(id.to_string()).or_insert_with(|| placeholder.to_string());
        }
        self.by_sku.entry(sku.to_string()).or_insert_with(|| placeholder.to_string());
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Pull a legacy product id out of a URL's `product_id=` or `add-to-cart=`
/// query parameter, per §4.7 "Payment map".
#[must_use]
pub fn legacy_product_id(url: &url::Url) -> Option<String> {
    url.query_pairs().find(|(k, _)| k == "product_id" || k == "add-to-cart").map(|(_, v)| v.to_string())
}

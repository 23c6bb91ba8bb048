//! SKU registry (§3 "SKU map", §4.7 "SKU assignment"): `{ next, byKey }`,
//! persisted so SKUs stay stable across re-runs.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkuRegistry {
    next: u64,
    #[serde(rename = "byKey")]
    by_key: HashMap<String, String>,
}

impl SkuRegistry {
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        std::fs::read_to_string(path).ok().and_then(|s| serde_json::from_str(&s).ok()).unwrap_or_default()
    }

    /// `skuMap.byKey[key] ||= "SKU-" + pad6(skuMap.next++)`.
    pub fn assign(&mut self, key: &str) -> String {
        if let Some(existing) = self.by_key.get(key) {
            return existing.clone();
        }
        self.next += 1;
        let sku = format!("SKU-{:06}", self.next);
        self.by_key.insert(key.to_string(), sku.clone());
        sku
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_is_stable_for_the_same_key() {
        let mut registry = SkuRegistry::default();
        let first = registry.assign("p/abc");
        let second = registry.assign("p/abc");
        assert_eq!(first, second);
        assert_eq!(first, "SKU-000001");
    }

    #[test]
    fn assign_increments_for_distinct_keys() {
        let mut registry = SkuRegistry::default();
        let a = registry.assign("p/a");
        let b = registry.assign("p/b");
        assert_eq!(a, "SKU-000001");
        assert_eq!(b, "SKU-000002");
    }
}

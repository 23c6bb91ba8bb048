//! Capture record, manifest, and partial-journal reduction (§3, §4.8,
//! §8). Grounded on `mcp/manager/manifest_manager.rs`'s
//! sorted-snapshot pattern, generalized to the run directory's on-disk
//! layout (§6).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// One row per `(url, profile)`, per §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub url: String,
    #[serde(rename = "finalURL")]
    pub final_url: String,
    pub rel_path: String,
    pub local_path: String,
    pub profile: String,
    pub status: String,
    pub main_status: Option<u16>,
    pub assets: u32,
    pub raw_used: bool,
    pub reasons: Vec<String>,
    pub duration_ms: u64,
    pub captured_at: String,
}

impl CaptureRecord {
    pub fn is_ok(&self) -> bool {
        self.status == "ok" || self.status == "okRaw"
    }

    fn dedup_key(&self) -> String {
        format!("{}:{}", self.url, self.profile)
    }
}

/// Ordered, deduplicated manifest — `manifest.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub records: Vec<CaptureRecord>,
}

impl Manifest {
    /// Reduce a stream of (possibly duplicated, possibly torn) journal
    /// records into a sorted, deduplicated manifest. Per §8, the
    /// *latest* record for a given `(url, profile)` key wins.
    #[must_use]
    pub fn reduce(records: Vec<CaptureRecord>) -> Self {
        let mut by_key: HashMap<String, CaptureRecord> = HashMap::new();
        for record in records {
            by_key.insert(record.dedup_key(), record);
        }
        let mut records: Vec<CaptureRecord> = by_key.into_values().collect();
        records.sort_by(|a, b| (a.url.as_str(), a.profile.as_str()).cmp(&(b.url.as_str(), b.profile.as_str())));
        Self { records }
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn stats(&self) -> ManifestStats {
        let pages: std::collections::HashSet<&str> = self.records.iter().map(|r| r.url.as_str()).collect();
        let failures = self.records.iter().filter(|r| !r.is_ok()).count();
        let assets: u64 = self.records.iter().map(|r| u64::from(r.assets)).sum();
        ManifestStats { pages: pages.len(), failures, assets }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestStats {
    pub pages: usize,
    pub failures: usize,
    pub assets: u64,
}

/// Append-only newline-delimited JSON journal writer, single writer per
/// worker, torn writes tolerated at reduction time.
pub struct PartialJournal {
    file: Mutex<tokio::fs::File>,
}

impl PartialJournal {
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        let file = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;
        Ok(Self { file: Mutex::new(file) })
    }

    pub async fn append(&self, record: &CaptureRecord) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Read a partial journal file, skipping any line that fails to parse
/// (a torn write from an interrupted run).
pub fn read_journal(path: &Path) -> anyhow::Result<Vec<CaptureRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path)?;
    let mut records = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(record) = serde_json::from_str::<CaptureRecord>(line) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Write the effective seed list, one URL per line.
pub fn write_seeds(path: &Path, seeds: &[String]) -> anyhow::Result<()> {
    let mut file = std::fs::File::create(path)?;
    for seed in seeds {
        writeln!(file, "{seed}")?;
    }
    Ok(())
}

/// Resolve and write the root redirect per §4.8 "Finalization":
/// prefer the primary seed's desktop record, then any record sharing its
/// page key, then the first record overall.
pub fn write_root_redirect(
    run_dir: &Path,
    manifest: &Manifest,
    primary_seed_page_key: &str,
) -> anyhow::Result<()> {
    let target = manifest
        .records
        .iter()
        .find(|r| r.rel_path == primary_seed_page_key && r.profile == "desktop")
        .or_else(|| manifest.records.iter().find(|r| r.rel_path == primary_seed_page_key))
        .or_else(|| manifest.records.first());

    let Some(record) = target else {
        return Ok(());
    };

    let href = format!("/{}/", record.local_path.trim_start_matches('/'));
    let html = format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8">
<meta http-equiv="refresh" content="0; url={href}">
</head><body>
<script>location.replace({href_js} + location.search + location.hash);</script>
<p>Redirecting to <a href="{href}">{href}</a></p>
</body></html>
"#,
        href = href,
        href_js = serde_json::to_string(&href)?
    );
    std::fs::write(run_dir.join("index.html"), html)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, profile: &str, status: &str) -> CaptureRecord {
        CaptureRecord {
            url: url.to_string(),
            final_url: url.to_string(),
            rel_path: "index".to_string(),
            local_path: "index/desktop".to_string(),
            profile: profile.to_string(),
            status: status.to_string(),
            main_status: Some(200),
            assets: 0,
            raw_used: false,
            reasons: vec![],
            duration_ms: 10,
            captured_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn reduce_keeps_latest_record_per_url_and_profile() {
        let mut first = record("https://x.test/", "desktop", "error:nav timeout");
        first.duration_ms = 1;
        let mut second = record("https://x.test/", "desktop", "ok");
        second.duration_ms = 2;
        let manifest = Manifest::reduce(vec![first, second]);
        assert_eq!(manifest.records.len(), 1);
        assert_eq!(manifest.records[0].status, "ok");
    }

    #[test]
    fn reduce_sorts_by_url_then_profile() {
        let records = vec![
            record("https://x.test/b", "mobile", "ok"),
            record("https://x.test/a", "desktop", "ok"),
            record("https://x.test/a", "mobile", "ok"),
        ];
        let manifest = Manifest::reduce(records);
        let urls: Vec<(&str, &str)> =
            manifest.records.iter().map(|r| (r.url.as_str(), r.profile.as_str())).collect();
        assert_eq!(
            urls,
            vec![("https://x.test/a", "desktop"), ("https://x.test/a", "mobile"), ("https://x.test/b", "mobile")]
        );
    }

    #[test]
    fn stats_count_failures_and_distinct_pages() {
        let manifest = Manifest::reduce(vec![
            record("https://x.test/a", "desktop", "ok"),
            record("https://x.test/a", "mobile", "error:nav boom"),
        ]);
        let stats = manifest.stats();
        assert_eq!(stats.pages, 1);
        assert_eq!(stats.failures, 1);
    }
}

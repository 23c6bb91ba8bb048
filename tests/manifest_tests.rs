//! Integration tests for the partial journal: append, tolerate a torn
//! write, and reduce into a final manifest.

use sitemirror::manifest::{read_journal, CaptureRecord, Manifest, PartialJournal};
use tempfile::TempDir;

fn record(url: &str, profile: &str, status: &str) -> CaptureRecord {
    CaptureRecord {
        url: url.to_string(),
        final_url: url.to_string(),
        rel_path: "index".to_string(),
        local_path: format!("index/{profile}"),
        profile: profile.to_string(),
        status: status.to_string(),
        main_status: Some(200),
        assets: 3,
        raw_used: false,
        reasons: vec![],
        duration_ms: 42,
        captured_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

#[tokio::test]
async fn journal_round_trips_appended_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("manifest.partial.jsonl");

    let journal = PartialJournal::open(&path).await.unwrap();
    journal.append(&record("https://x.test/", "desktop", "ok")).await.unwrap();
    journal.append(&record("https://x.test/", "mobile", "ok")).await.unwrap();

    let records = read_journal(&path).unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn journal_reader_skips_a_torn_trailing_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("manifest.partial.jsonl");

    let good = serde_json::to_string(&record("https://x.test/", "desktop", "ok")).unwrap();
    std::fs::write(&path, format!("{good}\n{{\"url\":\"https://x.test/b\",\"fin")).unwrap();

    let records = read_journal(&path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, "https://x.test/");
}

#[test]
fn missing_journal_file_reduces_to_an_empty_manifest() {
    let dir = TempDir::new().unwrap();
    let records = read_journal(&dir.path().join("does-not-exist.jsonl")).unwrap();
    let manifest = Manifest::reduce(records);
    assert!(manifest.records.is_empty());
    assert_eq!(manifest.stats().pages, 0);
}

#[test]
fn manifest_write_produces_readable_json() {
    let dir = TempDir::new().unwrap();
    let manifest = Manifest::reduce(vec![record("https://x.test/", "desktop", "ok")]);
    let out = dir.path().join("manifest.json");
    manifest.write(&out).unwrap();

    let raw = std::fs::read_to_string(&out).unwrap();
    let parsed: Manifest = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.records.len(), 1);
}

//! A dry run must plan (seed file, directory layout) without ever
//! launching a browser, so it can run in this test suite directly.

use sitemirror::config::Config;
use sitemirror::Orchestrator;
use tempfile::TempDir;

#[tokio::test]
async fn dry_run_writes_seeds_without_launching_a_browser() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder(dir.path(), "https://example.com")
        .seed("https://example.com/about")
        .dry_run(true)
        .build()
        .unwrap();

    let orchestrator = Orchestrator::new(config);
    let summary = orchestrator.run_auto().await.unwrap();

    assert_eq!(summary.stats.pages, 2);
    assert_eq!(summary.stats.failures, 0);
    assert!(!summary.stopped);
    assert!(dir.path().join("seeds.txt").exists());
}

#[tokio::test]
async fn the_job_gate_is_released_after_a_run_so_a_later_run_can_proceed() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();

    let config_a =
        Config::builder(dir_a.path(), "https://example.com").dry_run(true).build().unwrap();
    let config_b =
        Config::builder(dir_b.path(), "https://example.org").dry_run(true).build().unwrap();

    let first = Orchestrator::new(config_a).run_auto().await;
    let second = Orchestrator::new(config_b).run_auto().await;
    assert!(first.is_ok());
    assert!(second.is_ok(), "gate must be released after the first run completes");
}

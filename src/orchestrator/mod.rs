//! Run orchestrator (§4.8): worker pool, single in-flight job gate,
//! proxy rotation, stop/resume, partial-manifest journaling, and manifest
//! finalization. Grounded on `crawl_engine/orchestrator.rs`'s
//! (`Semaphore` + `FuturesUnordered` worker pool over a shared queue) and
//! `domain_limiter.rs`/`circuit_breaker.rs`'s atomic-counter idioms for
//! the job gate (§9 "Global state" redesign note: the "starting" race is a
//! textbook check-then-set that must be atomic).

mod proxy;

pub use proxy::ProxyRotator;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::asset_store::AssetIndex;
use crate::browser::{BrowserDriver, ChromiumDriver};
use crate::capture::{capture_profile, resolve_rel_path, CaptureContext};
use crate::catalog::CatalogState;
use crate::config::{Config, DeviceProfile};
use crate::discovery::run_discovery;
use crate::error::{MirrorError, MirrorResult};
use crate::manifest::{read_journal, write_root_redirect, write_seeds, Manifest, ManifestStats, PartialJournal};
use crate::same_site::SameSiteClassifier;
use url::Url;

/// Process-level "single in-flight job" gate. One flag per process, since
/// §4.8 requires that "two captures or two discovery crawls"
/// never run concurrently regardless of how many [`Orchestrator`] values
/// exist in this process.
static JOB_GATE: AtomicBool = AtomicBool::new(false);

/// RAII guard releasing [`JOB_GATE`] on drop, covering every exit path
/// (success, error, or panic unwind) per §4.8 "every terminal
/// path releases it."
struct JobGateGuard;

impl JobGateGuard {
    fn acquire() -> MirrorResult<Self> {
        JOB_GATE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MirrorError::Other(anyhow::anyhow!("a capture or discovery run is already in flight")))?;
        Ok(Self)
    }
}

impl Drop for JobGateGuard {
    fn drop(&mut self) {
        JOB_GATE.store(false, Ordering::Release);
    }
}

/// Summary returned after a run finalizes, per §4.8
/// "stats `{pages, failures, assets}`".
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunSummary {
    pub run_dir: PathBuf,
    pub stats: ManifestStats,
    pub stopped: bool,
}

/// Owns one run's mutable state: config, stop flag, proxy rotator. Created
/// fresh per invocation rather than kept as ambient global state, per §9
/// "Global state (`currentJob`, `startingJob`, `hosts`, `runs`)": "move to
/// a single `Orchestrator` value owned by the run's entry point."
pub struct Orchestrator {
    config: Config,
    run_dir: PathBuf,
    stop_requested: Arc<AtomicBool>,
    proxy_rotator: Arc<ProxyRotator>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let run_dir = config.storage_dir.clone();
        Self { config, run_dir, stop_requested: Arc::new(AtomicBool::new(false)), proxy_rotator: Arc::new(ProxyRotator::new()) }
    }

    /// Signal a stop: set the in-memory flag and drop the `_crawl/STOP`
    /// sentinel, per §4.8 "Stop semantics". Non-blocking; the
    /// running worker pool observes the flag at its next job fetch.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Relaxed);
        let crawl_dir = self.run_dir.join("_crawl");
        let _ = std::fs::create_dir_all(&crawl_dir);
        let _ = std::fs::write(crawl_dir.join("STOP"), b"");
    }

    /// `host-run/auto` equivalent (§9 decision (b)): discovery then
    /// capture then finalization in one call, never a re-dispatch through
    /// the out-of-scope HTTP router.
    pub async fn run_auto(&self) -> MirrorResult<RunSummary> {
        let _gate = JobGateGuard::acquire()?;
        std::fs::create_dir_all(&self.run_dir)
            .map_err(|source| MirrorError::Io { path: self.run_dir.clone(), source })?;

        let classifier = SameSiteClassifier::new(
            &self.config.seeds,
            self.config.scope.same_site_mode,
            self.config.scope.internal_hosts_regex.clone(),
        );

        write_seeds(&self.run_dir.join("seeds.txt"), &self.config.seeds).map_err(MirrorError::Other)?;

        let mut ordered_urls = if self.config.discovery.discover {
            self.run_discovery_phase(&classifier).await?
        } else {
            self.config.seeds.clone()
        };
        self.hoist_primary_seed(&mut ordered_urls);

        if self.config.dry_run {
            info!(urls = ordered_urls.len(), "dry run: skipping capture");
            return Ok(RunSummary {
                run_dir: self.run_dir.clone(),
                stats: ManifestStats { pages: ordered_urls.len(), failures: 0, assets: 0 },
                stopped: false,
            });
        }

        self.run_capture_phase(&classifier, &ordered_urls).await
    }

    /// Discovery only, per the `mirror discover` CLI subcommand (§6.1).
    pub async fn discover(&self) -> MirrorResult<Vec<String>> {
        let _gate = JobGateGuard::acquire()?;
        std::fs::create_dir_all(&self.run_dir)
            .map_err(|source| MirrorError::Io { path: self.run_dir.clone(), source })?;
        let classifier = SameSiteClassifier::new(
            &self.config.seeds,
            self.config.scope.same_site_mode,
            self.config.scope.internal_hosts_regex.clone(),
        );
        self.run_discovery_phase(&classifier).await
    }

    async fn run_discovery_phase(&self, classifier: &SameSiteClassifier) -> MirrorResult<Vec<String>> {
        let driver = ChromiumDriver::launch(
            self.config.headless,
            self.selected_proxy_arg().as_deref(),
            self.config.proxy.disable_http2,
            &self.run_dir,
        )
        .await
        .map_err(MirrorError::Other)?;

        let result = run_discovery(&driver, &self.config.seeds, &self.config, classifier, &self.run_dir)
            .await
            .map_err(MirrorError::Other);

        let _ = driver.close().await;
        let (discovered, graph) = result?;

        let mut ordered = if self.config.discovery.use_discovery_graph {
            graph.ordered_nodes(self.config.discovery.graph_doc_like_only)
        } else {
            discovered
        };
        self.hoist_primary_seed(&mut ordered);
        Ok(ordered)
    }

    fn selected_proxy_arg(&self) -> Option<String> {
        self.proxy_rotator.select(&self.config.proxy).map(|p| p.server)
    }

    /// Move `primary_seed` to the front of `urls` (inserting it if
    /// missing), so the primary seed is captured first regardless of
    /// discovery/graph ordering (§3, §4.8 "primary seed captured first").
    fn hoist_primary_seed(&self, urls: &mut Vec<String>) {
        if self.config.primary_seed.is_empty() {
            return;
        }
        if let Some(pos) = urls.iter().position(|u| u == &self.config.primary_seed) {
            let seed = urls.remove(pos);
            urls.insert(0, seed);
        } else {
            urls.insert(0, self.config.primary_seed.clone());
        }
    }

    async fn run_capture_phase(&self, classifier: &SameSiteClassifier, ordered_urls: &[String]) -> MirrorResult<RunSummary> {
        let profiles: Vec<DeviceProfile> = self.config.scope.profiles.iter().map(|name| DeviceProfile::by_name(name)).collect();
        let journal = Arc::new(
            PartialJournal::open(&self.run_dir.join("manifest.partial.jsonl"))
                .await
                .map_err(MirrorError::Other)?,
        );

        let catalog = if self.config.catalog.enable_catalog {
            Some(Arc::new(CatalogState::load(&self.run_dir, self.config.catalog.clone())))
        } else {
            None
        };

        let asset_indexes: Arc<DashMap<String, Arc<AssetIndex>>> = Arc::new(DashMap::new());
        let cursor = Arc::new(AtomicUsize::new(0));
        let jobs: Vec<(String, usize)> =
            ordered_urls.iter().enumerate().map(|(i, u)| (u.clone(), i)).collect();

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut workers = FuturesUnordered::new();

        for _ in 0..self.config.concurrency.max(1) {
            let cursor = cursor.clone();
            let jobs = jobs.clone();
            let profiles = profiles.clone();
            let config = self.config.clone();
            let run_dir = self.run_dir.clone();
            let classifier = classifier.clone();
            let journal = journal.clone();
            let catalog = catalog.clone();
            let asset_indexes = asset_indexes.clone();
            let stop_requested = self.stop_requested.clone();
            let proxy_rotator = self.proxy_rotator.clone();
            let semaphore = semaphore.clone();

            workers.push(tokio::spawn(async move {
                loop {
                    if stop_requested.load(Ordering::Relaxed) {
                        break;
                    }
                    let idx = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some((url, _)) = jobs.get(idx) else { break };

                    let _permit = semaphore.acquire().await;

                    let Ok(page_url) = Url::parse(url) else { continue };
                    let rel = resolve_rel_path(&page_url, config.rewrite.include_page_query_in_path);
                    let assets = asset_indexes
                        .entry(url.clone())
                        .or_insert_with(|| {
                            AssetIndex::new(
                                &run_dir,
                                config.asset_max_bytes,
                                config.inline_small_assets,
                                config.scope.preserve_asset_paths,
                                config.scope.mirror_cross_origin,
                            )
                        })
                        .clone();

                    let proxy_arg = proxy_rotator.select(&config.proxy).map(|p| p.server);
                    let driver = match ChromiumDriver::launch(
                        config.headless,
                        proxy_arg.as_deref(),
                        config.proxy.disable_http2,
                        &run_dir,
                    )
                    .await
                    {
                        Ok(driver) => driver,
                        Err(e) => {
                            warn!(url = %url, error = %e, "failed to launch browser for capture");
                            continue;
                        }
                    };

                    for profile in &profiles {
                        let ctx = CaptureContext {
                            config: &config,
                            classifier: &classifier,
                            assets: &assets,
                            run_dir: &run_dir,
                            catalog: catalog.as_deref(),
                        };
                        let record = capture_profile(&driver, url, &rel, profile, &ctx).await;
                        if let Err(e) = journal.append(&record).await {
                            warn!(url = %url, error = %e, "failed to append journal record");
                        }
                    }

                    let _ = driver.close().await;
                    proxy_rotator.record_page_complete(&config.proxy);

                    // Asset index ownership ends with this URL's capture
                    // group (§3 "Ownership"): drop our handle so the map
                    // entry's refcount can reach zero once other workers
                    // (there are none for this URL) are also done.
                    drop(assets);
                    asset_indexes.remove(url);
                }
            }));
        }

        while workers.next().await.is_some() {}

        if let Some(catalog) = &catalog {
            catalog.finalize(&self.run_dir).await.map_err(MirrorError::Other)?;
        }

        self.finalize(ordered_urls).await
    }

    async fn finalize(&self, ordered_urls: &[String]) -> MirrorResult<RunSummary> {
        let journal_records = read_journal(&self.run_dir.join("manifest.partial.jsonl")).map_err(MirrorError::Other)?;
        let manifest = Manifest::reduce(journal_records);
        manifest.write(&self.run_dir.join("manifest.json")).map_err(MirrorError::Other)?;

        let primary = if self.config.primary_seed.is_empty() {
            ordered_urls.first().or_else(|| self.config.seeds.first()).cloned()
        } else {
            Some(self.config.primary_seed.clone())
        };
        if let Some(primary) = primary {
            if let Ok(primary_url) = Url::parse(&primary) {
                let primary_key = resolve_rel_path(&primary_url, self.config.rewrite.include_page_query_in_path);
                write_root_redirect(&self.run_dir, &manifest, &primary_key).map_err(MirrorError::Other)?;
            }
        }

        let stopped = self.stop_requested.load(Ordering::Relaxed);
        let stats = manifest.stats();
        info!(pages = stats.pages, failures = stats.failures, assets = stats.assets, stopped, "run finalized");

        Ok(RunSummary { run_dir: self.run_dir.clone(), stats, stopped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both assertions live in one test: `JOB_GATE` is a single
    // process-wide static, and cargo runs unit tests in parallel by
    // default, so two separate tests touching it would race each other.
    #[test]
    fn job_gate_is_check_then_set_atomic_and_releases_on_drop() {
        let first = JobGateGuard::acquire().expect("first acquire succeeds");
        let second = JobGateGuard::acquire();
        assert!(second.is_err(), "second concurrent acquire must fail");
        drop(first);

        let reacquired = JobGateGuard::acquire();
        assert!(reacquired.is_ok(), "gate must be released after guard drop");
    }
}

//! BFS discovery crawler (§4.5), grounded on
//! `crawl_engine/orchestrator.rs`/`crawler.rs`'s BFS queue logic, reusing
//! [`crate::browser::BrowserDriver`] and [`crate::consent`] so discovery
//! shares page-handling code with the capture engine rather than
//! reimplementing it.

mod graph;

pub use graph::{DiscoveryGraph, GraphCounts};

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::browser::BrowserDriver;
use crate::config::{Config, DeviceProfile, DiscoveryConfig};
use crate::consent::consent_script;
use crate::same_site::SameSiteClassifier;

struct QueueItem {
    url: String,
    depth: u32,
}

/// Run discovery to completion, persisting `_crawl/urls.txt` and
/// `_crawl/graph.json` under `run_dir`, per §4.5 step 8. Returns both the
/// BFS-ordered URL list and the link graph, so the orchestrator can choose
/// graph-driven capture ordering (§4.5 "Ordering rule") when configured.
pub async fn run_discovery(
    driver: &dyn BrowserDriver,
    seeds: &[String],
    config: &Config,
    classifier: &SameSiteClassifier,
    run_dir: &Path,
) -> anyhow::Result<(Vec<String>, DiscoveryGraph)> {
    let discovery = &config.discovery;
    let allow = discovery.allow_regex.as_ref();
    let deny = discovery.deny_regex.as_ref();

    let mut queue: VecDeque<QueueItem> = seeds.iter().map(|s| QueueItem { url: s.clone(), depth: 0 }).collect();
    let mut seen: HashSet<String> = seeds.iter().cloned().collect();
    let mut discovered: Vec<String> = Vec::new();
    let mut graph = DiscoveryGraph::new(seeds.first().cloned().unwrap_or_default());

    let profile = DeviceProfile::desktop();

    while let Some(item) = queue.pop_front() {
        if discovered.len() + queue.len() >= discovery.max_pages && !discovered.is_empty() {
            break;
        }

        let links = match fetch_page_links(driver, &item.url, &profile, config).await {
            Ok(links) => links,
            Err(e) => {
                warn!(url = %item.url, error = %e, "discovery navigation failed");
                continue;
            }
        };

        let passes_allow = allow.is_none_or(|re| re.is_match(&item.url));
        if passes_allow {
            discovered.push(item.url.clone());
        }
        graph.record_node(&item.url, item.depth);

        if item.depth >= discovery.max_depth {
            continue;
        }

        for (href, text) in links {
            let Ok(base) = Url::parse(&item.url) else { continue };
            let Ok(absolute) = base.join(&href) else { continue };
            let mut absolute = absolute;
            absolute.set_fragment(None);
            let absolute_str = absolute.to_string();

            if !classifier.is_same_site(&absolute_str) {
                continue;
            }
            if let Some(deny) = deny
                && deny.is_match(&absolute_str)
            {
                continue;
            }

            graph.record_edge(&item.url, &absolute_str, &text);

            if seen.insert(absolute_str.clone()) {
                queue.push_back(QueueItem { url: absolute_str, depth: item.depth + 1 });
            }
        }

        if discovered.len() >= discovery.max_pages {
            break;
        }
    }

    if discovered.is_empty() && !seeds.is_empty() {
        discovered = seeds.to_vec();
    }

    // Primary seed first, stable BFS order otherwise (§4.5 "Ordering rule").
    let primary = if config.primary_seed.is_empty() { seeds.first() } else { Some(&config.primary_seed) };
    if let Some(primary) = primary {
        if let Some(pos) = discovered.iter().position(|u| u == primary) {
            let seed = discovered.remove(pos);
            discovered.insert(0, seed);
        }
    }

    persist(run_dir, &discovered, &graph, discovery)?;
    Ok((discovered, graph))
}

async fn fetch_page_links(
    driver: &dyn BrowserDriver,
    url: &str,
    profile: &DeviceProfile,
    config: &Config,
) -> anyhow::Result<Vec<(String, String)>> {
    let mut page = driver.new_page(profile, config).await?;
    let nav_timeout = Duration::from_millis(config.nav_timeout_ms);

    if page.goto(url, nav_timeout).await.is_err() {
        // Retry once with a shorter, more permissive wait before giving up.
        let retry_timeout = Duration::from_millis((config.nav_timeout_ms / 2).max(5_000));
        page.goto(url, retry_timeout).await?;
    }

    let _ = page.evaluate(&consent_script(&config.consent)).await;

    let script = r"
      Array.from(document.querySelectorAll('a[href]')).map((a) => [a.getAttribute('href'), (a.textContent || '').trim()])
    ";
    let links = match page.evaluate(script).await {
        Ok(value) => parse_links(&value),
        Err(e) => {
            debug!(url, error = %e, "DOM link extraction failed, falling back to content regex");
            extract_links_via_regex(&page.content().await.unwrap_or_default())
        }
    };

    let _ = page.close().await;
    Ok(links)
}

fn parse_links(value: &serde_json::Value) -> Vec<(String, String)> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let pair = entry.as_array()?;
                    let href = pair.first()?.as_str()?.to_string();
                    let text = pair.get(1).and_then(|v| v.as_str()).unwrap_or_default().to_string();
                    Some((href, text))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn extract_links_via_regex(html: &str) -> Vec<(String, String)> {
    let re = Regex::new(r#"(?i)<a[^>]+href=["']([^"']+)["'][^>]*>(.*?)</a>"#).unwrap_or_else(|_| Regex::new("$^").unwrap());
    re.captures_iter(html)
        .map(|c| {
            let href = c.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
            let text = c.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
            (href, text)
        })
        .collect()
}

fn persist(run_dir: &Path, urls: &[String], graph: &DiscoveryGraph, config: &DiscoveryConfig) -> anyhow::Result<()> {
    let crawl_dir = run_dir.join("_crawl");
    std::fs::create_dir_all(&crawl_dir)?;
    std::fs::write(crawl_dir.join("urls.txt"), urls.join("\n"))?;
    let graph_json = graph.to_json(config)?;
    std::fs::write(crawl_dir.join("graph.json"), graph_json)?;
    Ok(())
}

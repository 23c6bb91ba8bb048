//! Per-profile capture engine (§4.4), grounded on
//! `crawl_engine/page_processor.rs`'s per-page pipeline (rate/circuit-breaker
//! checks replaced with this engine's own error-as-record semantics) and
//! `crawl_engine/page_timeout.rs`'s timeout-wrapped-future pattern.

mod humanize;
mod raw_fallback;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use url::Url;

use crate::asset_store::AssetIndex;
use crate::browser::BrowserDriver;
use crate::catalog::CatalogState;
use crate::config::{Config, DeviceProfile};
use crate::consent::consent_script;
use crate::error::{format_error_status, CaptureFailureKind};
use crate::manifest::CaptureRecord;
use crate::page_key::derive_page_key;
use crate::rewrite::{build_offline_shim, rewrite_page};
use crate::same_site::SameSiteClassifier;

/// Everything a single `captureProfile` call needs that is shared across
/// the profiles of one URL (§3 "Asset record" invariant: one asset index
/// per URL across its profiles).
pub struct CaptureContext<'a> {
    pub config: &'a Config,
    pub classifier: &'a SameSiteClassifier,
    pub assets: &'a Arc<AssetIndex>,
    pub run_dir: &'a Path,
    pub catalog: Option<&'a CatalogState>,
}

/// `captureProfile(pageNum, url, outRoot, rel, profile, sharedAssetIndex)
/// -> captureRecord`, per §4.4.
pub async fn capture_profile(
    driver: &dyn BrowserDriver,
    url: &str,
    rel: &str,
    profile: &DeviceProfile,
    ctx: &CaptureContext<'_>,
) -> CaptureRecord {
    let started = Instant::now();
    let mut reasons = Vec::new();
    let mut status = "ok".to_string();
    let mut final_url = url.to_string();
    let mut main_status = None;
    let mut raw_used = false;

    let Ok(page_url) = Url::parse(url) else {
        return error_record(url, rel, profile, "error:nav invalid URL", started);
    };

    let outcome = run_browser_path(driver, url, &page_url, rel, profile, ctx, &mut reasons).await;

    match outcome {
        Ok(BrowserCaptureOutcome { final_url: f, main_status: m }) => {
            final_url = f;
            main_status = m;
        }
        Err(kind_msg) => {
            // Raw fallback, per §4.4 "Raw fallback".
            match raw_fallback::fetch_raw(url, ctx.config).await {
                Ok(body) => {
                    let local_path = format!("{rel}/{}", profile.name);
                    let index_path = ctx.run_dir.join(&local_path).join("index.html");
                    if !index_path.exists() {
                        if let Some(parent) = index_path.parent() {
                            let _ = std::fs::create_dir_all(parent);
                        }
                        let _ = std::fs::write(&index_path, body);
                    }
                    status = "okRaw".to_string();
                    raw_used = true;
                    reasons.push(kind_msg);
                }
                Err(raw_err) => {
                    status = format_error_status(CaptureFailureKind::Raw, &raw_err.to_string());
                    reasons.push(kind_msg);
                }
            }
        }
    }

    CaptureRecord {
        url: url.to_string(),
        final_url,
        rel_path: rel.to_string(),
        local_path: format!("{rel}/{}", profile.name),
        profile: profile.name.clone(),
        status,
        main_status,
        assets: u32::try_from(ctx.assets.len()).unwrap_or(u32::MAX),
        raw_used,
        reasons,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        captured_at: Utc::now().to_rfc3339(),
    }
}

struct BrowserCaptureOutcome {
    final_url: String,
    main_status: Option<u16>,
}

async fn run_browser_path(
    driver: &dyn BrowserDriver,
    url: &str,
    page_url: &Url,
    rel: &str,
    profile: &DeviceProfile,
    ctx: &CaptureContext<'_>,
    reasons: &mut Vec<String>,
) -> Result<BrowserCaptureOutcome, String> {
    let mut page = driver
        .new_page(profile, ctx.config)
        .await
        .map_err(|e| format_error_status(CaptureFailureKind::Nav, &format!("launch failed: {e}")))?;

    let nav_timeout = Duration::from_millis(ctx.config.nav_timeout_ms);
    let page_budget = Duration::from_millis(ctx.config.page_timeout_ms);
    let deadline = Instant::now() + page_budget;

    let nav_result = page.goto(url, nav_timeout).await;
    let nav_outcome = match nav_result {
        Ok(outcome) => outcome,
        Err(e) => {
            let _ = page.close().await;
            return Err(format_error_status(CaptureFailureKind::Nav, &e.to_string()));
        }
    };

    if ctx.config.wait_extra_ms > 0 {
        tokio::time::sleep(Duration::from_millis(ctx.config.wait_extra_ms)).await;
    }

    // Consent resolver (§4.3), non-fatal.
    let script = consent_script(&ctx.config.consent);
    if let Err(e) = page.evaluate(&script).await {
        reasons.push(format!("popupErr:{e}"));
    }

    // Humanize (§4.4 "Humanize"), bounded, never gates success.
    let _ = humanize::run(&mut *page, Instant::now() + Duration::from_millis(1500)).await;

    // Scroll passes.
    for _ in 0..ctx.config.scroll_passes {
        if Instant::now() >= deadline {
            break;
        }
        let _ = page.evaluate("window.scrollBy(0, document.body.scrollHeight)").await;
        tokio::time::sleep(Duration::from_millis(ctx.config.scroll_delay_ms)).await;
    }

    // Quiescence wait loop (§5 "Quiescence rule"): poll no coarser than
    // 300ms, stop at in-flight==0 && quiet_millis elapsed, or deadline.
    loop {
        if Instant::now() >= deadline {
            break;
        }
        let responses = page.drain_responses().await;
        for response in &responses {
            ingest_response(ctx, response, page_url).await;
        }
        for failed_url in page.drain_failed_requests().await {
            reasons.push(format!("REQ_FAIL {failed_url}"));
        }
        if page.in_flight() == 0 && page.millis_since_last_activity() >= ctx.config.quiet_millis {
            break;
        }
        tokio::time::sleep(Duration::from_millis(300.min(ctx.config.quiet_millis))).await;
    }

    let html = match page.content().await {
        Ok(html) => html,
        Err(e) => {
            reasons.push("noBody".to_string());
            let _ = page.close().await;
            return Err(format_error_status(CaptureFailureKind::PageTimeout, &e.to_string()));
        }
    };

    // Product extraction (§4.7) happens "before HTML is written".
    let sku = match ctx.catalog {
        Some(catalog) => catalog.record_if_product(&html, page_url, rel).await,
        None => None,
    };

    let rewrite_outcome = rewrite_page(&html, page_url, ctx.config, ctx.classifier, ctx.assets, profile, sku.as_deref());
    reasons.extend(rewrite_outcome.errors);

    let shim = if ctx.config.rewrite.offline_fallback {
        format!("<script>{}</script>", build_offline_shim(ctx.assets, ctx.config.rewrite.offline_map_strip_query))
    } else {
        String::new()
    };
    let final_html = if let Some(pos) = rewrite_outcome.html.find("</body>") {
        let mut html = rewrite_outcome.html.clone();
        html.insert_str(pos, &shim);
        html
    } else {
        format!("{}{}", rewrite_outcome.html, shim)
    };

    let local_dir = ctx.run_dir.join(rel).join(&profile.name);
    if let Err(e) = std::fs::create_dir_all(&local_dir) {
        reasons.push(format!("htmlSaveErr:{e}"));
    }
    if let Err(e) = std::fs::write(local_dir.join("index.html"), &final_html) {
        reasons.push(format!("htmlSaveErr:{e}"));
    }

    let page_json = serde_json::json!({
        "url": url,
        "finalURL": nav_outcome.final_url,
        "profile": profile.name,
        "productRefs": sku,
    });
    let _ = std::fs::write(local_dir.join("index.json"), page_json.to_string());

    write_stub_redirect(ctx.run_dir, rel, &profile.name);

    let _ = page.close().await;

    Ok(BrowserCaptureOutcome { final_url: nav_outcome.final_url, main_status: nav_outcome.main_status })
}

async fn ingest_response(ctx: &CaptureContext<'_>, response: &crate::browser::ObservedResponse, page_url: &Url) {
    let Ok(asset_url) = Url::parse(&response.url) else { return };
    if ctx.assets.get(asset_url.as_str()).is_some() {
        return;
    }
    let is_asset_like = response.content_type.starts_with("image/")
        || response.content_type.starts_with("font/")
        || response.content_type.starts_with("text/css")
        || response.content_type.contains("javascript")
        || asset_url.path().rsplit('.').next().is_some_and(|ext| {
            matches!(ext, "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "css" | "js" | "woff" | "woff2" | "ttf")
        });
    if !is_asset_like {
        return;
    }
    let same_site = ctx.classifier.is_same_site(asset_url.as_str());
    if !same_site && !ctx.config.scope.mirror_cross_origin {
        return;
    }
    let client = reqwest::Client::new();
    if let Ok(resp) = client.get(asset_url.as_str()).send().await
        && let Ok(bytes) = resp.bytes().await
    {
        let _ = ctx.assets.store(&asset_url, same_site, &bytes, &response.content_type).await;
    }
    let _ = page_url;
}

/// Stub redirect at the page's root (§4.4): desktop always overwrites;
/// non-desktop writes only if no stub exists yet.
fn write_stub_redirect(run_dir: &Path, rel: &str, profile_name: &str) {
    let stub_path = run_dir.join(rel).join("index.html");
    if profile_name != "desktop" && stub_path.exists() {
        return;
    }
    if let Some(parent) = stub_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let href = format!("./{profile_name}/");
    let html = format!(
        r#"<!DOCTYPE html><html><head><meta charset="utf-8"><meta http-equiv="refresh" content="0; url={href}"></head><body><script>location.replace({href_js} + location.search + location.hash);</script></body></html>"#,
        href = href,
        href_js = serde_json::to_string(&href).unwrap_or_default()
    );
    let _ = std::fs::write(stub_path, html);
}

fn error_record(url: &str, rel: &str, profile: &DeviceProfile, status: &str, started: Instant) -> CaptureRecord {
    CaptureRecord {
        url: url.to_string(),
        final_url: url.to_string(),
        rel_path: rel.to_string(),
        local_path: format!("{rel}/{}", profile.name),
        profile: profile.name.clone(),
        status: status.to_string(),
        main_status: None,
        assets: 0,
        raw_used: false,
        reasons: vec![],
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        captured_at: Utc::now().to_rfc3339(),
    }
}

#[must_use]
pub fn resolve_rel_path(url: &Url, include_query: bool) -> String {
    derive_page_key(url, include_query)
}

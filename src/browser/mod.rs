//! Browser driver abstraction (§9 "Browser driver abstraction").
//!
//! The engine choice (Chromium today; Firefox/WebKit are config-surface
//! placeholders per §6) is modeled as a polymorphic driver with the
//! capability set §9 calls for: `{launch, newContext, newPage,
//! on(request|response|requestfailed), goto, evaluate, content, close}`.
//! The capture engine and discovery crawler are written against
//! [`BrowserDriver`]/[`PageSession`]; the only concrete implementation is
//! [`chromium::ChromiumDriver`], grounded on
//! `browser_setup::launch_browser` and its `chromiumoxide` usage.

mod chromium;
pub mod setup;
mod trackers;

pub use chromium::ChromiumDriver;

use async_trait::async_trait;
use std::time::Duration;

use crate::config::{Config, DeviceProfile};

/// One observed network response, surfaced to the capture engine's
/// response hook (§4.4 "Response hook").
#[derive(Debug, Clone)]
pub struct ObservedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: String,
    pub resource_type: String,
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone)]
pub struct NavigateOutcome {
    pub final_url: String,
    pub main_status: Option<u16>,
}

/// A single isolated browser context + page, per §4.4 "Launch":
/// "A new context is created per capture; per-profile viewport, UA,
/// deviceScaleFactor, mobile/touch flags are set."
#[async_trait]
pub trait PageSession: Send {
    /// Navigate and wait for the configured completion condition.
    async fn goto(&mut self, url: &str, timeout: Duration) -> anyhow::Result<NavigateOutcome>;

    /// Evaluate a JS expression/IIFE and deserialize its JSON result.
    async fn evaluate(&mut self, script: &str) -> anyhow::Result<serde_json::Value>;

    /// Read `document.documentElement.outerHTML`.
    async fn content(&mut self) -> anyhow::Result<String>;

    /// Drain any network responses observed since the last call.
    async fn drain_responses(&mut self) -> Vec<ObservedResponse>;

    /// Drain URLs of requests that failed (network error, blocked, reset)
    /// since the last call, for the capture engine's `REQ_FAIL <url>`
    /// reasons (§7).
    async fn drain_failed_requests(&mut self) -> Vec<String>;

    /// Fetch the full response body for a previously observed URL, if it
    /// is still retained by the browser's network cache.
    async fn response_body(&mut self, url: &str) -> anyhow::Result<Option<(Vec<u8>, String)>>;

    /// Number of requests started but not yet finished or failed (for the
    /// quiescence wait).
    fn in_flight(&self) -> usize;

    /// Milliseconds since the last observed network activity.
    fn millis_since_last_activity(&self) -> u64;

    /// Abort a capture's underlying page/context. Always called, success
    /// or failure, per §5 "Browser instances".
    async fn close(&mut self) -> anyhow::Result<()>;
}

/// A launched browser instance capable of producing isolated page
/// sessions. One instance is created per capture (§5) unless a future pool
/// mode is wired in.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Open a new isolated page configured for `profile`. Proxy selection
    /// happens at launch time (§5 "Browser instances": one instance per
    /// capture, so the proxy for that capture is baked into the launch
    /// args), not per page. `config` supplies the navigation completion
    /// condition and request-blocking policy for the new page.
    async fn new_page(&self, profile: &DeviceProfile, config: &Config) -> anyhow::Result<Box<dyn PageSession>>;
    async fn close(&self) -> anyhow::Result<()>;
}

//! `chromiumoxide`-backed [`super::BrowserDriver`], grounded on
//! `browser_setup::launch_browser` (executable discovery, stealth args,
//! handler task with benign-CDP-error filtering) and
//! `crawl_engine/crawler.rs`/`core.rs`'s `new_page("about:blank")` ->
//! `goto` -> `wait_for_navigation` sequencing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::setup;
use super::trackers;
use super::{BrowserDriver, NavigateOutcome, ObservedResponse, PageSession};
use crate::config::{Config, DeviceProfile, WaitUntil};

pub struct ChromiumDriver {
    browser: Browser,
    handler_task: JoinHandle<()>,
    user_data_dir: PathBuf,
}

impl ChromiumDriver {
    /// Launch a fresh, isolated Chromium instance for a single capture.
    /// `proxy` is an optional `scheme://host:port` CDP proxy-server value;
    /// credentials are applied per-page via `Page::authenticate` by the
    /// caller rather than baked into launch args.
    pub async fn launch(headless: bool, proxy: Option<&str>, disable_http2: bool, cache_dir: &std::path::Path) -> Result<Self> {
        let chrome_path = match setup::find_browser_executable().await {
            Ok(path) => path,
            Err(_) => setup::download_managed_browser(&cache_dir.join("chromium-cache")).await?,
        };

        let user_data_dir =
            std::env::temp_dir().join(format!("sitemirror_chrome_{}_{}", std::process::id(), uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&user_data_dir).context("failed to create user data dir")?;

        let mut builder = BrowserConfigBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .window_size(1920, 1080)
            .user_data_dir(user_data_dir.clone())
            .chrome_executable(chrome_path);

        builder = if headless {
            builder.headless_mode(HeadlessMode::default())
        } else {
            builder.with_head()
        };

        for arg in setup::stealth_args() {
            builder = builder.arg(arg);
        }
        if let Some(proxy) = proxy {
            builder = builder.arg(format!("--proxy-server={proxy}"));
        }
        if disable_http2 {
            builder = builder.arg("--disable-http2").arg("--disable-quic");
        }

        let browser_config = builder.build().map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;
        let (browser, mut handler) =
            Browser::launch(browser_config).await.context("failed to launch browser")?;

        let handler_task = tokio::task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    let msg = e.to_string();
                    let benign = msg.contains("data did not match any variant of untagged enum Message")
                        || msg.contains("Failed to deserialize WS response");
                    if !benign {
                        tracing::error!(error = %msg, "browser handler error");
                    } else {
                        tracing::trace!(error = %msg, "suppressed benign CDP serialization error");
                    }
                }
            }
        });

        Ok(Self { browser, handler_task, user_data_dir })
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn new_page(&self, profile: &DeviceProfile, config: &Config) -> Result<Box<dyn PageSession>> {
        let page = self.browser.new_page("about:blank").await.context("failed to create page")?;

        page.execute(
            SetDeviceMetricsOverrideParams::builder()
                .width(i64::from(profile.viewport_width))
                .height(i64::from(profile.viewport_height))
                .device_scale_factor(profile.device_scale_factor)
                .mobile(profile.is_mobile)
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build viewport override: {e}"))?,
        )
        .await
        .context("failed to set viewport")?;

        let ua_js = format!(
            "Object.defineProperty(navigator, 'userAgent', {{ get: () => {} }});",
            serde_json::to_string(&profile.user_agent)?
        );
        page.evaluate(ua_js).await.context("failed to override user agent")?;

        let responses: EventStream<EventResponseReceived> =
            page.event_listener::<EventResponseReceived>().await.context("failed to subscribe to response events")?;
        let requests_started: EventStream<EventRequestWillBeSent> = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .context("failed to subscribe to request-started events")?;
        let requests_finished: EventStream<EventLoadingFinished> = page
            .event_listener::<EventLoadingFinished>()
            .await
            .context("failed to subscribe to loading-finished events")?;
        let requests_failed: EventStream<EventLoadingFailed> = page
            .event_listener::<EventLoadingFailed>()
            .await
            .context("failed to subscribe to loading-failed events")?;

        // Request hook (§4.4): abort tracker/skip-pattern requests,
        // including document requests, when block_trackers is set.
        let interception = if config.block_trackers {
            page.execute(FetchEnableParams::default()).await.context("failed to enable request interception")?;
            Some(
                page.event_listener::<EventRequestPaused>()
                    .await
                    .context("failed to subscribe to paused requests")?,
            )
        } else {
            None
        };

        Ok(Box::new(ChromiumPage::new(
            page,
            responses,
            requests_started,
            requests_finished,
            requests_failed,
            interception,
            config.wait_until,
        )))
    }

    async fn close(&self) -> Result<()> {
        self.handler_task.abort();
        let _ = std::fs::remove_dir_all(&self.user_data_dir);
        Ok(())
    }
}

/// Shared network-activity tracking, fed by the request/response listener
/// tasks and read by the capture engine's quiescence wait (§4.4 "Wait").
/// `in_flight` counts requests started minus requests finished or failed,
/// per §5 "Quiescence rule": `inFlight == 0 && now - lastActivity ≥
/// QUIET_MILLIS`.
struct ActivityTracker {
    last_activity: AtomicI64,
    started: Instant,
    in_flight: AtomicI64,
}

impl ActivityTracker {
    fn new() -> Self {
        Self { last_activity: AtomicI64::new(0), started: Instant::now(), in_flight: AtomicI64::new(0) }
    }

    fn touch(&self) {
        let elapsed = self.started.elapsed().as_millis() as i64;
        self.last_activity.store(elapsed, Ordering::Relaxed);
    }

    fn request_started(&self) {
        self.touch();
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    fn request_finished(&self) {
        self.touch();
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    fn in_flight(&self) -> i64 {
        self.in_flight.load(Ordering::Relaxed).max(0)
    }

    fn millis_since(&self) -> u64 {
        let elapsed = self.started.elapsed().as_millis() as i64;
        let last = self.last_activity.load(Ordering::Relaxed);
        (elapsed - last).max(0) as u64
    }
}

struct ChromiumPage {
    page: Page,
    tracker: Arc<ActivityTracker>,
    wait_until: WaitUntil,
    response_buffer: Arc<Mutex<VecDeque<ObservedResponse>>>,
    failed_buffer: Arc<Mutex<VecDeque<String>>>,
    response_task: JoinHandle<()>,
    started_task: JoinHandle<()>,
    finished_task: JoinHandle<()>,
    failed_task: JoinHandle<()>,
    interception_task: Option<JoinHandle<()>>,
}

impl ChromiumPage {
    #[allow(clippy::too_many_arguments)]
    fn new(
        page: Page,
        mut responses: EventStream<EventResponseReceived>,
        mut requests_started: EventStream<EventRequestWillBeSent>,
        mut requests_finished: EventStream<EventLoadingFinished>,
        mut requests_failed: EventStream<EventLoadingFailed>,
        interception: Option<EventStream<EventRequestPaused>>,
        wait_until: WaitUntil,
    ) -> Self {
        let tracker = Arc::new(ActivityTracker::new());
        let response_buffer: Arc<Mutex<VecDeque<ObservedResponse>>> = Arc::new(Mutex::new(VecDeque::new()));
        let failed_buffer: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(VecDeque::new()));
        let url_by_request: Arc<Mutex<HashMap<String, String>>> = Arc::new(Mutex::new(HashMap::new()));

        let tracker_for_responses = tracker.clone();
        let buffer_for_task = response_buffer.clone();
        let response_task = tokio::task::spawn(async move {
            while let Some(event) = responses.next().await {
                tracker_for_responses.touch();
                let response = &event.response;
                let content_type = serde_json::to_value(&response.headers)
                    .ok()
                    .and_then(|headers| headers.as_object().cloned())
                    .and_then(|map| {
                        map.into_iter()
                            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                            .and_then(|(_, v)| v.as_str().map(str::to_string))
                    })
                    .unwrap_or_default();
                let observed = ObservedResponse {
                    url: response.url.clone(),
                    status: u16::try_from(response.status).unwrap_or(0),
                    content_type,
                    resource_type: event.r#type.as_ref().to_string(),
                };
                buffer_for_task.lock().await.push_back(observed);
            }
        });

        let tracker_for_started = tracker.clone();
        let url_map_for_started = url_by_request.clone();
        let started_task = tokio::task::spawn(async move {
            while let Some(event) = requests_started.next().await {
                tracker_for_started.request_started();
                url_map_for_started.lock().await.insert(event.request_id.inner().clone(), event.request.url.clone());
            }
        });

        let tracker_for_finished = tracker.clone();
        let url_map_for_finished = url_by_request.clone();
        let finished_task = tokio::task::spawn(async move {
            while let Some(event) = requests_finished.next().await {
                tracker_for_finished.request_finished();
                url_map_for_finished.lock().await.remove(event.request_id.inner());
            }
        });

        let tracker_for_failed = tracker.clone();
        let url_map_for_failed = url_by_request.clone();
        let failed_buffer_for_task = failed_buffer.clone();
        let failed_task = tokio::task::spawn(async move {
            while let Some(event) = requests_failed.next().await {
                tracker_for_failed.request_finished();
                let url = url_map_for_failed.lock().await.remove(event.request_id.inner());
                if let Some(url) = url {
                    failed_buffer_for_task.lock().await.push_back(url);
                }
            }
        });

        let interception_task = interception.map(|mut paused| {
            let page_for_interception = page.clone();
            tokio::task::spawn(async move {
                while let Some(event) = paused.next().await {
                    let request_id = event.request_id.clone();
                    if trackers::is_tracker_url(&event.request.url) {
                        if let Ok(params) =
                            FailRequestParams::builder().request_id(request_id).error_reason(ErrorReason::BlockedByClient).build()
                        {
                            let _ = page_for_interception.execute(params).await;
                        }
                    } else if let Ok(params) = ContinueRequestParams::builder().request_id(request_id).build() {
                        let _ = page_for_interception.execute(params).await;
                    }
                }
            })
        });

        Self {
            page,
            tracker,
            wait_until,
            response_buffer,
            failed_buffer,
            response_task,
            started_task,
            finished_task,
            failed_task,
            interception_task,
        }
    }
}

#[async_trait]
impl PageSession for ChromiumPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<NavigateOutcome> {
        self.tracker.touch();
        tokio::time::timeout(timeout, self.page.goto(url)).await.context("navigation timed out")?.context("goto failed")?;

        // `NetworkIdle` has no direct chromiumoxide equivalent; the
        // capture engine's own quiescence loop (§5) already waits for
        // network idle after navigation, so `load` is a safe stand-in here.
        if !matches!(self.wait_until, WaitUntil::Commit) {
            tokio::time::timeout(timeout, self.page.wait_for_navigation())
                .await
                .context("navigation timed out")?
                .context("wait_for_navigation failed")?;
        }

        let final_url = self.page.url().await.ok().flatten().unwrap_or_else(|| url.to_string());
        Ok(NavigateOutcome { final_url, main_status: None })
    }

    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value> {
        let result = self.page.evaluate(script).await.context("evaluate failed")?;
        result.into_value().context("failed to deserialize evaluate result")
    }

    async fn content(&mut self) -> Result<String> {
        self.page.content().await.context("failed to read page content")
    }

    async fn drain_responses(&mut self) -> Vec<ObservedResponse> {
        let mut buf = self.response_buffer.lock().await;
        buf.drain(..).collect()
    }

    async fn drain_failed_requests(&mut self) -> Vec<String> {
        let mut buf = self.failed_buffer.lock().await;
        buf.drain(..).collect()
    }

    async fn response_body(&mut self, _url: &str) -> Result<Option<(Vec<u8>, String)>> {
        // chromiumoxide does not retain bodies past the CDP event window by
        // default; the capture engine re-fetches via `reqwest` when it
        // needs bytes the page itself didn't render inline.
        Ok(None)
    }

    fn in_flight(&self) -> usize {
        self.tracker.in_flight().max(0) as usize
    }

    fn millis_since_last_activity(&self) -> u64 {
        self.tracker.millis_since()
    }

    async fn close(&mut self) -> Result<()> {
        self.response_task.abort();
        self.started_task.abort();
        self.finished_task.abort();
        self.failed_task.abort();
        if let Some(task) = &self.interception_task {
            task.abort();
        }
        self.page.clone().close().await.context("failed to close page")
    }
}

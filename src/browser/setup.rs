//! Executable discovery + managed-download fallback: honors
//! `CHROMIUM_PATH`, common per-platform install locations, and `which`
//! before falling back to downloading a managed Chromium build cached
//! under the run's own storage dir.

use anyhow::{Context, Result};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Chrome/Chromium UA string used for the `--user-agent` stealth arg and
/// for the desktop [`crate::config::DeviceProfile`].
pub const CHROME_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

/// Locate a Chrome/Chromium executable on the system, honoring
/// `CHROMIUM_PATH` first, then common per-platform install locations, then
/// `which`.
pub async fn find_browser_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!(path = %path.display(), "using browser from CHROMIUM_PATH");
            return Ok(path);
        }
        warn!(path = %path.display(), "CHROMIUM_PATH does not exist");
    }

    let paths: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
        ]
    };

    for path_str in paths {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!(path = %path.display(), "found browser");
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path_str.is_empty() {
                    let path = PathBuf::from(path_str);
                    info!(path = %path.display(), "found browser via which");
                    return Ok(path);
                }
            }
        }
    }

    warn!("no Chrome/Chromium executable found, will download a managed copy");
    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Download and cache a managed Chromium build under `cache_dir`.
pub async fn download_managed_browser(cache_dir: &Path) -> Result<PathBuf> {
    info!("downloading managed Chromium build");
    std::fs::create_dir_all(cache_dir).context("failed to create browser cache dir")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(cache_dir)
            .build()
            .context("failed to build fetcher options")?,
    );
    let revision = fetcher.fetch().await.context("failed to fetch browser")?;
    info!(path = %revision.folder_path.display(), "downloaded Chromium");
    Ok(revision.executable_path)
}

/// Stealth/anti-detection launch flags.
pub fn stealth_args() -> Vec<String> {
    [
        format!("--user-agent={CHROME_USER_AGENT}"),
        "--disable-blink-features=AutomationControlled".into(),
        "--disable-infobars".into(),
        "--disable-notifications".into(),
        "--disable-desktop-notifications".into(),
        "--disable-software-rasterizer".into(),
        "--disable-setuid-sandbox".into(),
        "--no-first-run".into(),
        "--no-default-browser-check".into(),
        "--no-sandbox".into(),
        "--enable-features=NetworkService,NetworkServiceInProcess".into(),
        "--disable-extensions".into(),
        "--disable-popup-blocking".into(),
        "--disable-background-networking".into(),
        "--disable-background-timer-throttling".into(),
        "--disable-backgrounding-occluded-windows".into(),
        "--disable-breakpad".into(),
        "--disable-component-extensions-with-background-pages".into(),
        "--disable-features=TranslateUI".into(),
        "--disable-hang-monitor".into(),
        "--disable-ipc-flooding-protection".into(),
        "--disable-prompt-on-repost".into(),
        "--metrics-recording-only".into(),
        "--password-store=basic".into(),
        "--use-mock-keychain".into(),
        "--hide-scrollbars".into(),
        "--mute-audio".into(),
    ]
    .to_vec()
}

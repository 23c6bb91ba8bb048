//! Raw HTTP fallback (§4.4 "Raw fallback"): "fetch the URL through the same
//! proxy via plain HTTPS with a browser-like UA... 20s hard timeout"
//! (§5 "Timeouts"). Grounded on the `reqwest` usage in
//! `web_search/search.rs` for non-browser HTTP fetches.

use std::time::Duration;

use crate::browser::setup::CHROME_USER_AGENT;
use crate::config::Config;

const RAW_FALLBACK_TIMEOUT: Duration = Duration::from_secs(20);

pub async fn fetch_raw(url: &str, config: &Config) -> anyhow::Result<String> {
    let mut builder = reqwest::Client::builder().timeout(RAW_FALLBACK_TIMEOUT).user_agent(CHROME_USER_AGENT);

    if let Some(proxy_entry) = config.proxy.proxies.first() {
        let mut proxy = reqwest::Proxy::all(&proxy_entry.server)?;
        if let Some(username) = &proxy_entry.username {
            proxy = proxy.basic_auth(username, proxy_entry.password.as_deref().unwrap_or_default());
        }
        builder = builder.proxy(proxy);
    }

    let client = builder.build()?;
    let response = client.get(url).send().await?;
    let body = response.text().await?;
    Ok(body)
}

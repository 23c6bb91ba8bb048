//! Offline fallback shim (§4.6, §9 "Offline shim"): "a single inlined
//! script string produced deterministically from the asset index" rather
//! than a service worker, since the shim has to run before any
//! service-worker registration step on a page that never had one.

use crate::asset_store::AssetIndex;

/// Build the `<script>` body that patches `window.fetch`/`XMLHttpRequest`
/// to fall back to the mirrored copy of a URL when the live origin fails
/// or errors, guarded by `window.__OFFLINE_FALLBACK__` so repeated
/// injection (e.g. across rewrite retries) is a no-op.
#[must_use]
pub fn build_offline_shim(assets: &AssetIndex, strip_query: bool) -> String {
    let pairs = assets.shim_map(strip_query);
    let entries: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("[{},{}]", serde_json::to_string(k).unwrap(), serde_json::to_string(v).unwrap()))
        .collect();
    let map_js = format!("[{}]", entries.join(","));

    format!(
        r"(() => {{
  if (window.__OFFLINE_FALLBACK__) return;
  window.__OFFLINE_FALLBACK__ = true;
  const MAP = new Map({map_js});
  function lookup(url) {{
    try {{
      const withQuery = new URL(url, location.href).toString();
      if (MAP.has(withQuery)) return MAP.get(withQuery);
      const withoutQuery = withQuery.split('?')[0];
      if (MAP.has(withoutQuery)) return MAP.get(withoutQuery);
    }} catch (_e) {{ /* relative/invalid URL, no mapping */ }}
    return null;
  }}

  const originalFetch = window.fetch.bind(window);
  window.fetch = async function (input, init) {{
    const url = typeof input === 'string' ? input : input.url;
    const local = lookup(url);
    try {{
      const response = await originalFetch(input, init);
      if (!response.ok && local) return originalFetch(local, init);
      return response;
    }} catch (e) {{
      if (local) return originalFetch(local, init);
      throw e;
    }}
  }};

  const OriginalXHR = window.XMLHttpRequest;
  function PatchedXHR() {{
    const xhr = new OriginalXHR();
    const originalOpen = xhr.open.bind(xhr);
    let requestedUrl = null;
    xhr.open = function (method, url, ...rest) {{
      requestedUrl = url;
      return originalOpen(method, url, ...rest);
    }};
    xhr.addEventListener('error', function () {{
      const local = lookup(requestedUrl);
      if (local) originalOpen('GET', local, true);
    }});
    return xhr;
  }}
  window.XMLHttpRequest = PatchedXHR;
}})()"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_store::AssetIndex;
    use std::path::PathBuf;

    #[test]
    fn shim_is_idempotent_guarded() {
        let index = AssetIndex::new(PathBuf::from("/tmp/sitemirror-test"), 1024, 1024, true, false);
        let script = build_offline_shim(&index, true);
        assert!(script.contains("__OFFLINE_FALLBACK__"));
        assert!(script.trim_start().starts_with("(() => {"));
    }
}

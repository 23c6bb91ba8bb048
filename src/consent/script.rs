//! Assembles the in-page consent resolver program from the vocabulary
//! tables in [`super::vocabulary`] plus the run's configured overrides.

use super::vocabulary::{
    ACCEPT_TEXT_VOCABULARY, BANNER_CONTAINER_SELECTORS, CMP_SELECTORS, GENERIC_SELECTOR_PATTERNS,
    SCROLL_LOCK_BODY_CLASSES, SYNTHETIC_ACCEPTANCE_PAIRS,
};
use crate::config::ConsentConfig;

fn js_string_array(items: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    let quoted: Vec<String> = items
        .into_iter()
        .map(|s| serde_json::to_string(s.as_ref()).unwrap_or_else(|_| "\"\"".to_string()))
        .collect();
    format!("[{}]", quoted.join(","))
}

/// Build the self-contained consent resolver, following the state machine
/// in §4.3: click attempts across all frames, then force-removal,
/// then synthetic persistence, then scroll-lock cleanup. The script
/// evaluates to a JSON object matching [`super::ConsentOutcome`].
#[must_use]
pub fn build_consent_script(config: &ConsentConfig) -> String {
    let mut cmp_selectors: Vec<String> = CMP_SELECTORS.iter().map(|s| (*s).to_string()).collect();
    cmp_selectors.extend(config.extra_selectors.iter().cloned());

    let mut accept_texts: Vec<String> = ACCEPT_TEXT_VOCABULARY.iter().map(|s| (*s).to_string()).collect();
    accept_texts.extend(config.button_texts.iter().cloned());

    let mut force_remove: Vec<String> = BANNER_CONTAINER_SELECTORS.iter().map(|s| (*s).to_string()).collect();
    force_remove.extend(config.force_remove_selectors.iter().cloned());

    let cmp_js = js_string_array(&cmp_selectors);
    let generic_js = js_string_array(GENERIC_SELECTOR_PATTERNS.iter().copied());
    let texts_js = js_string_array(&accept_texts);
    let containers_js = js_string_array(&force_remove);
    let body_classes_js = js_string_array(SCROLL_LOCK_BODY_CLASSES.iter().copied());
    let acceptance_pairs_js = {
        let pairs: Vec<String> = SYNTHETIC_ACCEPTANCE_PAIRS
            .iter()
            .map(|(k, v)| format!("[{},{}]", serde_json::to_string(k).unwrap(), serde_json::to_string(v).unwrap()))
            .collect();
        format!("[{}]", pairs.join(","))
    };

    format!(
        r#"(async () => {{
  const CMP_SELECTORS = {cmp_js};
  const GENERIC_SELECTORS = {generic_js};
  const ACCEPT_TEXTS = {texts_js};
  const FORCE_REMOVE_SELECTORS = {containers_js};
  const BODY_CLASSES = {body_classes_js};
  const ACCEPTANCE_PAIRS = {acceptance_pairs_js};
  const ATTEMPTS = {attempts};
  const RETRY_INTERVAL_MS = {retry_interval_ms};

  function isClickable(el) {{
    if (!el) return false;
    const rect = el.getBoundingClientRect();
    if (rect.width === 0 || rect.height === 0) return false;
    const style = window.getComputedStyle(el);
    return style.display !== 'none' && style.visibility !== 'hidden' && parseFloat(style.opacity || '1') > 0;
  }}

  function collectDocuments() {{
    const docs = [document];
    for (const frame of Array.from(document.querySelectorAll('iframe'))) {{
      try {{
        if (frame.contentDocument) docs.push(frame.contentDocument);
      }} catch (_e) {{ /* cross-origin iframe, skip */ }}
    }}
    return docs;
  }}

  function clickBySelectors(doc, selectors) {{
    for (const sel of selectors) {{
      let el;
      try {{ el = doc.querySelector(sel); }} catch (_e) {{ continue; }}
      if (el && isClickable(el)) {{
        el.click();
        return true;
      }}
    }}
    return false;
  }}

  function clickByText(doc) {{
    const candidates = Array.from(doc.querySelectorAll('button, a, [role="button"]'));
    for (const el of candidates) {{
      const text = (el.textContent || '').trim().toLowerCase();
      if (!text) continue;
      if (ACCEPT_TEXTS.some((t) => text === t || text.includes(t))) {{
        if (isClickable(el)) {{
          el.click();
          return true;
        }}
      }}
    }}
    return false;
  }}

  function shadowSweep(doc) {{
    const hosts = Array.from(doc.querySelectorAll('*')).filter((el) => el.shadowRoot);
    for (const host of hosts) {{
      if (clickBySelectors(host.shadowRoot, CMP_SELECTORS) || clickBySelectors(host.shadowRoot, GENERIC_SELECTORS)) {{
        return true;
      }}
    }}
    return false;
  }}

  let clicked = false;
  let attemptsUsed = 0;
  for (let attempt = 0; attempt < ATTEMPTS; attempt++) {{
    attemptsUsed = attempt + 1;
    let clickedThisRound = false;
    for (const doc of collectDocuments()) {{
      if (clickBySelectors(doc, CMP_SELECTORS)) {{ clickedThisRound = true; continue; }}
      if (clickBySelectors(doc, GENERIC_SELECTORS)) {{ clickedThisRound = true; continue; }}
      if (clickByText(doc)) {{ clickedThisRound = true; continue; }}
      if (shadowSweep(doc)) {{ clickedThisRound = true; }}
    }}
    if (clickedThisRound) clicked = true;
    await new Promise((r) => setTimeout(r, RETRY_INTERVAL_MS));
  }}

  let removed = 0;
  if (!clicked) {{
    for (const doc of collectDocuments()) {{
      for (const sel of FORCE_REMOVE_SELECTORS) {{
        let els;
        try {{ els = Array.from(doc.querySelectorAll(sel)); }} catch (_e) {{ continue; }}
        for (const el of els) {{
          el.remove();
          removed++;
        }}
      }}
    }}
  }}

  try {{
    for (const [key, value] of ACCEPTANCE_PAIRS) {{
      try {{ window.localStorage.setItem(key, value); }} catch (_e) {{ /* storage disabled */ }}
      try {{ window.sessionStorage.setItem(key, value); }} catch (_e) {{ /* storage disabled */ }}
      document.cookie = key + '=' + value + '; path=/; max-age=31536000';
    }}
  }} catch (_e) {{ /* best effort */ }}

  for (const el of [document.documentElement, document.body]) {{
    if (!el) continue;
    el.style.overflow = '';
    el.style.position = '';
    el.style.height = '';
  }}
  for (const cls of BODY_CLASSES) {{
    document.body && document.body.classList.remove(cls);
  }}

  return {{ clicked, removedOverlays: removed, attemptsUsed }};
}})()"#,
        attempts = config.retry_attempts,
        retry_interval_ms = config.retry_interval_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_embeds_configured_extra_selectors() {
        let config = ConsentConfig {
            extra_selectors: vec![".my-accept-btn".to_string()],
            ..ConsentConfig::default()
        };
        let script = build_consent_script(&config);
        assert!(script.contains(".my-accept-btn"));
    }

    #[test]
    fn script_is_an_iife_expression() {
        let script = build_consent_script(&ConsentConfig::default());
        assert!(script.trim_start().starts_with("(async () =>"));
        assert!(script.trim_end().ends_with("})()"));
    }
}

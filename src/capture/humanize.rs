//! Bounded mouse/wheel/key humanization (§4.4 "Humanize"): "a small,
//! bounded sequence... Bounded in wall-clock; never gates success."
//! Grounded on the `browser_setup::apply_stealth_measures`
//! evaluate-a-small-script pattern, generalized from property spoofing to
//! simulated interaction via in-page JS (no separate CDP input API is
//! exposed through [`crate::browser::PageSession`]).

use std::time::Instant;

use crate::browser::PageSession;

const MOVES: &[&str] = &[
    "window.dispatchEvent(new MouseEvent('mousemove', {clientX: 120, clientY: 80}))",
    "window.dispatchEvent(new MouseEvent('mousemove', {clientX: 240, clientY: 160}))",
    "window.scrollBy(0, 40)",
    "window.dispatchEvent(new MouseEvent('mousemove', {clientX: 360, clientY: 220}))",
];

/// Run a bounded humanization sequence, stopping early at `deadline`.
/// Failures are swallowed — this step never determines capture success.
pub async fn run(page: &mut dyn PageSession, deadline: Instant) {
    for script in MOVES {
        if Instant::now() >= deadline {
            return;
        }
        let _ = page.evaluate(script).await;
        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
    }
}

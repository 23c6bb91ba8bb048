//! Consent/popup resolver (§4.3).
//!
//! The resolver itself is a single in-page JS program, assembled once from
//! Rust-side data tables (selector lists, vocabulary lists) the way the
//! teacher's `page_extractor/js_scripts.rs` assembles evaluated scripts
//! from templates rather than one hand-maintained literal (§9 "Consent
//! resolver portability").

mod script;
mod vocabulary;

pub use script::build_consent_script;

use crate::config::ConsentConfig;

/// Outcome of running the consent resolver against a page, reported back
/// up for `reasons[]` bookkeeping (non-fatal either way).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConsentOutcome {
    pub clicked: bool,
    pub removed_overlays: u32,
    pub attempts_used: u32,
}

/// Build the full consent program to evaluate in-page, parameterized by
/// the run's configured vocabulary/selectors. The returned script is
/// self-contained: it returns a JSON-serializable outcome object when
/// evaluated, which callers deserialize into [`ConsentOutcome`].
#[must_use]
pub fn consent_script(config: &ConsentConfig) -> String {
    build_consent_script(config)
}

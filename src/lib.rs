//! `sitemirror` drives a headless browser to snapshot a website into a
//! self-contained, browsable offline mirror: a guided discovery crawler
//! builds the URL graph, a multi-profile capture engine renders and
//! archives each page, and the run orchestrator manages worker
//! concurrency, journaling, and manifest finalization.
//!
//! See `SPEC_FULL.md` and `DESIGN.md` in the repository root for the full
//! module-by-module design and grounding.

pub mod asset_store;
pub mod browser;
pub mod capture;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod consent;
pub mod discovery;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod page_key;
pub mod rewrite;
pub mod same_site;

pub use config::Config;
pub use error::{MirrorError, MirrorResult};
pub use orchestrator::{Orchestrator, RunSummary};

/// Install the crate's tracing subscriber from `config.log_level`
/// (`tracing_subscriber::EnvFilter` syntax) and `config.log_format`.
/// Idempotent: a second call in the same process is a harmless no-op.
pub fn init_tracing(config: &config::Config) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);

    let result = match config.log_format {
        config::LogFormat::Json => subscriber.json().try_init(),
        config::LogFormat::Pretty => subscriber.try_init(),
    };
    if let Err(e) = result {
        tracing::trace!(error = %e, "tracing subscriber already installed");
    }
}

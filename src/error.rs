//! Error taxonomy for the capture pipeline.
//!
//! Every fallible operation in this crate returns a `Result` — nothing is
//! allowed to panic or unwind across a worker boundary. The capture engine
//! in particular never lets an error escape a `(url, profile)` job; it is
//! instead folded into the job's `CaptureRecord::status` and `reasons[]`.

use thiserror::Error;

/// Top-level error type for configuration, discovery, and orchestration.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type MirrorResult<T> = Result<T, MirrorError>;

/// Per-capture failure kind, serialized into `CaptureRecord::status` as
/// `error:<kind> <msg>` per the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFailureKind {
    Nav,
    RawOnly,
    Raw,
    PageTimeout,
}

impl CaptureFailureKind {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Nav => "nav",
            Self::RawOnly => "rawOnly",
            Self::Raw => "raw",
            Self::PageTimeout => "pageTimeout",
        }
    }
}

impl std::fmt::Display for CaptureFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Format an `error:<kind> <msg>` status string per the error taxonomy (§7).
#[must_use]
pub fn format_error_status(kind: CaptureFailureKind, msg: &str) -> String {
    format!("error:{kind} {msg}")
}

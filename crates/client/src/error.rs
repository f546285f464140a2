// crates/client/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between "start analysis" and "report on
/// screen". `Cancelled` is the one variant display code must swallow: a
/// cancelled run is silence, not failure.
#[derive(Debug, Error)]
pub enum Error {
    #[error("session endpoint returned {status}: {body}")]
    Session { status: u16, body: String },

    #[error("session response carries no id field: {body}")]
    SessionIdMissing { body: String },

    #[error("query endpoint returned {status}: {body}")]
    Query { status: u16, body: String },

    #[error("query endpoint cannot stream (content-type {content_type:?})")]
    StreamUnsupported { content_type: Option<String> },

    #[error("stream failed: {0}")]
    Stream(String),

    #[error("run cancelled")]
    Cancelled,

    #[error("{endpoint} returned {status}: {body}")]
    Backend {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("attachment is not an image: {path}")]
    AttachmentNotImage { path: PathBuf },

    #[error("attachment too large: {path} is {size} bytes (limit {limit})")]
    AttachmentTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// True only for explicit cancellation; callers suppress these instead
    /// of rendering them.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

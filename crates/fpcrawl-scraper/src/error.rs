use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("navigation to {url} did not settle within {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("unparseable {field} price text \"{raw}\"")]
    PriceParse { field: &'static str, raw: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to write diagnostic snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("page session does not support {capability}")]
    Unsupported { capability: &'static str },

    #[error("record sink rejected record: {reason}")]
    Sink { reason: String },
}

impl ScraperError {
    /// Returns `true` for failures confined to a single listing. The crawler
    /// skips the listing and keeps emitting the rest of the page.
    #[must_use]
    pub fn is_record_level(&self) -> bool {
        matches!(self, ScraperError::PriceParse { .. } | ScraperError::InvalidUrl { .. })
    }
}

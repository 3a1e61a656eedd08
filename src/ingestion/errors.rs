//! Error types for the ingestion domain

use thiserror::Error;

/// A single page could not be turned into corpus text.
///
/// Fetch errors are recoverable: the crawler records them as warnings and
/// skips the page without following its links.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} when fetching {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("unsupported content type '{content_type}' at {url}")]
    UnsupportedContentType { url: String, content_type: String },
}

/// Errors that prevent a crawl from starting at all
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("invalid root URL '{url}': {reason}")]
    InvalidRootUrl { url: String, reason: String },

    #[error("invalid crawl bounds: {0}")]
    InvalidBounds(String),

    #[error("invalid URL pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

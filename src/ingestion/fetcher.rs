//! HTTP page fetching

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::ingestion::{CrawlError, FetchError};

/// Broad kind of a fetched document, derived from its content type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    PlainText,
    Json,
}

impl DocumentKind {
    /// Classify a `Content-Type` header value. A missing header is treated as
    /// plain text.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "" | "text/plain" | "text/markdown" => Some(DocumentKind::PlainText),
            "text/html" | "application/xhtml+xml" => Some(DocumentKind::Html),
            "application/json" => Some(DocumentKind::Json),
            _ => None,
        }
    }
}

/// A successfully fetched document body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    /// Where the document was served from, after following redirects
    pub url: Url,
    pub kind: DocumentKind,
    pub body: String,
}

/// Fetches one URL. Implementations must enforce their own timeout.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchError>;
}

/// Fetches pages over HTTP(S) with reqwest
pub struct HttpPageFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| CrawlError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Fetcher with the crate's default user agent and a 10 second timeout
    pub fn with_defaults() -> Result<Self, CrawlError> {
        Self::new(default_user_agent(), Duration::from_secs(10))
    }

    async fn fetch_inner(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_request_error(url, e))?;

        let final_url = response.url().clone();
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let kind = DocumentKind::from_content_type(&content_type).ok_or_else(|| {
            FetchError::UnsupportedContentType {
                url: url.to_string(),
                content_type: content_type.clone(),
            }
        })?;

        let body = response
            .text()
            .await
            .map_err(|e| self.map_request_error(url, e))?;

        Ok(FetchedDocument {
            url: final_url,
            kind,
            body,
        })
    }

    fn map_request_error(&self, url: &Url, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
        // The client timeout covers each request phase; this bounds the whole
        // exchange including the body read
        match tokio::time::timeout(self.timeout, self.fetch_inner(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

/// `mcp-builder/<version>`
pub fn default_user_agent() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
}

//! Corpus data model produced by the crawler

use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// One crawled document, created once per successful fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Canonical absolute URL; unique within a corpus
    pub url: Url,
    pub title: Option<String>,
    /// Normalized plain text. Headings are kept on their own lines prefixed
    /// with one `#` per heading level.
    pub text: String,
    /// Absolute links found on the page, deduplicated, in document order
    pub outbound_links: Vec<Url>,
    /// Link distance from the crawl root
    pub depth: usize,
}

/// Ordered collection of pages from one crawl run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    pub root_url: Url,
    pub pages: Vec<Page>,
    /// Number of fetches issued, failed ones included
    pub visited_count: usize,
    /// True if a page or depth bound (or cancellation) stopped the crawl
    /// before the frontier emptied
    pub truncated: bool,
    /// Recoverable problems encountered while crawling
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Corpus {
    /// Create an empty corpus for `root_url`
    pub fn new(root_url: Url) -> Self {
        Self {
            root_url,
            pages: Vec::new(),
            visited_count: 0,
            truncated: false,
            warnings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Title of the first page that has one, used as the documentation title
    pub fn title(&self) -> Option<&str> {
        self.pages.iter().find_map(|page| page.title.as_deref())
    }

    /// Persist the corpus as pretty-printed JSON
    pub async fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, json).await
    }

    /// Load a corpus previously written with [`Corpus::save`]
    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(std::io::Error::from)
    }
}

//! Breadth-first documentation crawler
//!
//! The crawler walks in-domain links from a root URL in FIFO order. Fetches
//! run concurrently in batches taken from the head of the frontier, but their
//! results are applied in frontier order, so a static site always yields the
//! same corpus in the same order regardless of which response lands first.

use futures::future::join_all;
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::ingestion::{
    CorpusStore, CrawlError, DocumentKind, FetchError, FetchedDocument, HttpPageFetcher, Page,
    PageFetcher, RequestThrottle, RobotsRules, canonicalize, canonicalize_absolute, extract_html,
    fetcher::default_user_agent, normalize_plain_text, same_registrable_domain,
};
use crate::ingestion::Corpus;

/// Bounds and politeness settings for one crawl
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Maximum number of fetches issued (must be at least 1)
    pub max_pages: usize,
    /// Maximum link distance from the root; 0 crawls the root only
    pub max_depth: usize,
    /// Minimum delay between two request starts
    pub delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum number of fetches in flight
    pub concurrency: usize,
    pub respect_robots: bool,
    pub user_agent: String,
    /// Regexes a URL must fully match (any of) to be crawled; empty allows all
    pub allow_patterns: Vec<String>,
    /// Regexes that exclude a URL when any of them fully matches
    pub deny_patterns: Vec<String>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_pages: 20,
            max_depth: 3,
            delay: Duration::from_millis(250),
            timeout: Duration::from_secs(10),
            concurrency: 4,
            respect_robots: true,
            user_agent: default_user_agent().to_string(),
            allow_patterns: Vec::new(),
            deny_patterns: Vec::new(),
        }
    }
}

impl CrawlOptions {
    fn validate(&self) -> Result<(), CrawlError> {
        if self.max_pages == 0 {
            return Err(CrawlError::InvalidBounds(
                "max_pages must be a positive integer".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(CrawlError::InvalidBounds(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Crawls a documentation site into a [`Corpus`]
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    options: CrawlOptions,
    cancel: CancellationToken,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>, options: CrawlOptions) -> Self {
        Self {
            fetcher,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Crawler backed by [`HttpPageFetcher`] configured from `options`
    pub fn http(options: CrawlOptions) -> Result<Self, CrawlError> {
        let fetcher = HttpPageFetcher::new(&options.user_agent, options.timeout)?;
        Ok(Self::new(Arc::new(fetcher), options))
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops further fetch issuance when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Crawl from `root_url` until the frontier empties, a bound is hit or
    /// the crawl is cancelled.
    ///
    /// Only configuration problems are errors. Failed pages are recorded in
    /// [`Corpus::warnings`] and skipped.
    pub async fn crawl(&self, root_url: &str) -> Result<Corpus, CrawlError> {
        // 1. Validate inputs
        self.options.validate()?;
        let root = canonicalize_absolute(root_url).map_err(|reason| CrawlError::InvalidRootUrl {
            url: root_url.to_string(),
            reason,
        })?;
        let filter = UrlFilter::new(&self.options.allow_patterns, &self.options.deny_patterns)?;
        let throttle = RequestThrottle::new(self.options.delay);

        info!(
            "Crawling {} (max_pages={}, max_depth={}, concurrency={})",
            root, self.options.max_pages, self.options.max_depth, self.options.concurrency
        );

        // 2. Load exclusion rules for the root origin
        let robots = self.load_robots(&root, &throttle).await;
        let scope = CrawlScope {
            root: root.clone(),
            filter,
            robots,
        };

        let mut corpus = Corpus::new(root.clone());
        if !scope.admits(&root) {
            let message = format!("root URL {root} is excluded by robots.txt or URL patterns");
            warn!("{message}");
            corpus.warnings.push(message);
            return Ok(corpus);
        }

        // 3. Breadth-first traversal
        let frontier = Frontier::default();
        frontier.try_enqueue(root.clone(), 0);
        let store = CorpusStore::new();

        loop {
            if self.cancel.is_cancelled() {
                corpus.truncated = true;
                break;
            }

            let remaining = self.options.max_pages - corpus.visited_count;
            if remaining == 0 {
                if !frontier.is_empty() {
                    debug!("Page bound reached with {} queued URLs", frontier.len());
                    corpus.truncated = true;
                }
                break;
            }

            let batch = frontier.pop_batch(remaining.min(self.options.concurrency));
            if batch.is_empty() {
                break;
            }

            let results = join_all(batch.iter().map(|entry| self.fetch_one(&entry.url, &throttle))).await;

            for (entry, outcome) in batch.into_iter().zip(results) {
                let Some(result) = outcome else {
                    corpus.truncated = true;
                    continue;
                };
                corpus.visited_count += 1;

                match result {
                    Err(error) => {
                        warn!("Skipping {}: {}", entry.url, error);
                        corpus.warnings.push(format!("skipped {}: {}", entry.url, error));
                    }
                    Ok(document) => {
                        // A redirected page is stored and resolved at the URL it landed on
                        let url = match canonicalize_absolute(document.url.as_str()) {
                            Ok(landed) => landed,
                            Err(_) => entry.url.clone(),
                        };
                        if url != entry.url {
                            if !scope.admits(&url) {
                                let message = format!(
                                    "skipped {}: redirected to {url}, outside the crawl scope",
                                    entry.url
                                );
                                warn!("{message}");
                                corpus.warnings.push(message);
                                continue;
                            }
                            if !frontier.mark_seen(&url) {
                                debug!("{} redirects to already known {url}", entry.url);
                                continue;
                            }
                        }

                        let page = build_page(url, entry.depth, document);
                        for link in &page.outbound_links {
                            if !scope.admits(link) {
                                continue;
                            }
                            if entry.depth + 1 > self.options.max_depth {
                                if !frontier.has_seen(link) {
                                    corpus.truncated = true;
                                }
                                continue;
                            }
                            frontier.try_enqueue(link.clone(), entry.depth + 1);
                        }
                        debug!("Stored {} (depth {})", page.url, page.depth);
                        store.append(page);
                    }
                }
            }
        }

        if self.cancel.is_cancelled() {
            let message = "crawl was cancelled; the corpus is partial".to_string();
            warn!("{message}");
            corpus.warnings.push(message);
        }

        corpus.pages = store.into_pages();
        info!(
            "Crawl finished: {} pages stored, {} fetches, truncated={}",
            corpus.pages.len(),
            corpus.visited_count,
            corpus.truncated
        );
        Ok(corpus)
    }

    /// Fetch one URL after waiting for a throttle slot. `None` means the crawl
    /// was cancelled before the request completed.
    async fn fetch_one(
        &self,
        url: &Url,
        throttle: &RequestThrottle,
    ) -> Option<Result<FetchedDocument, FetchError>> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            result = async {
                throttle.acquire().await;
                self.fetcher.fetch(url).await
            } => Some(result),
        }
    }

    async fn load_robots(&self, root: &Url, throttle: &RequestThrottle) -> RobotsRules {
        if !self.options.respect_robots {
            return RobotsRules::allow_all();
        }

        let Ok(robots_url) = root.join("/robots.txt") else {
            return RobotsRules::allow_all();
        };

        throttle.acquire().await;
        match self.fetcher.fetch(&robots_url).await {
            Ok(document) if document.kind != DocumentKind::Html => {
                let rules = RobotsRules::parse(&document.body, &self.options.user_agent);
                debug!("Loaded robots.txt from {robots_url}");
                rules
            }
            Ok(_) => RobotsRules::allow_all(),
            Err(error) => {
                debug!("No usable robots.txt at {robots_url}: {error}");
                RobotsRules::allow_all()
            }
        }
    }
}

/// Crawl `root_url` over HTTP with default politeness settings
pub async fn crawl(root_url: &str, max_pages: usize, max_depth: usize) -> Result<Corpus, CrawlError> {
    let options = CrawlOptions {
        max_pages,
        max_depth,
        ..CrawlOptions::default()
    };
    Crawler::http(options)?.crawl(root_url).await
}

fn build_page(url: Url, depth: usize, document: FetchedDocument) -> Page {
    match document.kind {
        DocumentKind::Html => {
            let extracted = extract_html(&document.body);
            let mut seen = HashSet::new();
            let outbound_links = extracted
                .links
                .iter()
                .filter_map(|href| canonicalize(&url, href))
                .filter(|link| seen.insert(link.clone()))
                .collect();

            Page {
                url,
                title: extracted.title,
                text: extracted.text,
                outbound_links,
                depth,
            }
        }
        DocumentKind::PlainText => Page {
            url,
            title: None,
            text: normalize_plain_text(&document.body),
            outbound_links: Vec::new(),
            depth,
        },
        DocumentKind::Json => Page {
            url,
            title: None,
            text: document.body.trim().to_string(),
            outbound_links: Vec::new(),
            depth,
        },
    }
}

/// Which URLs this crawl may visit
struct CrawlScope {
    root: Url,
    filter: UrlFilter,
    robots: RobotsRules,
}

impl CrawlScope {
    fn admits(&self, url: &Url) -> bool {
        if !same_registrable_domain(&self.root, url) {
            return false;
        }
        if !self.filter.permits(url) {
            debug!("URL pattern excludes {url}");
            return false;
        }
        if !self.robots.is_allowed(url) {
            debug!("robots.txt excludes {url}");
            return false;
        }
        true
    }
}

/// Allow/deny regex lists matched against the full URL
struct UrlFilter {
    allow: Vec<Regex>,
    deny: Vec<Regex>,
}

impl UrlFilter {
    fn new(allow: &[String], deny: &[String]) -> Result<Self, CrawlError> {
        Ok(Self {
            allow: compile_patterns(allow)?,
            deny: compile_patterns(deny)?,
        })
    }

    fn permits(&self, url: &Url) -> bool {
        let url = url.as_str();
        if !self.allow.is_empty() && !self.allow.iter().any(|re| re.is_match(url)) {
            return false;
        }
        !self.deny.iter().any(|re| re.is_match(url))
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, CrawlError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(&format!("^(?:{pattern})$")).map_err(|source| CrawlError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
struct QueuedUrl {
    url: Url,
    depth: usize,
}

/// FIFO queue plus the set of every URL ever enqueued. Check-and-enqueue
/// happens under one lock.
#[derive(Debug, Default)]
struct Frontier {
    inner: Mutex<FrontierState>,
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<QueuedUrl>,
    seen: HashSet<Url>,
}

impl Frontier {
    fn try_enqueue(&self, url: Url, depth: usize) -> bool {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.seen.insert(url.clone()) {
            return false;
        }
        state.queue.push_back(QueuedUrl { url, depth });
        true
    }

    /// Record `url` as visited without queueing it; false when already seen
    fn mark_seen(&self, url: &Url) -> bool {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.seen.insert(url.clone())
    }

    fn pop_batch(&self, max: usize) -> Vec<QueuedUrl> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let count = max.min(state.queue.len());
        state.queue.drain(..count).collect()
    }

    fn has_seen(&self, url: &Url) -> bool {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.seen.contains(url)
    }

    fn len(&self) -> usize {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.queue.len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

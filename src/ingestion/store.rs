//! Append-only page store for a single crawl run

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use url::Url;

use crate::ingestion::Page;

/// Holds crawled pages keyed by URL.
///
/// [`CorpusStore::append`] is the only mutation and takes the store lock for
/// its whole duration, so concurrent fetch completions are serialized.
#[derive(Debug, Default)]
pub struct CorpusStore {
    inner: Mutex<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    pages: Vec<Page>,
    urls: HashSet<Url>,
}

impl CorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page. Returns `false` and drops the page if its URL is
    /// already stored.
    pub fn append(&self, page: Page) -> bool {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.urls.insert(page.url.clone()) {
            return false;
        }
        state.pages.push(page);
        true
    }

    pub fn len(&self) -> usize {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freeze the store, yielding its pages in append order
    pub fn into_pages(self) -> Vec<Page> {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn page(url: &str) -> Page {
        Page {
            url: Url::parse(url).unwrap(),
            title: None,
            text: String::new(),
            outbound_links: vec![],
            depth: 0,
        }
    }

    #[test]
    fn test_append_rejects_duplicates() {
        let store = CorpusStore::new();
        assert!(store.append(page("https://docs.example.com/a")));
        assert!(store.append(page("https://docs.example.com/b")));
        assert!(!store.append(page("https://docs.example.com/a")));

        assert_eq!(store.len(), 2);

        let urls: Vec<String> = store
            .into_pages()
            .into_iter()
            .map(|p| p.url.to_string())
            .collect();
        assert_eq!(urls, vec!["https://docs.example.com/a", "https://docs.example.com/b"]);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_serialized() {
        let store = Arc::new(CorpusStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                // Every URL is appended twice from different tasks
                store.append(page(&format!("https://docs.example.com/{}", i % 16)))
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 16);
        assert_eq!(store.len(), 16);
    }
}

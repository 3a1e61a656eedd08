//! Ingestion domain - crawls a documentation site into a corpus
//!
//! The crawler owns the traversal (frontier, bounds, politeness), fetchers
//! turn URLs into documents, and extraction turns documents into the
//! normalized text the planners read.

pub mod canonical;
pub mod crawler;
pub mod errors;
pub mod extract;
pub mod fetcher;
pub mod robots;
pub mod store;
pub mod throttle;
pub mod types;

pub use canonical::*;
pub use crawler::*;
pub use errors::*;
pub use extract::*;
pub use fetcher::{DocumentKind, FetchedDocument, HttpPageFetcher, PageFetcher};
pub use robots::*;
pub use store::*;
pub use throttle::*;
pub use types::*;

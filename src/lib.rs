//! mcp-builder library
//!
//! Turns a documentation website into a runnable MCP server project in three
//! stages: crawl the documentation into a text corpus, derive an integration
//! blueprint from that corpus, and render the blueprint through a scaffold.
#![deny(unsafe_code)]

pub mod application;
pub mod blueprint;
pub mod config;
pub mod ingestion;
pub mod planning;
pub mod scaffold;
pub mod utils;

pub use application::{BlueprintSource, GenerationResult};
pub use blueprint::{Blueprint, ValidationError};
pub use ingestion::{Corpus, Page};

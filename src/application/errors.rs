//! Application layer error types

use thiserror::Error;

use crate::blueprint::ValidationError;
use crate::ingestion::CrawlError;
use crate::planning::PlannerError;
use crate::scaffold::ScaffoldError;

/// Fatal pipeline errors. Recoverable problems become warnings on the
/// [`GenerationResult`](crate::application::GenerationResult) instead.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Planner error: {0}")]
    Planner(#[from] PlannerError),

    /// The heuristic planner produced a blueprint the validator rejects
    #[error("Heuristic planner produced an invalid blueprint (this is a bug): {0}")]
    HeuristicDefect(ValidationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Scaffold error: {0}")]
    Scaffold(#[from] ScaffoldError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

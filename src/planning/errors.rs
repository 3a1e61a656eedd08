//! Error types for the planning domain

use thiserror::Error;

use crate::blueprint::ValidationError;

/// Failure reported by a completion client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Why one chunk's completion was not usable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    #[error("response is not a JSON object: {0}")]
    Malformed(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// The LLM planner could not produce a blueprint
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("completion request failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("no usable resources in {chunks} completion(s)")]
    NoUsableResources { chunks: usize },

    #[error("corpus has no text to plan from")]
    EmptyCorpus,

    #[error("LLM planner is not configured: {0}")]
    NotConfigured(String),

    #[error("merged blueprint is invalid: {0}")]
    Validation(#[from] ValidationError),
}

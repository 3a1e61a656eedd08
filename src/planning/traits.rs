//! Port interfaces for the planning layer

use async_trait::async_trait;

use crate::planning::CompletionError;

/// An external reasoning service that turns a prompt into text.
///
/// Implementations must be stateless per call; the LLM planner issues
/// requests for different chunks concurrently.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Short label used in logs, e.g. the model name
    fn describe(&self) -> String {
        "completion client".to_string()
    }
}

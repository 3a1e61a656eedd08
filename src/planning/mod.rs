//! Planning domain - derives a blueprint from a corpus
//!
//! Two planners share the blueprint schema: the LLM planner, which asks an
//! external completion service, and the heuristic planner, which is offline
//! and always succeeds. Choosing between them is the pipeline's job.

pub mod chunker;
pub mod errors;
pub mod heuristic;
pub mod llm;
pub mod merge;
pub mod openai;
pub mod prompt;
pub mod traits;

pub use chunker::*;
pub use errors::*;
pub use heuristic::*;
pub use llm::*;
pub use merge::*;
pub use openai::{OpenAiCompletionClient, OpenAiConfig};
pub use prompt::*;
pub use traits::*;

//! Pipeline request and result types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::blueprint::Blueprint;

/// Exit status for a run that fell back to the heuristic planner
pub const EXIT_PARTIAL: u8 = 3;
/// Exit status for a hard failure
pub const EXIT_FAILURE: u8 = 1;

/// Which planner produced the blueprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlueprintSource {
    Llm,
    Heuristic,
}

impl fmt::Display for BlueprintSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlueprintSource::Llm => write!(f, "llm"),
            BlueprintSource::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// A blueprint together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanResult {
    pub blueprint: Blueprint,
    pub source: BlueprintSource,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GenerateProjectRequest {
    pub root_url: String,
    pub output_dir: PathBuf,
}

/// Output of one full pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub output_dir: PathBuf,
    pub blueprint: Blueprint,
    pub source: BlueprintSource,
    /// Every recoverable problem, crawl warnings first
    pub warnings: Vec<String>,
    /// Files written, relative to `output_dir`
    pub files: Vec<PathBuf>,
}

impl GenerationResult {
    /// 0 when the LLM planner produced the blueprint, 3 for the heuristic
    /// fallback
    pub fn exit_code(&self) -> u8 {
        match self.source {
            BlueprintSource::Llm => 0,
            BlueprintSource::Heuristic => EXIT_PARTIAL,
        }
    }
}

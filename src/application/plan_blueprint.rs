//! Two-stage planning: the LLM planner first, the heuristic planner as the
//! guaranteed fallback

use tracing::{info, warn};

use crate::application::{ApplicationError, BlueprintSource, PlanResult};
use crate::blueprint::validate_blueprint;
use crate::ingestion::Corpus;
use crate::planning::{LlmPlanner, plan_heuristic};

/// Reason recorded when no LLM planner is available
pub const NO_PLANNER_REASON: &str = "no completion client configured";

/// Plan a blueprint for `corpus`.
///
/// With no `planner`, or when it fails, the heuristic planner runs instead
/// and the reason is recorded as a warning. `unavailable_reason` explains a
/// missing planner.
pub async fn plan_blueprint(
    corpus: &Corpus,
    planner: Option<&LlmPlanner>,
    unavailable_reason: &str,
) -> Result<PlanResult, ApplicationError> {
    let mut warnings = Vec::new();

    if corpus.truncated {
        record(
            &mut warnings,
            format!(
                "crawl stopped early after {} fetch(es); the blueprint may be incomplete",
                corpus.visited_count
            ),
        );
    }

    let fallback_reason = match planner {
        Some(planner) => match planner.plan(corpus).await {
            Ok(outcome) => {
                warnings.extend(outcome.warnings);
                info!(
                    "LLM planner produced {} resource(s), {} endpoint(s)",
                    outcome.blueprint.resources.len(),
                    outcome.blueprint.endpoint_count()
                );
                return Ok(PlanResult {
                    blueprint: outcome.blueprint,
                    source: BlueprintSource::Llm,
                    warnings,
                });
            }
            Err(e) => format!("LLM planner failed ({e}); falling back to heuristic planner"),
        },
        None => format!("LLM planner unavailable ({unavailable_reason}); using heuristic planner"),
    };
    record(&mut warnings, fallback_reason);

    let blueprint =
        validate_blueprint(plan_heuristic(corpus)).map_err(ApplicationError::HeuristicDefect)?;

    if blueprint.resources.is_empty() {
        record(
            &mut warnings,
            "heuristic planner found no endpoints; the generated server exposes no tools"
                .to_string(),
        );
    }
    info!(
        "Heuristic planner produced {} resource(s), {} endpoint(s)",
        blueprint.resources.len(),
        blueprint.endpoint_count()
    );

    Ok(PlanResult {
        blueprint,
        source: BlueprintSource::Heuristic,
        warnings,
    })
}

fn record(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

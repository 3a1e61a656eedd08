//! Use case for generating a server project from a documentation site

use std::sync::Arc;
use tracing::info;

use crate::application::{
    ApplicationError, GenerateProjectRequest, GenerationResult, NO_PLANNER_REASON, plan_blueprint,
};
use crate::ingestion::Crawler;
use crate::planning::LlmPlanner;
use crate::scaffold::{Scaffold, ScaffoldRenderer, check_output_dir};

/// Crawl, plan and render in one run
pub struct GenerateProjectUseCase {
    crawler: Crawler,
    planner: Option<LlmPlanner>,
    unavailable_reason: String,
    scaffold: Arc<Scaffold>,
    renderer: ScaffoldRenderer,
}

impl GenerateProjectUseCase {
    pub fn new(crawler: Crawler, scaffold: Arc<Scaffold>, renderer: ScaffoldRenderer) -> Self {
        Self {
            crawler,
            planner: None,
            unavailable_reason: NO_PLANNER_REASON.to_string(),
            scaffold,
            renderer,
        }
    }

    pub fn with_planner(mut self, planner: LlmPlanner) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Run heuristic-only, recording `reason` as the fallback warning
    pub fn without_planner(mut self, reason: impl Into<String>) -> Self {
        self.planner = None;
        self.unavailable_reason = reason.into();
        self
    }

    pub async fn execute(
        &self,
        request: GenerateProjectRequest,
    ) -> Result<GenerationResult, ApplicationError> {
        // 1. Refuse an occupied output directory before doing any work
        check_output_dir(&request.output_dir, self.renderer.options().overwrite).await?;

        // 2. Crawl
        let corpus = self.crawler.crawl(&request.root_url).await?;
        let mut warnings = corpus.warnings.clone();

        // 3. Plan
        let plan = plan_blueprint(&corpus, self.planner.as_ref(), &self.unavailable_reason).await?;
        warnings.extend(plan.warnings);

        // 4. Render
        let project = self
            .renderer
            .render(&plan.blueprint, &self.scaffold, &request.output_dir)
            .await?;

        info!(
            "Generated {} ({} source, {} warning(s)) in {}",
            plan.blueprint.service_name,
            plan.source,
            warnings.len(),
            project.output_dir.display()
        );

        Ok(GenerationResult {
            output_dir: project.output_dir,
            blueprint: plan.blueprint,
            source: plan.source,
            warnings,
            files: project.files,
        })
    }
}

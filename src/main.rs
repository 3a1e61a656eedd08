//! mcp-builder CLI entrypoint
//! Parses command-line arguments and dispatches to the library pipeline.
#![deny(unsafe_code)]

// Internal imports (std, crate)
use mcp_builder::{
    application::{
        BlueprintSource, EXIT_FAILURE, EXIT_PARTIAL, GenerateProjectRequest, GenerateProjectUseCase,
        GenerationResult, plan_blueprint,
    },
    blueprint::validate,
    config::BuilderConfig,
    ingestion::{Corpus, Crawler},
    planning::LlmPlanner,
    scaffold::{Scaffold, ScaffoldRenderer, default_scaffold, load_scaffold_from_dir},
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mcp-builder")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to <config dir>/mcp-builder/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Crawl a documentation site, plan a blueprint and render an MCP server project
    Generate {
        /// Documentation root URL
        url: String,
        /// Directory to render the project into
        output_dir: PathBuf,
        #[command(flatten)]
        crawl: CrawlArgs,
        #[command(flatten)]
        planner: PlannerArgs,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Crawl a documentation site and save the corpus as JSON
    Crawl {
        /// Documentation root URL
        url: String,
        /// Corpus output file
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        crawl: CrawlArgs,
    },
    /// Plan a blueprint and print it as JSON
    Plan {
        /// Documentation root URL to crawl
        #[arg(required_unless_present = "corpus", conflicts_with = "corpus")]
        url: Option<String>,
        /// Plan from a saved corpus instead of crawling
        #[arg(long)]
        corpus: Option<PathBuf>,
        #[command(flatten)]
        crawl: CrawlArgs,
        #[command(flatten)]
        planner: PlannerArgs,
    },
    /// Render a saved blueprint into a project
    Render {
        /// Blueprint JSON file
        #[arg(long)]
        blueprint: PathBuf,
        /// Directory to render the project into
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        render: RenderArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct CrawlArgs {
    /// Maximum number of pages to fetch
    #[arg(long)]
    max_pages: Option<usize>,
    /// Maximum link depth from the root
    #[arg(long)]
    max_depth: Option<usize>,
    /// Minimum delay between requests in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[derive(clap::Args, Debug, Clone)]
struct PlannerArgs {
    /// Skip the LLM planner and use the offline heuristic planner
    #[arg(long)]
    heuristic_only: bool,
}

#[derive(clap::Args, Debug, Clone)]
struct RenderArgs {
    /// Render into a non-empty output directory
    #[arg(long)]
    overwrite: bool,
    /// Load the scaffold from a directory instead of the embedded one
    #[arg(long)]
    scaffold_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error:?}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = BuilderConfig::load(cli.config.as_deref(), env_lookup)
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Generate {
            url,
            output_dir,
            crawl,
            planner,
            render,
        } => {
            crawl.apply(&mut config);
            render.apply(&mut config);

            let crawler = crawler(&config)?;
            let scaffold = load_scaffold(render.scaffold_dir.as_deref()).await?;
            let renderer = ScaffoldRenderer::new(config.render_options());
            let use_case = match llm_planner(&config, &planner) {
                Ok(planner) => GenerateProjectUseCase::new(crawler, scaffold, renderer)
                    .with_planner(planner),
                Err(reason) => GenerateProjectUseCase::new(crawler, scaffold, renderer)
                    .without_planner(reason),
            };

            let result = use_case
                .execute(GenerateProjectRequest {
                    root_url: url,
                    output_dir,
                })
                .await
                .context("Generation failed")?;

            print_summary(&result);
            Ok(ExitCode::from(result.exit_code()))
        }
        Commands::Crawl { url, out, crawl } => {
            crawl.apply(&mut config);
            let corpus = crawler(&config)?.crawl(&url).await?;
            corpus
                .save(&out)
                .await
                .with_context(|| format!("Failed to write corpus to {}", out.display()))?;

            info!(
                "Saved {} page(s) ({} fetch(es), truncated: {}) to {}",
                corpus.len(),
                corpus.visited_count,
                corpus.truncated,
                out.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Plan {
            url,
            corpus,
            crawl,
            planner,
        } => {
            crawl.apply(&mut config);
            let corpus = match (corpus, url) {
                (Some(path), _) => Corpus::load(&path)
                    .await
                    .with_context(|| format!("Failed to read corpus {}", path.display()))?,
                (None, Some(url)) => crawler(&config)?.crawl(&url).await?,
                (None, None) => anyhow::bail!("either a URL or --corpus is required"),
            };

            let (llm, reason) = match llm_planner(&config, &planner) {
                Ok(planner) => (Some(planner), String::new()),
                Err(reason) => (None, reason),
            };
            let plan = plan_blueprint(&corpus, llm.as_ref(), &reason).await?;

            println!("{}", plan.blueprint.to_json_pretty()?);
            Ok(match plan.source {
                BlueprintSource::Llm => ExitCode::SUCCESS,
                BlueprintSource::Heuristic => ExitCode::from(EXIT_PARTIAL),
            })
        }
        Commands::Render {
            blueprint,
            output,
            render,
        } => {
            render.apply(&mut config);
            let content = tokio::fs::read_to_string(&blueprint)
                .await
                .with_context(|| format!("Failed to read blueprint {}", blueprint.display()))?;
            let candidate: serde_json::Value =
                serde_json::from_str(&content).context("Blueprint is not valid JSON")?;
            let blueprint = validate(&candidate)?;

            let scaffold = load_scaffold(render.scaffold_dir.as_deref()).await?;
            let project = ScaffoldRenderer::new(config.render_options())
                .render(&blueprint, &scaffold, &output)
                .await?;

            println!(
                "Rendered {} file(s) into {}",
                project.files.len(),
                project.output_dir.display()
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

impl CrawlArgs {
    fn apply(&self, config: &mut BuilderConfig) {
        if let Some(max_pages) = self.max_pages {
            config.crawl.max_pages = max_pages;
        }
        if let Some(max_depth) = self.max_depth {
            config.crawl.max_depth = max_depth;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.crawl.delay_ms = delay_ms;
        }
    }
}

impl RenderArgs {
    fn apply(&self, config: &mut BuilderConfig) {
        if self.overwrite {
            config.render.overwrite = true;
        }
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// HTTP crawler whose crawl stops early on Ctrl-C
fn crawler(config: &BuilderConfig) -> anyhow::Result<Crawler> {
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing with the pages crawled so far");
            on_signal.cancel();
        }
    });

    Ok(Crawler::http(config.crawl_options())?.with_cancellation(token))
}

/// The LLM planner, or the reason it is unavailable
fn llm_planner(config: &BuilderConfig, args: &PlannerArgs) -> Result<LlmPlanner, String> {
    if args.heuristic_only {
        return Err("--heuristic-only given".to_string());
    }
    config.llm_planner(env_lookup).map_err(|e| e.to_string())
}

async fn load_scaffold(dir: Option<&Path>) -> anyhow::Result<Arc<Scaffold>> {
    match dir {
        Some(dir) => {
            let scaffold = load_scaffold_from_dir(dir)
                .await
                .with_context(|| format!("Failed to load scaffold from {}", dir.display()))?;
            Ok(Arc::new(scaffold))
        }
        None => Ok(default_scaffold()?),
    }
}

fn print_summary(result: &GenerationResult) {
    println!(
        "Generated {} into {} ({} file(s), blueprint source: {})",
        result.blueprint.service_name,
        result.output_dir.display(),
        result.files.len(),
        result.source
    );
    if !result.warnings.is_empty() {
        println!("Warnings:");
        for warning in &result.warnings {
            println!("  - {warning}");
        }
    }
}

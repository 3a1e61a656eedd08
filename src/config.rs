//! Builder configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment overrides. CLI flags are applied last by the binary.
//!
//! ```toml
//! [crawl]
//! max_pages = 50
//! deny_patterns = ["https://docs\\.example\\.com/blog/.*"]
//!
//! [planner]
//! model = "gpt-4o"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::ingestion::{CrawlOptions, fetcher::default_user_agent};
use crate::planning::{
    DEFAULT_CHUNK_CHARS, DEFAULT_PLANNER_CONCURRENCY, LlmPlanner, OpenAiCompletionClient,
    OpenAiConfig, PlannerError,
    openai::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL},
};
use crate::scaffold::RenderOptions;

/// Directory name below the platform config dir
pub const CONFIG_DIR_NAME: &str = "mcp-builder";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const MODEL_ENV: &str = "MCP_BUILDER_MODEL";
pub const BASE_URL_ENV: &str = "MCP_BUILDER_BASE_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub crawl: CrawlConfig,
    pub planner: PlannerConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub max_pages: usize,
    pub max_depth: usize,
    pub delay_ms: u64,
    pub timeout_secs: u64,
    pub concurrency: usize,
    pub user_agent: String,
    pub respect_robots: bool,
    pub allow_patterns: Vec<String>,
    pub deny_patterns: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 20,
            max_depth: 3,
            delay_ms: 250,
            timeout_secs: 10,
            concurrency: 4,
            user_agent: default_user_agent().to_string(),
            respect_robots: true,
            allow_patterns: Vec::new(),
            deny_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub model: String,
    pub base_url: String,
    pub chunk_chars: usize,
    pub concurrency: usize,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chunk_chars: DEFAULT_CHUNK_CHARS,
            concurrency: DEFAULT_PLANNER_CONCURRENCY,
            timeout_secs: 60,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub overwrite: bool,
}

impl BuilderConfig {
    /// Load from `explicit`, else from the user config file when one exists,
    /// then apply environment overrides read through `lookup`
    pub fn load(
        explicit: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|p| p.is_file()),
        };

        let mut config = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                debug!("No configuration file; using defaults");
                Self::default()
            }
        };
        config.apply_env(lookup);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(model) = non_empty(MODEL_ENV) {
            self.planner.model = model;
        }
        if let Some(base_url) = non_empty(BASE_URL_ENV) {
            self.planner.base_url = base_url;
        }
    }

    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            max_pages: self.crawl.max_pages,
            max_depth: self.crawl.max_depth,
            delay: Duration::from_millis(self.crawl.delay_ms),
            timeout: Duration::from_secs(self.crawl.timeout_secs),
            concurrency: self.crawl.concurrency,
            respect_robots: self.crawl.respect_robots,
            user_agent: self.crawl.user_agent.clone(),
            allow_patterns: self.crawl.allow_patterns.clone(),
            deny_patterns: self.crawl.deny_patterns.clone(),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            overwrite: self.render.overwrite,
        }
    }

    /// Client settings with the API key read through `lookup`.
    /// `NotConfigured` when the key is absent.
    pub fn openai_config(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<OpenAiConfig, PlannerError> {
        Ok(OpenAiConfig::from_lookup(&self.planner.api_key_env, lookup)?
            .with_base_url(self.planner.base_url.clone())
            .with_model(self.planner.model.clone())
            .with_timeout(Duration::from_secs(self.planner.timeout_secs)))
    }

    pub fn llm_planner(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<LlmPlanner, PlannerError> {
        let client = OpenAiCompletionClient::new(self.openai_config(lookup)?)?;
        Ok(LlmPlanner::new(Arc::new(client))
            .with_chunk_chars(self.planner.chunk_chars)
            .with_concurrency(self.planner.concurrency))
    }
}

/// `<config dir>/mcp-builder/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

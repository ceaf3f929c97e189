//! Pipeline configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment
//! variables → defaults. The config is constructed once at process start
//! and passed by reference into the orchestrator and its collaborators;
//! nothing inside the loop or orchestrator reads the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ResearchError, Result};

/// Default maximum concurrent researcher invocations.
const DEFAULT_MAX_CONCURRENCY: usize = 8;
/// Default number of subtopics the splitter asks for.
const DEFAULT_NUM_SUBTOPICS: usize = 3;
/// Default maximum results per web search call.
const DEFAULT_NUM_SOURCES: usize = 10;
/// Default maximum tool-calling loop iterations per researcher.
const DEFAULT_MAX_TOOL_ITERATIONS: usize = 5;
/// Default maximum research passes (initial pass plus optimizer retries).
const DEFAULT_MAX_RESEARCH_PASSES: usize = 3;
/// Default researcher max tokens.
const DEFAULT_RESEARCHER_MAX_TOKENS: u32 = 4096;
/// Default synthesizer max tokens.
const DEFAULT_SYNTHESIZER_MAX_TOKENS: u32 = 4096;
/// Default max tokens for control roles (guard, splitter, triage, optimizer).
const DEFAULT_CONTROL_MAX_TOKENS: u32 = 1024;
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the research pipeline.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the LLM provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// API key for the search provider.
    pub search_api_key: String,
    /// Model for researcher agents.
    pub researcher_model: String,
    /// Model for the synthesizer agent.
    pub synthesizer_model: String,
    /// Model for control roles: guard, splitter, triage, optimizer.
    pub control_model: String,
    /// Maximum concurrent researcher invocations.
    pub max_concurrency: usize,
    /// Number of subtopics the splitter asks for.
    pub num_subtopics: usize,
    /// Maximum results per web search call.
    pub num_sources: usize,
    /// Maximum tool-calling loop iterations per researcher.
    pub max_tool_iterations: usize,
    /// Maximum research passes before synthesis proceeds regardless of
    /// the optimizer's verdict. Bounds the optimize/retry edge.
    pub max_research_passes: usize,
    /// Maximum tokens for researcher responses.
    pub researcher_max_tokens: u32,
    /// Maximum tokens for synthesizer responses.
    pub synthesizer_max_tokens: u32,
    /// Maximum tokens for control role responses.
    pub control_max_tokens: u32,
    /// Request timeout for search calls.
    pub timeout: Duration,
    /// Directory containing prompt template files.
    ///
    /// When set, system prompts load from markdown files in this
    /// directory, falling back to compiled-in defaults for any missing
    /// files.
    pub prompt_dir: Option<PathBuf>,
}

impl ResearchConfig {
    /// Creates a new builder for `ResearchConfig`.
    #[must_use]
    pub fn builder() -> ResearchConfigBuilder {
        ResearchConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::ApiKeyMissing`] or
    /// [`ResearchError::SearchKeyMissing`] if a required key is absent.
    pub fn from_env() -> Result<Self> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`ResearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct ResearchConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    search_api_key: Option<String>,
    researcher_model: Option<String>,
    synthesizer_model: Option<String>,
    control_model: Option<String>,
    max_concurrency: Option<usize>,
    num_subtopics: Option<usize>,
    num_sources: Option<usize>,
    max_tool_iterations: Option<usize>,
    max_research_passes: Option<usize>,
    researcher_max_tokens: Option<u32>,
    synthesizer_max_tokens: Option<u32>,
    control_max_tokens: Option<u32>,
    timeout: Option<Duration>,
    prompt_dir: Option<PathBuf>,
}

impl ResearchConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("SCOUT_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("SCOUT_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL")
                .or_else(|_| std::env::var("SCOUT_BASE_URL"))
                .ok();
        }
        if self.search_api_key.is_none() {
            self.search_api_key = std::env::var("TAVILY_API_KEY").ok();
        }
        if self.researcher_model.is_none() {
            self.researcher_model = std::env::var("SCOUT_RESEARCHER_MODEL").ok();
        }
        if self.synthesizer_model.is_none() {
            self.synthesizer_model = std::env::var("SCOUT_SYNTHESIZER_MODEL").ok();
        }
        if self.control_model.is_none() {
            self.control_model = std::env::var("SCOUT_CONTROL_MODEL").ok();
        }
        if self.num_subtopics.is_none() {
            self.num_subtopics = std::env::var("SCOUT_NUM_SUBTOPICS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.num_sources.is_none() {
            self.num_sources = std::env::var("SCOUT_NUM_SOURCES")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.max_research_passes.is_none() {
            self.max_research_passes = std::env::var("SCOUT_MAX_PASSES")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("SCOUT_PROMPT_DIR").ok().map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the LLM API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the search API key.
    #[must_use]
    pub fn search_api_key(mut self, key: impl Into<String>) -> Self {
        self.search_api_key = Some(key.into());
        self
    }

    /// Sets the researcher model.
    #[must_use]
    pub fn researcher_model(mut self, model: impl Into<String>) -> Self {
        self.researcher_model = Some(model.into());
        self
    }

    /// Sets the synthesizer model.
    #[must_use]
    pub fn synthesizer_model(mut self, model: impl Into<String>) -> Self {
        self.synthesizer_model = Some(model.into());
        self
    }

    /// Sets the control-role model.
    #[must_use]
    pub fn control_model(mut self, model: impl Into<String>) -> Self {
        self.control_model = Some(model.into());
        self
    }

    /// Sets the maximum concurrency.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    /// Sets the number of subtopics.
    #[must_use]
    pub const fn num_subtopics(mut self, n: usize) -> Self {
        self.num_subtopics = Some(n);
        self
    }

    /// Sets the maximum results per search call.
    #[must_use]
    pub const fn num_sources(mut self, n: usize) -> Self {
        self.num_sources = Some(n);
        self
    }

    /// Sets the maximum tool-calling loop iterations.
    #[must_use]
    pub const fn max_tool_iterations(mut self, n: usize) -> Self {
        self.max_tool_iterations = Some(n);
        self
    }

    /// Sets the maximum research passes.
    #[must_use]
    pub const fn max_research_passes(mut self, n: usize) -> Self {
        self.max_research_passes = Some(n);
        self
    }

    /// Sets the researcher max tokens.
    #[must_use]
    pub const fn researcher_max_tokens(mut self, n: u32) -> Self {
        self.researcher_max_tokens = Some(n);
        self
    }

    /// Sets the synthesizer max tokens.
    #[must_use]
    pub const fn synthesizer_max_tokens(mut self, n: u32) -> Self {
        self.synthesizer_max_tokens = Some(n);
        self
    }

    /// Sets the control-role max tokens.
    #[must_use]
    pub const fn control_max_tokens(mut self, n: u32) -> Self {
        self.control_max_tokens = Some(n);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`ResearchConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::ApiKeyMissing`] if no LLM API key was set,
    /// or [`ResearchError::SearchKeyMissing`] if no search key was set.
    pub fn build(self) -> Result<ResearchConfig> {
        let api_key = self.api_key.ok_or(ResearchError::ApiKeyMissing)?;
        let search_api_key = self.search_api_key.ok_or(ResearchError::SearchKeyMissing)?;

        Ok(ResearchConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            search_api_key,
            researcher_model: self
                .researcher_model
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            synthesizer_model: self
                .synthesizer_model
                .unwrap_or_else(|| "gpt-4o".to_string()),
            control_model: self
                .control_model
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            max_concurrency: self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY),
            num_subtopics: self.num_subtopics.unwrap_or(DEFAULT_NUM_SUBTOPICS).max(1),
            num_sources: self.num_sources.unwrap_or(DEFAULT_NUM_SOURCES).max(1),
            max_tool_iterations: self
                .max_tool_iterations
                .unwrap_or(DEFAULT_MAX_TOOL_ITERATIONS)
                .max(1),
            max_research_passes: self
                .max_research_passes
                .unwrap_or(DEFAULT_MAX_RESEARCH_PASSES)
                .max(1),
            researcher_max_tokens: self
                .researcher_max_tokens
                .unwrap_or(DEFAULT_RESEARCHER_MAX_TOKENS),
            synthesizer_max_tokens: self
                .synthesizer_max_tokens
                .unwrap_or(DEFAULT_SYNTHESIZER_MAX_TOKENS),
            control_max_tokens: self.control_max_tokens.unwrap_or(DEFAULT_CONTROL_MAX_TOKENS),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            prompt_dir: self.prompt_dir,
        })
    }
}

//! Orchestrator for the research pipeline.
//!
//! Coordinates the full run: guard validation, topic splitting,
//! concurrent subtopic research, aggregation, triage with an optional
//! optimizer retry loop, and final synthesis.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::config::ResearchConfig;
use super::guard::GuardAgent;
use super::prompt::{
    PromptSet, build_guard_prompt, build_optimizer_prompt, build_research_document,
    build_splitter_prompt, build_synthesizer_prompt, build_triage_prompt,
};
use super::provider::LlmProvider;
use super::researcher::{ResearcherAgent, SubtopicResearch};
use super::splitter::SplitterAgent;
use super::synthesizer::SynthesizerAgent;
use super::triage::{OptimizerAgent, TriageAgent, TriageRoute};
use crate::core::{ResearchReport, SourcePool};
use crate::error::{ResearchError, Result};
use crate::search::SearchProvider;

/// Maximum byte length of a research topic.
const MAX_TOPIC_LEN: usize = 10_000;

/// Pipeline stage, used for progress logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Validating the topic with the guard agent.
    Validating,
    /// Splitting the topic into subtopics.
    Splitting,
    /// Researching subtopics concurrently.
    Researching,
    /// Assembling the research document.
    Aggregating,
    /// Routing the document via the triage agent.
    Triage,
    /// Deciding on another pass via the optimizer agent.
    Optimizing,
    /// Producing the final report.
    Synthesizing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::Splitting => "splitting",
            Self::Researching => "researching",
            Self::Aggregating => "aggregating",
            Self::Triage => "triage",
            Self::Optimizing => "optimizing",
            Self::Synthesizing => "synthesizing",
        };
        f.write_str(name)
    }
}

/// Per-run overrides for pipeline parameters.
///
/// Each parameter is resolved in priority order: **CLI flag → Config →
/// Default**. `style` and `tone` have no config counterpart; they only
/// apply when set here.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Override the number of subtopics to split into.
    pub num_subtopics: Option<usize>,
    /// Override how many sources each researcher aims to consult.
    pub num_sources: Option<usize>,
    /// Writing style directive for the synthesizer (e.g. "executive brief").
    pub style: Option<String>,
    /// Tone directive for the synthesizer (e.g. "neutral").
    pub tone: Option<String>,
}

/// Final outcome of a pipeline run.
#[derive(Debug)]
pub enum ResearchOutcome {
    /// The pipeline ran to completion.
    Complete(Box<RunResult>),
    /// The guard rejected the topic before any research happened.
    Rejected {
        /// Why the topic was rejected.
        reason: String,
    },
}

/// Result of a completed pipeline run.
#[derive(Debug)]
pub struct RunResult {
    /// The synthesized report.
    pub report: ResearchReport,
    /// Subtopics the topic was split into.
    pub subtopics: Vec<String>,
    /// Unique sources collected across all passes.
    pub sources_collected: usize,
    /// Research passes that actually ran.
    pub research_passes: usize,
    /// Researcher invocations that hit the tool loop ceiling.
    pub truncated_researchers: usize,
    /// Non-fatal problems encountered during the run.
    pub warnings: Vec<String>,
    /// Total tokens across every model call.
    pub total_tokens: u32,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// What to do after the triage/optimizer edge of a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PassVerdict {
    /// Proceed to synthesis.
    Synthesize,
    /// Run another research pass.
    AnotherPass { reason: Option<String> },
    /// More research was requested but the pass cap is reached.
    SynthesizeAtCap { reason: Option<String> },
}

/// Resolves the optimizer's decision against the pass budget.
///
/// `passes_done` counts completed research passes including the one
/// that produced the document under review.
fn resolve_retry(
    needs_more_research: bool,
    reason: Option<String>,
    passes_done: usize,
    max_passes: usize,
) -> PassVerdict {
    if !needs_more_research {
        return PassVerdict::Synthesize;
    }
    if passes_done < max_passes {
        PassVerdict::AnotherPass { reason }
    } else {
        PassVerdict::SynthesizeAtCap { reason }
    }
}

/// Orchestrates the research pipeline.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    search: Arc<dyn SearchProvider>,
    config: ResearchConfig,
    prompts: PromptSet,
}

impl Orchestrator {
    /// Creates a new orchestrator with the given providers and configuration.
    ///
    /// Loads prompt templates from the directory specified in
    /// [`ResearchConfig::prompt_dir`], falling back to compiled-in defaults.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        config: ResearchConfig,
    ) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self {
            provider,
            search,
            config,
            prompts,
        }
    }

    /// Executes the full research pipeline for a topic.
    ///
    /// # Steps
    ///
    /// 1. Validate the topic via the guard agent
    /// 2. Split the topic into subtopics
    /// 3. Fan out researcher agents concurrently, one per subtopic
    /// 4. Aggregate findings into a research document
    /// 5. Triage the document; optionally loop back for more research
    ///    (bounded by the configured pass cap)
    /// 6. Synthesize the final report
    ///
    /// An empty topic or a tripped guard returns
    /// [`ResearchOutcome::Rejected`] without running any research.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError`] on provider, parsing, or orchestration
    /// failures. Individual researcher failures are tolerated as long
    /// as at least one subtopic succeeds.
    #[allow(clippy::too_many_lines)]
    pub async fn run_research(&self, topic: &str, options: &RunOptions) -> Result<ResearchOutcome> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Ok(ResearchOutcome::Rejected {
                reason: "Topic cannot be empty".to_string(),
            });
        }
        if topic.len() > MAX_TOPIC_LEN {
            return Ok(ResearchOutcome::Rejected {
                reason: format!(
                    "Topic exceeds maximum length ({} bytes, max {MAX_TOPIC_LEN})",
                    topic.len()
                ),
            });
        }

        let start = Instant::now();
        let mut total_tokens: u32 = 0;
        let mut warnings: Vec<String> = Vec::new();

        // Step 1: Guard validation
        info!(stage = %PipelineStage::Validating, topic, "starting research run");
        let guard = GuardAgent::new(&self.config, self.prompts.guard.clone());
        let (verdict, response) = guard
            .execute_and_parse(&*self.provider, &build_guard_prompt(topic))
            .await?;
        total_tokens = total_tokens.saturating_add(response.usage.total_tokens);

        if !verdict.is_valid {
            let reason = verdict
                .reason
                .unwrap_or_else(|| "Topic rejected by input validation".to_string());
            info!(%reason, "guard rejected topic");
            return Ok(ResearchOutcome::Rejected { reason });
        }

        // Step 2: Topic splitting
        let num_subtopics = options
            .num_subtopics
            .unwrap_or(self.config.num_subtopics)
            .max(1);
        info!(stage = %PipelineStage::Splitting, num_subtopics, "splitting topic");
        let splitter = SplitterAgent::new(&self.config, self.prompts.splitter.clone());
        let (subtopics, response) = splitter
            .execute_and_parse(
                &*self.provider,
                &build_splitter_prompt(topic, num_subtopics),
                num_subtopics,
            )
            .await?;
        total_tokens = total_tokens.saturating_add(response.usage.total_tokens);
        info!(?subtopics, "subtopics identified");

        // Steps 3-5: Research passes with the triage/optimizer loop
        let num_sources = options.num_sources.unwrap_or(self.config.num_sources);
        let max_passes = self.config.max_research_passes.max(1);
        let mut pool = SourcePool::new();
        let mut truncated_researchers: usize = 0;
        let mut passes_done: usize = 0;
        let mut document = String::new();

        loop {
            passes_done += 1;
            info!(
                stage = %PipelineStage::Researching,
                pass = passes_done,
                max_passes,
                "researching subtopics"
            );

            let sections = self
                .fan_out(&subtopics, num_sources, &mut warnings)
                .await?;
            for section in &sections {
                total_tokens = total_tokens.saturating_add(section.usage.total_tokens);
                if section.truncated {
                    truncated_researchers += 1;
                }
                pool.extend(section.sources.iter().cloned());
            }

            info!(
                stage = %PipelineStage::Aggregating,
                sources = pool.len(),
                "assembling research document"
            );
            document = build_research_document(topic, &sections);

            info!(stage = %PipelineStage::Triage, "routing research document");
            let triage = TriageAgent::new(&self.config, self.prompts.triage.clone());
            let (route, response) = triage
                .execute_and_parse(&*self.provider, &build_triage_prompt(&document))
                .await?;
            total_tokens = total_tokens.saturating_add(response.usage.total_tokens);

            if route == TriageRoute::Synthesize {
                info!("triage routed directly to synthesis");
                break;
            }

            info!(stage = %PipelineStage::Optimizing, "reviewing research coverage");
            let optimizer = OptimizerAgent::new(&self.config, self.prompts.optimizer.clone());
            let (decision, response) = optimizer
                .execute_and_parse(&*self.provider, &build_optimizer_prompt(&document))
                .await?;
            total_tokens = total_tokens.saturating_add(response.usage.total_tokens);

            match resolve_retry(
                decision.needs_more_research,
                decision.reason,
                passes_done,
                max_passes,
            ) {
                PassVerdict::Synthesize => {
                    info!("optimizer found research sufficient");
                    break;
                }
                PassVerdict::AnotherPass { reason } => {
                    info!(?reason, pass = passes_done, "optimizer requested another pass");
                }
                PassVerdict::SynthesizeAtCap { reason } => {
                    let warning = format!(
                        "Research pass cap reached ({max_passes}); synthesizing despite \
                         optimizer request{}",
                        reason.map_or_else(String::new, |r| format!(": {r}"))
                    );
                    warn!(%warning);
                    warnings.push(warning);
                    break;
                }
            }
        }

        // Step 6: Synthesis
        info!(stage = %PipelineStage::Synthesizing, "synthesizing final report");
        let collected = pool.into_records();
        let synthesizer = SynthesizerAgent::new(&self.config, self.prompts.synthesizer.clone());
        let user_msg = build_synthesizer_prompt(
            topic,
            &document,
            &collected,
            options.style.as_deref(),
            options.tone.as_deref(),
        );
        let (mut report, response) = synthesizer
            .execute_and_parse(&*self.provider, &user_msg, topic, &collected)
            .await?;
        total_tokens = total_tokens.saturating_add(response.usage.total_tokens);

        report.metadata.generated_at = Some(chrono::Utc::now());
        report.metadata.model = Some(self.config.synthesizer_model.clone());
        report.metadata.research_passes = Some(passes_done);
        report.metadata.total_tokens = Some(total_tokens);
        report.metadata.truncated_researchers = Some(truncated_researchers);

        Ok(ResearchOutcome::Complete(Box::new(RunResult {
            report,
            subtopics,
            sources_collected: collected.len(),
            research_passes: passes_done,
            truncated_researchers,
            warnings,
            total_tokens,
            elapsed: start.elapsed(),
        })))
    }

    /// Fans out researcher agents concurrently, one per subtopic.
    ///
    /// Results come back in subtopic order regardless of completion
    /// order. A failed researcher becomes a warning; the pass errors
    /// only when every subtopic fails.
    async fn fan_out(
        &self,
        subtopics: &[String],
        num_sources: usize,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<SubtopicResearch>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut config = self.config.clone();
        config.num_sources = num_sources;
        let researcher_prompt = self.prompts.researcher.clone();

        let mut handles = Vec::with_capacity(subtopics.len());
        for subtopic in subtopics {
            let sem = Arc::clone(&semaphore);
            let provider = Arc::clone(&self.provider);
            let search = Arc::clone(&self.search);
            let cfg = config.clone();
            let prompt = researcher_prompt.clone();
            let label = subtopic.clone();
            let subtopic = subtopic.clone();

            let handle = tokio::spawn(async move {
                let _permit =
                    sem.acquire()
                        .await
                        .map_err(|e| ResearchError::Orchestration {
                            message: format!("Semaphore acquire failed: {e}"),
                        })?;
                let agent = ResearcherAgent::new(&cfg, prompt);
                agent.research(&*provider, search, &subtopic).await
            });
            handles.push((label, handle));
        }

        let mut sections = Vec::with_capacity(handles.len());
        for (subtopic, handle) in handles {
            match handle.await {
                Ok(Ok(section)) => sections.push(section),
                Ok(Err(e)) => {
                    let warning = format!("Researcher for '{subtopic}' failed: {e}");
                    warn!(%warning);
                    warnings.push(warning);
                }
                Err(e) => {
                    let warning = format!("Researcher task for '{subtopic}' panicked: {e}");
                    warn!(%warning);
                    warnings.push(warning);
                }
            }
        }

        if sections.is_empty() {
            return Err(ResearchError::Orchestration {
                message: "All researcher agents failed".to_string(),
            });
        }

        Ok(sections)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("search", &self.search.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

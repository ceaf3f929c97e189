//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::agent::client::create_provider;
use crate::agent::config::ResearchConfig;
use crate::agent::orchestrator::{Orchestrator, ResearchOutcome, RunOptions};
use crate::agent::prompt::PromptSet;
use crate::agent::provider::LlmProvider;
use crate::cli::output::{OutputFormat, format_rejection, format_run_result, mask_key};
use crate::cli::parser::{Cli, Commands};
use crate::error::Result;
use crate::export::write_report;
use crate::search::TavilyProvider;

/// Parameters for the run command.
#[derive(Debug, Clone, Default)]
pub struct RunCommandParams<'a> {
    /// The topic to research.
    pub topic: &'a str,
    /// Number of subtopics to split into.
    pub subtopics: Option<usize>,
    /// Target sources per researcher.
    pub sources: Option<usize>,
    /// Maximum research passes.
    pub max_passes: Option<usize>,
    /// Maximum concurrent researchers.
    pub concurrency: Option<usize>,
    /// Model for researcher agents.
    pub researcher_model: Option<&'a str>,
    /// Model for the synthesizer agent.
    pub synthesizer_model: Option<&'a str>,
    /// Writing style directive.
    pub style: Option<&'a str>,
    /// Tone directive.
    pub tone: Option<&'a str>,
    /// Directory containing prompt template files.
    pub prompt_dir: Option<&'a Path>,
    /// Optional output file path.
    pub out: Option<&'a Path>,
    /// Show detailed diagnostics.
    pub verbose: bool,
}

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub async fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Run {
            topic,
            subtopics,
            sources,
            max_passes,
            concurrency,
            researcher_model,
            synthesizer_model,
            style,
            tone,
            prompt_dir,
            out,
        } => {
            let params = RunCommandParams {
                topic,
                subtopics: *subtopics,
                sources: *sources,
                max_passes: *max_passes,
                concurrency: *concurrency,
                researcher_model: researcher_model.as_deref(),
                synthesizer_model: synthesizer_model.as_deref(),
                style: style.as_deref(),
                tone: tone.as_deref(),
                prompt_dir: prompt_dir.as_deref(),
                out: out.as_deref(),
                verbose: cli.verbose,
            };
            cmd_run(&params, format).await
        }
        Commands::Check => cmd_check(format),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir, format),
    }
}

/// Builds the pipeline configuration from CLI overrides and the environment.
fn build_config(params: &RunCommandParams<'_>) -> Result<ResearchConfig> {
    let mut builder = ResearchConfig::builder();
    if let Some(model) = params.researcher_model {
        builder = builder.researcher_model(model);
    }
    if let Some(model) = params.synthesizer_model {
        builder = builder.synthesizer_model(model);
    }
    if let Some(n) = params.max_passes {
        builder = builder.max_research_passes(n);
    }
    if let Some(n) = params.concurrency {
        builder = builder.max_concurrency(n);
    }
    if let Some(dir) = params.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    builder.from_env().build()
}

/// Runs the research pipeline and formats the outcome.
async fn cmd_run(params: &RunCommandParams<'_>, format: OutputFormat) -> Result<String> {
    let config = build_config(params)?;

    let provider: Arc<dyn LlmProvider> = Arc::from(create_provider(&config)?);
    let search = Arc::new(TavilyProvider::new(&config.search_api_key, config.timeout)?);

    let options = RunOptions {
        num_subtopics: params.subtopics,
        num_sources: params.sources,
        style: params.style.map(str::to_string),
        tone: params.tone.map(str::to_string),
    };

    let orchestrator = Orchestrator::new(provider, search, config);
    let outcome = orchestrator.run_research(params.topic, &options).await?;

    match outcome {
        ResearchOutcome::Rejected { reason } => Ok(format_rejection(&reason, format)),
        ResearchOutcome::Complete(result) => {
            if let Some(path) = params.out {
                write_report(&result.report, path)?;
                info!(path = %path.display(), "report written");
            }
            let mut output = format_run_result(&result, format, params.verbose);
            if format == OutputFormat::Text {
                if let Some(path) = params.out {
                    output.push_str(&format!("\nReport written to {}", path.display()));
                }
            }
            Ok(output)
        }
    }
}

/// Reports the resolved configuration without making API calls.
fn cmd_check(format: OutputFormat) -> Result<String> {
    let config = ResearchConfig::from_env()?;

    match format {
        OutputFormat::Text => Ok(format!(
            "Provider: {}\n\
             API key: {}\n\
             Search key: {}\n\
             Researcher model: {}\n\
             Synthesizer model: {}\n\
             Control model: {}\n\
             Subtopics: {} | Sources: {} | Max passes: {} | Concurrency: {}\n",
            config.provider,
            mask_key(&config.api_key),
            mask_key(&config.search_api_key),
            config.researcher_model,
            config.synthesizer_model,
            config.control_model,
            config.num_subtopics,
            config.num_sources,
            config.max_research_passes,
            config.max_concurrency,
        )),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "provider": config.provider,
                "api_key": mask_key(&config.api_key),
                "search_key": mask_key(&config.search_api_key),
                "researcher_model": config.researcher_model,
                "synthesizer_model": config.synthesizer_model,
                "control_model": config.control_model,
                "num_subtopics": config.num_subtopics,
                "num_sources": config.num_sources,
                "max_research_passes": config.max_research_passes,
                "max_concurrency": config.max_concurrency,
            });
            Ok(format.to_json(&json))
        }
    }
}

/// Writes default prompt templates to disk.
fn cmd_init_prompts(dir: &Path, format: OutputFormat) -> Result<String> {
    let written = PromptSet::write_defaults(dir)?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    dir.display()
                ))
            } else {
                let mut output = format!(
                    "Wrote {} prompt template(s) to: {}\n",
                    written.len(),
                    dir.display()
                );
                for path in &written {
                    output.push_str(&format!(
                        "  {}\n",
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown")
                    ));
                }
                output.push_str("\nEdit these files to customize agent system prompts.\n");
                Ok(output)
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": dir.to_string_lossy(),
                "written": written
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect::<Vec<_>>(),
                "count": written.len(),
            });
            Ok(format.to_json(&json))
        }
    }
}

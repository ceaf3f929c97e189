//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scout: multi-agent web research from the command line.
///
/// Splits a research topic into subtopics, researches them
/// concurrently via web search, and synthesizes a structured report.
#[derive(Parser, Debug)]
#[command(name = "scout-rs")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the research pipeline on a topic.
    ///
    /// Validates the topic, splits it into subtopics, researches each
    /// via web search concurrently, and synthesizes a report with a
    /// TL;DR, key findings, caveats, and top sources. Requires an
    /// OpenAI-compatible API key and a Tavily search key.
    #[command(after_help = r#"Examples:
  scout-rs run "Should I adopt Rust for backend services?"
  scout-rs run "quantum computing startups" --subtopics 5
  scout-rs run "EV battery supply chains" --sources 15 --max-passes 2
  scout-rs run "LLM eval tooling" --style "executive brief" --tone neutral
  scout-rs run "rust web frameworks" -o report.md
  scout-rs --format json run "WASM on the server" | jq '.report.tldr'
  OPENAI_API_KEY=sk-... TAVILY_API_KEY=tvly-... scout-rs run "topic"
"#)]
    Run {
        /// The topic to research.
        topic: String,

        /// Number of subtopics to split the topic into.
        #[arg(long)]
        subtopics: Option<usize>,

        /// Target number of sources per researcher.
        #[arg(long)]
        sources: Option<usize>,

        /// Maximum research passes before forcing synthesis.
        #[arg(long)]
        max_passes: Option<usize>,

        /// Maximum concurrent researcher agents.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Model for researcher agents.
        #[arg(long)]
        researcher_model: Option<String>,

        /// Model for the synthesizer agent.
        #[arg(long)]
        synthesizer_model: Option<String>,

        /// Writing style directive for the report (e.g. "executive brief").
        #[arg(long)]
        style: Option<String>,

        /// Tone directive for the report (e.g. "neutral", "opinionated").
        #[arg(long)]
        tone: Option<String>,

        /// Directory containing prompt template files.
        #[arg(long)]
        prompt_dir: Option<PathBuf>,

        /// Write the report to a file (.json writes JSON, otherwise markdown).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Check configuration and connectivity prerequisites.
    ///
    /// Verifies that API keys are present and reports the resolved
    /// models and limits without making any API calls.
    Check,

    /// Write default prompt templates to disk for customization.
    ///
    /// Creates markdown template files so agent system prompts can be
    /// customized without recompiling.
    #[command(name = "init-prompts")]
    #[command(after_help = r#"Examples:
  scout-rs init-prompts --dir ./prompts
  SCOUT_PROMPT_DIR=./prompts scout-rs run "topic"
"#)]
    InitPrompts {
        /// Target directory for prompt templates.
        #[arg(long)]
        dir: PathBuf,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_parses_overrides() {
        let cli = Cli::parse_from([
            "scout-rs",
            "run",
            "rust web frameworks",
            "--subtopics",
            "5",
            "--sources",
            "12",
            "--style",
            "executive brief",
        ]);
        match cli.command {
            Commands::Run {
                topic,
                subtopics,
                sources,
                style,
                ..
            } => {
                assert_eq!(topic, "rust web frameworks");
                assert_eq!(subtopics, Some(5));
                assert_eq!(sources, Some(12));
                assert_eq!(style.as_deref(), Some("executive brief"));
            }
            Commands::Check | Commands::InitPrompts { .. } => {
                panic!("expected run command")
            }
        }
    }
}

//! Agent pipeline for scout-rs.
//!
//! Provides an LLM-powered research workflow that splits a topic,
//! fans researchers out across subtopics, and synthesizes a structured
//! report. Uses a pluggable provider abstraction backed by
//! OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! Topic → Orchestrator
//!   ├── GuardAgent (validates the topic, may reject the run)
//!   ├── SplitterAgent (topic → N subtopics)
//!   ├── Fan-out → N concurrent ResearcherAgents
//!   │   └── Each runs a web_search tool loop → SubtopicResearch
//!   ├── Aggregate findings into a research document
//!   ├── TriageAgent → synthesize | optimize
//!   │   └── OptimizerAgent → maybe another research pass (bounded)
//!   └── SynthesizerAgent → final ResearchReport
//! ```

pub mod agentic_loop;
pub mod client;
pub mod config;
pub mod executor;
pub mod guard;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod researcher;
pub mod splitter;
pub mod synthesizer;
pub mod tool;
pub mod traits;
pub mod triage;

// Re-export key types
pub use agentic_loop::{LoopOutcome, agentic_loop};
pub use config::ResearchConfig;
pub use guard::{GuardAgent, GuardVerdict};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use orchestrator::{Orchestrator, ResearchOutcome, RunOptions, RunResult};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use researcher::{ResearcherAgent, SubtopicResearch};
pub use splitter::SplitterAgent;
pub use synthesizer::SynthesizerAgent;
pub use tool::{ToolCall, ToolDefinition, ToolResult, ToolSet};
pub use traits::{Agent, execute_with_tools};
pub use triage::{OptimizationDecision, OptimizerAgent, TriageAgent, TriageRoute};

/// Strips markdown code fences from a model response before JSON parsing.
///
/// Models in JSON mode occasionally still wrap output in ```` ```json ````
/// blocks; parsing should tolerate that.
pub(crate) fn strip_json_delimiters(content: &str) -> &str {
    let trimmed = content.trim();
    if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::strip_json_delimiters;

    #[test]
    fn test_strip_json_delimiters_plain() {
        assert_eq!(strip_json_delimiters(r#"  {"a": 1}  "#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_strip_json_delimiters_fenced() {
        assert_eq!(
            strip_json_delimiters("```json\n{\"a\": 1}\n```"),
            r#"{"a": 1}"#
        );
        assert_eq!(strip_json_delimiters("```\n{\"a\": 1}\n```"), r#"{"a": 1}"#);
    }
}

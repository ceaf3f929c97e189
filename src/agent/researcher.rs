//! Researcher agent.
//!
//! Investigates a single subtopic through the web search tool and
//! writes up its findings. The orchestrator fans out one researcher
//! per subtopic concurrently; each invocation owns its own tool
//! executor so collected sources stay isolated until the join.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::config::ResearchConfig;
use super::executor::ToolExecutor;
use super::message::TokenUsage;
use super::prompt::build_researcher_prompt;
use super::provider::LlmProvider;
use super::tool::{ToolDefinition, ToolSet};
use super::traits::{Agent, execute_with_tools};
use crate::core::SourceRecord;
use crate::error::Result;
use crate::search::SearchProvider;

/// Findings produced by one researcher for one subtopic.
#[derive(Debug, Clone)]
pub struct SubtopicResearch {
    /// The subtopic that was investigated.
    pub subtopic: String,
    /// Prose findings written by the model.
    pub findings: String,
    /// Sources consulted during research, deduplicated by URL.
    pub sources: Vec<SourceRecord>,
    /// True when the tool loop hit its iteration ceiling before the
    /// model wrote a final answer.
    pub truncated: bool,
    /// Token usage across all model calls in this invocation.
    pub usage: TokenUsage,
}

/// Agent that researches one subtopic via web search.
pub struct ResearcherAgent {
    model: String,
    max_tokens: u32,
    max_tool_iterations: usize,
    num_sources: usize,
    system_prompt: String,
}

impl ResearcherAgent {
    /// Creates a new researcher agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &ResearchConfig, system_prompt: String) -> Self {
        Self {
            model: config.researcher_model.clone(),
            max_tokens: config.researcher_max_tokens,
            max_tool_iterations: config.max_tool_iterations,
            num_sources: config.num_sources,
            system_prompt,
        }
    }

    /// Researches a subtopic end to end: runs the tool loop and
    /// collects findings plus every source the searches surfaced.
    ///
    /// A truncated loop is a degraded success; whatever findings and
    /// sources exist at the ceiling are returned with `truncated` set.
    ///
    /// # Errors
    ///
    /// Propagates provider transport errors. Search failures inside the
    /// loop do not propagate; the model sees them as error tool results.
    pub async fn research(
        &self,
        provider: &dyn LlmProvider,
        search: Arc<dyn SearchProvider>,
        subtopic: &str,
    ) -> Result<SubtopicResearch> {
        let mut executor = ToolExecutor::new(search, self.num_sources);
        let user_msg = build_researcher_prompt(subtopic, self.num_sources);

        let outcome = execute_with_tools(self, provider, &user_msg, &mut executor).await?;

        if outcome.truncated {
            warn!(subtopic, "researcher hit tool loop ceiling");
        }
        debug!(
            subtopic,
            sources = executor.sources().len(),
            iterations = outcome.iterations,
            "subtopic research complete"
        );

        Ok(SubtopicResearch {
            subtopic: subtopic.to_string(),
            findings: outcome.content,
            sources: executor.into_sources(),
            truncated: outcome.truncated,
            usage: outcome.usage,
        })
    }
}

#[async_trait]
impl Agent for ResearcherAgent {
    fn name(&self) -> &'static str {
        "researcher"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        ToolSet::researcher_tools().into_definitions()
    }

    fn max_tool_iterations(&self) -> usize {
        self.max_tool_iterations
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::executor::tests::{MockSearch, source};
    use crate::agent::message::{ChatRequest, ChatResponse};
    use crate::agent::tool::ToolCall;
    use crate::error::Result;

    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that searches once, then writes findings.
    struct SearchOnceProvider {
        call_count: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for SearchOnceProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse> {
            let count = self.call_count.fetch_add(1, Ordering::SeqCst);
            if count == 0 {
                Ok(ChatResponse {
                    content: String::new(),
                    usage: TokenUsage::default(),
                    tool_calls: vec![ToolCall {
                        id: "call_0".to_string(),
                        name: "web_search".to_string(),
                        arguments: r#"{"query":"rust async runtimes"}"#.to_string(),
                    }],
                    finish_reason: Some("tool_calls".to_string()),
                })
            } else {
                Ok(ChatResponse {
                    content: "Tokio dominates the ecosystem.".to_string(),
                    usage: TokenUsage::default(),
                    tool_calls: Vec::new(),
                    finish_reason: Some("stop".to_string()),
                })
            }
        }
    }

    fn test_config() -> ResearchConfig {
        ResearchConfig::builder()
            .api_key("test-key")
            .search_api_key("test-key")
            .build()
            .unwrap_or_else(|e| panic!("config build failed: {e}"))
    }

    #[tokio::test]
    async fn test_research_collects_findings_and_sources() {
        let agent = ResearcherAgent::new(&test_config(), "test prompt".to_string());
        let provider = SearchOnceProvider {
            call_count: AtomicUsize::new(0),
        };
        let search = Arc::new(MockSearch::with_results(vec![
            source("https://tokio.rs", 0.95),
            source("https://async.rs", 0.6),
        ]));

        let result = agent
            .research(&provider, search, "async runtimes")
            .await
            .unwrap_or_else(|e| panic!("research failed: {e}"));

        assert_eq!(result.subtopic, "async runtimes");
        assert_eq!(result.findings, "Tokio dominates the ecosystem.");
        assert_eq!(result.sources.len(), 2);
        assert!(!result.truncated);
    }
}

//! Topic splitter agent.
//!
//! Breaks the research topic into subtopics that the researcher agents
//! investigate in parallel.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::config::ResearchConfig;
use super::provider::LlmProvider;
use super::strip_json_delimiters;
use super::traits::{Agent, AgentResponse};
use crate::error::{ResearchError, Result};

/// Maximum byte length of a single subtopic string.
const MAX_SUBTOPIC_LEN: usize = 500;

#[derive(Debug, Deserialize)]
struct SubtopicList {
    subtopics: Vec<String>,
}

/// Agent that splits a research topic into subtopics.
pub struct SplitterAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl SplitterAgent {
    /// Creates a new splitter agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &ResearchConfig, system_prompt: String) -> Self {
        Self {
            model: config.control_model.clone(),
            max_tokens: config.control_max_tokens,
            system_prompt,
        }
    }

    /// Executes the agent and parses the subtopic list.
    ///
    /// `expected` is the count the prompt requested. A mismatched count
    /// is logged but accepted; the orchestrator runs whatever came back.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::ResponseParse`] if the response does not
    /// contain at least one subtopic. Propagates provider errors.
    pub async fn execute_and_parse(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
        expected: usize,
    ) -> Result<(Vec<String>, AgentResponse)> {
        let response = self.execute(provider, user_msg).await?;
        let subtopics = Self::parse_subtopics(&response.content)?;
        if subtopics.len() != expected {
            warn!(
                expected,
                actual = subtopics.len(),
                "splitter returned a different subtopic count than requested"
            );
        }
        Ok((subtopics, response))
    }

    /// Parses the agent's JSON response into a non-empty subtopic list.
    fn parse_subtopics(content: &str) -> Result<Vec<String>> {
        let json_str = strip_json_delimiters(content);

        let list: SubtopicList =
            serde_json::from_str(json_str).map_err(|e| ResearchError::ResponseParse {
                message: format!("invalid subtopic list: {e}"),
                content: content.to_string(),
            })?;

        let subtopics: Vec<String> = list
            .subtopics
            .into_iter()
            .map(|s| {
                let mut s = s.trim().to_string();
                if s.len() > MAX_SUBTOPIC_LEN {
                    // Walk back to a char boundary so multi-byte
                    // characters straddling the limit cannot panic.
                    let mut cut = MAX_SUBTOPIC_LEN;
                    while !s.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    s.truncate(cut);
                }
                s
            })
            .filter(|s| !s.is_empty())
            .collect();

        if subtopics.is_empty() {
            return Err(ResearchError::ResponseParse {
                message: "splitter returned no usable subtopics".to_string(),
                content: content.to_string(),
            });
        }

        Ok(subtopics)
    }
}

#[async_trait]
impl Agent for SplitterAgent {
    fn name(&self) -> &'static str {
        "splitter"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn json_mode(&self) -> bool {
        true
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subtopics() {
        let subtopics =
            SplitterAgent::parse_subtopics(r#"{"subtopics": ["alpha", "beta", "gamma"]}"#)
                .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(subtopics, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_parse_subtopics_code_block() {
        let subtopics =
            SplitterAgent::parse_subtopics("```json\n{\"subtopics\": [\"alpha\"]}\n```")
                .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(subtopics, vec!["alpha"]);
    }

    #[test]
    fn test_parse_subtopics_filters_blank_entries() {
        let subtopics =
            SplitterAgent::parse_subtopics(r#"{"subtopics": ["alpha", "  ", "beta"]}"#)
                .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(subtopics, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_parse_subtopics_truncates_long_entries() {
        let long = "x".repeat(MAX_SUBTOPIC_LEN + 50);
        let subtopics =
            SplitterAgent::parse_subtopics(&format!(r#"{{"subtopics": ["{long}"]}}"#))
                .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(subtopics[0].len(), MAX_SUBTOPIC_LEN);
    }

    #[test]
    fn test_parse_subtopics_truncates_at_char_boundary() {
        // A two-byte char straddling the length limit must not panic
        // and must be dropped whole.
        let straddling = format!("{}é and more", "x".repeat(MAX_SUBTOPIC_LEN - 1));
        let subtopics =
            SplitterAgent::parse_subtopics(&format!(r#"{{"subtopics": ["{straddling}"]}}"#))
                .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(subtopics[0].len(), MAX_SUBTOPIC_LEN - 1);
        assert!(subtopics[0].chars().all(|c| c == 'x'));
    }

    #[test]
    fn test_parse_subtopics_empty_is_error() {
        let result = SplitterAgent::parse_subtopics(r#"{"subtopics": []}"#);
        assert!(matches!(result, Err(ResearchError::ResponseParse { .. })));
    }

    #[test]
    fn test_parse_subtopics_invalid() {
        let result = SplitterAgent::parse_subtopics("not json");
        assert!(matches!(result, Err(ResearchError::ResponseParse { .. })));
    }
}

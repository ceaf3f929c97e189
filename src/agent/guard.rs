//! Input guard agent.
//!
//! Validates the research topic before any other work happens. A
//! tripped guard rejects the run without spending further model or
//! search calls.

use async_trait::async_trait;
use serde::Deserialize;

use super::config::ResearchConfig;
use super::provider::LlmProvider;
use super::strip_json_delimiters;
use super::traits::{Agent, AgentResponse};
use crate::error::{ResearchError, Result};

/// Verdict returned by the guard agent.
#[derive(Debug, Clone, Deserialize)]
pub struct GuardVerdict {
    /// Whether the topic is acceptable to research.
    pub is_valid: bool,
    /// Explanation when the topic is rejected.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Agent that validates the user's research topic.
pub struct GuardAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl GuardAgent {
    /// Creates a new guard agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &ResearchConfig, system_prompt: String) -> Self {
        Self {
            model: config.control_model.clone(),
            max_tokens: config.control_max_tokens,
            system_prompt,
        }
    }

    /// Executes the agent and parses the verdict from the JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::ResponseParse`] if the response does not
    /// match the verdict schema. Propagates provider errors.
    pub async fn execute_and_parse(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<(GuardVerdict, AgentResponse)> {
        let response = self.execute(provider, user_msg).await?;
        let verdict = Self::parse_verdict(&response.content)?;
        Ok((verdict, response))
    }

    /// Parses the agent's JSON response into a verdict.
    fn parse_verdict(content: &str) -> Result<GuardVerdict> {
        let json_str = strip_json_delimiters(content);
        serde_json::from_str(json_str).map_err(|e| ResearchError::ResponseParse {
            message: format!("invalid guard verdict: {e}"),
            content: content.to_string(),
        })
    }
}

#[async_trait]
impl Agent for GuardAgent {
    fn name(&self) -> &'static str {
        "guard"
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
    fn test_parse_verdict_valid() {
        let verdict = GuardAgent::parse_verdict(r#"{"is_valid": true, "reason": null}"#)
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(verdict.is_valid);
        assert!(verdict.reason.is_none());
    }

    #[test]
    fn test_parse_verdict_rejection_with_reason() {
        let verdict =
            GuardAgent::parse_verdict(r#"{"is_valid": false, "reason": "harmful request"}"#)
                .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(!verdict.is_valid);
        assert_eq!(verdict.reason.as_deref(), Some("harmful request"));
    }

    #[test]
    fn test_parse_verdict_code_block() {
        let verdict = GuardAgent::parse_verdict("```json\n{\"is_valid\": true}\n```")
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(verdict.is_valid);
    }

    #[test]
    fn test_parse_verdict_invalid() {
        let result = GuardAgent::parse_verdict("not json");
        assert!(matches!(
            result,
            Err(ResearchError::ResponseParse { .. })
        ));
    }
}

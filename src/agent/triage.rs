//! Triage and optimizer agents.
//!
//! The triage agent routes an aggregated research document either
//! straight to synthesis or through the optimizer. The optimizer then
//! decides whether another research pass is worth running. Together
//! they form the pipeline's only conditional branch.

use async_trait::async_trait;
use serde::Deserialize;

use super::config::ResearchConfig;
use super::provider::LlmProvider;
use super::strip_json_delimiters;
use super::traits::{Agent, AgentResponse};
use crate::error::{ResearchError, Result};

/// Route chosen by the triage agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageRoute {
    /// Research is solid; go straight to synthesis.
    Synthesize,
    /// Research needs review by the optimizer first.
    Optimize,
}

#[derive(Debug, Deserialize)]
struct TriageVerdict {
    route: TriageRoute,
}

/// Decision returned by the optimizer agent.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizationDecision {
    /// Whether another research pass should run.
    pub needs_more_research: bool,
    /// What is missing, when more research is requested.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Agent that routes the research document after aggregation.
pub struct TriageAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl TriageAgent {
    /// Creates a new triage agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &ResearchConfig, system_prompt: String) -> Self {
        Self {
            model: config.control_model.clone(),
            max_tokens: config.control_max_tokens,
            system_prompt,
        }
    }

    /// Executes the agent and parses the chosen route.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::ResponseParse`] when the response does
    /// not name a known route. Propagates provider errors.
    pub async fn execute_and_parse(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<(TriageRoute, AgentResponse)> {
        let response = self.execute(provider, user_msg).await?;
        let route = Self::parse_route(&response.content)?;
        Ok((route, response))
    }

    /// Parses the agent's JSON response into a route.
    fn parse_route(content: &str) -> Result<TriageRoute> {
        let json_str = strip_json_delimiters(content);
        let verdict: TriageVerdict =
            serde_json::from_str(json_str).map_err(|e| ResearchError::ResponseParse {
                message: format!("invalid triage route: {e}"),
                content: content.to_string(),
            })?;
        Ok(verdict.route)
    }
}

#[async_trait]
impl Agent for TriageAgent {
    fn name(&self) -> &'static str {
        "triage"
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

/// Agent that decides whether another research pass is warranted.
pub struct OptimizerAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl OptimizerAgent {
    /// Creates a new optimizer agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &ResearchConfig, system_prompt: String) -> Self {
        Self {
            model: config.control_model.clone(),
            max_tokens: config.control_max_tokens,
            system_prompt,
        }
    }

    /// Executes the agent and parses the decision.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::ResponseParse`] when the response does
    /// not match the decision schema. Propagates provider errors.
    pub async fn execute_and_parse(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<(OptimizationDecision, AgentResponse)> {
        let response = self.execute(provider, user_msg).await?;
        let decision = Self::parse_decision(&response.content)?;
        Ok((decision, response))
    }

    /// Parses the agent's JSON response into a decision.
    fn parse_decision(content: &str) -> Result<OptimizationDecision> {
        let json_str = strip_json_delimiters(content);
        serde_json::from_str(json_str).map_err(|e| ResearchError::ResponseParse {
            message: format!("invalid optimization decision: {e}"),
            content: content.to_string(),
        })
    }
}

#[async_trait]
impl Agent for OptimizerAgent {
    fn name(&self) -> &'static str {
        "optimizer"
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
    fn test_parse_route_synthesize() {
        let route = TriageAgent::parse_route(r#"{"route": "synthesize"}"#)
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(route, TriageRoute::Synthesize);
    }

    #[test]
    fn test_parse_route_optimize_code_block() {
        let route = TriageAgent::parse_route("```json\n{\"route\": \"optimize\"}\n```")
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(route, TriageRoute::Optimize);
    }

    #[test]
    fn test_parse_route_unknown_is_error() {
        let result = TriageAgent::parse_route(r#"{"route": "discard"}"#);
        assert!(matches!(result, Err(ResearchError::ResponseParse { .. })));
    }

    #[test]
    fn test_parse_decision_more_research() {
        let decision = OptimizerAgent::parse_decision(
            r#"{"needs_more_research": true, "reason": "no recent figures"}"#,
        )
        .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(decision.needs_more_research);
        assert_eq!(decision.reason.as_deref(), Some("no recent figures"));
    }

    #[test]
    fn test_parse_decision_sufficient() {
        let decision = OptimizerAgent::parse_decision(r#"{"needs_more_research": false}"#)
            .unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert!(!decision.needs_more_research);
        assert!(decision.reason.is_none());
    }

    #[test]
    fn test_parse_decision_invalid() {
        let result = OptimizerAgent::parse_decision("not json");
        assert!(matches!(result, Err(ResearchError::ResponseParse { .. })));
    }
}

//! Agent trait definition.
//!
//! All agents (guard, splitter, researcher, triage, optimizer,
//! synthesizer) implement this trait, which provides a uniform
//! interface for the orchestrator.

use async_trait::async_trait;

use super::agentic_loop::LoopOutcome;
use super::executor::ToolExecutor;
use super::message::{ChatRequest, ChatResponse, system_message, user_message};
use super::provider::LlmProvider;
use super::tool::ToolDefinition;
use crate::error::Result;

/// Response from an agent execution.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The agent's text output.
    pub content: String,
    /// Token usage for this call.
    pub usage: super::message::TokenUsage,
    /// Why the model stopped generating (e.g. `"stop"`, `"length"`).
    pub finish_reason: Option<String>,
}

/// Trait implemented by all agents in the pipeline.
///
/// Agents encapsulate a specific role (validation, planning, research,
/// routing, synthesis) with a fixed system prompt and model
/// configuration. The orchestrator calls [`Agent::execute`] to run the
/// agent against a provider.
///
/// Agents that support tool-calling override [`Agent::tools`] to return
/// their available tool definitions and use [`execute_with_tools`]
/// for agentic loop execution.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for logging and identification.
    fn name(&self) -> &'static str;

    /// Model identifier to use for this agent.
    fn model(&self) -> &str;

    /// System prompt that defines the agent's role and behavior.
    fn system_prompt(&self) -> &str;

    /// Whether to request JSON-formatted output.
    fn json_mode(&self) -> bool {
        false
    }

    /// Sampling temperature (0.0 = deterministic, higher = more creative).
    fn temperature(&self) -> f32 {
        0.0
    }

    /// Maximum tokens for the response.
    fn max_tokens(&self) -> u32 {
        2048
    }

    /// Tool definitions available to this agent.
    ///
    /// Returns an empty vec by default (no tools). Override to enable
    /// tool-calling for an agent.
    fn tools(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    /// Maximum tool-calling loop iterations before truncating.
    fn max_tool_iterations(&self) -> usize {
        5
    }

    /// Executes the agent with the given user message (no tools).
    ///
    /// Builds a [`ChatRequest`] from the agent's configuration and
    /// delegates to the provider.
    ///
    /// # Errors
    ///
    /// Propagates provider transport errors.
    async fn execute(&self, provider: &dyn LlmProvider, user_msg: &str) -> Result<AgentResponse> {
        let request = ChatRequest {
            model: self.model().to_string(),
            messages: vec![system_message(self.system_prompt()), user_message(user_msg)],
            temperature: Some(self.temperature()),
            max_tokens: Some(self.max_tokens()),
            json_mode: self.json_mode(),
            tools: Vec::new(),
        };

        let response: ChatResponse = provider.chat(&request).await?;

        Ok(AgentResponse {
            content: response.content,
            usage: response.usage,
            finish_reason: response.finish_reason,
        })
    }
}

/// Executes an agent with tool-calling support.
///
/// If the agent's [`Agent::tools`] returns definitions, builds a
/// tool-enabled request and runs the agentic loop against the given
/// executor. Otherwise falls through to a plain chat call.
///
/// # Errors
///
/// Propagates provider transport errors. Tool failures and hitting the
/// iteration ceiling do not error; the ceiling is reported through
/// [`LoopOutcome::truncated`].
pub async fn execute_with_tools(
    agent: &dyn Agent,
    provider: &dyn LlmProvider,
    user_msg: &str,
    executor: &mut ToolExecutor,
) -> Result<LoopOutcome> {
    let tool_defs = agent.tools();

    if tool_defs.is_empty() {
        let response = agent.execute(provider, user_msg).await?;
        return Ok(LoopOutcome {
            content: response.content,
            finish_reason: response.finish_reason,
            usage: response.usage,
            truncated: false,
            iterations: 1,
        });
    }

    let mut request = ChatRequest {
        model: agent.model().to_string(),
        messages: vec![
            system_message(agent.system_prompt()),
            user_message(user_msg),
        ],
        temperature: Some(agent.temperature()),
        max_tokens: Some(agent.max_tokens()),
        json_mode: agent.json_mode(),
        tools: tool_defs,
    };

    super::agentic_loop::agentic_loop(
        provider,
        &mut request,
        executor,
        agent.max_tool_iterations(),
    )
    .await
}

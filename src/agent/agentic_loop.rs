//! Agentic tool-calling loop.
//!
//! Drives the LLM / tool execution round-trip: sends a request to the
//! model, executes any tool calls in the response, appends results, and
//! repeats until the model produces a final text response or the
//! iteration ceiling is reached. Hitting the ceiling is a degraded
//! success, not an error: the loop returns whatever the model has
//! produced so far with `truncated` set.

use tracing::{debug, warn};

use super::executor::ToolExecutor;
use super::message::{ChatRequest, TokenUsage, assistant_tool_calls_message, tool_message};
use super::provider::LlmProvider;
use crate::error::Result;

/// Result of one agentic loop invocation.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// Final text content from the model. Empty when the loop was
    /// truncated before the model produced a text answer.
    pub content: String,
    /// Finish reason reported by the provider on the last call.
    pub finish_reason: Option<String>,
    /// Token usage accumulated across every model call in the loop.
    pub usage: TokenUsage,
    /// True when the iteration ceiling was reached while the model was
    /// still requesting tools.
    pub truncated: bool,
    /// Number of model round-trips performed.
    pub iterations: usize,
}

/// Runs an agentic loop: model, tool calls, tool results, model, ...
///
/// Continues until the model responds without tool calls or
/// `max_iterations` round-trips have been made. When the ceiling is
/// reached with tool calls still pending, the pending batch is not
/// executed and the outcome is returned with `truncated: true`.
///
/// # Errors
///
/// Propagates provider errors. Tool execution failures never error out
/// of the loop; they are fed back to the model as error results.
pub async fn agentic_loop(
    provider: &dyn LlmProvider,
    request: &mut ChatRequest,
    executor: &mut ToolExecutor,
    max_iterations: usize,
) -> Result<LoopOutcome> {
    let mut usage = TokenUsage::default();

    for iteration in 0..max_iterations {
        let response = provider.chat(request).await?;
        usage.accumulate(response.usage);

        // No tool calls means the model produced its final answer.
        if response.tool_calls.is_empty() {
            debug!(iteration, "agentic loop completed with final text response");
            return Ok(LoopOutcome {
                content: response.content,
                finish_reason: response.finish_reason,
                usage,
                truncated: false,
                iterations: iteration + 1,
            });
        }

        if iteration + 1 == max_iterations {
            // Ceiling reached with tools still pending. Do not execute
            // the final batch; return what we have.
            warn!(
                max_iterations,
                pending_tools = response.tool_calls.len(),
                "tool loop ceiling reached, truncating"
            );
            return Ok(LoopOutcome {
                content: response.content,
                finish_reason: response.finish_reason,
                usage,
                truncated: true,
                iterations: iteration + 1,
            });
        }

        debug!(
            iteration,
            tool_count = response.tool_calls.len(),
            "executing tool calls"
        );

        request
            .messages
            .push(assistant_tool_calls_message(response.tool_calls.clone()));

        for call in &response.tool_calls {
            let result = executor.execute(call).await;
            debug!(
                tool = call.name,
                call_id = call.id,
                is_error = result.is_error,
                "tool execution complete"
            );
            request
                .messages
                .push(tool_message(&result.tool_call_id, &result.content));
        }
    }

    // max_iterations == 0; degenerate but well-defined.
    Ok(LoopOutcome {
        content: String::new(),
        finish_reason: None,
        usage,
        truncated: true,
        iterations: 0,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::executor::tests::MockSearch;
    use crate::agent::message::{
        ChatRequest, ChatResponse, TokenUsage, system_message, user_message,
    };
    use crate::agent::tool::ToolCall;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    /// Mock provider that returns tool calls on the first N calls,
    /// then a final text response.
    struct MockToolProvider {
        call_count: AtomicUsize,
        tool_rounds: usize,
    }

    impl MockToolProvider {
        fn new(tool_rounds: usize) -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                tool_rounds,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockToolProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse> {
            let count = self.call_count.fetch_add(1, Ordering::SeqCst);

            if count < self.tool_rounds {
                Ok(ChatResponse {
                    content: String::new(),
                    usage: TokenUsage {
                        prompt_tokens: 50,
                        completion_tokens: 10,
                        total_tokens: 60,
                    },
                    tool_calls: vec![ToolCall {
                        id: format!("call_{count}"),
                        name: "web_search".to_string(),
                        arguments: r#"{"query":"test"}"#.to_string(),
                    }],
                    finish_reason: Some("tool_calls".to_string()),
                })
            } else {
                Ok(ChatResponse {
                    content: "Final answer based on tool results.".to_string(),
                    usage: TokenUsage {
                        prompt_tokens: 100,
                        completion_tokens: 20,
                        total_tokens: 120,
                    },
                    tool_calls: Vec::new(),
                    finish_reason: Some("stop".to_string()),
                })
            }
        }
    }

    fn make_executor() -> ToolExecutor {
        ToolExecutor::new(Arc::new(MockSearch::with_results(Vec::new())), 10)
    }

    fn make_request() -> ChatRequest {
        ChatRequest {
            model: "test".to_string(),
            messages: vec![system_message("test"), user_message("query")],
            temperature: Some(0.0),
            max_tokens: Some(1024),
            json_mode: false,
            tools: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_agentic_loop_single_tool_round() {
        let mut executor = make_executor();
        let provider = MockToolProvider::new(1);
        let mut request = make_request();

        let outcome = agentic_loop(&provider, &mut request, &mut executor, 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        assert_eq!(outcome.content, "Final answer based on tool results.");
        assert!(!outcome.truncated);
        assert_eq!(outcome.iterations, 2);
        // system + user + assistant(tool_calls) + tool(result) = 4 messages
        assert_eq!(request.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_agentic_loop_multiple_rounds() {
        let mut executor = make_executor();
        let provider = MockToolProvider::new(3);
        let mut request = make_request();

        let outcome = agentic_loop(&provider, &mut request, &mut executor, 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        assert_eq!(outcome.content, "Final answer based on tool results.");
        // 2 initial + 3 rounds * 2 (assistant + tool) = 8 messages
        assert_eq!(request.messages.len(), 8);
        // 3 tool rounds at 60 tokens plus the final call at 120
        assert_eq!(outcome.usage.total_tokens, 300);
    }

    #[tokio::test]
    async fn test_agentic_loop_ceiling_is_truncated_success() {
        let mut executor = make_executor();
        // Provider always returns tool calls (100 rounds > max of 2)
        let provider = MockToolProvider::new(100);
        let mut request = make_request();

        let outcome = agentic_loop(&provider, &mut request, &mut executor, 2)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        assert!(outcome.truncated);
        assert_eq!(outcome.iterations, 2);
        // First round executed, second (final) round's tools were not:
        // 2 initial + 1 round * 2 = 4 messages
        assert_eq!(request.messages.len(), 4);
        // Usage still accumulated across both model calls.
        assert_eq!(outcome.usage.total_tokens, 120);
    }

    #[tokio::test]
    async fn test_agentic_loop_no_tools() {
        let mut executor = make_executor();
        let provider = MockToolProvider::new(0);
        let mut request = make_request();

        let outcome = agentic_loop(&provider, &mut request, &mut executor, 10)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        assert_eq!(outcome.content, "Final answer based on tool results.");
        assert!(!outcome.truncated);
        assert_eq!(request.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_agentic_loop_zero_iterations() {
        let mut executor = make_executor();
        let provider = MockToolProvider::new(0);
        let mut request = make_request();

        let outcome = agentic_loop(&provider, &mut request, &mut executor, 0)
            .await
            .unwrap_or_else(|e| panic!("agentic_loop failed: {e}"));

        assert!(outcome.truncated);
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.content.is_empty());
    }
}

//! Tool executor that dispatches tool calls to the search provider.
//!
//! Maps tool names to calls against the injected [`SearchProvider`] and
//! accumulates every source seen during one agent invocation,
//! deduplicated by URL. Failures are captured per call and converted
//! into error tool results so an isolated bad search never sinks the
//! research session.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::tool::{ToolCall, ToolResult};
use crate::core::{SourcePool, SourceRecord};
use crate::error::{ResearchError, Result};
use crate::search::SearchProvider;

/// Maximum raw byte length of tool argument JSON from the LLM.
const MAX_TOOL_ARGS_LEN: usize = 10_000;
/// Maximum byte length of a search query.
const MAX_QUERY_LEN: usize = 1_000;
/// Maximum results per `web_search` call regardless of arguments.
const MAX_SEARCH_RESULTS: usize = 20;

/// Executes tool calls for one agent invocation.
///
/// Owns the per-invocation source accumulation; each concurrent
/// researcher creates its own executor, so no state is shared across
/// invocations beyond the stateless search provider handle.
pub struct ToolExecutor {
    search: Arc<dyn SearchProvider>,
    default_max_results: usize,
    sources: SourcePool,
}

impl ToolExecutor {
    /// Creates a new executor backed by the given search provider.
    ///
    /// `default_max_results` applies when the model omits `max_results`.
    #[must_use]
    pub fn new(search: Arc<dyn SearchProvider>, default_max_results: usize) -> Self {
        Self {
            search,
            default_max_results,
            sources: SourcePool::new(),
        }
    }

    /// Returns the sources accumulated so far, deduplicated by URL in
    /// first-appearance order.
    #[must_use]
    pub fn sources(&self) -> &[SourceRecord] {
        self.sources.records()
    }

    /// Consumes the executor, returning the accumulated sources.
    #[must_use]
    pub fn into_sources(self) -> Vec<SourceRecord> {
        self.sources.into_records()
    }

    /// Dispatches a tool call, producing exactly one result correlated
    /// by the call identifier.
    ///
    /// Unknown tool names and executor failures become error results;
    /// they never propagate as errors from this method.
    pub async fn execute(&mut self, call: &ToolCall) -> ToolResult {
        if call.arguments.len() > MAX_TOOL_ARGS_LEN {
            return ToolResult {
                tool_call_id: call.id.clone(),
                content: format!(
                    "tool arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                    call.arguments.len()
                ),
                is_error: true,
            };
        }

        let result = match call.name.as_str() {
            "web_search" => self.tool_web_search(&call.arguments).await,
            other => Err(ResearchError::ToolExecution {
                name: other.to_string(),
                message: "unknown tool".to_string(),
            }),
        };

        match result {
            Ok(content) => ToolResult {
                tool_call_id: call.id.clone(),
                content,
                is_error: false,
            },
            Err(e) => ToolResult {
                tool_call_id: call.id.clone(),
                content: e.to_string(),
                is_error: true,
            },
        }
    }

    /// Searches the web and records the sources.
    async fn tool_web_search(&mut self, args: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Args {
            query: String,
            max_results: Option<usize>,
        }
        let args: Args =
            serde_json::from_str(args).map_err(|e| ResearchError::ToolExecution {
                name: "web_search".to_string(),
                message: format!("invalid arguments: {e}"),
            })?;

        if args.query.trim().is_empty() {
            return Err(ResearchError::ToolExecution {
                name: "web_search".to_string(),
                message: "query cannot be empty".to_string(),
            });
        }
        if args.query.len() > MAX_QUERY_LEN {
            return Err(ResearchError::ToolExecution {
                name: "web_search".to_string(),
                message: format!(
                    "query too long ({} bytes, max {MAX_QUERY_LEN})",
                    args.query.len()
                ),
            });
        }

        let max_results = args
            .max_results
            .unwrap_or(self.default_max_results)
            .clamp(1, MAX_SEARCH_RESULTS);

        let results = self
            .search
            .search(&args.query, max_results)
            .await
            .map_err(|e| ResearchError::ToolExecution {
                name: "web_search".to_string(),
                message: e.to_string(),
            })?;

        debug!(
            query = %args.query,
            result_count = results.len(),
            "web search complete"
        );

        self.sources.extend(results.iter().cloned());

        serde_json::to_string(&results).map_err(|e| ResearchError::ToolExecution {
            name: "web_search".to_string(),
            message: format!("serialization error: {e}"),
        })
    }
}

impl std::fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutor")
            .field("search", &self.search.name())
            .field("sources_collected", &self.sources.len())
            .finish_non_exhaustive()
    }
}

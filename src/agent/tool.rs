//! Tool type definitions for function-calling.
//!
//! Provider-agnostic types for tool definitions, calls, and results.
//! Research agents expose a single `web_search` tool backed by the
//! configured search provider.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// A tool definition that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the dispatch table in the executor).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// The result of executing a tool call.
///
/// Exactly one result is produced per call, correlated by
/// `tool_call_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this result corresponds to.
    pub tool_call_id: String,
    /// Result content (JSON string on success, error message on failure).
    pub content: String,
    /// Whether this result represents an error.
    pub is_error: bool,
}

/// A set of tool definitions scoped to an agent role.
///
/// Researcher agents get the `web_search` tool; every other role
/// (guard, splitter, triage, optimizer, synthesizer) runs without tools.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    definitions: Vec<ToolDefinition>,
}

impl ToolSet {
    /// Returns the tool definitions in this set.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Consumes the set, returning its tool definitions.
    #[must_use]
    pub fn into_definitions(self) -> Vec<ToolDefinition> {
        self.definitions
    }

    /// Returns `true` if this set contains no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns the number of tools in this set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Tool set for researcher agents: `web_search` only.
    #[must_use]
    pub fn researcher_tools() -> Self {
        Self {
            definitions: vec![def_web_search()],
        }
    }

    /// Empty tool set (no tools available).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Defines the `web_search` tool.
fn def_web_search() -> ToolDefinition {
    ToolDefinition {
        name: "web_search".to_string(),
        description: "Search the web for relevant sources on a topic. Returns an array of \
                       results with title, url, snippet, and a relevance score in [0, 1]."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query."
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return. Defaults to the configured per-search limit.",
                    "minimum": 1
                }
            },
            "required": ["query"],
            "additionalProperties": false
        }),
    }
}

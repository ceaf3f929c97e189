//! Error types for the research pipeline.
//!
//! The taxonomy distinguishes failures that end a pipeline run
//! (transport, malformed model output) from failures that are absorbed
//! and recorded (individual tool calls). Truncation of the agentic loop
//! is not an error at all; it is a degraded-success flag on the loop
//! outcome.

use thiserror::Error;

/// Errors produced by the research pipeline and its collaborators.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// No LLM API key was configured.
    #[error("no LLM API key found (set OPENAI_API_KEY or SCOUT_API_KEY)")]
    ApiKeyMissing,

    /// No search API key was configured.
    #[error("no search API key found (set TAVILY_API_KEY)")]
    SearchKeyMissing,

    /// An unknown provider name was configured.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// The configured provider name.
        name: String,
    },

    /// A completion or search endpoint could not be reached, timed out,
    /// or returned a non-success status. Retryable by the caller at the
    /// granularity of a whole pipeline run.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
        /// HTTP status code, when one was received.
        status: Option<u16>,
    },

    /// A tool executor failed for a single call. Captured per call and
    /// converted into an error tool result; never aborts the run.
    #[error("tool '{name}' failed: {message}")]
    ToolExecution {
        /// Name of the tool that failed.
        name: String,
        /// Description of the failure.
        message: String,
    },

    /// A model response did not conform to the declared structured-output
    /// shape. Fatal to the current pipeline run.
    #[error("failed to parse model output: {message}")]
    ResponseParse {
        /// Description of the parse failure.
        message: String,
        /// The raw model output, for diagnostics.
        content: String,
    },

    /// A pipeline coordination failure (task join, invalid stage input).
    #[error("orchestration error: {message}")]
    Orchestration {
        /// Description of the failure.
        message: String,
    },

    /// An I/O failure while reading prompts or writing exports.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResearchError {
    /// Returns `true` if the caller may reasonably retry the whole run.
    ///
    /// Only transport failures (network, timeout, rate limit) are
    /// retryable; everything else requires a configuration or input
    /// change first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ResearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_is_retryable() {
        let err = ResearchError::Transport {
            message: "connection reset".to_string(),
            status: None,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_parse_error_not_retryable() {
        let err = ResearchError::ResponseParse {
            message: "bad json".to_string(),
            content: "{".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = ResearchError::ToolExecution {
            name: "web_search".to_string(),
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "tool 'web_search' failed: rate limited");
    }
}

//! Output formatting for CLI commands.
//!
//! Supports human-readable text and JSON for programmatic use.

use std::fmt::Write as _;

use crate::agent::orchestrator::RunResult;
use crate::export;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text (default).
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format string, defaulting to text for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes a JSON value according to this format's conventions.
    #[must_use]
    pub fn to_json(self, value: &serde_json::Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Formats a completed run for display.
#[must_use]
pub fn format_run_result(result: &RunResult, format: OutputFormat, verbose: bool) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = export::to_markdown(&result.report);
            let _ = write!(
                output,
                "---\nSubtopics: {} | Sources: {} | Passes: {} | Tokens: {} | Time: {:.1}s",
                result.subtopics.len(),
                result.sources_collected,
                result.research_passes,
                result.total_tokens,
                result.elapsed.as_secs_f64()
            );
            if result.truncated_researchers > 0 {
                let _ = write!(
                    output,
                    " | Truncated researchers: {}",
                    result.truncated_researchers
                );
            }
            for warning in &result.warnings {
                let _ = write!(output, "\nWarning: {warning}");
            }
            if verbose {
                let _ = write!(output, "\nSubtopics: [{}]", result.subtopics.join(", "));
            }
            output
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "report": result.report,
                "subtopics": result.subtopics,
                "sources_collected": result.sources_collected,
                "research_passes": result.research_passes,
                "truncated_researchers": result.truncated_researchers,
                "warnings": result.warnings,
                "total_tokens": result.total_tokens,
                "elapsed_secs": result.elapsed.as_secs_f64(),
            });
            format.to_json(&json)
        }
    }
}

/// Formats a guard rejection for display.
#[must_use]
pub fn format_rejection(reason: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("Research rejected: {reason}"),
        OutputFormat::Json => format.to_json(&serde_json::json!({
            "rejected": true,
            "reason": reason,
        })),
    }
}

/// Masks an API key for display, keeping a short prefix.
#[must_use]
pub fn mask_key(key: &str) -> String {
    if key.len() <= 6 {
        "***".to_string()
    } else {
        let prefix: String = key.chars().take(6).collect();
        format!("{prefix}***")
    }
}

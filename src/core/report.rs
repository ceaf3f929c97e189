//! The structured research report produced by a pipeline run.
//!
//! A [`ResearchReport`] is built once per run by the synthesizer stage
//! and is immutable afterwards. Soft constraints (TL;DR word count,
//! uncited findings) surface as validation warnings, not errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::source::SourceRecord;

/// Soft word limit on the TL;DR summary.
pub const TLDR_WORD_LIMIT: usize = 120;

/// Maximum number of sources in the top-sources section.
pub const MAX_TOP_SOURCES: usize = 5;

/// One insight discovered during research, with the source URLs that
/// support it. An empty citation list is allowed but discouraged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFinding {
    /// The finding text.
    pub finding: String,
    /// Source URLs supporting this finding.
    #[serde(default)]
    pub citations: Vec<String>,
}

/// Metadata stamped onto a completed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReportMetadata {
    /// When the report was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    /// Model used by the synthesizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Number of research passes the run took.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_passes: Option<usize>,
    /// Total tokens consumed across all stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    /// Researcher loops that hit their iteration ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated_researchers: Option<usize>,
}

/// A complete, structured research report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    /// The research topic or question.
    pub topic: String,
    /// Short summary, soft-bounded by [`TLDR_WORD_LIMIT`] words.
    pub tldr: String,
    /// Key findings, each with citations.
    #[serde(default)]
    pub key_findings: Vec<KeyFinding>,
    /// Disagreements between sources and important limitations.
    #[serde(default)]
    pub conflicts_and_caveats: String,
    /// The most relevant sources, at most [`MAX_TOP_SOURCES`], each with
    /// a why-it-matters annotation.
    #[serde(default)]
    pub top_sources: Vec<SourceRecord>,
    /// Generation metadata.
    #[serde(default)]
    pub metadata: ReportMetadata,
}

impl ResearchReport {
    /// Checks soft constraints and returns human-readable warnings.
    ///
    /// Violations never fail a run; callers surface them alongside the
    /// report.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let words = self.tldr.split_whitespace().count();
        if words > TLDR_WORD_LIMIT {
            warnings.push(format!(
                "TL;DR is {words} words (soft limit {TLDR_WORD_LIMIT})"
            ));
        }

        let uncited = self
            .key_findings
            .iter()
            .filter(|f| f.citations.is_empty())
            .count();
        if uncited > 0 {
            warnings.push(format!("{uncited} key finding(s) carry no citations"));
        }

        if self.top_sources.len() > MAX_TOP_SOURCES {
            warnings.push(format!(
                "top_sources has {} entries (max {MAX_TOP_SOURCES})",
                self.top_sources.len()
            ));
        }

        warnings
    }
}

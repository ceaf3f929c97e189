//! Synthesizer agent.
//!
//! Takes the aggregated research document and the collected sources
//! and produces the final structured report.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::config::ResearchConfig;
use super::provider::LlmProvider;
use super::strip_json_delimiters;
use super::traits::{Agent, AgentResponse};
use crate::core::{KeyFinding, MAX_TOP_SOURCES, ResearchReport, SourceRecord, top_by_score};
use crate::error::{ResearchError, Result};

/// Report fields as the model emits them, before assembly.
#[derive(Debug, Deserialize)]
struct SynthesisDraft {
    tldr: String,
    #[serde(default)]
    key_findings: Vec<KeyFinding>,
    #[serde(default)]
    conflicts_and_caveats: String,
    #[serde(default)]
    top_sources: Vec<SourceRecord>,
}

/// Agent that synthesizes research into the final report.
pub struct SynthesizerAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl SynthesizerAgent {
    /// Creates a new synthesizer agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &ResearchConfig, system_prompt: String) -> Self {
        Self {
            model: config.synthesizer_model.clone(),
            max_tokens: config.synthesizer_max_tokens,
            system_prompt,
        }
    }

    /// Executes the agent and assembles the final report.
    ///
    /// `collected` is the full session source pool; it backfills
    /// `top_sources` by descending score when the model omits them, and
    /// the list is capped at [`MAX_TOP_SOURCES`] either way.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::ResponseParse`] when the response does
    /// not match the report schema. When the response was truncated
    /// (finish\_reason `"length"`), the error message includes a hint
    /// to raise `--synthesizer-max-tokens`.
    pub async fn execute_and_parse(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
        topic: &str,
        collected: &[SourceRecord],
    ) -> Result<(ResearchReport, AgentResponse)> {
        let response = self.execute(provider, user_msg).await?;
        let truncated = response
            .finish_reason
            .as_deref()
            .is_some_and(|r| r == "length");

        let draft = match Self::parse_draft(&response.content) {
            Ok(draft) => draft,
            Err(_) if truncated => {
                return Err(ResearchError::ResponseParse {
                    message: format!(
                        "Response truncated (finish_reason=length, max_tokens={}). \
                         Consider increasing --synthesizer-max-tokens.",
                        self.max_tokens
                    ),
                    content: response.content,
                });
            }
            Err(e) => return Err(e),
        };

        let report = Self::assemble_report(topic, draft, collected);
        Ok((report, response))
    }

    /// Parses the agent's JSON response into a draft.
    fn parse_draft(content: &str) -> Result<SynthesisDraft> {
        let json_str = strip_json_delimiters(content);
        serde_json::from_str(json_str).map_err(|e| ResearchError::ResponseParse {
            message: format!("invalid synthesis output: {e}"),
            content: content.to_string(),
        })
    }

    /// Builds the final report from a draft, capping and backfilling
    /// the top sources from the session pool.
    fn assemble_report(
        topic: &str,
        mut draft: SynthesisDraft,
        collected: &[SourceRecord],
    ) -> ResearchReport {
        if draft.top_sources.is_empty() {
            draft.top_sources = top_by_score(collected, MAX_TOP_SOURCES);
        } else if draft.top_sources.len() > MAX_TOP_SOURCES {
            draft.top_sources.truncate(MAX_TOP_SOURCES);
        }

        let report = ResearchReport {
            topic: topic.to_string(),
            tldr: draft.tldr,
            key_findings: draft.key_findings,
            conflicts_and_caveats: draft.conflicts_and_caveats,
            top_sources: draft.top_sources,
            metadata: crate::core::ReportMetadata::default(),
        };

        for warning in report.validate() {
            warn!(%warning, "report quality warning");
        }

        report
    }
}

#[async_trait]
impl Agent for SynthesizerAgent {
    fn name(&self) -> &'static str {
        "synthesizer"
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

    fn temperature(&self) -> f32 {
        0.1
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn source(url: &str, score: f64) -> SourceRecord {
        SourceRecord {
            title: format!("title {url}"),
            url: url.to_string(),
            snippet: "snippet".to_string(),
            score: Some(score),
            why_matters: None,
        }
    }

    #[test]
    fn test_parse_draft() {
        let json = r#"{
            "tldr": "Short answer.",
            "key_findings": [{"finding": "a fact", "citations": ["https://a.example"]}],
            "conflicts_and_caveats": "none",
            "top_sources": []
        }"#;
        let draft =
            SynthesizerAgent::parse_draft(json).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(draft.tldr, "Short answer.");
        assert_eq!(draft.key_findings.len(), 1);
    }

    #[test]
    fn test_parse_draft_code_block() {
        let json = "```json\n{\"tldr\": \"Short.\"}\n```";
        let draft =
            SynthesizerAgent::parse_draft(json).unwrap_or_else(|e| panic!("parse failed: {e}"));
        assert_eq!(draft.tldr, "Short.");
        assert!(draft.key_findings.is_empty());
    }

    #[test]
    fn test_parse_draft_invalid() {
        let result = SynthesizerAgent::parse_draft("not json");
        assert!(matches!(result, Err(ResearchError::ResponseParse { .. })));
    }

    #[test]
    fn test_assemble_backfills_top_sources_by_score() {
        let draft = SynthesisDraft {
            tldr: "t".to_string(),
            key_findings: Vec::new(),
            conflicts_and_caveats: String::new(),
            top_sources: Vec::new(),
        };
        let collected: Vec<SourceRecord> = (0..8)
            .map(|i| source(&format!("https://s{i}.example"), f64::from(i) / 10.0))
            .collect();

        let report = SynthesizerAgent::assemble_report("topic", draft, &collected);
        assert_eq!(report.top_sources.len(), MAX_TOP_SOURCES);
        // Highest scoring source first.
        assert_eq!(report.top_sources[0].url, "https://s7.example");
    }

    #[test]
    fn test_assemble_caps_model_top_sources() {
        let draft = SynthesisDraft {
            tldr: "t".to_string(),
            key_findings: Vec::new(),
            conflicts_and_caveats: String::new(),
            top_sources: (0..9)
                .map(|i| source(&format!("https://s{i}.example"), 0.5))
                .collect(),
        };
        let report = SynthesizerAgent::assemble_report("topic", draft, &[]);
        assert_eq!(report.top_sources.len(), MAX_TOP_SOURCES);
        // Model ordering is preserved when it chose its own sources.
        assert_eq!(report.top_sources[0].url, "https://s0.example");
    }
}

//! Report export.
//!
//! Renders a [`ResearchReport`] to markdown or JSON and writes it to
//! disk, choosing the format from the file extension.

use std::fmt::Write as _;
use std::path::Path;

use crate::core::ResearchReport;
use crate::error::{ResearchError, Result};

/// Renders a report as a markdown document.
#[must_use]
pub fn to_markdown(report: &ResearchReport) -> String {
    let mut out = format!("# Research Report: {}\n\n", report.topic);

    if let Some(generated_at) = report.metadata.generated_at {
        let _ = writeln!(out, "_Generated {}_\n", generated_at.format("%Y-%m-%d %H:%M UTC"));
    }

    let _ = writeln!(out, "## TL;DR\n\n{}\n", report.tldr);

    if !report.key_findings.is_empty() {
        out.push_str("## Key Findings\n\n");
        for finding in &report.key_findings {
            let _ = writeln!(out, "- {}", finding.finding);
            for citation in &finding.citations {
                let _ = writeln!(out, "  - <{citation}>");
            }
        }
        out.push('\n');
    }

    if !report.conflicts_and_caveats.is_empty() {
        let _ = writeln!(
            out,
            "## Conflicts & Caveats\n\n{}\n",
            report.conflicts_and_caveats
        );
    }

    if !report.top_sources.is_empty() {
        out.push_str("## Top Sources\n\n");
        for source in &report.top_sources {
            let _ = writeln!(out, "- [{}]({})", source.title, source.url);
            if let Some(why) = &source.why_matters {
                let _ = writeln!(out, "  - {why}");
            }
        }
        out.push('\n');
    }

    out
}

/// Renders a report as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`ResearchError::ResponseParse`] if serialization fails.
pub fn to_json(report: &ResearchReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| ResearchError::ResponseParse {
        message: format!("report serialization failed: {e}"),
        content: String::new(),
    })
}

/// Writes a report to `path`, picking the format from the extension.
///
/// `.json` writes JSON; everything else (including no extension)
/// writes markdown.
///
/// # Errors
///
/// Returns serialization or I/O errors.
pub fn write_report(report: &ResearchReport, path: &Path) -> Result<()> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let content = if is_json {
        to_json(report)?
    } else {
        to_markdown(report)
    };

    std::fs::write(path, content)?;
    Ok(())
}

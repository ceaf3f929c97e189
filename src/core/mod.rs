//! Core data model: sources and the research report.

pub mod report;
pub mod source;

pub use report::{KeyFinding, ReportMetadata, ResearchReport, MAX_TOP_SOURCES, TLDR_WORD_LIMIT};
pub use source::{top_by_score, SourcePool, SourceRecord};

//! # scout-rs
//!
//! Multi-agent web research pipeline.
//!
//! Splits a research topic into subtopics, researches each concurrently
//! through a bounded web-search tool loop, routes the aggregated
//! findings through a triage/optimizer decision (with a capped retry
//! loop), and synthesizes a structured report with key findings,
//! citations, and top sources.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use scout_rs::agent::client::create_provider;
//! use scout_rs::agent::{Orchestrator, ResearchConfig, RunOptions};
//! use scout_rs::search::TavilyProvider;
//!
//! # async fn run() -> scout_rs::error::Result<()> {
//! let config = ResearchConfig::from_env()?;
//! let provider = Arc::from(create_provider(&config)?);
//! let search = Arc::new(TavilyProvider::new(&config.search_api_key, config.timeout)?);
//!
//! let orchestrator = Orchestrator::new(provider, search, config);
//! let outcome = orchestrator
//!     .run_research("rust web frameworks", &RunOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;
pub mod export;
pub mod search;

pub use agent::{Orchestrator, ResearchConfig, ResearchOutcome, RunOptions, RunResult};
pub use core::{ResearchReport, SourceRecord};
pub use error::{ResearchError, Result};

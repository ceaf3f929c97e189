//! Web search providers.
//!
//! The pipeline consumes search through the [`SearchProvider`] trait so
//! the agentic loop and orchestrator stay decoupled from any specific
//! search vendor. [`TavilyProvider`] is the production implementation.

pub mod tavily;

use async_trait::async_trait;

use crate::core::SourceRecord;
use crate::error::Result;

pub use tavily::TavilyProvider;

/// Trait for web search backends.
///
/// Implementations handle the transport layer for a specific search API
/// and normalize results into [`SourceRecord`]s.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name (e.g., `"tavily"`).
    fn name(&self) -> &'static str;

    /// Searches the web, returning at most `max_results` ranked sources.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Transport`](crate::error::ResearchError::Transport)
    /// on network failures or non-success responses.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SourceRecord>>;
}

//! CLI layer for scout-rs.
//!
//! Provides the command-line interface using clap, with commands for
//! running the research pipeline, checking configuration, and managing
//! prompt templates.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};

//! Output module for run artifacts
//!
//! This module handles:
//! - Persisting the final title list through a `TitleSink`
//! - Rendering the ranked digest as markdown

mod markdown;
mod sink;

pub use markdown::{format_markdown_digest, write_markdown_digest};
pub use sink::{FileTitleSink, NullTitleSink, TitleSink};

use thiserror::Error;

/// Errors that can occur while writing run artifacts
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

//! Schema violation errors raised while transforming a markup tree.

use thiserror::Error;

use crate::extent::{SourceExtent, excerpt};

/// Longest excerpt of offending source kept in an error.
pub const EXCERPT_CHARS: usize = 50;

/// A document that does not follow the section grammar.
///
/// Carries enough position information to point an author at the offending
/// node: file, 1-based line and column, and a short excerpt of the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{}:{line}:{column}: {message} (near \"{excerpt}\")",
    .file.as_deref().unwrap_or("<input>")
)]
pub struct SchemaError {
    pub file: Option<String>,
    pub line: usize,
    pub column: usize,
    pub excerpt: String,
    pub message: String,
}

impl SchemaError {
    /// Builds an error located at the start of `extent`.
    pub fn at(extent: &SourceExtent, message: impl Into<String>) -> Self {
        Self {
            file: extent.file.clone(),
            line: extent.start_line,
            column: extent.start_column,
            excerpt: extent.excerpt(EXCERPT_CHARS),
            message: message.into(),
        }
    }

    /// Builds an error for one line of a code block body, where
    /// `line_index` counts from 0 at the line after the opening fence.
    pub fn in_block_line(
        block: &SourceExtent,
        line_index: usize,
        line: &str,
        message: impl Into<String>,
    ) -> Self {
        let indent = line.chars().take_while(|c| c.is_whitespace()).count();
        Self {
            file: block.file.clone(),
            line: block.start_line + 1 + line_index,
            column: indent + 1,
            excerpt: excerpt(line, EXCERPT_CHARS),
            message: message.into(),
        }
    }
}

/// Convenience alias for transformation results.
pub type Result<T> = std::result::Result<T, SchemaError>;

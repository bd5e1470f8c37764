//! Markdown command-reference compiler.
//!
//! Turns Markdown documents that follow the command-reference layout into
//! [`CommandModel`] values:
//!
//! 1. [`normalize`] canonicalizes line endings and splits off front matter.
//! 2. [`parser`] runs an ordered set of lexical rules over the text and
//!    builds a flat tree of headings, paragraphs and code blocks, with a
//!    [`SourceExtent`](extent::SourceExtent) on every node.
//! 3. [`transform()`] walks that tree with a heading-driven grammar and
//!    produces one model per level-1 heading, or a [`SchemaError`] that
//!    points at the offending line.
//!
//! # Example
//!
//! ```
//! use cmdoc_markdown::{LexicalMode, parse_command_models};
//!
//! let text = concat!(
//!     "# Get-Foo\n\n",
//!     "## SYNOPSIS\nGets a foo.\n\n",
//!     "## PARAMETERS\n\n",
//!     "### -Name\nThe name of the foo.\n\n",
//!     "```yaml\nType: String\nRequired: True\nPosition: 0\n```\n",
//! );
//!
//! let models = parse_command_models(text, LexicalMode::Full).unwrap();
//! assert_eq!(models[0].synopsis.text, "Gets a foo.");
//! assert_eq!(models[0].syntax[0].member_names(), vec!["Name"]);
//! ```
//!
//! [`CommandModel`]: cmdoc_core::CommandModel

pub mod error;
pub mod extent;
pub mod normalize;
pub mod parser;
pub mod transform;

pub use error::SchemaError;
pub use normalize::{normalize_line_endings, split_front_matter};
pub use parser::{LexicalMode, MarkdownParser, ParseOptions, ParseProgress, SourceChunk};
pub use transform::{transform, transform_batch};

use cmdoc_core::CommandModel;

/// Parses and transforms one anonymous document.
pub fn parse_command_models(
    text: &str,
    mode: LexicalMode,
) -> Result<Vec<CommandModel>, SchemaError> {
    transform(MarkdownParser::new(mode).parse(text))
}

/// Parses and transforms one document, naming `file` in extents and errors.
pub fn parse_command_file(
    file: &str,
    text: &str,
    mode: LexicalMode,
) -> Result<Vec<CommandModel>, SchemaError> {
    transform(MarkdownParser::new(mode).parse_file(file, text))
}

//! Generic markup tree produced by the tree builder.
//!
//! The tree is flat: a [`Document`] owns its nodes as siblings in source
//! order, and heading containment is decided later by the section grammar.

use cmdoc_core::Metadata;
use serde::{Deserialize, Serialize};

use crate::extent::SourceExtent;

/// Which span rules the pattern matcher runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LexicalMode {
    /// Inline emphasis, links, escapes and hard/soft breaks are recognized.
    #[default]
    Full,
    /// Only headings, code fences and paragraph breaks are recognized; other
    /// text passes through untouched apart from line folding.
    FormattingPreserve,
}

impl std::fmt::Display for LexicalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::FormattingPreserve => write!(f, "formatting-preserve"),
        }
    }
}

/// Emphasis applied to a text span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    #[default]
    Normal,
    Bold,
    Italic,
}

/// Inline element of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Span {
    Text { content: String, style: TextStyle },
    Hyperlink { text: String, uri: String },
    HardBreak,
}

impl Span {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            style: TextStyle::Normal,
        }
    }

    pub fn styled(content: impl Into<String>, style: TextStyle) -> Self {
        Self::Text {
            content: content.into(),
            style,
        }
    }

    pub fn hyperlink(text: impl Into<String>, uri: impl Into<String>) -> Self {
        Self::Hyperlink {
            text: text.into(),
            uri: uri.into(),
        }
    }

    fn write_markdown(&self, out: &mut String) {
        match self {
            Self::Text { content, style } => match style {
                TextStyle::Normal => out.push_str(content),
                TextStyle::Bold => {
                    out.push_str("**");
                    out.push_str(content);
                    out.push_str("**");
                }
                TextStyle::Italic => {
                    out.push('*');
                    out.push_str(content);
                    out.push('*');
                }
            },
            Self::Hyperlink { text, uri } => {
                out.push('[');
                out.push_str(text);
                out.push_str("](");
                out.push_str(uri);
                out.push(')');
            }
            Self::HardBreak => out.push('\n'),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1 through 6.
    pub level: u8,
    pub text: String,
    pub extent: SourceExtent,
    pub blank_line_follows: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub spans: Vec<Span>,
    pub extent: SourceExtent,
}

impl Paragraph {
    /// Renders the spans back to Markdown inline syntax.
    ///
    /// Text produced in formatting-preserving mode is a single normal span,
    /// so this returns it unchanged.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            span.write_markdown(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub text: String,
    pub extent: SourceExtent,
}

/// One block-level element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Heading(Heading),
    Paragraph(Paragraph),
    CodeBlock(CodeBlock),
}

impl Node {
    pub fn extent(&self) -> &SourceExtent {
        match self {
            Self::Heading(heading) => &heading.extent,
            Self::Paragraph(paragraph) => &paragraph.extent,
            Self::CodeBlock(code) => &code.extent,
        }
    }

    /// Heading level, or `None` for non-heading nodes.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            Self::Heading(heading) => Some(heading.level),
            _ => None,
        }
    }

    fn write_markdown(&self, out: &mut String) {
        match self {
            Self::Heading(heading) => {
                for _ in 0..heading.level {
                    out.push('#');
                }
                out.push(' ');
                out.push_str(&heading.text);
                out.push('\n');
                if heading.blank_line_follows {
                    out.push('\n');
                }
            }
            Self::Paragraph(paragraph) => {
                out.push_str(&paragraph.to_markdown());
                out.push_str("\n\n");
            }
            Self::CodeBlock(code) => {
                out.push_str("```");
                if let Some(language) = &code.language {
                    out.push_str(language);
                }
                out.push('\n');
                out.push_str(&code.text);
                if !code.text.is_empty() {
                    out.push('\n');
                }
                out.push_str("```\n\n");
            }
        }
    }
}

/// Per-source header information recorded when a batch is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader {
    /// Index of the first node parsed from this source.
    pub first_node: usize,
    pub file: Option<String>,
    /// Front-matter entries of this source.
    pub metadata: Metadata,
}

/// Parsed markup of one or more concatenated sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub mode: LexicalMode,
    pub nodes: Vec<Node>,
    pub headers: Vec<DocumentHeader>,
}

impl Document {
    /// Front matter in effect for the node at `index`.
    pub fn metadata_for(&self, index: usize) -> Metadata {
        metadata_for(&self.headers, index)
    }

    /// Re-emits the tree as Markdown with canonical block spacing.
    ///
    /// Headings keep their recorded blank-line flag; paragraphs and code
    /// blocks are followed by one blank line, and the output ends with a
    /// single newline. Front matter is not reproduced.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_markdown(&mut out);
        }
        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }
}

pub(crate) fn metadata_for(headers: &[DocumentHeader], index: usize) -> Metadata {
    headers
        .iter()
        .rev()
        .find(|header| header.first_node <= index)
        .map(|header| header.metadata.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extent::ExtentTracker;

    fn extent(text: &str) -> SourceExtent {
        ExtentTracker::new(None, text).extent(0, text.len())
    }

    #[test]
    fn test_paragraph_to_markdown_restores_inline_syntax() {
        let paragraph = Paragraph {
            spans: vec![
                Span::text("Use "),
                Span::styled("Force", TextStyle::Bold),
                Span::text(" or see "),
                Span::hyperlink("docs", "https://example.com"),
                Span::HardBreak,
                Span::styled("carefully", TextStyle::Italic),
            ],
            extent: extent("x"),
        };
        assert_eq!(
            paragraph.to_markdown(),
            "Use **Force** or see [docs](https://example.com)\n*carefully*"
        );
    }

    #[test]
    fn test_metadata_for_picks_nearest_preceding_header() {
        let mut first = Metadata::new();
        first.insert("schema", "1");
        let mut second = Metadata::new();
        second.insert("schema", "2");
        let headers = vec![
            DocumentHeader {
                first_node: 0,
                file: None,
                metadata: first,
            },
            DocumentHeader {
                first_node: 4,
                file: None,
                metadata: second,
            },
        ];

        assert_eq!(metadata_for(&headers, 3).get("schema"), Some("1"));
        assert_eq!(metadata_for(&headers, 4).get("schema"), Some("2"));
        assert!(metadata_for(&[], 0).is_empty());
    }
}

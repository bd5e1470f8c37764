//! Markdown tree builder.
//!
//! The builder walks the normalized text with the [`patterns`] scanner.
//! Structural matches (headings, code fences, paragraph breaks) close the
//! open paragraph and emit block nodes; inline matches add spans to it; the
//! text between matches becomes plain spans. Which rules run is chosen by
//! the [`LexicalMode`]:
//!
//! - **Full** unwinds escapes, recognizes bold, italic and hyperlinks, and
//!   distinguishes hard breaks from soft breaks (which fold into a space).
//! - **FormattingPreserve** keeps paragraph text byte-exact apart from line
//!   folding, which keeps line breaks around list items.
//!
//! # Examples
//!
//! ```
//! use cmdoc_markdown::parser::{LexicalMode, MarkdownParser, Node};
//!
//! let mut parser = MarkdownParser::new(LexicalMode::Full);
//! let document = parser.parse("# Get-Foo\n\n## SYNOPSIS\nGets **foo**.\n");
//!
//! assert_eq!(document.nodes.len(), 3);
//! let Node::Paragraph(paragraph) = &document.nodes[2] else { panic!() };
//! assert_eq!(paragraph.to_markdown(), "Gets **foo**.");
//! ```

mod ast;
mod fold;
pub(crate) mod patterns;

pub use ast::{
    CodeBlock, Document, DocumentHeader, Heading, LexicalMode, Node, Paragraph, Span, TextStyle,
};
pub use fold::fold_lines;
pub(crate) use ast::metadata_for;

use tracing::debug;

use crate::extent::ExtentTracker;
use crate::normalize::{normalize_line_endings, skip_whitespace, split_front_matter};
use fold::unescape;
use patterns::{RuleKind, RuleMatch, Scanner};

/// Default number of bytes between progress callbacks.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 64 * 1024;

/// Tree builder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub mode: LexicalMode,
    /// Bytes of input between progress callbacks. Zero reports after every
    /// match.
    pub progress_interval: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            mode: LexicalMode::Full,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Advisory progress of a running parse, in bytes of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseProgress {
    pub processed: usize,
    pub total: usize,
}

/// One input text of a batch, with an optional file identifier used in
/// extents and errors.
#[derive(Debug, Clone, Copy)]
pub struct SourceChunk<'a> {
    pub file: Option<&'a str>,
    pub text: &'a str,
}

impl<'a> SourceChunk<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { file: None, text }
    }

    pub fn named(file: &'a str, text: &'a str) -> Self {
        Self {
            file: Some(file),
            text,
        }
    }
}

type ProgressCallback = Box<dyn FnMut(ParseProgress)>;

/// Builds markup trees from Markdown text.
pub struct MarkdownParser {
    options: ParseOptions,
    progress: Option<ProgressCallback>,
}

impl MarkdownParser {
    pub fn new(mode: LexicalMode) -> Self {
        Self::with_options(ParseOptions {
            mode,
            ..ParseOptions::default()
        })
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            progress: None,
        }
    }

    /// Registers a callback invoked every `progress_interval` bytes and once
    /// at the end of each source.
    pub fn with_progress(mut self, callback: impl FnMut(ParseProgress) + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parses one anonymous source.
    pub fn parse(&mut self, text: &str) -> Document {
        self.parse_chunks(&[SourceChunk::new(text)])
    }

    /// Parses one source identified by `file`.
    pub fn parse_file(&mut self, file: &str, text: &str) -> Document {
        self.parse_chunks(&[SourceChunk::named(file, text)])
    }

    /// Parses several sources into one document, in order. Each source keeps
    /// its own front matter, recorded as a [`DocumentHeader`].
    pub fn parse_chunks(&mut self, chunks: &[SourceChunk<'_>]) -> Document {
        let total = chunks.iter().map(|chunk| chunk.text.len()).sum();
        let mut document = Document {
            mode: self.options.mode,
            ..Document::default()
        };

        let mut processed = 0;
        for chunk in chunks {
            self.parse_chunk(chunk, &mut document, processed, total);
            processed += chunk.text.len();
            self.report(processed, total);
        }

        document
    }

    fn report(&mut self, processed: usize, total: usize) {
        if let Some(callback) = self.progress.as_mut() {
            callback(ParseProgress { processed, total });
        }
    }

    fn parse_chunk(
        &mut self,
        chunk: &SourceChunk<'_>,
        document: &mut Document,
        processed_before: usize,
        total: usize,
    ) {
        let text = normalize_line_endings(chunk.text);
        let text = text.as_ref();

        let header_start = skip_whitespace(text, 0);
        let (metadata, header_len) = split_front_matter(&text[header_start..]);
        let body_start = skip_whitespace(text, header_start + header_len);

        document.headers.push(DocumentHeader {
            first_node: document.nodes.len(),
            file: chunk.file.map(String::from),
            metadata,
        });

        if body_start >= text.len() {
            debug!(file = ?chunk.file, "Skipping blank source");
            return;
        }

        let interval = self.options.progress_interval;
        let mut builder = TreeBuilder::new(self.options.mode, chunk.file, text);
        let mut scanner = Scanner::new(self.options.mode, text);
        let mut pos = body_start;
        let mut last_report = pos;

        while pos < text.len() {
            match scanner.next_match(pos) {
                Some(found) => {
                    if found.start() > pos {
                        builder.plain(pos, found.start());
                    }
                    pos = found.end();
                    builder.apply(&found);
                }
                None => {
                    builder.plain(pos, text.len());
                    pos = text.len();
                }
            }

            if pos - last_report >= interval && pos < text.len() {
                last_report = pos;
                let processed = processed_before + pos.min(chunk.text.len());
                self.report(processed, total);
            }
        }

        let nodes = builder.finish();
        debug!(file = ?chunk.file, nodes = nodes.len(), mode = %self.options.mode, "Parsed markdown source");
        document.nodes.extend(nodes);
    }
}

/// Accumulates nodes and the currently open paragraph.
struct TreeBuilder<'t> {
    mode: LexicalMode,
    text: &'t str,
    tracker: ExtentTracker<'t>,
    nodes: Vec<Node>,
    spans: Vec<Span>,
    paragraph_start: Option<usize>,
    paragraph_end: usize,
}

impl<'t> TreeBuilder<'t> {
    fn new(mode: LexicalMode, file: Option<&str>, text: &'t str) -> Self {
        Self {
            mode,
            text,
            tracker: ExtentTracker::new(file, text),
            nodes: Vec::new(),
            spans: Vec::new(),
            paragraph_start: None,
            paragraph_end: 0,
        }
    }

    fn touch(&mut self, start: usize, end: usize) {
        self.paragraph_start.get_or_insert(start);
        self.paragraph_end = end;
    }

    fn push_text(&mut self, content: String, style: TextStyle, start: usize, end: usize) {
        if content.is_empty() {
            return;
        }
        self.touch(start, end);
        if style == TextStyle::Normal
            && let Some(Span::Text {
                content: last,
                style: TextStyle::Normal,
            }) = self.spans.last_mut()
        {
            last.push_str(&content);
            return;
        }
        self.spans.push(Span::Text { content, style });
    }

    /// Text between rule matches.
    fn plain(&mut self, start: usize, end: usize) {
        let raw = &self.text[start..end];
        match self.mode {
            LexicalMode::Full => self.push_text(raw.to_string(), TextStyle::Normal, start, end),
            LexicalMode::FormattingPreserve => {
                if !raw.trim().is_empty() {
                    self.push_text(fold_lines(raw), TextStyle::Normal, start, end);
                }
            }
        }
    }

    fn soft_break(&mut self) {
        match self.spans.last_mut() {
            None => {}
            Some(Span::Text {
                content,
                style: TextStyle::Normal,
            }) => {
                if !content.ends_with(' ') {
                    content.push(' ');
                }
            }
            Some(_) => self.spans.push(Span::text(" ")),
        }
    }

    fn heading_text(&self, raw: &str) -> String {
        match self.mode {
            LexicalMode::Full => unescape(raw.trim()),
            LexicalMode::FormattingPreserve => raw.trim().to_string(),
        }
    }

    fn apply(&mut self, found: &RuleMatch<'t>) {
        let (start, end) = (found.start(), found.end());
        match found.kind {
            RuleKind::HashHeading | RuleKind::UnderlineHeading => {
                self.flush();
                let level = match found.kind {
                    RuleKind::HashHeading => found.group(1).len() as u8,
                    _ if found.group(2).starts_with('=') => 1,
                    _ => 2,
                };
                let text_group = if found.kind == RuleKind::HashHeading { 2 } else { 1 };
                let text = self.heading_text(found.group(text_group));
                let extent = self.tracker.extent(start, found.group_start(3));
                self.nodes.push(Node::Heading(Heading {
                    level,
                    text,
                    extent,
                    blank_line_follows: !found.group(3).is_empty(),
                }));
            }
            RuleKind::CodeFence => {
                self.flush();
                let language = Some(found.group(1))
                    .filter(|language| !language.is_empty())
                    .map(String::from);
                let body = found.group(2);
                let text = body.strip_suffix('\n').unwrap_or(body).to_string();
                let extent = self.tracker.extent(start, found.group_start(3));
                self.nodes.push(Node::CodeBlock(CodeBlock {
                    language,
                    text,
                    extent,
                }));
            }
            RuleKind::ParagraphBreak => self.flush(),
            RuleKind::HardBreak => {
                if !self.spans.is_empty() {
                    self.touch(start, end);
                    self.spans.push(Span::HardBreak);
                }
            }
            RuleKind::SoftBreak => self.soft_break(),
            RuleKind::Escape => {
                self.push_text(found.group(0)[1..].to_string(), TextStyle::Normal, start, end);
            }
            RuleKind::Hyperlink => {
                self.touch(start, end);
                self.spans.push(Span::hyperlink(
                    unescape(found.group(1)),
                    found.group(2).trim(),
                ));
            }
            RuleKind::Bold | RuleKind::Italic => {
                let inner = if found.captures.get(1).is_some() {
                    found.group(1)
                } else {
                    found.group(2)
                };
                let style = if found.kind == RuleKind::Bold {
                    TextStyle::Bold
                } else {
                    TextStyle::Italic
                };
                self.push_text(unescape(inner), style, start, end);
            }
        }
    }

    /// Closes the open paragraph, if it has any visible content.
    fn flush(&mut self) {
        let spans = tidy_spans(std::mem::take(&mut self.spans));
        let Some(start) = self.paragraph_start.take() else {
            return;
        };
        if spans.is_empty() {
            return;
        }
        let extent = self.tracker.extent(start, self.paragraph_end);
        self.nodes.push(Node::Paragraph(Paragraph { spans, extent }));
    }

    fn finish(mut self) -> Vec<Node> {
        self.flush();
        self.nodes
    }
}

/// Trims paragraph edges and drops whitespace-only spans.
fn tidy_spans(mut spans: Vec<Span>) -> Vec<Span> {
    if let Some(Span::Text { content, .. }) = spans.first_mut() {
        *content = content.trim_start().to_string();
    }
    if let Some(Span::Text { content, .. }) = spans.last_mut() {
        *content = content.trim_end().to_string();
    }
    spans.retain(|span| !matches!(span, Span::Text { content, .. } if content.trim().is_empty()));
    while matches!(spans.last(), Some(Span::HardBreak)) {
        spans.pop();
    }
    while matches!(spans.first(), Some(Span::HardBreak)) {
        spans.remove(0);
    }
    spans
}

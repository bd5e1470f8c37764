//! Source position tracking for diagnostics.
//!
//! Every markup node carries a [`SourceExtent`] describing where it came
//! from. Extents are computed by an [`ExtentTracker`] that keeps a running
//! `(line, column)` cursor, so a document is walked once no matter how many
//! extents are requested, as long as requests move forward.

use serde::{Deserialize, Serialize};

/// Position range of a node within one source text.
///
/// Offsets are byte offsets into the normalized text; lines and columns are
/// 1-based, columns counted in characters. The end position is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceExtent {
    /// File identifier supplied by the caller, if any.
    pub file: Option<String>,
    pub start_offset: usize,
    pub end_offset: usize,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    /// The source slice this extent covers.
    pub text: String,
}

impl SourceExtent {
    /// Returns the covered text cut to at most `max_chars` characters, with
    /// an ellipsis when it was truncated. Line breaks are shown as spaces.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdoc_markdown::extent::ExtentTracker;
    ///
    /// let text = "## Unexpected section heading";
    /// let mut tracker = ExtentTracker::new(None, text);
    /// let extent = tracker.extent(0, text.len());
    /// assert_eq!(extent.excerpt(13), "## Unexpected...");
    /// ```
    pub fn excerpt(&self, max_chars: usize) -> String {
        excerpt(&self.text, max_chars)
    }
}

pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.trim().replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

/// Incremental line/column calculator over one text.
#[derive(Debug, Clone)]
pub struct ExtentTracker<'a> {
    file: Option<String>,
    text: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> ExtentTracker<'a> {
    pub fn new(file: Option<&str>, text: &'a str) -> Self {
        Self {
            file: file.map(String::from),
            text,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Current `(line, column)` of the cursor.
    pub fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    fn advance_to(&mut self, offset: usize) {
        let offset = offset.min(self.text.len());
        if offset < self.offset {
            // Requests are expected to move forward; rewinding restarts the walk.
            self.offset = 0;
            self.line = 1;
            self.column = 1;
        }
        for ch in self.text[self.offset..offset].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset = offset;
    }

    /// Computes the extent of `text[start..end]` and leaves the cursor at `end`.
    ///
    /// Both offsets must fall on character boundaries.
    pub fn extent(&mut self, start: usize, end: usize) -> SourceExtent {
        let end = end.max(start);
        self.advance_to(start);
        let (start_line, start_column) = self.position();
        self.advance_to(end);
        let (end_line, end_column) = self.position();

        SourceExtent {
            file: self.file.clone(),
            start_offset: start,
            end_offset: self.offset,
            start_line,
            start_column,
            end_line,
            end_column,
            text: self.text[start.min(self.offset)..self.offset].to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_tracks_lines_and_columns() {
        let text = "# Get-Foo\n\n## SYNOPSIS\nThis is Synopsis\n";
        let mut tracker = ExtentTracker::new(Some("Get-Foo.md"), text);

        let heading = tracker.extent(11, 22);
        assert_eq!(heading.text, "## SYNOPSIS");
        assert_eq!((heading.start_line, heading.start_column), (3, 1));
        assert_eq!((heading.end_line, heading.end_column), (3, 12));
        assert_eq!(heading.file.as_deref(), Some("Get-Foo.md"));

        let body = tracker.extent(23, 39);
        assert_eq!(body.text, "This is Synopsis");
        assert_eq!(body.start_line, 4);
    }

    #[test]
    fn test_extent_counts_columns_in_characters() {
        let text = "é = x";
        let mut tracker = ExtentTracker::new(None, text);
        let extent = tracker.extent(3, text.len());
        assert_eq!(extent.text, " x");
        assert_eq!(extent.start_column, 2);
    }

    #[test]
    fn test_extent_rewind_restarts_walk() {
        let text = "a\nb\nc";
        let mut tracker = ExtentTracker::new(None, text);
        let _ = tracker.extent(4, 5);
        let early = tracker.extent(2, 3);
        assert_eq!((early.start_line, early.start_column), (2, 1));
    }

    #[test]
    fn test_excerpt_flattens_line_breaks() {
        let text = "line one\nline two\n";
        let mut tracker = ExtentTracker::new(None, text);
        let extent = tracker.extent(0, text.len());
        assert_eq!(extent.excerpt(50), "line one line two");
    }
}

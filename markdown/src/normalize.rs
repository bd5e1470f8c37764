//! Input normalization and front-matter extraction.
//!
//! Documents may arrive with Windows or classic Mac line endings and may
//! start with a YAML-style header block:
//!
//! ```text
//! ---
//! external help file: Demo-help.xml
//! Module Name: Demo
//! ---
//! ```
//!
//! Header lines are split at the first `:` into ordered key/value pairs.
//! A header without a closing `---` is not a header; the text is parsed as
//! ordinary content.

use std::borrow::Cow;

use cmdoc_core::Metadata;
use tracing::debug;

/// Converts `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Offset of the first non-whitespace character at or after `from`.
pub(crate) fn skip_whitespace(text: &str, from: usize) -> usize {
    let rest = &text[from..];
    from + (rest.len() - rest.trim_start().len())
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == "---"
}

/// Splits a front-matter header off the start of `text`.
///
/// Returns the header entries and the offset where the body begins. When
/// there is no complete header the metadata is empty and the offset is 0.
///
/// # Examples
///
/// ```
/// use cmdoc_markdown::split_front_matter;
///
/// let text = "---\nModule Name: Demo\nschema: 2.0.0\n---\n# Get-Foo\n";
/// let (metadata, body) = split_front_matter(text);
/// assert_eq!(metadata.get("module name"), Some("Demo"));
/// assert_eq!(&text[body..], "# Get-Foo\n");
/// ```
pub fn split_front_matter(text: &str) -> (Metadata, usize) {
    let mut metadata = Metadata::new();

    let mut lines = text.split_inclusive('\n');
    match lines.next() {
        Some(first) if is_delimiter(first) => {}
        _ => return (metadata, 0),
    }

    let mut offset = text.split_inclusive('\n').next().map_or(0, str::len);
    for line in lines {
        offset += line.len();
        if is_delimiter(line) {
            debug!(entries = metadata.len(), "Parsed front matter");
            return (metadata, offset);
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) => metadata.insert(key.trim(), value.trim()),
            None => debug!(line, "Skipping front matter line without a key"),
        }
    }

    debug!("Front matter block is not terminated; treating it as content");
    (Metadata::new(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
        assert!(matches!(normalize_line_endings("a\nb"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_skip_whitespace() {
        assert_eq!(skip_whitespace("\n\n  # H", 0), 4);
        assert_eq!(skip_whitespace("abc", 3), 3);
    }

    #[test]
    fn test_front_matter_keeps_order_and_colons_in_values() {
        let text = "---\nonline version: https://example.com/x\nschema: 2.0.0\n---\n\n# Get-Foo";
        let (metadata, body) = split_front_matter(text);
        let entries: Vec<_> = metadata.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("online version", "https://example.com/x"),
                ("schema", "2.0.0")
            ]
        );
        assert_eq!(&text[body..], "\n# Get-Foo");
    }

    #[test]
    fn test_front_matter_without_closing_delimiter_is_content() {
        let text = "---\nschema: 2.0.0\n# Get-Foo\n";
        let (metadata, body) = split_front_matter(text);
        assert!(metadata.is_empty());
        assert_eq!(body, 0);
    }

    #[test]
    fn test_front_matter_skips_lines_without_colon() {
        let text = "---\nschema: 2.0.0\njust text\n---\n# Get-Foo\n";
        let (metadata, _) = split_front_matter(text);
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.get("schema"), Some("2.0.0"));
    }

    #[test]
    fn test_no_front_matter() {
        let (metadata, body) = split_front_matter("# Get-Foo\n");
        assert!(metadata.is_empty());
        assert_eq!(body, 0);
    }
}

//! Ordered lexical rules and earliest-match selection.
//!
//! Each rule is a regex searched from the current offset over the whole
//! text, so `^` anchors and `\b` boundaries see the real preceding context.
//! The winning match is the one with the smallest start offset; ties go to
//! the rule declared first.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::ast::LexicalMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RuleKind {
    HashHeading,
    UnderlineHeading,
    CodeFence,
    ParagraphBreak,
    HardBreak,
    SoftBreak,
    Escape,
    Hyperlink,
    Bold,
    Italic,
}

pub(crate) struct Rule {
    pub(crate) kind: RuleKind,
    regex: Regex,
}

impl Rule {
    fn new(kind: RuleKind, pattern: &str) -> Self {
        // Patterns are compile-time constants; a failure is a programmer error.
        Self {
            kind,
            regex: Regex::new(pattern).expect("static regex must compile"),
        }
    }
}

/// Rule table for one lexical mode, in declaration order.
pub(crate) struct RuleSet {
    rules: Vec<Rule>,
}

static FULL_RULES: LazyLock<RuleSet> = LazyLock::new(|| RuleSet::build(LexicalMode::Full));
static PRESERVE_RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::build(LexicalMode::FormattingPreserve));

impl RuleSet {
    pub(crate) fn for_mode(mode: LexicalMode) -> &'static RuleSet {
        match mode {
            LexicalMode::Full => &FULL_RULES,
            LexicalMode::FormattingPreserve => &PRESERVE_RULES,
        }
    }

    fn build(mode: LexicalMode) -> Self {
        let mut rules = vec![
            // "## Title" plus any blank lines after it
            Rule::new(
                RuleKind::HashHeading,
                r"(?m)^(#{1,6})[ \t]+([^\n]*?)[ \t]*(?:\n|\z)((?:[ \t]*\n)*)",
            ),
            // "Title" over a line of === or ---
            Rule::new(
                RuleKind::UnderlineHeading,
                r"(?m)^([^\n#`> \t][^\n]*)\n(=+|-+)[ \t]*(?:\n|\z)((?:[ \t]*\n)*)",
            ),
            // ```lang ... ``` with a verbatim body
            Rule::new(
                RuleKind::CodeFence,
                r"(?ms)^```[ \t]*([^\s`]*)[^\n]*\n(.*?)^```[ \t]*(?:\n|\z)((?:[ \t]*\n)*)",
            ),
            Rule::new(RuleKind::ParagraphBreak, r"[ \t]*\n(?:[ \t]*\n)+"),
        ];

        if mode == LexicalMode::Full {
            rules.extend([
                Rule::new(RuleKind::HardBreak, r" {2,}\n"),
                Rule::new(RuleKind::SoftBreak, r"[ \t]*\n[ \t]*"),
                Rule::new(RuleKind::Escape, r"\\[<>\[\]()`_*\\]"),
                Rule::new(RuleKind::Hyperlink, r"\[([^\]\n]*)\]\(([^)\n]*)\)"),
                Rule::new(RuleKind::Bold, r"\*\*([^\n]+?)\*\*|\b__([^\n]+?)__\b"),
                Rule::new(RuleKind::Italic, r"\*([^*\n]+?)\*|\b_([^_\n]+?)_\b"),
            ]);
        }

        Self { rules }
    }

    pub(crate) fn len(&self) -> usize {
        self.rules.len()
    }
}

/// A rule hit: the rule kind plus its captures over the full text.
#[derive(Debug)]
pub(crate) struct RuleMatch<'t> {
    pub(crate) kind: RuleKind,
    pub(crate) captures: Captures<'t>,
}

impl<'t> RuleMatch<'t> {
    pub(crate) fn start(&self) -> usize {
        self.captures.get(0).map_or(0, |m| m.start())
    }

    pub(crate) fn end(&self) -> usize {
        self.captures.get(0).map_or(0, |m| m.end())
    }

    /// Text of capture group `index`, or `""` when it did not participate.
    pub(crate) fn group(&self, index: usize) -> &'t str {
        self.captures.get(index).map_or("", |m| m.as_str())
    }

    /// Offset where capture group `index` starts, falling back to the match end.
    pub(crate) fn group_start(&self, index: usize) -> usize {
        self.captures.get(index).map_or(self.end(), |m| m.start())
    }
}

/// Picks the winning candidate: smallest start, earliest declaration on ties.
///
/// `candidates` yields `(declaration index, start offset)` pairs in
/// declaration order.
pub(crate) fn select_earliest(
    candidates: impl IntoIterator<Item = (usize, usize)>,
) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (index, start) in candidates {
        if best.is_none_or(|(_, best_start)| start < best_start) {
            best = Some((index, start));
        }
    }
    best.map(|(index, _)| index)
}

enum Lookahead<'t> {
    Unknown,
    Exhausted,
    Found(Captures<'t>),
}

/// Walks one text with a [`RuleSet`], remembering each rule's next match.
///
/// A remembered match stays valid while it starts at or after the current
/// offset: the regex would find the same leftmost match again. This keeps a
/// full scan linear in the number of rule hits instead of re-searching the
/// remaining text for every rule at every step.
pub(crate) struct Scanner<'t> {
    rules: &'static RuleSet,
    text: &'t str,
    lookahead: Vec<Lookahead<'t>>,
}

impl<'t> Scanner<'t> {
    pub(crate) fn new(mode: LexicalMode, text: &'t str) -> Self {
        let rules = RuleSet::for_mode(mode);
        Self {
            rules,
            text,
            lookahead: (0..rules.len()).map(|_| Lookahead::Unknown).collect(),
        }
    }

    fn refresh(&mut self, index: usize, pos: usize) {
        let stale = match &self.lookahead[index] {
            Lookahead::Unknown => true,
            Lookahead::Exhausted => false,
            Lookahead::Found(captures) => captures.get(0).is_none_or(|m| m.start() < pos),
        };
        if stale {
            self.lookahead[index] = match self.rules.rules[index].regex.captures_at(self.text, pos) {
                Some(captures) if captures.get(0).is_some_and(|m| !m.is_empty()) => {
                    Lookahead::Found(captures)
                }
                _ => Lookahead::Exhausted,
            };
        }
    }

    fn start_of(&self, index: usize) -> Option<usize> {
        match &self.lookahead[index] {
            Lookahead::Found(captures) => captures.get(0).map(|m| m.start()),
            _ => None,
        }
    }

    /// Returns the earliest rule match at or after `pos`.
    pub(crate) fn next_match(&mut self, pos: usize) -> Option<RuleMatch<'t>> {
        let mut candidates = Vec::with_capacity(self.rules.len());
        for index in 0..self.rules.len() {
            self.refresh(index, pos);
            if let Some(start) = self.start_of(index) {
                candidates.push((index, start));
                if start == pos {
                    // Nothing declared later can beat a match at the cursor.
                    break;
                }
            }
        }

        let winner = select_earliest(candidates)?;
        let Lookahead::Found(captures) =
            std::mem::replace(&mut self.lookahead[winner], Lookahead::Unknown)
        else {
            return None;
        };
        Some(RuleMatch {
            kind: self.rules.rules[winner].kind,
            captures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(mode: LexicalMode, text: &str) -> Vec<(RuleKind, usize)> {
        let mut scanner = Scanner::new(mode, text);
        let mut pos = 0;
        let mut out = Vec::new();
        while let Some(m) = scanner.next_match(pos) {
            out.push((m.kind, m.start()));
            pos = m.end();
        }
        out
    }

    #[test]
    fn test_select_earliest_prefers_declaration_order_on_ties() {
        assert_eq!(select_earliest([(0, 5), (1, 3), (2, 3)]), Some(1));
        assert_eq!(select_earliest(Vec::new()), None);
    }

    #[test]
    fn test_heading_and_paragraph_break() {
        let text = "# Title\n\nSome text\n\nMore";
        assert_eq!(
            kinds(LexicalMode::Full, text),
            vec![(RuleKind::HashHeading, 0), (RuleKind::ParagraphBreak, 18)]
        );
    }

    #[test]
    fn test_hash_requires_line_start() {
        let text = "text # not a heading";
        assert!(kinds(LexicalMode::Full, text).is_empty());
    }

    #[test]
    fn test_fence_body_hides_inline_rules() {
        let text = "```powershell\nGet-Foo **bold**\n```\n";
        let mut scanner = Scanner::new(LexicalMode::Full, text);
        let m = scanner.next_match(0).expect("fence");
        assert_eq!(m.kind, RuleKind::CodeFence);
        assert_eq!(m.group(1), "powershell");
        assert_eq!(m.group(2), "Get-Foo **bold**\n");
        assert_eq!(m.end(), text.len());
    }

    #[test]
    fn test_inline_rules_in_full_mode() {
        let text = "a **b** *c* [d](e) \\* f  \ng\nh";
        assert_eq!(
            kinds(LexicalMode::Full, text),
            vec![
                (RuleKind::Bold, 2),
                (RuleKind::Italic, 8),
                (RuleKind::Hyperlink, 12),
                (RuleKind::Escape, 19),
                (RuleKind::HardBreak, 23),
                (RuleKind::SoftBreak, 27),
            ]
        );
    }

    #[test]
    fn test_preserve_mode_ignores_inline_syntax() {
        let text = "a **b**\n[d](e)\n\n## H\n";
        assert_eq!(
            kinds(LexicalMode::FormattingPreserve, text),
            vec![(RuleKind::ParagraphBreak, 14), (RuleKind::HashHeading, 16)]
        );
    }

    #[test]
    fn test_underline_heading() {
        let text = "Title\n=====\n\nBody";
        let mut scanner = Scanner::new(LexicalMode::Full, text);
        let m = scanner.next_match(0).expect("heading");
        assert_eq!(m.kind, RuleKind::UnderlineHeading);
        assert_eq!(m.group(1), "Title");
        assert_eq!(m.group(2), "=====");
        assert_eq!(m.group(3), "\n");
    }

    #[test]
    fn test_lookahead_is_refreshed_after_overlap() {
        // The italic candidate inside the bold span must not survive.
        let text = "x **a *b* c** *d*";
        assert_eq!(
            kinds(LexicalMode::Full, text),
            vec![(RuleKind::Bold, 2), (RuleKind::Italic, 14)]
        );
    }
}

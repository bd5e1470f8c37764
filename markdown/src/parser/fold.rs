//! Text helpers shared by both lexical modes: escape unwinding and
//! list-aware line folding.

/// Characters that may be escaped with a backslash in full mode.
const ESCAPABLE: &[char] = &['<', '>', '[', ']', '(', ')', '`', '_', '*', '\\'];

/// Replaces `\x` escape sequences with the literal `x`.
///
/// Backslashes before other characters are kept as written.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\'
            && let Some(&next) = chars.peek()
            && ESCAPABLE.contains(&next)
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(ch);
    }
    out
}

/// Returns `true` for lines that start a list item (`--`, `- ` or `* `).
pub(crate) fn is_list_item(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("--") || line.starts_with("- ") || line.starts_with("* ")
}

#[derive(Debug, Default)]
struct FoldState {
    out: String,
    started: bool,
    in_list: bool,
}

fn fold_line(mut state: FoldState, line: &str) -> FoldState {
    let list_item = is_list_item(line);
    if state.started {
        // A break next to a list line is structural; anything else is a wrap.
        state.out.push(if list_item || state.in_list { '\n' } else { ' ' });
    }
    state.out.push_str(line);
    state.started = true;
    // Indented continuation lines stay part of the list they follow.
    state.in_list = list_item || (state.in_list && line.starts_with([' ', '\t']));
    state
}

/// Folds a block of raw lines: single line breaks become spaces unless
/// either neighbouring line belongs to a list, in which case the break is
/// kept. Trailing line breaks are dropped.
///
/// # Examples
///
/// ```
/// use cmdoc_markdown::parser::fold_lines;
///
/// assert_eq!(fold_lines("one\ntwo\n"), "one two");
/// assert_eq!(fold_lines("Intro:\n- a\n- b"), "Intro:\n- a\n- b");
/// ```
pub fn fold_lines(text: &str) -> String {
    text.trim_end_matches('\n')
        .split('\n')
        .fold(FoldState::default(), fold_line)
        .out
}

//! renders positioned errors against their source
//!
//! Every pipeline error carries a 1-based byte offset. The formatter finds
//! the offending line, quotes it with a caret underneath, keeps tabs in
//! the caret's indentation so the alignment survives, and windows very
//! long lines around the caret.

use crate::Error;

/// how many bytes of a line are shown around the caret
const WINDOW: usize = 64;

pub fn format_error(error: &Error, source: &str, source_name: &str) -> String {
    let pos = error.position();
    let offset = pos.saturating_sub(1).min(source.len());

    let start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_no = source[..start].matches('\n').count() + 1;
    let end = source[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(source.len());
    let line = source[start..end].strip_suffix('\r').unwrap_or(&source[start..end]);

    // columns count within the line stripped of its leading whitespace
    let lead = line.len() - line.trim_start_matches([' ', '\t']).len();
    let content = &line[lead..];
    let col = offset.saturating_sub(start + lead).min(content.len());

    let (shown, caret_col) = window(content, col);
    let mut caret_col = caret_col.min(shown.len());
    while caret_col > 0 && !shown.is_char_boundary(caret_col) {
        caret_col -= 1;
    }
    let caret_indent: String = shown[..caret_col]
        .chars()
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();

    format!(
        "{source_name}:{line_no}: {error}\n  {shown}\n  {caret_indent}^\n"
    )
}

/// clips a long line to a fixed window centered on the caret, marking the
/// cut sides with ellipses. Returns the rendered line and the caret's
/// byte offset within it
fn window(content: &str, col: usize) -> (String, usize) {
    if content.len() <= WINDOW {
        return (content.to_owned(), col);
    }
    let mut from = col.saturating_sub(WINDOW / 2);
    if from + WINDOW > content.len() {
        from = content.len() - WINDOW;
    }
    let mut to = from + WINDOW;
    while from < content.len() && !content.is_char_boundary(from) {
        from += 1;
    }
    while to > from && !content.is_char_boundary(to) {
        to -= 1;
    }
    let mut shown = String::new();
    let mut caret = col - from;
    if from > 0 {
        shown.push_str("...");
        caret += 3;
    }
    shown.push_str(&content[from..to]);
    if to < content.len() {
        shown.push_str("...");
    }
    (shown, caret)
}

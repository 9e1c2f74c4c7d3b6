//! Splits long input into chunks that fit a model's character budget.
//!
//! Chunks are cut at the best natural boundary found in the last 20% of each window,
//! so most chunks end on a paragraph, sentence or word break. The split is a pure
//! function of `(text, max_chars)`; cache keys depend on it being stable.
//!
//! Sizes are counted in Unicode scalar values (`char`), never bytes, so cuts always
//! land on character boundaries.

use std::borrow::Cow;

/// Boundary markers in priority order. The first marker type with any occurrence in
/// the search range wins, even if a lower-priority marker occurs later.
pub const BOUNDARY_MARKERS: &[&str] = &[
    "\n\n",     // paragraph break
    "\u{0964}", // devanagari danda
    "\u{3002}", // ideographic full stop
    "\u{FF0E}", // fullwidth full stop
    ".",
    "\n",
    " ",
];

/// Search range start, as a fraction of the window: `floor(max_chars * 4 / 5)`.
fn search_start(max_chars: usize) -> usize {
    max_chars * 4 / 5
}

/// Replaces `\r\n` and lone `\r` with `\n`.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Byte offset of the `n`-th char, or `None` when `s` has `n` chars or fewer.
fn char_offset(s: &str, n: usize) -> Option<usize> {
    s.char_indices().nth(n).map(|(i, _)| i)
}

/// Byte offset just past the last occurrence of the highest-priority marker whose start
/// lies at or after `from` (a byte offset inside `window`).
fn find_cut(window: &str, from: usize) -> Option<usize> {
    let range = &window[from..];
    BOUNDARY_MARKERS
        .iter()
        .find_map(|marker| range.rfind(marker).map(|pos| from + pos + marker.len()))
}

/// Splits `text` into ordered chunks of at most `max_chars` characters each.
///
/// Line endings are normalized first; the chunks concatenate to exactly the
/// normalized text. Input that already fits yields one chunk, and empty input
/// yields one empty chunk. `max_chars == 0` is treated as 1.
pub fn segment(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let normalized = normalize_line_endings(text);
    let mut rest: &str = &normalized;
    let mut chunks = Vec::new();

    while let Some(window_end) = char_offset(rest, max_chars) {
        let window = &rest[..window_end];
        let from = char_offset(window, search_start(max_chars)).unwrap_or(window_end);
        let boundary = find_cut(window, from);
        let cut = boundary.unwrap_or(window_end);
        tracing::trace!(cut, hard = boundary.is_none(), "segment cut");
        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    chunks.push(rest.to_string());
    chunks
}

//! Codepoint arithmetic over byte offsets.
//!
//! Every cursor and selection offset in the document is a byte index into a
//! UTF-8 string; these helpers are the only place that knows how to step
//! such an index without splitting a multi-byte sequence.

/// Byte length of the codepoint starting at `pos`, or 0 at end of text.
///
/// `pos` must lie on a codepoint boundary.
pub fn next_len(s: &str, pos: usize) -> usize {
    s[pos..].chars().next().map_or(0, char::len_utf8)
}

/// Byte length of the codepoint ending at `pos`, or 0 at the start of text.
///
/// `pos` must lie on a codepoint boundary.
pub fn prev_len(s: &str, pos: usize) -> usize {
    s[..pos].chars().next_back().map_or(0, char::len_utf8)
}

/// Snap an arbitrary byte offset down to the nearest codepoint boundary.
pub fn floor_boundary(s: &str, mut pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Number of codepoints between two byte offsets (both on boundaries).
pub fn count_between(s: &str, start: usize, end: usize) -> usize {
    s[start..end].chars().count()
}

/// Advance `start` by `n` codepoints, never moving past `s.len()`.
pub fn advance_by(s: &str, start: usize, n: usize) -> usize {
    let mut pos = start;
    for _ in 0..n {
        let len = next_len(s, pos);
        if len == 0 {
            break;
        }
        pos += len;
    }
    pos
}

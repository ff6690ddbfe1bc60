//! Document model: the text buffer plus everything the editor knows about
//! it — cursor, selection anchor, edit mode, scroll window, dirty state, and
//! the derived token stream.
//!
//! All public offsets are byte offsets into the UTF-8 text and are kept on
//! codepoint boundaries. After every mutation the whole buffer is
//! re-tokenized; tokens and the flat text snapshot are derived data, never
//! edited directly.

use std::path::{Path, PathBuf};

use ropey::Rope;
use tracing::debug;

use crate::core::clipboard::Clipboard;
use crate::core::markup::{self, Format, Token, BULLET};
use crate::core::persistence::{self, PersistError};
use crate::core::utf8;

/// Editing mode. Insert has a bare caret; Select carries an anchor and the
/// active range `[min(cursor, anchor), max(cursor, anchor))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Insert,
    Select,
}

/// Characters that terminate word-granularity scans.
fn is_word_stop(c: char) -> bool {
    matches!(
        c,
        '\n' | ' '
            | '\t'
            | '('
            | ')'
            | '{'
            | '}'
            | '['
            | ']'
            | '<'
            | '>'
            | ','
            | '.'
            | ';'
            | ':'
            | '!'
            | '?'
            | '"'
            | '\''
            | '-'
            | '_'
            | '+'
            | '='
            | '*'
            | '/'
            | '%'
            | '&'
            | '|'
            | '^'
            | '~'
            | '\\'
            | '`'
    )
}

/// A markup note open for editing.
#[derive(Debug, Clone)]
pub struct Document {
    rope: Rope,
    /// Flat snapshot of the rope, rebuilt with the tokens after each edit.
    text: String,
    tokens: Vec<Token>,
    path: Option<PathBuf>,
    cursor: usize,
    anchor: usize,
    mode: Mode,
    row_start: usize,
    row_max: usize,
    modified: bool,
    /// Auto-insert matching closers for typed markup delimiters.
    pub auto_pair: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::from_text(String::new())
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut doc = Self {
            rope: Rope::from_str(&text),
            text: String::new(),
            tokens: Vec::new(),
            path: None,
            cursor: 0,
            anchor: 0,
            mode: Mode::Insert,
            row_start: 0,
            row_max: usize::MAX,
            modified: false,
            auto_pair: true,
        };
        doc.sync();
        doc
    }

    /// Open a file, normalizing CRLF line endings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let text = persistence::read_text(path)?;
        let mut doc = Self::from_text(text);
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    // ==================== Accessors ====================

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn anchor(&self) -> usize {
        self.anchor
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn scroll_row_start(&self) -> usize {
        self.row_start
    }

    /// Active selection as `[start, end)`, when in Select mode.
    pub fn selection(&self) -> Option<(usize, usize)> {
        match self.mode {
            Mode::Select => Some((
                self.cursor.min(self.anchor),
                self.cursor.max(self.anchor),
            )),
            Mode::Insert => None,
        }
    }

    pub fn selected_text(&self) -> Option<String> {
        self.selection()
            .map(|(start, end)| self.text[start..end].to_string())
    }

    /// The token whose logical span covers the cursor. Falls back to the
    /// last token, or a line break for an empty stream.
    pub fn token_at_cursor(&self) -> Token {
        let mut idx = 0;
        for token in &self.tokens {
            idx += token.logical_len();
            if idx >= self.cursor {
                return token.clone();
            }
        }
        self.tokens.last().cloned().unwrap_or(Token::NewLine)
    }

    // ==================== Editing ====================

    /// Typed input. Replaces any selection, then inserts. A single typed
    /// delimiter gets its closer auto-inserted (cursor between the pair)
    /// unless the cursor sits in a code run or right after a backslash;
    /// a `-` opening a line becomes a bullet.
    pub fn insert(&mut self, input: &str) {
        if self.mode == Mode::Select {
            self.select_erase_exit();
        }
        if self.auto_pair && !self.in_code_run() && !self.after_backslash() {
            match input {
                "*" | "/" | "~" => {
                    let pair: String = [input, input].concat();
                    self.splice(self.cursor, &pair);
                    self.cursor += input.len();
                    self.touch();
                    return;
                }
                "[" => {
                    self.splice(self.cursor, "[]");
                    self.cursor += 1;
                    self.touch();
                    return;
                }
                "-" if self.at_hard_line_start() => {
                    self.splice(self.cursor, BULLET);
                    self.cursor += BULLET.len();
                    self.touch();
                    return;
                }
                _ => {}
            }
        }
        self.splice(self.cursor, input);
        self.cursor += input.len();
        self.touch();
    }

    /// Enter. Replaces any selection, breaks the line, and continues an
    /// open code block (tab) or list (bullet) onto the new line.
    pub fn newline(&mut self) {
        if self.mode == Mode::Select {
            self.select_erase_exit();
        }
        let continuation = match self.token_at_cursor() {
            Token::Text { format, .. } if format.contains(Format::CODE) => Some("\t"),
            Token::Text { format, .. } if format.contains(Format::LIST) => Some(BULLET),
            _ => None,
        };
        self.splice(self.cursor, "\n");
        self.cursor += 1;
        if let Some(cont) = continuation {
            self.splice(self.cursor, cont);
            self.cursor += cont.len();
        }
        self.touch();
    }

    /// Tab. Replaces any selection.
    pub fn tab(&mut self) {
        if self.mode == Mode::Select {
            self.select_erase_exit();
        }
        self.splice(self.cursor, "\t");
        self.cursor += 1;
        self.touch();
    }

    /// Backspace. With a selection active, erases it instead. Word mode
    /// deletes back to (and including) the first word-stop character.
    pub fn backspace(&mut self, word_mode: bool) {
        if self.mode == Mode::Select {
            self.select_erase_exit();
            self.touch();
            return;
        }
        if self.cursor == 0 {
            return;
        }
        let target = if word_mode {
            self.word_jump_back()
        } else {
            self.cursor - utf8::prev_len(&self.text, self.cursor)
        };
        self.erase(target, self.cursor);
        self.cursor = target;
        self.touch();
    }

    /// Delete the active selection, park the cursor at its lower bound,
    /// and drop back to Insert mode.
    pub fn select_erase_exit(&mut self) {
        if let Some((start, end)) = self.selection() {
            self.erase(start, end);
            self.cursor = start;
            // derived state is refreshed here because callers query tokens
            // between this erase and their own edit
            self.text = self.rope.to_string();
            self.tokens = markup::parse(&self.text);
        }
        self.mode = Mode::Insert;
        self.clamp_cursor();
    }

    pub fn select_all(&mut self) {
        self.mode = Mode::Select;
        self.anchor = 0;
        self.cursor = self.len();
    }

    // ==================== Clipboard ====================

    /// Copy the selection out; collapses the selection to its anchor.
    pub fn copy(&mut self, clipboard: &mut dyn Clipboard) {
        if let Some(text) = self.selected_text() {
            clipboard.set_text(text);
            self.cursor = self.anchor;
            self.mode = Mode::Insert;
        }
    }

    /// Cut the selection out.
    pub fn cut(&mut self, clipboard: &mut dyn Clipboard) {
        if let Some(text) = self.selected_text() {
            clipboard.set_text(text);
            self.select_erase_exit();
            self.touch();
        }
    }

    /// Paste, replacing any selection. Pasted text is inserted verbatim;
    /// pairing only applies to typed input.
    pub fn paste(&mut self, clipboard: &dyn Clipboard) {
        if self.mode == Mode::Select {
            self.select_erase_exit();
        }
        let input = clipboard.get_text();
        self.splice(self.cursor, &input);
        self.cursor += input.len();
        self.touch();
    }

    // ==================== Navigation ====================

    /// Horizontal move. Word mode jumps to the next word-stop character; a
    /// line break stops the scan unconsumed unless it is the codepoint
    /// directly at the cursor.
    pub fn move_left(&mut self, word_mode: bool, extend: bool) {
        if self.cursor == 0 {
            return;
        }
        self.begin_move(extend);
        self.cursor = if word_mode {
            self.word_jump_back()
        } else {
            self.cursor - utf8::prev_len(&self.text, self.cursor)
        };
        self.clamp_scroll();
    }

    pub fn move_right(&mut self, word_mode: bool, extend: bool) {
        if self.cursor >= self.len() {
            return;
        }
        self.begin_move(extend);
        self.cursor = if word_mode {
            self.word_jump_fwd()
        } else {
            self.cursor + utf8::next_len(&self.text, self.cursor)
        };
        self.clamp_scroll();
    }

    /// Move up one hard line, preserving the column as a codepoint count
    /// and clamping to the target line's length.
    pub fn move_up(&mut self, extend: bool) {
        if self.cursor == 0 {
            return;
        }
        self.begin_move(extend);
        let line = self.rope.byte_to_line(self.cursor);
        if line == 0 {
            self.cursor = 0;
            self.clamp_scroll();
            return;
        }
        let line_start = self.rope.line_to_byte(line);
        let col = utf8::count_between(&self.text, line_start, self.cursor);
        let prev_start = self.rope.line_to_byte(line - 1);
        let prev_end = line_start - 1; // the newline
        let prev_len = utf8::count_between(&self.text, prev_start, prev_end);
        self.cursor = utf8::advance_by(&self.text, prev_start, col.min(prev_len));
        self.clamp_scroll();
    }

    /// Move down one hard line; same column-clamping policy as `move_up`.
    pub fn move_down(&mut self, extend: bool) {
        if self.cursor >= self.len() {
            return;
        }
        self.begin_move(extend);
        let line = self.rope.byte_to_line(self.cursor);
        if line + 1 >= self.rope.len_lines() {
            self.cursor = self.len();
            self.clamp_scroll();
            return;
        }
        let line_start = self.rope.line_to_byte(line);
        let col = utf8::count_between(&self.text, line_start, self.cursor);
        let next_start = self.rope.line_to_byte(line + 1);
        let next_end = self.text[next_start..]
            .find('\n')
            .map_or(self.len(), |i| next_start + i);
        let next_len = utf8::count_between(&self.text, next_start, next_end);
        self.cursor = utf8::advance_by(&self.text, next_start, col.min(next_len));
        self.clamp_scroll();
    }

    /// Home. `whole_document` jumps to the start of the buffer.
    pub fn line_start(&mut self, extend: bool, whole_document: bool) {
        self.begin_move(extend);
        self.cursor = if whole_document {
            0
        } else {
            let line = self.rope.byte_to_line(self.cursor);
            self.rope.line_to_byte(line)
        };
        self.clamp_scroll();
    }

    /// End. `whole_document` jumps to the end of the buffer.
    pub fn line_end(&mut self, extend: bool, whole_document: bool) {
        self.begin_move(extend);
        self.cursor = if whole_document {
            self.len()
        } else {
            self.text[self.cursor..]
                .find('\n')
                .map_or(self.len(), |i| self.cursor + i)
        };
        self.clamp_scroll();
    }

    /// Place the cursor at an absolute offset (pick resolution, tests).
    /// Clamps to the buffer and snaps to a codepoint boundary.
    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = utf8::floor_boundary(&self.text, pos);
        self.clamp_scroll();
    }

    /// A pointer press collapses any selection before the pick resolves.
    pub fn begin_click(&mut self) {
        self.mode = Mode::Insert;
    }

    // ==================== Scrolling ====================

    /// Wheel scrolling; positive rows scroll the window down.
    pub fn scroll_by(&mut self, rows: i32) {
        if rows < 0 {
            self.row_start = self.row_start.saturating_sub(rows.unsigned_abs() as usize);
        } else {
            self.row_start += rows as usize;
        }
    }

    /// Feed back the visible-row capacity measured by the last layout pass.
    pub fn set_row_max(&mut self, rows: usize) {
        self.row_max = rows;
    }

    // ==================== Persistence ====================

    /// Write the buffer to its file. The in-memory state is untouched on
    /// failure and the document stays dirty.
    pub fn save(&mut self) -> Result<(), PersistError> {
        let path = self.path.clone().ok_or(PersistError::NoPath)?;
        persistence::write_text(&path, &self.text)?;
        self.modified = false;
        Ok(())
    }

    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        self.path = Some(path.as_ref().to_path_buf());
        self.save()
    }

    // ==================== Internals ====================

    fn splice(&mut self, pos: usize, input: &str) {
        if input.is_empty() {
            return;
        }
        let char_idx = self.rope.byte_to_char(pos.min(self.rope.len_bytes()));
        self.rope.insert(char_idx, input);
    }

    fn erase(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let start_char = self.rope.byte_to_char(start);
        let end_char = self.rope.byte_to_char(end.min(self.rope.len_bytes()));
        self.rope.remove(start_char..end_char);
    }

    /// Rebuild derived state and re-clamp after a mutation.
    fn touch(&mut self) {
        self.modified = true;
        self.sync();
        self.clamp_cursor();
        self.clamp_scroll();
    }

    fn sync(&mut self) {
        self.text = self.rope.to_string();
        self.tokens = markup::parse(&self.text);
        debug!(
            bytes = self.text.len(),
            tokens = self.tokens.len(),
            "reparsed buffer"
        );
    }

    fn clamp_cursor(&mut self) {
        if self.cursor > self.len() {
            self.cursor = self.len();
        }
        self.cursor = utf8::floor_boundary(&self.text, self.cursor);
    }

    /// Keep the cursor's hard row inside the scroll window.
    fn clamp_scroll(&mut self) {
        let row = self.rope.byte_to_line(self.cursor.min(self.rope.len_bytes()));
        if row > self.row_max {
            self.row_start += row - self.row_max;
        } else if row < self.row_start {
            self.row_start = row;
        }
    }

    fn begin_move(&mut self, extend: bool) {
        if extend {
            if self.mode == Mode::Insert {
                self.mode = Mode::Select;
                self.anchor = self.cursor;
            }
        } else {
            self.mode = Mode::Insert;
        }
    }

    fn word_jump_back(&self) -> usize {
        let mut i = self.cursor;
        while i > 0 {
            let len = utf8::prev_len(&self.text, i);
            let ch = self.text[i - len..i].chars().next().unwrap_or('\0');
            if ch == '\n' && i != self.cursor {
                break;
            }
            i -= len;
            if is_word_stop(ch) {
                break;
            }
        }
        i
    }

    fn word_jump_fwd(&self) -> usize {
        let mut i = self.cursor;
        while i < self.len() {
            let len = utf8::next_len(&self.text, i);
            let ch = self.text[i..i + len].chars().next().unwrap_or('\0');
            if ch == '\n' && i != self.cursor {
                break;
            }
            i += len;
            if is_word_stop(ch) {
                break;
            }
        }
        i
    }

    fn in_code_run(&self) -> bool {
        matches!(
            self.token_at_cursor(),
            Token::Text { format, .. } if format.contains(Format::CODE)
        )
    }

    fn after_backslash(&self) -> bool {
        let len = utf8::prev_len(&self.text, self.cursor);
        len == 1 && self.text.as_bytes()[self.cursor - 1] == b'\\'
    }

    fn at_hard_line_start(&self) -> bool {
        self.cursor == 0 || self.text.as_bytes()[self.cursor - 1] == b'\n'
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clipboard::LocalClipboard;

    fn doc(text: &str) -> Document {
        Document::from_text(text)
    }

    #[test]
    fn test_plain_insert_advances_cursor() {
        let mut d = Document::new();
        d.insert("hi");
        assert_eq!(d.text(), "hi");
        assert_eq!(d.cursor(), 2);
        assert!(d.is_modified());
    }

    #[test]
    fn test_auto_pairing_leaves_cursor_between() {
        let mut d = Document::new();
        d.insert("*");
        assert_eq!(d.text(), "**");
        assert_eq!(d.cursor(), 1);

        let mut d = Document::new();
        d.insert("[");
        assert_eq!(d.text(), "[]");
        assert_eq!(d.cursor(), 1);
    }

    #[test]
    fn test_dash_becomes_bullet_at_line_start() {
        let mut d = Document::new();
        d.insert("-");
        assert_eq!(d.text(), BULLET);
        assert_eq!(d.cursor(), BULLET.len());

        let mut d = doc("x");
        d.set_cursor(1);
        d.insert("-");
        assert_eq!(d.text(), "x-");
    }

    #[test]
    fn test_pairing_suppressed_in_code_run() {
        let mut d = doc("\tcode");
        d.set_cursor(3);
        d.insert("*");
        assert_eq!(d.text(), "\tco*de");
    }

    #[test]
    fn test_pairing_suppressed_after_backslash() {
        let mut d = doc("\\");
        d.set_cursor(1);
        d.insert("*");
        assert_eq!(d.text(), "\\*");
        assert_eq!(d.cursor(), 2);
    }

    #[test]
    fn test_pairing_can_be_disabled() {
        let mut d = Document::new();
        d.auto_pair = false;
        d.insert("*");
        assert_eq!(d.text(), "*");
    }

    #[test]
    fn test_backspace_char_and_boundary_noop() {
        let mut d = doc("ab");
        d.set_cursor(2);
        d.backspace(false);
        assert_eq!(d.text(), "a");
        d.backspace(false);
        assert_eq!(d.text(), "");
        d.backspace(false); // at offset 0: no-op
        assert_eq!(d.text(), "");
    }

    #[test]
    fn test_backspace_removes_whole_codepoint() {
        let mut d = doc("a🌍");
        d.set_cursor(5);
        d.backspace(false);
        assert_eq!(d.text(), "a");
        assert_eq!(d.cursor(), 1);
    }

    #[test]
    fn test_backspace_word_eats_to_boundary() {
        let mut d = doc("foo bar");
        d.set_cursor(7);
        d.backspace(true);
        // removes "bar" and the space boundary
        assert_eq!(d.text(), "foo");
        assert_eq!(d.cursor(), 3);
    }

    #[test]
    fn test_backspace_word_stops_before_mid_scan_newline() {
        let mut d = doc("ab\ncd");
        d.set_cursor(5);
        d.backspace(true);
        assert_eq!(d.text(), "ab\n");

        // directly after the newline, the newline itself is consumed
        let mut d = doc("ab\ncd");
        d.set_cursor(3);
        d.backspace(true);
        assert_eq!(d.text(), "abcd");
    }

    #[test]
    fn test_word_moves_share_boundary_logic() {
        let mut d = doc("foo bar baz");
        d.set_cursor(11);
        d.move_left(true, false);
        assert_eq!(d.cursor(), 7);
        d.move_left(true, false);
        assert_eq!(d.cursor(), 3);
        d.move_right(true, false);
        assert_eq!(d.cursor(), 4);
        d.move_right(true, false);
        assert_eq!(d.cursor(), 8);
    }

    #[test]
    fn test_word_move_stops_at_newline_unconsumed() {
        let mut d = doc("ab\ncd");
        d.set_cursor(0);
        d.move_right(true, false);
        assert_eq!(d.cursor(), 2);
        // now the newline is directly at the cursor, so it is crossed
        d.move_right(true, false);
        assert_eq!(d.cursor(), 3);
    }

    #[test]
    fn test_vertical_move_clamps_to_shorter_line() {
        let mut d = doc("abcdef\nab\n");
        d.set_cursor(5);
        d.move_down(false);
        // column 5 clamps to the 2-codepoint second line: end of "ab"
        assert_eq!(d.cursor(), 9);
        d.move_up(false);
        assert_eq!(d.cursor(), 2);
    }

    #[test]
    fn test_vertical_move_counts_codepoints_not_bytes() {
        // first line is 3 codepoints / 7 bytes
        let mut d = doc("é€🌍x\nabc");
        d.set_cursor(5); // after '€': column 2
        d.move_down(false);
        assert_eq!(d.cursor(), 13); // "ab|c" — column 2 of the second line
        d.move_up(false);
        assert_eq!(d.cursor(), 5);
    }

    #[test]
    fn test_vertical_moves_at_buffer_edges() {
        let mut d = doc("ab\ncd");
        d.set_cursor(1);
        d.move_up(false);
        assert_eq!(d.cursor(), 0);
        d.set_cursor(4);
        d.move_down(false);
        assert_eq!(d.cursor(), 5);
    }

    #[test]
    fn test_cursor_stays_on_boundaries() {
        let text = "aé€🌍\n日本語\nx";
        let mut d = doc(text);
        d.set_cursor(text.len());
        for _ in 0..40 {
            d.move_left(false, false);
            assert!(text.is_char_boundary(d.cursor()));
        }
        for _ in 0..40 {
            d.move_right(true, false);
            assert!(text.is_char_boundary(d.cursor()));
        }
        for _ in 0..10 {
            d.move_up(true);
            assert!(text.is_char_boundary(d.cursor()));
            assert!(text.is_char_boundary(d.anchor()));
        }
    }

    #[test]
    fn test_selection_typing_collapses_and_replaces() {
        let mut d = doc("abcdef");
        d.set_cursor(2);
        for _ in 0..3 {
            d.move_right(false, true);
        }
        assert_eq!(d.selection(), Some((2, 5)));
        d.insert("X");
        assert_eq!(d.text(), "abXf");
        assert_eq!(d.cursor(), 3);
        assert_eq!(d.mode(), Mode::Insert);
    }

    #[test]
    fn test_unmodified_move_drops_selection() {
        let mut d = doc("abc");
        d.set_cursor(0);
        d.move_right(false, true);
        assert_eq!(d.mode(), Mode::Select);
        d.move_right(false, false);
        assert_eq!(d.mode(), Mode::Insert);
        assert_eq!(d.selection(), None);
    }

    #[test]
    fn test_select_all() {
        let mut d = doc("abc\ndef");
        d.select_all();
        assert_eq!(d.selection(), Some((0, 7)));
    }

    #[test]
    fn test_copy_collapses_to_anchor() {
        let mut d = doc("hello world");
        let mut clip = LocalClipboard::new();
        d.set_cursor(0);
        for _ in 0..5 {
            d.move_right(false, true);
        }
        d.copy(&mut clip);
        assert_eq!(clip.get_text(), "hello");
        assert_eq!(d.cursor(), 0);
        assert_eq!(d.mode(), Mode::Insert);
        assert_eq!(d.text(), "hello world");
    }

    #[test]
    fn test_cut_and_paste() {
        let mut d = doc("hello world");
        let mut clip = LocalClipboard::new();
        d.set_cursor(5);
        d.line_end(true, false);
        d.cut(&mut clip);
        assert_eq!(d.text(), "hello");
        assert_eq!(clip.get_text(), " world");

        d.line_start(false, false);
        d.paste(&clip);
        assert_eq!(d.text(), " worldhello");
        assert_eq!(d.cursor(), 6);
    }

    #[test]
    fn test_paste_is_verbatim_no_pairing() {
        let mut d = Document::new();
        let mut clip = LocalClipboard::new();
        clip.set_text("*".to_string());
        d.paste(&clip);
        assert_eq!(d.text(), "*");
    }

    #[test]
    fn test_enter_continues_code_block() {
        let mut d = doc("\tcode");
        d.set_cursor(5);
        d.newline();
        assert_eq!(d.text(), "\tcode\n\t");
        assert_eq!(d.cursor(), 7);
    }

    #[test]
    fn test_enter_continues_list() {
        let text = format!("{BULLET} item");
        let mut d = doc(&text);
        d.set_cursor(text.len());
        d.newline();
        assert_eq!(d.text(), format!("{BULLET} item\n{BULLET}"));
    }

    #[test]
    fn test_line_start_end_and_whole_document() {
        let mut d = doc("ab\ncd\nef");
        d.set_cursor(4);
        d.line_start(false, false);
        assert_eq!(d.cursor(), 3);
        d.line_end(false, false);
        assert_eq!(d.cursor(), 5);
        d.line_start(false, true);
        assert_eq!(d.cursor(), 0);
        d.line_end(false, true);
        assert_eq!(d.cursor(), 8);
    }

    #[test]
    fn test_token_at_cursor() {
        let d = doc("\tcode\nplain");
        let mut probe = d.clone();
        probe.set_cursor(2);
        assert!(matches!(
            probe.token_at_cursor(),
            Token::Text { format, .. } if format.contains(Format::CODE)
        ));
        probe.set_cursor(8);
        assert!(matches!(
            probe.token_at_cursor(),
            Token::Text { format, .. } if format == Format::empty()
        ));
    }

    #[test]
    fn test_scroll_clamp_follows_cursor() {
        let text = (0..20).map(|i| format!("line{i}\n")).collect::<String>();
        let mut d = doc(&text);
        d.set_row_max(5);
        d.set_cursor(0);
        assert_eq!(d.scroll_row_start(), 0);
        d.line_end(false, true); // row 20
        assert_eq!(d.scroll_row_start(), 15);
        d.line_start(false, true);
        assert_eq!(d.scroll_row_start(), 0);
    }

    #[test]
    fn test_scroll_by_clamps_at_top() {
        let mut d = doc("a\nb\nc");
        d.scroll_by(-3);
        assert_eq!(d.scroll_row_start(), 0);
        d.scroll_by(2);
        assert_eq!(d.scroll_row_start(), 2);
    }
}

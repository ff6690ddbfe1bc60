//! Markup tokenizer.
//!
//! A recursive-descent scanner that turns note text into a flat token
//! stream. The parser is total: malformed or unterminated markup degrades to
//! literal text instead of erroring, and every input byte lands in some
//! token's value. Concatenating the token values (one `"\n"` per `NewLine`)
//! reproduces the input exactly, which is what keeps token positions and
//! document byte offsets interchangeable.

use std::path::PathBuf;

use bitflags::bitflags;

/// List lines open with this glyph.
pub const BULLET: &str = "\u{2022}";

bitflags! {
    /// Style bits active on a run of text. Plain text is the empty set;
    /// bits combine freely (bold italic, struck list item, ...).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Format: u32 {
        const ITALIC = 0x1;
        const BOLD = 0x2;
        const HEAD1 = 0x4;
        const HEAD2 = 0x8;
        const HEAD3 = 0x10;
        const CODE = 0x20;
        const STRIKE = 0x40;
        const LIST = 0x80;
        const TABLE = 0x100;
    }
}

impl Format {
    /// Any heading bit set.
    pub fn is_heading(self) -> bool {
        self.intersects(Format::HEAD1 | Format::HEAD2 | Format::HEAD3)
    }
}

/// One element of the parser's output stream.
///
/// The stream defines a logical index space shared with document byte
/// offsets: a `NewLine` occupies one unit, a `Text` run occupies its value's
/// byte length, an `Image` occupies none (its editable `[path]` spelling is
/// emitted separately as a `Text` token).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    NewLine,
    Text { format: Format, value: String },
    Image { path: PathBuf },
}

impl Token {
    fn text(format: Format, value: impl Into<String>) -> Self {
        Token::Text {
            format,
            value: value.into(),
        }
    }

    /// Width of this token in the logical index space.
    pub fn logical_len(&self) -> usize {
        match self {
            Token::NewLine => 1,
            Token::Text { value, .. } => value.len(),
            Token::Image { .. } => 0,
        }
    }

    /// Format and value of a text run, if this is one.
    pub fn as_text(&self) -> Option<(Format, &str)> {
        match self {
            Token::Text { format, value } => Some((*format, value)),
            _ => None,
        }
    }
}

/// Tokenize `input`. Total and deterministic; never fails.
pub fn parse(input: &str) -> Vec<Token> {
    Parser {
        input,
        cursor: 0,
        tokens: Vec::new(),
    }
    .run()
}

/// Characters that open a construct mid-line and therefore terminate a
/// plain run.
fn is_special(c: char) -> bool {
    matches!(c, '*' | '/' | '~' | '[' | '\\')
}

struct Parser<'a> {
    input: &'a str,
    cursor: usize,
    tokens: Vec<Token>,
}

impl<'a> Parser<'a> {
    fn run(mut self) -> Vec<Token> {
        while !self.is_eof() {
            if self.at_line_start() && self.parse_line_begin() {
                continue;
            }
            let burst = self.parse_inline();
            self.tokens.extend(burst);
        }
        self.tokens
    }

    // ==================== Scanner primitives ====================

    fn is_eof(&self) -> bool {
        self.cursor >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.cursor..].chars().next()
    }

    /// Consume one codepoint.
    fn bump(&mut self) -> bool {
        match self.peek() {
            Some(c) => {
                self.cursor += c.len_utf8();
                true
            }
            None => false,
        }
    }

    /// Consume `pat` if the input continues with it.
    fn match_pat(&mut self, pat: &str) -> bool {
        if self.input[self.cursor..].starts_with(pat) {
            self.cursor += pat.len();
            true
        } else {
            false
        }
    }

    fn at_line_start(&self) -> bool {
        self.cursor == 0 || self.input.as_bytes()[self.cursor - 1] == b'\n'
    }

    /// Consume up to (not including) the next newline, returning the slice.
    fn take_line_rest(&mut self) -> &'a str {
        let start = self.cursor;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        &self.input[start..self.cursor]
    }

    // ==================== Inline grammar ====================

    /// Parse one construct at the current position. Always consumes at
    /// least one byte. Most constructs yield a single token; an image
    /// yields its editable text plus the zero-width image reference.
    fn parse_inline(&mut self) -> Vec<Token> {
        if self.match_pat("\n") {
            return vec![Token::NewLine];
        }
        if self.peek() == Some('\\') {
            return vec![self.parse_escape()];
        }
        if self.match_pat("**") {
            return self.parse_wrapped("**", Format::BOLD);
        }
        if self.match_pat("~~") {
            return self.parse_wrapped("~~", Format::STRIKE);
        }
        if self.match_pat("/") {
            return self.parse_wrapped("/", Format::ITALIC);
        }
        if self.match_pat("*") {
            return self.parse_wrapped("*", Format::ITALIC);
        }
        if self.match_pat("[") {
            return self.parse_image();
        }
        vec![self.parse_plain()]
    }

    /// Backslash escaping. The emitted token keeps both bytes so offsets
    /// stay aligned; renderers strip the backslash at draw time.
    fn parse_escape(&mut self) -> Token {
        self.bump(); // the backslash
        match self.peek() {
            Some(c) if is_special(c) => {
                self.bump();
                Token::text(Format::empty(), format!("\\{c}"))
            }
            // a backslash at line end (or stray) stays literal; a following
            // newline is left for the NewLine rule
            _ => Token::text(Format::empty(), "\\"),
        }
    }

    /// Bold / strike / italic, delimited by `which` on both sides. The
    /// opening delimiter has already been consumed.
    ///
    /// Inner constructs are parsed recursively and their format bits merged
    /// into the enclosing run; the run's value is the raw slice including
    /// both delimiters. Hitting a line break before the closer rewinds and
    /// replays the rest of the line as flat plain text.
    fn parse_wrapped(&mut self, which: &str, fmt: Format) -> Vec<Token> {
        let start = self.cursor;
        let mut format = fmt;
        let mut images: Vec<Token> = Vec::new();
        loop {
            if self.is_eof() {
                // unterminated at end of input keeps the format (only a
                // line break demotes to plain)
                let mut value = String::from(which);
                value.push_str(&self.input[start..self.cursor]);
                let mut out = vec![Token::text(format, value)];
                out.append(&mut images);
                return out;
            }
            if self.match_pat(which) {
                break;
            }
            let inner = self.parse_inline();
            if inner.contains(&Token::NewLine) {
                self.cursor = start;
                let mut value = String::from(which);
                value.push_str(self.take_line_rest());
                return vec![Token::text(Format::empty(), value)];
            }
            for token in inner {
                match token {
                    Token::Text { format: f, .. } => format |= f,
                    img @ Token::Image { .. } => images.push(img),
                    Token::NewLine => unreachable!("handled above"),
                }
            }
        }
        let mut value = String::from(which);
        value.push_str(&self.input[start..self.cursor]);
        let mut out = vec![Token::text(format, value)];
        out.append(&mut images);
        out
    }

    /// `[path]`. The opening bracket has already been consumed. A closed
    /// bracket yields the literal text (so the path stays editable) plus a
    /// zero-width image token; an unterminated one stays literal text.
    fn parse_image(&mut self) -> Vec<Token> {
        let start = self.cursor;
        loop {
            match self.peek() {
                Some(']') => {
                    let path = &self.input[start..self.cursor];
                    self.bump();
                    return vec![
                        Token::text(Format::empty(), format!("[{path}]")),
                        Token::Image {
                            path: PathBuf::from(path),
                        },
                    ];
                }
                None | Some('\n') => {
                    let mut value = String::from("[");
                    value.push_str(&self.input[start..self.cursor]);
                    return vec![Token::text(Format::empty(), value)];
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    /// Accumulate codepoints until a special character, newline, or EOF.
    /// Always takes at least one codepoint so a delimiter character that
    /// matched no construct falls through as literal text.
    fn parse_plain(&mut self) -> Token {
        let start = self.cursor;
        self.bump();
        while let Some(c) = self.peek() {
            if c == '\n' || is_special(c) {
                break;
            }
            self.bump();
        }
        Token::text(Format::empty(), &self.input[start..self.cursor])
    }

    // ==================== Line-leading grammar ====================

    /// Constructs that only open at column 0. Returns false when the line
    /// starts with ordinary inline content.
    fn parse_line_begin(&mut self) -> bool {
        if self.match_pat("###") {
            self.parse_line_wide("###", Format::HEAD3);
        } else if self.match_pat("##") {
            self.parse_line_wide("##", Format::HEAD2);
        } else if self.match_pat("#") {
            self.parse_line_wide("#", Format::HEAD1);
        } else if self.match_pat("\t") {
            self.parse_code();
        } else if self.match_pat(BULLET) {
            self.parse_line_wide(BULLET, Format::LIST);
        } else if self.peek() == Some('|') {
            self.parse_table_row();
        } else {
            return false;
        }
        true
    }

    /// Header / list body: recursive inline parsing to end of line, with
    /// `fmt` OR-ed into every emitted text run. The marker belongs to the
    /// first run so offsets stay aligned.
    fn parse_line_wide(&mut self, marker: &str, fmt: Format) {
        let mut out: Vec<Token> = Vec::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            for token in self.parse_inline() {
                match token {
                    Token::Text { format, value } => out.push(Token::text(format | fmt, value)),
                    other => out.push(other),
                }
            }
        }
        match out.first_mut() {
            Some(Token::Text { value, .. }) => {
                value.insert_str(0, marker);
            }
            _ => out.push(Token::text(fmt, marker)),
        }
        self.tokens.extend(out);
    }

    /// Code line: the leading tab plus the rest of the line, verbatim, as
    /// one run. No nested constructs.
    fn parse_code(&mut self) {
        let start = self.cursor - 1; // include the tab
        self.take_line_rest();
        self.tokens.push(Token::text(
            Format::CODE,
            &self.input[start..self.cursor],
        ));
    }

    /// Table row: the line is split into alternating `|` separator tokens
    /// and verbatim cell tokens, all TABLE-tagged. Column shaping is the
    /// layout pass's job; it needs sibling rows the parser cannot see in a
    /// single forward scan.
    fn parse_table_row(&mut self) {
        loop {
            match self.peek() {
                None | Some('\n') => break,
                Some('|') => {
                    self.bump();
                    self.tokens.push(Token::text(Format::TABLE, "|"));
                }
                Some(_) => {
                    let start = self.cursor;
                    while let Some(c) = self.peek() {
                        if c == '|' || c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                    self.tokens.push(Token::text(
                        Format::TABLE,
                        &self.input[start..self.cursor],
                    ));
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

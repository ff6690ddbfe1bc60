//! Layout pass: token stream in, positioned geometry out.
//!
//! One left-to-right walk over the tokens moves a pen through the content
//! viewport, word-wrapping text runs, shaping tables, flowing image grids,
//! and answering the geometric questions a frontend has each frame: where
//! is the caret, which rectangles are selected, which offset is closest to
//! a pointer position. Nothing is drawn here; the [`Layout`] value *is* the
//! draw list.
//!
//! The pen keeps a logical index in lockstep with document byte offsets
//! (one unit per line break, one per text byte, none for images). Soft
//! wraps introduced by viewport width consume no logical index.

use std::ops::Range;
use std::path::PathBuf;

use tracing::trace;

use crate::config::Config;
use crate::core::geometry::{Point, Rect};
use crate::core::markup::{Format, Token};
use crate::core::metrics::{FontVariant, GlyphMetrics};

/// Heading size multiplier for a format.
pub fn head_scale(format: Format) -> f32 {
    if format.contains(Format::HEAD1) {
        2.0
    } else if format.contains(Format::HEAD2) {
        1.6
    } else if format.contains(Format::HEAD3) {
        1.2
    } else {
        1.0
    }
}

/// How many hard rows fit in the viewport at the base font size.
pub fn visible_row_capacity(viewport: &Rect, font_size: f32) -> usize {
    (viewport.height / font_size) as usize
}

/// Per-pass inputs.
#[derive(Debug, Clone)]
pub struct LayoutParams {
    /// Content area in pixels; the pen starts at its top-left corner.
    pub viewport: Rect,
    /// First visible hard row; earlier rows are skipped without geometry.
    pub row_start: usize,
    /// Document cursor as a byte offset.
    pub cursor: usize,
    /// Active selection `[start, end)`, if any.
    pub selection: Option<(usize, usize)>,
    /// Pointer position to resolve to the nearest offset, if any.
    pub pick: Option<Point>,
}

/// A word-sized piece of text placed at a pixel position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub pos: Point,
    pub size: f32,
    pub format: Format,
    pub text: String,
}

/// One visual row: a hard line or a soft-wrapped fragment of one.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualLine {
    pub y: f32,
    pub height: f32,
    /// Indices into [`Layout::runs`].
    pub runs: Range<usize>,
}

/// A thumbnail cell of the image grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCell {
    pub path: PathBuf,
    pub rect: Rect,
}

/// Caret geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Caret {
    pub pos: Point,
    pub height: f32,
}

/// Line-number anchor for one visible hard row. The renderer right-aligns
/// the number text into the gutter at this baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMark {
    pub row: usize,
    pub y: f32,
    pub size: f32,
}

/// Everything one pass produces.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub runs: Vec<TextRun>,
    pub lines: Vec<VisualLine>,
    /// Strike-through bars.
    pub strikes: Vec<Rect>,
    /// Left gutter bars marking code blocks.
    pub code_bars: Vec<Rect>,
    pub images: Vec<ImageCell>,
    pub row_marks: Vec<RowMark>,
    pub caret: Option<Caret>,
    /// Per-glyph selection rectangles; not rectangular across wraps.
    pub selection: Vec<Rect>,
    /// Offset resolved from [`LayoutParams::pick`].
    pub picked: Option<usize>,
    /// Hard row count where geometry stopped: the last row started before
    /// the pass ran past the viewport bottom, or the total row count when
    /// everything fit. Feed this back as the document's scroll bound.
    pub rows: usize,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            viewport: Rect::new(0.0, 0.0, 800.0, 600.0),
            row_start: 0,
            cursor: 0,
            selection: None,
            pick: None,
        }
    }
}

/// The layout engine: metrics and configuration, reused across passes.
pub struct LayoutEngine<'a, M: GlyphMetrics> {
    metrics: &'a M,
    config: &'a Config,
}

impl<'a, M: GlyphMetrics> LayoutEngine<'a, M> {
    pub fn new(metrics: &'a M, config: &'a Config) -> Self {
        Self { metrics, config }
    }

    pub fn layout(&self, tokens: &[Token], params: &LayoutParams) -> Layout {
        let pass = Pass {
            metrics: self.metrics,
            config: self.config,
            tokens,
            params: params.clone(),
            out: Layout::default(),
            cx: params.viewport.x,
            cy: params.viewport.y,
            idx: 0,
            row: 0,
            current_size: self.config.font_size,
            clipped: false,
            at_row_start: true,
            line_y: params.viewport.y,
            line_run_start: 0,
            in_table: false,
            table: None,
            deferred_gap: 0.0,
            pending_images: Vec::new(),
            best_pick: None,
            rows_at_clip: None,
        };
        let out = pass.run();
        trace!(
            runs = out.runs.len(),
            lines = out.lines.len(),
            rows = out.rows,
            "layout pass"
        );
        out
    }
}

/// Shape of one table block, collected by looking ahead over consecutive
/// table rows without moving the main scan.
struct TableShape {
    /// Token indices of the cells, in stream order.
    elems: Vec<usize>,
    col_count: usize,
    /// Per-column width in bytes of the widest cell.
    col_widths: Vec<usize>,
    /// Unequal row lengths: render at natural width, no first-row styling.
    mismatched: bool,
}

struct Pass<'a, M: GlyphMetrics> {
    metrics: &'a M,
    config: &'a Config,
    tokens: &'a [Token],
    params: LayoutParams,
    out: Layout,
    cx: f32,
    cy: f32,
    /// Logical index, in lockstep with document byte offsets.
    idx: usize,
    /// Hard row counter.
    row: usize,
    current_size: f32,
    /// Pen passed the viewport bottom: geometry stops, index bookkeeping
    /// continues so downstream offsets stay consistent.
    clipped: bool,
    at_row_start: bool,
    line_y: f32,
    line_run_start: usize,
    in_table: bool,
    table: Option<TableShape>,
    /// Trailing cell gap held back while the caret sits on the boundary.
    deferred_gap: f32,
    pending_images: Vec<PathBuf>,
    best_pick: Option<(f32, usize)>,
    rows_at_clip: Option<usize>,
}

impl<'a, M: GlyphMetrics> Pass<'a, M> {
    fn run(mut self) -> Layout {
        let tokens = self.tokens;
        for (i, token) in tokens.iter().enumerate() {
            if self.visible() && self.at_row_start {
                let size = match token {
                    Token::Text { format, .. } => self.config.font_size * head_scale(*format),
                    _ => self.config.font_size,
                };
                self.out.row_marks.push(RowMark {
                    row: self.row,
                    y: self.cy + (size - self.config.font_size) / 2.0,
                    size: self.config.font_size,
                });
                self.at_row_start = false;
            }
            match token {
                Token::NewLine => self.newline_token(),
                Token::Text { format, value } => {
                    let line_leading = i == 0 || matches!(tokens[i - 1], Token::NewLine);
                    self.text_token(i, *format, value, line_leading);
                }
                Token::Image { path } => self.image_token(path),
            }
        }
        self.finish()
    }

    fn visible(&self) -> bool {
        !self.clipped && self.row >= self.params.row_start
    }

    fn clip(&mut self) {
        if !self.clipped {
            self.clipped = true;
            self.rows_at_clip = Some(self.row);
        }
    }

    fn viewport(&self) -> Rect {
        self.params.viewport
    }

    // ==================== Token handlers ====================

    fn newline_token(&mut self) {
        if self.row < self.params.row_start {
            self.row += 1;
            self.idx += 1;
            self.at_row_start = true;
            return;
        }
        if !self.clipped {
            if self.idx == self.params.cursor {
                self.out.caret = Some(Caret {
                    pos: Point::new(self.cx, self.cy),
                    height: self.current_size,
                });
            }
            self.consider_pick(self.cx, self.cy, self.current_size, self.idx);
            self.break_line(self.current_size);
            if !self.pending_images.is_empty() {
                self.flush_images(self.cy);
            }
            if self.cy + self.current_size >= self.viewport().bottom() {
                self.clip();
            }
        }
        self.idx += 1;
        self.row += 1;
        self.current_size = self.config.font_size;
        self.at_row_start = true;
    }

    fn text_token(&mut self, i: usize, fmt: Format, value: &str, line_leading: bool) {
        if self.row < self.params.row_start || self.clipped {
            self.idx += value.len();
            return;
        }

        if fmt.contains(Format::TABLE) {
            if !self.in_table {
                self.table = Some(self.collect_table(i));
                self.in_table = true;
            }
        } else {
            self.in_table = false;
        }

        let mut variant = if fmt.contains(Format::BOLD) {
            FontVariant::Bold
        } else {
            FontVariant::Plain
        };
        self.current_size = self.config.font_size * head_scale(fmt);
        let block_start = self.cy;

        if line_leading && fmt.contains(Format::LIST) {
            self.cx += self.config.list_indent;
        }

        // cell shaping: centering gap and first-row styling, only for a
        // table whose rows matched up
        let mut is_cell = false;
        let mut gap_len = 0.0;
        let mut run_format = fmt;
        if fmt.contains(Format::TABLE) {
            if let Some(shape) = &self.table {
                if !shape.mismatched && shape.col_count > 0 {
                    if let Some(m) = shape.elems.iter().position(|&e| e == i) {
                        is_cell = true;
                        let col = m % shape.col_count;
                        let gap = shape.col_widths[col].saturating_sub(value.len());
                        gap_len = self.metrics.width(
                            variant,
                            self.config.font_size,
                            &" ".repeat(gap),
                        );
                        if m < shape.col_count {
                            variant = FontVariant::Bold;
                            run_format |= Format::BOLD;
                        }
                    }
                }
            }
        }
        if is_cell {
            self.cx += gap_len / 2.0;
        }

        // word wrap: word + trailing space chunks
        let mut pos = 0;
        while pos < value.len() {
            let word_end = match value[pos..].find(' ') {
                Some(rel) => pos + rel + 1,
                None => value.len(),
            };
            let word = &value[pos..word_end];
            let word_width = self.metrics.width(variant, self.current_size, word);

            if self.cx + word_width > self.viewport().right() {
                self.break_line(self.current_size);
                if self.cy + self.current_size >= self.viewport().bottom() {
                    self.clip();
                    self.idx += value.len() - pos;
                    return;
                }
            }

            if fmt.contains(Format::STRIKE) {
                let thickness = head_scale(fmt);
                self.out.strikes.push(Rect::new(
                    self.cx,
                    self.cy + self.current_size / 2.0 - thickness / 2.0,
                    word_width,
                    thickness,
                ));
            }

            self.walk_glyphs(word, variant);

            self.out.runs.push(TextRun {
                pos: Point::new(self.cx, self.cy),
                size: self.current_size,
                format: run_format,
                text: word.to_string(),
            });
            self.cx += word_width;
            pos = word_end;
        }

        if is_cell {
            if self.params.cursor == self.idx {
                self.deferred_gap = gap_len / 2.0;
            } else {
                self.cx += gap_len / 2.0;
            }
        }

        if fmt.contains(Format::CODE) {
            self.out.code_bars.push(Rect::new(
                self.viewport().x,
                block_start,
                2.0,
                self.cy + self.current_size - block_start,
            ));
        }
    }

    /// Per-glyph bookkeeping within one word: caret, pick distance,
    /// selection rectangles, logical index.
    fn walk_glyphs(&mut self, word: &str, variant: FontVariant) {
        let mut char_pos = 0;
        for c in word.chars() {
            let len = c.len_utf8();
            let prefix_width = self
                .metrics
                .width(variant, self.current_size, &word[..char_pos]);

            if self.idx == self.params.cursor {
                self.out.caret = Some(Caret {
                    pos: Point::new(self.cx + prefix_width, self.cy),
                    height: self.current_size,
                });
            }
            if self.deferred_gap != 0.0 {
                self.cx += self.deferred_gap;
                self.deferred_gap = 0.0;
            }
            self.consider_pick(
                self.cx + prefix_width,
                self.cy,
                self.current_size,
                self.idx,
            );
            if let Some((sel_start, sel_end)) = self.params.selection {
                if self.idx >= sel_start && self.idx < sel_end {
                    let glyph_end = self
                        .metrics
                        .width(variant, self.current_size, &word[..char_pos + len]);
                    self.out.selection.push(Rect::new(
                        self.cx + prefix_width,
                        self.cy,
                        glyph_end - prefix_width,
                        self.current_size,
                    ));
                }
            }

            self.idx += len;
            char_pos += len;
        }
    }

    fn image_token(&mut self, path: &PathBuf) {
        self.in_table = false;
        if !self.visible() {
            return;
        }
        self.pending_images.push(path.clone());
    }

    // ==================== Line and image flow ====================

    fn break_line(&mut self, advance: f32) {
        if self.visible() {
            self.out.lines.push(VisualLine {
                y: self.line_y,
                height: advance,
                runs: self.line_run_start..self.out.runs.len(),
            });
        }
        self.cy += advance;
        self.cx = self.viewport().x;
        self.line_y = self.cy;
        self.line_run_start = self.out.runs.len();
    }

    /// Place buffered thumbnails as a wrapping grid starting at `top`,
    /// then move the pen below the grid.
    fn flush_images(&mut self, top: f32) {
        let thumb = self.config.thumb_size;
        let stride = self.config.thumb_stride();
        let mut ix = self.viewport().x;
        let mut iy = top;
        for path in std::mem::take(&mut self.pending_images) {
            self.out.images.push(ImageCell {
                path,
                rect: Rect::new(ix, iy, thumb, thumb),
            });
            ix += stride;
            if ix + thumb >= self.viewport().right() {
                ix = self.viewport().x;
                iy += stride;
            }
            if iy + thumb >= self.viewport().bottom() {
                break;
            }
        }
        self.cy = iy + stride;
        self.line_y = self.cy;
    }

    fn consider_pick(&mut self, x: f32, y: f32, size: f32, idx: usize) {
        if let Some(p) = self.params.pick {
            let dist = Point::new(x, y + size / 2.0).distance(p);
            if self.best_pick.map_or(true, |(best, _)| dist < best) {
                self.best_pick = Some((dist, idx));
            }
        }
    }

    // ==================== Table lookahead ====================

    /// Collect the cell grid of the table starting at token `start`,
    /// through consecutive table rows separated by line breaks. Reads
    /// ahead on a cloned index; the main scan position is untouched.
    fn collect_table(&self, start: usize) -> TableShape {
        let mut elems = Vec::new();
        let mut row_lens: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut j = start;
        while j < self.tokens.len() {
            match &self.tokens[j] {
                Token::NewLine => {
                    if j + 1 < self.tokens.len() {
                        match &self.tokens[j + 1] {
                            Token::Text { format, .. } if format.contains(Format::TABLE) => {}
                            _ => break,
                        }
                    }
                    if !current.is_empty() {
                        row_lens.push(std::mem::take(&mut current));
                    }
                    j += 1;
                }
                Token::Text { format, value } if format.contains(Format::TABLE) => {
                    if value != "|" {
                        current.push(value.len());
                        elems.push(j);
                    }
                    j += 1;
                }
                _ => break,
            }
        }
        if !current.is_empty() {
            row_lens.push(current);
        }

        let col_count = row_lens.first().map_or(0, Vec::len);
        let mismatched = row_lens.iter().any(|r| r.len() != col_count);
        let mut col_widths = vec![0; col_count];
        if !mismatched {
            for row in &row_lens {
                for (c, len) in row.iter().enumerate() {
                    col_widths[c] = col_widths[c].max(*len);
                }
            }
        }
        TableShape {
            elems,
            col_count,
            col_widths,
            mismatched,
        }
    }

    // ==================== End of pass ====================

    fn finish(mut self) -> Layout {
        if !self.pending_images.is_empty() && !self.clipped {
            // stream ended on the images' own line: grid goes below it
            let top = self.cy + self.current_size;
            self.flush_images(top);
        }
        if self.visible() && self.line_run_start < self.out.runs.len() {
            self.out.lines.push(VisualLine {
                y: self.line_y,
                height: self.current_size,
                runs: self.line_run_start..self.out.runs.len(),
            });
        }
        if self.visible() && matches!(self.tokens.last(), Some(Token::NewLine)) {
            self.out.row_marks.push(RowMark {
                row: self.row,
                y: self.cy,
                size: self.config.font_size,
            });
        }
        if !self.clipped && self.out.caret.is_none() && self.idx == self.params.cursor {
            self.out.caret = Some(Caret {
                pos: Point::new(self.cx, self.cy),
                height: self.current_size,
            });
        }
        if let Some(p) = self.params.pick {
            self.out.picked = if p.y > self.cy + self.current_size {
                Some(self.idx)
            } else {
                Some(self.best_pick.map_or(0, |(_, idx)| idx))
            };
        }
        self.out.rows = self.rows_at_clip.unwrap_or(self.row);
        self.out
    }
}

// =============================================================================
// TESTS
// =============================================================================

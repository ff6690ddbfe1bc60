//! Glyph measurement seam between the layout pass and the embedding
//! frontend's font stack.

use unicode_width::UnicodeWidthStr;

/// Which face a run is measured and drawn with. Italic is a renderer-side
/// shear and strike-through is a rectangle, so neither needs its own face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontVariant {
    Plain,
    Bold,
}

/// Pixel measurement of text as the frontend's fonts would render it.
///
/// Implementations must be deterministic for a given (variant, size, text)
/// triple; the layout pass relies on repeated measurements agreeing.
pub trait GlyphMetrics {
    fn width(&self, variant: FontVariant, size: f32, text: &str) -> f32;
}

/// Fixed-advance metrics backed by Unicode display width.
///
/// Good enough for headless layout and tests: every cell advances
/// `size * aspect`, wide (CJK, emoji) codepoints take two cells, control
/// characters take none.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMetrics {
    /// Advance of one cell as a fraction of the font size.
    pub aspect: f32,
}

impl MonospaceMetrics {
    pub fn new(aspect: f32) -> Self {
        Self { aspect }
    }
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self { aspect: 0.5 }
    }
}

impl GlyphMetrics for MonospaceMetrics {
    fn width(&self, _variant: FontVariant, size: f32, text: &str) -> f32 {
        text.width() as f32 * size * self.aspect
    }
}

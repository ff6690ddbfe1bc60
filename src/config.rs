// Configuration module
// Compiled-in editor defaults; frontends tweak fields directly.

/// Editor configuration shared by the document model and the layout pass.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base font size in pixels. Headings scale off this.
    pub font_size: f32,
    /// Padding between the content rect and the window, also the gutter
    /// where row numbers are right-aligned.
    pub padding: f32,
    /// Horizontal indent applied to list lines.
    pub list_indent: f32,
    /// Edge length of an image thumbnail cell.
    pub thumb_size: f32,
    /// Gap between thumbnail cells.
    pub thumb_gap: f32,
    /// Width of the caret bar.
    pub cursor_width: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font_size: 18.0,
            padding: 40.0,
            list_indent: 15.0,
            thumb_size: 100.0,
            thumb_gap: 5.0,
            cursor_width: 3.0,
        }
    }
}

impl Config {
    /// Thumbnail grid stride (cell plus gap).
    pub fn thumb_stride(&self) -> f32 {
        self.thumb_size + self.thumb_gap
    }
}

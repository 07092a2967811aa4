//! Character-cell view of a display
//!
//! Lets code written for text displays drive a pixel panel: the canvas is cut
//! into `columns × rows` cells of the font's cell size times the scale.

use std::sync::Arc;

use panel_specs::argb;

use crate::{Display, DisplayError, Font, Graphics};

/// A text console over a [`Display`]
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use panel_compositor::{Display, DisplayConfig, PackedFont, TextGrid};
///
/// # fn main() -> Result<(), panel_compositor::DisplayError> {
/// let display = Display::virtual_canvas_with_config(32, 16, DisplayConfig::MANUAL);
/// let font = PackedFont::new(4, 8).with_glyph('I', &["###", ".#.", ".#.", "###"]);
/// let mut grid = TextGrid::new(&display, Arc::new(font), 1);
/// assert_eq!((grid.columns(), grid.rows()), (8, 2));
/// grid.write_at(1, 1, "I", false)?;
/// assert_eq!(display.pixel(4, 8), Some(0xFFFF_FFFF));
/// # Ok(())
/// # }
/// ```
pub struct TextGrid<'a> {
    graphics: Graphics<'a>,
    font: Arc<dyn Font>,
    scale: u32,
    foreground: u32,
    background: u32,
}

impl<'a> TextGrid<'a> {
    /// White on black text in cells `scale` times the font cell
    pub fn new(display: &'a Display, font: Arc<dyn Font>, scale: u32) -> Self {
        let scale = scale.max(1);
        let mut graphics = display.graphics();
        graphics.set_font(Arc::clone(&font));
        graphics.set_text_scale(scale, scale);
        Self {
            graphics,
            font,
            scale,
            foreground: argb::WHITE,
            background: argb::BLACK,
        }
    }

    /// Set text and background colors
    pub fn set_colors(&mut self, foreground: u32, background: u32) {
        self.foreground = foreground;
        self.background = background;
    }

    /// Cells per row
    pub fn columns(&self) -> u32 {
        let cell = self.cell_width();
        self.graphics.display().width().checked_div(cell).unwrap_or(0)
    }

    /// Number of rows
    pub fn rows(&self) -> u32 {
        let cell = self.cell_height();
        self.graphics.display().height().checked_div(cell).unwrap_or(0)
    }

    /// Paint the whole canvas in the background color
    pub fn clear(&mut self) -> Result<(), DisplayError> {
        let display = self.graphics.display();
        display.fill_rect(0, 0, display.width(), display.height(), self.background)
    }

    /// Write `text` starting at cell `(column, row)`
    ///
    /// Each character's cell is painted in the background color first; with
    /// `inverse` the two colors swap. Text running past the last column is
    /// clipped.
    pub fn write_at(&mut self, column: u32, row: u32, text: &str, inverse: bool) -> Result<(), DisplayError> {
        let (foreground, background) = if inverse {
            (self.background, self.foreground)
        } else {
            (self.foreground, self.background)
        };
        let (cell_width, cell_height) = (self.cell_width(), self.cell_height());
        let top = i64::from(row) * i64::from(cell_height);
        let baseline = clamp_i32(top + i64::from(cell_height));
        let top = clamp_i32(top);

        self.graphics.set_alpha_processing(false);
        for (offset, character) in (0u32..).zip(text.chars()) {
            let left = clamp_i32(
                i64::from(column.saturating_add(offset)) * i64::from(cell_width),
            );
            self.graphics.set_color(background);
            self.graphics.fill_rect(left, top, cell_width, cell_height)?;
            self.graphics.set_color(foreground);
            self.graphics.render_character(left, baseline, character)?;
        }
        Ok(())
    }

    fn cell_width(&self) -> u32 {
        self.font.cell_width().saturating_mul(self.scale)
    }

    fn cell_height(&self) -> u32 {
        self.font.cell_height().saturating_mul(self.scale)
    }
}

fn clamp_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

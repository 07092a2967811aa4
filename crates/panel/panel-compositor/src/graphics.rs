//! Drawing context
//!
//! A [`Graphics`] carries drawing state (color, font, text scale, clip
//! rectangle, alpha mode) and turns high-level calls into writes to the
//! display's logical buffer. Every call clips against the intersection of the
//! canvas and the clip rectangle; fully clipped calls do nothing.
//!
//! Contexts are cheap. Each one has its own state, and any number of them may
//! draw into the same display.

// Coordinate math below runs in i64 on values derived from i32 origins and
// u32 sizes; buffer indices come from rectangles already clipped to the
// canvas or validated against the source length.
#![allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]

use std::sync::Arc;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Pixel, Point, Size};
use embedded_graphics::primitives::Rectangle;
use panel_specs::argb;

use crate::dirty::DirtyRegion;
use crate::display::State;
use crate::geometry::Bounds;
use crate::{Display, DisplayError, Font};

/// A bit-packed indexed image
///
/// Indices are `bits_per_index` wide, MSB-first, row-major; row `r` starts
/// `r * row_stride` indices after `bit_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedImage<'a> {
    /// Packed index stream
    pub data: &'a [u8],
    /// Bits per index: 1, 2, 4, 8, 16 or 32
    pub bits_per_index: u32,
    /// First bit of the image inside `data`
    pub bit_offset: usize,
    /// Source width in indices
    pub width: u32,
    /// Source height in rows
    pub height: u32,
    /// Distance between row starts, in indices
    pub row_stride: usize,
}

impl<'a> IndexedImage<'a> {
    /// Tightly packed image starting at bit 0
    pub fn new(data: &'a [u8], bits_per_index: u32, width: u32, height: u32) -> Self {
        Self {
            data,
            bits_per_index,
            bit_offset: 0,
            width,
            height,
            row_stride: width as usize,
        }
    }

    /// Index at column `x` of row `y`, or `None` past the end of `data`
    fn index(&self, x: u32, y: u32) -> Option<u32> {
        let bits = self.bits_per_index as usize;
        let position = (y as usize)
            .checked_mul(self.row_stride)?
            .checked_add(x as usize)?
            .checked_mul(bits)?
            .checked_add(self.bit_offset)?;
        let first = position / 8;
        let last = (position + bits - 1) / 8;
        let mut window = 0u64;
        for byte in self.data.get(first..=last)? {
            window = (window << 8) | u64::from(*byte);
        }
        let trailing = (last + 1) * 8 - (position + bits);
        let mask = (1u64 << bits) - 1;
        Some(((window >> trailing) & mask) as u32)
    }
}

/// A source of ARGB rows for the shared blit path
#[derive(Clone, Copy)]
struct Source<'a> {
    pixels: &'a [u32],
    width: u32,
    height: u32,
    stride: usize,
}

/// Drawing state over a [`Display`]
///
/// # Example
///
/// ```
/// use panel_compositor::{Display, DisplayConfig};
///
/// # fn main() -> Result<(), panel_compositor::DisplayError> {
/// let display = Display::virtual_canvas_with_config(16, 16, DisplayConfig::MANUAL);
/// let mut g = display.graphics();
/// g.set_color(0xFF00_FF00);
/// g.draw_line(0, 0, 15, 15)?;
/// assert_eq!(display.pixel(7, 7), Some(0xFF00_FF00));
/// # Ok(())
/// # }
/// ```
pub struct Graphics<'a> {
    display: &'a Display,
    color: u32,
    font: Option<Arc<dyn Font>>,
    text_scale: (u32, u32),
    clip: Bounds,
    alpha_processing: bool,
    /// Decoded indexed pixels, reused across calls
    scratch: Vec<u32>,
}

impl<'a> Graphics<'a> {
    pub(crate) fn new(display: &'a Display) -> Self {
        let clip = display.state().bounds();
        Self {
            display,
            color: argb::WHITE,
            font: None,
            text_scale: (1, 1),
            clip,
            alpha_processing: false,
            scratch: Vec::new(),
        }
    }

    /// The display this context draws into
    pub fn display(&self) -> &'a Display {
        self.display
    }

    /// Set the drawing color (ARGB)
    pub fn set_color(&mut self, color: u32) {
        self.color = color;
    }

    /// Current drawing color
    pub fn color(&self) -> u32 {
        self.color
    }

    /// Set the font used by text calls
    pub fn set_font(&mut self, font: Arc<dyn Font>) {
        self.font = Some(font);
    }

    /// Current font
    pub fn font(&self) -> Option<&Arc<dyn Font>> {
        self.font.as_ref()
    }

    /// Integer text scale; zero is treated as one
    pub fn set_text_scale(&mut self, scale_x: u32, scale_y: u32) {
        self.text_scale = (scale_x.max(1), scale_y.max(1));
    }

    /// Current text scale
    pub fn text_scale(&self) -> (u32, u32) {
        self.text_scale
    }

    /// Restrict drawing to `rect` (intersected with the canvas)
    pub fn set_clip(&mut self, rect: Rectangle) {
        let canvas = self.display.state().bounds();
        self.clip = canvas.clip_rectangle(&rect).unwrap_or(Bounds {
            x1: 0,
            y1: 0,
            ..canvas
        });
    }

    /// Clip back to the whole canvas
    pub fn reset_clip(&mut self) {
        self.clip = self.display.state().bounds();
    }

    /// Current clip rectangle
    pub fn clip(&self) -> Rectangle {
        self.clip.to_rectangle()
    }

    /// Whether source alpha is honored
    ///
    /// Off (the default): colors are written opaque. On: alpha 0 is skipped,
    /// alpha 255 overwrites and anything between blends linearly.
    pub fn set_alpha_processing(&mut self, enabled: bool) {
        self.alpha_processing = enabled;
    }

    /// Current alpha mode
    pub fn alpha_processing(&self) -> bool {
        self.alpha_processing
    }

    /// Fill a rectangle with the current color
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<(), DisplayError> {
        self.fill_area(
            i64::from(x),
            i64::from(y),
            i64::from(width),
            i64::from(height),
            self.color,
        )
    }

    /// Draw a one pixel wide line from `(x0, y0)` to `(x1, y1)`, both inclusive
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<(), DisplayError> {
        let (x0, y0, x1, y1) = (i64::from(x0), i64::from(y0), i64::from(x1), i64::from(y1));
        if y0 == y1 {
            return self.fill_area(x0.min(x1), y0, (x1 - x0).abs() + 1, 1, self.color);
        }
        if x0 == x1 {
            return self.fill_area(x0, y0.min(y1), 1, (y1 - y0).abs() + 1, self.color);
        }

        let display = self.display;
        let mut state = display.state();
        let mut touched = DirtyRegion::EMPTY;
        let mut plot = |x: i64, y: i64| {
            if self.clip.contains(x, y) {
                let (x, y) = (x as u32, y as u32);
                if let Some(pixel) = state.pixel_mut(x, y) {
                    *pixel = self.paint(*pixel, self.color);
                    touched.include(x, y, x + 1, y + 1);
                }
            }
        };
        let columns = (i64::from(self.clip.x0), i64::from(self.clip.x1) - 1);
        let rows = (i64::from(self.clip.y0), i64::from(self.clip.y1) - 1);
        if (y1 - y0).abs() < (x1 - x0).abs() {
            if x0 > x1 {
                line_shallow(x1, y1, x0, y0, columns, &mut plot);
            } else {
                line_shallow(x0, y0, x1, y1, columns, &mut plot);
            }
        } else if y0 > y1 {
            line_steep(x1, y1, x0, y0, rows, &mut plot);
        } else {
            line_steep(x0, y0, x1, y1, rows, &mut plot);
        }
        commit(display, &mut state, touched)
    }

    /// Blit a `width × height` ARGB image whose rows are `stride` entries apart
    pub fn draw_rgb(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        pixels: &[u32],
        stride: usize,
    ) -> Result<(), DisplayError> {
        self.draw_rgb_scaled(x, y, width, height, pixels, stride, 1, 1)
    }

    /// [`Graphics::draw_rgb`] with nearest-neighbour upscaling
    ///
    /// The destination covers `width * scale_x × height * scale_y` pixels.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rgb_scaled(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        pixels: &[u32],
        stride: usize,
        scale_x: u32,
        scale_y: u32,
    ) -> Result<(), DisplayError> {
        let source = Source {
            pixels,
            width,
            height,
            stride,
        };
        check_source(&source)?;
        self.blit(x, y, source, (scale_x, scale_y), self.alpha_processing)
    }

    /// Decode an indexed image through `palette` and blit it, upscaled
    pub fn draw_indexed(
        &mut self,
        x: i32,
        y: i32,
        image: &IndexedImage<'_>,
        palette: &[u32],
        scale_x: u32,
        scale_y: u32,
    ) -> Result<(), DisplayError> {
        self.draw_indexed_with_alpha(x, y, image, palette, (scale_x, scale_y), self.alpha_processing)
    }

    /// Render one character with its cell's baseline at `y`
    ///
    /// Returns the horizontal advance. Characters without a glyph draw nothing
    /// and advance by the cell width; without a font nothing is drawn.
    pub fn render_character(&mut self, x: i32, y: i32, character: char) -> Result<u32, DisplayError> {
        let Some(font) = self.font.clone() else {
            return Ok(0);
        };
        let (scale_x, scale_y) = self.text_scale;
        let Some(glyph) = font.glyph(character) else {
            return Ok(font.cell_width().saturating_mul(scale_x));
        };
        let height = font.cell_height();
        let image = IndexedImage {
            data: glyph.bitmap,
            bits_per_index: 1,
            bit_offset: glyph.bit_offset,
            width: glyph.width,
            height,
            row_stride: glyph.width as usize,
        };
        let ink = if self.alpha_processing {
            self.color
        } else {
            argb::opaque(self.color)
        };
        let top = i64::from(y) - i64::from(height) * i64::from(scale_y);
        self.draw_indexed_with_alpha(
            x,
            saturate_i32(top),
            &image,
            &[argb::TRANSPARENT, ink],
            (scale_x, scale_y),
            true,
        )?;
        Ok(glyph.width.saturating_mul(scale_x))
    }

    /// Render `text` left to right from `x` with its baseline at `y`
    ///
    /// Returns the total advance.
    pub fn render_text(&mut self, x: i32, y: i32, text: &str) -> Result<u32, DisplayError> {
        let mut advance = 0u32;
        for character in text.chars() {
            let pen = saturate_i32(i64::from(x) + i64::from(advance));
            advance = advance.saturating_add(self.render_character(pen, y, character)?);
        }
        Ok(advance)
    }

    fn fill_area(&mut self, x: i64, y: i64, width: i64, height: i64, color: u32) -> Result<(), DisplayError> {
        let Some(area) = self.clip.clip(x, y, width, height) else {
            return Ok(());
        };
        let display = self.display;
        let mut state = display.state();
        if self.alpha_processing {
            for row_y in area.y0..area.y1 {
                if let Some(row) = state.row_mut(row_y, area.x0, area.x1) {
                    for pixel in row {
                        *pixel = blend(*pixel, color);
                    }
                }
            }
        } else {
            state.fill(area, argb::opaque(color));
        }
        display.mark_modified(&mut state, area)
    }

    fn draw_indexed_with_alpha(
        &mut self,
        x: i32,
        y: i32,
        image: &IndexedImage<'_>,
        palette: &[u32],
        scale: (u32, u32),
        alpha: bool,
    ) -> Result<(), DisplayError> {
        if !matches!(image.bits_per_index, 1 | 2 | 4 | 8 | 16 | 32) {
            return Err(DisplayError::InvalidIndexBits(image.bits_per_index));
        }
        if image.width == 0 || image.height == 0 {
            return Ok(());
        }
        let last_bit = (image.height as usize - 1)
            .saturating_mul(image.row_stride)
            .saturating_add(image.width as usize)
            .saturating_mul(image.bits_per_index as usize)
            .saturating_add(image.bit_offset);
        let needed = last_bit.div_ceil(8);
        if image.data.len() < needed {
            return Err(DisplayError::SourceTooShort {
                needed,
                actual: image.data.len(),
            });
        }

        // Decode everything first so a bad index leaves the buffer untouched.
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        for row in 0..image.height {
            for column in 0..image.width {
                let index = image.index(column, row).ok_or(DisplayError::SourceTooShort {
                    needed,
                    actual: image.data.len(),
                })?;
                let color = palette
                    .get(index as usize)
                    .copied()
                    .ok_or(DisplayError::PaletteIndex {
                        index,
                        palette_len: palette.len(),
                    })?;
                scratch.push(color);
            }
        }
        let source = Source {
            pixels: &scratch,
            width: image.width,
            height: image.height,
            stride: image.width as usize,
        };
        let result = self.blit(x, y, source, scale, alpha);
        self.scratch = scratch;
        result
    }

    /// Copy `source` to `(x, y)`, each source pixel covering `scale` pixels
    fn blit(&mut self, x: i32, y: i32, source: Source<'_>, scale: (u32, u32), alpha: bool) -> Result<(), DisplayError> {
        let (scale_x, scale_y) = (scale.0.max(1), scale.1.max(1));
        let (x, y) = (i64::from(x), i64::from(y));
        let Some(area) = self.clip.clip(
            x,
            y,
            i64::from(source.width) * i64::from(scale_x),
            i64::from(source.height) * i64::from(scale_y),
        ) else {
            return Ok(());
        };

        let display = self.display;
        let mut state = display.state();
        let mut touched = DirtyRegion::EMPTY;
        for dst_y in area.y0..area.y1 {
            let src_y = ((i64::from(dst_y) - y) / i64::from(scale_y)) as usize;
            let Some(row) = state.row_mut(dst_y, area.x0, area.x1) else {
                continue;
            };
            for (dst_x, pixel) in (area.x0..area.x1).zip(row.iter_mut()) {
                let src_x = ((i64::from(dst_x) - x) / i64::from(scale_x)) as usize;
                let Some(&color) = source.pixels.get(src_y * source.stride + src_x) else {
                    continue;
                };
                if alpha {
                    match argb::alpha(color) {
                        0 => continue,
                        0xFF => *pixel = color,
                        _ => *pixel = blend(*pixel, color),
                    }
                } else {
                    *pixel = argb::opaque(color);
                }
                touched.include(dst_x, dst_y, dst_x + 1, dst_y + 1);
            }
        }
        commit(display, &mut state, touched)
    }

    /// Result of painting `color` over `dst` under the current alpha mode
    fn paint(&self, dst: u32, color: u32) -> u32 {
        if self.alpha_processing {
            blend(dst, color)
        } else {
            argb::opaque(color)
        }
    }
}

/// Linear, non-premultiplied blend of `src` over `dst`
///
/// Each color channel becomes `(dst * (255 - a) + src * a) / 255`; the alpha
/// channel moves toward opaque the same way.
pub fn blend(dst: u32, src: u32) -> u32 {
    let a = u32::from(argb::alpha(src));
    match a {
        0 => return dst,
        0xFF => return src,
        _ => {}
    }
    let mix = |d: u8, s: u8| ((u32::from(d) * (255 - a) + u32::from(s) * a) / 255).min(255) as u8;
    argb::from_argb(
        mix(argb::alpha(dst), 0xFF),
        mix(argb::red(dst), argb::red(src)),
        mix(argb::green(dst), argb::green(src)),
        mix(argb::blue(dst), argb::blue(src)),
    )
}

fn check_source(source: &Source<'_>) -> Result<(), DisplayError> {
    if source.width == 0 || source.height == 0 {
        return Ok(());
    }
    let needed = (source.height as usize - 1)
        .saturating_mul(source.stride)
        .saturating_add(source.width as usize);
    if source.pixels.len() < needed {
        return Err(DisplayError::SourceTooShort {
            needed,
            actual: source.pixels.len(),
        });
    }
    Ok(())
}

fn commit(display: &Display, state: &mut State, touched: DirtyRegion) -> Result<(), DisplayError> {
    match touched.bounds() {
        Some((x0, y0, x1, y1)) => display.mark_modified(state, Bounds { x0, y0, x1, y1 }),
        None => Ok(()),
    }
}

fn saturate_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Bresenham state after `k` steps along the driving axis
///
/// Returns how many minor-axis steps were taken and the error term at step
/// `k`, matching what the loop below would reach by iterating.
fn bresenham_skip(k: i64, major: i64, minor: i64) -> (i64, i64) {
    let (k, major, minor) = (i128::from(k), i128::from(major), i128::from(minor));
    let threshold = 2 * minor * k - major;
    let steps = -(-threshold).div_euclid(2 * major);
    let error = 2 * minor * (k + 1) - major - 2 * major * steps;
    (steps as i64, error as i64)
}

/// Bresenham for `|dy| < |dx|`, stepping x forward; requires `x0 < x1`
///
/// Only columns inside the inclusive `window` are walked.
fn line_shallow(
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
    window: (i64, i64),
    plot: &mut impl FnMut(i64, i64),
) {
    let (first, last) = (x0.max(window.0), x1.min(window.1));
    if first > last {
        return;
    }
    let dx = x1 - x0;
    let (dy, step) = if y1 < y0 { (y0 - y1, -1) } else { (y1 - y0, 1) };
    let (taken, mut error) = bresenham_skip(first - x0, dx, dy);
    let mut y = y0 + step * taken;
    for x in first..=last {
        plot(x, y);
        if error > 0 {
            y += step;
            error -= 2 * dx;
        }
        error += 2 * dy;
    }
}

/// Bresenham for `|dy| >= |dx|`, stepping y forward; requires `y0 < y1`
///
/// Only rows inside the inclusive `window` are walked.
fn line_steep(
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
    window: (i64, i64),
    plot: &mut impl FnMut(i64, i64),
) {
    let (first, last) = (y0.max(window.0), y1.min(window.1));
    if first > last {
        return;
    }
    let dy = y1 - y0;
    let (dx, step) = if x1 < x0 { (x0 - x1, -1) } else { (x1 - x0, 1) };
    let (taken, mut error) = bresenham_skip(first - y0, dy, dx);
    let mut x = x0 + step * taken;
    for y in first..=last {
        plot(x, y);
        if error > 0 {
            x += step;
            error -= 2 * dy;
        }
        error += 2 * dx;
    }
}

impl OriginDimensions for Graphics<'_> {
    fn size(&self) -> Size {
        self.display.size()
    }
}

impl DrawTarget for Graphics<'_> {
    type Color = Rgb888;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let display = self.display;
        let mut state = display.state();
        let mut touched = DirtyRegion::EMPTY;
        for Pixel(point, color) in pixels {
            let (x, y) = (i64::from(point.x), i64::from(point.y));
            if !self.clip.contains(x, y) {
                continue;
            }
            let (x, y) = (x as u32, y as u32);
            if let Some(pixel) = state.pixel_mut(x, y) {
                *pixel = argb::from_rgb(color.r(), color.g(), color.b());
                touched.include(x, y, x + 1, y + 1);
            }
        }
        commit(display, &mut state, touched)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let alpha = std::mem::replace(&mut self.alpha_processing, false);
        let result = self.fill_area(
            i64::from(area.top_left.x),
            i64::from(area.top_left.y),
            i64::from(area.size.width),
            i64::from(area.size.height),
            argb::from_rgb(color.r(), color.g(), color.b()),
        );
        self.alpha_processing = alpha;
        result
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let size = self.size();
        self.fill_solid(
            &Rectangle::new(Point::zero(), size),
            color,
        )
    }
}

impl core::fmt::Debug for Graphics<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Graphics")
            .field("color", &format_args!("{:#010x}", self.color))
            .field("has_font", &self.font.is_some())
            .field("text_scale", &self.text_scale)
            .field("clip", &self.clip())
            .field("alpha_processing", &self.alpha_processing)
            .finish_non_exhaustive()
    }
}

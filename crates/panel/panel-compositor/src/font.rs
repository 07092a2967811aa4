//! Glyph lookup contract and a packed bitmap font
//!
//! Fonts are fixed-height cell grids. Each glyph is a row-major, one bit per
//! pixel, MSB-first bitmap living somewhere inside a shared bit blob.

use std::collections::BTreeMap;

/// A glyph bitmap: `width × cell_height` bits starting at `bit_offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph<'a> {
    /// Advance and bitmap width in pixels
    pub width: u32,
    /// Shared bit blob
    pub bitmap: &'a [u8],
    /// First bit of this glyph inside `bitmap`
    pub bit_offset: usize,
}

impl Glyph<'_> {
    /// Whether the pixel at `(x, y)` is set; false outside the glyph
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width {
            return false;
        }
        let bit = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize))
            .and_then(|index| index.checked_add(self.bit_offset));
        bit.and_then(|bit| {
            let byte = self.bitmap.get(bit / 8)?;
            Some(byte & (0x80 >> (bit % 8)) != 0)
        })
        .unwrap_or(false)
    }
}

/// Source of glyphs for text rendering
pub trait Font: Send + Sync {
    /// Default advance, used for characters without a glyph
    fn cell_width(&self) -> u32;

    /// Glyph height; every glyph is exactly this tall
    fn cell_height(&self) -> u32;

    /// Glyph for `character`, if the font has one
    fn glyph(&self, character: char) -> Option<Glyph<'_>>;
}

/// A font stored as one shared bit blob
///
/// # Example
///
/// ```
/// use panel_compositor::{Font, PackedFont};
///
/// let font = PackedFont::new(3, 3).with_glyph('+', &[".#.", "###", ".#."]);
/// let glyph = font.glyph('+').unwrap();
/// assert!(glyph.pixel(1, 0));
/// assert!(!glyph.pixel(0, 0));
/// assert!(font.glyph('-').is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedFont {
    cell_width: u32,
    cell_height: u32,
    bits: Vec<u8>,
    bit_len: usize,
    glyphs: BTreeMap<char, (u32, usize)>,
}

impl PackedFont {
    /// Empty font with the given cell size
    pub fn new(cell_width: u32, cell_height: u32) -> Self {
        Self {
            cell_width,
            cell_height,
            ..Self::default()
        }
    }

    /// Add a glyph drawn as ASCII art
    ///
    /// `#`, `X` and `*` are set pixels, anything else is clear. The glyph is as
    /// wide as its longest row; missing rows are blank and rows beyond the
    /// cell height are dropped. Re-adding a character replaces it.
    pub fn add_glyph(&mut self, character: char, rows: &[&str]) -> &mut Self {
        let width = rows
            .iter()
            .map(|row| row.chars().count())
            .max()
            .unwrap_or(0);
        let offset = self.bit_len;
        for y in 0..self.cell_height as usize {
            let row = rows.get(y).copied().unwrap_or("");
            let mut pixels = row.chars();
            for _ in 0..width {
                let set = matches!(pixels.next(), Some('#' | 'X' | '*'));
                self.push_bit(set);
            }
        }
        self.glyphs
            .insert(character, (u32::try_from(width).unwrap_or(u32::MAX), offset));
        self
    }

    /// Builder form of [`PackedFont::add_glyph`]
    pub fn with_glyph(mut self, character: char, rows: &[&str]) -> Self {
        self.add_glyph(character, rows);
        self
    }

    /// Number of glyphs
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether the font has no glyphs
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    fn push_bit(&mut self, set: bool) {
        let bit = self.bit_len % 8;
        if bit == 0 {
            self.bits.push(0);
        }
        if set {
            if let Some(last) = self.bits.last_mut() {
                *last |= 0x80 >> bit;
            }
        }
        self.bit_len = self.bit_len.saturating_add(1);
    }
}

impl Font for PackedFont {
    fn cell_width(&self) -> u32 {
        self.cell_width
    }

    fn cell_height(&self) -> u32 {
        self.cell_height
    }

    fn glyph(&self, character: char) -> Option<Glyph<'_>> {
        let &(width, bit_offset) = self.glyphs.get(&character)?;
        Some(Glyph {
            width,
            bitmap: &self.bits,
            bit_offset,
        })
    }
}

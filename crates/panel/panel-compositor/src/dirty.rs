//! Dirty region tracking
//!
//! Accumulates the bounding box of every write since the last flush. The
//! region only ever grows until a flush consumes it.

use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;

/// Bounding box of unflushed writes, in logical coordinates
///
/// Bounds are half-open (`x_min..x_max`); `x_min >= x_max` means empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DirtyRegion {
    x_min: u32,
    y_min: u32,
    x_max: u32,
    y_max: u32,
}

impl DirtyRegion {
    pub(crate) const EMPTY: Self = Self {
        x_min: u32::MAX,
        y_min: u32::MAX,
        x_max: 0,
        y_max: 0,
    };

    pub(crate) fn is_empty(&self) -> bool {
        self.x_min >= self.x_max || self.y_min >= self.y_max
    }

    /// Grow to cover `[x0, x1) × [y0, y1)`; empty spans are ignored
    pub(crate) fn include(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) {
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        self.x_min = self.x_min.min(x0);
        self.y_min = self.y_min.min(y0);
        self.x_max = self.x_max.max(x1);
        self.y_max = self.y_max.max(y1);
    }

    /// Half-open bounds `(x0, y0, x1, y1)`, or `None` when empty
    pub(crate) fn bounds(&self) -> Option<(u32, u32, u32, u32)> {
        (!self.is_empty()).then_some((self.x_min, self.y_min, self.x_max, self.y_max))
    }

    /// Same region as an embedded-graphics rectangle
    pub(crate) fn to_rectangle(self) -> Option<Rectangle> {
        let (x0, y0, x1, y1) = self.bounds()?;
        let top_left = Point::new(i32::try_from(x0).ok()?, i32::try_from(y0).ok()?);
        Some(Rectangle::new(
            top_left,
            Size::new(x1.saturating_sub(x0), y1.saturating_sub(y0)),
        ))
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::EMPTY;
    }
}

impl Default for DirtyRegion {
    fn default() -> Self {
        Self::EMPTY
    }
}

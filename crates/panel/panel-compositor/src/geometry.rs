//! Clipping helpers
//!
//! Caller coordinates are signed and may be far off-canvas; sizes are
//! unsigned. All intersection math runs in `i64` so no combination of
//! `i32` origin and `u32` size can overflow.

use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;

/// Half-open rectangle `[x0, x1) × [y0, y1)` in buffer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bounds {
    pub(crate) x0: u32,
    pub(crate) y0: u32,
    pub(crate) x1: u32,
    pub(crate) y1: u32,
}

impl Bounds {
    /// The whole `width × height` canvas
    pub(crate) const fn canvas(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    pub(crate) const fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub(crate) fn contains(&self, x: i64, y: i64) -> bool {
        x >= i64::from(self.x0)
            && x < i64::from(self.x1)
            && y >= i64::from(self.y0)
            && y < i64::from(self.y1)
    }

    /// Intersect the rectangle at `(x, y)` of size `width × height`; `None` if empty
    pub(crate) fn clip(&self, x: i64, y: i64, width: i64, height: i64) -> Option<Self> {
        let x0 = x.max(i64::from(self.x0));
        let y0 = y.max(i64::from(self.y0));
        let x1 = x.saturating_add(width).min(i64::from(self.x1));
        let y1 = y.saturating_add(height).min(i64::from(self.y1));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        // All four values lie within this (u32) bounds after clamping.
        Some(Self {
            x0: to_u32(x0),
            y0: to_u32(y0),
            x1: to_u32(x1),
            y1: to_u32(y1),
        })
    }

    /// Intersect with an embedded-graphics rectangle
    pub(crate) fn clip_rectangle(&self, rect: &Rectangle) -> Option<Self> {
        self.clip(
            i64::from(rect.top_left.x),
            i64::from(rect.top_left.y),
            i64::from(rect.size.width),
            i64::from(rect.size.height),
        )
    }

    pub(crate) fn to_rectangle(self) -> Rectangle {
        Rectangle::new(
            Point::new(to_i32(self.x0), to_i32(self.y0)),
            Size::new(self.width(), self.y1.saturating_sub(self.y0)),
        )
    }
}

/// Clamp into `u32`
pub(crate) fn to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Clamp into `i32`
pub(crate) fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

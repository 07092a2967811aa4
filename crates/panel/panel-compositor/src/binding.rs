//! Panel bindings and the chunked transfer path
//!
//! A binding places one physical panel inside the logical buffer. On flush it
//! maps the dirty rectangle into panel-native coordinates, widens it to the
//! panel's x-granularity, re-encodes the covered pixels and streams them to
//! the driver in row-aligned chunks that fit the binding's scratch buffer.

use panel_specs::alignment::{align_span, align_up};
use panel_specs::{DisplayInfo, Rotation};

use crate::geometry::Bounds;
use crate::{DisplayError, PanelDriver, PanelError};

/// Read-only view of the logical buffer during a flush
pub(crate) struct Canvas<'a> {
    pub(crate) pixels: &'a [u32],
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Canvas<'_> {
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        let index = y.checked_mul(i64::from(self.width))?.checked_add(x)?;
        usize::try_from(index).ok()
    }

    fn get(&self, x: i64, y: i64) -> Option<u32> {
        self.pixels.get(self.index(x, y)?).copied()
    }
}

/// Where a panel sits in the logical buffer and how it is turned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    info: DisplayInfo,
    origin: (i64, i64),
    /// Requested rotation minus the panel's intrinsic rotation
    rotation: Rotation,
    /// Panel size after `rotation`, in logical pixels
    logical_size: (u32, u32),
    granularity: u32,
}

impl Placement {
    /// Panel-native rectangle showing the logical rectangle `[u0, u1) × [v0, v1)`
    ///
    /// Local coordinates are relative to the origin and within `logical_size`.
    // SAFETY: u1 <= lw and v1 <= lh, so every subtraction stays non-negative.
    #[allow(clippy::arithmetic_side_effects)]
    fn panel_rect(&self, u0: u32, v0: u32, u1: u32, v1: u32) -> Bounds {
        let (lw, lh) = self.logical_size;
        let (x0, x1, y0, y1) = match self.rotation {
            Rotation::Degrees0 => (u0, u1, v0, v1),
            Rotation::Degrees90 => (lh - v1, lh - v0, u0, u1),
            Rotation::Degrees180 => (lw - u1, lw - u0, lh - v1, lh - v0),
            Rotation::Degrees270 => (v0, v1, lw - u1, lw - u0),
        };
        Bounds { x0, y0, x1, y1 }
    }

    /// Logical buffer coordinates shown at panel pixel `(px, py)`
    ///
    /// `None` for pixels outside the panel (granularity padding).
    // SAFETY: px < width and py < height bound every subtraction below; the
    // sums are i64 offsets of u32 values.
    #[allow(clippy::arithmetic_side_effects)]
    fn to_logical(&self, px: u32, py: u32) -> Option<(i64, i64)> {
        if px >= self.info.width() || py >= self.info.height() {
            return None;
        }
        let (lw, lh) = self.logical_size;
        let (u, v) = match self.rotation {
            Rotation::Degrees0 => (px, py),
            Rotation::Degrees90 => (py, lh - 1 - px),
            Rotation::Degrees180 => (lw - 1 - px, lh - 1 - py),
            Rotation::Degrees270 => (lw - 1 - py, px),
        };
        Some((self.origin.0 + i64::from(u), self.origin.1 + i64::from(v)))
    }

    /// Source step in the logical buffer for one step along the panel's +x axis
    fn stride_x(&self, canvas_width: u32) -> isize {
        let row = isize::try_from(canvas_width).unwrap_or(isize::MAX);
        match self.rotation {
            Rotation::Degrees0 => 1,
            Rotation::Degrees90 => row.saturating_neg(),
            Rotation::Degrees180 => -1,
            Rotation::Degrees270 => row,
        }
    }

    /// Pack panel row `py`, pixels `[x0, x1)`, at `bit_offset` of `dst`
    #[allow(clippy::too_many_arguments)]
    fn pack_row(
        &self,
        canvas: &Canvas<'_>,
        x0: u32,
        x1: u32,
        py: u32,
        dst: &mut [u8],
        bit_offset: usize,
        direct: bool,
    ) {
        let format = self.info.pixel_format();
        let count = x1.saturating_sub(x0) as usize;
        if direct {
            let start = self
                .to_logical(x0, py)
                .and_then(|(x, y)| canvas.index(x, y));
            if let Some(start) = start {
                format.pack_row(
                    canvas.pixels,
                    start,
                    self.stride_x(canvas.width),
                    dst,
                    bit_offset,
                    count,
                );
                return;
            }
        }
        let mut offset = bit_offset;
        for px in x0..x1 {
            let argb = self
                .to_logical(px, py)
                .and_then(|(x, y)| canvas.get(x, y))
                .unwrap_or(0);
            offset = offset.saturating_add(format.pack_pixel(format.from_argb(argb), dst, offset));
        }
    }

    /// Whether every pixel of the panel rectangle maps into the canvas
    fn fully_inside(&self, canvas: &Canvas<'_>, rect: Bounds) -> bool {
        if rect.x1 > self.info.width() || rect.y1 > self.info.height() {
            return false;
        }
        // The mapping is affine, so the rectangle's image is spanned by two
        // opposite corners.
        let corners = [
            self.to_logical(rect.x0, rect.y0),
            self.to_logical(rect.x1.saturating_sub(1), rect.y1.saturating_sub(1)),
        ];
        corners
            .iter()
            .all(|corner| corner.is_some_and(|(x, y)| canvas.index(x, y).is_some()))
    }
}

/// One attached panel with its private transfer buffer
pub(crate) struct PanelBinding {
    driver: Box<dyn PanelDriver>,
    placement: Placement,
    scratch: Vec<u8>,
}

impl PanelBinding {
    /// Bind `driver` at logical `origin`, turned by `requested`
    ///
    /// Fails if a single panel row cannot fit in `max_transfer_size` bytes.
    pub(crate) fn new(
        driver: Box<dyn PanelDriver>,
        origin: (i32, i32),
        requested: Rotation,
        max_transfer_size: usize,
    ) -> Result<Self, DisplayError> {
        let info = driver.display_info();
        let granularity = info.x_granularity().max(1);
        let rotation = info.resolve_rotation(requested);
        let padded_width = align_up(info.width(), granularity);
        let row_bytes = info.transfer_bytes(padded_width, 1);
        let capacity = max_transfer_size.min(info.transfer_bytes(padded_width, info.height()));
        if row_bytes > capacity {
            return Err(DisplayError::RowExceedsTransfer {
                row_bytes,
                limit: max_transfer_size,
            });
        }
        Ok(Self {
            driver,
            placement: Placement {
                info,
                origin: (i64::from(origin.0), i64::from(origin.1)),
                rotation,
                logical_size: rotation.apply_to_dimensions(info.width(), info.height()),
                granularity,
            },
            scratch: vec![0; capacity],
        })
    }

    pub(crate) fn info(&self) -> DisplayInfo {
        self.placement.info
    }

    pub(crate) fn rotation(&self) -> Rotation {
        self.placement.rotation
    }

    pub(crate) fn logical_size(&self) -> (u32, u32) {
        self.placement.logical_size
    }

    pub(crate) fn transfer_capacity(&self) -> usize {
        self.scratch.len()
    }

    /// Stream the part of the logical `dirty` rectangle this panel shows
    pub(crate) fn transfer(&mut self, canvas: &Canvas<'_>, dirty: Bounds) -> Result<(), PanelError> {
        let placement = self.placement;
        let (lw, lh) = placement.logical_size;
        let (ox, oy) = placement.origin;

        // Dirty rectangle in panel-local logical coordinates, clipped to the panel.
        let local = Bounds::canvas(lw, lh).clip(
            i64::from(dirty.x0).saturating_sub(ox),
            i64::from(dirty.y0).saturating_sub(oy),
            i64::from(dirty.width()),
            i64::from(dirty.y1.saturating_sub(dirty.y0)),
        );
        let Some(local) = local else {
            return Ok(());
        };

        let rect = placement.panel_rect(local.x0, local.y0, local.x1, local.y1);
        let ((x0, x1), _) = align_span(rect.x0, rect.x1, placement.granularity);
        let aligned = Bounds { x0, x1, ..rect };
        let direct = placement.fully_inside(canvas, aligned);

        let format = placement.info.pixel_format();
        let width = aligned.width();
        let bits_per_row = (width as usize).saturating_mul(format.bit_count() as usize);
        let rows_per_chunk = self
            .scratch
            .len()
            .saturating_mul(8)
            .checked_div(bits_per_row)
            .unwrap_or(0)
            .max(1);

        let mut y = aligned.y0;
        while y < aligned.y1 {
            let rows = u32::try_from(rows_per_chunk)
                .unwrap_or(u32::MAX)
                .min(aligned.y1.saturating_sub(y));
            let len = placement.info.transfer_bytes(width, rows);
            let Some(chunk) = self.scratch.get_mut(..len) else {
                return Err(PanelError::InvalidRegion {
                    x: x0,
                    y,
                    width,
                    height: rows,
                });
            };
            chunk.fill(0);
            let mut bit_offset = 0usize;
            for row in y..y.saturating_add(rows) {
                placement.pack_row(canvas, x0, x1, row, chunk, bit_offset, direct);
                bit_offset = bit_offset.saturating_add(bits_per_row);
            }
            tracing::trace!(x = x0, y, width, rows, bytes = len, "streaming chunk");
            self.driver.set_pixels(x0, y, width, rows, chunk)?;
            y = y.saturating_add(rows);
        }
        Ok(())
    }

    pub(crate) fn close(&mut self) -> Result<(), PanelError> {
        self.driver.close()
    }
}

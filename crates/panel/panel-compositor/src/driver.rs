//! Panel driver contract
//!
//! Concrete chips (command-based OLEDs, RAM-window TFTs, address-mapped LED
//! matrices) implement [`PanelDriver`]. The compositor never branches on chip
//! identity; everything it needs is the [`DisplayInfo`] and a way to write a
//! packed rectangle.

use panel_specs::DisplayInfo;

use crate::PanelError;

/// A physical panel that accepts packed native-format rectangles
///
/// # Transfer guarantees
///
/// Every [`set_pixels`](PanelDriver::set_pixels) call made by the compositor
/// satisfies:
/// - `x` and `width` are multiples of [`DisplayInfo::x_granularity`]
/// - `data.len()` equals `ceil(width * height * bits_per_pixel / 8)`
/// - `data.len()` does not exceed the display's configured transfer bound
/// - rows are never split across two calls
pub trait PanelDriver: Send {
    /// Panel descriptor; must not change during the driver's lifetime
    fn display_info(&self) -> DisplayInfo;

    /// Write a packed `width × height` rectangle at panel-native `(x, y)`
    fn set_pixels(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<(), PanelError>;

    /// Release transport resources; nothing to release by default
    fn close(&mut self) -> Result<(), PanelError> {
        Ok(())
    }
}

impl<D: PanelDriver + ?Sized> PanelDriver for Box<D> {
    fn display_info(&self) -> DisplayInfo {
        (**self).display_info()
    }

    fn set_pixels(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<(), PanelError> {
        (**self).set_pixels(x, y, width, height, data)
    }

    fn close(&mut self) -> Result<(), PanelError> {
        (**self).close()
    }
}

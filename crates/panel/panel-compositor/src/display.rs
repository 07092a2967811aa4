//! Display compositor
//!
//! Owns the logical ARGB buffer shared by every drawing context, tracks the
//! dirty rectangle and pushes it to all attached panels, either on request,
//! synchronously after each write, or from a debounced background flush.
//!
//! ## Locking
//!
//! Buffer, dirty region, bindings and the pending flush handle all live in one
//! `Mutex`. Drawing, dirty tracking and panel transfer are serialized by it,
//! so a panel never receives a half-applied draw call.
//!
//! ## Debounced flush
//!
//! With [`TransferDelay::Debounce`] the first write after a flush spawns one
//! timer task on a private single-worker tokio runtime. Further writes only
//! grow the dirty rectangle. The task holds a `Weak` reference, so it never
//! keeps a dropped display alive, and [`Display::close`] aborts it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::Duration;

use embedded_graphics::prelude::Size;
use embedded_graphics::primitives::Rectangle;
use panel_specs::{argb, Rotation};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use crate::binding::{Canvas, PanelBinding};
use crate::dirty::DirtyRegion;
use crate::geometry::Bounds;
use crate::{DisplayConfig, DisplayError, Graphics, PanelDriver, TransferDelay};

/// A logical framebuffer composited onto one or more panels
///
/// `Display` is `Send + Sync`; drawing contexts borrow it and may be used from
/// different threads.
///
/// # Example
///
/// ```
/// use panel_compositor::{Display, DisplayConfig};
///
/// # fn main() -> Result<(), panel_compositor::DisplayError> {
/// let display = Display::virtual_canvas_with_config(32, 16, DisplayConfig::MANUAL);
/// display.fill_rect(0, 0, 4, 4, 0xFFFF_0000)?;
/// assert_eq!(display.pixel(3, 3), Some(0xFFFF_0000));
/// display.flush()?;
/// assert!(display.dirty_region().is_none());
/// # Ok(())
/// # }
/// ```
pub struct Display {
    shared: Arc<Shared>,
    scheduler: OnceLock<Runtime>,
}

struct Shared {
    state: Mutex<State>,
}

/// Everything guarded by the display lock
pub(crate) struct State {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    dirty: DirtyRegion,
    bindings: Vec<PanelBinding>,
    config: DisplayConfig,
    pending: Option<JoinHandle<()>>,
    closed: bool,
}

impl State {
    pub(crate) fn bounds(&self) -> Bounds {
        Bounds::canvas(self.width, self.height)
    }

    /// Pixels `[x0, x1)` of row `y`; `None` outside the buffer
    pub(crate) fn row_mut(&mut self, y: u32, x0: u32, x1: u32) -> Option<&mut [u32]> {
        let start = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x0 as usize)?;
        let end = start.checked_add(x1.checked_sub(x0)? as usize)?;
        if x1 > self.width {
            return None;
        }
        self.pixels.get_mut(start..end)
    }

    pub(crate) fn pixel_mut(&mut self, x: u32, y: u32) -> Option<&mut u32> {
        self.row_mut(y, x, x.checked_add(1)?)?.first_mut()
    }

    fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize).checked_mul(self.width as usize)?.checked_add(x as usize)?;
        self.pixels.get(index).copied()
    }

    /// Fill a pre-clipped rectangle
    pub(crate) fn fill(&mut self, area: Bounds, color: u32) {
        for y in area.y0..area.y1 {
            if let Some(row) = self.row_mut(y, area.x0, area.x1) {
                row.fill(color);
            }
        }
    }

    /// Push the dirty rectangle to every panel and reset it
    ///
    /// On failure the rectangle is kept so the damage is retried by the next
    /// flush.
    fn flush(&mut self) -> Result<(), DisplayError> {
        let Some((x0, y0, x1, y1)) = self.dirty.bounds() else {
            return Ok(());
        };
        let dirty = Bounds { x0, y0, x1, y1 };
        let canvas = Canvas {
            pixels: &self.pixels,
            width: self.width,
            height: self.height,
        };
        for binding in &mut self.bindings {
            binding.transfer(&canvas, dirty)?;
        }
        self.dirty.reset();
        Ok(())
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while drawing leaves the buffer usable; keep going.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_scheduled_flush(&self) {
        let mut state = self.lock();
        state.pending = None;
        if state.closed {
            return;
        }
        if let Err(error) = state.flush() {
            tracing::warn!(%error, "scheduled flush failed; damage kept for the next flush");
        }
    }
}

impl Display {
    /// Display sized after a single panel seen through `rotation`
    pub fn new(driver: impl PanelDriver + 'static, rotation: Rotation) -> Result<Self, DisplayError> {
        Self::with_config(driver, rotation, DisplayConfig::DEFAULT)
    }

    /// [`Display::new`] with an explicit configuration
    pub fn with_config(
        driver: impl PanelDriver + 'static,
        rotation: Rotation,
        config: DisplayConfig,
    ) -> Result<Self, DisplayError> {
        let (width, height) = driver.display_info().logical_dimensions(rotation);
        let display = Self::virtual_canvas_with_config(width, height, config);
        display.attach(0, 0, driver, rotation)?;
        Ok(display)
    }

    /// Panel-less canvas; attach panels with [`Display::attach`]
    pub fn virtual_canvas(width: u32, height: u32) -> Self {
        Self::virtual_canvas_with_config(width, height, DisplayConfig::DEFAULT)
    }

    /// [`Display::virtual_canvas`] with an explicit configuration
    pub fn virtual_canvas_with_config(width: u32, height: u32, config: DisplayConfig) -> Self {
        let len = (width as usize).saturating_mul(height as usize);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    width,
                    height,
                    pixels: vec![0; len],
                    dirty: DirtyRegion::EMPTY,
                    bindings: Vec::new(),
                    config,
                    pending: None,
                    closed: false,
                }),
            }),
            scheduler: OnceLock::new(),
        }
    }

    /// Show `driver` at logical `(x, y)`, turned by `rotation`
    ///
    /// The panel covers the logical rectangle at `(x, y)` whose size is the
    /// panel's size after rotation; parts outside the canvas transfer as black.
    /// Panels cannot be detached. Nothing is sent until the covered area is
    /// next modified. Fails with [`DisplayError::Closed`] after
    /// [`Display::close`].
    pub fn attach(
        &self,
        x: i32,
        y: i32,
        driver: impl PanelDriver + 'static,
        rotation: Rotation,
    ) -> Result<(), DisplayError> {
        let mut state = self.state();
        if state.closed {
            return Err(DisplayError::Closed);
        }
        let binding = PanelBinding::new(
            Box::new(driver),
            (x, y),
            rotation,
            state.config.max_transfer_size,
        )?;
        let info = binding.info();
        let (width, height) = binding.logical_size();
        tracing::debug!(
            x,
            y,
            width,
            height,
            format = ?info.pixel_format(),
            rotation = binding.rotation().degrees(),
            transfer_bytes = binding.transfer_capacity(),
            "panel attached"
        );
        state.bindings.push(binding);
        Ok(())
    }

    /// Logical width in pixels
    pub fn width(&self) -> u32 {
        self.state().width
    }

    /// Logical height in pixels
    pub fn height(&self) -> u32 {
        self.state().height
    }

    /// Logical size
    pub fn size(&self) -> Size {
        let state = self.state();
        Size::new(state.width, state.height)
    }

    /// Number of attached panels
    pub fn panel_count(&self) -> usize {
        self.state().bindings.len()
    }

    /// Current buffer content at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.state().pixel(x, y)
    }

    /// Pending damage, if any
    pub fn dirty_region(&self) -> Option<Rectangle> {
        self.state().dirty.to_rectangle()
    }

    /// Whether [`Display::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Current flush policy
    pub fn transfer_delay(&self) -> TransferDelay {
        self.state().config.transfer_delay
    }

    /// Change the flush policy; applies to the next write
    pub fn set_transfer_delay(&self, delay: TransferDelay) {
        self.state().config.transfer_delay = delay;
    }

    /// A new drawing context over this display
    pub fn graphics(&self) -> Graphics<'_> {
        Graphics::new(self)
    }

    /// Set one pixel; off-canvas coordinates are ignored
    pub fn set_pixel(&self, x: i32, y: i32, color: u32) -> Result<(), DisplayError> {
        self.fill_rect(x, y, 1, 1, color)
    }

    /// Fill a rectangle, clipped to the canvas
    pub fn fill_rect(&self, x: i32, y: i32, width: u32, height: u32, color: u32) -> Result<(), DisplayError> {
        let mut state = self.state();
        let Some(area) = state.bounds().clip(
            i64::from(x),
            i64::from(y),
            i64::from(width),
            i64::from(height),
        ) else {
            return Ok(());
        };
        state.fill(area, color);
        self.mark_modified(&mut state, area)
    }

    /// Copy a row-major `width × height` ARGB image, clipped to the canvas
    ///
    /// Source alpha is ignored; the copy is opaque.
    // SAFETY: the clipped area lies inside both the canvas and the source
    // image, whose length was checked against width * height above.
    #[allow(
        clippy::arithmetic_side_effects,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn draw_image(
        &self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        pixels: &[u32],
    ) -> Result<(), DisplayError> {
        let needed = (width as usize).saturating_mul(height as usize);
        if pixels.len() < needed {
            return Err(DisplayError::SourceTooShort {
                needed,
                actual: pixels.len(),
            });
        }
        let mut state = self.state();
        let Some(area) = state.bounds().clip(
            i64::from(x),
            i64::from(y),
            i64::from(width),
            i64::from(height),
        ) else {
            return Ok(());
        };
        // Offsets of the clipped area inside the source image.
        let skip_x = (i64::from(area.x0) - i64::from(x)) as usize;
        let skip_y = (i64::from(area.y0) - i64::from(y)) as usize;
        for (row_index, dst_y) in (area.y0..area.y1).enumerate() {
            let start = (skip_y + row_index) * width as usize + skip_x;
            let src = pixels.get(start..start + area.width() as usize);
            let dst = state.row_mut(dst_y, area.x0, area.x1);
            if let (Some(src), Some(dst)) = (src, dst) {
                for (dst, src) in dst.iter_mut().zip(src) {
                    *dst = argb::opaque(*src);
                }
            }
        }
        self.mark_modified(&mut state, area)
    }

    /// Push all pending damage to the panels now
    ///
    /// Blocks until every driver call returns. A no-op when nothing changed.
    pub fn flush(&self) -> Result<(), DisplayError> {
        self.state().flush()
    }

    /// Flush, cancel any scheduled flush and close every panel
    ///
    /// All panels are closed even if some fail; the first close failure is
    /// returned together with the failure count, and a failed final flush is
    /// logged. Panels are released afterwards, so later writes only touch the
    /// buffer.
    pub fn close(&self) -> Result<(), DisplayError> {
        let mut state = self.state();
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        let flushed = state.flush();
        state.closed = true;

        let mut failures = 0usize;
        let mut first = None;
        for (panel, mut binding) in state.bindings.drain(..).enumerate() {
            if let Err(error) = binding.close() {
                tracing::error!(panel, %error, "panel close failed");
                failures = failures.saturating_add(1);
                first.get_or_insert(error);
            }
        }
        tracing::debug!(failures, "display closed");

        match (first, flushed) {
            (Some(source), Err(error)) => {
                tracing::error!(%error, "final flush failed before close");
                Err(DisplayError::Close { failures, source })
            }
            (Some(source), Ok(())) => Err(DisplayError::Close { failures, source }),
            (None, flushed) => flushed,
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, State> {
        self.shared.lock()
    }

    /// Grow the dirty rectangle by `area` and apply the flush policy
    pub(crate) fn mark_modified(&self, state: &mut State, area: Bounds) -> Result<(), DisplayError> {
        if area.is_empty() {
            return Ok(());
        }
        state.dirty.include(area.x0, area.y0, area.x1, area.y1);
        match state.config.transfer_delay {
            TransferDelay::Immediate => state.flush(),
            TransferDelay::Manual => Ok(()),
            TransferDelay::Debounce(delay) if delay.is_zero() => state.flush(),
            TransferDelay::Debounce(delay) => self.schedule(state, delay),
        }
    }

    fn schedule(&self, state: &mut State, delay: Duration) -> Result<(), DisplayError> {
        let already_pending = state
            .pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished());
        if already_pending || state.closed {
            return Ok(());
        }
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let task = self.scheduler()?.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                shared.run_scheduled_flush();
            }
        });
        tracing::trace!(delay_ms = delay.as_millis(), "flush scheduled");
        state.pending = Some(task);
        Ok(())
    }

    /// Lazily started timer runtime
    ///
    /// Only called with the display lock held, so at most one runtime is built.
    fn scheduler(&self) -> Result<&Runtime, DisplayError> {
        if let Some(runtime) = self.scheduler.get() {
            return Ok(runtime);
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("panel-flush")
            .enable_time()
            .build()
            .map_err(DisplayError::Scheduler)?;
        Ok(self.scheduler.get_or_init(|| runtime))
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        if let Some(pending) = self.state().pending.take() {
            pending.abort();
        }
        // Never blocks, so dropping from inside another runtime is fine.
        if let Some(runtime) = self.scheduler.take() {
            runtime.shutdown_background();
        }
    }
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Display")
            .field("width", &state.width)
            .field("height", &state.height)
            .field("panels", &state.bindings.len())
            .field("config", &state.config)
            .field("dirty", &state.dirty.to_rectangle())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use embedded_graphics::prelude::Point;

    #[test]
    fn test_virtual_canvas_starts_clean() {
        let display = Display::virtual_canvas(10, 5);
        assert_eq!(display.size(), Size::new(10, 5));
        assert_eq!(display.panel_count(), 0);
        assert_eq!(display.dirty_region(), None);
        assert_eq!(display.pixel(9, 4), Some(0));
        assert_eq!(display.pixel(10, 0), None);
    }

    #[test]
    fn test_set_pixel_off_canvas_is_ignored() {
        let display = Display::virtual_canvas_with_config(4, 4, DisplayConfig::MANUAL);
        display.set_pixel(-1, 0, 0xFFFF_FFFF).unwrap();
        display.set_pixel(4, 0, 0xFFFF_FFFF).unwrap();
        assert_eq!(display.dirty_region(), None);
    }

    #[test]
    fn test_dirty_region_is_bounding_box() {
        let display = Display::virtual_canvas_with_config(20, 20, DisplayConfig::MANUAL);
        display.set_pixel(3, 4, 1).unwrap();
        display.fill_rect(10, 12, 2, 3, 1).unwrap();
        assert_eq!(
            display.dirty_region(),
            Some(Rectangle::new(Point::new(3, 4), Size::new(9, 11)))
        );
        display.flush().unwrap();
        assert_eq!(display.dirty_region(), None);
    }

    #[test]
    fn test_draw_image_clips_and_forces_opaque() {
        let display = Display::virtual_canvas_with_config(3, 3, DisplayConfig::MANUAL);
        let image = [0x0000_0001, 0x0000_0002, 0x0000_0003, 0x0000_0004];
        display.draw_image(-1, 2, 2, 2, &image).unwrap();
        assert_eq!(display.pixel(0, 2), Some(0xFF00_0002));
        assert_eq!(display.pixel(1, 2), Some(0));
        assert_eq!(
            display.dirty_region(),
            Some(Rectangle::new(Point::new(0, 2), Size::new(1, 1)))
        );
    }

    #[test]
    fn test_draw_image_rejects_short_source() {
        let display = Display::virtual_canvas(3, 3);
        let result = display.draw_image(0, 0, 2, 2, &[0; 3]);
        assert!(matches!(
            result,
            Err(DisplayError::SourceTooShort {
                needed: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_display_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Display>();
    }
}

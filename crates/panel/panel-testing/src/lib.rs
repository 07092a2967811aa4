//! Panel Testing Utilities
//!
//! Test doubles for exercising `panel-compositor` without hardware.
//!
//! - [`RecordingPanel`]: records every transfer, checks the transfer
//!   contract and keeps a decoded copy of the panel's RAM
//! - [`MappedPanel`]: LED-matrix style panel that scatters pixels to
//!   arbitrary strip addresses
//! - [`FailingPanel`]: injects transport and close faults
//! - [`test_font_5x8`], [`test_color`], [`gradient`]: fixtures
//!
//! Every double is a cheap `Clone` handle: hand one clone to the display and
//! keep another to inspect what arrived.
//!
//! # Quick start
//!
//! ```
//! use panel_compositor::{Display, DisplayConfig, PixelFormat, Rotation};
//! use panel_testing::RecordingPanel;
//!
//! let panel = RecordingPanel::with_format(16, 8, PixelFormat::Rgb565);
//! let display = Display::with_config(panel.clone(), Rotation::Degrees0, DisplayConfig::IMMEDIATE).unwrap();
//!
//! display.set_pixel(3, 2, 0xFFFF_0000).unwrap();
//! assert_eq!(panel.transfer_count(), 1);
//! assert_eq!(panel.pixel(3, 2), Some(0xFFFF_0000));
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
// Test support: decoding math runs on sizes already validated against the
// panel descriptor.
#![allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::indexing_slicing
)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use panel_compositor::{argb, Display, DisplayError, PackedFont, PanelDriver, PanelError};
use panel_specs::alignment::{align_up, is_aligned};
use panel_specs::{DisplayInfo, PixelFormat};

pub use panel_compositor::Font;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn injected(what: &str) -> PanelError {
    PanelError::transport(std::io::Error::other(format!("injected {what} fault")))
}

/// Check a transfer against the driver contract
fn validate(info: &DisplayInfo, x: u32, y: u32, width: u32, height: u32, data: &[u8]) -> Result<(), PanelError> {
    let g = info.x_granularity();
    let padded_width = align_up(info.width(), g);
    let aligned = is_aligned(x, g) && is_aligned(width, g);
    let fits = x.checked_add(width).is_some_and(|right| right <= padded_width)
        && y.checked_add(height).is_some_and(|bottom| bottom <= info.height());
    let sized = data.len() == info.transfer_bytes(width, height);
    if width == 0 || height == 0 || !aligned || !fits || !sized {
        return Err(PanelError::InvalidRegion { x, y, width, height });
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// RecordingPanel
// ─────────────────────────────────────────────────────────────────────────────

/// One `set_pixels` call as the driver received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Panel-native x
    pub x: u32,
    /// Panel-native y
    pub y: u32,
    /// Rectangle width
    pub width: u32,
    /// Rectangle height
    pub height: u32,
    /// Packed native pixels
    pub data: Vec<u8>,
}

#[derive(Debug)]
struct Recording {
    transfers: Vec<Transfer>,
    /// Native pixel values, `width × height`, row-major
    image: Vec<u32>,
    closed: bool,
}

/// An in-memory panel that records every transfer
#[derive(Clone)]
pub struct RecordingPanel {
    info: DisplayInfo,
    inner: Arc<Mutex<Recording>>,
}

impl RecordingPanel {
    /// Panel described by `info`; RAM starts at native zero
    pub fn new(info: DisplayInfo) -> Self {
        let len = info.width() as usize * info.height() as usize;
        Self {
            info,
            inner: Arc::new(Mutex::new(Recording {
                transfers: Vec::new(),
                image: vec![0; len],
                closed: false,
            })),
        }
    }

    /// Unrotated `width × height` panel in `format`
    pub fn with_format(width: u32, height: u32, format: PixelFormat) -> Self {
        Self::new(DisplayInfo::new(width, height, format))
    }

    /// The descriptor this panel reports
    pub fn info(&self) -> DisplayInfo {
        self.info
    }

    /// Every transfer so far, oldest first
    pub fn transfers(&self) -> Vec<Transfer> {
        lock(&self.inner).transfers.clone()
    }

    /// Number of `set_pixels` calls accepted
    pub fn transfer_count(&self) -> usize {
        lock(&self.inner).transfers.len()
    }

    /// Sum of all transfer payloads
    pub fn total_bytes(&self) -> usize {
        lock(&self.inner).transfers.iter().map(|t| t.data.len()).sum()
    }

    /// All payload bytes concatenated in arrival order
    pub fn bytes(&self) -> Vec<u8> {
        lock(&self.inner)
            .transfers
            .iter()
            .flat_map(|t| t.data.iter().copied())
            .collect()
    }

    /// Forget recorded transfers; the panel RAM is kept
    pub fn clear_transfers(&self) {
        lock(&self.inner).transfers.clear();
    }

    /// Native value at panel `(x, y)`
    pub fn native(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.info.width() || y >= self.info.height() {
            return None;
        }
        let index = y as usize * self.info.width() as usize + x as usize;
        lock(&self.inner).image.get(index).copied()
    }

    /// Panel RAM at `(x, y)` decoded back to opaque ARGB
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.native(x, y)
            .map(|native| self.info.pixel_format().to_argb(native))
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        lock(&self.inner).closed
    }
}

impl PanelDriver for RecordingPanel {
    fn display_info(&self) -> DisplayInfo {
        self.info
    }

    fn set_pixels(&mut self, x: u32, y: u32, width: u32, height: u32, data: &[u8]) -> Result<(), PanelError> {
        let mut recording = lock(&self.inner);
        if recording.closed {
            return Err(PanelError::Closed);
        }
        validate(&self.info, x, y, width, height, data)?;

        let format = self.info.pixel_format();
        let bits = format.bit_count() as usize;
        let panel_width = self.info.width();
        for row in 0..height {
            for column in 0..width {
                let px = x + column;
                if px >= panel_width {
                    continue;
                }
                let bit = (row as usize * width as usize + column as usize) * bits;
                let index = (y + row) as usize * panel_width as usize + px as usize;
                recording.image[index] = format.unpack_pixel(data, bit);
            }
        }
        recording.transfers.push(Transfer {
            x,
            y,
            width,
            height,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn close(&mut self) -> Result<(), PanelError> {
        lock(&self.inner).closed = true;
        Ok(())
    }
}

impl fmt::Debug for RecordingPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingPanel")
            .field("info", &self.info)
            .field("transfers", &self.transfer_count())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MappedPanel
// ─────────────────────────────────────────────────────────────────────────────

type AddressMap = dyn Fn(u32, u32) -> u32 + Send + Sync;

/// An RGB888 LED matrix wired as a snaking strip
///
/// Each panel pixel is forwarded to the strip address given by the mapping;
/// the strip stores `0x00RRGGBB`.
#[derive(Clone)]
pub struct MappedPanel {
    info: DisplayInfo,
    map: Arc<AddressMap>,
    strip: Arc<Mutex<BTreeMap<u32, u32>>>,
}

impl MappedPanel {
    /// `width × height` panel whose pixel `(x, y)` drives strip address `map(x, y)`
    pub fn new(width: u32, height: u32, map: impl Fn(u32, u32) -> u32 + Send + Sync + 'static) -> Self {
        Self {
            info: DisplayInfo::new(width, height, PixelFormat::Rgb888),
            map: Arc::new(map),
            strip: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Last value written to `address`
    pub fn value(&self, address: u32) -> Option<u32> {
        lock(&self.strip).get(&address).copied()
    }

    /// Addresses currently holding a non-black value, ascending
    pub fn lit_addresses(&self) -> Vec<u32> {
        lock(&self.strip)
            .iter()
            .filter(|(_, value)| **value != 0)
            .map(|(address, _)| *address)
            .collect()
    }
}

impl PanelDriver for MappedPanel {
    fn display_info(&self) -> DisplayInfo {
        self.info
    }

    fn set_pixels(&mut self, x: u32, y: u32, width: u32, height: u32, data: &[u8]) -> Result<(), PanelError> {
        validate(&self.info, x, y, width, height, data)?;
        let mut strip = lock(&self.strip);
        for (index, rgb) in data.chunks_exact(3).enumerate() {
            let column = index as u32 % width;
            let row = index as u32 / width;
            let color = u32::from(rgb[0]) << 16 | u32::from(rgb[1]) << 8 | u32::from(rgb[2]);
            strip.insert((self.map)(x + column, y + row), color);
        }
        Ok(())
    }
}

impl fmt::Debug for MappedPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedPanel")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FailingPanel
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Faults {
    fail_transfers: bool,
    fail_close: bool,
    transfer_attempts: usize,
    close_attempts: usize,
}

/// A panel whose transfers and close can be made to fail
#[derive(Debug, Clone)]
pub struct FailingPanel {
    info: DisplayInfo,
    faults: Arc<Mutex<Faults>>,
}

impl FailingPanel {
    /// Healthy panel; switch faults on with the setters
    pub fn new(info: DisplayInfo) -> Self {
        Self {
            info,
            faults: Arc::default(),
        }
    }

    /// Panel that accepts transfers but fails to close
    pub fn failing_close(info: DisplayInfo) -> Self {
        let panel = Self::new(info);
        panel.set_fail_close(true);
        panel
    }

    /// Make every following `set_pixels` fail
    pub fn set_fail_transfers(&self, fail: bool) {
        lock(&self.faults).fail_transfers = fail;
    }

    /// Make every following `close` fail
    pub fn set_fail_close(&self, fail: bool) {
        lock(&self.faults).fail_close = fail;
    }

    /// `set_pixels` calls seen, failed or not
    pub fn transfer_attempts(&self) -> usize {
        lock(&self.faults).transfer_attempts
    }

    /// `close` calls seen, failed or not
    pub fn close_attempts(&self) -> usize {
        lock(&self.faults).close_attempts
    }
}

impl PanelDriver for FailingPanel {
    fn display_info(&self) -> DisplayInfo {
        self.info
    }

    fn set_pixels(&mut self, x: u32, y: u32, width: u32, height: u32, data: &[u8]) -> Result<(), PanelError> {
        let mut faults = lock(&self.faults);
        faults.transfer_attempts += 1;
        if faults.fail_transfers {
            return Err(injected("transfer"));
        }
        validate(&self.info, x, y, width, height, data)
    }

    fn close(&mut self) -> Result<(), PanelError> {
        let mut faults = lock(&self.faults);
        faults.close_attempts += 1;
        if faults.fail_close {
            return Err(injected("close"));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// Small font with 5-pixel glyphs in 6 × 8 cells
///
/// Covers `X`, `I`, `O`, `-` and space; the top row and the left column are
/// spacing.
pub fn test_font_5x8() -> PackedFont {
    PackedFont::new(6, 8)
        .with_glyph(
            'X',
            &[
                "......", ".X...X", ".X...X", "..X.X.", "...X..", "..X.X.", ".X...X", ".X...X",
            ],
        )
        .with_glyph(
            'I',
            &[
                "......", ".XXXXX", "...X..", "...X..", "...X..", "...X..", "...X..", ".XXXXX",
            ],
        )
        .with_glyph(
            'O',
            &[
                "......", "..XXX.", ".X...X", ".X...X", ".X...X", ".X...X", ".X...X", "..XXX.",
            ],
        )
        .with_glyph('-', &["......", "......", "......", "......", ".XXXXX", "......"])
        .with_glyph(' ', &["......"])
}

/// Deterministic opaque color for logical pixel `(x, y)`
///
/// Distinct for every coordinate below 256 × 256.
pub fn test_color(x: u32, y: u32) -> u32 {
    argb::from_rgb(x as u8, y as u8, (x ^ y) as u8 ^ 0x5A)
}

/// Row-major `width × height` image of [`test_color`] values
pub fn gradient(width: u32, height: u32) -> Vec<u32> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| test_color(x, y)))
        .collect()
}

/// Cover the whole display with [`gradient`]
pub fn draw_gradient(display: &Display) -> Result<(), DisplayError> {
    let size = display.size();
    display.draw_image(0, 0, size.width, size.height, &gradient(size.width, size.height))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_recording_panel_rejects_misaligned() {
        let mut panel = RecordingPanel::with_format(8, 2, PixelFormat::Monochrome);
        let result = panel.set_pixels(1, 0, 8, 1, &[0]);
        assert!(matches!(result, Err(PanelError::InvalidRegion { x: 1, .. })));
        assert_eq!(panel.transfer_count(), 0);
    }

    #[test]
    fn test_recording_panel_rejects_wrong_length() {
        let mut panel = RecordingPanel::with_format(4, 4, PixelFormat::Rgb565);
        assert!(panel.set_pixels(0, 0, 2, 1, &[0; 3]).is_err());
        assert!(panel.set_pixels(0, 0, 2, 1, &[0; 4]).is_ok());
    }

    #[test]
    fn test_recording_panel_decodes_ram() {
        let mut panel = RecordingPanel::with_format(2, 1, PixelFormat::Rgb888);
        panel
            .set_pixels(0, 0, 2, 1, &[0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF])
            .unwrap();
        assert_eq!(panel.pixel(0, 0), Some(argb::RED));
        assert_eq!(panel.pixel(1, 0), Some(argb::BLUE));
        assert_eq!(panel.pixel(2, 0), None);
    }

    #[test]
    fn test_closed_panel_refuses_transfers() {
        let mut panel = RecordingPanel::with_format(1, 1, PixelFormat::Rgb888);
        panel.close().unwrap();
        assert!(panel.is_closed());
        assert!(matches!(panel.set_pixels(0, 0, 1, 1, &[0; 3]), Err(PanelError::Closed)));
    }

    #[test]
    fn test_mapped_panel_scatters() {
        let mut panel = MappedPanel::new(2, 2, |x, y| 10 * x + y);
        panel
            .set_pixels(0, 0, 2, 2, &[1, 2, 3, 0, 0, 0, 0, 0, 0, 4, 5, 6])
            .unwrap();
        assert_eq!(panel.value(0), Some(0x0001_0203));
        assert_eq!(panel.value(11), Some(0x0004_0506));
        assert_eq!(panel.lit_addresses(), vec![0, 11]);
    }

    #[test]
    fn test_failing_panel_counts_attempts() {
        let mut panel = FailingPanel::new(DisplayInfo::new(1, 1, PixelFormat::Rgb888));
        panel.set_fail_transfers(true);
        assert!(panel.set_pixels(0, 0, 1, 1, &[0; 3]).is_err());
        panel.set_fail_transfers(false);
        assert!(panel.set_pixels(0, 0, 1, 1, &[0; 3]).is_ok());
        assert_eq!(panel.transfer_attempts(), 2);
    }

    #[test]
    fn test_colors_are_distinct_and_opaque() {
        let image = gradient(16, 16);
        let mut sorted = image.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), image.len());
        assert!(image.iter().all(|c| argb::alpha(*c) == 0xFF));
    }

    #[test]
    fn test_font_shape() {
        let font = test_font_5x8();
        assert_eq!((font.cell_width(), font.cell_height()), (6, 8));
        let x = font.glyph('X').unwrap();
        assert!(x.pixel(3, 4));
        assert!(!x.pixel(0, 0));
    }
}

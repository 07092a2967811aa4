//! Pre-configured panel descriptors
//!
//! Descriptors for common controller/panel combinations as their drivers
//! present them.

use crate::{DisplayInfo, PixelFormat, Rotation};

/// SH1106 128×64 monochrome OLED
///
/// The driver addresses RAM in 8-pixel pages that run across the long side,
/// so it presents a 64×128 panel already rotated by 90°. Requesting
/// `Rotation::Degrees90` yields an unrotated transfer.
pub const SH1106_128X64: DisplayInfo =
    DisplayInfo::with_layout(64, 128, PixelFormat::Monochrome, 8, Rotation::Degrees90);

/// ST7789 240×240 TFT in 16-bit mode
pub const ST7789_240X240: DisplayInfo = DisplayInfo::new(240, 240, PixelFormat::Rgb565);

/// ST7789 240×240 TFT in 12-bit mode (fewer bytes per transfer)
pub const ST7789_240X240_444: DisplayInfo = DisplayInfo::new(240, 240, PixelFormat::Rgb444);

/// ST7735 128×128 TFT in 16-bit mode
pub const ST7735_128X128: DisplayInfo = DisplayInfo::new(128, 128, PixelFormat::Rgb565);

/// 8×8 WS2812-style LED matrix (green-first byte order)
pub const LED_MATRIX_8X8: DisplayInfo = DisplayInfo::new(8, 8, PixelFormat::Grb888);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sh1106_requested_rotation_cancels() {
        assert_eq!(
            SH1106_128X64.logical_dimensions(Rotation::Degrees90),
            (64, 128)
        );
        assert_eq!(
            SH1106_128X64.logical_dimensions(Rotation::Degrees0),
            (128, 64)
        );
    }

    #[test]
    fn test_frame_sizes() {
        assert_eq!(SH1106_128X64.frame_bytes(), 1024);
        assert_eq!(ST7789_240X240.frame_bytes(), 115_200);
        assert_eq!(ST7789_240X240_444.frame_bytes(), 86_400);
        assert_eq!(LED_MATRIX_8X8.frame_bytes(), 192);
    }
}

//! Drawing contexts end to end: text, indexed images, blending and
//! embedded-graphics primitives, checked at the panel.

// Integration test file: unwrap/arithmetic lints are overly strict for tests
// where panics on failure are intentional.
#![allow(
    clippy::arithmetic_side_effects,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]

use std::sync::Arc;

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{Point, Primitive, Size};
use embedded_graphics::primitives::{Circle, PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use embedded_graphics::Drawable;
use panel_compositor::{argb, Display, DisplayConfig, IndexedImage, PixelFormat, Rotation, TextGrid};
use panel_testing::{test_font_5x8, MappedPanel, RecordingPanel};

/// Snaking 5 × 8 LED strip: even columns run down, odd columns run up.
fn zigzag_5x8() -> MappedPanel {
    MappedPanel::new(5, 8, |x, y| match x {
        0 => 96 + y,
        1 => 95 - y,
        2 => 48 + y,
        3 => 47 - y,
        _ => y,
    })
}

#[test]
fn test_text_on_zigzag_strip() {
    let panel = zigzag_5x8();
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, DisplayConfig::IMMEDIATE).unwrap();

    let mut g = display.graphics();
    g.set_color(0xFFFF_FFFF);
    g.set_font(Arc::new(test_font_5x8()));
    g.render_text(-1, 7, "X").unwrap();

    let mut expected = vec![96, 0, 97, 1, 93, 45, 51, 91, 43, 101, 5, 102, 6];
    expected.sort_unstable();
    assert_eq!(panel.lit_addresses(), expected);
    for address in expected {
        assert_eq!(panel.value(address), Some(0x00FF_FFFF));
    }
}

#[test]
fn test_monospaced_advance() {
    let display = Display::virtual_canvas_with_config(200, 20, DisplayConfig::MANUAL);
    let mut g = display.graphics();
    g.set_font(Arc::new(test_font_5x8()));
    let text = "IO-X IOX";
    assert_eq!(g.render_text(1, 8, text).unwrap(), text.len() as u32 * 6);
}

#[test]
fn test_text_on_rotated_panel() {
    let panel = RecordingPanel::with_format(8, 16, PixelFormat::Rgb565);
    let display = Display::with_config(panel.clone(), Rotation::Degrees90, DisplayConfig::MANUAL).unwrap();
    assert_eq!((display.width(), display.height()), (16, 8));

    let mut g = display.graphics();
    g.set_font(Arc::new(test_font_5x8()));
    g.set_color(argb::WHITE);
    g.render_text(0, 8, "I").unwrap();
    display.flush().unwrap();

    // Top bar of the I: logical (1..6, 1) lands in panel column 8 - 1 - 1.
    for x in 1..6 {
        assert_eq!(panel.pixel(6, x), Some(argb::WHITE));
    }
    assert_eq!(panel.pixel(7, 0), Some(argb::BLACK));
}

#[test]
fn test_text_grid_writes_cells() {
    let panel = RecordingPanel::with_format(24, 16, PixelFormat::Rgb888);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, DisplayConfig::MANUAL).unwrap();

    let mut grid = TextGrid::new(&display, Arc::new(test_font_5x8()), 1);
    assert_eq!((grid.columns(), grid.rows()), (4, 2));
    grid.set_colors(argb::GREEN, argb::BLUE);
    grid.clear().unwrap();
    grid.write_at(2, 1, "X", true).unwrap();
    display.flush().unwrap();

    // Inverse: blue glyph on a green cell.
    assert_eq!(panel.pixel(12, 8), Some(argb::GREEN));
    assert_eq!(panel.pixel(13, 9), Some(argb::BLUE));
    assert_eq!(panel.pixel(0, 0), Some(argb::BLUE));
}

#[test]
fn test_indexed_sprite_scaled_and_transparent() {
    let display = Display::virtual_canvas_with_config(8, 8, DisplayConfig::MANUAL);
    display.fill_rect(0, 0, 8, 8, argb::BLACK).unwrap();

    let mut g = display.graphics();
    g.set_alpha_processing(true);
    // 2 × 2 sprite, 1 bpp: a diagonal.
    let sprite = IndexedImage::new(&[0b1001_0000], 1, 2, 2);
    g.draw_indexed(2, 2, &sprite, &[argb::TRANSPARENT, argb::RED], 2, 2)
        .unwrap();

    assert_eq!(display.pixel(2, 2), Some(argb::RED));
    assert_eq!(display.pixel(3, 3), Some(argb::RED));
    assert_eq!(display.pixel(4, 2), Some(argb::BLACK));
    assert_eq!(display.pixel(5, 5), Some(argb::RED));
    assert_eq!(
        display.dirty_region(),
        Some(Rectangle::new(Point::new(0, 0), Size::new(8, 8)))
    );
}

#[test]
fn test_half_alpha_reaches_panel_blended() {
    let panel = RecordingPanel::with_format(4, 1, PixelFormat::Rgb888);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, DisplayConfig::IMMEDIATE).unwrap();
    display.fill_rect(0, 0, 4, 1, argb::BLACK).unwrap();

    let mut g = display.graphics();
    g.set_alpha_processing(true);
    g.set_color(0x80FF_FFFF);
    g.fill_rect(0, 0, 2, 1).unwrap();

    let shown = panel.pixel(1, 0).unwrap();
    for channel in [argb::red(shown), argb::green(shown), argb::blue(shown)] {
        assert!((0x7F..=0x80).contains(&channel));
    }
    assert_eq!(panel.pixel(2, 0), Some(argb::BLACK));
}

#[test]
fn test_embedded_graphics_respects_clip() {
    let display = Display::virtual_canvas_with_config(32, 32, DisplayConfig::MANUAL);
    let mut g = display.graphics();
    g.set_clip(Rectangle::new(Point::new(0, 0), Size::new(16, 32)));

    Circle::new(Point::new(4, 4), 24)
        .into_styled(PrimitiveStyle::with_fill(Rgb888::CYAN))
        .draw(&mut g)
        .unwrap();
    Rectangle::new(Point::new(10, 0), Size::new(20, 2))
        .into_styled(PrimitiveStyle::with_fill(Rgb888::YELLOW))
        .draw(&mut g)
        .unwrap();

    assert_eq!(display.pixel(15, 16), Some(0xFF00_FFFF));
    assert_eq!(display.pixel(16, 16), Some(0));
    assert_eq!(display.pixel(12, 1), Some(0xFFFF_FF00));
    assert_eq!(display.pixel(20, 1), Some(0));
    let dirty = display.dirty_region().unwrap();
    assert!(dirty.top_left.x + dirty.size.width as i32 <= 16);
}

#[test]
fn test_embedded_graphics_text() {
    let panel = RecordingPanel::with_format(64, 16, PixelFormat::Rgb565);
    let display = Display::with_config(panel.clone(), Rotation::Degrees0, DisplayConfig::MANUAL).unwrap();
    let mut g = display.graphics();
    Text::new("Hi", Point::new(0, 10), MonoTextStyle::new(&FONT_6X10, Rgb888::WHITE))
        .draw(&mut g)
        .unwrap();
    display.flush().unwrap();

    assert!(panel.transfer_count() > 0);
    let lit = (0..12)
        .flat_map(|x| (0..16).map(move |y| (x, y)))
        .filter(|&(x, y)| panel.pixel(x, y) == Some(argb::WHITE))
        .count();
    assert!(lit > 10);
}

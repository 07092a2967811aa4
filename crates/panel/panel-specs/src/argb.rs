//! Helpers for 32-bit ARGB colors (`0xAARRGGBB`)

// SAFETY: all arithmetic here works on 8-bit channel values widened to u32 or
// on floats clamped to 0..=1; none of it can overflow.
#![allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

/// Fully transparent black
pub const TRANSPARENT: u32 = 0x0000_0000;
/// Opaque black
pub const BLACK: u32 = 0xFF00_0000;
/// Opaque white
pub const WHITE: u32 = 0xFFFF_FFFF;
/// Opaque red
pub const RED: u32 = 0xFFFF_0000;
/// Opaque green
pub const GREEN: u32 = 0xFF00_FF00;
/// Opaque blue
pub const BLUE: u32 = 0xFF00_00FF;

/// Opaque color from 8-bit channels
pub const fn from_rgb(red: u8, green: u8, blue: u8) -> u32 {
    from_argb(0xFF, red, green, blue)
}

/// Color from 8-bit alpha and color channels
pub const fn from_argb(alpha: u8, red: u8, green: u8, blue: u8) -> u32 {
    ((alpha as u32) << 24) | ((red as u32) << 16) | ((green as u32) << 8) | blue as u32
}

/// Opaque color from channels in `0.0..=1.0`
pub fn from_rgb_f32(red: f32, green: f32, blue: f32) -> u32 {
    from_rgb(unit_to_u8(red), unit_to_u8(green), unit_to_u8(blue))
}

/// Opaque color from hue (degrees), saturation and lightness (`0.0..=1.0`)
pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> u32 {
    let sector = libm::fmodf(hue, 360.0) / 60.0;
    let chroma = (1.0 - libm::fabsf(2.0 * lightness - 1.0)) * saturation;
    let x = chroma * (1.0 - libm::fabsf(libm::fmodf(sector, 2.0) - 1.0));
    let m = lightness - chroma / 2.0;
    let (c, x) = (chroma + m, x + m);
    match sector as i32 {
        0 => from_rgb_f32(c, x, m),
        1 => from_rgb_f32(x, c, m),
        2 => from_rgb_f32(m, c, x),
        3 => from_rgb_f32(m, x, c),
        4 => from_rgb_f32(x, m, c),
        5 => from_rgb_f32(c, m, x),
        _ => BLACK,
    }
}

/// Alpha channel
pub const fn alpha(argb: u32) -> u8 {
    (argb >> 24) as u8
}

/// Red channel
pub const fn red(argb: u32) -> u8 {
    (argb >> 16) as u8
}

/// Green channel
pub const fn green(argb: u32) -> u8 {
    (argb >> 8) as u8
}

/// Blue channel
pub const fn blue(argb: u32) -> u8 {
    argb as u8
}

/// Same color with alpha forced to 255
pub const fn opaque(argb: u32) -> u32 {
    argb | 0xFF00_0000
}

fn unit_to_u8(value: f32) -> u8 {
    (255.0 * value.clamp(0.0, 1.0)) as u8
}

//! Panel Specifications
//!
//! Descriptors and pixel codecs for small pixel panels (OLED, TFT, LED
//! matrices) attached over SPI or I2C.
//!
//! # Features
//!
//! - **no_std compatible** - Works on embedded systems
//! - **Bit-exact codecs** - Packs 32-bit ARGB into native layouts, including
//!   non byte-aligned ones such as 12-bit RGB444
//! - **Rotation group** - Four discrete rotations with composition and inverse
//! - **Panel templates** - Pre-configured descriptors for common controllers
//! - **Serde support** - Optional serialization of formats and descriptors
//!
//! # Example
//!
//! ```
//! use panel_specs::{DisplayInfo, PixelFormat, Rotation};
//!
//! let info = DisplayInfo::new(128, 128, PixelFormat::Rgb444);
//! assert_eq!(info.x_granularity(), 2); // 2 × 12 bits = 3 bytes
//! assert_eq!(info.transfer_bytes(4, 1), 6);
//!
//! let mut bytes = [0u8; 3];
//! let red = PixelFormat::Rgb444.from_channels(0xFF, 0, 0);
//! PixelFormat::Rgb444.pack_pixel(red, &mut bytes, 0);
//! assert_eq!(bytes[0], 0xF0);
//!
//! assert_eq!(Rotation::Degrees90.relative_to(Rotation::Degrees90), Rotation::Degrees0);
//! ```
//!
//! # Custom Panels
//!
//! ```
//! use panel_specs::{DisplayInfo, PixelFormat, Rotation};
//!
//! // A controller that scans its RAM sideways and wants 8-pixel columns.
//! const MY_PANEL: DisplayInfo =
//!     DisplayInfo::with_layout(64, 128, PixelFormat::Monochrome, 8, Rotation::Degrees90);
//! assert_eq!(MY_PANEL.logical_dimensions(Rotation::Degrees90), (64, 128));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod alignment;
pub mod argb;
mod display_info;
pub mod panels;
mod pixel_format;
mod rotation;

pub use display_info::{DisplayInfo, InfoError};
pub use pixel_format::PixelFormat;
pub use rotation::Rotation;

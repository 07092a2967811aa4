//! Panel Compositor
//!
//! A shared ARGB framebuffer that composites onto one or more small pixel
//! panels (SPI/I2C OLEDs, TFTs, LED matrices).
//!
//! - Logical canvas of 32-bit ARGB pixels, drawn through [`Graphics`]
//!   contexts or directly on the [`Display`]
//! - Dirty rectangle tracking; only damaged areas are sent
//! - Immediate, debounced or manual flushing ([`TransferDelay`])
//! - Per-panel placement and rotation, native pixel packing and transfers
//!   chunked to the controller's size limit
//! - embedded-graphics integration: [`Graphics`] is a `DrawTarget<Color = Rgb888>`
//!
//! # Example
//!
//! ```
//! use panel_compositor::{Display, DisplayConfig, DisplayInfo, PanelDriver, PanelError, PixelFormat, Rotation};
//!
//! struct Console(DisplayInfo);
//!
//! impl PanelDriver for Console {
//!     fn display_info(&self) -> DisplayInfo {
//!         self.0
//!     }
//!
//!     fn set_pixels(&mut self, x: u32, y: u32, width: u32, height: u32, data: &[u8]) -> Result<(), PanelError> {
//!         println!("{width}x{height} at ({x}, {y}): {} bytes", data.len());
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), panel_compositor::DisplayError> {
//! let panel = Console(DisplayInfo::new(128, 64, PixelFormat::Monochrome));
//! let display = Display::with_config(panel, Rotation::Degrees0, DisplayConfig::MANUAL)?;
//!
//! let mut g = display.graphics();
//! g.set_color(0xFFFF_FFFF);
//! g.draw_line(0, 0, 127, 63)?;
//! display.flush()?;
//! display.close()?;
//! # Ok(())
//! # }
//! ```

mod binding;
pub mod config;
mod dirty;
mod display;
mod driver;
mod error;
mod font;
mod geometry;
mod graphics;
mod text_grid;

pub use config::{DisplayConfig, TransferDelay};
pub use display::Display;
pub use driver::PanelDriver;
pub use error::{DisplayError, PanelError};
pub use font::{Font, Glyph, PackedFont};
pub use graphics::{blend, Graphics, IndexedImage};
pub use text_grid::TextGrid;

pub use panel_specs::{argb, DisplayInfo, PixelFormat, Rotation};

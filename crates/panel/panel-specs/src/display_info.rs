//! Panel descriptor
//!
//! Describes one physical panel the way its driver presents it: native
//! dimensions, wire format, transfer alignment and any rotation the driver
//! already applies on its own.

use crate::alignment::granularity_for_bits;
use crate::{PixelFormat, Rotation};

/// Immutable descriptor of a physical panel
///
/// Width and height are panel-native, i.e. before any rotation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DisplayInfo {
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    x_granularity: u32,
    intrinsic_rotation: Rotation,
}

/// Rejected panel descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InfoError {
    /// Width or height is zero
    #[error("panel dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
    /// Granularity of zero pixels
    #[error("x-granularity must be at least 1")]
    ZeroGranularity,
}

impl DisplayInfo {
    /// Descriptor with the format's natural granularity and no intrinsic rotation
    pub const fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self::with_layout(
            width,
            height,
            pixel_format,
            granularity_for_bits(pixel_format.bit_count()),
            Rotation::Degrees0,
        )
    }

    /// Descriptor with explicit granularity and intrinsic rotation
    ///
    /// Drivers that scan their RAM sideways report the rotation they apply,
    /// so it can be subtracted from the rotation a display requests.
    pub const fn with_layout(
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        x_granularity: u32,
        intrinsic_rotation: Rotation,
    ) -> Self {
        Self {
            width,
            height,
            pixel_format,
            x_granularity,
            intrinsic_rotation,
        }
    }

    /// Validating variant of [`DisplayInfo::with_layout`]
    pub const fn try_new(
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        x_granularity: u32,
        intrinsic_rotation: Rotation,
    ) -> Result<Self, InfoError> {
        if width == 0 || height == 0 {
            return Err(InfoError::ZeroDimension { width, height });
        }
        if x_granularity == 0 {
            return Err(InfoError::ZeroGranularity);
        }
        Ok(Self::with_layout(
            width,
            height,
            pixel_format,
            x_granularity,
            intrinsic_rotation,
        ))
    }

    /// Width in pixels, panel-native
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels, panel-native
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Wire format
    pub const fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Transfers must start and end on a multiple of this many pixels
    pub const fn x_granularity(&self) -> u32 {
        self.x_granularity
    }

    /// Rotation the driver applies on its own
    pub const fn intrinsic_rotation(&self) -> Rotation {
        self.intrinsic_rotation
    }

    /// Rotation left to apply when a display requests `requested`
    pub const fn resolve_rotation(&self, requested: Rotation) -> Rotation {
        requested.relative_to(self.intrinsic_rotation)
    }

    /// Logical width × height of this panel seen through `requested`
    pub const fn logical_dimensions(&self, requested: Rotation) -> (u32, u32) {
        self.resolve_rotation(requested)
            .apply_to_dimensions(self.width, self.height)
    }

    /// Exact byte count of a packed `width × height` region
    // SAFETY: panel regions are bounded by width * height, far below usize::MAX.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn transfer_bytes(&self, width: u32, height: u32) -> usize {
        self.pixel_format
            .bytes_for(width as usize * height as usize)
    }

    /// Byte count of the whole panel
    pub const fn frame_bytes(&self) -> usize {
        self.transfer_bytes(self.width, self.height)
    }
}

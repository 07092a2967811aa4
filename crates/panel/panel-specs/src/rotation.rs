//! Display rotation
//!
//! The four quarter turns form a cyclic group of order 4. A panel binding
//! combines the rotation an application requests with the rotation a driver
//! already applies on its own: the transfer uses
//! `requested.relative_to(intrinsic)`.

use core::ops::{Add, Neg, Sub};

/// Display rotation modes, clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Rotation {
    /// No rotation (landscape: width × height)
    #[default]
    Degrees0,
    /// Rotate 90° clockwise (portrait: height × width)
    Degrees90,
    /// Rotate 180° (upside-down landscape: width × height)
    Degrees180,
    /// Rotate 270° clockwise / 90° counter-clockwise (portrait: height × width)
    Degrees270,
}

impl Rotation {
    /// All rotations in index order
    pub const ALL: [Rotation; 4] = [
        Rotation::Degrees0,
        Rotation::Degrees90,
        Rotation::Degrees180,
        Rotation::Degrees270,
    ];

    /// Number of quarter turns (0..=3)
    pub const fn index(self) -> u8 {
        match self {
            Rotation::Degrees0 => 0,
            Rotation::Degrees90 => 1,
            Rotation::Degrees180 => 2,
            Rotation::Degrees270 => 3,
        }
    }

    /// Rotation for a number of quarter turns, taken modulo 4
    pub const fn from_index(quarter_turns: u8) -> Self {
        match quarter_turns % 4 {
            0 => Rotation::Degrees0,
            1 => Rotation::Degrees90,
            2 => Rotation::Degrees180,
            _ => Rotation::Degrees270,
        }
    }

    /// Rotation for an angle in degrees; `None` unless a multiple of 90
    pub const fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        // rem_euclid keeps negative angles in 0..4
        Some(Self::from_index((degrees / 90).rem_euclid(4) as u8))
    }

    /// Angle in degrees (0, 90, 180 or 270)
    pub const fn degrees(self) -> u16 {
        match self {
            Rotation::Degrees0 => 0,
            Rotation::Degrees90 => 90,
            Rotation::Degrees180 => 180,
            Rotation::Degrees270 => 270,
        }
    }

    /// Apply `self` then `other`
    // SAFETY: both indices are < 4, the sum is < 8.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn compose(self, other: Rotation) -> Self {
        Self::from_index(self.index() + other.index())
    }

    /// The rotation that undoes `self`
    // SAFETY: index() < 4, so 4 - index() is in 1..=4.
    #[allow(clippy::arithmetic_side_effects)]
    pub const fn invert(self) -> Self {
        Self::from_index(4 - self.index())
    }

    /// `self` minus `base`: the rotation left to apply once `base` is accounted for
    pub const fn relative_to(self, base: Rotation) -> Self {
        self.compose(base.invert())
    }

    /// Check if rotation swaps width and height
    pub const fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Degrees90 | Rotation::Degrees270)
    }

    /// Calculate dimensions after rotation
    pub const fn apply_to_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

impl Add for Rotation {
    type Output = Rotation;

    fn add(self, rhs: Rotation) -> Rotation {
        self.compose(rhs)
    }
}

impl Sub for Rotation {
    type Output = Rotation;

    fn sub(self, rhs: Rotation) -> Rotation {
        self.relative_to(rhs)
    }
}

impl Neg for Rotation {
    type Output = Rotation;

    fn neg(self) -> Rotation {
        self.invert()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_wraps() {
        assert_eq!(
            Rotation::Degrees270.compose(Rotation::Degrees180),
            Rotation::Degrees90
        );
        assert_eq!(Rotation::Degrees90 + Rotation::Degrees270, Rotation::Degrees0);
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(
            Rotation::Degrees0.relative_to(Rotation::Degrees90),
            Rotation::Degrees270
        );
        assert_eq!(Rotation::Degrees180 - Rotation::Degrees90, Rotation::Degrees90);
    }

    #[test]
    fn test_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::Degrees0));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::Degrees90));
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::Degrees270));
        assert_eq!(Rotation::from_degrees(45), None);
    }

    #[test]
    fn test_apply_to_dimensions() {
        assert_eq!(Rotation::Degrees0.apply_to_dimensions(128, 64), (128, 64));
        assert_eq!(Rotation::Degrees90.apply_to_dimensions(128, 64), (64, 128));
        assert_eq!(Rotation::Degrees180.apply_to_dimensions(128, 64), (128, 64));
        assert_eq!(Rotation::Degrees270.apply_to_dimensions(128, 64), (64, 128));
    }
}

//! Alignment Constraints for Panel Transfers
//!
//! Panels whose pixels are not a whole number of bytes can only start a
//! transfer on a byte boundary. The horizontal start and end of every region
//! sent to a panel are therefore snapped to a multiple of the panel's
//! x-granularity.

/// Smallest power-of-two pixel count whose bits fill whole bytes
///
/// # Examples
/// ```
/// # use panel_specs::alignment::granularity_for_bits;
/// assert_eq!(granularity_for_bits(24), 1);
/// assert_eq!(granularity_for_bits(16), 1);
/// assert_eq!(granularity_for_bits(12), 2);
/// assert_eq!(granularity_for_bits(1), 8);
/// ```
// SAFETY: bit_count is at most 32 and the loop stops once granularity * bit_count
// is a multiple of 8, which happens no later than granularity = 8.
#[allow(clippy::arithmetic_side_effects)]
pub const fn granularity_for_bits(bit_count: u32) -> u32 {
    let mut granularity = 1;
    while (granularity * bit_count) % 8 != 0 {
        granularity *= 2;
    }
    granularity
}

/// Align a coordinate down to the nearest multiple of `granularity`
///
/// # Examples
/// ```
/// # use panel_specs::alignment::align_down;
/// assert_eq!(align_down(0, 8), 0);
/// assert_eq!(align_down(5, 8), 0);
/// assert_eq!(align_down(13, 8), 8);
/// assert_eq!(align_down(13, 1), 13);
/// ```
// SAFETY: granularity >= 1 is a DisplayInfo invariant; (value / g) * g <= value.
#[allow(clippy::arithmetic_side_effects)]
pub const fn align_down(value: u32, granularity: u32) -> u32 {
    (value / granularity) * granularity
}

/// Align a coordinate up to the nearest multiple of `granularity`
///
/// # Examples
/// ```
/// # use panel_specs::alignment::align_up;
/// assert_eq!(align_up(0, 2), 0);
/// assert_eq!(align_up(5, 2), 6);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(13, 8), 16);
/// ```
// SAFETY: granularity >= 1; values are panel coordinates far below u32::MAX.
#[allow(clippy::arithmetic_side_effects)]
pub const fn align_up(value: u32, granularity: u32) -> u32 {
    value.div_ceil(granularity) * granularity
}

/// Check if a value is a multiple of `granularity`
pub const fn is_aligned(value: u32, granularity: u32) -> bool {
    granularity != 0 && value % granularity == 0
}

/// Expand the half-open span `[start, end)` outward to granularity boundaries
///
/// Returns the aligned span and whether it had to grow.
pub const fn align_span(start: u32, end: u32, granularity: u32) -> ((u32, u32), bool) {
    let aligned = (align_down(start, granularity), align_up(end, granularity));
    let grew = aligned.0 != start || aligned.1 != end;
    (aligned, grew)
}

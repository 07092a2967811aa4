//! Native pixel encodings
//!
//! Converts 32-bit ARGB colors (`0xAARRGGBB`) into the bit layout a panel
//! expects on the wire and packs them into byte buffers at arbitrary *bit*
//! offsets. Formats are not necessarily byte-aligned (RGB444 uses 12 bits per
//! pixel), so the generic packer merges partial bytes with read-modify-write.
//! Byte-aligned formats take a fast path.

// Bit twiddling on u32 words; every shift amount is bounded by the format's
// bit count (at most 24) plus an in-byte offset (at most 7).
#![allow(
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation,
    clippy::indexing_slicing
)]

/// Wire-level pixel encoding of a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PixelFormat {
    /// 4 bits per channel; red shifted by 8, green by 4, blue by 0 (12 bpp)
    Rgb444,
    /// 5/6/5 bits; red shifted by 11, green by 5, blue by 0, big-endian bytes
    Rgb565,
    /// Same word as `Rgb565`, bytes swapped to little-endian (`gggBbbbb RrrrrGgg`)
    Rgb565Le,
    /// 8 bits per channel, red first
    Rgb888,
    /// 8 bits per channel, green first (shifts of red and green swapped)
    Grb888,
    /// 1 bit per pixel, set when the channel average is at least 128; MSB first
    Monochrome,
}

/// Per-channel bit counts and shifts into the native word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChannelLayout {
    bits: [u32; 3],
    shifts: [u32; 3],
}

impl ChannelLayout {
    const fn new(bits: [u32; 3], shifts: [u32; 3]) -> Self {
        Self { bits, shifts }
    }
}

impl PixelFormat {
    /// All supported formats
    pub const ALL: [PixelFormat; 6] = [
        PixelFormat::Rgb444,
        PixelFormat::Rgb565,
        PixelFormat::Rgb565Le,
        PixelFormat::Rgb888,
        PixelFormat::Grb888,
        PixelFormat::Monochrome,
    ];

    const fn layout(self) -> ChannelLayout {
        match self {
            PixelFormat::Rgb444 => ChannelLayout::new([4, 4, 4], [8, 4, 0]),
            PixelFormat::Rgb565 | PixelFormat::Rgb565Le => {
                ChannelLayout::new([5, 6, 5], [11, 5, 0])
            }
            PixelFormat::Rgb888 => ChannelLayout::new([8, 8, 8], [16, 8, 0]),
            PixelFormat::Grb888 => ChannelLayout::new([8, 8, 8], [8, 16, 0]),
            // Luma is a single channel; red carries it with no shift.
            PixelFormat::Monochrome => ChannelLayout::new([1, 0, 0], [0, 0, 0]),
        }
    }

    /// Bits used by one pixel
    pub const fn bit_count(self) -> u32 {
        let layout = self.layout();
        layout.bits[0] + layout.bits[1] + layout.bits[2]
    }

    /// Bit counts of the red, green and blue channels
    pub const fn channel_bits(self) -> (u32, u32, u32) {
        let layout = self.layout();
        (layout.bits[0], layout.bits[1], layout.bits[2])
    }

    /// Shifts of the red, green and blue channels inside the native word
    pub const fn channel_shifts(self) -> (u32, u32, u32) {
        let layout = self.layout();
        (layout.shifts[0], layout.shifts[1], layout.shifts[2])
    }

    /// Mask of the low `bit_count()` bits of a native word
    pub const fn native_mask(self) -> u32 {
        (1u32 << self.bit_count()) - 1
    }

    /// Smallest pixel count that fills whole bytes
    pub const fn granularity(self) -> u32 {
        crate::alignment::granularity_for_bits(self.bit_count())
    }

    /// Whether every pixel starts on a byte boundary
    pub const fn is_byte_aligned(self) -> bool {
        self.bit_count() % 8 == 0
    }

    /// Scale 8-bit channels down to this format by truncation and compose the native word
    pub const fn from_channels(self, red: u8, green: u8, blue: u8) -> u32 {
        if let PixelFormat::Monochrome = self {
            let sum = red as u32 + green as u32 + blue as u32;
            return (sum >= 3 * 128) as u32;
        }
        let layout = self.layout();
        let r = (red as u32) >> (8 - layout.bits[0]);
        let g = (green as u32) >> (8 - layout.bits[1]);
        let b = (blue as u32) >> (8 - layout.bits[2]);
        (r << layout.shifts[0]) | (g << layout.shifts[1]) | (b << layout.shifts[2])
    }

    /// Native word for a 32-bit ARGB color; alpha is ignored
    pub const fn from_argb(self, argb: u32) -> u32 {
        if let PixelFormat::Rgb888 = self {
            return argb & 0x00FF_FFFF;
        }
        self.from_channels((argb >> 16) as u8, (argb >> 8) as u8, argb as u8)
    }

    /// Opaque ARGB color for a native word, expanding each channel to 8 bits
    pub const fn to_argb(self, native: u32) -> u32 {
        if let PixelFormat::Monochrome = self {
            return if native & 1 != 0 { 0xFFFF_FFFF } else { 0xFF00_0000 };
        }
        let layout = self.layout();
        let r = expand_channel(native >> layout.shifts[0], layout.bits[0]);
        let g = expand_channel(native >> layout.shifts[1], layout.bits[1]);
        let b = expand_channel(native >> layout.shifts[2], layout.bits[2]);
        0xFF00_0000 | (r << 16) | (g << 8) | b
    }

    /// Write one native word into `buffer` at `bit_offset`, returning the bits written
    ///
    /// # Panics
    ///
    /// Panics if `buffer` is too short to hold the pixel at `bit_offset`.
    pub fn pack_pixel(self, native: u32, buffer: &mut [u8], bit_offset: usize) -> usize {
        let count = self.bit_count();
        let byte = bit_offset / 8;
        if bit_offset % 8 == 0 {
            match self {
                PixelFormat::Rgb888 | PixelFormat::Grb888 => {
                    buffer[byte] = (native >> 16) as u8;
                    buffer[byte + 1] = (native >> 8) as u8;
                    buffer[byte + 2] = native as u8;
                    return count as usize;
                }
                PixelFormat::Rgb565 => {
                    buffer[byte] = (native >> 8) as u8;
                    buffer[byte + 1] = native as u8;
                    return count as usize;
                }
                PixelFormat::Rgb565Le => {
                    buffer[byte] = native as u8;
                    buffer[byte + 1] = (native >> 8) as u8;
                    return count as usize;
                }
                PixelFormat::Rgb444 | PixelFormat::Monochrome => {}
            }
        }
        let word = match self {
            PixelFormat::Rgb565Le => (native as u16).swap_bytes() as u32,
            _ => native,
        };
        write_bits(word, count, buffer, bit_offset);
        count as usize
    }

    /// Read one native word back from `buffer` at `bit_offset`
    ///
    /// # Panics
    ///
    /// Panics if `buffer` ends before the pixel does.
    pub fn unpack_pixel(self, buffer: &[u8], bit_offset: usize) -> u32 {
        let word = read_bits(self.bit_count(), buffer, bit_offset);
        match self {
            PixelFormat::Rgb565Le => (word as u16).swap_bytes() as u32,
            _ => word,
        }
    }

    /// Convert and pack `pixel_count` ARGB colors, stepping the source by `src_stride`
    ///
    /// The stride may be negative (rotated sources walk the buffer backwards)
    /// or larger than one (column walks, nearest-neighbour sampling).
    /// Returns the number of bits written.
    ///
    /// # Panics
    ///
    /// Panics if a source index leaves `src` or `dst` is too short.
    pub fn pack_row(
        self,
        src: &[u32],
        src_offset: usize,
        src_stride: isize,
        dst: &mut [u8],
        dst_bit_offset: usize,
        pixel_count: usize,
    ) -> usize {
        let mut bits_written = 0;
        let mut index = src_offset as isize;
        for _ in 0..pixel_count {
            let argb = src[index as usize];
            bits_written += self.pack_pixel(self.from_argb(argb), dst, dst_bit_offset + bits_written);
            index += src_stride;
        }
        bits_written
    }

    /// Pack `pixel_count` copies of one ARGB color, converted once
    ///
    /// # Panics
    ///
    /// Panics if `dst` is too short.
    pub fn fill_row(self, dst: &mut [u8], dst_bit_offset: usize, pixel_count: usize, argb: u32) -> usize {
        let native = self.from_argb(argb);
        let mut bits_written = 0;
        for _ in 0..pixel_count {
            bits_written += self.pack_pixel(native, dst, dst_bit_offset + bits_written);
        }
        bits_written
    }

    /// Bytes needed for `pixel_count` packed pixels
    pub const fn bytes_for(self, pixel_count: usize) -> usize {
        (pixel_count * self.bit_count() as usize).div_ceil(8)
    }
}

/// Replicate a `bits`-wide channel value into 8 bits (round to nearest)
const fn expand_channel(value: u32, bits: u32) -> u32 {
    if bits == 0 {
        return 0;
    }
    let max = (1u32 << bits) - 1;
    ((value & max) * 255 + max / 2) / max
}

/// Write the low `count` bits (up to 24) of `value` MSB-first at `bit_offset`
fn write_bits(value: u32, count: u32, buffer: &mut [u8], bit_offset: usize) {
    let mut byte = bit_offset / 8;
    let shift = 32 - count - (bit_offset % 8) as u32;
    let mut mask = ((1u32 << count) - 1) << shift;
    let mut value = (value << shift) & mask;
    while mask != 0 {
        let byte_mask = (mask >> 24) as u8;
        buffer[byte] = (buffer[byte] & !byte_mask) | (value >> 24) as u8;
        byte += 1;
        value <<= 8;
        mask <<= 8;
    }
}

/// Inverse of [`write_bits`]
fn read_bits(count: u32, buffer: &[u8], bit_offset: usize) -> u32 {
    let mut byte = bit_offset / 8;
    let shift = 32 - count - (bit_offset % 8) as u32;
    let mask = ((1u32 << count) - 1) << shift;
    let mut remaining = mask;
    let mut window = 0u32;
    let mut position = 24i32;
    while remaining != 0 {
        window |= (buffer[byte] as u32) << position;
        byte += 1;
        remaining <<= 8;
        position -= 8;
    }
    (window & mask) >> shift
}

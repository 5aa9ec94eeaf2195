//! Morton (Z-order) bit interleaving.
//!
//! Two granularities are used by the format:
//!
//! - **Chunk granularity**: three 8-bit axes interleaved into a 24-bit code,
//!   bit order x, y, z repeated per bit-plane (x occupies bits 0, 3, 6, ...).
//!   Chunk IDs use this codec, and so does the implicit voxel index inside a
//!   chunk's stream (indices below 32768 decode to axes below 32).
//! - **Subspace granularity**: an 8-bit code addressing an 8x8x4 block with
//!   3 bits of x, 3 bits of y and 2 bits of z. The low six bits are a 2D
//!   Morton code of x and y, the high two bits are the z layer, giving
//!   `x0 y0 x1 y1 x2 y2 z0 z1` from the least significant bit. This is not a
//!   truncation of the chunk layout, where bit 2 belongs to z.
//!
//! Axis values wider than a codec's precision are masked: the excess high
//! bits are dropped. The `try_*` variants return `None` instead.

/// Bits per axis at chunk granularity.
pub const CHUNK_AXIS_BITS: u32 = 8;
/// Mask for one chunk-granularity axis.
pub const CHUNK_AXIS_MASK: u32 = (1 << CHUNK_AXIS_BITS) - 1;
/// Mask for a full chunk-granularity code.
pub const CHUNK_CODE_MASK: u32 = (1 << (3 * CHUNK_AXIS_BITS)) - 1;

/// Subspace extent along x.
pub const SUBSPACE_X: u32 = 8;
/// Subspace extent along y.
pub const SUBSPACE_Y: u32 = 8;
/// Subspace extent along z.
pub const SUBSPACE_Z: u32 = 4;

/// Spread the low 10 bits of `v` so that bit `i` lands on bit `3 * i`.
#[inline]
const fn part1by2(v: u32) -> u32 {
    let mut v = v & 0x0000_03ff;
    v = (v | (v << 16)) & 0xff00_00ff;
    v = (v | (v << 8)) & 0x0300_f00f;
    v = (v | (v << 4)) & 0x030c_30c3;
    (v | (v << 2)) & 0x0924_9249
}

/// Inverse of [`part1by2`]: gather every third bit back into the low bits.
#[inline]
const fn compact1by2(v: u32) -> u32 {
    let mut v = v & 0x0924_9249;
    v = (v ^ (v >> 2)) & 0x030c_30c3;
    v = (v ^ (v >> 4)) & 0x0300_f00f;
    v = (v ^ (v >> 8)) & 0xff00_00ff;
    (v ^ (v >> 16)) & 0x0000_03ff
}

/// Interleave three 8-bit axes into a 24-bit Morton code.
///
/// Bits above the eighth of each axis are dropped.
#[inline]
pub const fn encode(x: u32, y: u32, z: u32) -> u32 {
    part1by2(x & CHUNK_AXIS_MASK)
        | (part1by2(y & CHUNK_AXIS_MASK) << 1)
        | (part1by2(z & CHUNK_AXIS_MASK) << 2)
}

/// Like [`encode`], but rejects axis values that do not fit in 8 bits.
#[inline]
pub const fn try_encode(x: u32, y: u32, z: u32) -> Option<u32> {
    if x > CHUNK_AXIS_MASK || y > CHUNK_AXIS_MASK || z > CHUNK_AXIS_MASK {
        return None;
    }
    Some(encode(x, y, z))
}

/// De-interleave a 24-bit Morton code into `(x, y, z)`.
///
/// Bits above the 24th are dropped.
#[inline]
pub const fn decode(code: u32) -> (u32, u32, u32) {
    let code = code & CHUNK_CODE_MASK;
    (
        compact1by2(code),
        compact1by2(code >> 1),
        compact1by2(code >> 2),
    )
}

/// Encode a position inside an 8x8x4 subspace into an 8-bit code.
///
/// Only the low 3 bits of `x` and `y` and the low 2 bits of `z` are used.
#[inline]
pub const fn encode_subspace(x: u8, y: u8, z: u8) -> u8 {
    (x & 1)
        | ((y & 1) << 1)
        | (((x >> 1) & 1) << 2)
        | (((y >> 1) & 1) << 3)
        | (((x >> 2) & 1) << 4)
        | (((y >> 2) & 1) << 5)
        | ((z & 0b11) << 6)
}

/// Like [`encode_subspace`], but rejects positions outside the 8x8x4 block.
#[inline]
pub const fn try_encode_subspace(x: u8, y: u8, z: u8) -> Option<u8> {
    if x as u32 >= SUBSPACE_X || y as u32 >= SUBSPACE_Y || z as u32 >= SUBSPACE_Z {
        return None;
    }
    Some(encode_subspace(x, y, z))
}

/// Decode an 8-bit subspace code into `(x, y, z)` with ranges 0-7, 0-7, 0-3.
#[inline]
pub const fn decode_subspace(code: u8) -> (u8, u8, u8) {
    let x = (code & 1) | ((code >> 1) & 0b10) | ((code >> 2) & 0b100);
    let y = ((code >> 1) & 1) | ((code >> 2) & 0b10) | ((code >> 3) & 0b100);
    let z = code >> 6;
    (x, y, z)
}

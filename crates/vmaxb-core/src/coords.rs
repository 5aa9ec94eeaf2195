//! Coordinate systems for chunked voxel models.
//!
//! A model is addressed at three levels:
//! - [`ChunkId`]: the 24-bit Morton code naming one chunk
//! - [`ChunkCoord`]: the decoded chunk-grid position (0-255 per axis)
//! - [`LocalPos`]: a voxel inside a chunk (0-31 per axis)
//!
//! [`WorldPos`] is the composed absolute voxel position.

use crate::constants::{CHUNK_SIZE, MAX_CHUNK_ID};
use crate::morton;
use bytemuck::{Pod, Zeroable};
use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Morton-coded chunk identifier (24 bits, 8 bits per axis).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Pod,
    Zeroable,
    Serialize,
    Deserialize,
)]
#[repr(transparent)]
pub struct ChunkId(u32);

impl ChunkId {
    /// Create a chunk ID from a raw value, rejecting values above 24 bits.
    #[inline]
    pub const fn new(raw: u32) -> Option<Self> {
        if raw > MAX_CHUNK_ID {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Create a chunk ID from the unsigned integer stored in the container.
    #[inline]
    pub fn from_u64(raw: u64) -> Option<Self> {
        u32::try_from(raw).ok().and_then(Self::new)
    }

    /// Raw Morton code
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Decode into a chunk-grid coordinate
    #[inline]
    pub const fn coord(self) -> ChunkCoord {
        let (x, y, z) = morton::decode(self.0);
        ChunkCoord::new(x as u8, y as u8, z as u8)
    }
}

impl From<ChunkCoord> for ChunkId {
    fn from(coord: ChunkCoord) -> Self {
        coord.id()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chunk position on the 256^3 chunk grid.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct ChunkCoord {
    pub x: u8,
    pub y: u8,
    pub z: u8,
    pub _pad: u8,
}

impl ChunkCoord {
    /// Create a new chunk coordinate
    #[inline]
    pub const fn new(x: u8, y: u8, z: u8) -> Self {
        Self { x, y, z, _pad: 0 }
    }

    /// Morton-encode into a chunk ID
    #[inline]
    pub const fn id(self) -> ChunkId {
        ChunkId(morton::encode(self.x as u32, self.y as u32, self.z as u32))
    }

    /// World position of this chunk's origin corner for the given edge length.
    #[inline]
    pub const fn origin(self, edge: u32) -> WorldPos {
        WorldPos::new(
            self.x as i64 * edge as i64,
            self.y as i64 * edge as i64,
            self.z as i64 * edge as i64,
        )
    }

    /// Convert to glam IVec3
    #[inline]
    pub const fn to_ivec3(self) -> IVec3 {
        IVec3::new(self.x as i32, self.y as i32, self.z as i32)
    }
}

/// Position within a chunk (0 to CHUNK_SIZE-1 per axis).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct LocalPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
    pub _pad: u8,
}

impl LocalPos {
    /// Create a new local position
    #[inline]
    pub const fn new(x: u8, y: u8, z: u8) -> Self {
        debug_assert!((x as usize) < CHUNK_SIZE);
        debug_assert!((y as usize) < CHUNK_SIZE);
        debug_assert!((z as usize) < CHUNK_SIZE);
        Self { x, y, z, _pad: 0 }
    }

    /// Create a local position from decoded axes, or `None` if any axis
    /// falls outside the chunk.
    #[inline]
    pub const fn try_new(x: u32, y: u32, z: u32) -> Option<Self> {
        let size = CHUNK_SIZE as u32;
        if x >= size || y >= size || z >= size {
            return None;
        }
        Some(Self::new(x as u8, y as u8, z as u8))
    }

    /// Position addressed by a Morton-ordered slot index inside a chunk.
    #[inline]
    pub const fn from_morton(index: u32) -> Option<Self> {
        let (x, y, z) = morton::decode(index);
        if index >= (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as u32 {
            return None;
        }
        Self::try_new(x, y, z)
    }

    /// Morton-ordered slot index of this position
    #[inline]
    pub const fn morton_index(self) -> u32 {
        morton::encode(self.x as u32, self.y as u32, self.z as u32)
    }
}

/// World position in voxel coordinates.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct WorldPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl WorldPos {
    /// Create a new world position
    #[inline]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Compose a chunk origin and a local offset for the given edge length.
    #[inline]
    pub const fn from_chunk_local(chunk: ChunkCoord, local: LocalPos, edge: u32) -> Self {
        let origin = chunk.origin(edge);
        Self::new(
            origin.x + local.x as i64,
            origin.y + local.y as i64,
            origin.z + local.z as i64,
        )
    }

    /// Component-wise minimum
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Component-wise maximum
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }

    /// Convert to floating point Vec3
    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

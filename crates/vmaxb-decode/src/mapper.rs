//! Chunk-local to world coordinate mapping.

use vmaxb_core::constants::CHUNK_SIZE;
use vmaxb_core::{ChunkId, LocalPos, WorldPos};

/// Maps `(chunk ID, local position)` to absolute world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateMapper {
    chunk_edge: u32,
}

impl CoordinateMapper {
    /// Create a mapper for chunks with the given edge length in voxels.
    pub const fn new(chunk_edge: u32) -> Self {
        Self { chunk_edge }
    }

    /// Chunk edge length in voxels.
    pub const fn chunk_edge(&self) -> u32 {
        self.chunk_edge
    }

    /// `coord(chunk) * edge + local`, component-wise.
    #[inline]
    pub const fn to_world(&self, chunk: ChunkId, local: LocalPos) -> WorldPos {
        WorldPos::from_chunk_local(chunk.coord(), local, self.chunk_edge)
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(CHUNK_SIZE as u32)
    }
}

//! Core types, Morton codec and coordinates for the vmaxb decoder.
//!
//! This crate provides the foundational types used by the decode pipeline:
//! - Morton (Z-order) bit interleaving at chunk and subspace granularity
//! - Coordinate systems (chunk ID, chunk grid, local, world)
//! - Voxel, color and palette types
//! - The crate-wide error type

pub mod coords;
pub mod error;
pub mod morton;
pub mod types;

pub use coords::{ChunkCoord, ChunkId, LocalPos, WorldPos};
pub use error::{Error, Result};
pub use types::{GroupKey, MaterialId, Palette, PaletteIndex, Rgba, StoredColor, Voxel};

/// Format-wide constants
pub mod constants {
    /// Size of a chunk in voxels per axis
    pub const CHUNK_SIZE: usize = 32;
    /// Total voxel slots in a chunk (32^3)
    pub const CHUNK_SIZE_CUBED: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;
    /// Bits needed to represent position within a chunk (5 bits for 0-31)
    pub const CHUNK_BITS: u32 = 5;
    /// Chunks per axis of the addressable grid (8 bits per axis in a chunk ID)
    pub const CHUNK_GRID_SIZE: usize = 256;
    /// Largest valid chunk ID (24 bits)
    pub const MAX_CHUNK_ID: u32 = (1 << 24) - 1;
    /// Number of material slots a model can reference
    pub const MATERIAL_COUNT: usize = 8;
    /// Number of palette entries
    pub const PALETTE_SIZE: usize = 256;
}

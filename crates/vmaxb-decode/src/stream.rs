//! Voxel stream decoding.
//!
//! A chunk's `"ds"` stream is a sequence of `(layer/position, color)` byte
//! pairs. Pairs do not carry explicit coordinates: the position of pair `k`
//! is derived from an implicit slot index `offset + k`. How the slot (and,
//! for some revisions, the first byte) maps to a local position is selected
//! by [`DecodeStrategy`].

use serde::{Deserialize, Serialize};
use std::slice::ChunksExact;
use vmaxb_core::constants::CHUNK_SIZE_CUBED;
use vmaxb_core::morton::{self, SUBSPACE_X, SUBSPACE_Y, SUBSPACE_Z};
use vmaxb_core::{LocalPos, MaterialId, StoredColor};

use crate::snapshot::SnapshotStats;

/// Slots covered by one 8x8x4 subspace tile.
const TILE_SLOTS: u64 = (SUBSPACE_X * SUBSPACE_Y * SUBSPACE_Z) as u64;
/// Tiles per chunk along x and y (32 / 8).
const TILES_XY: u64 = 4;

/// How stream positions map to local chunk coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecodeStrategy {
    /// The slot index is the chunk-granularity Morton code of the local
    /// position, starting at 0. The first byte of each pair is the
    /// material layer.
    #[default]
    SequentialMorton,
    /// Chunks are tiled by 8x8x4 subspaces, 256 slots per tile, tiles laid
    /// out x-fastest (4 x 4 x 8 tiles). A non-zero first byte is the subspace
    /// Morton code of the voxel inside the current tile; a zero first byte
    /// falls back to the sequential Morton position of the slot. No layer
    /// is carried, every voxel uses material 0.
    HybridSubspace,
    /// As [`SequentialMorton`](Self::SequentialMorton), but the slot index
    /// starts at the snapshot's `st.min[3]` Morton offset.
    MinOffsetMorton,
}

impl DecodeStrategy {
    /// Slot index the stream of a snapshot with these statistics starts at.
    pub fn start_offset(self, stats: &SnapshotStats) -> u64 {
        match self {
            Self::MinOffsetMorton => stats.morton_offset().unwrap_or(0),
            Self::SequentialMorton | Self::HybridSubspace => 0,
        }
    }

    /// Local position of `slot`, or `None` if it addresses outside the chunk.
    pub fn locate(self, slot: u64, position: u8) -> Option<LocalPos> {
        match self {
            Self::SequentialMorton | Self::MinOffsetMorton => morton_slot(slot),
            Self::HybridSubspace => {
                let tile = slot / TILE_SLOTS;
                if tile >= CHUNK_SIZE_CUBED as u64 / TILE_SLOTS {
                    return None;
                }
                if position == 0 {
                    return morton_slot(slot);
                }
                let (sx, sy, sz) = morton::decode_subspace(position);
                let tx = tile % TILES_XY;
                let ty = (tile / TILES_XY) % TILES_XY;
                let tz = tile / (TILES_XY * TILES_XY);
                LocalPos::try_new(
                    (tx as u32) * SUBSPACE_X + u32::from(sx),
                    (ty as u32) * SUBSPACE_Y + u32::from(sy),
                    (tz as u32) * SUBSPACE_Z + u32::from(sz),
                )
            }
        }
    }

    /// Material encoded by the first byte of a pair.
    pub const fn material(self, position: u8) -> MaterialId {
        match self {
            Self::SequentialMorton | Self::MinOffsetMorton => MaterialId(position),
            Self::HybridSubspace => MaterialId(0),
        }
    }
}

fn morton_slot(slot: u64) -> Option<LocalPos> {
    u32::try_from(slot).ok().and_then(LocalPos::from_morton)
}

/// One non-empty slot of a decoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVoxel {
    /// Implicit slot index (`offset + pair index`)
    pub slot: u64,
    /// Local position, `None` when the slot falls outside the chunk
    pub pos: Option<LocalPos>,
    pub material: MaterialId,
    /// Raw stored color, never [`StoredColor::EMPTY`]
    pub color: StoredColor,
}

/// Lazy decoder over a chunk's byte stream.
///
/// Yields one [`LocalVoxel`] per pair whose color byte is non-zero. Empty
/// pairs still advance the slot index. A trailing odd byte is ignored.
#[derive(Debug, Clone)]
pub struct VoxelStream<'a> {
    pairs: ChunksExact<'a, u8>,
    next_slot: u64,
    strategy: DecodeStrategy,
}

impl<'a> VoxelStream<'a> {
    /// Decode `bytes` starting at slot `offset`.
    pub fn new(bytes: &'a [u8], strategy: DecodeStrategy, offset: u64) -> Self {
        Self {
            pairs: bytes.chunks_exact(2),
            next_slot: offset,
            strategy,
        }
    }

    /// Number of pairs not yet consumed, empty or not.
    pub fn remaining_pairs(&self) -> usize {
        self.pairs.len()
    }
}

impl Iterator for VoxelStream<'_> {
    type Item = LocalVoxel;

    fn next(&mut self) -> Option<Self::Item> {
        for pair in self.pairs.by_ref() {
            let slot = self.next_slot;
            self.next_slot = self.next_slot.saturating_add(1);

            let color = StoredColor(pair[1]);
            if color.is_empty() {
                continue;
            }
            return Some(LocalVoxel {
                slot,
                pos: self.strategy.locate(slot, pair[0]),
                material: self.strategy.material(pair[0]),
                color,
            });
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.pairs.len()))
    }
}

/// Decode a stream with the given strategy and start offset.
pub fn decode_stream(bytes: &[u8], strategy: DecodeStrategy, offset: u64) -> VoxelStream<'_> {
    VoxelStream::new(bytes, strategy, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmaxb_core::PaletteIndex;

    #[test]
    fn empty_stream() {
        assert_eq!(decode_stream(&[], DecodeStrategy::SequentialMorton, 0).count(), 0);
        assert_eq!(decode_stream(&[7], DecodeStrategy::SequentialMorton, 0).count(), 0);
    }

    #[test]
    fn all_empty_pairs_emit_nothing() {
        let bytes = vec![0u8; 2 * 4096];
        for strategy in [
            DecodeStrategy::SequentialMorton,
            DecodeStrategy::HybridSubspace,
            DecodeStrategy::MinOffsetMorton,
        ] {
            assert_eq!(decode_stream(&bytes, strategy, 0).count(), 0);
        }
    }

    #[test]
    fn sequential_positions_follow_morton_order() {
        let bytes = [0x00, 0x26, 0x00, 0x00, 0x02, 0x01, 0x00, 0x05];
        let voxels: Vec<_> = decode_stream(&bytes, DecodeStrategy::SequentialMorton, 0).collect();
        assert_eq!(voxels.len(), 3);

        assert_eq!(voxels[0].slot, 0);
        assert_eq!(voxels[0].pos, Some(LocalPos::new(0, 0, 0)));
        assert_eq!(voxels[0].color.palette_index(), Some(PaletteIndex(37)));

        // slot 1 is empty but still consumed
        assert_eq!(voxels[1].slot, 2);
        assert_eq!(voxels[1].pos, Some(LocalPos::new(0, 1, 0)));
        assert_eq!(voxels[1].material, MaterialId(2));
        assert_eq!(voxels[1].color.palette_index(), Some(PaletteIndex(0)));

        assert_eq!(voxels[2].slot, 3);
        assert_eq!(voxels[2].pos, Some(LocalPos::new(1, 1, 0)));
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        let bytes = [0x00, 0x01, 0x00];
        let mut stream = decode_stream(&bytes, DecodeStrategy::SequentialMorton, 0);
        assert_eq!(stream.remaining_pairs(), 1);
        assert!(stream.next().is_some());
        assert_eq!(stream.remaining_pairs(), 0);
        assert!(stream.next().is_none());
    }

    #[test]
    fn offset_shifts_slots() {
        let bytes = [0x00, 0x01];
        let voxel = decode_stream(&bytes, DecodeStrategy::MinOffsetMorton, 8)
            .next()
            .unwrap();
        assert_eq!(voxel.slot, 8);
        assert_eq!(voxel.pos, Some(LocalPos::new(2, 0, 0)));
    }

    #[test]
    fn slots_past_the_chunk_have_no_position() {
        let bytes = [0x00, 0x01, 0x00, 0x01];
        let voxels: Vec<_> =
            decode_stream(&bytes, DecodeStrategy::SequentialMorton, 32767).collect();
        assert_eq!(voxels[0].pos, Some(LocalPos::new(31, 31, 31)));
        assert_eq!(voxels[1].pos, None);

        let far = decode_stream(&bytes, DecodeStrategy::SequentialMorton, u64::MAX).next();
        assert_eq!(far.unwrap().pos, None);
    }

    #[test]
    fn start_offset_only_for_min_offset_strategy() {
        let stats = SnapshotStats {
            min: Some(vec![0, 0, 0, 512]),
            max: None,
        };
        assert_eq!(DecodeStrategy::MinOffsetMorton.start_offset(&stats), 512);
        assert_eq!(DecodeStrategy::SequentialMorton.start_offset(&stats), 0);
        assert_eq!(DecodeStrategy::HybridSubspace.start_offset(&stats), 0);
        assert_eq!(
            DecodeStrategy::MinOffsetMorton.start_offset(&SnapshotStats::default()),
            0
        );
    }

    #[test]
    fn hybrid_subspace_tiles() {
        let strategy = DecodeStrategy::HybridSubspace;
        // tile 0, subspace code for (1, 2, 3)
        let code = morton::encode_subspace(1, 2, 3);
        assert_eq!(strategy.locate(0, code), Some(LocalPos::new(1, 2, 3)));
        // tile 5 = (1, 1, 0) in the 4x4x8 tile grid
        assert_eq!(strategy.locate(5 * 256, code), Some(LocalPos::new(9, 10, 3)));
        // last tile
        assert_eq!(
            strategy.locate(127 * 256 + 255, 0xff),
            Some(LocalPos::new(31, 31, 31))
        );
        assert_eq!(strategy.locate(128 * 256, 0x01), None);
        // zero position byte falls back to sequential Morton
        assert_eq!(strategy.locate(7, 0), Some(LocalPos::new(1, 1, 1)));
        assert_eq!(strategy.material(5), MaterialId(0));
        assert_eq!(DecodeStrategy::SequentialMorton.material(5), MaterialId(5));
    }
}

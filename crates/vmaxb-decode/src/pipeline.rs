//! Document-to-model decode driver.
//!
//! snapshots -> [`SnapshotResolver`] -> [`VoxelStream`] per chunk ->
//! [`CoordinateMapper`] -> [`WorldModel`].
//!
//! [`VoxelStream`]: crate::stream::VoxelStream

use rayon::prelude::*;
use tracing::{debug, info};
use vmaxb_core::constants::CHUNK_SIZE;
use vmaxb_core::{ChunkId, MaterialId, PaletteIndex, Result, WorldPos};

use crate::mapper::CoordinateMapper;
use crate::model::WorldModel;
use crate::resolver::{HistoryFilter, ResolvePolicy, SnapshotResolver};
use crate::snapshot::{read_snapshots, SkipReason, Snapshot};
use crate::stream::{decode_stream, DecodeStrategy};
use crate::tree::TreeNode;

/// Decoder configuration.
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    /// Stream position encoding.
    pub strategy: DecodeStrategy,
    /// History walk order.
    pub policy: ResolvePolicy,
    /// Snapshot kinds admitted to resolution.
    pub history: HistoryFilter,
    /// Chunk edge length in world voxels.
    pub chunk_edge: u32,
    /// Decode resolved chunks on the rayon pool.
    pub parallel: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            strategy: DecodeStrategy::default(),
            policy: ResolvePolicy::default(),
            history: HistoryFilter::default(),
            chunk_edge: CHUNK_SIZE as u32,
            parallel: true,
        }
    }
}

/// Counters collected while decoding a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Records extracted from the `"snapshots"` array.
    pub snapshots_read: usize,
    /// Structurally malformed records.
    pub snapshots_skipped: usize,
    /// Records rejected by the history filter.
    pub snapshots_filtered: usize,
    /// Admitted records replaced by a more recent one.
    pub snapshots_superseded: usize,
    /// Chunks with an authoritative snapshot.
    pub chunks_resolved: usize,
    /// Non-empty slots decoded from resolved streams.
    pub voxels_decoded: usize,
    /// Slots addressing outside their chunk.
    pub voxels_out_of_range: usize,
    /// Slots referencing a material outside the eight model slots.
    pub voxels_invalid_material: usize,
}

/// Result of decoding a document.
#[derive(Debug, Clone, Default)]
pub struct DecodedModel {
    pub model: WorldModel,
    pub report: DecodeReport,
    /// `(array index, reason)` for every malformed record
    pub skipped: Vec<(usize, SkipReason)>,
}

/// Voxels of one chunk, already placed in world space.
#[derive(Debug, Default)]
struct ChunkVoxels {
    chunk: ChunkId,
    voxels: Vec<(WorldPos, MaterialId, PaletteIndex)>,
    decoded: usize,
    out_of_range: usize,
}

/// Reconstructs a [`WorldModel`] from a snapshot document.
#[derive(Debug, Clone, Default)]
pub struct ModelDecoder {
    config: DecodeConfig,
}

impl ModelDecoder {
    /// Create a decoder with the given configuration.
    pub fn new(config: DecodeConfig) -> Self {
        Self { config }
    }

    /// Create a decoder with default configuration and the given strategy.
    pub fn with_strategy(strategy: DecodeStrategy) -> Self {
        Self::new(DecodeConfig {
            strategy,
            ..Default::default()
        })
    }

    /// Get the decoder configuration.
    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Decode a whole document.
    ///
    /// Fails only if the document has no `"snapshots"` array.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn decode<N: TreeNode>(&self, root: &N) -> Result<DecodedModel> {
        let batch = read_snapshots(root)?;
        let mut decoded = self.decode_snapshots(batch.snapshots);
        decoded.report.snapshots_skipped = batch.skipped.len();
        decoded.skipped = batch.skipped;
        info!(
            voxels = decoded.model.len(),
            chunks = decoded.report.chunks_resolved,
            skipped = decoded.report.snapshots_skipped,
            "decoded model"
        );
        Ok(decoded)
    }

    /// Resolve and decode snapshots given in container order.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn decode_snapshots(&self, snapshots: Vec<Snapshot>) -> DecodedModel {
        let mut report = DecodeReport {
            snapshots_read: snapshots.len(),
            ..Default::default()
        };

        let resolver = SnapshotResolver::new(self.config.policy, self.config.history);
        let resolved = resolver.resolve(snapshots);
        report.snapshots_filtered = resolved.filtered;
        report.snapshots_superseded = resolved.superseded;
        report.chunks_resolved = resolved.len();

        let winners: Vec<&Snapshot> = resolved.iter().collect();
        let chunks: Vec<ChunkVoxels> = if self.config.parallel {
            winners.par_iter().map(|s| self.decode_chunk(s)).collect()
        } else {
            winners.iter().map(|s| self.decode_chunk(s)).collect()
        };

        let mut model = WorldModel::new();
        for chunk in chunks {
            report.voxels_decoded += chunk.decoded;
            report.voxels_out_of_range += chunk.out_of_range;
            for (pos, material, color) in chunk.voxels {
                if !model.add_voxel(pos, material, color, chunk.chunk) {
                    report.voxels_invalid_material += 1;
                }
            }
        }

        DecodedModel {
            model,
            report,
            skipped: Vec::new(),
        }
    }

    /// Decode one authoritative snapshot into world-space voxels.
    fn decode_chunk(&self, snapshot: &Snapshot) -> ChunkVoxels {
        let mapper = CoordinateMapper::new(self.config.chunk_edge);
        let strategy = self.config.strategy;
        let offset = strategy.start_offset(&snapshot.stats);

        let mut out = ChunkVoxels {
            chunk: snapshot.chunk,
            ..Default::default()
        };
        for voxel in decode_stream(&snapshot.stream, strategy, offset) {
            out.decoded += 1;
            let Some(local) = voxel.pos else {
                out.out_of_range += 1;
                continue;
            };
            let Some(color) = voxel.color.palette_index() else {
                continue;
            };
            out.voxels
                .push((mapper.to_world(snapshot.chunk, local), voxel.material, color));
        }

        debug!(
            chunk = snapshot.chunk.raw(),
            offset,
            voxels = out.voxels.len(),
            out_of_range = out.out_of_range,
            "decoded chunk"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotKind;
    use crate::tree::Node;
    use vmaxb_core::{morton, ChunkCoord, Error};

    fn record(chunk: u64, kind: u64, stream: &[u8]) -> Node {
        Node::dict([(
            "s",
            Node::dict([
                (
                    "id",
                    Node::dict([("c", Node::UInt(chunk)), ("t", Node::UInt(kind))]),
                ),
                ("ds", Node::Data(stream.to_vec())),
            ]),
        )])
    }

    fn document(records: Vec<Node>) -> Node {
        Node::dict([("snapshots", Node::Array(records))])
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn single_checkpoint_end_to_end() {
        init_tracing();
        let doc = document(vec![record(0, 4, &[0x00, 0x26, 0x00, 0x00])]);
        let decoded = ModelDecoder::default().decode(&doc).unwrap();
        let model = &decoded.model;

        assert_eq!(model.len(), 1);
        let voxel = model.voxel_at(WorldPos::new(0, 0, 0)).unwrap();
        assert_eq!(voxel.color, PaletteIndex(37));
        assert_eq!(voxel.material, MaterialId(0));
        assert_eq!(voxel.translation(), WorldPos::new(0, 0, 0).to_vec3());

        let group: Vec<_> = model.voxels_for(MaterialId(0), PaletteIndex(37)).collect();
        assert_eq!(group.len(), 1);
        assert_eq!(group[0].pos, WorldPos::new(0, 0, 0));

        assert_eq!(decoded.report.chunks_resolved, 1);
        assert_eq!(decoded.report.voxels_decoded, 1);
        assert!(decoded.skipped.is_empty());
    }

    #[test]
    fn history_resolves_to_latest_checkpoint() {
        let chunk = u64::from(ChunkCoord::new(1, 0, 0).id().raw());
        let doc = document(vec![
            record(chunk, 4, &[0x00, 0x01, 0x00, 0x01]),
            record(chunk, 5, &[0x00, 0x09]),
            record(chunk, 4, &[0x00, 0x00, 0x01, 0x03]),
            record(chunk, 2, &[0x00, 0x07]),
        ]);
        for parallel in [false, true] {
            let decoder = ModelDecoder::new(DecodeConfig {
                parallel,
                ..Default::default()
            });
            let decoded = decoder.decode(&doc).unwrap();
            let voxels: Vec<_> = decoded.model.voxels_in_chunk(ChunkId::new(1).unwrap()).collect();
            assert_eq!(voxels.len(), 1);
            assert_eq!(voxels[0].pos, WorldPos::new(33, 0, 0));
            assert_eq!(voxels[0].material, MaterialId(1));
            assert_eq!(voxels[0].color, PaletteIndex(2));
            assert_eq!(decoded.report.snapshots_filtered, 2);
            assert_eq!(decoded.report.snapshots_superseded, 1);
        }
    }

    #[test]
    fn world_offsets_use_chunk_coordinates() {
        let id = morton::encode(2, 3, 4);
        let doc = document(vec![record(u64::from(id), 4, &[0x00, 0x0a])]);
        let decoded = ModelDecoder::default().decode(&doc).unwrap();
        assert!(decoded.model.voxel_at(WorldPos::new(64, 96, 128)).is_some());
    }

    #[test]
    fn min_offset_strategy_reads_stats() {
        let node = Node::dict([(
            "s",
            Node::dict([
                (
                    "id",
                    Node::dict([("c", Node::UInt(0)), ("t", Node::UInt(4))]),
                ),
                ("ds", Node::Data(vec![0x00, 0x01])),
                ("st", Node::dict([("min", Node::uints([0, 0, 0, 7]))])),
            ]),
        )]);
        let doc = document(vec![node]);

        let offset = ModelDecoder::with_strategy(DecodeStrategy::MinOffsetMorton)
            .decode(&doc)
            .unwrap();
        assert!(offset.model.voxel_at(WorldPos::new(1, 1, 1)).is_some());

        let sequential = ModelDecoder::default().decode(&doc).unwrap();
        assert!(sequential.model.voxel_at(WorldPos::new(0, 0, 0)).is_some());
    }

    #[test]
    fn out_of_range_and_bad_material_are_dropped() {
        let snapshots = vec![
            Snapshot::new(ChunkId::new(0).unwrap(), SnapshotKind::Checkpoint, vec![0x00, 0x01])
                .with_morton_offset(32768),
            Snapshot::new(ChunkId::new(1).unwrap(), SnapshotKind::Checkpoint, vec![0x09, 0x01]),
        ];
        let decoder = ModelDecoder::with_strategy(DecodeStrategy::MinOffsetMorton);
        let decoded = decoder.decode_snapshots(snapshots);
        assert!(decoded.model.is_empty());
        assert_eq!(decoded.report.voxels_decoded, 2);
        assert_eq!(decoded.report.voxels_out_of_range, 1);
        assert_eq!(decoded.report.voxels_invalid_material, 1);
    }

    #[test]
    fn malformed_records_do_not_abort() {
        let doc = document(vec![
            Node::UInt(1),
            record(0, 4, &[0x00, 0x02]),
            Node::dict([("s", Node::dict::<&str>([]))]),
        ]);
        let decoded = ModelDecoder::default().decode(&doc).unwrap();
        assert_eq!(decoded.model.len(), 1);
        assert_eq!(decoded.report.snapshots_skipped, 2);
        assert_eq!(decoded.report.snapshots_read, 1);
    }

    #[test]
    fn empty_document_is_valid() {
        let decoded = ModelDecoder::default().decode(&document(Vec::new())).unwrap();
        assert!(decoded.model.is_empty());
        assert_eq!(decoded.report, DecodeReport::default());
    }

    #[test]
    fn missing_snapshots_fails() {
        let err = ModelDecoder::default()
            .decode(&Node::dict::<&str>([]))
            .unwrap_err();
        assert_eq!(err, Error::MissingKey("snapshots".into()));
    }
}

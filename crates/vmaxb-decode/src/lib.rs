//! Snapshot resolution and chunked voxel stream decoding for vmaxb models.
//!
//! A document is a property-list tree holding an append-only `"snapshots"`
//! history of per-chunk voxel streams. Decoding resolves the history to one
//! snapshot per chunk, expands each stream into chunk-local voxels, places
//! them in world space and groups them by material and color.

pub mod inspect;
pub mod mapper;
pub mod model;
pub mod pipeline;
pub mod resolver;
pub mod snapshot;
pub mod stream;
pub mod tree;

pub use inspect::{color_runs, describe_tree, walk, z_slice, ColorRun, TreeVisitor};
pub use mapper::CoordinateMapper;
pub use model::WorldModel;
pub use pipeline::{DecodeConfig, DecodeReport, DecodedModel, ModelDecoder};
pub use resolver::{HistoryFilter, ResolvePolicy, ResolvedChunks, SnapshotResolver};
pub use snapshot::{
    read_snapshots, SkipReason, Snapshot, SnapshotBatch, SnapshotKind, SnapshotStats,
};
pub use stream::{decode_stream, DecodeStrategy, LocalVoxel, VoxelStream};
pub use tree::{node_at, Node, NodeKind, TreeNode};

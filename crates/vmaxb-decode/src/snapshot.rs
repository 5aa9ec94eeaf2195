//! Snapshot records extracted from the container.
//!
//! Each element of the top-level `"snapshots"` array is one edit-history
//! entry for one chunk:
//!
//! ```text
//! { "s": { "id": { "c": chunk id, "t": kind, "s": session },
//!          "ds": voxel stream,
//!          "st": { "min": [x, y, z, morton offset], "max": [...] } } }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use vmaxb_core::{ChunkId, Result};

use crate::tree::{node_at, require_array, TreeNode};

/// Edit-history role of a snapshot.
///
/// Records without a `"t"` value are checkpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotKind {
    UndoRestore,
    RedoRestore,
    Undo,
    Redo,
    #[default]
    Checkpoint,
    Selection,
    Unknown(u64),
}

impl SnapshotKind {
    /// Map the container's `"t"` value.
    pub const fn from_wire(value: u64) -> Self {
        match value {
            0 => Self::UndoRestore,
            1 => Self::RedoRestore,
            2 => Self::Undo,
            3 => Self::Redo,
            4 => Self::Checkpoint,
            5 => Self::Selection,
            other => Self::Unknown(other),
        }
    }

    /// Whether this kind records a durable chunk state rather than
    /// undo/redo or selection bookkeeping.
    pub const fn is_authoritative(self) -> bool {
        matches!(self, Self::Checkpoint | Self::UndoRestore | Self::RedoRestore)
    }
}

/// Optional `"st"` statistics of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub min: Option<Vec<u64>>,
    pub max: Option<Vec<u64>>,
}

impl SnapshotStats {
    /// Packed Morton start offset carried in the fourth `min` element.
    pub fn morton_offset(&self) -> Option<u64> {
        self.min.as_ref().and_then(|min| min.get(3).copied())
    }
}

/// One edit-history entry for a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub chunk: ChunkId,
    pub kind: SnapshotKind,
    pub session: Option<u64>,
    /// Raw `(layer/position, color)` byte pairs
    pub stream: Vec<u8>,
    pub stats: SnapshotStats,
}

impl Snapshot {
    /// Create a snapshot without statistics.
    pub fn new(chunk: ChunkId, kind: SnapshotKind, stream: Vec<u8>) -> Self {
        Self {
            chunk,
            kind,
            session: None,
            stream,
            stats: SnapshotStats::default(),
        }
    }

    /// Attach a Morton start offset as the fourth `min` element.
    #[must_use]
    pub fn with_morton_offset(mut self, offset: u64) -> Self {
        self.stats.min = Some(vec![0, 0, 0, offset]);
        self
    }

    /// Extract a snapshot from one element of the `"snapshots"` array.
    pub fn from_node<N: TreeNode>(node: &N) -> std::result::Result<Self, SkipReason> {
        let state = node.dict_item("s").ok_or(SkipReason::MissingState)?;
        let raw_chunk = node_at(state, &["id", "c"])
            .ok_or(SkipReason::MissingChunkId)?
            .uint()
            .ok_or(SkipReason::MissingChunkId)?;
        let chunk = ChunkId::from_u64(raw_chunk).ok_or(SkipReason::ChunkOutOfRange(raw_chunk))?;
        let stream = state
            .dict_item("ds")
            .ok_or(SkipReason::MissingStream)?
            .data_bytes()
            .ok_or(SkipReason::MissingStream)?
            .to_vec();

        let kind = node_at(state, &["id", "t"])
            .and_then(TreeNode::uint)
            .map_or_else(SnapshotKind::default, SnapshotKind::from_wire);
        let session = node_at(state, &["id", "s"]).and_then(TreeNode::uint);
        let stats = state
            .dict_item("st")
            .map(|st| SnapshotStats {
                min: st.dict_item("min").and_then(uint_array),
                max: st.dict_item("max").and_then(uint_array),
            })
            .unwrap_or_default();

        Ok(Self {
            chunk,
            kind,
            session,
            stream,
            stats,
        })
    }
}

fn uint_array<N: TreeNode>(node: &N) -> Option<Vec<u64>> {
    let len = node.array_len()?;
    (0..len).map(|i| node.array_item(i)?.uint()).collect()
}

/// Why a snapshot record was left out of resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No `"s"` dictionary
    MissingState,
    /// No unsigned `"s/id/c"`
    MissingChunkId,
    /// Chunk ID does not fit in 24 bits
    ChunkOutOfRange(u64),
    /// No binary `"s/ds"`
    MissingStream,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingState => write!(f, "missing state dictionary"),
            Self::MissingChunkId => write!(f, "missing chunk id"),
            Self::ChunkOutOfRange(raw) => write!(f, "chunk id {raw} exceeds 24 bits"),
            Self::MissingStream => write!(f, "missing voxel stream"),
        }
    }
}

/// Snapshots extracted from a document, in input order.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBatch {
    pub snapshots: Vec<Snapshot>,
    /// `(array index, reason)` for every skipped record
    pub skipped: Vec<(usize, SkipReason)>,
}

/// Read every snapshot record from a document root.
///
/// Fails only when `"snapshots"` is absent or not an array; malformed
/// records are skipped.
pub fn read_snapshots<N: TreeNode>(root: &N) -> Result<SnapshotBatch> {
    let array = require_array(root, "snapshots")?;
    let len = array.array_len().unwrap_or(0);
    let mut batch = SnapshotBatch {
        snapshots: Vec::with_capacity(len),
        skipped: Vec::new(),
    };

    for index in 0..len {
        let Some(element) = array.array_item(index) else {
            batch.skipped.push((index, SkipReason::MissingState));
            continue;
        };
        match Snapshot::from_node(element) {
            Ok(snapshot) => {
                debug!(
                    index,
                    chunk = snapshot.chunk.raw(),
                    kind = ?snapshot.kind,
                    bytes = snapshot.stream.len(),
                    "read snapshot"
                );
                batch.snapshots.push(snapshot);
            }
            Err(reason) => {
                warn!(index, %reason, "skipping snapshot");
                batch.skipped.push((index, reason));
            }
        }
    }

    Ok(batch)
}

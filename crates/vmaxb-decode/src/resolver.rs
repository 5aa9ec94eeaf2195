//! Edit-history resolution.
//!
//! The `"snapshots"` array is an append-only edit history: the same chunk may
//! appear many times and only its most recent admitted entry describes the
//! current state. Input order is the only notion of time, so callers must
//! pass snapshots exactly as they appear in the container.

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vmaxb_core::ChunkId;

use crate::snapshot::{Snapshot, SnapshotKind};

/// Order in which the history is walked to pick each chunk's winner.
///
/// Both policies select the same snapshot; they differ only in how much
/// work is done for superseded entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolvePolicy {
    /// Walk forward; each snapshot replaces any earlier one for its chunk.
    #[default]
    LastWriteWins,
    /// Walk backward; the first snapshot seen for a chunk wins and later
    /// (chronologically earlier) ones are skipped.
    ReverseFirstSeen,
}

/// Which snapshot kinds take part in resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryFilter {
    /// Checkpoints and undo/redo restores only.
    #[default]
    Authoritative,
    /// Every kind, including undo, redo and selection entries.
    All,
}

impl HistoryFilter {
    pub const fn admits(self, kind: SnapshotKind) -> bool {
        match self {
            Self::Authoritative => kind.is_authoritative(),
            Self::All => true,
        }
    }
}

/// The authoritative snapshot of every chunk.
#[derive(Debug, Clone, Default)]
pub struct ResolvedChunks {
    chunks: HashMap<ChunkId, Snapshot>,
    /// Snapshots rejected by the history filter
    pub filtered: usize,
    /// Admitted snapshots that lost to a more recent one
    pub superseded: usize,
}

impl ResolvedChunks {
    /// Number of resolved chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if no chunk survived resolution.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The winning snapshot for a chunk.
    pub fn get(&self, chunk: ChunkId) -> Option<&Snapshot> {
        self.chunks.get(&chunk)
    }

    /// Resolved chunk IDs in ascending order.
    pub fn chunk_ids(&self) -> Vec<ChunkId> {
        let mut ids: Vec<_> = self.chunks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Winning snapshots in ascending chunk order.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> + '_ {
        let mut snapshots: Vec<_> = self.chunks.values().collect();
        snapshots.sort_unstable_by_key(|s| s.chunk);
        snapshots.into_iter()
    }
}

/// Picks the authoritative snapshot per chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotResolver {
    pub policy: ResolvePolicy,
    pub filter: HistoryFilter,
}

impl SnapshotResolver {
    pub const fn new(policy: ResolvePolicy, filter: HistoryFilter) -> Self {
        Self { policy, filter }
    }

    /// Resolve snapshots given in container order.
    pub fn resolve(&self, snapshots: Vec<Snapshot>) -> ResolvedChunks {
        let mut resolved = ResolvedChunks::default();

        let mut admitted = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            if self.filter.admits(snapshot.kind) {
                admitted.push(snapshot);
            } else {
                debug!(chunk = snapshot.chunk.raw(), kind = ?snapshot.kind, "filtered snapshot");
                resolved.filtered += 1;
            }
        }

        match self.policy {
            ResolvePolicy::LastWriteWins => {
                for snapshot in admitted {
                    if resolved.chunks.insert(snapshot.chunk, snapshot).is_some() {
                        resolved.superseded += 1;
                    }
                }
            }
            ResolvePolicy::ReverseFirstSeen => {
                for snapshot in admitted.into_iter().rev() {
                    match resolved.chunks.entry(snapshot.chunk) {
                        Entry::Vacant(slot) => {
                            slot.insert(snapshot);
                        }
                        Entry::Occupied(_) => resolved.superseded += 1,
                    }
                }
            }
        }

        debug!(
            chunks = resolved.chunks.len(),
            filtered = resolved.filtered,
            superseded = resolved.superseded,
            "resolved snapshots"
        );
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(chunk: u32, kind: SnapshotKind, stream: &[u8]) -> Snapshot {
        Snapshot::new(ChunkId::new(chunk).unwrap(), kind, stream.to_vec())
    }

    fn history() -> Vec<Snapshot> {
        vec![
            snap(1, SnapshotKind::Checkpoint, &[0, 1]),
            snap(2, SnapshotKind::Checkpoint, &[0, 2]),
            snap(1, SnapshotKind::Checkpoint, &[0, 3]),
            snap(1, SnapshotKind::Selection, &[0, 9]),
            snap(2, SnapshotKind::Undo, &[0, 9]),
            snap(3, SnapshotKind::RedoRestore, &[0, 4]),
        ]
    }

    #[test]
    fn later_snapshot_replaces_earlier() {
        let resolved = SnapshotResolver::default().resolve(history());
        assert_eq!(resolved.len(), 3);
        let one = resolved.get(ChunkId::new(1).unwrap()).unwrap();
        assert_eq!(one.stream, vec![0, 3]);
        assert_eq!(resolved.filtered, 2);
        assert_eq!(resolved.superseded, 1);
    }

    #[test]
    fn policies_agree() {
        for filter in [HistoryFilter::Authoritative, HistoryFilter::All] {
            let forward =
                SnapshotResolver::new(ResolvePolicy::LastWriteWins, filter).resolve(history());
            let reverse =
                SnapshotResolver::new(ResolvePolicy::ReverseFirstSeen, filter).resolve(history());
            assert_eq!(forward.chunk_ids(), reverse.chunk_ids());
            for id in forward.chunk_ids() {
                assert_eq!(forward.get(id), reverse.get(id));
            }
            assert_eq!(forward.superseded, reverse.superseded);
        }
    }

    #[test]
    fn unfiltered_history_takes_last_entry_of_any_kind() {
        let resolved =
            SnapshotResolver::new(ResolvePolicy::ReverseFirstSeen, HistoryFilter::All)
                .resolve(history());
        assert_eq!(resolved.filtered, 0);
        assert_eq!(resolved.get(ChunkId::new(1).unwrap()).unwrap().stream, vec![0, 9]);
        assert_eq!(resolved.get(ChunkId::new(2).unwrap()).unwrap().kind, SnapshotKind::Undo);
    }

    #[test]
    fn no_merge_of_competing_states() {
        let resolved = SnapshotResolver::default().resolve(vec![
            snap(7, SnapshotKind::Checkpoint, &[0, 1, 0, 1, 0, 1]),
            snap(7, SnapshotKind::Checkpoint, &[0, 0, 0, 2]),
        ]);
        assert_eq!(resolved.get(ChunkId::new(7).unwrap()).unwrap().stream, vec![0, 0, 0, 2]);
    }

    #[test]
    fn iteration_is_sorted() {
        let resolved = SnapshotResolver::default().resolve(vec![
            snap(9, SnapshotKind::Checkpoint, &[]),
            snap(2, SnapshotKind::Checkpoint, &[]),
            snap(5, SnapshotKind::Checkpoint, &[]),
        ]);
        let order: Vec<u32> = resolved.iter().map(|s| s.chunk.raw()).collect();
        assert_eq!(order, vec![2, 5, 9]);
        assert!(SnapshotResolver::default().resolve(Vec::new()).is_empty());
    }
}

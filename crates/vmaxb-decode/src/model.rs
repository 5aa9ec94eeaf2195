//! Assembled sparse voxel model.

use hashbrown::HashMap;
use std::collections::{BTreeMap, BTreeSet};
use vmaxb_core::{
    ChunkId, GroupKey, MaterialId, Palette, PaletteIndex, Rgba, Voxel, WorldPos,
};

/// Sparse voxel set indexed by chunk and by material/color group.
///
/// Both indices hold their own copy of every voxel. A later insert at an
/// occupied world position replaces the earlier voxel in both.
#[derive(Debug, Clone, Default)]
pub struct WorldModel {
    by_chunk: HashMap<ChunkId, HashMap<WorldPos, Voxel>>,
    by_group: BTreeMap<GroupKey, BTreeMap<WorldPos, Voxel>>,
    /// Where each occupied position currently lives
    owners: HashMap<WorldPos, (ChunkId, GroupKey)>,
}

impl WorldModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the voxel at `pos`.
    ///
    /// Returns `false` and leaves the model untouched if `material` is not
    /// one of the model's material slots.
    pub fn add_voxel(
        &mut self,
        pos: WorldPos,
        material: MaterialId,
        color: PaletteIndex,
        chunk: ChunkId,
    ) -> bool {
        if !material.is_valid() {
            return false;
        }
        let voxel = Voxel::new(pos, material, color, chunk);
        let key = voxel.group();

        if let Some((old_chunk, old_key)) = self.owners.insert(pos, (chunk, key)) {
            self.detach(pos, old_chunk, old_key);
        }
        self.by_chunk.entry(chunk).or_default().insert(pos, voxel);
        self.by_group.entry(key).or_default().insert(pos, voxel);
        true
    }

    fn detach(&mut self, pos: WorldPos, chunk: ChunkId, key: GroupKey) {
        if let Some(voxels) = self.by_chunk.get_mut(&chunk) {
            voxels.remove(&pos);
            if voxels.is_empty() {
                self.by_chunk.remove(&chunk);
            }
        }
        if let Some(voxels) = self.by_group.get_mut(&key) {
            voxels.remove(&pos);
            if voxels.is_empty() {
                self.by_group.remove(&key);
            }
        }
    }

    /// Voxels sharing a material and color, ordered by world position.
    pub fn voxels_for(
        &self,
        material: MaterialId,
        color: PaletteIndex,
    ) -> impl Iterator<Item = &Voxel> + '_ {
        self.by_group
            .get(&GroupKey::new(material, color))
            .into_iter()
            .flat_map(BTreeMap::values)
    }

    /// Distinct colors per material, both in ascending order.
    pub fn used_materials_and_colors(&self) -> BTreeMap<MaterialId, BTreeSet<PaletteIndex>> {
        let mut used: BTreeMap<MaterialId, BTreeSet<PaletteIndex>> = BTreeMap::new();
        for key in self.by_group.keys() {
            used.entry(key.material).or_default().insert(key.color);
        }
        used
    }

    /// Group keys with their voxel counts, in ascending key order.
    pub fn groups(&self) -> impl Iterator<Item = (GroupKey, usize)> + '_ {
        self.by_group.iter().map(|(key, voxels)| (*key, voxels.len()))
    }

    /// Group keys with their display color.
    ///
    /// Without a palette every group gets [`Rgba::FALLBACK`].
    pub fn group_colors<'a>(
        &'a self,
        palette: Option<&'a Palette>,
    ) -> impl Iterator<Item = (GroupKey, Rgba)> + 'a {
        self.by_group
            .keys()
            .map(move |key| (*key, Palette::lookup(palette, key.color)))
    }

    /// The voxel at a world position.
    pub fn voxel_at(&self, pos: WorldPos) -> Option<&Voxel> {
        let (chunk, _) = self.owners.get(&pos)?;
        self.by_chunk.get(chunk)?.get(&pos)
    }

    /// Voxels decoded from a chunk, in no particular order.
    pub fn voxels_in_chunk(&self, chunk: ChunkId) -> impl Iterator<Item = &Voxel> + '_ {
        self.by_chunk
            .get(&chunk)
            .into_iter()
            .flat_map(HashMap::values)
    }

    /// Chunks holding at least one voxel, in ascending order.
    pub fn chunk_ids(&self) -> Vec<ChunkId> {
        let mut ids: Vec<_> = self.by_chunk.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Total number of voxels.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Check if the model holds no voxels.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Inclusive `(min, max)` world corners, or `None` for an empty model.
    pub fn bounds(&self) -> Option<(WorldPos, WorldPos)> {
        let mut positions = self.owners.keys().copied();
        let first = positions.next()?;
        Some(positions.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }
}

//! Core voxel, color and palette types.

use crate::constants::{MATERIAL_COUNT, PALETTE_SIZE};
use crate::coords::{ChunkId, WorldPos};
use crate::error::{Error, Result};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Material slot referenced by a voxel.
///
/// Models carry eight material slots; IDs 8 and above are invalid.
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
pub struct MaterialId(pub u8);

impl MaterialId {
    /// Returns true if this ID names one of the model's material slots
    #[inline]
    pub const fn is_valid(self) -> bool {
        (self.0 as usize) < MATERIAL_COUNT
    }
}

/// Color byte as stored in a voxel stream.
///
/// Stored colors carry a +1 offset: 0 means "no voxel", and any other value
/// is `palette index + 1`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct StoredColor(pub u8);

impl StoredColor {
    /// Empty slot marker
    pub const EMPTY: Self = Self(0);

    /// Returns true if this slot holds no voxel
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The 0-based palette index, or `None` for an empty slot
    #[inline]
    pub const fn palette_index(self) -> Option<PaletteIndex> {
        match self.0 {
            0 => None,
            c => Some(PaletteIndex(c - 1)),
        }
    }
}

/// 0-based index into a 256-entry palette.
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
pub struct PaletteIndex(pub u8);

impl PaletteIndex {
    /// The stored (+1 offset) form of this index
    #[inline]
    pub const fn stored(self) -> Option<StoredColor> {
        match self.0.checked_add(1) {
            Some(c) => Some(StoredColor(c)),
            None => None,
        }
    }
}

/// Key grouping voxels that share a material and a palette color.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GroupKey {
    pub material: MaterialId,
    pub color: PaletteIndex,
}

impl GroupKey {
    #[inline]
    pub const fn new(material: MaterialId, color: PaletteIndex) -> Self {
        Self { material, color }
    }
}

/// A resolved voxel in world space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voxel {
    /// Absolute world position
    pub pos: WorldPos,
    /// Material slot
    pub material: MaterialId,
    /// 0-based palette color
    pub color: PaletteIndex,
    /// Chunk the voxel was decoded from
    pub chunk: ChunkId,
}

impl Voxel {
    /// Create a new voxel
    #[inline]
    pub const fn new(
        pos: WorldPos,
        material: MaterialId,
        color: PaletteIndex,
        chunk: ChunkId,
    ) -> Self {
        Self {
            pos,
            material,
            color,
            chunk,
        }
    }

    /// The material/color group this voxel belongs to
    #[inline]
    pub const fn group(&self) -> GroupKey {
        GroupKey::new(self.material, self.color)
    }

    /// Translation for instancing a unit cube at this voxel
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.pos.to_vec3()
    }
}

/// 8-bit sRGB color with alpha.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Neutral color used when no palette is available
    pub const FALLBACK: Self = Self::new(128, 128, 128, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to linear RGB, leaving alpha unchanged.
    pub fn to_linear(self) -> [f32; 4] {
        [
            srgb_to_linear(f32::from(self.r) / 255.0),
            srgb_to_linear(f32::from(self.g) / 255.0),
            srgb_to_linear(f32::from(self.b) / 255.0),
            f32::from(self.a) / 255.0,
        ]
    }
}

/// Convert one sRGB channel in `[0, 1]` to linear.
pub fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

/// 256-entry color table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Rgba>", into = "Vec<Rgba>")]
pub struct Palette {
    colors: Vec<Rgba>,
}

impl Palette {
    /// Build a palette from 256 packed RGBA pixels (a 256x1 image).
    pub fn from_rgba(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PALETTE_SIZE * 4 {
            return Err(Error::InvalidData(format!(
                "palette needs {} RGBA bytes, got {}",
                PALETTE_SIZE * 4,
                bytes.len()
            )));
        }
        let colors = bytes
            .chunks_exact(4)
            .map(|px| Rgba::new(px[0], px[1], px[2], px[3]))
            .collect();
        Ok(Self { colors })
    }

    /// Color at the given palette index, [`Rgba::FALLBACK`] past the table end
    #[inline]
    pub fn get(&self, index: PaletteIndex) -> Rgba {
        self.colors
            .get(index.0 as usize)
            .copied()
            .unwrap_or(Rgba::FALLBACK)
    }

    /// Color for `index`, or [`Rgba::FALLBACK`] when no palette was loaded.
    #[inline]
    pub fn lookup(palette: Option<&Self>, index: PaletteIndex) -> Rgba {
        palette.map_or(Rgba::FALLBACK, |p| p.get(index))
    }
}

impl TryFrom<Vec<Rgba>> for Palette {
    type Error = Error;

    fn try_from(colors: Vec<Rgba>) -> Result<Self> {
        if colors.len() != PALETTE_SIZE {
            return Err(Error::InvalidData(format!(
                "palette needs {PALETTE_SIZE} colors, got {}",
                colors.len()
            )));
        }
        Ok(Self { colors })
    }
}

impl From<Palette> for Vec<Rgba> {
    fn from(palette: Palette) -> Self {
        palette.colors
    }
}

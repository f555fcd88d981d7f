use serde::{Deserialize, Serialize};

/// Tunables named in `spec.md` §3.1/§4.1, externalized so a host application
/// can override them without recompiling (mirrors the teacher's per-feature
/// config structs, e.g. `ard-renderer`'s render settings).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FroxelConfig {
    /// Upper bound on `Nx * Ny * Nz`.
    pub froxel_buffer_max: u32,
    /// `Nz`.
    pub slice_count: u16,
    /// Record buffer length cap; can't exceed 65536 since froxel offsets are
    /// stored in 16 bits (`spec.md` §3.1).
    pub record_buffer_capacity: u32,
    /// Maximum simultaneously froxelized lights. Capped at
    /// [`MAX_LIGHT_COUNT`] because the per-froxel light set is stored as a
    /// fixed-width bitset (see `DESIGN.md` for why this isn't a generic
    /// bit-width parameter).
    pub max_light_count: u16,
}

/// Bits per [`crate::froxelizer::LightBitset`] word.
pub const LIGHT_BITSET_WORD_BITS: usize = 64;
/// Number of words in a [`crate::froxelizer::LightBitset`]; bounds
/// `max_light_count` at 256, matching the source's default
/// `CONFIG_MAX_LIGHT_COUNT`.
pub const LIGHT_BITSET_WORDS: usize = 4;
pub const MAX_LIGHT_COUNT: u16 = (LIGHT_BITSET_WORDS * LIGHT_BITSET_WORD_BITS) as u16;
/// Lights processed per froxelization job (`spec.md` §4.1.3: "parallel
/// groups of 32 lights per job").
pub const LIGHTS_PER_GROUP: usize = 32;

impl FroxelConfig {
    /// `u8` when `max_light_count <= 255`, else `u16` — resolves Open
    /// Question 2 as a runtime property instead of a compile-time typedef.
    pub fn record_element_type(&self) -> RecordElementType {
        if self.max_light_count <= u8::MAX as u16 {
            RecordElementType::U8
        } else {
            RecordElementType::U16
        }
    }

    pub fn group_count(&self) -> usize {
        (self.max_light_count as usize).div_ceil(LIGHTS_PER_GROUP).max(1)
    }
}

impl Default for FroxelConfig {
    fn default() -> Self {
        Self {
            froxel_buffer_max: 8192,
            slice_count: 16,
            record_buffer_capacity: 65536,
            max_light_count: MAX_LIGHT_COUNT,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecordElementType {
    U8,
    U16,
}

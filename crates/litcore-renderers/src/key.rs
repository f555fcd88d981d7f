//! The 64-bit sort key (`spec.md` §4.2.3), grounded on
//! `ard-render-objects::keys::DrawKey`'s pattern — a newtype `u64` with a
//! `separate()` debug accessor and `bytemuck::Pod` for direct storage
//! alongside the command it sorts.
//!
//! `PASS` (2 bits, top of the key) always groups commands by pass; the
//! remaining 62 bits are a tagged union whose layout depends on `PASS`
//! (`DESIGN.md` records why the spec's literal per-field widths can't all
//! coexist in one fixed 64-bit struct: summing every named field verbatim
//! for `DEPTH` alone comes to 72 bits).

use bytemuck::{Pod, Zeroable};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Pass {
    Blended = 0,
    Color = 1,
    Depth = 2,
    Sentinel = 3,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SortKey(u64);

unsafe impl Pod for SortKey {}
unsafe impl Zeroable for SortKey {}

static_assertions::assert_eq_size!(SortKey, u64);

/// `spec.md` R-I2: compares greater than every real key (`PASS` occupies the
/// top 2 bits and `Sentinel = 0b11` is the largest `PASS` value, so an
/// all-ones key is both the sentinel and the maximum element under an
/// ascending sort).
pub const SENTINEL_KEY: SortKey = SortKey(u64::MAX);

const PASS_SHIFT: u32 = 62;
const PRIORITY_SHIFT: u32 = 59; // 62 - 3

impl SortKey {
    #[inline(always)]
    pub fn raw(self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub fn pass(self) -> Pass {
        match self.0 >> PASS_SHIFT {
            0 => Pass::Blended,
            1 => Pass::Color,
            2 => Pass::Depth,
            _ => Pass::Sentinel,
        }
    }

    /// `BLENDED` layout: `PRIORITY:3 | BLEND_ORDER:15 | BLEND_DISTANCE:32 |
    /// BLEND_TWO_PASS:1 | reserved:11`.
    pub fn blended(priority: u8, blend_order: u16, blend_distance: u32, two_pass: bool) -> Self {
        let mut key = (Pass::Blended as u64) << PASS_SHIFT;
        key |= (priority as u64 & 0b111) << PRIORITY_SHIFT;
        key |= (blend_order as u64 & 0x7FFF) << (PRIORITY_SHIFT - 15);
        key |= (blend_distance as u64) << (PRIORITY_SHIFT - 15 - 32);
        key |= (two_pass as u64) << (PRIORITY_SHIFT - 15 - 32 - 1);
        Self(key)
    }

    /// `COLOR` layout: `PRIORITY:3 | Z_BUCKET:10 | MATERIAL_VARIANT:8 |
    /// MATERIAL_ID:32 | reserved:9`.
    pub fn color(priority: u8, z_bucket: u16, material_variant: u8, material_id: u32) -> Self {
        let mut key = (Pass::Color as u64) << PASS_SHIFT;
        key |= (priority as u64 & 0b111) << PRIORITY_SHIFT;
        key |= (z_bucket as u64 & 0x3FF) << (PRIORITY_SHIFT - 10);
        key |= (material_variant as u64) << (PRIORITY_SHIFT - 10 - 8);
        key |= (material_id as u64) << (PRIORITY_SHIFT - 10 - 8 - 32);
        Self(key)
    }

    /// `DEPTH` layout: `PRIORITY:3 | MATERIAL_VARIANT:8 | MATERIAL_ID:19 |
    /// DISTANCE_BITS:32`. `MATERIAL_ID` is narrowed to 19 bits here (from the
    /// 32 used in `COLOR`) so `DISTANCE_BITS` keeps full front-to-back
    /// precision — see `DESIGN.md`.
    pub fn depth(priority: u8, material_variant: u8, material_id: u32, distance_bits: u32) -> Self {
        let mut key = (Pass::Depth as u64) << PASS_SHIFT;
        key |= (priority as u64 & 0b111) << PRIORITY_SHIFT;
        key |= (material_variant as u64) << (PRIORITY_SHIFT - 8);
        key |= (material_id as u64 & 0x7FFFF) << (PRIORITY_SHIFT - 8 - 19);
        key |= distance_bits as u64;
        Self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_field_dominates_all_other_fields() {
        let blended = SortKey::blended(7, 0x7FFF, u32::MAX, true);
        let color = SortKey::color(0, 0, 0, 0);
        assert!(blended < color, "max-valued BLENDED key must still sort before a minimal COLOR key");

        let depth = SortKey::depth(0, 0, 0, 0);
        assert!(color < depth);
    }

    #[test]
    fn sentinel_is_greater_than_any_real_key() {
        let depth = SortKey::depth(7, 255, 0x7FFFF, u32::MAX);
        assert!(depth < SENTINEL_KEY);
        assert_eq!(SENTINEL_KEY.pass(), Pass::Sentinel);
    }

    #[test]
    fn color_priority_dominates_z_bucket() {
        let low_priority_far = SortKey::color(0, 0x3FF, 255, u32::MAX);
        let high_priority_near = SortKey::color(1, 0, 0, 0);
        assert!(low_priority_far < high_priority_near);
    }

    #[test]
    fn depth_distance_bits_break_ties_within_same_material() {
        let near = SortKey::depth(0, 0, 5, 100);
        let far = SortKey::depth(0, 0, 5, 200);
        assert!(near < far);
    }
}

//! `TextureKey` (`spec.md` §3.1/§4.3.4), grounded on
//! `ard-render-textures::factory`'s descriptor-as-cache-key pattern.

use litcore_backend::types::TextureDesc;

/// Per-channel swizzle, matching the `vk::ComponentSwizzle`-shaped field the
/// source keys on alongside the rest of the texture descriptor.
pub type Swizzle = [u8; 4];

/// Identifies a recyclable texture. Two keys match iff every field except
/// `name` compares equal (`spec.md` §4.3.4); `name` is carried purely for
/// debug labeling and is excluded from `Hash`/`Eq`.
#[derive(Debug, Clone)]
pub struct TextureKey {
    pub desc: TextureDesc,
    pub swizzle: Swizzle,
    pub name: Option<String>,
}

impl PartialEq for TextureKey {
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc && self.swizzle == other.swizzle
    }
}

impl Eq for TextureKey {}

impl std::hash::Hash for TextureKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.desc.hash(state);
        self.swizzle.hash(state);
    }
}

impl TextureKey {
    /// A looser match than [`Eq`] used only at checkout time: every field
    /// agrees except `width`/`height`, and the candidate must be at least
    /// as large in both dimensions as what's being requested. `Eq` (exact
    /// match, used for the general identify-a-cached-texture notion in
    /// `spec.md` §4.3.4/C-I2) would make the 1.5x oversized-rejection rule
    /// in §4.3.3 step 4 dead code, since an exact-size match can never be
    /// "too large" — see `DESIGN.md` for this resolution, grounded on
    /// `RenderTargetPool::get`'s width/height->=-and-1.5x-cap checkout in
    /// `original_source/filament/src/RenderTargetPool.cpp`.
    pub fn compatible_for_checkout(&self, candidate: &Self) -> bool {
        self.desc.target == candidate.desc.target
            && self.desc.levels == candidate.desc.levels
            && self.desc.format == candidate.desc.format
            && self.desc.samples == candidate.desc.samples
            && self.desc.depth == candidate.desc.depth
            && self.desc.usage == candidate.desc.usage
            && self.swizzle == candidate.swizzle
            && candidate.desc.width >= self.desc.width
            && candidate.desc.height >= self.desc.height
    }
}

//! `ResourceCache` (`spec.md` §4.3), grounded on `ard-render-textures::factory`
//! for the pool-owning-a-keyed-map shape and on
//! `original_source/filament/src/TextureCache.{h,cpp}` for the exact `gc()`
//! operation order: skip-frame purge, then soft-age eviction, then the
//! unique-age clamp (`DESIGN.md` records this as the resolution of an
//! ordering `spec.md` leaves implicit).

use litcore_backend::{BackendError, CommandStreamBackend, TextureHandle};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::key::TextureKey;

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entries older than this are candidates for soft-age eviction.
    pub cache_max_age_soft: u32,
    /// At most this many entries are soft-age-evicted per `gc()` tick.
    pub max_eviction_count: u32,
    /// Once this many distinct `currentAge - entry.age` deltas are present,
    /// every entry outside the 2 smallest deltas is evicted.
    pub max_unique_age_count: u32,
    /// A checkout candidate whose pixel count exceeds the request by more
    /// than this factor is rejected in favor of a fresh allocation.
    pub oversized_reject_ratio: f32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { cache_max_age_soft: 3, max_eviction_count: 1, max_unique_age_count: 3, oversized_reject_ratio: 1.5 }
    }
}

struct CachedTexture {
    key: TextureKey,
    handle: TextureHandle,
    age: u32,
}

/// Pools transient textures and render targets across frames (`spec.md`
/// §4.3.1). Accessed only from the view thread; not internally
/// synchronized, matching §5's "resource cache is accessed only from the
/// view thread" resource policy.
pub struct ResourceCache {
    config: CacheConfig,
    current_age: u32,
    free: Vec<CachedTexture>,
    in_use: FxHashMap<u64, TextureKey>,
}

impl ResourceCache {
    pub fn new(config: CacheConfig) -> Self {
        Self { config, current_age: 0, free: Vec::new(), in_use: FxHashMap::default() }
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// `spec.md` §4.3.2: returns a matching cached texture if one exists and
    /// isn't oversized by more than `oversized_reject_ratio`, otherwise
    /// allocates fresh through `backend`.
    pub fn create_texture(
        &mut self,
        key: TextureKey,
        backend: &mut impl CommandStreamBackend,
    ) -> Result<TextureHandle, BackendError> {
        let wanted_pixels = key.desc.pixel_count().max(1);
        if let Some(pos) = self.free.iter().position(|entry| {
            key.compatible_for_checkout(&entry.key)
                && (entry.key.desc.pixel_count() as f32)
                    <= wanted_pixels as f32 * self.config.oversized_reject_ratio
        }) {
            let entry = self.free.swap_remove(pos);
            self.in_use.insert(entry.handle.raw(), entry.key);
            return Ok(entry.handle);
        }

        let handle = backend.create_texture(key.desc.clone())?;
        self.in_use.insert(handle.raw(), key);
        Ok(handle)
    }

    /// `spec.md` §4.3.2: returns `handle` to the cache (or destroys it via
    /// `backend` if the cache has been disabled).
    pub fn destroy_texture(&mut self, handle: TextureHandle, enabled: bool, backend: &mut impl CommandStreamBackend) {
        let Some(key) = self.in_use.remove(&handle.raw()) else {
            log::warn!("destroy_texture: handle {handle:?} not tracked as in-use");
            return;
        };
        if enabled {
            self.free.push(CachedTexture { key, handle, age: self.current_age });
        } else {
            backend.destroy_texture(handle);
        }
    }

    /// Render targets pass straight through the backend; they are cheap to
    /// recreate and are never cached (`spec.md` §4.3.2).
    pub fn create_render_target(
        &mut self,
        desc: litcore_backend::types::RenderTargetDesc,
        backend: &mut impl CommandStreamBackend,
    ) -> Result<litcore_backend::RenderTargetHandle, BackendError> {
        backend.create_render_target(desc)
    }

    pub fn destroy_render_target(
        &mut self,
        handle: litcore_backend::RenderTargetHandle,
        backend: &mut impl CommandStreamBackend,
    ) {
        backend.destroy_render_target(handle);
    }

    /// `spec.md` §4.3.3. Called once per rendered frame.
    pub fn gc(&mut self, skipped_frame: bool, backend: &mut impl CommandStreamBackend) {
        if !skipped_frame {
            self.current_age += 1;
        }

        if skipped_frame {
            self.evict_where(backend, |age_delta| age_delta >= 1);
            return;
        }

        self.soft_age_eviction(backend);
        self.unique_age_clamp(backend);
    }

    fn soft_age_eviction(&mut self, backend: &mut impl CommandStreamBackend) {
        let mut evicted = 0u32;
        let current_age = self.current_age;
        let soft = self.config.cache_max_age_soft;
        let max = self.config.max_eviction_count;
        self.free.retain(|entry| {
            if evicted >= max {
                return true;
            }
            let age_delta = current_age - entry.age;
            if age_delta > soft {
                backend.destroy_texture(entry.handle);
                evicted += 1;
                false
            } else {
                true
            }
        });
    }

    fn unique_age_clamp(&mut self, backend: &mut impl CommandStreamBackend) {
        let current_age = self.current_age;
        let mut deltas: Vec<u32> = self.free.iter().map(|e| current_age - e.age).collect();
        deltas.sort_unstable();
        deltas.dedup();
        if (deltas.len() as u32) < self.config.max_unique_age_count {
            return;
        }
        let keep: rustc_hash::FxHashSet<u32> = deltas.into_iter().take(2).collect();
        self.evict_where(backend, |age_delta| !keep.contains(&age_delta));
    }

    fn evict_where(&mut self, backend: &mut impl CommandStreamBackend, mut predicate: impl FnMut(u32) -> bool) {
        let current_age = self.current_age;
        self.free.retain(|entry| {
            let age_delta = current_age - entry.age;
            if predicate(age_delta) {
                backend.destroy_texture(entry.handle);
                false
            } else {
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litcore_backend::mock::MockBackend;
    use litcore_backend::types::{TextureFormat, TextureTarget, TextureUsage};

    fn key() -> TextureKey {
        TextureKey {
            desc: litcore_backend::types::TextureDesc {
                target: TextureTarget::Texture2D,
                levels: 1,
                format: TextureFormat::Rgba8Unorm,
                samples: 1,
                width: 256,
                height: 256,
                depth: 1,
                usage: TextureUsage { color_attachment: true, ..Default::default() },
            },
            swizzle: [0, 1, 2, 3],
            name: Some("scratch".into()),
        }
    }

    #[test]
    fn checkout_reuses_released_texture() {
        let mut backend = MockBackend::new();
        let mut cache = ResourceCache::new(CacheConfig::default());
        let h1 = cache.create_texture(key(), &mut backend).unwrap();
        cache.destroy_texture(h1, true, &mut backend);
        assert_eq!(cache.len(), 1);
        let h2 = cache.create_texture(key(), &mut backend).unwrap();
        assert_eq!(h1, h2);
        assert!(cache.is_empty());
    }

    #[test]
    fn entry_survives_three_gcs_then_evicted_on_fourth() {
        let mut backend = MockBackend::new();
        let mut cache = ResourceCache::new(CacheConfig::default());
        let h1 = cache.create_texture(key(), &mut backend).unwrap();
        cache.destroy_texture(h1, true, &mut backend);

        cache.gc(false, &mut backend);
        cache.gc(false, &mut backend);
        cache.gc(false, &mut backend);
        assert_eq!(cache.len(), 1, "age delta 3 should still be <= cache_max_age_soft");

        cache.gc(false, &mut backend);
        assert_eq!(cache.len(), 0, "age delta 4 exceeds cache_max_age_soft and must be evicted");

        let h2 = cache.create_texture(key(), &mut backend).unwrap();
        assert_ne!(h1, h2, "eviction forces a fresh allocation");
    }

    #[test]
    fn skipped_frame_purges_everything_aged_at_least_one() {
        let mut backend = MockBackend::new();
        let mut cache = ResourceCache::new(CacheConfig::default());
        let h1 = cache.create_texture(key(), &mut backend).unwrap();
        cache.destroy_texture(h1, true, &mut backend);
        cache.gc(false, &mut backend);
        assert_eq!(cache.len(), 1);
        cache.gc(true, &mut backend);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn oversized_candidate_is_rejected_but_slightly_larger_is_reused() {
        let mut backend = MockBackend::new();
        let mut cache = ResourceCache::new(CacheConfig::default());

        let mut huge = key();
        huge.desc.width = 4096;
        huge.desc.height = 4096;
        let h_huge = cache.create_texture(huge, &mut backend).unwrap();
        cache.destroy_texture(h_huge, true, &mut backend);

        // requesting the original (256x256) size: the pooled 4096x4096
        // entry is > 1.5x oversized, so a fresh one must be allocated.
        let h_small = cache.create_texture(key(), &mut backend).unwrap();
        assert_ne!(h_small, h_huge);
        assert_eq!(cache.len(), 1, "the oversized entry is left in the pool, untouched");
    }

    #[test]
    fn slightly_larger_pooled_entry_is_reused() {
        let mut backend = MockBackend::new();
        let mut cache = ResourceCache::new(CacheConfig::default());

        let mut slightly_bigger = key();
        slightly_bigger.desc.width = 300;
        slightly_bigger.desc.height = 300;
        let h1 = cache.create_texture(slightly_bigger, &mut backend).unwrap();
        cache.destroy_texture(h1, true, &mut backend);

        let h2 = cache.create_texture(key(), &mut backend).unwrap();
        assert_eq!(h1, h2, "300x300 is well within the 1.5x pixel-count budget for a 256x256 request");
    }
}

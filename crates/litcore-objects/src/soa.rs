//! `RenderableSoa` (`spec.md` §4.4.1/§4.4.3): one row per renderable, culled
//! and `std::partition`'d into camera-visible / shadow-caster / invisible
//! ranges. Columnar so workers can later mutate disjoint row slices without
//! aliasing (design note "arena + indices over pointer graphs").

use litcore_base::IndexRange;
use litcore_math::Mat4;
use smallvec::SmallVec;

use crate::{ceil_to_16, culling::Frustum, Aabb, Primitive, Renderable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityRanges {
    pub visible: IndexRangeCopy,
    pub dir_casters: IndexRangeCopy,
    pub dyn_casters: IndexRangeCopy,
    pub invisible: IndexRangeCopy,
}

/// `Range<u32>` doesn't implement `Copy`; this does, so [`VisibilityRanges`]
/// can be passed by value to every downstream consumer named in §4.4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexRangeCopy {
    pub start: u32,
    pub end: u32,
}

impl From<IndexRangeCopy> for IndexRange {
    fn from(r: IndexRangeCopy) -> Self {
        r.start..r.end
    }
}

#[derive(Default)]
pub struct RenderableSoa {
    transforms: Vec<Mat4>,
    world_aabbs: Vec<Aabb>,
    layer_masks: Vec<u32>,
    channels: Vec<u32>,
    priorities: Vec<u8>,
    cast_shadows: Vec<bool>,
    receive_shadows: Vec<bool>,
    reversed_winding: Vec<bool>,
    culling_enabled: Vec<bool>,
    primitives: Vec<SmallVec<[Primitive; 4]>>,
    visible_mask: Vec<u8>,
    len: u32,
}

impl RenderableSoa {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pre-sizes rows to `ceil_to_16(num_entities) + 1` and writes one row
    /// per renderable (`spec.md` §4.4.2 steps 1-4); the trailing sentinel
    /// row is zero-initialized so branch-free suffix scans never read
    /// undefined data.
    pub fn prepare(&mut self, renderables: &[Renderable]) {
        let capacity = ceil_to_16(renderables.len() as u32) + 1;
        self.transforms = vec![Mat4::IDENTITY; capacity as usize];
        self.world_aabbs = vec![Aabb::empty(); capacity as usize];
        self.layer_masks = vec![0; capacity as usize];
        self.channels = vec![0; capacity as usize];
        self.priorities = vec![0; capacity as usize];
        self.cast_shadows = vec![false; capacity as usize];
        self.receive_shadows = vec![false; capacity as usize];
        self.reversed_winding = vec![false; capacity as usize];
        self.culling_enabled = vec![false; capacity as usize];
        self.primitives = vec![SmallVec::new(); capacity as usize];
        self.visible_mask = vec![0; capacity as usize];
        self.len = renderables.len() as u32;

        for (i, r) in renderables.iter().enumerate() {
            self.transforms[i] = r.transform;
            self.world_aabbs[i] = r.world_aabb();
            self.layer_masks[i] = r.layer_mask;
            self.channels[i] = r.channels;
            self.priorities[i] = r.priority.min(7);
            self.cast_shadows[i] = r.cast_shadows;
            self.receive_shadows[i] = r.receive_shadows;
            self.reversed_winding[i] = r.reversed_winding();
            self.culling_enabled[i] = r.culling;
            self.primitives[i] = r.primitives.clone();
        }
    }

    pub fn world_aabb(&self, i: u32) -> &Aabb {
        &self.world_aabbs[i as usize]
    }

    pub fn transform(&self, i: u32) -> &Mat4 {
        &self.transforms[i as usize]
    }

    pub fn reversed_winding(&self, i: u32) -> bool {
        self.reversed_winding[i as usize]
    }

    pub fn priority(&self, i: u32) -> u8 {
        self.priorities[i as usize]
    }

    pub fn cast_shadows(&self, i: u32) -> bool {
        self.cast_shadows[i as usize]
    }

    pub fn receive_shadows(&self, i: u32) -> bool {
        self.receive_shadows[i as usize]
    }

    pub fn channels(&self, i: u32) -> u32 {
        self.channels[i as usize]
    }

    pub fn primitives(&self, i: u32) -> &[Primitive] {
        &self.primitives[i as usize]
    }

    pub fn is_visible(&self, i: u32) -> bool {
        self.visible_mask[i as usize] != 0
    }

    /// Frustum-culls every active row (`spec.md` §4.4.3), writing
    /// `visible_mask`. Rows with `culling_enabled == false` are always
    /// treated as visible.
    pub fn cull(&mut self, frustum: &Frustum) {
        let n = self.len as usize;
        for i in 0..n {
            self.visible_mask[i] = if !self.culling_enabled[i] || frustum.test_aabb(&self.world_aabbs[i]) {
                1
            } else {
                0
            };
        }
    }

    /// `std::partition`-equivalent reordering into the 4 regions described
    /// in `spec.md` §4.4.3. `spotlight_caster` decides membership in the
    /// `[endDirCasters, endDynCasters)` region for rows invisible to the
    /// main camera but still worth considering for a dynamic (spot) shadow
    /// pass; callers without per-spotlight visibility data may pass `|_| false`.
    pub fn partition(&mut self, spotlight_caster: impl Fn(u32) -> bool) -> VisibilityRanges {
        let n = self.len as usize;
        let mut categories = vec![3u8; n];
        for i in 0..n {
            categories[i] = if self.visible_mask[i] != 0 {
                0
            } else if self.cast_shadows[i] {
                1
            } else if spotlight_caster(i as u32) {
                2
            } else {
                3
            };
        }

        let mut counts = [0u32; 4];
        for &c in &categories {
            counts[c as usize] += 1;
        }
        let mut offsets = [0u32; 4];
        for k in 1..4 {
            offsets[k] = offsets[k - 1] + counts[k - 1];
        }
        let starts = offsets;

        let mut perm = vec![0u32; n];
        let mut cursor = offsets;
        for (i, &c) in categories.iter().enumerate() {
            perm[cursor[c as usize] as usize] = i as u32;
            cursor[c as usize] += 1;
        }

        reorder(&mut self.transforms, &perm);
        reorder(&mut self.world_aabbs, &perm);
        reorder(&mut self.layer_masks, &perm);
        reorder(&mut self.channels, &perm);
        reorder(&mut self.priorities, &perm);
        reorder(&mut self.cast_shadows, &perm);
        reorder(&mut self.receive_shadows, &perm);
        reorder(&mut self.reversed_winding, &perm);
        reorder(&mut self.culling_enabled, &perm);
        reorder(&mut self.primitives, &perm);
        reorder(&mut self.visible_mask, &perm);

        VisibilityRanges {
            visible: IndexRangeCopy { start: 0, end: starts[1] },
            dir_casters: IndexRangeCopy { start: starts[1], end: starts[2] },
            dyn_casters: IndexRangeCopy { start: starts[2], end: starts[3] },
            invisible: IndexRangeCopy { start: starts[3], end: n as u32 },
        }
    }

    /// Builds the per-renderable uniform block for every row in `range`
    /// (`spec.md` §2 "prepare per-renderable uniform data", §6). `objectId`
    /// is the row's absolute index, matching how `RenderPass::execute`
    /// addresses this same array by `renderable_index`.
    pub fn renderable_uniforms(&self, range: IndexRange) -> Vec<crate::uib::PerRenderableUib> {
        range
            .map(|i| {
                crate::uib::PerRenderableUib::new(
                    self.transforms[i as usize],
                    self.channels[i as usize],
                    self.cast_shadows[i as usize],
                    self.receive_shadows[i as usize],
                    self.reversed_winding[i as usize],
                    i,
                )
            })
            .collect()
    }
}

fn reorder<T: Clone>(column: &mut [T], perm: &[u32]) {
    let original = column.to_vec();
    for (dst, &src) in column.iter_mut().zip(perm.iter()) {
        *dst = original[src as usize].clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litcore_math::Vec3;

    fn renderable(visible_x: f32, cast_shadows: bool) -> Renderable {
        Renderable {
            local_aabb: Aabb { min: Vec3::new(-0.5, -0.5, -0.5), max: Vec3::new(0.5, 0.5, 0.5) },
            transform: Mat4::from_translation(Vec3::new(visible_x, 0.0, -5.0)),
            layer_mask: 1,
            channels: 0,
            priority: 0,
            cast_shadows,
            receive_shadows: true,
            culling: true,
            primitives: SmallVec::new(),
        }
    }

    #[test]
    fn partition_orders_ranges_contiguously() {
        let mut soa = RenderableSoa::new();
        let renderables = vec![
            renderable(0.0, false),  // visible
            renderable(1000.0, true),  // invisible, shadow caster
            renderable(2000.0, false), // invisible, not a caster
            renderable(0.1, false),  // visible
        ];
        soa.prepare(&renderables);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
        let frustum = Frustum::from_view_projection(proj);
        soa.cull(&frustum);
        let ranges = soa.partition(|_| false);

        assert_eq!(ranges.visible.end - ranges.visible.start, 2);
        assert_eq!(ranges.dir_casters.end - ranges.dir_casters.start, 1);
        assert_eq!(ranges.dyn_casters.end - ranges.dyn_casters.start, 0);
        assert_eq!(ranges.invisible.end, soa.len());

        for i in ranges.visible.start..ranges.visible.end {
            assert!(soa.is_visible(i));
        }
    }
}

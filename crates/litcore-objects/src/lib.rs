//! Scene visibility & SoA preparation (`spec.md` §4.4), grounded on the
//! columnar `ObjectSet`/`ObjectList` pattern in `ard-render-objects::objects`,
//! generalized from GPU-buffer-backed storage to plain `Vec<T>` columns —
//! the GPU upload is the out-of-scope backend's job; this crate only
//! produces the CPU-side SoA and the ranges downstream passes consume.

pub mod culling;
pub mod lights;
pub mod soa;
pub mod uib;

use litcore_backend::BufferHandle;
use litcore_base::ResourceId;
use litcore_math::Vec3;
use smallvec::SmallVec;

pub use culling::Frustum;
pub use lights::LightSoa;
pub use soa::{IndexRangeCopy, RenderableSoa, VisibilityRanges};
pub use uib::{PerRenderableUib, FLAG_CAST_SHADOWS, FLAG_RECEIVE_SHADOWS, FLAG_REVERSED_WINDING};

/// Axis-aligned bounding box, view- or world-space depending on context.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn empty() -> Aabb {
        Aabb { min: Vec3::splat(f32::MAX), max: Vec3::splat(f32::MIN) }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// `rigidTransform(localAABB, worldTransform)` (`spec.md` §4.4.2 step 3):
    /// transforms the 8 corners implicitly via the center+extent form, which
    /// is exact for any affine transform (not just rotations).
    pub fn transformed(&self, transform: litcore_math::Mat4) -> Aabb {
        let center = transform.transform_point3(self.center());
        let extent = self.extent();
        let linear = litcore_math::Mat3::from_mat4(transform);
        let abs = litcore_math::Mat3::from_cols(
            linear.x_axis.abs(),
            linear.y_axis.abs(),
            linear.z_axis.abs(),
        );
        let new_extent = abs * extent;
        Aabb { min: center - new_extent, max: center + new_extent }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct Primitive {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_offset: u32,
    pub index_count: u32,
    pub material_instance: ResourceId,
    pub blend_order: u16,
}

/// `spec.md` §3.1 Renderable. `culling` disables frustum testing entirely
/// (always visible) for e.g. skyboxes.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub local_aabb: Aabb,
    pub transform: litcore_math::Mat4,
    pub layer_mask: u32,
    pub channels: u32,
    pub priority: u8,
    pub cast_shadows: bool,
    pub receive_shadows: bool,
    pub culling: bool,
    pub primitives: SmallVec<[Primitive; 4]>,
}

impl Renderable {
    pub fn world_aabb(&self) -> Aabb {
        self.local_aabb.transformed(self.transform)
    }

    /// Determinant sign of the upper-left 3x3 (`spec.md` §4.4.2 step 4).
    pub fn reversed_winding(&self) -> bool {
        litcore_math::Mat3::from_mat4(self.transform).determinant() < 0.0
    }
}

/// Rounds `n` up to the next multiple of 16 (`spec.md` §4.4.2 step 1).
pub fn ceil_to_16(n: u32) -> u32 {
    (n + 15) & !15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_to_16_rounds_up() {
        assert_eq!(ceil_to_16(0), 0);
        assert_eq!(ceil_to_16(1), 16);
        assert_eq!(ceil_to_16(16), 16);
        assert_eq!(ceil_to_16(17), 32);
    }

    #[test]
    fn aabb_transformed_by_identity_is_unchanged() {
        let aabb = Aabb { min: Vec3::new(-1.0, -1.0, -1.0), max: Vec3::new(1.0, 1.0, 1.0) };
        let out = aabb.transformed(litcore_math::Mat4::IDENTITY);
        assert!(out.min.abs_diff_eq(aabb.min, 1e-6));
        assert!(out.max.abs_diff_eq(aabb.max, 1e-6));
    }

    #[test]
    fn negative_scale_flips_winding() {
        let r = Renderable {
            local_aabb: Aabb { min: Vec3::ZERO, max: Vec3::ONE },
            transform: litcore_math::Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)),
            layer_mask: 1,
            channels: 0,
            priority: 0,
            cast_shadows: true,
            receive_shadows: true,
            culling: true,
            primitives: SmallVec::new(),
        };
        assert!(r.reversed_winding());
    }
}

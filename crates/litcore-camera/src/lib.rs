//! Per-view camera state and light froxelization (`spec.md` §3.1, §4.1),
//! grounded on `ard-render-camera` for the module boundary.

pub mod config;
pub mod froxelizer;
pub mod intersections;
pub mod ubo;

pub use config::{FroxelConfig, RecordElementType};
pub use froxelizer::{Froxel, FroxelEntry, FroxelUniforms, Froxelizer, FroxelizeOutput, LightBitset};
pub use intersections::{
    project_to_clip, sphere_cone_intersection_fast, sphere_plane_distance_squared,
    sphere_plane_intersection, unproject_to_view,
};
pub use ubo::PerViewUib;

use litcore_math::Mat4;

/// A render target sub-rectangle in backend pixel coordinates, `spec.md`
/// §3.1. Bottom-left origin, matching the backend's `RenderTargetDesc`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Viewport {
    pub left: i32,
    pub bottom: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Immutable per-frame camera snapshot (`spec.md` §3.1: "CameraInfo"). Built
/// once per view per frame and shared read-only across every job that needs
/// it — culling, froxelization, UBO upload.
#[derive(Debug, Copy, Clone)]
pub struct CameraInfo {
    /// World-to-view matrix.
    pub view: Mat4,
    /// View-to-clip matrix used for shading and froxelization.
    pub projection: Mat4,
    /// View-to-clip matrix used for culling; may differ from `projection`
    /// when a reversed-Z or custom far plane is used for culling only.
    pub culling_projection: Mat4,
    pub z_near: f32,
    pub z_far: f32,
    /// `log2` of the exposure value, used by tone mapping (§6 per-view UBO).
    pub ev100: f32,
    /// View-to-world matrix, i.e. `view.inverse()`, cached since every
    /// renderable's world transform is multiplied against it during culling.
    pub world_transform: Mat4,
}

impl CameraInfo {
    pub fn new(view: Mat4, projection: Mat4, z_near: f32, z_far: f32, ev100: f32) -> Self {
        Self {
            view,
            projection,
            culling_projection: projection,
            z_near,
            z_far,
            ev100,
            world_transform: view.inverse(),
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_aspect_ratio_matches_dimensions() {
        let v = Viewport { left: 0, bottom: 0, width: 1920, height: 1080 };
        assert!((v.aspect_ratio() - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn camera_info_caches_inverse_view() {
        let view = Mat4::from_translation(litcore_math::Vec3::new(1.0, 2.0, 3.0));
        let info = CameraInfo::new(view, Mat4::IDENTITY, 0.1, 100.0, 0.0);
        assert!(info.world_transform.abs_diff_eq(view.inverse(), 1e-5));
    }
}

//! The per-view uniform block (`spec.md` §6), grounded on
//! `original_source/filament/src/PerViewUniforms.cpp`'s `prepareCamera`/
//! `prepareExposure`/`prepareViewport`/`prepareTime` for field semantics and
//! on `ard-graphics-vk::camera::CameraUBO` for the `#[repr(C)]` packing
//! idiom (a trailing vec3 and an unrelated scalar share one `Vec4` so the
//! layout stays std140-compatible without a padding field of its own).

use litcore_math::{Mat4, UVec4, Vec4};

use crate::froxelizer::FroxelUniforms;
use crate::{CameraInfo, Viewport};

/// Bit-exact mirror of the shader-side per-view uniform block. Built once
/// per view per frame by [`PerViewUib::new`] and uploaded by the caller
/// before the first draw that references binding point 0.
///
/// `fog_params` mirrors the four scalar fields `prepareFog` sets
/// (`fogStart`, `fogMaxOpacity`, `fogHeight`, `fogHeightFalloff`); this core
/// has no fog configuration type of its own to source them from, so they
/// are left zeroed. The field is kept (rather than folded into anonymous
/// padding) so a host that does own fog state can write into it without
/// changing the block's layout.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PerViewUib {
    pub view_from_world: Mat4,
    pub world_from_view: Mat4,
    pub clip_from_view: Mat4,
    pub view_from_clip: Mat4,
    pub clip_from_world: Mat4,
    pub world_from_clip: Mat4,
    /// xyz: world-space camera position. w: far plane distance.
    pub camera_position_far: Vec4,
    /// x: `1 / (far - near)`. y: `near / (far - near)`. z: exposure
    /// (`1 / (1.2 * 2^ev100)`, the standard photographic formula). w: ev100.
    pub near_params: Vec4,
    /// xy: viewport size in pixels. zw: `1 / xy`.
    pub resolution: Vec4,
    /// xy: viewport bottom-left origin in pixels. z: fractional elapsed
    /// time in seconds, supplied by the caller (this core has no clock of
    /// its own). w: unused.
    pub origin_time: Vec4,
    pub user_time: Vec4,
    pub fog_params: Vec4,
    /// x: unused (no ambient-occlusion data model in this core). yz:
    /// froxel grid size in pixels (`FroxelUniforms::froxel_count_xy`).
    /// w: unused.
    pub ao_and_froxel_count_xy: Vec4,
    pub z_params: Vec4,
    /// xyz: froxel record layout (`FroxelUniforms::f_params`). w: unused.
    pub f_params: UVec4,
}

impl PerViewUib {
    pub fn new(
        camera: &CameraInfo,
        viewport: Viewport,
        froxel: FroxelUniforms,
        time_fraction: f32,
        user_time: Vec4,
    ) -> Self {
        let view_from_clip = camera.projection.inverse();
        let world_from_clip = camera.world_transform * view_from_clip;
        let camera_position = camera.world_transform.w_axis.truncate();
        let span = camera.z_far - camera.z_near;
        let exposure = 1.0 / (1.2 * 2f32.powf(camera.ev100));
        let width = viewport.width.max(1) as f32;
        let height = viewport.height.max(1) as f32;

        Self {
            view_from_world: camera.view,
            world_from_view: camera.world_transform,
            clip_from_view: camera.projection,
            view_from_clip,
            clip_from_world: camera.view_projection(),
            world_from_clip,
            camera_position_far: camera_position.extend(camera.z_far),
            near_params: Vec4::new(1.0 / span, camera.z_near / span, exposure, camera.ev100),
            resolution: Vec4::new(width, height, 1.0 / width, 1.0 / height),
            origin_time: Vec4::new(viewport.left as f32, viewport.bottom as f32, time_fraction, 0.0),
            user_time,
            fog_params: Vec4::ZERO,
            ao_and_froxel_count_xy: Vec4::new(0.0, froxel.froxel_count_xy.x, froxel.froxel_count_xy.y, 0.0),
            z_params: froxel.z_params,
            f_params: UVec4::new(froxel.f_params[0], froxel.f_params[1], froxel.f_params[2], 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litcore_math::Vec3;

    fn camera() -> CameraInfo {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        CameraInfo::new(view, proj, 0.1, 100.0, 1.0)
    }

    #[test]
    fn camera_position_matches_world_transform_translation() {
        let uib = PerViewUib::new(
            &camera(),
            Viewport { left: 0, bottom: 0, width: 1920, height: 1080 },
            FroxelUniforms { z_params: Vec4::ZERO, f_params: [0; 3], froxel_count_xy: Default::default() },
            0.0,
            Vec4::ZERO,
        );
        assert!(uib.camera_position_far.truncate().abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
        assert_eq!(uib.camera_position_far.w, 100.0);
    }

    #[test]
    fn resolution_packs_dimensions_and_reciprocals() {
        let uib = PerViewUib::new(
            &camera(),
            Viewport { left: 0, bottom: 0, width: 1920, height: 1080 },
            FroxelUniforms { z_params: Vec4::ZERO, f_params: [0; 3], froxel_count_xy: Default::default() },
            0.0,
            Vec4::ZERO,
        );
        assert!((uib.resolution.z - 1.0 / 1920.0).abs() < 1e-9);
        assert!((uib.resolution.w - 1.0 / 1080.0).abs() < 1e-9);
    }

    #[test]
    fn is_plain_old_data() {
        fn assert_pod<T: bytemuck::Pod>() {}
        assert_pod::<PerViewUib>();
    }
}

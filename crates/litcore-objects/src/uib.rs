//! The per-renderable uniform block (`spec.md` §6), grounded on
//! `original_source/filament/src/PerRenderableUib` conventions (the same
//! world-space model matrix plus its normal-matrix cofactor, alongside a
//! handful of bit-packed scalars) and on `ard-graphics-vk::camera::CameraUBO`
//! for the `#[repr(C)]` packing idiom this crate already follows for
//! [`crate::soa`]'s world-AABB math.

use litcore_math::{Mat3, Mat4, Vec4};

/// `flagsChannels`'s cast-shadows bit.
pub const FLAG_CAST_SHADOWS: u32 = 1 << 0;
/// `flagsChannels`'s receive-shadows bit.
pub const FLAG_RECEIVE_SHADOWS: u32 = 1 << 1;
/// `flagsChannels`'s reversed-winding bit (`spec.md` §4.4.2 step 4).
pub const FLAG_REVERSED_WINDING: u32 = 1 << 2;

/// Bit-exact mirror of the shader-side per-renderable uniform block
/// (`spec.md` §6: `worldFromModel`, `worldFromModelNormal`, `flagsChannels`,
/// `morphTargetCount`, `objectId`, `userData`). One instance per visible
/// renderable; `RenderPass::execute` binds `renderable_index *
/// size_of::<PerRenderableUib>()` into this array every draw.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PerRenderableUib {
    pub world_from_model: Mat4,
    /// The normal matrix (`inverse(mat3(worldFromModel)).transpose()`), one
    /// column per `Vec4` with `w` unused — std140 has no native `mat3`.
    pub world_from_model_normal: [Vec4; 3],
    /// Low 3 bits: `FLAG_*`. High 29 bits: the renderable's layer/light
    /// channel mask, truncated to fit (`spec.md` §4.4.1's `channels: u32`
    /// has no committed bit width of its own, so this core reserves the
    /// low flag bits and leaves the rest to the channel mask, matching how
    /// `reversed_winding`/`cast_shadows`/`receive_shadows` are already
    /// carried as separate SoA columns rather than pre-packed upstream).
    pub flags_channels: u32,
    /// This core's `Renderable` has no morph-target data; always 0.
    pub morph_target_count: u32,
    pub object_id: u32,
    /// This core has no per-renderable scalar payload to source this from;
    /// always 0.
    pub user_data: f32,
}

impl PerRenderableUib {
    pub fn new(
        world_from_model: Mat4,
        channels: u32,
        cast_shadows: bool,
        receive_shadows: bool,
        reversed_winding: bool,
        object_id: u32,
    ) -> Self {
        let normal = Mat3::from_mat4(world_from_model).inverse().transpose();
        let mut flags = 0u32;
        if cast_shadows {
            flags |= FLAG_CAST_SHADOWS;
        }
        if receive_shadows {
            flags |= FLAG_RECEIVE_SHADOWS;
        }
        if reversed_winding {
            flags |= FLAG_REVERSED_WINDING;
        }

        Self {
            world_from_model,
            world_from_model_normal: [
                normal.x_axis.extend(0.0),
                normal.y_axis.extend(0.0),
                normal.z_axis.extend(0.0),
            ],
            flags_channels: flags | (channels << 3),
            morph_target_count: 0,
            object_id,
            user_data: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litcore_math::Vec3;

    #[test]
    fn flags_are_packed_below_the_channel_mask() {
        let uib = PerRenderableUib::new(Mat4::IDENTITY, 0b101, true, false, true, 7);
        assert_eq!(uib.flags_channels & 0b111, FLAG_CAST_SHADOWS | FLAG_REVERSED_WINDING);
        assert_eq!(uib.flags_channels >> 3, 0b101);
        assert_eq!(uib.object_id, 7);
    }

    #[test]
    fn identity_transform_has_identity_normal_matrix() {
        let uib = PerRenderableUib::new(Mat4::IDENTITY, 0, false, false, false, 0);
        assert!(uib.world_from_model_normal[0].truncate().abs_diff_eq(Vec3::X, 1e-6));
        assert!(uib.world_from_model_normal[1].truncate().abs_diff_eq(Vec3::Y, 1e-6));
        assert!(uib.world_from_model_normal[2].truncate().abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn is_plain_old_data() {
        fn assert_pod<T: bytemuck::Pod>() {}
        assert_pod::<PerRenderableUib>();
    }
}

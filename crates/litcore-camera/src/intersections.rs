//! Branch-free geometric primitives used by froxelization (`spec.md` §3.2
//! supplement, grounded on `original_source/filament/src/Intersections.h`).
//!
//! A sphere is represented as `Vec4 { xyz: center, w: radius^2 }` throughout
//! — squared radius avoids a sqrt in the hot loop, matching the source.

use litcore_math::{Vec3, Vec4};

/// Intersects a sphere with a plane, returning the sphere that bounds the
/// intersection disc: `center' = center - plane.n * d`, `radius'^2 = radius^2
/// - d^2` where `d` is the signed distance from the sphere center to the
/// plane. A non-positive `w` on the result means no intersection.
#[inline]
pub fn sphere_plane_intersection(sphere: Vec4, plane_normal: Vec3, plane_d: f32) -> Vec4 {
    let center = sphere.truncate();
    let d = center.dot(plane_normal) + plane_d;
    let rr = sphere.w - d * d;
    (center - plane_normal * d).extend(rr)
}

/// Specialization of [`sphere_plane_intersection`] for the X/Y froxel planes,
/// which pass through the camera origin (`plane_d` is always 0 for those —
/// F-I4) and whose normal has no y or x component respectively (used by the
/// X-walk in §4.1.3 step 6 and the Y-strip narrowing in step 5).
#[inline]
pub fn sphere_plane_distance_squared(sphere: Vec4, plane_nx: f32, plane_nz: f32) -> f32 {
    sphere_plane_intersection(sphere, Vec3::new(plane_nx, 0.0, plane_nz), 0.0).w
}

/// Branch-free cone/sphere test (`Intersections.h`'s `sphereConeIntersectionFast`).
/// Over-approximates near the cone apex by design; callers must not "fix"
/// this, since it would change which froxels a spotlight lights.
#[inline]
pub fn sphere_cone_intersection_fast(
    sphere: Vec4,
    cone_position: Vec3,
    cone_axis: Vec3,
    cone_sin_inverse: f32,
    cone_cos_squared: f32,
) -> bool {
    // Deliberately uses the squared radius (`sphere.w`) directly, not its
    // square root — this is the documented over-approximation, not a typo.
    let u = cone_position - cone_axis * (sphere.w * cone_sin_inverse);
    let d = sphere.truncate() - u;
    let e = cone_axis.dot(d);
    let dd = d.dot(d);
    (e * e >= dd * cone_cos_squared) && (e > 0.0)
}

/// Projects a view-space point through `projection`, returning clip-space
/// xy divided by w. Used both to build froxel planes (edges at z=-1) and to
/// bound a light's footprint in clip space.
#[inline]
pub fn project_to_clip(projection: litcore_math::Mat4, view_pos: Vec3) -> litcore_math::Vec2 {
    let clip = projection * view_pos.extend(1.0);
    clip.truncate().truncate() / clip.w
}

/// Unprojects a clip-space point (w=1) back to view space.
#[inline]
pub fn unproject_to_view(inv_projection: litcore_math::Mat4, clip: Vec4) -> Vec3 {
    let view = inv_projection * clip;
    view.truncate() / view.w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_through_center_has_full_radius() {
        let sphere = Vec3::new(0.0, 0.0, -5.0).extend(4.0);
        let result = sphere_plane_intersection(sphere, Vec3::Z, 5.0);
        assert!((result.w - 4.0).abs() < 1e-5);
    }

    #[test]
    fn plane_beyond_radius_has_non_positive_w() {
        let sphere = Vec3::new(0.0, 0.0, -5.0).extend(1.0);
        let result = sphere_plane_intersection(sphere, Vec3::Z, 0.0);
        assert!(result.w <= 0.0);
    }

    #[test]
    fn cone_apex_point_is_inside() {
        let sphere = Vec3::new(0.0, 0.0, -10.0).extend(1.0);
        let hit = sphere_cone_intersection_fast(
            sphere,
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, -1.0),
            1.0,
            0.5,
        );
        assert!(hit);
    }
}

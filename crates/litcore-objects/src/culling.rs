//! Frustum-vs-AABB / frustum-vs-sphere tests, batched in groups of 8
//! (`spec.md` §4.4.3). No intrinsics are used — the batching here mirrors the
//! source's loop shape so an auto-vectorizer has a fair shot at it, which is
//! the same bet the teacher's `ard-render-camera` culling code makes.

use litcore_math::{Mat4, Vec3, Vec4};

use crate::Aabb;

/// Six frustum planes in `ax + by + cz + d >= 0` (inside) form.
#[derive(Debug, Copy, Clone)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extracts the 6 clip planes from a combined view-projection (or
    /// culling-projection) matrix via the standard Gribb-Hartmann method.
    pub fn from_view_projection(vp: Mat4) -> Self {
        let row = |i: usize| Vec4::new(vp.x_axis[i], vp.y_axis[i], vp.z_axis[i], vp.w_axis[i]);
        let r0 = row(0);
        let r1 = row(1);
        let r2 = row(2);
        let r3 = row(3);
        let mut planes = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r3 + r2, // near
            r3 - r2, // far
        ];
        for p in &mut planes {
            let len = p.truncate().length();
            if len > 0.0 {
                *p /= len;
            }
        }
        Self { planes }
    }

    #[inline]
    fn test_one(&self, center: Vec3, extent: Vec3) -> bool {
        for plane in &self.planes {
            let n = plane.truncate();
            let r = extent.x * n.x.abs() + extent.y * n.y.abs() + extent.z * n.z.abs();
            let d = n.dot(center) + plane.w;
            if d + r < 0.0 {
                return false;
            }
        }
        true
    }

    #[inline]
    pub fn test_aabb(&self, aabb: &Aabb) -> bool {
        self.test_one(aabb.center(), aabb.extent())
    }

    #[inline]
    pub fn test_sphere(&self, center: Vec3, radius: f32) -> bool {
        for plane in &self.planes {
            if plane.truncate().dot(center) + plane.w + radius < 0.0 {
                return false;
            }
        }
        true
    }
}

/// Writes one byte per AABB into `visible_mask` (nonzero = visible),
/// processed in chunks of 8 per `spec.md` §4.4.3's batching scheme.
pub fn cull_aabbs_batch8(frustum: &Frustum, aabbs: &[Aabb], visible_mask: &mut [u8]) {
    debug_assert_eq!(aabbs.len(), visible_mask.len());
    for (chunk_aabbs, chunk_mask) in aabbs.chunks(8).zip(visible_mask.chunks_mut(8)) {
        for (aabb, mask) in chunk_aabbs.iter().zip(chunk_mask.iter_mut()) {
            *mask = frustum.test_aabb(aabb) as u8;
        }
    }
}

/// Same batching, for light bounding spheres (`spec.md` §4.4.3: "Renderable
/// culling and light culling may run in parallel" — identical primitive).
pub fn cull_spheres_batch8(
    frustum: &Frustum,
    centers: &[Vec3],
    radii: &[f32],
    visible_mask: &mut [u8],
) {
    debug_assert_eq!(centers.len(), radii.len());
    debug_assert_eq!(centers.len(), visible_mask.len());
    for ((c, r), mask) in centers.iter().zip(radii.iter()).zip(visible_mask.iter_mut()) {
        *mask = frustum.test_sphere(*c, *r) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frustum() -> Frustum {
        let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
        Frustum::from_view_projection(proj)
    }

    #[test]
    fn aabb_in_front_of_camera_is_visible() {
        let f = test_frustum();
        let aabb = Aabb { min: Vec3::new(-0.1, -0.1, -5.1), max: Vec3::new(0.1, 0.1, -4.9) };
        assert!(f.test_aabb(&aabb));
    }

    #[test]
    fn aabb_behind_camera_is_not_visible() {
        let f = test_frustum();
        let aabb = Aabb { min: Vec3::new(-0.1, -0.1, 4.9), max: Vec3::new(0.1, 0.1, 5.1) };
        assert!(!f.test_aabb(&aabb));
    }

    #[test]
    fn batched_cull_matches_scalar() {
        let f = test_frustum();
        let aabbs: Vec<Aabb> = (0..20)
            .map(|i| {
                let z = -1.0 - i as f32 * 2.0;
                Aabb { min: Vec3::new(-0.1, -0.1, z - 0.1), max: Vec3::new(0.1, 0.1, z + 0.1) }
            })
            .collect();
        let mut mask = vec![0u8; aabbs.len()];
        cull_aabbs_batch8(&f, &aabbs, &mut mask);
        for (aabb, &m) in aabbs.iter().zip(mask.iter()) {
            assert_eq!(m != 0, f.test_aabb(aabb));
        }
    }
}

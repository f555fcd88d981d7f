//! Analytic light descriptions (`spec.md` §3.1).
//!
//! [`Light`] is the tagged-union the rest of the core is built around —
//! unused fields per variant are simply absent rather than zeroed, unlike
//! the GPU-facing [`ViewSpaceLight`] row the froxelizer consumes, which
//! really is a flat record with zeroed-out fields for the variant that
//! doesn't apply (design note "tagged variants over inheritance").

use litcore_math::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Light {
    Directional {
        direction: Vec3,
        color: Vec3,
        intensity: f32,
    },
    /// A directional light promoted to the scene's dominant sun (§4.4.2):
    /// same shading data plus the disc parameters used by a sky/atmosphere
    /// pass. Still occupies row 0 of the `LightSoa`, like any directional.
    Sun {
        direction: Vec3,
        color: Vec3,
        intensity: f32,
        angular_radius: f32,
        halo_size: f32,
        halo_falloff: f32,
    },
    Point {
        position: Vec3,
        radius: f32,
        color: Vec3,
        intensity: f32,
    },
    Spot {
        position: Vec3,
        radius: f32,
        axis: Vec3,
        cos_outer: f32,
        inv_sin_outer: f32,
        color: Vec3,
        intensity: f32,
    },
}

impl Light {
    pub fn is_directional(&self) -> bool {
        matches!(self, Light::Directional { .. } | Light::Sun { .. })
    }

    pub fn is_positional(&self) -> bool {
        !self.is_directional()
    }

    pub fn intensity(&self) -> f32 {
        match *self {
            Light::Directional { intensity, .. } => intensity,
            Light::Sun { intensity, .. } => intensity,
            Light::Point { intensity, .. } => intensity,
            Light::Spot { intensity, .. } => intensity,
        }
    }

    pub fn color(&self) -> Vec3 {
        match *self {
            Light::Directional { color, .. } => color,
            Light::Sun { color, .. } => color,
            Light::Point { color, .. } => color,
            Light::Spot { color, .. } => color,
        }
    }
}

/// View-space shape of a positional light, as consumed by the froxelizer
/// (`spec.md` §4.1.3 inputs). Built by `LightSoa::prepare` from world-space
/// [`Light`]s and the camera's view matrix; directional lights never appear
/// here since they aren't froxelized.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewSpaceLight {
    pub position: Vec3,
    pub radius: f32,
    pub is_spot: bool,
    /// View-space cone axis; zero for point lights.
    pub axis: Vec3,
    pub cos_outer: f32,
    pub inv_sin_outer: f32,
}

impl ViewSpaceLight {
    pub fn point(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            radius,
            is_spot: false,
            axis: Vec3::ZERO,
            cos_outer: 0.0,
            inv_sin_outer: 0.0,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spot(
        position: Vec3,
        radius: f32,
        axis: Vec3,
        cos_outer: f32,
        inv_sin_outer: f32,
    ) -> Self {
        Self { position, radius, is_spot: true, axis, cos_outer, inv_sin_outer }
    }

    /// `z + radius < -z_light_far` quick-reject (`spec.md` §4.1.3 step 1).
    pub fn behind_far_plane(&self, z_light_far: f32) -> bool {
        self.position.z + self.radius < -z_light_far
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directional_and_sun_are_not_positional() {
        let d = Light::Directional { direction: Vec3::NEG_Y, color: Vec3::ONE, intensity: 1.0 };
        let s = Light::Sun {
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
            intensity: 1.0,
            angular_radius: 0.01,
            halo_size: 1.2,
            halo_falloff: 80.0,
        };
        assert!(d.is_directional() && !d.is_positional());
        assert!(s.is_directional() && !s.is_positional());
    }

    #[test]
    fn quick_reject_matches_spec_formula() {
        let light = ViewSpaceLight::point(Vec3::new(0.0, 0.0, 1.0), 1.0);
        assert!(light.behind_far_plane(100.0) == (1.0 + 1.0 < -100.0));
        let light = ViewSpaceLight::point(Vec3::new(0.0, 0.0, -150.0), 1.0);
        assert!(light.behind_far_plane(100.0));
    }
}

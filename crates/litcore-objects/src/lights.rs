//! `LightSoa` (`spec.md` §4.4.1/§4.4.2): directional lights occupy the first
//! rows, positional lights follow. Grounded on the same columnar pattern as
//! [`crate::soa::RenderableSoa`].

use litcore_lighting::{Light, ViewSpaceLight};
use litcore_math::Mat4;

#[derive(Default)]
pub struct LightSoa {
    rows: Vec<Light>,
    /// Number of leading rows that are directional (dominant sun first).
    directional_count: u32,
}

impl LightSoa {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the SoA from the current frame's light set (`spec.md` §4.4.2
    /// step 2): the highest-intensity directional becomes row 0, remaining
    /// directionals follow, then every positional light.
    pub fn prepare(&mut self, lights: &[Light]) {
        self.rows.clear();

        let mut directionals: Vec<&Light> =
            lights.iter().filter(|l| l.is_directional()).collect();
        directionals.sort_by(|a, b| b.intensity().partial_cmp(&a.intensity()).unwrap());
        self.directional_count = directionals.len() as u32;
        self.rows.extend(directionals.into_iter().cloned());

        self.rows.extend(lights.iter().filter(|l| l.is_positional()).cloned());
    }

    pub fn len(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn directional_count(&self) -> u32 {
        self.directional_count
    }

    pub fn dominant_directional(&self) -> Option<&Light> {
        self.rows.first().filter(|l| l.is_directional())
    }

    pub fn rows(&self) -> &[Light] {
        &self.rows
    }

    /// Positional rows transformed into view space, in SoA row order
    /// starting at index 0 — this is the light index the froxelizer's
    /// `LightBitset`/record buffer uses, so callers must add
    /// `directional_count` back when mapping to a `LightSoa` row.
    pub fn positional_view_space(&self, view: Mat4) -> Vec<ViewSpaceLight> {
        self.rows[self.directional_count as usize..]
            .iter()
            .map(|light| match *light {
                Light::Point { position, radius, .. } => {
                    ViewSpaceLight::point(view.transform_point3(position), radius)
                }
                Light::Spot { position, radius, axis, cos_outer, inv_sin_outer, .. } => {
                    ViewSpaceLight::spot(
                        view.transform_point3(position),
                        radius,
                        view.transform_vector3(axis).normalize(),
                        cos_outer,
                        inv_sin_outer,
                    )
                }
                Light::Directional { .. } | Light::Sun { .. } => {
                    unreachable!("directional lights precede the positional range")
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litcore_math::Vec3;

    #[test]
    fn dominant_directional_is_highest_intensity() {
        let mut soa = LightSoa::new();
        let lights = vec![
            Light::Directional { direction: Vec3::NEG_Y, color: Vec3::ONE, intensity: 2.0 },
            Light::Directional { direction: Vec3::NEG_Y, color: Vec3::ONE, intensity: 9.0 },
            Light::Point { position: Vec3::ZERO, radius: 1.0, color: Vec3::ONE, intensity: 5.0 },
        ];
        soa.prepare(&lights);
        assert_eq!(soa.directional_count(), 2);
        assert_eq!(soa.dominant_directional().unwrap().intensity(), 9.0);
        assert_eq!(soa.len(), 3);
    }

    #[test]
    fn positional_view_space_skips_directional_rows() {
        let mut soa = LightSoa::new();
        let lights = vec![
            Light::Directional { direction: Vec3::NEG_Y, color: Vec3::ONE, intensity: 2.0 },
            Light::Point { position: Vec3::new(0.0, 0.0, -5.0), radius: 1.0, color: Vec3::ONE, intensity: 5.0 },
        ];
        soa.prepare(&lights);
        let view_space = soa.positional_view_space(Mat4::IDENTITY);
        assert_eq!(view_space.len(), 1);
        assert!((view_space[0].position.z + 5.0).abs() < 1e-5);
    }
}

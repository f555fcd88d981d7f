//! Grid computation and per-frame light binning (`spec.md` §4.1), grounded on
//! `ard-render-camera::froxels` for the module boundary and on
//! `original_source/filament/src/Froxelizer.cpp` for the exact numerics.
//!
//! The per-thread-group fan-out (design note "bitset-per-thread fan-in") is
//! kept, but simplified: rather than packing 32-light columns of `u32` into
//! shared cache-line-sized rows and later un-interleaving them by bit
//! arithmetic (a micro-optimization for SIMD/cache locality in C++), each
//! `rayon` worker owns a private, full-width [`LightBitset`] per froxel and
//! the join step simply ORs the per-group bitsets together. Same "no
//! inter-thread sharing during the hot loop" guarantee, fewer moving parts.

use std::sync::atomic::{AtomicU32, Ordering};

use litcore_alloc::TypedArena;
use litcore_lighting::ViewSpaceLight;
use litcore_math::{Mat4, Vec2, Vec3, Vec4};
use rayon::prelude::*;

use crate::config::{FroxelConfig, RecordElementType, LIGHT_BITSET_WORDS};
use crate::intersections::{
    project_to_clip, sphere_cone_intersection_fast, sphere_plane_distance_squared,
    sphere_plane_intersection, unproject_to_view,
};
use crate::Viewport;

/// One froxel's light-list slice (`spec.md` §3.1). Bit-exact GPU layout:
/// little-endian `[offset:u16][point_count:u8][spot_count:u8]`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FroxelEntry {
    pub offset: u16,
    pub point_count: u8,
    pub spot_count: u8,
}

static_assertions::assert_eq_size!(FroxelEntry, u32);

/// Fixed-width per-froxel light membership set. Capped at
/// [`crate::config::MAX_LIGHT_COUNT`] bits — see `DESIGN.md` for why this
/// isn't a const-generic width.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct LightBitset([u64; LIGHT_BITSET_WORDS]);

impl LightBitset {
    #[inline]
    pub fn set(&mut self, index: usize) {
        self.0[index / 64] |= 1u64 << (index % 64);
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    #[inline]
    pub fn bitor_assign(&mut self, other: &Self) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a |= b;
        }
    }

    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(word, bits)| {
            (0..64).filter(move |bit| (bits >> bit) & 1 != 0).map(move |bit| word * 64 + bit)
        })
    }
}

/// The 6 bounding planes of a single froxel (`Froxelizer::getFroxelAt`);
/// test/debug-visualization accessor, not on the per-frame hot path.
#[derive(Debug, Copy, Clone)]
pub struct Froxel {
    pub planes: [Vec4; 6],
}

#[derive(Debug, Copy, Clone)]
pub struct FroxelUniforms {
    pub z_params: Vec4,
    pub f_params: [u32; 3],
    pub froxel_count_xy: Vec2,
}

pub struct FroxelizeOutput {
    pub froxels: Vec<FroxelEntry>,
    /// Raw light indices; caller packs down to `u8`/`u16` per
    /// `record_element_type` when writing the GPU record buffer (`spec.md`
    /// §6).
    pub records: Vec<u32>,
    pub record_element_type: RecordElementType,
}

/// Immutable snapshot of the fields the per-light hot loop needs, borrowed
/// directly from [`Froxelizer`]'s fields so the compiler can see it's
/// disjoint from the simultaneous `&mut` borrow of the scratch arena.
struct FroxelGeometry<'a> {
    planes_x: &'a [Vec4],
    planes_y: &'a [Vec4],
    distances_z: &'a [f32],
    bounding_spheres: &'a [Vec4],
    froxel_count_x: usize,
    froxel_count_y: usize,
    near: f32,
    z_light_far: f32,
    projection: Mat4,
    linearizer: f32,
    log2_z_light_far: f32,
    froxel_count_z: u16,
    clip_to_froxel_x: f32,
    clip_to_froxel_y: f32,
}

fn find_slice_z_raw(z: f32, froxel_count_z: u16, linearizer: f32, log2_z_light_far: f32) -> usize {
    let s = ((-z).log2() - log2_z_light_far) * linearizer + froxel_count_z as f32;
    let s = if z < 0.0 { s as i32 } else { 0 };
    s.clamp(0, froxel_count_z as i32 - 1) as usize
}

fn clip_to_indices_raw(
    clip: Vec2,
    clip_to_froxel_x: f32,
    clip_to_froxel_y: f32,
    froxel_count_x: u16,
    froxel_count_y: u16,
) -> (usize, usize) {
    let xi = ((clip.x * clip_to_froxel_x + clip_to_froxel_x) as i32)
        .clamp(0, froxel_count_x as i32 - 1);
    let yi = ((clip.y * clip_to_froxel_y + clip_to_froxel_y) as i32)
        .clamp(0, froxel_count_y as i32 - 1);
    (xi as usize, yi as usize)
}

impl FroxelGeometry<'_> {
    fn find_slice_z(&self, z: f32) -> usize {
        find_slice_z_raw(z, self.froxel_count_z, self.linearizer, self.log2_z_light_far)
    }

    fn clip_to_indices(&self, clip: Vec2) -> (usize, usize) {
        clip_to_indices_raw(
            clip,
            self.clip_to_froxel_x,
            self.clip_to_froxel_y,
            self.froxel_count_x as u16,
            self.froxel_count_y as u16,
        )
    }

    fn froxel_index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        ix + iy * self.froxel_count_x + iz * self.froxel_count_x * self.froxel_count_y
    }
}

/// Computes `(dimension, Nx, Ny, Nz)` for square, x-major froxels
/// (`spec.md` §4.1.2 step 1, Open Question 1 resolution).
fn compute_froxel_layout(config: &FroxelConfig, viewport: Viewport) -> (u32, u16, u16, u16) {
    let slice_count = config.slice_count;
    let plane_count = (config.froxel_buffer_max / slice_count as u32) as f32;
    let w = viewport.width as f32;
    let h = viewport.height as f32;

    let count_x = ((plane_count * w / h).sqrt() as u32).max(1);
    let count_y = ((plane_count * h / w).sqrt() as u32).max(1);
    let size_x = viewport.width.div_ceil(count_x);
    let size_y = viewport.height.div_ceil(count_y);
    let dimension = size_x.max(size_y).max(1);

    let count_x = viewport.width.div_ceil(dimension) as u16;
    let count_y = viewport.height.div_ceil(dimension) as u16;
    (dimension, count_x, count_y, slice_count)
}

pub struct Froxelizer {
    config: FroxelConfig,
    viewport: Viewport,
    projection: Mat4,
    near: f32,
    z_light_near: f32,
    z_light_far: f32,
    dirty: bool,

    froxel_count_x: u16,
    froxel_count_y: u16,
    froxel_count_z: u16,
    froxel_count: u32,
    froxel_dimension: u32,
    clip_to_froxel_x: f32,
    clip_to_froxel_y: f32,

    planes_x: Vec<Vec4>,
    planes_y: Vec<Vec4>,
    distances_z: Vec<f32>,
    bounding_spheres: Vec<Vec4>,

    linearizer: f32,
    log2_z_light_far: f32,
    z_params: Vec4,
    f_params: [u32; 3],

    scratch: TypedArena<LightBitset>,
    overflow_count: AtomicU32,
}

impl Froxelizer {
    pub fn new(config: FroxelConfig) -> Self {
        Self {
            config,
            viewport: Viewport { left: 0, bottom: 0, width: 1, height: 1 },
            projection: Mat4::IDENTITY,
            near: 0.1,
            z_light_near: 0.1,
            z_light_far: 100.0,
            dirty: true,
            froxel_count_x: 0,
            froxel_count_y: 0,
            froxel_count_z: 0,
            froxel_count: 0,
            froxel_dimension: 1,
            clip_to_froxel_x: 0.0,
            clip_to_froxel_y: 0.0,
            planes_x: Vec::new(),
            planes_y: Vec::new(),
            distances_z: Vec::new(),
            bounding_spheres: Vec::new(),
            linearizer: 1.0,
            log2_z_light_far: 0.0,
            z_params: Vec4::ZERO,
            f_params: [0; 3],
            scratch: TypedArena::new(),
            overflow_count: AtomicU32::new(0),
        }
    }

    pub fn config(&self) -> &FroxelConfig {
        &self.config
    }

    pub fn froxel_count(&self) -> u32 {
        self.froxel_count
    }

    pub fn froxel_counts(&self) -> (u16, u16, u16) {
        (self.froxel_count_x, self.froxel_count_y, self.froxel_count_z)
    }

    pub fn overflow_count(&self) -> u32 {
        self.overflow_count.load(Ordering::Relaxed)
    }

    pub fn set_light_range(&mut self, z_light_near: f32, z_light_far: f32) {
        if self.z_light_near != z_light_near || self.z_light_far != z_light_far {
            self.z_light_near = z_light_near;
            self.z_light_far = z_light_far;
            self.dirty = true;
        }
    }

    /// Rebuilds grid geometry if the viewport or projection changed since
    /// the last call. Returns whether the per-view uniforms need updating.
    pub fn prepare(&mut self, viewport: Viewport, projection: Mat4, near: f32) -> bool {
        let mut changed = false;
        if self.viewport != viewport {
            self.viewport = viewport;
            changed = true;
        }
        if self.projection != projection || self.near != near {
            self.projection = projection;
            self.near = near;
            changed = true;
        }
        if !changed && !self.dirty {
            return false;
        }
        self.dirty = false;
        debug_assert!(
            self.z_light_near >= self.near,
            "z_light_near must be at least the camera's near plane"
        );
        self.rebuild_layout();
        self.rebuild_planes();
        true
    }

    fn rebuild_layout(&mut self) {
        let (dimension, nx, ny, nz) = compute_froxel_layout(&self.config, self.viewport);
        log::trace!(
            "froxel layout: {}x{} viewport / {dimension}px -> {nx}x{ny}x{nz}",
            self.viewport.width,
            self.viewport.height
        );

        self.froxel_dimension = dimension;
        self.clip_to_froxel_x = (0.5 * self.viewport.width as f32) / dimension as f32;
        self.clip_to_froxel_y = (0.5 * self.viewport.height as f32) / dimension as f32;
        self.froxel_count_x = nx;
        self.froxel_count_y = ny;
        self.froxel_count_z = nz;
        self.froxel_count = nx as u32 * ny as u32 * nz as u32;

        self.distances_z = vec![0.0; nz as usize + 1];
        let linearizer = (self.z_light_far / self.z_light_near).log2() / (nz as f32 - 1.0);
        for i in 1..=nz as usize {
            self.distances_z[i] = self.z_light_far * ((i as f32 - nz as f32) * linearizer).exp2();
        }
        self.linearizer = 1.0 / linearizer;
        self.log2_z_light_far = self.z_light_far.log2();

        self.planes_x = vec![Vec4::ZERO; nx as usize + 1];
        self.planes_y = vec![Vec4::ZERO; ny as usize + 1];
        self.bounding_spheres = vec![Vec4::ZERO; self.froxel_count as usize];
    }

    fn rebuild_planes(&mut self) {
        let inv_projection = self.projection.inverse();
        let froxel_width_clip = (2.0 * self.froxel_dimension as f32) / self.viewport.width as f32;
        let froxel_height_clip =
            (2.0 * self.froxel_dimension as f32) / self.viewport.height as f32;

        for i in 0..=self.froxel_count_x as usize {
            let x = (i as f32 * froxel_width_clip) - 1.0;
            let p0 = unproject_to_view(inv_projection, Vec4::new(x, -1.0, -1.0, 1.0));
            let p1 = unproject_to_view(inv_projection, Vec4::new(x, 1.0, -1.0, 1.0));
            self.planes_x[i] = p1.cross(p0).normalize().extend(0.0);
        }
        for i in 0..=self.froxel_count_y as usize {
            let y = (i as f32 * froxel_height_clip) - 1.0;
            let p0 = unproject_to_view(inv_projection, Vec4::new(-1.0, y, -1.0, 1.0));
            let p1 = unproject_to_view(inv_projection, Vec4::new(1.0, y, -1.0, 1.0));
            self.planes_y[i] = p1.cross(p0).normalize().extend(0.0);
        }

        let nx = self.froxel_count_x as usize;
        let ny = self.froxel_count_y as usize;
        let nz = self.froxel_count_z as usize;
        // Exploits the X/Y plane separability named in `spec.md` §4.1.2
        // step 4: computed once per Z slice, reused across every Y strip.
        let mut min_max_x = vec![(0.0f32, 0.0f32); nx];

        for iz in 0..nz {
            let near_plane = Vec4::new(0.0, 0.0, 1.0, self.distances_z[iz]);
            let far_plane = Vec4::new(0.0, 0.0, -1.0, -self.distances_z[iz + 1]);
            let min_z = -self.distances_z[iz + 1];
            let max_z = -self.distances_z[iz];

            for ix in 0..nx {
                let sides = [self.planes_x[ix], -self.planes_x[ix + 1]];
                let caps = [near_plane, far_plane];
                let mut min_x = f32::MAX;
                let mut max_x = f32::MIN;
                for c in 0..4 {
                    let side = sides[c & 1];
                    let cap = caps[c >> 1];
                    let px = (cap.z * cap.w * side.z) / side.x;
                    min_x = min_x.min(px);
                    max_x = max_x.max(px);
                }
                min_max_x[ix] = (min_x, max_x);
            }

            for iy in 0..ny {
                let sides = [self.planes_y[iy], -self.planes_y[iy + 1]];
                let caps = [near_plane, far_plane];
                let mut min_y = f32::MAX;
                let mut max_y = f32::MIN;
                for c in 0..4 {
                    let side = sides[c & 1];
                    let cap = caps[c >> 1];
                    let py = (cap.z * cap.w * side.z) / side.y;
                    min_y = min_y.min(py);
                    max_y = max_y.max(py);
                }

                for ix in 0..nx {
                    let (min_x, max_x) = min_max_x[ix];
                    let min = Vec3::new(min_x, min_y, min_z);
                    let max = Vec3::new(max_x, max_y, max_z);
                    let fi = ix + iy * nx + iz * nx * ny;
                    let center = (max + min) * 0.5;
                    let radius = ((max - min) * 0.5).length();
                    self.bounding_spheres[fi] = center.extend(radius);
                }
            }
        }

        // z_params perspective/orthographic branch, mirroring the source's
        // `update()`. Column-major: col(2).z == projection[2][2], etc.
        let col2 = self.projection.z_axis;
        let col3 = self.projection.w_axis;
        let pz = col2.z;
        let pw = col3.z;
        self.z_params = Vec4::new(0.0, 0.0, -self.linearizer, self.froxel_count_z as f32);
        if col2.w != 0.0 {
            self.z_params.x = 2.0 * self.z_light_far / pw;
            self.z_params.y = self.z_light_far * (pz - 1.0) / pw;
        } else {
            self.z_params.x = -2.0 / (pz * self.z_light_far);
            self.z_params.y = (1.0 + pw) / (pz * self.z_light_far);
            self.z_params.z = self.linearizer;
        }
        self.f_params = [1, self.froxel_count_x as u32, self.froxel_count_x as u32 * self.froxel_count_y as u32];
    }

    pub fn froxel_at(&self, x: usize, y: usize, z: usize) -> Froxel {
        Froxel {
            planes: [
                self.planes_x[x],
                -self.planes_x[x + 1],
                self.planes_y[y],
                -self.planes_y[y + 1],
                Vec4::new(0.0, 0.0, 1.0, self.distances_z[z]),
                -Vec4::new(0.0, 0.0, 1.0, self.distances_z[z + 1]),
            ],
        }
    }

    pub fn find_slice_z(&self, view_z: f32) -> usize {
        find_slice_z_raw(view_z, self.froxel_count_z, self.linearizer, self.log2_z_light_far)
    }

    pub fn clip_to_indices(&self, clip: Vec2) -> (usize, usize) {
        clip_to_indices_raw(
            clip,
            self.clip_to_froxel_x,
            self.clip_to_froxel_y,
            self.froxel_count_x,
            self.froxel_count_y,
        )
    }

    pub fn update_uniforms(&self) -> FroxelUniforms {
        FroxelUniforms {
            z_params: self.z_params,
            f_params: self.f_params,
            froxel_count_xy: Vec2::new(self.viewport.width as f32, self.viewport.height as f32)
                / self.froxel_dimension as f32,
        }
    }

    /// Per-frame light froxelization (`spec.md` §4.1.3/§4.1.4). `lights`
    /// must already be in view space (see [`litcore_lighting::ViewSpaceLight`]).
    pub fn froxelize(&mut self, lights: &[ViewSpaceLight]) -> FroxelizeOutput {
        let froxel_count = self.froxel_count as usize;
        let group_count = self.config.group_count().min(lights.len().max(1));
        let group_count = group_count.max(1);

        self.scratch.reset();
        let scratch = self.scratch.alloc(group_count * froxel_count);
        let mut groups: Vec<&mut [LightBitset]> = scratch.chunks_mut(froxel_count).collect();

        let geom = FroxelGeometry {
            planes_x: &self.planes_x,
            planes_y: &self.planes_y,
            distances_z: &self.distances_z,
            bounding_spheres: &self.bounding_spheres,
            froxel_count_x: self.froxel_count_x as usize,
            froxel_count_y: self.froxel_count_y as usize,
            near: self.near,
            z_light_far: self.z_light_far,
            projection: self.projection,
            linearizer: self.linearizer,
            log2_z_light_far: self.log2_z_light_far,
            froxel_count_z: self.froxel_count_z,
            clip_to_froxel_x: self.clip_to_froxel_x,
            clip_to_froxel_y: self.clip_to_froxel_y,
        };

        groups.par_iter_mut().enumerate().for_each(|(group, buffer)| {
            let buffer: &mut [LightBitset] = buffer;
            let mut i = group;
            while i < lights.len() {
                froxelize_single_light(&geom, buffer, i, &lights[i]);
                i += group_count;
            }
        });

        let mut final_bits = vec![LightBitset::default(); froxel_count];
        for group in &groups {
            for (i, bits) in group.iter().enumerate() {
                final_bits[i].bitor_assign(bits);
            }
        }

        let is_spot: Vec<bool> = lights.iter().map(|l| l.is_spot).collect();
        self.compress(&final_bits, &is_spot)
    }

    fn compress(&mut self, final_bits: &[LightBitset], is_spot: &[bool]) -> FroxelizeOutput {
        let froxel_count = final_bits.len();
        let nx = self.froxel_count_x as usize;
        let capacity = self.config.record_buffer_capacity;

        let mut froxels = vec![FroxelEntry::default(); froxel_count];
        let mut records: Vec<u32> = Vec::new();
        let mut offset: u32 = 0;
        let mut i = 0usize;

        while i < froxel_count {
            let mut bits = final_bits[i];
            if bits.is_none() {
                froxels[i] = FroxelEntry::default();
                i += 1;
                continue;
            }

            let mut points = Vec::new();
            let mut spots = Vec::new();
            for l in bits.iter_ones() {
                if is_spot[l] {
                    spots.push(l as u32);
                } else {
                    points.push(l as u32);
                }
            }
            let point_count = points.len().min(255) as u8;
            let spot_count = spots.len().min(255) as u8;
            let light_count = point_count as u32 + spot_count as u32;

            if offset + light_count >= capacity {
                self.overflow_count.fetch_add(1, Ordering::Relaxed);
                log::warn!("froxel record buffer exhausted at froxel {i}/{froxel_count}");
                while i < froxel_count {
                    froxels[i] = FroxelEntry::default();
                    i += 1;
                }
                break;
            }

            let mut entry = FroxelEntry { offset: offset as u16, point_count, spot_count };
            records.extend(points.into_iter().take(255));
            records.extend(spots.into_iter().take(255));
            offset += light_count;

            loop {
                froxels[i] = entry;
                i += 1;
                if i >= froxel_count {
                    break;
                }
                if final_bits[i] != bits && i >= nx {
                    bits = final_bits[i - nx];
                    entry = froxels[i - nx];
                }
                if final_bits[i] != bits {
                    break;
                }
            }
        }

        FroxelizeOutput { froxels, records, record_element_type: self.config.record_element_type() }
    }
}

#[allow(clippy::needless_range_loop)]
fn froxelize_single_light(
    geom: &FroxelGeometry,
    buffer: &mut [LightBitset],
    light_index: usize,
    light: &ViewSpaceLight,
) {
    if light.behind_far_plane(geom.z_light_far) {
        return;
    }

    let s = light.position.extend(light.radius * light.radius);

    let half = Vec3::splat(light.radius);
    let z_near = (-geom.near).min(light.position.z + half.z);
    let z_far = light.position.z - half.z;

    let mut left_near = project_to_clip(
        geom.projection,
        Vec3::new(light.position.x - half.x, light.position.y - half.y, z_near),
    );
    let mut left_far = project_to_clip(
        geom.projection,
        Vec3::new(light.position.x - half.x, light.position.y - half.y, z_far),
    );
    let mut right_near = project_to_clip(
        geom.projection,
        Vec3::new(light.position.x + half.x, light.position.y + half.y, z_near),
    );
    let mut right_far = project_to_clip(
        geom.projection,
        Vec3::new(light.position.x + half.x, light.position.y + half.y, z_far),
    );

    if left_near.x > right_near.x {
        std::mem::swap(&mut left_near.x, &mut right_near.x);
    }
    if left_near.y > right_near.y {
        std::mem::swap(&mut left_near.y, &mut right_near.y);
    }
    if left_far.x > right_far.x {
        std::mem::swap(&mut left_far.x, &mut right_far.x);
    }
    if left_far.y > right_far.y {
        std::mem::swap(&mut left_far.y, &mut right_far.y);
    }

    let (x0, y0) = geom.clip_to_indices(left_near.min(left_far));
    let z0 = geom.find_slice_z(z_near);
    let (x1_center, y1) = geom.clip_to_indices(right_near.max(right_far));
    let x1 = x1_center + 1;
    let z1 = geom.find_slice_z(z_far);
    let zcenter = geom.find_slice_z(s.z);

    for iz in z0..=z1 {
        let cz = if iz != zcenter {
            let d = if iz < zcenter { geom.distances_z[iz + 1] } else { geom.distances_z[iz] };
            sphere_plane_intersection(s, Vec3::Z, d)
        } else {
            s
        };

        let clip = project_to_clip(geom.projection, cz.truncate());
        let (xcenter, ycenter) = geom.clip_to_indices(clip);

        if cz.w <= 0.0 {
            continue;
        }

        for iy in y0..=y1 {
            let cy = if iy != ycenter {
                let plane = if iy < ycenter { geom.planes_y[iy + 1] } else { geom.planes_y[iy] };
                sphere_plane_intersection(cz, Vec3::new(0.0, plane.y, plane.z), 0.0)
            } else {
                cz
            };

            if cy.w <= 0.0 {
                continue;
            }

            let mut bx = x0;
            while bx <= xcenter {
                let plane = geom.planes_x[bx];
                if sphere_plane_distance_squared(cy, plane.x, plane.z) > 0.0 {
                    break;
                }
                bx += 1;
            }

            let mut ex = x1;
            loop {
                ex -= 1;
                if ex <= xcenter {
                    break;
                }
                let plane = geom.planes_x[ex];
                if sphere_plane_distance_squared(cy, plane.x, plane.z) > 0.0 {
                    break;
                }
            }
            ex += 1;

            if bx >= ex {
                continue;
            }

            if light.is_spot {
                for ix in bx..ex {
                    let fi = geom.froxel_index(ix, iy, iz);
                    if sphere_cone_intersection_fast(
                        geom.bounding_spheres[fi],
                        light.position,
                        light.axis,
                        light.inv_sin_outer,
                        light.cos_outer * light.cos_outer,
                    ) {
                        buffer[fi].set(light_index);
                    }
                }
            } else {
                for ix in bx..ex {
                    let fi = geom.froxel_index(ix, iy, iz);
                    buffer[fi].set(light_index);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litcore_math::Mat4;

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh(fov_y, aspect, near, far)
    }

    fn make_froxelizer(width: u32, height: u32) -> Froxelizer {
        let mut f = Froxelizer::new(FroxelConfig::default());
        f.set_light_range(0.1, 100.0);
        let viewport = Viewport { left: 0, bottom: 0, width, height };
        let aspect = width as f32 / height as f32;
        let fov_y = 2.0 * ((45f32.to_radians()).tan() / aspect).atan();
        let projection = perspective(fov_y, aspect, 0.1, 100.0);
        f.prepare(viewport, projection, 0.1);
        f
    }

    #[test]
    fn grid_has_expected_slice_count() {
        let f = make_froxelizer(1280, 640);
        let (_, _, nz) = f.froxel_counts();
        assert_eq!(nz, FroxelConfig::default().slice_count);
    }

    #[test]
    fn light_far_behind_camera_produces_no_entries() {
        let mut f = make_froxelizer(512, 512);
        let lights = vec![ViewSpaceLight::point(Vec3::new(0.0, 0.0, 1.0), 1.0)];
        let out = f.froxelize(&lights);
        assert!(out.froxels.iter().all(|e| e.point_count == 0 && e.spot_count == 0));
    }

    #[test]
    fn single_point_light_lights_at_least_one_froxel() {
        let mut f = make_froxelizer(1280, 640);
        let lights = vec![ViewSpaceLight::point(Vec3::new(0.0, 0.0, -5.0), 1.0)];
        let out = f.froxelize(&lights);
        let total: u32 = out.froxels.iter().map(|e| e.point_count as u32 + e.spot_count as u32).sum();
        assert!(total > 0);
        assert!(out.froxels.iter().all(|e| e.point_count as u32 + e.spot_count as u32 <= 1));
    }

    #[test]
    fn entries_never_exceed_record_capacity() {
        let mut f = make_froxelizer(1280, 640);
        let mut rng_state: u32 = 12345;
        let mut next = move || {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 17;
            rng_state ^= rng_state << 5;
            rng_state
        };
        let lights: Vec<ViewSpaceLight> = (0..256)
            .map(|_| {
                let x = (next() % 2000) as f32 / 100.0 - 10.0;
                let y = (next() % 2000) as f32 / 100.0 - 10.0;
                let z = -((next() % 9000) as f32 / 100.0 + 1.0);
                ViewSpaceLight::point(Vec3::new(x, y, z), 2.0)
            })
            .collect();
        let out = f.froxelize(&lights);
        let total: u32 = out.records.len() as u32;
        assert!(total <= f.config().record_buffer_capacity);
        for entry in &out.froxels {
            assert!(entry.offset as u32 + entry.point_count as u32 + entry.spot_count as u32
                <= f.config().record_buffer_capacity);
        }
    }

    #[test]
    fn clip_to_indices_round_trips_froxel_centers() {
        let f = make_froxelizer(1280, 640);
        let (nx, ny, _) = f.froxel_counts();
        for j in 0..ny {
            for i in 0..nx {
                let cx = ((i as f32 + 0.5) / nx as f32) * 2.0 - 1.0;
                let cy = ((j as f32 + 0.5) / ny as f32) * 2.0 - 1.0;
                let (xi, yi) = f.clip_to_indices(Vec2::new(cx, cy));
                assert_eq!((xi as u16, yi as u16), (i, j));
            }
        }
    }
}

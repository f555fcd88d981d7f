//! `RenderPass` command generation, sorting and execution (`spec.md`
//! §4.2.2/§4.2.5), grounded on `ard-render-renderers::bins::DrawBins` for
//! the overall shape (generate into per-tile regions, sort, walk) and on
//! `original_source/filament/src/RenderPass.cpp` for the exact per-command
//! math (signed distance, winding flip, two-sided transparency).

use litcore_backend::types::{DrawCall, DrawPrimitive};
use litcore_backend::{BackendError, BufferHandle, CommandStreamBackend, PipelineHandle};
use litcore_base::{IndexRange, ResourceId};
use litcore_camera::CameraInfo;
use litcore_objects::RenderableSoa;

use crate::command::{Command, Culling, DepthFunc, MaterialInfo, PrimitiveInfo, RasterState, TransparencyMode};
use crate::key::{Pass, SortKey, SENTINEL_KEY};

/// Looks up the out-of-scope material system's per-instance data; returns
/// `None` if the instance has been destroyed/is not yet ready, in which
/// case the primitive is skipped (`spec.md` §4.2.7: "empty primitives are
/// tagged with the sentinel... to be dropped").
pub trait MaterialLookup {
    fn lookup(&self, material_instance: ResourceId) -> Option<(MaterialInfo, PipelineHandle)>;
}

impl<F> MaterialLookup for F
where
    F: Fn(ResourceId) -> Option<(MaterialInfo, PipelineHandle)>,
{
    fn lookup(&self, material_instance: ResourceId) -> Option<(MaterialInfo, PipelineHandle)> {
        self(material_instance)
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct PassOptions {
    pub emit_color: bool,
    pub emit_depth: bool,
    /// `spec.md` §4.2.2 step 4: a depth pass normally skips blended
    /// primitives, unless this pass is a shadow pass and the primitive
    /// casts shadows (`DEPTH_CONTAINS_SHADOW_CASTERS` in the source).
    pub shadow_pass: bool,
    pub view_inverse_front_faces: bool,
}

pub struct RenderPass {
    commands: Vec<Command>,
    valid_len: usize,
}

impl RenderPass {
    pub fn new() -> Self {
        Self { commands: Vec::new(), valid_len: 0 }
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.valid_len = 0;
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands[..self.valid_len]
    }

    /// `spec.md` §4.2.2: generates commands for every primitive of every
    /// renderable in `range`. May be called once per job tile
    /// (`spec.md` §4.2.6 "job tiles of <=256 renderables"); tiles append to
    /// disjoint logical ranges of the conceptual output but here simply
    /// push onto a shared `Vec` — single-threaded generation is adequate at
    /// this crate's scale and avoids a prefix-sum bookkeeping layer the
    /// spec treats as an implementation detail of the fan-out, not of the
    /// key/command semantics this crate owns.
    pub fn append_commands(
        &mut self,
        range: IndexRange,
        soa: &RenderableSoa,
        camera: &CameraInfo,
        options: PassOptions,
        materials: &impl MaterialLookup,
    ) {
        let camera_pos = camera.world_transform.w_axis.truncate();
        let forward = -camera.world_transform.z_axis.truncate().normalize();

        for i in range.start..range.end {
            let center = soa.world_aabb(i).center();
            let d = (center - camera_pos).dot(forward);
            let distance_bits = (-d).to_bits();
            let winding_flip = options.view_inverse_front_faces ^ soa.reversed_winding(i);
            let priority = soa.priority(i);
            let casts_shadows = soa.cast_shadows(i);

            for (prim_idx, prim) in soa.primitives(i).iter().enumerate() {
                let Some((material, pipeline)) = materials.lookup(prim.material_instance) else {
                    continue;
                };

                let base_raster = RasterState {
                    culling: if winding_flip { Culling::Front } else { Culling::Back },
                    depth_write: true,
                    color_write: true,
                    depth_func: DepthFunc::Less,
                };
                let info = |raster: RasterState| PrimitiveInfo {
                    renderable_index: i,
                    primitive_index: prim_idx as u16,
                    material_instance: prim.material_instance,
                    pipeline,
                    vertex_buffer: prim.vertex_buffer,
                    index_buffer: prim.index_buffer,
                    index_offset: prim.index_offset,
                    index_count: prim.index_count,
                    raster,
                };

                if options.emit_color {
                    if material.is_blended {
                        self.emit_blended(priority, prim.blend_order, distance_bits, material, base_raster, info);
                    } else {
                        let z_bucket = (distance_bits >> 22) as u16;
                        let key = SortKey::color(priority, z_bucket, material.variant, material.material_id);
                        self.commands.push(Command { key, primitive: info(base_raster) });
                    }
                }

                if options.emit_depth {
                    let skip_blended = material.is_blended
                        && !(options.shadow_pass && casts_shadows);
                    if skip_blended || material.alpha_to_coverage && !(options.shadow_pass && casts_shadows) {
                        continue;
                    }
                    let key = SortKey::depth(priority, material.variant, material.material_id, distance_bits);
                    let raster = RasterState { color_write: false, ..base_raster };
                    self.commands.push(Command { key, primitive: info(raster) });
                }
            }
        }
    }

    fn emit_blended(
        &mut self,
        priority: u8,
        blend_order: u16,
        distance_bits: u32,
        material: MaterialInfo,
        base_raster: RasterState,
        info: impl Fn(RasterState) -> PrimitiveInfo,
    ) {
        // Back-to-front: invert the front-to-back distance encoding.
        let blend_distance = !distance_bits;
        match material.transparency_mode {
            TransparencyMode::Default => {
                let key = SortKey::blended(priority, blend_order, blend_distance, false);
                self.commands.push(Command { key, primitive: info(base_raster) });
            }
            TransparencyMode::TwoPassesTwoSides => {
                let key_a = SortKey::blended(priority, blend_order, blend_distance, false);
                let raster_a = RasterState { culling: Culling::Front, ..base_raster };
                self.commands.push(Command { key: key_a, primitive: info(raster_a) });

                let key_b = SortKey::blended(priority, blend_order, blend_distance, true);
                let raster_b = RasterState { culling: Culling::Back, ..base_raster };
                self.commands.push(Command { key: key_b, primitive: info(raster_b) });
            }
            TransparencyMode::TwoPassesOneSide => {
                let key_a = SortKey::blended(priority, blend_order, blend_distance, false);
                let raster_a = RasterState {
                    depth_write: true,
                    color_write: false,
                    depth_func: DepthFunc::LessEqual,
                    ..base_raster
                };
                self.commands.push(Command { key: key_a, primitive: info(raster_a) });

                let key_b = SortKey::blended(priority, blend_order, blend_distance, true);
                self.commands.push(Command { key: key_b, primitive: info(base_raster) });
            }
        }
    }

    /// `spec.md` §4.2.2 steps 5-6: appends the sentinel, sorts ascending,
    /// truncates at the first sentinel.
    pub fn finish(&mut self) {
        self.commands.push(Command {
            key: SENTINEL_KEY,
            primitive: PrimitiveInfo {
                renderable_index: u32::MAX,
                primitive_index: 0,
                material_instance: ResourceId::from(0usize),
                pipeline: PipelineHandle::INVALID,
                vertex_buffer: BufferHandle::INVALID,
                index_buffer: BufferHandle::INVALID,
                index_offset: 0,
                index_count: 0,
                raster: RasterState::default(),
            },
        });
        self.commands.sort_unstable_by_key(|c| c.key);
        self.valid_len = self.commands.partition_point(|c| c.key.pass() != Pass::Sentinel);
    }

    /// `spec.md` §4.2.5: walks the sorted, truncated range, re-binding only
    /// when the material instance changes, then issues the draw.
    pub fn execute(
        &self,
        backend: &mut impl CommandStreamBackend,
        target: litcore_backend::RenderTargetHandle,
        renderable_ubo: BufferHandle,
        renderable_ubo_stride: usize,
    ) -> Result<(), BackendError> {
        let mut last_material: Option<ResourceId> = None;
        for command in self.commands() {
            let p = &command.primitive;
            if last_material != Some(p.material_instance) {
                log::trace!("render pass: material change -> {:?}", p.material_instance);
                last_material = Some(p.material_instance);
            }

            backend.bind_uniform_buffer_range(
                0,
                renderable_ubo,
                p.renderable_index as usize * renderable_ubo_stride,
                renderable_ubo_stride,
            );

            backend.draw(DrawCall {
                pipeline: p.pipeline,
                target,
                primitive: DrawPrimitive {
                    vertex_buffer: p.vertex_buffer,
                    index_buffer: p.index_buffer,
                    index_offset: p.index_offset,
                    index_count: p.index_count,
                },
                raster: p.raster,
            });
        }
        Ok(())
    }
}

impl Default for RenderPass {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litcore_math::{Mat4, Vec3};
    use litcore_objects::{Aabb, Primitive, Renderable};
    use smallvec::SmallVec;

    fn camera() -> CameraInfo {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
        CameraInfo::new(view, proj, 0.1, 100.0, 0.0)
    }

    fn make_soa(n: usize) -> RenderableSoa {
        let renderables: Vec<Renderable> = (0..n)
            .map(|i| Renderable {
                local_aabb: Aabb { min: Vec3::new(-0.5, -0.5, -0.5), max: Vec3::new(0.5, 0.5, 0.5) },
                transform: Mat4::from_translation(Vec3::new(0.0, 0.0, -(i as f32) * 2.0)),
                layer_mask: 1,
                channels: 0,
                priority: 0,
                cast_shadows: false,
                receive_shadows: true,
                culling: true,
                primitives: SmallVec::from_vec(vec![Primitive {
                    vertex_buffer: BufferHandle::from_raw(1),
                    index_buffer: BufferHandle::from_raw(2),
                    index_offset: 0,
                    index_count: 3,
                    material_instance: ResourceId::from(0usize),
                    blend_order: 0,
                }]),
            })
            .collect();
        let mut soa = RenderableSoa::new();
        soa.prepare(&renderables);
        soa
    }

    fn opaque_material(_: ResourceId) -> Option<(MaterialInfo, PipelineHandle)> {
        Some((
            MaterialInfo {
                material_id: 1,
                variant: 0,
                is_blended: false,
                transparency_mode: TransparencyMode::Default,
                alpha_to_coverage: false,
            },
            PipelineHandle::from_raw(1),
        ))
    }

    #[test]
    fn sorted_commands_never_decrease() {
        let soa = make_soa(10);
        let camera = camera();
        let mut pass = RenderPass::new();
        pass.append_commands(
            0..soa.len(),
            &soa,
            &camera,
            PassOptions { emit_color: true, emit_depth: true, ..Default::default() },
            &opaque_material,
        );
        pass.finish();
        let keys: Vec<u64> = pass.commands().iter().map(|c| c.key.raw()).collect();
        for w in keys.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn sentinel_commands_are_excluded_from_valid_range() {
        let soa = make_soa(3);
        let camera = camera();
        let mut pass = RenderPass::new();
        pass.append_commands(
            0..soa.len(),
            &soa,
            &camera,
            PassOptions { emit_color: true, ..Default::default() },
            &opaque_material,
        );
        pass.finish();
        assert!(pass.commands().iter().all(|c| c.key.pass() != Pass::Sentinel));
    }
}

//! `View`, the per-view coordinator driving the pipeline in §5's stated
//! order (light prep -> froxelize; renderable cull || light cull; commit
//! before draw), grounded on `ard-render-camera`'s view-owns-its-pipeline
//! shape and generalized here into a single struct since this core has no
//! ECS of its own to dispatch from.

use litcore_base::{JobErrors, PrepareError};
use litcore_camera::{CameraInfo, Froxelizer, PerViewUib, Viewport};
use litcore_lighting::Light;
use litcore_math::Vec4;
use litcore_objects::{Frustum, LightSoa, PerRenderableUib, RenderableSoa, Renderable};
use litcore_renderers::{MaterialLookup, PassOptions, RenderPass};
use litcore_textures::ResourceCache;
use rayon::prelude::*;

use crate::pid::{DynamicResolutionConfig, DynamicResolutionController};
use crate::skipper::FrameSkipper;

pub struct ViewConfig {
    pub froxel: litcore_camera::FroxelConfig,
    pub cache: litcore_textures::CacheConfig,
    pub dynamic_resolution: DynamicResolutionConfig,
    pub max_frame_latency: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            froxel: Default::default(),
            cache: Default::default(),
            dynamic_resolution: Default::default(),
            max_frame_latency: 2,
        }
    }
}

/// Owns everything needed to prepare and draw one frame of one view:
/// froxelizer grid state, the visibility SoAs, the resource cache, frame
/// pacing and dynamic resolution.
pub struct View {
    froxelizer: Froxelizer,
    renderable_soa: RenderableSoa,
    light_soa: LightSoa,
    color_pass: RenderPass,
    depth_pass: RenderPass,
    cache: ResourceCache,
    skipper: FrameSkipper,
    resolution: DynamicResolutionController,
}

pub struct FrameInputs<'a> {
    pub viewport: Viewport,
    pub camera: CameraInfo,
    pub renderables: &'a [Renderable],
    pub lights: &'a [Light],
}

pub struct FrameOutputs {
    pub visible_count: u32,
    pub froxel_overflow: u32,
    pub scale: f32,
    /// One entry per row of `ranges.visible`, in the same order `color_pass`
    /// and `depth_pass` address by `renderable_index`; the caller uploads
    /// this into the buffer it passes to [`View::execute_frame`] as
    /// `renderable_ubo` before issuing either pass.
    pub renderable_uniforms: Vec<PerRenderableUib>,
}

impl View {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            froxelizer: Froxelizer::new(config.froxel),
            renderable_soa: RenderableSoa::new(),
            light_soa: LightSoa::new(),
            color_pass: RenderPass::new(),
            depth_pass: RenderPass::new(),
            cache: ResourceCache::new(config.cache),
            skipper: FrameSkipper::new(config.max_frame_latency),
            resolution: DynamicResolutionController::new(config.dynamic_resolution),
        }
    }

    pub fn cache_mut(&mut self) -> &mut ResourceCache {
        &mut self.cache
    }

    pub fn resolution(&self) -> &DynamicResolutionController {
        &self.resolution
    }

    /// Runs one frame of preparation and command generation (`spec.md` §5's
    /// ordering guarantees): light prep precedes froxelization; renderable
    /// culling and light culling run in parallel; commands are only
    /// generated after both finish.
    ///
    /// Returns `None` if [`FrameSkipper`] determined this frame should be
    /// dropped.
    pub fn prepare_frame(
        &mut self,
        inputs: FrameInputs,
        backend: &impl litcore_backend::CommandStreamBackend,
        materials: &impl MaterialLookup,
        last_frame_time_ms: f32,
        dt_seconds: f32,
    ) -> Result<Option<FrameOutputs>, PrepareError> {
        if inputs.viewport.width == 0 || inputs.viewport.height == 0 {
            return Err(PrepareError::InvalidViewport {
                width: inputs.viewport.width,
                height: inputs.viewport.height,
            });
        }

        if !self.skipper.begin_frame(backend) {
            return Ok(None);
        }

        let scale = self.resolution.update(dt_seconds, last_frame_time_ms);

        // Worker errors are recorded here rather than returned directly from
        // the closures below, matching spec §7's "thread-local slot joined
        // by the parent wait" propagation policy; the first one recorded
        // wins once both jobs finish.
        let errors = JobErrors::<PrepareError>::new();
        let (ranges, view_space_lights) = rayon::join(
            || {
                self.renderable_soa.prepare(inputs.renderables);
                let frustum = Frustum::from_view_projection(inputs.camera.view_projection());
                self.renderable_soa.cull(&frustum);
                let ranges = self.renderable_soa.partition(|_| false);
                for i in ranges.visible.start..ranges.visible.end {
                    let aabb = self.renderable_soa.world_aabb(i);
                    if !aabb.min.is_finite() || !aabb.max.is_finite() {
                        errors.record(PrepareError::InvariantViolation(
                            "non-finite world AABB after culling",
                        ));
                        break;
                    }
                }
                ranges
            },
            || {
                self.light_soa.prepare(inputs.lights);
                let lights = self.light_soa.positional_view_space(inputs.camera.view);
                if lights.iter().any(|l| !l.position.is_finite()) {
                    errors.record(PrepareError::InvariantViolation(
                        "non-finite view-space light position",
                    ));
                }
                lights
            },
        );
        if let Some(err) = errors.take() {
            return Err(err);
        }

        self.froxelizer.prepare(inputs.viewport, inputs.camera.projection, inputs.camera.z_near);
        let froxel_output = self.froxelizer.froxelize(&view_space_lights);
        let _ = froxel_output; // consumed by the backend upload path (out of scope here)

        self.color_pass.clear();
        self.depth_pass.clear();
        self.color_pass.append_commands(
            ranges.visible.into(),
            &self.renderable_soa,
            &inputs.camera,
            PassOptions { emit_color: true, ..Default::default() },
            materials,
        );
        self.depth_pass.append_commands(
            ranges.visible.into(),
            &self.renderable_soa,
            &inputs.camera,
            PassOptions { emit_depth: true, ..Default::default() },
            materials,
        );
        self.color_pass.finish();
        self.depth_pass.finish();

        let renderable_uniforms = self.renderable_soa.renderable_uniforms(ranges.visible.into());

        Ok(Some(FrameOutputs {
            visible_count: ranges.visible.end - ranges.visible.start,
            froxel_overflow: self.froxelizer.overflow_count(),
            scale,
            renderable_uniforms,
        }))
    }

    /// Builds this frame's per-view uniform block (`spec.md` §6). Call
    /// after [`View::prepare_frame`] so the froxel grid it reads from has
    /// already been recomputed for the current viewport/projection.
    /// `time_fraction` and `user_time` are supplied by the caller since
    /// this core has no engine clock of its own.
    pub fn per_view_uniforms(
        &self,
        camera: &CameraInfo,
        viewport: Viewport,
        time_fraction: f32,
        user_time: Vec4,
    ) -> PerViewUib {
        PerViewUib::new(camera, viewport, self.froxelizer.update_uniforms(), time_fraction, user_time)
    }

    pub fn execute_frame(
        &self,
        backend: &mut impl litcore_backend::CommandStreamBackend,
        target: litcore_backend::RenderTargetHandle,
        renderable_ubo: litcore_backend::BufferHandle,
        renderable_ubo_stride: usize,
    ) -> Result<(), litcore_backend::BackendError> {
        self.depth_pass.execute(backend, target, renderable_ubo, renderable_ubo_stride)?;
        self.color_pass.execute(backend, target, renderable_ubo, renderable_ubo_stride)?;
        Ok(())
    }

    pub fn end_frame(&mut self, backend: &mut impl litcore_backend::CommandStreamBackend, skipped: bool) {
        if !skipped {
            self.skipper.end_frame(backend);
        }
        self.cache.gc(skipped, backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litcore_backend::mock::MockBackend;
    use litcore_backend::PipelineHandle;
    use litcore_base::ResourceId;
    use litcore_math::{Mat4, Vec3};

    fn always_opaque(_: ResourceId) -> Option<(litcore_renderers::MaterialInfo, PipelineHandle)> {
        Some((
            litcore_renderers::MaterialInfo {
                material_id: 0,
                variant: 0,
                is_blended: false,
                transparency_mode: litcore_renderers::TransparencyMode::Default,
                alpha_to_coverage: false,
            },
            PipelineHandle::from_raw(1),
        ))
    }

    #[test]
    fn invalid_viewport_is_rejected_before_any_work() {
        let mut view = View::new(ViewConfig::default());
        let backend = MockBackend::new();
        let camera = CameraInfo::new(Mat4::IDENTITY, Mat4::IDENTITY, 0.1, 100.0, 0.0);
        let inputs =
            FrameInputs { viewport: Viewport { left: 0, bottom: 0, width: 0, height: 720 }, camera, renderables: &[], lights: &[] };
        let result = view.prepare_frame(inputs, &backend, &always_opaque, 16.0, 1.0 / 60.0);
        assert!(matches!(result, Err(PrepareError::InvalidViewport { .. })));
    }

    #[test]
    fn prepare_frame_produces_commands_for_visible_renderables() {
        let mut view = View::new(ViewConfig::default());
        let backend = MockBackend::new();
        let view_mat = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        let camera = CameraInfo::new(view_mat, proj, 0.1, 100.0, 0.0);
        let renderables = vec![Renderable {
            local_aabb: litcore_objects::Aabb { min: Vec3::splat(-0.5), max: Vec3::splat(0.5) },
            transform: Mat4::IDENTITY,
            layer_mask: 1,
            channels: 0,
            priority: 0,
            cast_shadows: false,
            receive_shadows: true,
            culling: true,
            primitives: smallvec::smallvec![litcore_objects::Primitive {
                vertex_buffer: litcore_backend::BufferHandle::from_raw(1),
                index_buffer: litcore_backend::BufferHandle::from_raw(2),
                index_offset: 0,
                index_count: 3,
                material_instance: ResourceId::from(0usize),
                blend_order: 0,
            }],
        }];
        let inputs = FrameInputs {
            viewport: Viewport { left: 0, bottom: 0, width: 1920, height: 1080 },
            camera,
            renderables: &renderables,
            lights: &[],
        };
        let outputs = view
            .prepare_frame(inputs, &backend, &always_opaque, 16.0, 1.0 / 60.0)
            .unwrap()
            .expect("first frame is never skipped");
        assert_eq!(outputs.visible_count, 1);
        assert!(!view.color_pass.commands().is_empty());
    }
}

//! An in-memory [`CommandStreamBackend`] for use by other crates' tests.
//!
//! Tracks nothing more than "does this handle exist"; draw/bind calls are
//! recorded into a log so tests can assert ordering (e.g. `RenderPass`
//! sort-key monotonicity surfaces as draw-call order here).

use rustc_hash::FxHashMap;

use crate::handles::{BufferHandle, RenderTargetHandle, SyncHandle, TextureHandle};
use crate::types::{BufferDesc, DrawCall, RenderPassParams, RenderTargetDesc, TextureDesc};
use crate::{BackendError, CommandStreamBackend};

#[derive(Debug, Clone)]
pub enum RecordedCall {
    BeginRenderPass(RenderTargetHandle, RenderPassParams),
    Draw(DrawCall),
    EndRenderPass,
    BindUniform { binding_point: u32, handle: BufferHandle },
    BindUniformRange { binding_point: u32, handle: BufferHandle, offset: usize, size: usize },
}

#[derive(Default)]
pub struct MockBackend {
    next_id: u64,
    buffers: FxHashMap<BufferHandle, BufferDesc>,
    textures: FxHashMap<TextureHandle, TextureDesc>,
    render_targets: FxHashMap<RenderTargetHandle, RenderTargetDesc>,
    syncs: FxHashMap<SyncHandle, bool>,
    pub calls: Vec<RecordedCall>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn texture_desc(&self, handle: TextureHandle) -> Option<&TextureDesc> {
        self.textures.get(&handle)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Flips a previously-created sync to signaled, simulating the GPU
    /// catching up. Test-only hook; a real backend signals these itself.
    pub fn signal(&mut self, handle: SyncHandle) {
        if let Some(state) = self.syncs.get_mut(&handle) {
            *state = true;
        }
    }
}

impl CommandStreamBackend for MockBackend {
    fn create_buffer_object(&mut self, desc: BufferDesc) -> Result<BufferHandle, BackendError> {
        let handle = BufferHandle::from_raw(self.fresh_id());
        self.buffers.insert(handle, desc);
        Ok(handle)
    }

    fn destroy_buffer_object(&mut self, handle: BufferHandle) {
        self.buffers.remove(&handle);
    }

    fn update_buffer_object(&mut self, _handle: BufferHandle, _data: &[u8], _offset: usize) {}

    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureHandle, BackendError> {
        let handle = TextureHandle::from_raw(self.fresh_id());
        self.textures.insert(handle, desc);
        Ok(handle)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
    }

    #[allow(clippy::too_many_arguments)]
    fn update_3d_image(
        &mut self,
        _handle: TextureHandle,
        _level: u32,
        _x: u32,
        _y: u32,
        _z: u32,
        _w: u32,
        _h: u32,
        _d: u32,
        _data: &[u8],
    ) {
    }

    fn create_render_target(
        &mut self,
        desc: RenderTargetDesc,
    ) -> Result<RenderTargetHandle, BackendError> {
        let handle = RenderTargetHandle::from_raw(self.fresh_id());
        self.render_targets.insert(handle, desc);
        Ok(handle)
    }

    fn destroy_render_target(&mut self, handle: RenderTargetHandle) {
        self.render_targets.remove(&handle);
    }

    fn begin_render_pass(&mut self, target: RenderTargetHandle, params: RenderPassParams) {
        self.calls.push(RecordedCall::BeginRenderPass(target, params));
    }

    fn draw(&mut self, call: DrawCall) {
        self.calls.push(RecordedCall::Draw(call));
    }

    fn end_render_pass(&mut self) {
        self.calls.push(RecordedCall::EndRenderPass);
    }

    fn bind_uniform_buffer(&mut self, binding_point: u32, handle: BufferHandle) {
        self.calls.push(RecordedCall::BindUniform { binding_point, handle });
    }

    fn bind_uniform_buffer_range(
        &mut self,
        binding_point: u32,
        handle: BufferHandle,
        offset: usize,
        size: usize,
    ) {
        self.calls.push(RecordedCall::BindUniformRange { binding_point, handle, offset, size });
    }

    fn create_sync(&mut self) -> SyncHandle {
        let handle = SyncHandle::from_raw(self.fresh_id());
        self.syncs.insert(handle, false);
        handle
    }

    fn destroy_sync(&mut self, handle: SyncHandle) {
        self.syncs.remove(&handle);
    }

    fn sync_status(&self, handle: SyncHandle) -> crate::types::SyncStatus {
        match self.syncs.get(&handle) {
            Some(true) => crate::types::SyncStatus::Signaled,
            Some(false) => crate::types::SyncStatus::NotReady,
            None => crate::types::SyncStatus::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BufferUsage, TextureFormat, TextureTarget, TextureUsage};

    #[test]
    fn create_and_destroy_round_trips() {
        let mut backend = MockBackend::new();
        let buf = backend
            .create_buffer_object(BufferDesc {
                size: 64,
                usage: BufferUsage { uniform: true, ..Default::default() },
                debug_name: None,
            })
            .unwrap();
        assert_eq!(backend.buffer_count(), 1);
        backend.destroy_buffer_object(buf);
        assert_eq!(backend.buffer_count(), 0);
    }

    #[test]
    fn sync_starts_unsignaled_then_signals() {
        let mut backend = MockBackend::new();
        let sync = backend.create_sync();
        assert_eq!(backend.sync_status(sync), crate::types::SyncStatus::NotReady);
        backend.signal(sync);
        assert_eq!(backend.sync_status(sync), crate::types::SyncStatus::Signaled);
    }

    #[test]
    fn destroyed_texture_handle_reports_error_status_on_lookup() {
        let mut backend = MockBackend::new();
        let tex = backend
            .create_texture(TextureDesc {
                target: TextureTarget::Texture2D,
                levels: 1,
                format: TextureFormat::Rgba8Unorm,
                samples: 1,
                width: 256,
                height: 256,
                depth: 1,
                usage: TextureUsage { sampled: true, ..Default::default() },
            })
            .unwrap();
        assert!(backend.texture_desc(tex).is_some());
        backend.destroy_texture(tex);
        assert!(backend.texture_desc(tex).is_none());
    }
}

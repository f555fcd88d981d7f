//! The contract for the backend command stream (`spec.md` §6).
//!
//! The backend itself — window/swap-chain management, GPU execution, shader
//! compilation — is an out-of-scope external collaborator (`spec.md` §1).
//! This crate specifies only the operations the core calls on it, as a
//! trait, plus a minimal in-memory [`mock::MockBackend`] used by the other
//! crates' tests so the froxelizer/render-pass/resource-cache logic can be
//! exercised without a real GPU.

pub mod handles;
pub mod mock;
pub mod types;

use thiserror::Error;

pub use handles::{BufferHandle, PipelineHandle, RenderTargetHandle, SyncHandle, TextureHandle};
pub use types::*;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend allocation failed: {0}")]
    AllocationFailed(String),
}

/// The write-only queue of opaque GPU commands the core drives every frame.
///
/// Single-producer (the view-preparing thread), single-consumer (the
/// backend thread); commands are consumed in enqueue order. The core never
/// retries a failed allocation (`spec.md` §4.3.5, §7) — a failure simply
/// yields an invalid handle that downstream draws silently no-op on.
pub trait CommandStreamBackend {
    /// Allocates `n` zeroed elements of `T` from the command-stream's
    /// per-frame ring buffer. Valid until the backend thread consumes this
    /// frame's buffer.
    fn allocate_pod<T: bytemuck::Pod + bytemuck::Zeroable>(&mut self, n: usize) -> Vec<T> {
        vec![T::zeroed(); n]
    }

    fn create_buffer_object(&mut self, desc: BufferDesc) -> Result<BufferHandle, BackendError>;
    fn destroy_buffer_object(&mut self, handle: BufferHandle);
    fn update_buffer_object(&mut self, handle: BufferHandle, data: &[u8], offset: usize);

    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureHandle, BackendError>;
    fn destroy_texture(&mut self, handle: TextureHandle);
    #[allow(clippy::too_many_arguments)]
    fn update_3d_image(
        &mut self,
        handle: TextureHandle,
        level: u32,
        x: u32,
        y: u32,
        z: u32,
        w: u32,
        h: u32,
        d: u32,
        data: &[u8],
    );

    fn create_render_target(
        &mut self,
        desc: RenderTargetDesc,
    ) -> Result<RenderTargetHandle, BackendError>;
    fn destroy_render_target(&mut self, handle: RenderTargetHandle);

    fn begin_render_pass(&mut self, target: RenderTargetHandle, params: RenderPassParams);
    fn draw(&mut self, call: DrawCall);
    fn end_render_pass(&mut self);

    fn bind_uniform_buffer(&mut self, binding_point: u32, handle: BufferHandle);
    fn bind_uniform_buffer_range(
        &mut self,
        binding_point: u32,
        handle: BufferHandle,
        offset: usize,
        size: usize,
    );

    fn create_sync(&mut self) -> SyncHandle;
    fn destroy_sync(&mut self, handle: SyncHandle);
    fn sync_status(&self, handle: SyncHandle) -> SyncStatus;
}

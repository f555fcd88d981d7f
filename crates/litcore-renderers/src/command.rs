//! `Command{key, primitive}` (`spec.md` §3.1) and the raster state a command
//! carries so the executor can detect state changes between consecutive
//! draws (`spec.md` §4.2.5), grounded on `ard-render-renderers::bins`'s
//! `DrawBin` — fields are `Option<T> = None` when unchanged from the
//! previous command, so the executor only re-binds what changed.

use litcore_backend::{BufferHandle, PipelineHandle};
use litcore_base::ResourceId;

use crate::key::SortKey;

pub use litcore_backend::types::{Culling, DepthFunc, RasterState};

#[derive(Debug, Copy, Clone)]
pub struct PrimitiveInfo {
    pub renderable_index: u32,
    pub primitive_index: u16,
    pub material_instance: ResourceId,
    pub pipeline: PipelineHandle,
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub index_offset: u32,
    pub index_count: u32,
    pub raster: RasterState,
}

#[derive(Debug, Copy, Clone)]
pub struct Command {
    pub key: SortKey,
    pub primitive: PrimitiveInfo,
}

/// Materials and their compiled variants are an out-of-scope external
/// collaborator (`spec.md` §1); the command builder asks for this
/// information through a closure instead of owning a material system.
#[derive(Debug, Copy, Clone)]
pub struct MaterialInfo {
    pub material_id: u32,
    pub variant: u8,
    pub is_blended: bool,
    pub transparency_mode: TransparencyMode,
    pub alpha_to_coverage: bool,
}

/// `spec.md` §4.2.4.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransparencyMode {
    Default,
    TwoPassesTwoSides,
    TwoPassesOneSide,
}

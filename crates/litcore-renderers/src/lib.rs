//! Draw-command generation, sorting and execution (`spec.md` §4.2), grounded
//! on `ard-render-renderers` for the module boundary.

pub mod command;
pub mod key;
pub mod pass;

pub use command::{Command, Culling, DepthFunc, MaterialInfo, PrimitiveInfo, RasterState, TransparencyMode};
pub use key::{Pass as SortPass, SortKey, SENTINEL_KEY};
pub use pass::{MaterialLookup, PassOptions, RenderPass};

//! The per-view coordinator: frame pacing, dynamic resolution, and driving
//! the froxelizer/culling/command pipeline in order (`spec.md` §5),
//! grounded on `ard-render-camera`'s view-owns-its-pipeline shape.

pub mod pid;
pub mod skipper;
pub mod view;

pub use pid::{DynamicResolutionConfig, DynamicResolutionController};
pub use skipper::FrameSkipper;
pub use view::{FrameInputs, FrameOutputs, View, ViewConfig};

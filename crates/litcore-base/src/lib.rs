pub mod error;
pub mod frame;
pub mod job;
pub mod resource;

pub use error::PrepareError;
pub use frame::{Frame, FRAMES_IN_FLIGHT};
pub use job::JobErrors;
pub use resource::ResourceId;

/// A half-open `[start, end)` range over `u32` indices, used throughout the
/// core to address SoA rows without pointers (see `DESIGN.md`).
pub type IndexRange = std::ops::Range<u32>;

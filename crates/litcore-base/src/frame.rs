/// How many frames may be in flight between the CPU and the backend at
/// once. Per-frame resources (UBO ring slots, command buffers) are arrayed
/// by this constant.
pub const FRAMES_IN_FLIGHT: usize = 2;

/// Identifies which of the `FRAMES_IN_FLIGHT` slots the current frame is
/// using. Cheap to copy; never persisted across a `View::end_frame`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Frame(usize);

impl From<usize> for Frame {
    fn from(value: usize) -> Self {
        Frame(value % FRAMES_IN_FLIGHT)
    }
}

impl From<Frame> for usize {
    fn from(value: Frame) -> Self {
        value.0
    }
}

impl Frame {
    /// Advances to the next frame slot, wrapping modulo `FRAMES_IN_FLIGHT`.
    pub fn next(self) -> Self {
        Frame((self.0 + 1) % FRAMES_IN_FLIGHT)
    }
}

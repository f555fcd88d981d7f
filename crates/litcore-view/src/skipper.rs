//! `FrameSkipper` (`spec.md` §5 "Backpressure"), grounded on
//! `ard-render`'s `FRAMES_IN_FLIGHT`-bounded frame pacing idea, generalized
//! to a small sync-fence queue against the `CommandStreamBackend` contract.

use std::collections::VecDeque;

use litcore_backend::{CommandStreamBackend, SyncHandle, SyncStatus};

/// Bounds GPU-CPU skew to at most `max_latency` frames in flight. If the
/// oldest outstanding fence hasn't signaled by the time the queue is full,
/// [`FrameSkipper::begin_frame`] returns `false` and the caller must skip
/// command generation and presentation entirely for that frame.
pub struct FrameSkipper {
    max_latency: usize,
    fences: VecDeque<SyncHandle>,
}

impl FrameSkipper {
    pub fn new(max_latency: usize) -> Self {
        Self { max_latency: max_latency.max(1), fences: VecDeque::with_capacity(max_latency) }
    }

    pub fn queue_len(&self) -> usize {
        self.fences.len()
    }

    /// Returns `false` if this frame must be dropped.
    pub fn begin_frame(&mut self, backend: &impl CommandStreamBackend) -> bool {
        if self.fences.len() < self.max_latency {
            return true;
        }
        let oldest = *self.fences.front().expect("len checked above");
        if backend.sync_status(oldest) == SyncStatus::Signaled {
            self.fences.pop_front();
            true
        } else {
            log::debug!("frame skipper: oldest fence not signaled, dropping frame");
            false
        }
    }

    /// Call once a frame that was not dropped finishes issuing commands.
    pub fn end_frame(&mut self, backend: &mut impl CommandStreamBackend) {
        self.fences.push_back(backend.create_sync());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litcore_backend::mock::MockBackend;

    #[test]
    fn frame_is_dropped_until_oldest_fence_signals() {
        let mut backend = MockBackend::new();
        let mut skipper = FrameSkipper::new(2);

        assert!(skipper.begin_frame(&backend));
        skipper.end_frame(&mut backend);
        assert!(skipper.begin_frame(&backend));
        skipper.end_frame(&mut backend);

        assert!(!skipper.begin_frame(&backend), "queue is full and nothing has signaled yet");
    }

    #[test]
    fn signaling_the_oldest_fence_unblocks_the_queue() {
        let mut backend = MockBackend::new();
        let mut skipper = FrameSkipper::new(1);

        assert!(skipper.begin_frame(&backend));
        skipper.end_frame(&mut backend);
        assert!(!skipper.begin_frame(&backend));

        let oldest = *skipper.fences.front().unwrap();
        backend.signal(oldest);
        assert!(skipper.begin_frame(&backend));
    }
}

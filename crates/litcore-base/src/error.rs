use thiserror::Error;

/// Errors surfaced during the single-threaded preparation phase of a frame.
///
/// Per the propagation policy: errors detected here are returned directly to
/// the caller and the frame is dropped. Errors detected inside worker jobs
/// are collected by [`crate::job::JobErrors`] and joined at the next wait
/// point; the first one recorded wins and is converted into one of these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PrepareError {
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },
    #[error("invalid projection: {reason}")]
    InvalidProjection { reason: &'static str },
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),
}

//! Per-frame metrics for the swarm loop.
//!
//! [`FrameMetrics`] captures timing and buffer data for a single frame so
//! callers can log or plot them without instrumenting the loop themselves.

/// Timing and buffer metrics collected during a single frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameMetrics {
    /// Index of the frame these metrics describe.
    pub frame_index: u64,
    /// Wall-clock time spent animating every curve, in microseconds.
    pub animate_us: u64,
    /// Number of curve instances submitted.
    pub instance_count: usize,
    /// Page-rounded size of the leased block, in bytes.
    pub buffer_bytes: usize,
    /// Whether the block was relocated since the previous frame.
    pub grew: bool,
}

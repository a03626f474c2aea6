//! The rendering backend as seen from the frame loop.

use swarm_storage::ViewLease;

use crate::draw::GlobalParams;

/// Everything a backend needs to draw one frame.
///
/// The lease keeps the instance block pinned in place; the backend drops it
/// (or the whole submission) once the frame's reads have completed.
#[derive(Debug)]
pub struct FrameSubmission {
    /// Leased view of the instance buffer.
    pub lease: ViewLease,
    /// Uniforms shared by every instance.
    pub globals: GlobalParams,
    /// Number of instances to draw.
    pub instance_count: usize,
    /// Indices per instance.
    pub index_count: u32,
    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

/// Consumer of submitted frames.
///
/// Implementations may retire leases synchronously inside `submit`, or
/// later from another thread (leases are `Send`). Either way,
/// [`wait_idle`](FrameSink::wait_idle) must not return while any lease it
/// was handed is still alive.
pub trait FrameSink {
    /// Hand one frame to the backend.
    fn submit(&mut self, frame: FrameSubmission);

    /// Block until every submitted frame has been consumed and its lease
    /// dropped.
    fn wait_idle(&mut self);
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn submit(&mut self, frame: FrameSubmission) {
        (**self).submit(frame);
    }

    fn wait_idle(&mut self) {
        (**self).wait_idle();
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn submit(&mut self, frame: FrameSubmission) {
        (**self).submit(frame);
    }

    fn wait_idle(&mut self) {
        (**self).wait_idle();
    }
}

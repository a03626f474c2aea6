//! Zero-copy views of a vector's backing block and the leases that guard them.
//!
//! A [`RawView`] describes the block an external consumer (typically a GPU
//! buffer created without copying) reads from. A [`ViewLease`] marks one
//! such read as in flight: while any lease is live, the owning
//! [`PageAlignedVec`](crate::PageAlignedVec) refuses to relocate its block.
//! Leases are `Send` so a completion callback on another thread can retire
//! them.
//!
//! In-place element writes stay legal while leases are live. A reader sees
//! a stale-but-valid block; torn geometry within one frame is tolerated.

#![allow(unsafe_code)]

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Address and extent of a vector's backing block.
///
/// Valid only until the next relocation of the owning vector. `generation`
/// changes on every relocation, so consumers caching an import can detect
/// that the block moved.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawView {
    pub(crate) ptr: *const u8,
    pub(crate) byte_len: usize,
    pub(crate) stride: usize,
    pub(crate) len: usize,
    pub(crate) capacity: usize,
    pub(crate) generation: u64,
}

// SAFETY: RawView is a plain description of an address range. It never
// dereferences `ptr` itself; consumers that do so rely on the lease
// protocol, not on the thread they run on.
unsafe impl Send for RawView {}
// SAFETY: see above.
unsafe impl Sync for RawView {}

impl RawView {
    /// Base address of the block (page-aligned).
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Page-rounded byte length of the block, based on capacity.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Byte distance between consecutive records.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of live records at the time the view was taken.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view holds no live records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of record slots in the block.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Relocation generation of the owning vector.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for RawView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RawView(ptr={:p}, bytes={}, stride={}, len={}, gen={})",
            self.ptr, self.byte_len, self.stride, self.len, self.generation
        )
    }
}

/// In-flight bookkeeping shared between a vector and its leases.
#[derive(Default)]
pub(crate) struct LeaseState {
    outstanding: AtomicUsize,
    torn_down: AtomicBool,
}

impl LeaseState {
    pub(crate) fn acquire(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn release(&self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Mark the owner as torn down. Returns the number of live leases.
    pub(crate) fn tear_down(&self) -> usize {
        self.torn_down.store(true, Ordering::Release);
        self.outstanding()
    }

    pub(crate) fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }
}

/// One in-flight external read of a vector's block.
///
/// Obtained from [`PageAlignedVec::lease_view`](crate::PageAlignedVec::lease_view).
/// Drop the lease once the consumer has finished reading (e.g. when the
/// GPU signals the frame's work as complete). Cloning a lease registers
/// another independent read.
#[must_use = "dropping a lease immediately ends the read window"]
pub struct ViewLease {
    view: RawView,
    state: Arc<LeaseState>,
}

impl ViewLease {
    pub(crate) fn new(view: RawView, state: Arc<LeaseState>) -> Self {
        state.acquire();
        Self { view, state }
    }

    /// The leased view.
    ///
    /// # Panics
    ///
    /// Panics if the owning vector has been torn down. Reading through a
    /// view of a released vector is never valid.
    pub fn view(&self) -> RawView {
        assert!(
            !self.state.is_torn_down(),
            "zero-copy view used after its vector was torn down"
        );
        self.view
    }

    /// The leased view, or `None` if the owning vector has been torn down.
    pub fn try_view(&self) -> Option<RawView> {
        (!self.state.is_torn_down()).then_some(self.view)
    }

    /// Whether the owning vector is still alive.
    pub fn is_live(&self) -> bool {
        !self.state.is_torn_down()
    }
}

impl Clone for ViewLease {
    fn clone(&self) -> Self {
        Self::new(self.view, Arc::clone(&self.state))
    }
}

impl Drop for ViewLease {
    fn drop(&mut self) {
        self.state.release();
    }
}

impl fmt::Debug for ViewLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewLease")
            .field("view", &self.view)
            .field("live", &self.is_live())
            .finish()
    }
}

// Compile-time assertion: leases can be retired from a completion thread.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<ViewLease>();
};

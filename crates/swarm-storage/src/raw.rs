//! Low-level primitives for page-aligned memory blocks.
//!
//! [`AlignedStorage`] is the only type in the workspace that talks to the
//! global allocator directly. Each block is obtained with exactly one
//! `alloc_zeroed` call and returned with exactly one `dealloc` call; there
//! is no pooling. Every `unsafe` block carries a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::OnceLock;

use crate::error::StorageError;

/// Page size assumed when the host query is unavailable or fails.
pub const FALLBACK_PAGE_SIZE: usize = 4096;

/// Host page granularity in bytes.
///
/// Queried once on first use and cached for the process lifetime, so
/// repeated calls always agree. Always a non-zero power of two.
pub fn page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
    *PAGE_SIZE.get_or_init(query_page_size)
}

#[cfg(unix)]
fn query_page_size() -> usize {
    // SAFETY: sysconf has no preconditions; it only reads a system constant.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 && (size as usize).is_power_of_two() {
        size as usize
    } else {
        log::warn!("sysconf(_SC_PAGESIZE) returned {size}; assuming {FALLBACK_PAGE_SIZE}");
        FALLBACK_PAGE_SIZE
    }
}

#[cfg(not(unix))]
fn query_page_size() -> usize {
    FALLBACK_PAGE_SIZE
}

/// Round `bytes` up to the next page multiple. Zero rounds up to one page.
///
/// Returns `None` on overflow.
pub fn round_to_page(bytes: usize) -> Option<usize> {
    let page = page_size();
    if bytes == 0 {
        return Some(page);
    }
    bytes.checked_add(page - 1).map(|b| b & !(page - 1))
}

/// A zero-initialised memory block whose start address is page-aligned.
///
/// The block is sized for `capacity` slots of `stride` bytes, rounded up to
/// a whole number of pages so that external consumers which reject
/// non-page-multiple lengths can import it as-is.
///
/// The block knows nothing about what lives in it: constructing and
/// destroying values in the slots is the owner's job. Dropping the storage
/// only returns the memory.
pub struct AlignedStorage {
    ptr: NonNull<u8>,
    byte_len: usize,
    align: usize,
    capacity: usize,
    stride: usize,
}

impl AlignedStorage {
    /// Allocate a block for `capacity` slots of `stride` bytes each.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::OutOfMemory`] if `capacity * stride` overflows
    /// or the allocator cannot satisfy the aligned request.
    pub fn allocate(capacity: usize, stride: usize) -> Result<Self, StorageError> {
        let align = page_size();
        let requested = capacity
            .checked_mul(stride)
            .ok_or(StorageError::OutOfMemory {
                requested: usize::MAX,
                align,
            })?;
        let byte_len = round_to_page(requested).ok_or(StorageError::OutOfMemory {
            requested,
            align,
        })?;
        let layout = Layout::from_size_align(byte_len, align).map_err(|_| {
            StorageError::OutOfMemory {
                requested: byte_len,
                align,
            }
        })?;

        // SAFETY: `layout` has a non-zero size (at least one page).
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(StorageError::OutOfMemory {
            requested: byte_len,
            align,
        })?;

        Ok(Self {
            ptr,
            byte_len,
            align,
            capacity,
            stride,
        })
    }

    /// Base address of the block.
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Length of the block in bytes (always a page multiple).
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Alignment of the base address in bytes.
    #[inline]
    pub fn align(&self) -> usize {
        self.align
    }

    /// Number of slots the block was sized for.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Byte distance between consecutive slots.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }
}

impl Drop for AlignedStorage {
    fn drop(&mut self) {
        // SAFETY: `byte_len` and `align` were accepted by
        // `Layout::from_size_align` in `allocate` and never change.
        let layout = unsafe { Layout::from_size_align_unchecked(self.byte_len, self.align) };
        // SAFETY: `ptr` came from `alloc_zeroed` with this exact layout and
        // is freed only here, once.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) };
    }
}

// SAFETY: AlignedStorage uniquely owns its block (it is not Clone and
// exposes no interior mutability), so moving it to another thread or
// sharing `&AlignedStorage` cannot create aliased writes.
unsafe impl Send for AlignedStorage {}
// SAFETY: see above; `&AlignedStorage` only exposes the base address.
unsafe impl Sync for AlignedStorage {}

impl std::fmt::Debug for AlignedStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedStorage")
            .field("ptr", &self.ptr)
            .field("byte_len", &self.byte_len)
            .field("capacity", &self.capacity)
            .field("stride", &self.stride)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_stable_power_of_two() {
        let first = page_size();
        assert!(first.is_power_of_two());
        for _ in 0..10 {
            assert_eq!(page_size(), first);
        }
    }

    #[test]
    fn zero_request_rounds_to_one_page() {
        let block = AlignedStorage::allocate(0, 64).unwrap();
        assert_eq!(block.byte_len(), page_size());
        assert_eq!(block.as_ptr() as usize % page_size(), 0);
    }

    #[test]
    fn length_rounds_up_to_page_multiple() {
        let page = page_size();
        let block = AlignedStorage::allocate(3, page / 2 + 1).unwrap();
        assert_eq!(block.byte_len() % page, 0);
        assert!(block.byte_len() >= 3 * (page / 2 + 1));
        assert_eq!(block.byte_len(), 2 * page);
    }

    #[test]
    fn exact_multiple_is_not_padded() {
        let page = page_size();
        let block = AlignedStorage::allocate(4, page).unwrap();
        assert_eq!(block.byte_len(), 4 * page);
    }

    #[test]
    fn block_is_zeroed() {
        let block = AlignedStorage::allocate(16, 112).unwrap();
        // SAFETY: the block is `byte_len` initialised bytes.
        let bytes = unsafe { std::slice::from_raw_parts(block.as_ptr(), block.byte_len()) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn overflowing_request_is_out_of_memory() {
        let err = AlignedStorage::allocate(usize::MAX, 2).unwrap_err();
        assert!(matches!(err, StorageError::OutOfMemory { .. }));
    }

    #[test]
    fn unrepresentable_layout_is_out_of_memory() {
        // Rounds to a length above isize::MAX, which Layout rejects.
        let err = AlignedStorage::allocate(usize::MAX / 2, 1).unwrap_err();
        assert!(matches!(err, StorageError::OutOfMemory { .. }));
    }

    #[test]
    fn round_to_page_values() {
        let page = page_size();
        assert_eq!(round_to_page(0), Some(page));
        assert_eq!(round_to_page(1), Some(page));
        assert_eq!(round_to_page(page), Some(page));
        assert_eq!(round_to_page(page + 1), Some(2 * page));
        assert_eq!(round_to_page(usize::MAX), None);
    }
}

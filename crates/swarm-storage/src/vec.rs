//! Growable page-aligned vector.
//!
//! A [`PageAlignedVec`] owns exactly one [`AlignedStorage`] block and the
//! values constructed in its occupied prefix. Slots are `stride` bytes
//! apart; the stride may exceed `size_of::<T>()` when the consumer demands
//! a coarser per-instance stride.
//!
//! Growth doubles capacity: a new block is allocated first, live values are
//! moved across bitwise in index order, and only then is the old block
//! released. A failed allocation therefore leaves the vector untouched.
//! Growth is refused while a [`ViewLease`] of the current block is live.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::{Index, IndexMut, Range};
use std::ptr;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::StorageError;
use crate::raw::{page_size, AlignedStorage};
use crate::view::{LeaseState, RawView, ViewLease};

/// Allocation counters for a single vector.
///
/// `elements_relocated` grows by `len` on every relocation, which makes the
/// amortised cost of doubling growth observable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrowthStats {
    /// Blocks allocated over the vector's lifetime (including the first).
    pub allocations: u64,
    /// Relocations performed by growth.
    pub grows: u64,
    /// Total values moved between blocks.
    pub elements_relocated: u64,
}

/// A growable, indexable sequence stored in one page-aligned block.
///
/// The block can be handed to an external zero-copy consumer through
/// [`raw_view`](Self::raw_view) / [`lease_view`](Self::lease_view).
pub struct PageAlignedVec<T> {
    storage: ManuallyDrop<AlignedStorage>,
    len: usize,
    config: StorageConfig,
    leases: Arc<LeaseState>,
    generation: u64,
    stats: GrowthStats,
    _marker: PhantomData<T>,
}

impl<T> PageAlignedVec<T> {
    /// Create an empty vector with the default config.
    ///
    /// Capacity starts at one page worth of slots (at least 1).
    pub fn new() -> Result<Self, StorageError> {
        Self::with_config(StorageConfig::default())
    }

    /// Create an empty vector with the given config.
    pub fn with_config(config: StorageConfig) -> Result<Self, StorageError> {
        Self::construct_with_config(config, 0, || unreachable!("no elements requested"))
    }

    /// Create a vector of `initial_len` values produced by `factory`, in
    /// index order.
    pub fn construct(
        initial_len: usize,
        factory: impl FnMut() -> T,
    ) -> Result<Self, StorageError> {
        Self::construct_with_config(StorageConfig::default(), initial_len, factory)
    }

    /// Like [`construct`](Self::construct) with an explicit config.
    ///
    /// Capacity starts at `page_size / stride` (at least 1) and doubles
    /// until it holds `initial_len`; the block is allocated once.
    pub fn construct_with_config(
        config: StorageConfig,
        initial_len: usize,
        mut factory: impl FnMut() -> T,
    ) -> Result<Self, StorageError> {
        config.validate()?;
        if std::mem::align_of::<T>() > page_size() {
            return Err(StorageError::InvalidConfig {
                reason: format!(
                    "element alignment {} exceeds the page size {}",
                    std::mem::align_of::<T>(),
                    page_size()
                ),
            });
        }

        let stride = config.stride_for::<T>();
        let capacity = grown_capacity((page_size() / stride).max(1), initial_len)?;
        let storage = AlignedStorage::allocate(capacity, stride)?;

        let mut vec = Self {
            storage: ManuallyDrop::new(storage),
            len: 0,
            config,
            leases: Arc::new(LeaseState::default()),
            generation: 0,
            stats: GrowthStats {
                allocations: 1,
                ..GrowthStats::default()
            },
            _marker: PhantomData,
        };
        for _ in 0..initial_len {
            let value = factory();
            // SAFETY: capacity >= initial_len, so slot `len` is in bounds
            // and unoccupied.
            unsafe { ptr::write(vec.slot_mut(vec.len), value) };
            vec.len += 1;
        }
        Ok(vec)
    }

    /// Number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots available without relocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Byte distance between consecutive slots.
    #[inline]
    pub fn stride(&self) -> usize {
        self.storage.stride()
    }

    /// Allocation counters.
    pub fn stats(&self) -> GrowthStats {
        self.stats
    }

    /// Number of live [`ViewLease`]s on the current block.
    pub fn outstanding_views(&self) -> usize {
        self.leases.outstanding()
    }

    /// Shared reference to the value at `index`.
    pub fn get(&self, index: usize) -> Result<&T, StorageError> {
        self.check_index(index)?;
        // SAFETY: index < len, so the slot holds an initialised value.
        Ok(unsafe { &*self.slot(index) })
    }

    /// Mutable reference to the value at `index`.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, StorageError> {
        self.check_index(index)?;
        // SAFETY: index < len, and `&mut self` guarantees exclusivity.
        Ok(unsafe { &mut *self.slot_mut(index) })
    }

    /// Replace the value at `index`, dropping the previous one.
    pub fn set(&mut self, index: usize, value: T) -> Result<(), StorageError> {
        *self.get_mut(index)? = value;
        Ok(())
    }

    /// Append `value` at the tail, doubling capacity if full.
    ///
    /// # Errors
    ///
    /// [`StorageError::ViewsOutstanding`] if growth is needed while views
    /// are leased, or [`StorageError::OutOfMemory`] if the new block cannot
    /// be allocated. In both cases the vector is unchanged and `value` is
    /// dropped.
    pub fn append(&mut self, value: T) -> Result<(), StorageError> {
        if self.len == self.capacity() {
            self.grow_to(self.len + 1)?;
        }
        // SAFETY: len < capacity after the growth check.
        unsafe { ptr::write(self.slot_mut(self.len), value) };
        self.len += 1;
        Ok(())
    }

    /// Alias for [`append`](Self::append).
    pub fn push(&mut self, value: T) -> Result<(), StorageError> {
        self.append(value)
    }

    /// Ensure room for at least `additional` more values.
    ///
    /// Capacity doubles until large enough. A no-op (and therefore always
    /// permitted) when the current block already fits.
    pub fn reserve(&mut self, additional: usize) -> Result<(), StorageError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(StorageError::OutOfMemory {
                requested: usize::MAX,
                align: self.storage.align(),
            })?;
        if required > self.capacity() {
            self.grow_to(required)?;
        }
        Ok(())
    }

    /// Insert `value` at `index`, shifting later values up by one.
    pub fn insert(&mut self, index: usize, value: T) -> Result<(), StorageError> {
        if index > self.len {
            return Err(StorageError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        if self.len == self.capacity() {
            self.grow_to(self.len + 1)?;
        }
        // SAFETY: len < capacity, so the tail fits one slot further up.
        // `ptr::copy` handles the overlapping ranges.
        unsafe {
            ptr::copy(
                self.slot(index) as *const u8,
                self.slot_mut(index + 1) as *mut u8,
                (self.len - index) * self.stride(),
            );
            ptr::write(self.slot_mut(index), value);
        }
        self.len += 1;
        Ok(())
    }

    /// Remove and return the value at `index`, shifting later values down.
    ///
    /// Never relocates the block.
    pub fn remove(&mut self, index: usize) -> Result<T, StorageError> {
        self.check_index(index)?;
        // SAFETY: index < len. The value is read out before its slot is
        // overwritten by the tail.
        let value = unsafe {
            let value = ptr::read(self.slot(index));
            ptr::copy(
                self.slot(index + 1) as *const u8,
                self.slot_mut(index) as *mut u8,
                (self.len - index - 1) * self.stride(),
            );
            value
        };
        self.len -= 1;
        Ok(value)
    }

    /// Remove and return the last value.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot at the old tail was initialised and is now
        // outside the live prefix, so it is read exactly once.
        Some(unsafe { ptr::read(self.slot(self.len)) })
    }

    /// Drop every value at or beyond `new_len`, in index order.
    ///
    /// No effect if `new_len >= len`. Never relocates the block.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        let old_len = self.len;
        // Shrink first: a panicking destructor leaks the rest instead of
        // double-dropping.
        self.len = new_len;
        for i in new_len..old_len {
            // SAFETY: slots new_len..old_len were initialised and are now
            // outside the live prefix.
            unsafe { ptr::drop_in_place(self.slot_mut(i)) };
        }
    }

    /// Drop all values. Capacity is kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Replace the values in `range` with the items of `replacement`.
    ///
    /// Values after the range slide to follow the new items. Grows (with
    /// the usual doubling) if the result does not fit; on error the vector
    /// is unchanged.
    pub fn replace_range(
        &mut self,
        range: Range<usize>,
        replacement: impl IntoIterator<Item = T>,
    ) -> Result<(), StorageError> {
        if range.start > range.end || range.end > self.len {
            return Err(StorageError::IndexOutOfRange {
                index: range.end.max(range.start),
                len: self.len,
            });
        }
        let items: Vec<T> = replacement.into_iter().collect();
        let new_len = self.len - range.len() + items.len();
        if new_len > self.capacity() {
            self.grow_to(new_len)?;
        }

        let old_len = self.len;
        let tail = old_len - range.end;
        self.len = range.start;
        for i in range.clone() {
            // SAFETY: slots in `range` were live and are now outside the
            // live prefix.
            unsafe { ptr::drop_in_place(self.slot_mut(i)) };
        }
        let stride = self.stride();
        let dest = range.start + items.len();
        // SAFETY: dest + tail == new_len <= capacity; `ptr::copy` handles
        // overlap in either direction.
        unsafe {
            ptr::copy(
                self.slot(range.end) as *const u8,
                self.slot_mut(dest) as *mut u8,
                tail * stride,
            );
        }
        for (offset, item) in items.into_iter().enumerate() {
            // SAFETY: range.start + offset < dest, a hole left by the slide.
            unsafe { ptr::write(self.slot_mut(range.start + offset), item) };
        }
        self.len = new_len;
        Ok(())
    }

    /// Apply `visit` to every live value in index order, in place.
    ///
    /// Never relocates; length and capacity cannot change during the visit.
    pub fn for_each_mut(&mut self, mut visit: impl FnMut(usize, &mut T)) {
        for (index, value) in self.iter_mut().enumerate() {
            visit(index, value);
        }
    }

    /// Iterate over shared references in index order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            base: self.storage.as_ptr(),
            stride: self.stride(),
            front: 0,
            back: self.len,
            _marker: PhantomData,
        }
    }

    /// Iterate over mutable references in index order.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            base: self.storage.as_ptr(),
            stride: self.stride(),
            front: 0,
            back: self.len,
            _marker: PhantomData,
        }
    }

    /// Describe the backing block for a zero-copy consumer.
    ///
    /// The length is capacity-based and page-rounded. The view is valid
    /// until the next relocation; use [`lease_view`](Self::lease_view) to
    /// hold relocation off while a consumer reads.
    pub fn raw_view(&self) -> RawView {
        RawView {
            ptr: self.storage.as_ptr(),
            byte_len: self.storage.byte_len(),
            stride: self.stride(),
            len: self.len,
            capacity: self.capacity(),
            generation: self.generation,
        }
    }

    /// Lease the current block to an external reader.
    ///
    /// Until every lease is dropped, operations that would relocate the
    /// block fail with [`StorageError::ViewsOutstanding`].
    pub fn lease_view(&self) -> ViewLease {
        ViewLease::new(self.raw_view(), Arc::clone(&self.leases))
    }

    /// Relocation generation; bumped on every growth.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn check_index(&self, index: usize) -> Result<(), StorageError> {
        if index < self.len {
            Ok(())
        } else {
            Err(StorageError::IndexOutOfRange {
                index,
                len: self.len,
            })
        }
    }

    #[inline]
    fn slot(&self, index: usize) -> *const T {
        self.storage.as_ptr().wrapping_add(index * self.stride()) as *const T
    }

    #[inline]
    fn slot_mut(&mut self, index: usize) -> *mut T {
        self.storage.as_ptr().wrapping_add(index * self.stride()) as *mut T
    }

    /// Move into a block of at least `min_capacity` slots.
    fn grow_to(&mut self, min_capacity: usize) -> Result<(), StorageError> {
        let outstanding = self.leases.outstanding();
        if outstanding > 0 {
            log::warn!(
                "refusing to grow page-aligned vector past {} slots: {outstanding} view(s) in flight",
                self.capacity()
            );
            return Err(StorageError::ViewsOutstanding { outstanding });
        }

        let old_capacity = self.capacity();
        let new_capacity = grown_capacity(old_capacity.saturating_mul(2), min_capacity)?;
        let new_storage = AlignedStorage::allocate(new_capacity, self.stride())?;

        // SAFETY: both blocks hold at least `len * stride` bytes and are
        // distinct allocations. Moving the bytes moves the values; the old
        // block is released below without running any destructor.
        unsafe {
            ptr::copy_nonoverlapping(
                self.storage.as_ptr(),
                new_storage.as_ptr(),
                self.len * self.stride(),
            );
        }
        drop(std::mem::replace(&mut *self.storage, new_storage));

        self.generation += 1;
        self.stats.allocations += 1;
        self.stats.grows += 1;
        self.stats.elements_relocated += self.len as u64;
        log::debug!(
            "page-aligned vector grew {old_capacity} -> {new_capacity} slots ({} bytes, {} values moved)",
            self.storage.byte_len(),
            self.len
        );
        Ok(())
    }
}

impl<T: Clone> PageAlignedVec<T> {
    /// Deep copy into an independent block with the same capacity and
    /// stride.
    pub fn try_clone(&self) -> Result<Self, StorageError> {
        let storage = AlignedStorage::allocate(self.capacity(), self.stride())?;
        let mut copy = Self {
            storage: ManuallyDrop::new(storage),
            len: 0,
            config: self.config.clone(),
            leases: Arc::new(LeaseState::default()),
            generation: 0,
            stats: GrowthStats {
                allocations: 1,
                ..GrowthStats::default()
            },
            _marker: PhantomData,
        };
        for value in self.iter() {
            // SAFETY: the copy has the same capacity as `self`, and
            // `copy.len < self.len` here.
            unsafe { ptr::write(copy.slot_mut(copy.len), value.clone()) };
            copy.len += 1;
        }
        Ok(copy)
    }
}

impl<T: bytemuck::Pod> PageAlignedVec<T> {
    /// The whole block as bytes, exactly as a zero-copy consumer sees it.
    ///
    /// Length equals [`RawView::byte_len`]. Slots beyond `len` and any
    /// stride padding are zero unless previously occupied.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the block was zero-initialised and only ever receives
        // `Pod` values or byte copies of them, so all `byte_len` bytes are
        // initialised. `&self` prevents concurrent writes from this side.
        unsafe { std::slice::from_raw_parts(self.storage.as_ptr(), self.storage.byte_len()) }
    }
}

/// Smallest doubling of `start` that holds `required` slots.
fn grown_capacity(start: usize, required: usize) -> Result<usize, StorageError> {
    let mut capacity = start.max(1);
    while capacity < required {
        capacity = capacity
            .checked_mul(2)
            .ok_or(StorageError::OutOfMemory {
                requested: usize::MAX,
                align: page_size(),
            })?;
    }
    Ok(capacity)
}

impl<T> Drop for PageAlignedVec<T> {
    fn drop(&mut self) {
        let outstanding = self.leases.tear_down();
        self.truncate(0);
        if outstanding == 0 {
            // SAFETY: the storage is dropped exactly once, here.
            unsafe { ManuallyDrop::drop(&mut self.storage) };
            return;
        }
        // An external reader still holds the block: leak it rather than
        // free memory under the reader.
        log::error!(
            "page-aligned vector torn down with {outstanding} view(s) in flight; leaking {} bytes",
            self.storage.byte_len()
        );
        if !std::thread::panicking() {
            panic!("page-aligned vector torn down with {outstanding} zero-copy view(s) in flight");
        }
    }
}

impl<T: Clone> Clone for PageAlignedVec<T> {
    /// # Panics
    ///
    /// Panics if the copy's block cannot be allocated. Use
    /// [`try_clone`](PageAlignedVec::try_clone) to handle that case.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(err) => panic!("page-aligned vector clone failed: {err}"),
        }
    }
}

impl<T> Index<usize> for PageAlignedVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T> IndexMut<usize> for PageAlignedVec<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        match self.get_mut(index) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T> Extend<T> for PageAlignedVec<T> {
    /// # Panics
    ///
    /// Panics if growth fails (out of memory or views outstanding).
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            if let Err(err) = self.append(value) {
                panic!("page-aligned vector extend failed: {err}");
            }
        }
    }
}

impl<T> FromIterator<T> for PageAlignedVec<T> {
    /// # Panics
    ///
    /// Panics if the block cannot be allocated.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vec = match Self::new() {
            Ok(vec) => vec,
            Err(err) => panic!("page-aligned vector allocation failed: {err}"),
        };
        vec.extend(iter);
        vec
    }
}

impl<T: PartialEq> PartialEq for PageAlignedVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T> fmt::Debug for PageAlignedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageAlignedVec")
            .field("ptr", &self.storage.as_ptr())
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("stride", &self.stride())
            .finish()
    }
}

impl<'a, T> IntoIterator for &'a PageAlignedVec<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut PageAlignedVec<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

/// Shared iterator over a [`PageAlignedVec`].
pub struct Iter<'a, T> {
    base: *const u8,
    stride: usize,
    front: usize,
    back: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        // SAFETY: front < len of the borrowed vector, so the slot is live.
        let value = unsafe { &*(self.base.add(self.front * self.stride) as *const T) };
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: back < len of the borrowed vector, so the slot is live.
        Some(unsafe { &*(self.base.add(self.back * self.stride) as *const T) })
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Mutable iterator over a [`PageAlignedVec`].
pub struct IterMut<'a, T> {
    base: *mut u8,
    stride: usize,
    front: usize,
    back: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.front == self.back {
            return None;
        }
        // SAFETY: each live slot is yielded at most once, so the mutable
        // references never alias.
        let value = unsafe { &mut *(self.base.add(self.front * self.stride) as *mut T) };
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: see `next`; front and back never cross.
        Some(unsafe { &mut *(self.base.add(self.back * self.stride) as *mut T) })
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;

    use proptest::prelude::*;

    #[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct Record {
        id: u32,
        value: f32,
    }

    fn record(id: u32) -> Record {
        Record {
            id,
            value: id as f32 * 0.5,
        }
    }

    /// Counts drops and clones through a shared cell.
    #[derive(Debug)]
    struct Tracked {
        id: usize,
        drops: Rc<Cell<usize>>,
        clones: Rc<Cell<usize>>,
    }

    impl Clone for Tracked {
        fn clone(&self) -> Self {
            self.clones.set(self.clones.get() + 1);
            Self {
                id: self.id,
                drops: Rc::clone(&self.drops),
                clones: Rc::clone(&self.clones),
            }
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn tracked_vec(n: usize) -> (PageAlignedVec<Tracked>, Rc<Cell<usize>>, Rc<Cell<usize>>) {
        let drops = Rc::new(Cell::new(0));
        let clones = Rc::new(Cell::new(0));
        let mut next = 0;
        let vec = PageAlignedVec::construct(n, || {
            next += 1;
            Tracked {
                id: next - 1,
                drops: Rc::clone(&drops),
                clones: Rc::clone(&clones),
            }
        })
        .unwrap();
        (vec, drops, clones)
    }

    fn ids(vec: &PageAlignedVec<Record>) -> Vec<u32> {
        vec.iter().map(|r| r.id).collect()
    }

    #[test]
    fn initial_capacity_is_one_page_of_slots() {
        let vec: PageAlignedVec<Record> = PageAlignedVec::new().unwrap();
        assert_eq!(vec.stride(), 8);
        assert_eq!(vec.capacity(), page_size() / 8);
        assert!(vec.is_empty());
    }

    #[test]
    fn oversized_records_get_capacity_of_one() {
        let vec: PageAlignedVec<[u8; 10_000]> = PageAlignedVec::new().unwrap();
        assert_eq!(vec.capacity(), 1);
        assert_eq!(vec.raw_view().byte_len() % page_size(), 0);
        assert!(vec.raw_view().byte_len() >= 10_000);
    }

    #[test]
    fn construct_grows_to_fit_initial_len() {
        let per_page = page_size() / 8;
        let mut n = 0;
        let vec = PageAlignedVec::construct(per_page * 3, || {
            n += 1;
            record(n - 1)
        })
        .unwrap();
        assert_eq!(vec.len(), per_page * 3);
        assert_eq!(vec.capacity(), per_page * 4);
        assert_eq!(vec.stats().allocations, 1);
        assert_eq!(vec[per_page * 3 - 1].id as usize, per_page * 3 - 1);
    }

    #[test]
    fn view_is_page_aligned_and_rounded() {
        let config = StorageConfig::with_stride_alignment(16);
        let vec = PageAlignedVec::construct_with_config(config, 100, || [1.0f32; 3]).unwrap();
        let view = vec.raw_view();
        assert_eq!(view.stride(), 16);
        assert_eq!(view.as_ptr() as usize % page_size(), 0);
        assert_eq!(view.byte_len() % page_size(), 0);
        assert!(view.byte_len() >= vec.len() * vec.stride());
        assert_eq!(view.len(), 100);
    }

    #[test]
    fn get_out_of_range_is_an_error() {
        let mut vec = PageAlignedVec::construct(3, || record(1)).unwrap();
        assert_eq!(
            vec.get(3).unwrap_err(),
            StorageError::IndexOutOfRange { index: 3, len: 3 }
        );
        assert!(vec.get(usize::MAX).is_err());
        assert!(vec.set(3, record(9)).is_err());
        assert_eq!(ids(&vec), vec![1, 1, 1]);

        let empty: PageAlignedVec<Record> = PageAlignedVec::new().unwrap();
        assert!(empty.get(0).is_err());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn index_operator_panics_out_of_range() {
        let vec = PageAlignedVec::construct(2, || record(0)).unwrap();
        let _ = vec[2];
    }

    #[test]
    fn set_replaces_and_drops_old_value() {
        let (mut vec, drops, _) = tracked_vec(3);
        let replacement = vec[0].clone();
        vec.set(1, replacement).unwrap();
        assert_eq!(drops.get(), 1);
        assert_eq!(vec[1].id, 0);
    }

    #[test]
    fn append_across_growths_preserves_order() {
        let mut vec = PageAlignedVec::new().unwrap();
        let initial = vec.capacity();
        let n = initial * 5 + 3;
        for i in 0..n {
            vec.append(record(i as u32)).unwrap();
        }
        assert_eq!(vec.len(), n);
        assert_eq!(vec.capacity(), initial * 8);
        assert_eq!(vec.stats().grows, 3);
        assert_eq!(vec.generation(), 3);
        for i in 0..n {
            assert_eq!(vec.get(i).unwrap(), &record(i as u32));
        }
        assert_eq!(vec.raw_view().as_ptr() as usize % page_size(), 0);
    }

    #[test]
    fn growth_keeps_stride() {
        let config = StorageConfig::with_stride_alignment(32);
        let mut vec = PageAlignedVec::with_config(config).unwrap();
        for i in 0..1000u32 {
            vec.push(record(i)).unwrap();
        }
        assert_eq!(vec.stride(), 32);
        assert_eq!(vec[999], record(999));
    }

    #[test]
    fn amortised_relocations_are_linear() {
        for n in [1usize, 10, 100, 1000, 5000] {
            let mut vec = PageAlignedVec::new().unwrap();
            for i in 0..n {
                vec.append(i as u64).unwrap();
            }
            assert!(
                vec.stats().elements_relocated <= 2 * n as u64,
                "n={n}: {} relocations",
                vec.stats().elements_relocated
            );
        }
    }

    #[test]
    fn growth_moves_without_cloning_or_dropping() {
        let (mut vec, drops, clones) = tracked_vec(0);
        let per_page = vec.capacity();
        for id in 0..per_page * 4 {
            vec.append(Tracked {
                id,
                drops: Rc::clone(&drops),
                clones: Rc::clone(&clones),
            })
            .unwrap();
        }
        assert_eq!(drops.get(), 0);
        assert_eq!(clones.get(), 0);
        assert!(vec.iter().enumerate().all(|(i, t)| t.id == i));
    }

    #[test]
    fn teardown_drops_every_value_once() {
        let (vec, drops, _) = tracked_vec(257);
        drop(vec);
        assert_eq!(drops.get(), 257);
    }

    #[test]
    fn copies_are_independent() {
        let mut original = PageAlignedVec::construct(10, || record(7)).unwrap();
        let mut copy = original.try_clone().unwrap();
        assert_ne!(original.raw_view().as_ptr(), copy.raw_view().as_ptr());
        assert_eq!(copy.capacity(), original.capacity());

        copy.set(0, record(100)).unwrap();
        original.set(1, record(200)).unwrap();
        assert_eq!(original[0], record(7));
        assert_eq!(copy[1], record(7));

        drop(original);
        assert_eq!(copy[0], record(100));
        assert_eq!(copy.len(), 10);
    }

    #[test]
    fn clone_clones_each_value_once() {
        let (vec, drops, clones) = tracked_vec(5);
        let copy = vec.clone();
        assert_eq!(clones.get(), 5);
        drop(vec);
        assert_eq!(drops.get(), 5);
        assert_eq!(copy[4].id, 4);
        drop(copy);
        assert_eq!(drops.get(), 10);
    }

    #[test]
    fn for_each_mut_visits_in_order_in_place() {
        let mut vec = PageAlignedVec::construct(50, || record(0)).unwrap();
        let ptr = vec.raw_view().as_ptr();
        let mut seen = Vec::new();
        vec.for_each_mut(|i, r| {
            seen.push(i);
            r.id = i as u32 * 2;
        });
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
        assert_eq!(vec[49].id, 98);
        assert_eq!(vec.raw_view().as_ptr(), ptr);
        assert_eq!(vec.len(), 50);
    }

    #[test]
    fn leased_view_blocks_growth() {
        let mut vec: PageAlignedVec<u64> = PageAlignedVec::new().unwrap();
        let cap = vec.capacity();
        for i in 0..cap {
            vec.append(i as u64).unwrap();
        }
        let lease = vec.lease_view();
        assert_eq!(vec.outstanding_views(), 1);
        assert_eq!(
            vec.append(99),
            Err(StorageError::ViewsOutstanding { outstanding: 1 })
        );
        assert_eq!(vec.len(), cap);
        assert_eq!(lease.view().as_ptr(), vec.raw_view().as_ptr());

        // In-place mutation stays legal.
        vec.for_each_mut(|_, v| *v += 1);
        assert_eq!(vec[0], 1);

        drop(lease);
        vec.append(99).unwrap();
        assert_eq!(vec.generation(), 1);
    }

    #[test]
    fn leased_view_allows_appends_within_capacity() {
        let mut vec: PageAlignedVec<u64> = PageAlignedVec::new().unwrap();
        let _lease = vec.lease_view();
        vec.append(1).unwrap();
        vec.reserve(1).unwrap();
        assert!(vec.reserve(vec.capacity()).is_err());
    }

    #[test]
    fn teardown_with_outstanding_view_is_fatal() {
        let vec = PageAlignedVec::construct(4, || 1u32).unwrap();
        let lease = vec.lease_view();
        let result = catch_unwind(AssertUnwindSafe(move || drop(vec)));
        assert!(result.is_err());
        assert!(!lease.is_live());
        assert!(catch_unwind(AssertUnwindSafe(|| lease.view())).is_err());
    }

    #[test]
    fn insert_and_remove_slide_the_tail() {
        let mut vec: PageAlignedVec<Record> = (0..5).map(record).collect();
        vec.insert(2, record(42)).unwrap();
        assert_eq!(ids(&vec), vec![0, 1, 42, 2, 3, 4]);
        vec.insert(6, record(43)).unwrap();
        assert_eq!(ids(&vec), vec![0, 1, 42, 2, 3, 4, 43]);
        assert!(vec.insert(8, record(0)).is_err());

        assert_eq!(vec.remove(0).unwrap(), record(0));
        assert_eq!(ids(&vec), vec![1, 42, 2, 3, 4, 43]);
        assert!(vec.remove(6).is_err());
        assert_eq!(vec.pop(), Some(record(43)));
        assert_eq!(vec.len(), 5);
    }

    #[test]
    fn insert_at_capacity_grows() {
        let mut vec: PageAlignedVec<u64> = PageAlignedVec::new().unwrap();
        let cap = vec.capacity();
        vec.extend(0..cap as u64);
        vec.insert(0, 1000).unwrap();
        assert_eq!(vec.capacity(), cap * 2);
        assert_eq!(vec[0], 1000);
        assert_eq!(vec[cap], cap as u64 - 1);
    }

    #[test]
    fn truncate_and_clear_drop_tail_values() {
        let (mut vec, drops, _) = tracked_vec(10);
        let cap = vec.capacity();
        vec.truncate(6);
        assert_eq!(drops.get(), 4);
        vec.truncate(8);
        assert_eq!(vec.len(), 6);
        vec.clear();
        assert_eq!(drops.get(), 10);
        assert_eq!(vec.capacity(), cap);
    }

    #[test]
    fn replace_range_grows_shrinks_and_inserts() {
        let mut vec: PageAlignedVec<Record> = (0..6).map(record).collect();

        vec.replace_range(1..4, [record(10), record(11), record(12), record(13), record(14)])
            .unwrap();
        assert_eq!(ids(&vec), vec![0, 10, 11, 12, 13, 14, 4, 5]);

        vec.replace_range(1..6, [record(20)]).unwrap();
        assert_eq!(ids(&vec), vec![0, 20, 4, 5]);

        vec.replace_range(2..2, [record(30)]).unwrap();
        assert_eq!(ids(&vec), vec![0, 20, 30, 4, 5]);

        vec.replace_range(0..5, std::iter::empty()).unwrap();
        assert!(vec.is_empty());

        assert!(vec.replace_range(0..1, [record(1)]).is_err());
    }

    #[test]
    fn replace_range_drops_removed_values() {
        let (mut vec, drops, _) = tracked_vec(6);
        let keep = vec[5].clone();
        vec.replace_range(0..3, [keep]).unwrap();
        assert_eq!(drops.get(), 3);
        let remaining: Vec<usize> = vec.iter().map(|t| t.id).collect();
        assert_eq!(remaining, vec![5, 3, 4, 5]);
    }

    #[test]
    fn replace_range_past_capacity_grows() {
        let mut vec: PageAlignedVec<u64> = PageAlignedVec::new().unwrap();
        let cap = vec.capacity();
        vec.extend(0..4);
        vec.replace_range(1..2, 0..cap as u64).unwrap();
        assert_eq!(vec.len(), 3 + cap);
        assert_eq!(vec[0], 0);
        assert_eq!(vec[cap], cap as u64 - 1);
        assert_eq!(vec[cap + 1], 2);
        assert_eq!(vec[cap + 2], 3);
    }

    #[test]
    fn bytes_cover_the_whole_block() {
        let vec = PageAlignedVec::construct(3, || record(1)).unwrap();
        let bytes = vec.as_bytes();
        assert_eq!(bytes.len(), vec.raw_view().byte_len());
        assert_eq!(&bytes[..8], bytemuck::bytes_of(&record(1)));
        assert!(bytes[24..].iter().all(|&b| b == 0));
    }

    #[test]
    fn padded_stride_leaves_gaps_zeroed() {
        let config = StorageConfig::with_stride_alignment(16);
        let vec =
            PageAlignedVec::construct_with_config(config, 2, || record(3)).unwrap();
        let bytes = vec.as_bytes();
        assert_eq!(&bytes[16..24], bytemuck::bytes_of(&record(3)));
        assert!(bytes[8..16].iter().all(|&b| b == 0));
    }

    #[test]
    fn debug_shows_pointer_and_shape() {
        let vec = PageAlignedVec::construct(2, || 0u32).unwrap();
        let text = format!("{vec:?}");
        assert!(text.starts_with("PageAlignedVec { ptr: 0x"));
        assert!(text.contains("len: 2"));
    }

    #[test]
    fn zero_sized_values_are_supported() {
        let mut vec = PageAlignedVec::construct(3, || ()).unwrap();
        vec.append(()).unwrap();
        assert_eq!(vec.len(), 4);
        assert_eq!(vec.stride(), 1);
    }

    #[test]
    fn failed_growth_leaves_vector_untouched() {
        let mut vec = PageAlignedVec::<u64>::construct(5, || 7).unwrap();
        let ptr = vec.raw_view().as_ptr();
        let capacity = vec.capacity();
        let stats = vec.stats();

        // Byte length overflows, byte length of exactly 2^63 exceeds
        // `isize::MAX`, and `len + additional` overflows.
        for additional in [usize::MAX / 4, (1 << 60) - 5, usize::MAX] {
            let err = vec.reserve(additional).unwrap_err();
            assert!(
                matches!(err, StorageError::OutOfMemory { .. }),
                "reserve({additional}): {err:?}"
            );
            assert_eq!(vec.raw_view().as_ptr(), ptr);
            assert_eq!(vec.capacity(), capacity);
            assert_eq!(vec.generation(), 0);
            assert_eq!(vec.len(), 5);
            assert!(vec.iter().all(|&v| v == 7));
            assert_eq!(vec.stats(), stats);
            assert_eq!(
                vec.stats(),
                GrowthStats {
                    allocations: 1,
                    grows: 0,
                    elements_relocated: 0,
                }
            );
        }

        // The vector is still fully usable afterwards.
        vec.append(8).unwrap();
        assert_eq!(vec.len(), 6);
        assert_eq!(vec[5], 8);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = StorageConfig::with_stride_alignment(3);
        assert!(PageAlignedVec::<u32>::with_config(config).is_err());
    }

    proptest! {
        #[test]
        fn appended_values_read_back_in_order(
            values in proptest::collection::vec(any::<u32>(), 0..3000),
            align_pow in 0u32..7,
        ) {
            let config = StorageConfig::with_stride_alignment(1 << align_pow);
            let mut vec = PageAlignedVec::with_config(config).unwrap();
            for &v in &values {
                vec.append(v).unwrap();
            }
            prop_assert_eq!(vec.len(), values.len());
            prop_assert!(vec.len() <= vec.capacity());
            for (i, &v) in values.iter().enumerate() {
                prop_assert_eq!(*vec.get(i).unwrap(), v);
            }
            let view = vec.raw_view();
            prop_assert_eq!(view.as_ptr() as usize % page_size(), 0);
            prop_assert_eq!(view.byte_len() % page_size(), 0);
            prop_assert!(view.byte_len() >= vec.len() * vec.stride());
        }

        #[test]
        fn initial_len_sets_capacity(n in 0usize..20_000) {
            let vec = PageAlignedVec::construct(n, || 0u64).unwrap();
            prop_assert_eq!(vec.len(), n);
            prop_assert!(vec.capacity() >= n);
            prop_assert!(vec.capacity() < 2 * n.max(page_size() / 8));
        }
    }
}

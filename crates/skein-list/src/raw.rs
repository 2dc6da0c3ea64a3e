//! Low-level element buffer.
//!
//! [`RawBuffer`] is the only place in this crate that reads or writes
//! uninitialised memory. It splits its storage into the live range
//! `[0, len)` and the reserved range `[len, capacity)`, and every method
//! restores that split before returning, even when an element's
//! constructor or destructor panics (the affected tail is leaked, never
//! double-dropped).
//!
//! Each `unsafe` block carries a `// SAFETY:` comment tying it back to the
//! live-range invariant.

#![allow(unsafe_code)]

use std::mem;
use std::ptr;
use std::slice;

use skein_core::{Allocator, ContainerError, Storage};

/// Storage triple: buffer start, live end (`len`), reserved end (`slots.len()`).
pub(crate) struct RawBuffer<T> {
    slots: Storage<T>,
    len: usize,
}

impl<T> RawBuffer<T> {
    /// A buffer with no storage.
    pub(crate) fn empty() -> Self {
        Self {
            slots: Vec::new().into_boxed_slice(),
            len: 0,
        }
    }

    /// A buffer with room for exactly `capacity` elements.
    pub(crate) fn with_capacity<A: Allocator<T>>(
        alloc: &A,
        capacity: usize,
    ) -> Result<Self, ContainerError> {
        if capacity == 0 {
            return Ok(Self::empty());
        }
        Ok(Self {
            slots: alloc.allocate(capacity)?,
            len: 0,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn spare(&self) -> usize {
        self.slots.len() - self.len
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        // SAFETY: slots `[0, len)` are initialised, and `MaybeUninit<T>` has
        // the same layout as `T`.
        unsafe { slice::from_raw_parts(self.slots.as_ptr().cast::<T>(), self.len) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`; `&mut self` guarantees exclusivity.
        unsafe { slice::from_raw_parts_mut(self.slots.as_mut_ptr().cast::<T>(), self.len) }
    }

    /// Construct `value` at the end of the live range.
    ///
    /// The caller must have ensured spare capacity.
    pub(crate) fn push<A: Allocator<T>>(&mut self, alloc: &A, value: T) {
        assert!(self.len < self.capacity(), "push without spare capacity");
        alloc.initialize(&mut self.slots[self.len], value);
        self.len += 1;
    }

    /// Construct `values` at the end of the live range.
    ///
    /// The caller must have ensured `values.len()` spare slots.
    pub(crate) fn push_many<A, I>(&mut self, alloc: &A, values: I)
    where
        A: Allocator<T>,
        I: ExactSizeIterator<Item = T>,
    {
        assert!(values.len() <= self.spare(), "push_many without spare capacity");
        for value in values {
            alloc.initialize(&mut self.slots[self.len], value);
            self.len += 1;
        }
    }

    /// Remove and return the last live element.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot `len` was live and is now outside the live range, so
        // it is read exactly once.
        Some(unsafe { self.slots[self.len].assume_init_read() })
    }

    /// Shift `[index, len)` right by `values.len()` and construct `values`
    /// in the gap.
    ///
    /// The caller must have ensured `index <= len` and enough spare slots.
    pub(crate) fn insert_many<A, I>(&mut self, alloc: &A, index: usize, values: I)
    where
        A: Allocator<T>,
        I: ExactSizeIterator<Item = T>,
    {
        let count = values.len();
        let old_len = self.len;
        assert!(index <= old_len, "insert position beyond live range");
        assert!(count <= self.spare(), "insert without spare capacity");
        if count == 0 {
            return;
        }
        // The tail is unreachable until the gap is filled; a panicking
        // constructor leaks it instead of exposing holes.
        self.len = index;
        let base = self.slots.as_mut_ptr();
        // SAFETY: source `[index, old_len)` and destination
        // `[index + count, old_len + count)` are both within capacity.
        // `ptr::copy` handles the overlap; the source slots are treated as
        // uninitialised afterwards.
        unsafe {
            ptr::copy(base.add(index), base.add(index + count), old_len - index);
        }
        let mut filled = 0;
        for value in values.take(count) {
            alloc.initialize(&mut self.slots[index + filled], value);
            filled += 1;
        }
        assert_eq!(filled, count, "ExactSizeIterator reported a wrong length");
        self.len = old_len + count;
    }

    /// Destroy the element at `index` and construct `value` in its place.
    pub(crate) fn replace<A: Allocator<T>>(&mut self, alloc: &A, index: usize, value: T) {
        let old_len = self.len;
        assert!(index < old_len, "replace position outside live range");
        self.len = index;
        // SAFETY: slot `index` is initialised; it is excluded from the live
        // range while it is being rebuilt.
        unsafe {
            alloc.deinitialize(&mut self.slots[index]);
        }
        alloc.initialize(&mut self.slots[index], value);
        self.len = old_len;
    }

    /// Destroy `[start, end)` and close the gap by shifting the tail left.
    pub(crate) fn remove_range<A: Allocator<T>>(&mut self, alloc: &A, start: usize, end: usize) {
        let old_len = self.len;
        assert!(start <= end && end <= old_len, "remove range outside live range");
        if start == end {
            return;
        }
        self.len = start;
        // SAFETY: `[start, end)` is initialised and now outside the live range.
        unsafe {
            alloc.deinitialize_range(&mut self.slots[start..end]);
        }
        let base = self.slots.as_mut_ptr();
        // SAFETY: `[end, old_len)` is initialised; it moves down into the
        // freed slots and the vacated tail is treated as uninitialised.
        unsafe {
            ptr::copy(base.add(end), base.add(start), old_len - end);
        }
        self.len = start + (old_len - end);
    }

    /// Destroy every live element at or after `new_len`.
    pub(crate) fn truncate<A: Allocator<T>>(&mut self, alloc: &A, new_len: usize) {
        let old_len = self.len;
        if new_len >= old_len {
            return;
        }
        self.len = new_len;
        // SAFETY: `[new_len, old_len)` is initialised and now outside the live range.
        unsafe {
            alloc.deinitialize_range(&mut self.slots[new_len..old_len]);
        }
    }

    /// Move the live range into `storage` and hand back the old storage.
    ///
    /// A Rust move is a bitwise copy after which the source is never used
    /// again, so relocation is a single non-overlapping copy; the old slots
    /// are uninitialised when they are returned.
    pub(crate) fn relocate(&mut self, mut storage: Storage<T>) -> Storage<T> {
        assert!(storage.len() >= self.len, "relocation target too small");
        // SAFETY: `[0, len)` is initialised in the old storage, the new
        // storage has room for it, and the two allocations are distinct.
        unsafe {
            ptr::copy_nonoverlapping(self.slots.as_ptr(), storage.as_mut_ptr(), self.len);
        }
        mem::replace(&mut self.slots, storage)
    }

    /// Destroy every element and give up the storage.
    ///
    /// Returns `None` if the buffer never owned an allocation.
    pub(crate) fn release<A: Allocator<T>>(&mut self, alloc: &A) -> Option<Storage<T>> {
        self.truncate(alloc, 0);
        if self.slots.is_empty() {
            return None;
        }
        Some(mem::replace(&mut self.slots, Vec::new().into_boxed_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_core::Global;
    use skein_test_utils::DropCounter;

    fn buffer<T>(capacity: usize) -> RawBuffer<T> {
        RawBuffer::with_capacity(&Global, capacity).unwrap()
    }

    fn release<T>(mut buf: RawBuffer<T>) {
        if let Some(storage) = buf.release(&Global) {
            Allocator::<T>::deallocate(&Global, storage);
        }
    }

    #[test]
    fn push_and_pop() {
        let mut buf = buffer::<u32>(4);
        buf.push(&Global, 1);
        buf.push(&Global, 2);
        assert_eq!(buf.as_slice(), &[1, 2]);
        assert_eq!(buf.spare(), 2);
        assert_eq!(buf.pop(), Some(2));
        assert_eq!(buf.len(), 1);
        release(buf);
    }

    #[test]
    fn insert_many_shifts_tail() {
        let mut buf = buffer::<u32>(8);
        buf.push_many(&Global, [1, 2, 5].into_iter());
        buf.insert_many(&Global, 2, [3, 4].into_iter());
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4, 5]);
        buf.insert_many(&Global, 0, [0].into_iter());
        assert_eq!(buf.as_slice(), &[0, 1, 2, 3, 4, 5]);
        release(buf);
    }

    #[test]
    fn remove_range_closes_gap() {
        let mut buf = buffer::<u32>(8);
        buf.push_many(&Global, (0..6).collect::<Vec<_>>().into_iter());
        buf.remove_range(&Global, 1, 3);
        assert_eq!(buf.as_slice(), &[0, 3, 4, 5]);
        buf.remove_range(&Global, 3, 4);
        assert_eq!(buf.as_slice(), &[0, 3, 4]);
        assert_eq!(buf.capacity(), 8);
        release(buf);
    }

    #[test]
    fn replace_drops_old_value() {
        let counter = DropCounter::new();
        let mut buf = buffer(2);
        buf.push(&Global, counter.track(1));
        buf.replace(&Global, 0, counter.track(2));
        assert_eq!(counter.dropped(), 1);
        assert_eq!(buf.as_slice()[0].value(), 2);
        release(buf);
        assert_eq!(counter.dropped(), 2);
    }

    #[test]
    fn relocate_moves_without_dropping() {
        let counter = DropCounter::new();
        let mut buf = buffer(2);
        buf.push(&Global, counter.track(10));
        buf.push(&Global, counter.track(20));
        let bigger: Storage<_> = Global.allocate(5).unwrap();
        let old = buf.relocate(bigger);
        Global.deallocate(old);
        assert_eq!(counter.dropped(), 0);
        assert_eq!(buf.capacity(), 5);
        assert_eq!(buf.as_slice()[1].value(), 20);
        release(buf);
        assert_eq!(counter.dropped(), 2);
    }

    #[test]
    fn truncate_drops_tail_only() {
        let counter = DropCounter::new();
        let mut buf = buffer(4);
        for i in 0..4 {
            buf.push(&Global, counter.track(i));
        }
        buf.truncate(&Global, 1);
        assert_eq!(counter.dropped(), 3);
        assert_eq!(buf.len(), 1);
        release(buf);
        assert_eq!(counter.dropped(), 4);
    }

    #[test]
    fn empty_buffer_releases_nothing() {
        let mut buf = RawBuffer::<String>::empty();
        assert!(buf.release(&Global).is_none());
    }
}

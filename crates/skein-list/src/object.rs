//! Shared list header.
//!
//! A [`ListObject`] is the out-of-line state behind one or more
//! [`List`](crate::List) handles: the element buffer, the allocator that
//! produced it, the container configuration, and the cursor tracker. The
//! reference count lives in the `Rc` that wraps the header; dropping the
//! last handle drops the header, which orphans every cursor and releases
//! the buffer.

use std::ops::Range;

use skein_core::{Allocator, ContainerConfig, ContainerError};
use smallvec::SmallVec;

use crate::raw::RawBuffer;
use crate::tracker::IteratorTracker;

/// Inline capacity of the staging area used by bulk insertion.
pub(crate) const STAGING_INLINE: usize = 8;

/// Elements collected ahead of a bulk insertion.
pub(crate) type Staging<T> = SmallVec<[T; STAGING_INLINE]>;

/// Out-of-line state shared by list handles.
pub(crate) struct ListObject<T, A: Allocator<T>> {
    buffer: RawBuffer<T>,
    alloc: A,
    tracker: IteratorTracker,
    config: ContainerConfig,
}

impl<T, A: Allocator<T>> ListObject<T, A> {
    pub(crate) fn new(alloc: A, config: ContainerConfig) -> Self {
        Self {
            buffer: RawBuffer::empty(),
            tracker: IteratorTracker::new(&config),
            alloc,
            config,
        }
    }

    pub(crate) fn with_capacity(
        capacity: usize,
        alloc: A,
        config: ContainerConfig,
    ) -> Result<Self, ContainerError> {
        let mut object = Self::new(alloc, config);
        object.allocate_storage(capacity)?;
        Ok(object)
    }

    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub(crate) fn max_len(&self) -> usize {
        self.alloc.max_len()
    }

    pub(crate) fn allocator(&self) -> &A {
        &self.alloc
    }

    pub(crate) fn config(&self) -> &ContainerConfig {
        &self.config
    }

    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    pub(crate) fn tracker(&self) -> &IteratorTracker {
        &self.tracker
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        self.buffer.as_slice()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        self.buffer.as_mut_slice()
    }

    /// Give an empty header its first buffer.
    fn allocate_storage(&mut self, capacity: usize) -> Result<(), ContainerError> {
        debug_assert_eq!(self.buffer.capacity(), 0);
        self.buffer = RawBuffer::with_capacity(&self.alloc, capacity)?;
        if capacity > 0 {
            tracing::trace!(capacity, "list storage allocated");
        }
        Ok(())
    }

    /// Move the live range into fresh storage of exactly `capacity` slots.
    ///
    /// New storage is obtained before anything is invalidated, so a failed
    /// allocation leaves the header untouched.
    fn reallocate_storage(
        &mut self,
        capacity: usize,
        invalidated: Range<usize>,
    ) -> Result<(), ContainerError> {
        debug_assert!(capacity >= self.len());
        if capacity == 0 {
            self.tracker.invalidate(invalidated);
            self.free_storage();
            return Ok(());
        }
        let storage = self.alloc.allocate(capacity)?;
        self.tracker.invalidate(invalidated);
        let old_capacity = self.buffer.capacity();
        let old = self.buffer.relocate(storage);
        if !old.is_empty() {
            self.alloc.deallocate(old);
        }
        tracing::trace!(
            old_capacity,
            capacity,
            len = self.len(),
            "list storage reallocated"
        );
        Ok(())
    }

    /// Destroy every element and return the buffer to the allocator.
    fn free_storage(&mut self) {
        if let Some(storage) = self.buffer.release(&self.alloc) {
            tracing::trace!(capacity = storage.len(), "list storage released");
            self.alloc.deallocate(storage);
        }
    }

    /// Capacity to grow to so that at least `required` elements fit.
    ///
    /// Grows by half the current capacity, never below `required`, capped
    /// at the allocator's maximum.
    fn calculate_growth(&self, required: usize) -> Result<usize, ContainerError> {
        let max_len = self.max_len();
        if required > max_len {
            return Err(ContainerError::CapacityOverflow {
                requested: required,
                max_len,
            });
        }
        let capacity = self.capacity();
        let geometric = if capacity > max_len - capacity / 2 {
            max_len
        } else {
            capacity + capacity / 2
        };
        let mut grown = geometric.max(required);
        if capacity == 0 {
            grown = grown.max(self.config.initial_capacity.min(max_len));
        }
        Ok(grown)
    }

    /// Live length plus `additional`, or a resource error on overflow.
    fn required(&self, additional: usize) -> Result<usize, ContainerError> {
        self.len()
            .checked_add(additional)
            .ok_or(ContainerError::CapacityOverflow {
                requested: usize::MAX,
                max_len: self.max_len(),
            })
    }

    /// Make room for `additional` more elements, invalidating `invalidated`
    /// if the buffer has to move. Returns whether it moved.
    fn grow_for(
        &mut self,
        additional: usize,
        invalidated: Range<usize>,
    ) -> Result<bool, ContainerError> {
        let required = self.required(additional)?;
        if required <= self.capacity() {
            return Ok(false);
        }
        let capacity = self.calculate_growth(required)?;
        if self.capacity() == 0 {
            self.allocate_storage(capacity)?;
            self.tracker.invalidate(invalidated);
        } else {
            self.reallocate_storage(capacity, invalidated)?;
        }
        Ok(true)
    }

    /// Append one element.
    pub(crate) fn push(&mut self, value: T) -> Result<(), ContainerError> {
        let len = self.len();
        if !self.grow_for(1, 0..usize::MAX)? {
            self.tracker.invalidate_from(len);
        }
        self.buffer.push(&self.alloc, value);
        Ok(())
    }

    /// Append staged elements.
    pub(crate) fn push_many(&mut self, values: Staging<T>) -> Result<(), ContainerError> {
        if values.is_empty() {
            return Ok(());
        }
        let len = self.len();
        if !self.grow_for(values.len(), 0..usize::MAX)? {
            self.tracker.invalidate_from(len);
        }
        self.buffer.push_many(&self.alloc, values.into_iter());
        Ok(())
    }

    /// Insert one element before `index`; positions at or past the end append.
    pub(crate) fn insert(&mut self, index: usize, value: T) -> Result<usize, ContainerError> {
        let len = self.len();
        if index >= len {
            self.push(value)?;
            return Ok(len);
        }
        if !self.grow_for(1, index..usize::MAX)? {
            self.tracker.invalidate_from(index);
        }
        self.buffer.insert_many(&self.alloc, index, std::iter::once(value));
        Ok(index)
    }

    /// Insert staged elements before `index`; positions at or past the end append.
    pub(crate) fn insert_many(
        &mut self,
        index: usize,
        values: Staging<T>,
    ) -> Result<usize, ContainerError> {
        let len = self.len();
        if index >= len {
            self.push_many(values)?;
            return Ok(len);
        }
        if values.is_empty() {
            return Ok(index);
        }
        if !self.grow_for(values.len(), index..usize::MAX)? {
            self.tracker.invalidate_from(index);
        }
        self.buffer.insert_many(&self.alloc, index, values.into_iter());
        Ok(index)
    }

    /// Destroy the element at `index` and construct `value` in its place.
    pub(crate) fn replace(&mut self, index: usize, value: T) -> Result<(), ContainerError> {
        self.check_index(index)?;
        self.tracker.invalidate(index..index + 1);
        self.buffer.replace(&self.alloc, index, value);
        Ok(())
    }

    /// Remove `[start, end)`, shifting the tail left.
    pub(crate) fn erase(&mut self, start: usize, end: usize) -> Result<(), ContainerError> {
        let len = self.len();
        if start > end {
            return Err(ContainerError::OutOfRange { index: start, len });
        }
        if end > len {
            return Err(ContainerError::OutOfRange { index: end, len });
        }
        if start == end {
            return Ok(());
        }
        self.tracker.invalidate_from(start);
        self.buffer.remove_range(&self.alloc, start, end);
        Ok(())
    }

    /// Remove the last `count` elements without shifting anything.
    pub(crate) fn cut(&mut self, count: usize) -> Result<(), ContainerError> {
        let len = self.len();
        if count > len {
            return Err(ContainerError::OutOfRange { index: count, len });
        }
        if count == 0 {
            return Ok(());
        }
        self.tracker.invalidate_from(len - count);
        self.buffer.truncate(&self.alloc, len - count);
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        self.tracker.invalidate_from(len - 1);
        self.buffer.pop()
    }

    /// Destroy every element, keeping the buffer.
    pub(crate) fn clear(&mut self) {
        self.tracker.invalidate_all();
        self.buffer.truncate(&self.alloc, 0);
    }

    /// Grow capacity geometrically until at least `min_capacity` fits.
    pub(crate) fn ensure_capacity(&mut self, min_capacity: usize) -> Result<(), ContainerError> {
        if min_capacity <= self.capacity() {
            return Ok(());
        }
        let additional = min_capacity - self.len();
        self.grow_for(additional, 0..usize::MAX)?;
        Ok(())
    }

    /// Grow capacity to exactly `capacity` if it is currently smaller.
    pub(crate) fn reserve(&mut self, capacity: usize) -> Result<(), ContainerError> {
        if capacity <= self.capacity() {
            return Ok(());
        }
        let max_len = self.max_len();
        if capacity > max_len {
            return Err(ContainerError::CapacityOverflow {
                requested: capacity,
                max_len,
            });
        }
        if self.capacity() == 0 {
            self.allocate_storage(capacity)?;
            self.tracker.invalidate_all();
            Ok(())
        } else {
            self.reallocate_storage(capacity, 0..usize::MAX)
        }
    }

    /// Shrink capacity to the live length. A no-op once already trimmed.
    pub(crate) fn trim(&mut self) -> Result<(), ContainerError> {
        let len = self.len();
        if self.capacity() == len {
            return Ok(());
        }
        self.reallocate_storage(len, 0..usize::MAX)
    }

    fn check_index(&self, index: usize) -> Result<(), ContainerError> {
        let len = self.len();
        if index >= len {
            return Err(ContainerError::OutOfRange { index, len });
        }
        Ok(())
    }

    /// Deep-copy the live range into a new header using `alloc`.
    pub(crate) fn duplicate_in<B>(&self, alloc: B) -> Result<ListObject<T, B>, ContainerError>
    where
        T: Clone,
        B: Allocator<T>,
    {
        let mut copy = ListObject::with_capacity(self.len(), alloc, self.config.clone())?;
        for value in self.as_slice() {
            copy.buffer.push(&copy.alloc, value.clone());
        }
        Ok(copy)
    }
}

impl<T, A: Allocator<T>> Drop for ListObject<T, A> {
    fn drop(&mut self) {
        self.tracker.invalidate_all();
        self.free_storage();
    }
}

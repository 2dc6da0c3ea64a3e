//! Cursors over sorted-list entries.
//!
//! A [`SortedCursor`] walks a parallel index into the key and value lists.
//! Dereferencing it yields a fresh `(key, value)` copy rather than a live
//! reference. Validity follows the same rules as list cursors: the cursor
//! does not keep the entries alive, and in debug builds an insert or
//! removal at or before its position orphans it.

#[cfg(debug_assertions)]
use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

use skein_core::{Allocator, ContainerError, Global, Natural};
use skein_list::Direction;

use crate::sorted::SortedObject;

/// A validated position inside a [`SortedList`](crate::SortedList).
pub struct SortedCursor<K, V, C = Natural, A: Allocator<K> = Global> {
    object: Weak<SortedObject<K, V, C, A>>,
    direction: Direction,
    base: usize,
    #[cfg(debug_assertions)]
    generation: Cell<u64>,
}

impl<K, V, C, A: Allocator<K>> SortedCursor<K, V, C, A> {
    /// A cursor that was never attached to a sorted list.
    pub fn orphan() -> Self {
        Self {
            object: Weak::new(),
            direction: Direction::Forward,
            base: 0,
            #[cfg(debug_assertions)]
            generation: Cell::new(0),
        }
    }

    pub(crate) fn adopt(
        object: &Rc<SortedObject<K, V, C, A>>,
        direction: Direction,
        base: usize,
    ) -> Self {
        Self {
            object: Rc::downgrade(object),
            direction,
            base,
            #[cfg(debug_assertions)]
            generation: Cell::new(object.generation()),
        }
    }

    /// Traversal direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Base position: the entry index for forward cursors, one past it for
    /// reverse cursors.
    pub fn base(&self) -> usize {
        self.base
    }

    fn generation(&self) -> u64 {
        #[cfg(debug_assertions)]
        {
            self.generation.get()
        }
        #[cfg(not(debug_assertions))]
        {
            0
        }
    }

    fn validate(&self, object: &SortedObject<K, V, C, A>) -> Result<(), ContainerError> {
        #[cfg(debug_assertions)]
        {
            let current = object
                .tracker
                .borrow()
                .check(self.generation.get(), self.base)?;
            self.generation.set(current);
        }
        let len = object.len();
        if self.base > len {
            return Err(ContainerError::OutOfRange {
                index: self.base,
                len,
            });
        }
        Ok(())
    }

    fn inspect<R>(
        &self,
        f: impl FnOnce(&SortedObject<K, V, C, A>) -> Result<R, ContainerError>,
    ) -> Result<R, ContainerError> {
        let object = self
            .object
            .upgrade()
            .ok_or(ContainerError::OrphanedCursor {
                cursor_generation: self.generation(),
                current_generation: 0,
            })?;
        self.validate(&object)?;
        f(&object)
    }

    fn element_index(&self, len: usize) -> Result<usize, ContainerError> {
        let index = match self.direction {
            Direction::Forward => Some(self.base),
            Direction::Reverse => self.base.checked_sub(1),
        };
        match index {
            Some(index) if index < len => Ok(index),
            _ => Err(ContainerError::OutOfRange {
                index: index.unwrap_or(len),
                len,
            }),
        }
    }

    /// Whether the cursor is still attached and undisturbed.
    pub fn is_valid(&self) -> bool {
        self.inspect(|_| Ok(())).is_ok()
    }

    /// Whether the cursor can no longer be used.
    pub fn is_orphaned(&self) -> bool {
        match self.inspect(|_| Ok(())) {
            Err(ContainerError::OrphanedCursor { .. }) => true,
            _ => self.object.strong_count() == 0,
        }
    }

    /// Whether the cursor sits one past the last entry in its direction.
    pub fn is_end(&self) -> Result<bool, ContainerError> {
        self.inspect(|object| {
            Ok(match self.direction {
                Direction::Forward => self.base == object.len(),
                Direction::Reverse => self.base == 0,
            })
        })
    }

    /// Index of the referenced entry.
    pub fn index(&self) -> Result<usize, ContainerError> {
        self.inspect(|object| self.element_index(object.len()))
    }

    /// Snapshot of the referenced entry.
    pub fn get(&self) -> Result<(K, V), ContainerError>
    where
        K: Clone,
        V: Clone,
    {
        self.inspect(|object| {
            let index = self.element_index(object.len())?;
            Ok((object.keys.at(index)?, object.values.at(index)?))
        })
    }

    /// Copy of the referenced key.
    pub fn key(&self) -> Result<K, ContainerError>
    where
        K: Clone,
    {
        self.inspect(|object| object.keys.at(self.element_index(object.len())?))
    }

    /// Copy of the referenced value.
    pub fn value(&self) -> Result<V, ContainerError>
    where
        V: Clone,
    {
        self.inspect(|object| object.values.at(self.element_index(object.len())?))
    }

    /// Step one entry in the traversal direction.
    pub fn advance(&mut self) -> Result<(), ContainerError> {
        self.seek(1)
    }

    /// Step one entry against the traversal direction.
    pub fn retreat(&mut self) -> Result<(), ContainerError> {
        self.seek(-1)
    }

    /// Move `delta` entries in the traversal direction, staying within
    /// `[begin, end]`.
    pub fn seek(&mut self, delta: isize) -> Result<(), ContainerError> {
        let base = self.inspect(|object| {
            let len = object.len();
            let step = match self.direction {
                Direction::Forward => delta,
                Direction::Reverse => delta.checked_neg().unwrap_or(isize::MAX),
            };
            match self.base.checked_add_signed(step) {
                Some(target) if target <= len => Ok(target),
                target => Err(ContainerError::OutOfRange {
                    index: target.unwrap_or(usize::MAX),
                    len,
                }),
            }
        })?;
        self.base = base;
        Ok(())
    }

    /// Signed number of steps from `self` to `other` in traversal order.
    pub fn distance_to(&self, other: &Self) -> Result<isize, ContainerError> {
        if !Weak::ptr_eq(&self.object, &other.object) || self.direction != other.direction {
            return Err(ContainerError::ForeignCursor);
        }
        self.inspect(|object| {
            other.validate(object)?;
            let forward = other.base as isize - self.base as isize;
            Ok(match self.direction {
                Direction::Forward => forward,
                Direction::Reverse => -forward,
            })
        })
    }

    /// Order two cursors of the same sorted list by traversal position.
    pub fn compare(&self, other: &Self) -> Result<Ordering, ContainerError> {
        Ok(self.distance_to(other)?.cmp(&0).reverse())
    }
}

impl<K, V, C, A: Allocator<K>> Clone for SortedCursor<K, V, C, A> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            direction: self.direction,
            base: self.base,
            #[cfg(debug_assertions)]
            generation: self.generation.clone(),
        }
    }
}

impl<K, V, C, A: Allocator<K>> Default for SortedCursor<K, V, C, A> {
    fn default() -> Self {
        Self::orphan()
    }
}

impl<K, V, C, A: Allocator<K>> fmt::Debug for SortedCursor<K, V, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedCursor")
            .field("direction", &self.direction)
            .field("base", &self.base)
            .field("generation", &self.generation())
            .finish()
    }
}

/// Iterator over `(key, value)` snapshots.
///
/// # Panics
///
/// `next` panics if the sorted list is structurally changed at or before
/// the iterator's position while iteration is in progress.
pub struct SortedIter<K, V, C = Natural, A: Allocator<K> = Global> {
    cursor: SortedCursor<K, V, C, A>,
}

impl<K, V, C, A: Allocator<K>> SortedIter<K, V, C, A> {
    pub(crate) fn new(cursor: SortedCursor<K, V, C, A>) -> Self {
        Self { cursor }
    }

    /// The cursor driving this iterator.
    pub fn cursor(&self) -> &SortedCursor<K, V, C, A> {
        &self.cursor
    }
}

impl<K: Clone, V: Clone, C, A: Allocator<K>> Iterator for SortedIter<K, V, C, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        match self.cursor.is_end() {
            Ok(true) => return None,
            Ok(false) => {}
            Err(err) => panic!("sorted list iterator invalidated: {err}"),
        }
        let entry = self
            .cursor
            .get()
            .unwrap_or_else(|err| panic!("sorted list iterator invalidated: {err}"));
        self.cursor
            .advance()
            .unwrap_or_else(|err| panic!("sorted list iterator invalidated: {err}"));
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .cursor
            .inspect(|object| {
                Ok(match self.cursor.direction {
                    Direction::Forward => object.len().saturating_sub(self.cursor.base),
                    Direction::Reverse => self.cursor.base,
                })
            })
            .unwrap_or(0);
        (remaining, Some(remaining))
    }
}

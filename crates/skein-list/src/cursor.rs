//! Checked positions inside a list.
//!
//! A [`Cursor`] is a non-owning position inside a [`List`](crate::List):
//! it does not count as a handle and does not keep the header alive. It
//! is adopted at the header's current generation and revalidated on every
//! access. In debug builds, any structural mutation that disturbed the
//! cursor's position orphans it; in release builds the cursor only checks
//! that its position is still inside the live range.
//!
//! Reverse cursors follow the usual base-position convention: a reverse
//! cursor with base `b` refers to element `b - 1`, and the reverse end has
//! base 0.

#[cfg(debug_assertions)]
use std::cell::Cell;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

use skein_core::{Allocator, ContainerError, Global};

use crate::object::ListObject;

/// Traversal direction of a cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Front to back.
    Forward,
    /// Back to front.
    Reverse,
}

/// A validated position inside a [`List`](crate::List).
pub struct Cursor<T, A: Allocator<T> = Global> {
    object: Weak<RefCell<ListObject<T, A>>>,
    direction: Direction,
    base: usize,
    #[cfg(debug_assertions)]
    generation: Cell<u64>,
}

impl<T, A: Allocator<T>> Cursor<T, A> {
    /// A cursor that was never attached to a list.
    ///
    /// Every operation on it fails with [`ContainerError::OrphanedCursor`].
    pub fn orphan() -> Self {
        Self {
            object: Weak::new(),
            direction: Direction::Forward,
            base: 0,
            #[cfg(debug_assertions)]
            generation: Cell::new(0),
        }
    }

    /// Attach a cursor to `object` at its current generation.
    pub(crate) fn adopt(
        object: &Rc<RefCell<ListObject<T, A>>>,
        #[cfg_attr(not(debug_assertions), allow(unused_variables))] current: &ListObject<T, A>,
        direction: Direction,
        base: usize,
    ) -> Self {
        Self {
            object: Rc::downgrade(object),
            direction,
            base,
            #[cfg(debug_assertions)]
            generation: Cell::new(current.tracker().generation()),
        }
    }

    /// Traversal direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether this cursor refers to the header behind `object`.
    pub(crate) fn belongs_to(&self, object: &Rc<RefCell<ListObject<T, A>>>) -> bool {
        std::ptr::eq(self.object.as_ptr(), Rc::as_ptr(object))
    }

    /// The generation this cursor was last validated against.
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

    fn orphaned(&self, current_generation: u64) -> ContainerError {
        ContainerError::OrphanedCursor {
            cursor_generation: self.generation(),
            current_generation,
        }
    }

    /// Upgrade to the header, failing if it no longer exists.
    fn upgrade(&self) -> Result<Rc<RefCell<ListObject<T, A>>>, ContainerError> {
        self.object.upgrade().ok_or_else(|| self.orphaned(0))
    }

    /// Check this cursor against a borrowed header and refresh its generation.
    pub(crate) fn validate(&self, object: &ListObject<T, A>) -> Result<(), ContainerError> {
        #[cfg(debug_assertions)]
        {
            let current = object.tracker().check(self.generation.get(), self.base)?;
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

    /// Run `f` against the validated header.
    fn inspect<R>(
        &self,
        f: impl FnOnce(&ListObject<T, A>) -> Result<R, ContainerError>,
    ) -> Result<R, ContainerError> {
        let object = self.upgrade()?;
        let borrowed = object
            .try_borrow()
            .map_err(|_| ContainerError::BorrowConflict)?;
        self.validate(&borrowed)?;
        f(&borrowed)
    }

    /// Index of the element this cursor refers to, given the live length.
    pub(crate) fn element_index(&self, len: usize) -> Result<usize, ContainerError> {
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

    /// Base position in physical index space.
    ///
    /// For forward cursors this is the element index; for reverse cursors
    /// it is one past the element index.
    pub fn base(&self) -> usize {
        self.base
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

    /// Whether the cursor sits one past the last element in its direction.
    pub fn is_end(&self) -> Result<bool, ContainerError> {
        self.inspect(|object| {
            Ok(match self.direction {
                Direction::Forward => self.base == object.len(),
                Direction::Reverse => self.base == 0,
            })
        })
    }

    /// Index of the referenced element.
    pub fn index(&self) -> Result<usize, ContainerError> {
        self.inspect(|object| self.element_index(object.len()))
    }

    /// Offset from the start of traversal (0 at `begin`, `len` at `end`).
    pub fn position(&self) -> Result<usize, ContainerError> {
        self.inspect(|object| {
            Ok(match self.direction {
                Direction::Forward => self.base,
                Direction::Reverse => object.len() - self.base,
            })
        })
    }

    /// Copy of the referenced element.
    pub fn get(&self) -> Result<T, ContainerError>
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Apply `f` to the referenced element.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, ContainerError> {
        self.inspect(|object| {
            let index = self.element_index(object.len())?;
            Ok(f(&object.as_slice()[index]))
        })
    }

    /// Apply `f` to the referenced element mutably.
    ///
    /// This does not change the list's structure and does not invalidate
    /// other cursors.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, ContainerError> {
        let object = self.upgrade()?;
        let mut borrowed = object
            .try_borrow_mut()
            .map_err(|_| ContainerError::BorrowConflict)?;
        self.validate(&borrowed)?;
        let index = self.element_index(borrowed.len())?;
        Ok(f(&mut borrowed.as_mut_slice()[index]))
    }

    /// Step one element in the traversal direction.
    ///
    /// Stepping past the end is a range error.
    pub fn advance(&mut self) -> Result<(), ContainerError> {
        self.seek(1)
    }

    /// Step one element against the traversal direction.
    pub fn retreat(&mut self) -> Result<(), ContainerError> {
        self.seek(-1)
    }

    /// Move `delta` elements in the traversal direction.
    ///
    /// The target must lie within `[begin, end]`; otherwise the cursor is
    /// left where it was and a range error is returned.
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
    ///
    /// Both cursors must belong to the same list and share a direction.
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

    /// Order two cursors of the same list by traversal position.
    pub fn compare(&self, other: &Self) -> Result<Ordering, ContainerError> {
        Ok(self.distance_to(other)?.cmp(&0).reverse())
    }
}

impl<T, A: Allocator<T>> Clone for Cursor<T, A> {
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

impl<T, A: Allocator<T>> Default for Cursor<T, A> {
    fn default() -> Self {
        Self::orphan()
    }
}

impl<T, A: Allocator<T>> fmt::Debug for Cursor<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("direction", &self.direction)
            .field("base", &self.base)
            .field("generation", &self.generation())
            .field("attached", &(self.object.strong_count() > 0))
            .finish()
    }
}

/// Iterator over copies of a list's elements, driven by a [`Cursor`].
///
/// # Panics
///
/// `next` panics if the list is structurally mutated in a way that
/// disturbs the iterator's position while iteration is in progress.
pub struct Iter<T, A: Allocator<T> = Global> {
    cursor: Cursor<T, A>,
}

impl<T, A: Allocator<T>> Iter<T, A> {
    pub(crate) fn new(cursor: Cursor<T, A>) -> Self {
        Self { cursor }
    }

    /// The cursor driving this iterator.
    pub fn cursor(&self) -> &Cursor<T, A> {
        &self.cursor
    }
}

impl<T: Clone, A: Allocator<T>> Iterator for Iter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self.cursor.is_end() {
            Ok(true) => return None,
            Ok(false) => {}
            Err(err) => panic!("list iterator invalidated: {err}"),
        }
        let value = self
            .cursor
            .get()
            .unwrap_or_else(|err| panic!("list iterator invalidated: {err}"));
        self.cursor
            .advance()
            .unwrap_or_else(|err| panic!("list iterator invalidated: {err}"));
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .cursor
            .inspect(|object| {
                Ok(match self.cursor.direction {
                    Direction::Forward => object.len() - self.cursor.base,
                    Direction::Reverse => self.cursor.base,
                })
            })
            .unwrap_or(0);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use crate::List;

    use super::*;

    #[test]
    fn forward_walk() {
        let list: List<u32> = [1, 2, 3].into();
        let mut cursor = list.begin();
        assert_eq!(cursor.get().unwrap(), 1);
        cursor.advance().unwrap();
        assert_eq!(cursor.get().unwrap(), 2);
        cursor.advance().unwrap();
        cursor.advance().unwrap();
        assert!(cursor.is_end().unwrap());
        assert!(cursor.get().unwrap_err().is_range());
        assert!(cursor.advance().unwrap_err().is_range());
    }

    #[test]
    fn reverse_walk() {
        let list: List<u32> = [1, 2, 3].into();
        let mut cursor = list.rbegin();
        assert_eq!(cursor.index().unwrap(), 2);
        assert_eq!(cursor.get().unwrap(), 3);
        cursor.advance().unwrap();
        assert_eq!(cursor.get().unwrap(), 2);
        cursor.seek(2).unwrap();
        assert!(cursor.is_end().unwrap());
        assert_eq!(cursor.position().unwrap(), 3);
    }

    #[test]
    fn seek_out_of_bounds_leaves_cursor_in_place() {
        let list: List<u32> = [1, 2, 3].into();
        let mut cursor = list.begin();
        assert!(cursor.seek(4).unwrap_err().is_range());
        assert!(cursor.seek(-1).unwrap_err().is_range());
        assert_eq!(cursor.position().unwrap(), 0);
    }

    #[test]
    fn distance_and_compare() {
        let list: List<u32> = [1, 2, 3, 4].into();
        let begin = list.begin();
        let end = list.end();
        assert_eq!(begin.distance_to(&end).unwrap(), 4);
        assert_eq!(end.distance_to(&begin).unwrap(), -4);
        assert_eq!(begin.compare(&end).unwrap(), Ordering::Less);
        assert_eq!(end.compare(&end.clone()).unwrap(), Ordering::Equal);

        let rbegin = list.rbegin();
        let rend = list.rend();
        assert_eq!(rbegin.distance_to(&rend).unwrap(), 4);
    }

    #[test]
    fn cursors_from_different_lists_are_foreign() {
        let a: List<u32> = [1].into();
        let b: List<u32> = [1].into();
        assert_eq!(
            a.begin().distance_to(&b.begin()).unwrap_err(),
            ContainerError::ForeignCursor
        );
        assert_eq!(
            a.begin().distance_to(&a.rbegin()).unwrap_err(),
            ContainerError::ForeignCursor
        );
    }

    #[test]
    fn orphan_cursor_fails_every_operation() {
        let mut cursor = Cursor::<u32>::orphan();
        assert!(cursor.is_orphaned());
        assert!(!cursor.is_valid());
        assert!(cursor.get().unwrap_err().is_logic());
        assert!(cursor.advance().unwrap_err().is_logic());
    }

    #[test]
    fn cursor_outliving_list_is_orphaned() {
        let cursor = {
            let list: List<u32> = [1, 2].into();
            list.begin()
        };
        assert!(cursor.is_orphaned());
        assert!(matches!(
            cursor.get(),
            Err(ContainerError::OrphanedCursor { .. })
        ));
    }

    #[test]
    fn with_mut_edits_in_place() {
        let list: List<u32> = [1, 2].into();
        let cursor = list.begin();
        cursor.with_mut(|v| *v = 10).unwrap();
        assert_eq!(list.to_vec(), vec![10, 2]);
        assert!(cursor.is_valid());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn erase_orphans_cursors_at_or_after_span() {
        let list: List<u32> = [1, 2, 3, 4].into();
        let before = list.begin();
        let mut at = list.begin();
        at.seek(2).unwrap();
        let mut after = list.begin();
        after.seek(3).unwrap();

        list.erase(2).unwrap();

        assert_eq!(before.get().unwrap(), 1);
        assert!(at.is_orphaned());
        assert!(after.get().unwrap_err().is_logic());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn add_without_growth_keeps_element_cursors() {
        let list = List::with_capacity(4).unwrap();
        list.add(1u32).unwrap();
        let first = list.begin();
        let end = list.end();
        list.add(2).unwrap();
        assert_eq!(first.get().unwrap(), 1);
        assert!(end.is_orphaned());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn growth_orphans_every_cursor() {
        let list = List::with_capacity(1).unwrap();
        list.add(1u32).unwrap();
        let first = list.begin();
        list.add(2).unwrap();
        assert!(first.is_orphaned());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn clear_orphans_every_cursor() {
        let list: List<u32> = [1, 2, 3].into();
        let first = list.begin();
        let end = list.end();
        list.clear().unwrap();
        assert!(first.is_orphaned());
        assert!(end.is_orphaned());
    }

    #[test]
    fn iterator_yields_clones_in_order() {
        let list: List<String> = ["a", "b", "c"].map(String::from).into();
        let collected: Vec<String> = list.iter().collect();
        assert_eq!(collected, ["a", "b", "c"]);
        let reversed: Vec<String> = list.iter_rev().collect();
        assert_eq!(reversed, ["c", "b", "a"]);
        assert_eq!(list.iter().size_hint(), (3, Some(3)));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "list iterator invalidated")]
    fn iterator_panics_when_list_mutated_underneath() {
        let list: List<u32> = [1, 2, 3].into();
        let mut iter = list.iter();
        iter.next();
        list.insert(0, 0).unwrap();
        iter.next();
    }
}

//! Reference-counted dynamic array handle.
//!
//! A [`List`] is a cheap handle onto a shared header. Cloning a handle
//! aliases the same elements (the header's reference count goes up by
//! one); a deep copy is only made on request through
//! [`List::duplicate`] or [`List::duplicate_in`]. Moving a handle
//! transfers it without touching the count.
//!
//! ```
//! use skein_list::List;
//!
//! let a: List<u32> = List::new();
//! a.add(1).unwrap();
//! let b = a.clone();
//! a.add(2).unwrap();
//! assert_eq!(b, [1, 2]);
//! assert_eq!(a.ref_count(), 2);
//! ```
//!
//! Mutation goes through `&self`. Element guards returned by
//! [`get_mut`](List::get_mut) and [`view_mut`](List::view_mut) hold the
//! header exclusively; structural mutations attempted while any guard is
//! alive fail with [`ContainerError::BorrowConflict`]. Read accessors such
//! as [`len`](List::len) and [`view`](List::view) panic if a mutable guard
//! is alive, following [`RefCell`] semantics.

use std::cell::{Ref, RefCell, RefMut};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::rc::Rc;

use skein_core::{Allocator, Comparator, ContainerConfig, ContainerError, Global};

use crate::cursor::{Cursor, Direction, Iter};
use crate::object::{ListObject, Staging};

/// Shared-ownership dynamic array.
pub struct List<T, A: Allocator<T> = Global> {
    object: Rc<RefCell<ListObject<T, A>>>,
}

impl<T> List<T, Global> {
    /// An empty list with no storage.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// An empty list with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<Self, ContainerError> {
        Self::with_capacity_in(capacity, Global)
    }

    /// A list holding `count` copies of `value`.
    pub fn filled(count: usize, value: T) -> Result<Self, ContainerError>
    where
        T: Clone,
    {
        Self::filled_in(count, value, Global)
    }
}

impl<T, A: Allocator<T>> List<T, A> {
    fn from_object(object: ListObject<T, A>) -> Self {
        Self {
            object: Rc::new(RefCell::new(object)),
        }
    }

    /// An empty list using `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self::with_config_in(ContainerConfig::default(), alloc)
    }

    /// An empty list using `alloc` and `config`.
    pub fn with_config_in(config: ContainerConfig, alloc: A) -> Self {
        Self::from_object(ListObject::new(alloc, config))
    }

    /// An empty list with room for `capacity` elements, using `alloc` and
    /// the default configuration.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, ContainerError> {
        let object = ListObject::with_capacity(capacity, alloc, ContainerConfig::default())?;
        Ok(Self::from_object(object))
    }

    /// A list holding `count` copies of `value`, using `alloc` and the
    /// default configuration.
    pub fn filled_in(count: usize, value: T, alloc: A) -> Result<Self, ContainerError>
    where
        T: Clone,
    {
        let list = Self::with_capacity_in(count, alloc)?;
        list.add_range(std::iter::repeat_n(value, count))?;
        Ok(list)
    }

    /// A list built from `iter`, using `alloc` and the default configuration.
    ///
    /// If the iterator reports an exact length the storage is sized once up
    /// front; otherwise it grows as elements arrive.
    pub fn from_iter_in<I>(iter: I, alloc: A) -> Result<Self, ContainerError>
    where
        I: IntoIterator<Item = T>,
    {
        let iter = iter.into_iter();
        let mut object = match iter.size_hint() {
            (lower, Some(upper)) if lower == upper => {
                ListObject::with_capacity(lower, alloc, ContainerConfig::default())?
            }
            _ => ListObject::new(alloc, ContainerConfig::default()),
        };
        for value in iter {
            object.push(value)?;
        }
        Ok(Self::from_object(object))
    }

    /// A list copied from the half-open cursor range `[first, last)` of
    /// another list, using `alloc`.
    ///
    /// The copy gets the default configuration, not the source's; use
    /// [`duplicate_in`](Self::duplicate_in) to carry it over.
    ///
    /// The distance between the cursors is known up front, so storage is
    /// sized once.
    pub fn from_cursors_in<B>(
        first: &Cursor<T, B>,
        last: &Cursor<T, B>,
        alloc: A,
    ) -> Result<Self, ContainerError>
    where
        T: Clone,
        B: Allocator<T>,
    {
        let count = first.distance_to(last)?;
        let count = usize::try_from(count).map_err(|_| ContainerError::OutOfRange {
            index: last.base(),
            len: first.base(),
        })?;
        let mut object = ListObject::with_capacity(count, alloc, ContainerConfig::default())?;
        let mut cursor = first.clone();
        for _ in 0..count {
            object.push(cursor.get()?)?;
            cursor.advance()?;
        }
        Ok(Self::from_object(object))
    }

    fn object(&self) -> Ref<'_, ListObject<T, A>> {
        self.object.borrow()
    }

    fn object_mut(&self) -> Result<RefMut<'_, ListObject<T, A>>, ContainerError> {
        self.object
            .try_borrow_mut()
            .map_err(|_| ContainerError::BorrowConflict)
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.object().len()
    }

    /// Whether the list has no live elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements the current storage can hold.
    pub fn capacity(&self) -> usize {
        self.object().capacity()
    }

    /// Largest length the allocator can represent.
    pub fn max_len(&self) -> usize {
        self.object().max_len()
    }

    /// Number of handles sharing this list's header.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.object)
    }

    /// Whether two handles share one header.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.object, &other.object)
    }

    /// A copy of the allocator this list draws from.
    pub fn allocator(&self) -> A {
        self.object().allocator().clone()
    }

    /// The list's configuration.
    pub fn config(&self) -> ContainerConfig {
        self.object().config().clone()
    }

    /// Borrow the live elements.
    pub fn view(&self) -> Ref<'_, [T]> {
        Ref::map(self.object(), |object| object.as_slice())
    }

    /// Borrow the live elements mutably.
    ///
    /// Fails with [`ContainerError::BorrowConflict`] if any other guard is alive.
    pub fn view_mut(&self) -> Result<RefMut<'_, [T]>, ContainerError> {
        Ok(RefMut::map(self.object_mut()?, |object| object.as_mut_slice()))
    }

    /// Borrow the element at `index`.
    pub fn get(&self, index: usize) -> Result<Ref<'_, T>, ContainerError> {
        let object = self
            .object
            .try_borrow()
            .map_err(|_| ContainerError::BorrowConflict)?;
        let len = object.len();
        if index >= len {
            return Err(ContainerError::OutOfRange { index, len });
        }
        Ok(Ref::map(object, |object| &object.as_slice()[index]))
    }

    /// Borrow the element at `index` mutably.
    pub fn get_mut(&self, index: usize) -> Result<RefMut<'_, T>, ContainerError> {
        let object = self.object_mut()?;
        let len = object.len();
        if index >= len {
            return Err(ContainerError::OutOfRange { index, len });
        }
        Ok(RefMut::map(object, |object| &mut object.as_mut_slice()[index]))
    }

    /// Copy of the element at `index`.
    pub fn at(&self, index: usize) -> Result<T, ContainerError>
    where
        T: Clone,
    {
        Ok(self.get(index)?.clone())
    }

    /// Borrow the first element.
    pub fn first(&self) -> Result<Ref<'_, T>, ContainerError> {
        self.get(0)
    }

    /// Borrow the last element.
    pub fn last(&self) -> Result<Ref<'_, T>, ContainerError> {
        let len = self.len();
        self.get(len.checked_sub(1).ok_or(ContainerError::OutOfRange { index: 0, len })?)
    }

    /// Copy the live elements into a `Vec`.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.view().to_vec()
    }

    /// Whether any element equals `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.view().contains(value)
    }

    /// Index of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.view().iter().position(|probe| probe == value)
    }

    /// Append `value`.
    pub fn add(&self, value: T) -> Result<(), ContainerError> {
        self.object_mut()?.push(value)
    }

    /// Append every element of `values`.
    ///
    /// The source is drained into a staging area before the list is
    /// touched, so a failure leaves the list unchanged.
    pub fn add_range<I>(&self, values: I) -> Result<(), ContainerError>
    where
        I: IntoIterator<Item = T>,
    {
        let staged: Staging<T> = values.into_iter().collect();
        self.object_mut()?.push_many(staged)
    }

    /// Construct an element with `make` and append it.
    pub fn emplace_back(&self, make: impl FnOnce() -> T) -> Result<(), ContainerError> {
        let value = make();
        self.object_mut()?.push(value)
    }

    /// Insert `value` before `index`.
    ///
    /// Positions at or past the end append. Returns the index the value
    /// landed at.
    pub fn insert(&self, index: usize, value: T) -> Result<usize, ContainerError> {
        self.object_mut()?.insert(index, value)
    }

    /// Insert every element of `values` before `index`, preserving their order.
    ///
    /// All-or-nothing: the source is drained before the list is touched.
    pub fn insert_range<I>(&self, index: usize, values: I) -> Result<usize, ContainerError>
    where
        I: IntoIterator<Item = T>,
    {
        let staged: Staging<T> = values.into_iter().collect();
        self.object_mut()?.insert_many(index, staged)
    }

    /// Construct an element with `make` and insert it before `index`.
    ///
    /// `make` runs before the list is borrowed, so it may read the list.
    pub fn emplace(&self, index: usize, make: impl FnOnce() -> T) -> Result<usize, ContainerError> {
        let value = make();
        self.object_mut()?.insert(index, value)
    }

    /// Insert `value` before the position of `cursor`, in the cursor's own
    /// direction of travel, and return a cursor of the same direction to
    /// the new element.
    ///
    /// The element always lands at `cursor.base()`. In reverse order that
    /// puts it just ahead of the element the cursor was reading.
    pub fn insert_at(&self, cursor: &Cursor<T, A>, value: T) -> Result<Cursor<T, A>, ContainerError> {
        self.check_cursor(cursor)?;
        let mut object = self.object_mut()?;
        cursor.validate(&object)?;
        let index = object.insert(cursor.base(), value)?;
        let base = match cursor.direction() {
            Direction::Forward => index,
            Direction::Reverse => index + 1,
        };
        Ok(Cursor::adopt(&self.object, &object, cursor.direction(), base))
    }

    /// Destroy the element at `index` and construct `value` in its place.
    pub fn replace(&self, index: usize, value: T) -> Result<(), ContainerError> {
        self.object_mut()?.replace(index, value)
    }

    /// Remove the element at `index`, shifting later elements left.
    pub fn erase(&self, index: usize) -> Result<(), ContainerError> {
        let end = index.checked_add(1).ok_or(ContainerError::OutOfRange {
            index,
            len: self.len(),
        })?;
        self.object_mut()?.erase(index, end)
    }

    /// Remove every element in `range`, shifting later elements left.
    pub fn erase_range(&self, range: impl RangeBounds<usize>) -> Result<(), ContainerError> {
        let mut object = self.object_mut()?;
        let len = object.len();
        let start = match range.start_bound() {
            Bound::Included(&start) => start,
            Bound::Excluded(&start) => start
                .checked_add(1)
                .ok_or(ContainerError::OutOfRange { index: start, len })?,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => end
                .checked_add(1)
                .ok_or(ContainerError::OutOfRange { index: end, len })?,
            Bound::Excluded(&end) => end,
            Bound::Unbounded => len,
        };
        object.erase(start, end)
    }

    /// Remove the element under `cursor` and return a cursor to the
    /// element that followed it.
    pub fn erase_at(&self, cursor: &Cursor<T, A>) -> Result<Cursor<T, A>, ContainerError> {
        self.check_cursor(cursor)?;
        let mut object = self.object_mut()?;
        cursor.validate(&object)?;
        let index = cursor.element_index(object.len())?;
        object.erase(index, index + 1)?;
        // Both directions land on base `index`: forward on the shifted
        // successor, reverse on the element before the erased one.
        Ok(Cursor::adopt(&self.object, &object, cursor.direction(), index))
    }

    /// Remove the last `count` elements without shifting.
    pub fn cut(&self, count: usize) -> Result<(), ContainerError> {
        self.object_mut()?.cut(count)
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Result<Option<T>, ContainerError> {
        Ok(self.object_mut()?.pop())
    }

    /// Destroy every element, keeping the storage.
    pub fn clear(&self) -> Result<(), ContainerError> {
        self.object_mut()?.clear();
        Ok(())
    }

    /// Grow capacity geometrically so that at least `min_capacity` fits.
    pub fn ensure_capacity(&self, min_capacity: usize) -> Result<(), ContainerError> {
        self.object_mut()?.ensure_capacity(min_capacity)
    }

    /// Grow capacity to exactly `capacity` if it is currently smaller.
    pub fn reserve(&self, capacity: usize) -> Result<(), ContainerError> {
        self.object_mut()?.reserve(capacity)
    }

    /// Shrink capacity to the live length.
    pub fn trim(&self) -> Result<(), ContainerError> {
        self.object_mut()?.trim()
    }

    /// Binary search an ascending list for `value`.
    ///
    /// Returns the index of a matching element, or the bitwise complement
    /// of the index where `value` would be inserted to keep the order.
    pub fn binary_search(&self, value: &T) -> isize
    where
        T: Ord,
    {
        self.binary_search_by(|probe| probe.cmp(value))
    }

    /// Binary search a list ordered by `comparator` for `value`.
    pub fn binary_search_with<C>(&self, value: &T, comparator: &C) -> isize
    where
        C: Comparator<T> + ?Sized,
    {
        self.binary_search_by(|probe| comparator.compare(probe, value))
    }

    /// Binary search with a probe function returning the probe's order
    /// relative to the target.
    pub fn binary_search_by<F>(&self, probe: F) -> isize
    where
        F: FnMut(&T) -> Ordering,
    {
        match self.view().binary_search_by(probe) {
            Ok(index) => index as isize,
            Err(insertion) => !(insertion as isize),
        }
    }

    /// Deep copy using a clone of this list's allocator.
    pub fn duplicate(&self) -> Result<Self, ContainerError>
    where
        T: Clone,
    {
        self.duplicate_in(self.allocator())
    }

    /// Deep copy into new storage drawn from `alloc`.
    pub fn duplicate_in<B>(&self, alloc: B) -> Result<List<T, B>, ContainerError>
    where
        T: Clone,
        B: Allocator<T>,
    {
        let copy = self.object().duplicate_in(alloc)?;
        Ok(List::from_object(copy))
    }

    fn check_cursor(&self, cursor: &Cursor<T, A>) -> Result<(), ContainerError> {
        if !cursor.belongs_to(&self.object) {
            return Err(ContainerError::ForeignCursor);
        }
        Ok(())
    }

    fn cursor_at(&self, direction: Direction, base: usize) -> Cursor<T, A> {
        Cursor::adopt(&self.object, &self.object(), direction, base)
    }

    /// Forward cursor at the first element.
    pub fn begin(&self) -> Cursor<T, A> {
        self.cursor_at(Direction::Forward, 0)
    }

    /// Forward cursor one past the last element.
    pub fn end(&self) -> Cursor<T, A> {
        let len = self.len();
        self.cursor_at(Direction::Forward, len)
    }

    /// Reverse cursor at the last element.
    pub fn rbegin(&self) -> Cursor<T, A> {
        let len = self.len();
        self.cursor_at(Direction::Reverse, len)
    }

    /// Reverse cursor one before the first element.
    pub fn rend(&self) -> Cursor<T, A> {
        self.cursor_at(Direction::Reverse, 0)
    }

    /// Iterate over copies of the elements, front to back.
    pub fn iter(&self) -> Iter<T, A> {
        Iter::new(self.begin())
    }

    /// Iterate over copies of the elements, back to front.
    pub fn iter_rev(&self) -> Iter<T, A> {
        Iter::new(self.rbegin())
    }
}

impl<T, A: Allocator<T>> Clone for List<T, A> {
    /// Shallow copy: the new handle aliases the same header.
    fn clone(&self) -> Self {
        Self {
            object: Rc::clone(&self.object),
        }
    }
}

impl<T, A: Allocator<T> + Default> Default for List<T, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: fmt::Debug, A: Allocator<T>> fmt::Debug for List<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.object.try_borrow() {
            Ok(object) => f.debug_list().entries(object.as_slice()).finish(),
            Err(_) => f.write_str("List { <borrowed> }"),
        }
    }
}

impl<T, A, U, B> PartialEq<List<U, B>> for List<T, A>
where
    T: PartialEq<U>,
    A: Allocator<T>,
    B: Allocator<U>,
{
    fn eq(&self, other: &List<U, B>) -> bool {
        *self.view() == *other.view()
    }
}

impl<T, A, U> PartialEq<[U]> for List<T, A>
where
    T: PartialEq<U>,
    A: Allocator<T>,
{
    fn eq(&self, other: &[U]) -> bool {
        *self.view() == *other
    }
}

impl<T, A, U, const N: usize> PartialEq<[U; N]> for List<T, A>
where
    T: PartialEq<U>,
    A: Allocator<T>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        *self.view() == other[..]
    }
}

impl<T, A, U> PartialEq<Vec<U>> for List<T, A>
where
    T: PartialEq<U>,
    A: Allocator<T>,
{
    fn eq(&self, other: &Vec<U>) -> bool {
        *self.view() == other[..]
    }
}

impl<T> FromIterator<T> for List<T, Global> {
    /// # Panics
    ///
    /// Panics if storage cannot be allocated.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iter_in(iter, Global)
            .unwrap_or_else(|err| panic!("list construction failed: {err}"))
    }
}

impl<T, A: Allocator<T>> Extend<T> for List<T, A> {
    /// # Panics
    ///
    /// Panics if storage cannot be allocated or the list is borrowed.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_range(iter)
            .unwrap_or_else(|err| panic!("list extension failed: {err}"));
    }
}

impl<T> From<Vec<T>> for List<T, Global> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T, const N: usize> From<[T; N]> for List<T, Global> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<T: Clone, A: Allocator<T>> IntoIterator for &List<T, A> {
    type Item = T;
    type IntoIter = Iter<T, A>;

    fn into_iter(self) -> Iter<T, A> {
        self.iter()
    }
}

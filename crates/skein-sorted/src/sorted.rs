//! Sorted key/value container.
//!
//! A [`SortedList`] keeps two parallel [`List`]s, one of keys and one of
//! values, co-sorted ascending by a [`Comparator`] over keys. Lookups are
//! binary searches over the key list; inserts land at the insertion
//! complement returned by the search, in both lists at once.
//!
//! Like [`List`], a `SortedList` is a shallow handle: cloning it aliases
//! the same entries. Read accessors that hand out plain data panic if a
//! value guard from [`get_mut`](SortedList::get_mut) or
//! [`ensure`](SortedList::ensure) is alive; guard-returning accessors and
//! every mutation report [`ContainerError::BorrowConflict`] instead.

use std::cell::{Ref, RefCell, RefMut};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use skein_core::{Allocator, Comparator, ContainerConfig, ContainerError, Global, Natural};
use skein_list::{Direction, IteratorTracker, List};

use crate::cursor::{SortedCursor, SortedIter};

/// State shared by every handle of one sorted list.
pub(crate) struct SortedObject<K, V, C, A: Allocator<K>> {
    pub(crate) keys: List<K, A>,
    pub(crate) values: List<V, <A as Allocator<K>>::Rebind<V>>,
    pub(crate) comparator: C,
    pub(crate) tracker: RefCell<IteratorTracker>,
}

impl<K, V, C, A: Allocator<K>> SortedObject<K, V, C, A> {
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    pub(crate) fn generation(&self) -> u64 {
        self.tracker.borrow().generation()
    }
}

/// Shared-ownership map ordered by a key comparator.
pub struct SortedList<K, V, C = Natural, A: Allocator<K> = Global> {
    object: Rc<SortedObject<K, V, C, A>>,
}

impl<K, V> SortedList<K, V, Natural, Global> {
    /// An empty sorted list ordered by `K`'s [`Ord`] implementation.
    pub fn new() -> Self {
        Self::new_in(Natural, Global)
    }

    /// An empty sorted list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Result<Self, ContainerError> {
        Self::with_capacity_in(capacity, Natural, Global)
    }
}

impl<K, V, C> SortedList<K, V, C, Global> {
    /// An empty sorted list ordered by `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        Self::new_in(comparator, Global)
    }
}

impl<K, V, C, A: Allocator<K>> SortedList<K, V, C, A> {
    /// An empty sorted list ordered by `comparator`, drawing storage from
    /// `alloc` (and its rebind for values).
    pub fn new_in(comparator: C, alloc: A) -> Self {
        Self::with_config_in(comparator, ContainerConfig::default(), alloc)
    }

    /// An empty sorted list with an explicit configuration.
    pub fn with_config_in(comparator: C, config: ContainerConfig, alloc: A) -> Self {
        let values = List::with_config_in(config.clone(), alloc.rebind::<V>());
        let keys = List::with_config_in(config.clone(), alloc);
        Self {
            object: Rc::new(SortedObject {
                keys,
                values,
                comparator,
                tracker: RefCell::new(IteratorTracker::new(&config)),
            }),
        }
    }

    /// An empty sorted list with room for `capacity` entries and the
    /// default configuration.
    pub fn with_capacity_in(capacity: usize, comparator: C, alloc: A) -> Result<Self, ContainerError> {
        let list = Self::new_in(comparator, alloc);
        list.object.values.reserve(capacity)?;
        list.object.keys.reserve(capacity)?;
        Ok(list)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.object.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries the current storage can hold.
    pub fn capacity(&self) -> usize {
        self.object.keys.capacity()
    }

    /// Number of handles sharing these entries.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.object)
    }

    /// Whether two handles share the same entries.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.object, &other.object)
    }

    /// The key comparator.
    pub fn comparator(&self) -> &C {
        &self.object.comparator
    }

    /// A copy of the key allocator.
    pub fn allocator(&self) -> A {
        self.object.keys.allocator()
    }

    /// Borrow the keys in ascending order.
    pub fn keys(&self) -> Ref<'_, [K]> {
        self.object.keys.view()
    }

    /// Borrow the values, ordered by their keys.
    ///
    /// # Panics
    ///
    /// Panics if a value guard is alive.
    pub fn values(&self) -> Ref<'_, [V]> {
        self.object.values.view()
    }

    /// Copy of the entry at `index`.
    pub fn entry_at(&self, index: usize) -> Result<(K, V), ContainerError>
    where
        K: Clone,
        V: Clone,
    {
        Ok((self.object.keys.at(index)?, self.object.values.at(index)?))
    }

    /// Copy of the entry with the smallest key.
    pub fn first(&self) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.entry_at(0).ok()
    }

    /// Copy of the entry with the largest key.
    pub fn last(&self) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.len().checked_sub(1).and_then(|index| self.entry_at(index).ok())
    }

    /// Fail before anything changes if either list is borrowed.
    fn exclusive(&self) -> Result<(), ContainerError> {
        let _keys = self.object.keys.view_mut()?;
        let _values = self.object.values.view_mut()?;
        Ok(())
    }

    fn invalidate_for(&self, capacity_before: usize, index: usize) {
        let mut tracker = self.object.tracker.borrow_mut();
        if self.object.keys.capacity() != capacity_before {
            tracker.invalidate_all();
        } else {
            tracker.invalidate_from(index);
        }
    }

    /// Insert a new entry at `index` in both lists.
    ///
    /// Storage for both lists is secured first, so once the key is in
    /// place the value insert cannot fail.
    fn insert_pair(&self, index: usize, key: K, value: V) -> Result<(), ContainerError> {
        self.exclusive()?;
        let object = &*self.object;
        let before = object.keys.capacity();
        let required = object.len().saturating_add(1);
        object.values.ensure_capacity(required)?;
        object.keys.ensure_capacity(required)?;
        object.keys.insert(index, key)?;
        object.values.insert(index, value)?;
        self.invalidate_for(before, index);
        Ok(())
    }

    /// Remove the entry at `index`.
    pub fn remove_at(&self, index: usize) -> Result<(), ContainerError> {
        let len = self.len();
        if index >= len {
            return Err(ContainerError::OutOfRange { index, len });
        }
        self.exclusive()?;
        self.object.keys.erase(index)?;
        self.object.values.erase(index)?;
        self.object.tracker.borrow_mut().invalidate_from(index);
        Ok(())
    }

    /// Remove every entry, keeping the storage.
    pub fn clear(&self) -> Result<(), ContainerError> {
        self.exclusive()?;
        self.object.keys.clear()?;
        self.object.values.clear()?;
        self.object.tracker.borrow_mut().invalidate_all();
        tracing::trace!("sorted list cleared");
        Ok(())
    }

    /// Grow both lists to hold exactly `capacity` entries if they are smaller.
    pub fn reserve(&self, capacity: usize) -> Result<(), ContainerError> {
        self.exclusive()?;
        let before = self.capacity();
        self.object.values.reserve(capacity)?;
        self.object.keys.reserve(capacity)?;
        if self.capacity() != before {
            self.object.tracker.borrow_mut().invalidate_all();
        }
        Ok(())
    }

    /// Shrink both lists to the live length.
    pub fn trim(&self) -> Result<(), ContainerError> {
        self.exclusive()?;
        let before = self.capacity();
        self.object.values.trim()?;
        self.object.keys.trim()?;
        if self.capacity() != before {
            self.object.tracker.borrow_mut().invalidate_all();
        }
        Ok(())
    }

    fn cursor_at(&self, direction: Direction, base: usize) -> SortedCursor<K, V, C, A> {
        SortedCursor::adopt(&self.object, direction, base)
    }

    /// Forward cursor at the smallest key.
    pub fn begin(&self) -> SortedCursor<K, V, C, A> {
        self.cursor_at(Direction::Forward, 0)
    }

    /// Forward cursor one past the largest key.
    pub fn end(&self) -> SortedCursor<K, V, C, A> {
        self.cursor_at(Direction::Forward, self.len())
    }

    /// Reverse cursor at the largest key.
    pub fn rbegin(&self) -> SortedCursor<K, V, C, A> {
        self.cursor_at(Direction::Reverse, self.len())
    }

    /// Reverse cursor one before the smallest key.
    pub fn rend(&self) -> SortedCursor<K, V, C, A> {
        self.cursor_at(Direction::Reverse, 0)
    }

    /// Iterate over `(key, value)` snapshots in ascending key order.
    pub fn iter(&self) -> SortedIter<K, V, C, A> {
        SortedIter::new(self.begin())
    }

    /// Iterate over `(key, value)` snapshots in descending key order.
    pub fn iter_rev(&self) -> SortedIter<K, V, C, A> {
        SortedIter::new(self.rbegin())
    }
}

impl<K, V, C: Comparator<K>, A: Allocator<K>> SortedList<K, V, C, A> {
    /// A sorted list holding `pairs`, which may arrive in any order, with
    /// the default configuration.
    ///
    /// Fails with [`ContainerError::DuplicateKey`] if two pairs share a key.
    pub fn from_iter_in<I>(pairs: I, comparator: C, alloc: A) -> Result<Self, ContainerError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let list = Self::new_in(comparator, alloc);
        list.assign_from_iter(pairs)?;
        Ok(list)
    }

    /// Position of `key`, or the complement of its insertion point.
    pub fn index_of(&self, key: &K) -> isize {
        self.object
            .keys
            .binary_search_with(key, &self.object.comparator)
    }

    fn find(&self, key: &K) -> Result<usize, usize> {
        let found = self.index_of(key);
        if found >= 0 {
            Ok(found as usize)
        } else {
            Err(!found as usize)
        }
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.index_of(key) >= 0
    }

    /// Borrow the value for `key`.
    pub fn get(&self, key: &K) -> Result<Ref<'_, V>, ContainerError> {
        let index = self.find(key).map_err(|_| ContainerError::KeyNotFound)?;
        self.object.values.get(index)
    }

    /// Borrow the value for `key` mutably.
    ///
    /// Editing a value in place does not disturb cursors.
    pub fn get_mut(&self, key: &K) -> Result<RefMut<'_, V>, ContainerError> {
        let index = self.find(key).map_err(|_| ContainerError::KeyNotFound)?;
        self.object.values.get_mut(index)
    }

    /// Copy of the value for `key`.
    ///
    /// Fails with [`ContainerError::KeyNotFound`] if `key` is absent.
    pub fn at(&self, key: &K) -> Result<V, ContainerError>
    where
        V: Clone,
    {
        Ok(self.get(key)?.clone())
    }

    /// Copy of the value for `key`, if present.
    ///
    /// # Panics
    ///
    /// Panics if a value guard is alive.
    pub fn try_get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let index = self.find(key).ok()?;
        Some(self.object.values.view()[index].clone())
    }

    /// Overwrite the value for `key` if it is present. Never inserts.
    ///
    /// Returns whether a value was written.
    pub fn try_set(&self, key: &K, value: V) -> Result<bool, ContainerError> {
        match self.find(key) {
            Ok(index) => {
                *self.object.values.get_mut(index)? = value;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    /// Insert a new entry.
    ///
    /// Fails with [`ContainerError::DuplicateKey`] if `key` is present.
    pub fn add(&self, key: K, value: V) -> Result<(), ContainerError> {
        self.make(key, || value)
    }

    /// Insert a new entry whose value is built by `make`.
    ///
    /// `make` only runs once the key is known to be absent.
    /// If `make` itself inserts `key`, this fails with
    /// [`ContainerError::DuplicateKey`] and the value `make` returned is
    /// dropped.
    pub fn make(&self, key: K, make: impl FnOnce() -> V) -> Result<(), ContainerError> {
        if self.find(&key).is_ok() {
            return Err(ContainerError::DuplicateKey);
        }
        let value = make();
        match self.find(&key) {
            Ok(_) => Err(ContainerError::DuplicateKey),
            Err(index) => self.insert_pair(index, key, value),
        }
    }

    /// Overwrite the value for `key`, or insert it where it belongs.
    ///
    /// Looks the key up afresh: a value closure that ran just before may
    /// have moved every entry. Returns the entry's index and whether a
    /// value was overwritten.
    fn settle(&self, key: K, value: V) -> Result<(usize, bool), ContainerError> {
        match self.find(&key) {
            Ok(index) => {
                *self.object.values.get_mut(index)? = value;
                Ok((index, true))
            }
            Err(index) => {
                self.insert_pair(index, key, value)?;
                Ok((index, false))
            }
        }
    }

    /// Insert or overwrite the entry for `key`.
    ///
    /// Returns whether an existing value was overwritten.
    pub fn update(&self, key: K, value: V) -> Result<bool, ContainerError> {
        self.restruct(key, || value)
    }

    /// Insert or overwrite the entry for `key` with a value built by `make`.
    pub fn restruct(&self, key: K, make: impl FnOnce() -> V) -> Result<bool, ContainerError> {
        let value = make();
        let (_, overwritten) = self.settle(key, value)?;
        Ok(overwritten)
    }

    /// Value guard for `key`, inserting `value` first if `key` is absent.
    pub fn ensure(&self, key: K, value: V) -> Result<RefMut<'_, V>, ContainerError> {
        self.establish(key, || value)
    }

    /// Value guard for `key`, inserting a value built by `make` first if
    /// `key` is absent.
    pub fn establish(
        &self,
        key: K,
        make: impl FnOnce() -> V,
    ) -> Result<RefMut<'_, V>, ContainerError> {
        let index = match self.find(&key) {
            Ok(index) => index,
            Err(_) => {
                let value = make();
                self.settle(key, value)?.0
            }
        };
        self.object.values.get_mut(index)
    }

    /// Value guard for `key`, inserting `V::default()` first if absent.
    pub fn ensure_default(&self, key: K) -> Result<RefMut<'_, V>, ContainerError>
    where
        V: Default,
    {
        self.establish(key, V::default)
    }

    /// Remove the entry for `key`. Returns whether one was removed.
    pub fn remove(&self, key: &K) -> Result<bool, ContainerError> {
        match self.find(key) {
            Ok(index) => {
                self.remove_at(index)?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    /// Replace every entry with copies of `other`'s entries.
    ///
    /// Assigning a list to itself (or to another handle of the same
    /// entries) is a no-op.
    pub fn assign(&self, other: &Self) -> Result<(), ContainerError>
    where
        K: Clone,
        V: Clone,
    {
        if self.ptr_eq(other) {
            return Ok(());
        }
        let pairs: Vec<(K, V)> = {
            let keys = other.keys();
            let values = other.values();
            keys.iter().cloned().zip(values.iter().cloned()).collect()
        };
        self.assign_from_iter(pairs)
    }

    /// Replace every entry with the pairs in the half-open cursor range
    /// `[first, last)` of another sorted list.
    pub fn assign_from_cursors<D, B>(
        &self,
        first: &SortedCursor<K, V, D, B>,
        last: &SortedCursor<K, V, D, B>,
    ) -> Result<(), ContainerError>
    where
        K: Clone,
        V: Clone,
        B: Allocator<K>,
    {
        let count = first.distance_to(last)?;
        let count = usize::try_from(count).map_err(|_| ContainerError::OutOfRange {
            index: last.base(),
            len: first.base(),
        })?;
        let mut pairs = Vec::with_capacity(count);
        let mut cursor = first.clone();
        for _ in 0..count {
            pairs.push(cursor.get()?);
            cursor.advance()?;
        }
        self.assign_from_iter(pairs)
    }

    /// Replace every entry with `pairs`, which may arrive in any order.
    ///
    /// The pairs are sorted and checked for duplicate keys before the
    /// current entries are touched; on any error the list is unchanged.
    pub fn assign_from_iter<I>(&self, pairs: I) -> Result<(), ContainerError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let comparator = &self.object.comparator;
        let mut pairs: Vec<(K, V)> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| comparator.compare(&a.0, &b.0));
        if pairs
            .windows(2)
            .any(|w| comparator.compare(&w[0].0, &w[1].0) == Ordering::Equal)
        {
            return Err(ContainerError::DuplicateKey);
        }
        self.exclusive()?;
        let count = pairs.len();
        self.object.values.reserve(count)?;
        self.object.keys.reserve(count)?;
        let (keys, values): (Vec<K>, Vec<V>) = pairs.into_iter().unzip();
        self.object.keys.clear()?;
        self.object.values.clear()?;
        self.object.keys.add_range(keys)?;
        self.object.values.add_range(values)?;
        self.object.tracker.borrow_mut().invalidate_all();
        tracing::trace!(entries = count, "sorted list reassigned");
        Ok(())
    }

    /// Deep copy with a clone of this list's allocator and comparator.
    pub fn duplicate(&self) -> Result<Self, ContainerError>
    where
        K: Clone,
        V: Clone,
        C: Clone,
    {
        self.duplicate_in(self.allocator())
    }

    /// Deep copy into storage drawn from `alloc`.
    pub fn duplicate_in<B>(&self, alloc: B) -> Result<SortedList<K, V, C, B>, ContainerError>
    where
        K: Clone,
        V: Clone,
        C: Clone,
        B: Allocator<K>,
    {
        let config = self.object.keys.config();
        let values = self.object.values.duplicate_in(alloc.rebind::<V>())?;
        let keys = self.object.keys.duplicate_in(alloc)?;
        Ok(SortedList {
            object: Rc::new(SortedObject {
                keys,
                values,
                comparator: self.object.comparator.clone(),
                tracker: RefCell::new(IteratorTracker::new(&config)),
            }),
        })
    }
}

impl<K, V, C, A: Allocator<K>> Clone for SortedList<K, V, C, A> {
    /// Shallow copy: the new handle aliases the same entries.
    fn clone(&self) -> Self {
        Self {
            object: Rc::clone(&self.object),
        }
    }
}

impl<K, V, C: Default, A: Allocator<K> + Default> Default for SortedList<K, V, C, A> {
    fn default() -> Self {
        Self::new_in(C::default(), A::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C, A: Allocator<K>> fmt::Debug for SortedList<K, V, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedList")
            .field("keys", &self.object.keys)
            .field("values", &self.object.values)
            .finish()
    }
}

impl<K: PartialEq, V: PartialEq, C, A: Allocator<K>> PartialEq for SortedList<K, V, C, A> {
    fn eq(&self, other: &Self) -> bool {
        self.object.keys == other.object.keys && self.object.values == other.object.values
    }
}

impl<K: Clone, V: Clone, C, A: Allocator<K>> IntoIterator for &SortedList<K, V, C, A> {
    type Item = (K, V);
    type IntoIter = SortedIter<K, V, C, A>;

    fn into_iter(self) -> SortedIter<K, V, C, A> {
        self.iter()
    }
}

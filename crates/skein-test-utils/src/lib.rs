//! Test utilities and instrumented types for Skein development.
//!
//! - [`DropCounter`] / [`Tracked`]: elements that report their destruction,
//!   for checking that containers drop each element exactly once.
//! - [`Reversed`]: a descending-order comparator.
//! - [`Flaky`]: an allocator that starts failing after a fixed number of
//!   successful allocations.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use skein_core::{Allocator, Comparator, ContainerError, Global, Storage};

/// Shared counter of dropped [`Tracked`] values.
#[derive(Clone, Default)]
pub struct DropCounter {
    dropped: Rc<Cell<usize>>,
}

impl DropCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `value` so that dropping it bumps this counter.
    pub fn track<T>(&self, value: T) -> Tracked<T> {
        Tracked {
            value,
            dropped: Rc::clone(&self.dropped),
        }
    }

    pub fn dropped(&self) -> usize {
        self.dropped.get()
    }
}

impl fmt::Debug for DropCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropCounter")
            .field("dropped", &self.dropped())
            .finish()
    }
}

/// A value whose drop is recorded by the [`DropCounter`] that created it.
///
/// Clones report to the same counter.
pub struct Tracked<T> {
    value: T,
    dropped: Rc<Cell<usize>>,
}

impl<T: Copy> Tracked<T> {
    pub fn value(&self) -> T {
        self.value
    }
}

impl<T: Clone> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            dropped: Rc::clone(&self.dropped),
        }
    }
}

impl<T: PartialEq> PartialEq for Tracked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for Tracked<T> {}

impl<T: PartialOrd> PartialOrd for Tracked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl<T: Ord> Ord for Tracked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tracked({:?})", self.value)
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.dropped.set(self.dropped.get() + 1);
    }
}

/// Orders keys from largest to smallest.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reversed;

impl<T: Ord + ?Sized> Comparator<T> for Reversed {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        b.cmp(a)
    }
}

/// Heap allocator that refuses every request once its allowance of
/// successful allocations is spent.
///
/// Clones and rebinds share the allowance, so a container and its
/// rebound siblings draw from one budget.
#[derive(Clone, Debug)]
pub struct Flaky {
    remaining: Rc<Cell<usize>>,
}

impl Flaky {
    /// Allow `allocations` successful calls to `allocate`.
    pub fn new(allocations: usize) -> Self {
        Self {
            remaining: Rc::new(Cell::new(allocations)),
        }
    }

    /// Top the allowance back up.
    pub fn refill(&self, allocations: usize) {
        self.remaining.set(allocations);
    }

    pub fn remaining(&self) -> usize {
        self.remaining.get()
    }
}

impl PartialEq for Flaky {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.remaining, &other.remaining)
    }
}

impl<T> Allocator<T> for Flaky {
    type Rebind<U> = Flaky;

    fn allocate(&self, len: usize) -> Result<Storage<T>, ContainerError> {
        let remaining = self.remaining.get();
        if remaining == 0 {
            return Err(ContainerError::AllocationFailed { requested: len });
        }
        let storage = Allocator::<T>::allocate(&Global, len)?;
        self.remaining.set(remaining - 1);
        Ok(storage)
    }

    fn deallocate(&self, storage: Storage<T>) {
        Allocator::<T>::deallocate(&Global, storage);
    }

    fn rebind<U>(&self) -> Flaky {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_counter_counts_clones() {
        let counter = DropCounter::new();
        let a = counter.track(1u8);
        let b = a.clone();
        drop(a);
        assert_eq!(counter.dropped(), 1);
        assert_eq!(b.value(), 1);
        drop(b);
        assert_eq!(counter.dropped(), 2);
    }

    #[test]
    fn reversed_orders_descending() {
        assert_eq!(Reversed.compare(&1, &2), Ordering::Greater);
        assert_eq!(Reversed.compare("b", "a"), Ordering::Less);
    }

    #[test]
    fn flaky_runs_out() {
        let alloc = Flaky::new(1);
        let storage = Allocator::<u32>::allocate(&alloc, 4).unwrap();
        Allocator::<u32>::deallocate(&alloc, storage);
        assert!(Allocator::<u32>::allocate(&alloc, 4).unwrap_err().is_resource());
        alloc.refill(1);
        let rebound = Allocator::<u32>::rebind::<u64>(&alloc);
        assert!(Allocator::<u64>::allocate(&rebound, 1).is_ok());
    }
}

//! Pluggable allocation and placement strategy.
//!
//! An [`Allocator`] hands out uninitialised element storage, constructs and
//! destroys elements inside it, and reports the largest element count it
//! can represent. Containers never touch the global heap directly; they go
//! through the allocator they were created with, and use
//! [`Allocator::rebind`] to obtain a sibling strategy for a different
//! element type.
//!
//! Two strategies are provided:
//!
//! - [`Global`]: stateless, backed by the global heap.
//! - [`Budgeted`]: caps the representable length and records statistics in
//!   an [`AllocStats`] block shared by every clone and rebind.

use std::cell::Cell;
use std::fmt;
use std::mem::{self, MaybeUninit};
use std::rc::Rc;

use crate::error::ContainerError;

/// Uninitialised element storage handed out by an [`Allocator`].
///
/// The slice length is the capacity. Slots carry no drop obligation of
/// their own; whoever initialises a slot is responsible for deinitialising
/// it before the storage is returned.
pub type Storage<T> = Box<[MaybeUninit<T>]>;

/// Largest element count addressable for `T` without overflowing `isize`.
pub fn default_max_len<T>() -> usize {
    match mem::size_of::<T>() {
        0 => usize::MAX,
        size => isize::MAX as usize / size,
    }
}

/// Allocation and placement strategy for elements of type `T`.
///
/// Instances for the same element type must compare equal when they draw
/// from the same underlying resource. Stateless strategies are always equal.
pub trait Allocator<T>: Clone + PartialEq {
    /// The same strategy applied to a different element type.
    type Rebind<U>: Allocator<U>;

    /// Obtain uninitialised storage for exactly `len` elements.
    ///
    /// Fails with [`ContainerError::CapacityOverflow`] if `len` exceeds
    /// [`max_len`](Allocator::max_len), or with
    /// [`ContainerError::AllocationFailed`] if the memory is unavailable.
    fn allocate(&self, len: usize) -> Result<Storage<T>, ContainerError>;

    /// Return storage obtained from [`allocate`](Allocator::allocate).
    ///
    /// Every slot must already be uninitialised.
    fn deallocate(&self, storage: Storage<T>);

    /// Construct `value` in `slot`.
    fn initialize<'a>(&self, slot: &'a mut MaybeUninit<T>, value: T) -> &'a mut T {
        slot.write(value)
    }

    /// Destroy the value held in `slot`, leaving it uninitialised.
    ///
    /// # Safety
    ///
    /// `slot` must hold an initialised value that is not used afterwards.
    #[allow(unsafe_code)]
    unsafe fn deinitialize(&self, slot: &mut MaybeUninit<T>) {
        // SAFETY: the caller guarantees `slot` is initialised and dead after this call.
        unsafe { slot.assume_init_drop() }
    }

    /// Construct values from `values` into consecutive `slots`.
    ///
    /// Stops at whichever runs out first and returns the number of slots
    /// initialised.
    fn initialize_range<I>(&self, slots: &mut [MaybeUninit<T>], values: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut written = 0;
        for (slot, value) in slots.iter_mut().zip(values) {
            self.initialize(slot, value);
            written += 1;
        }
        written
    }

    /// Destroy every value in `slots`.
    ///
    /// # Safety
    ///
    /// Every slot must hold an initialised value that is not used afterwards.
    #[allow(unsafe_code)]
    unsafe fn deinitialize_range(&self, slots: &mut [MaybeUninit<T>]) {
        for slot in slots {
            // SAFETY: forwarded from the caller's contract.
            unsafe { self.deinitialize(slot) }
        }
    }

    /// Largest element count this allocator can represent.
    fn max_len(&self) -> usize {
        default_max_len::<T>()
    }

    /// Build the sibling strategy for element type `U`.
    fn rebind<U>(&self) -> Self::Rebind<U>;
}

/// Reserve storage through the fallible `Vec` path so heap exhaustion
/// surfaces as an error rather than an abort.
fn heap_storage<T>(len: usize) -> Result<Storage<T>, ContainerError> {
    let mut buf: Vec<MaybeUninit<T>> = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| ContainerError::AllocationFailed { requested: len })?;
    buf.resize_with(len, MaybeUninit::uninit);
    Ok(buf.into_boxed_slice())
}

/// Stateless allocator backed by the global heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Global;

impl<T> Allocator<T> for Global {
    type Rebind<U> = Global;

    fn allocate(&self, len: usize) -> Result<Storage<T>, ContainerError> {
        let max_len = default_max_len::<T>();
        if len > max_len {
            return Err(ContainerError::CapacityOverflow {
                requested: len,
                max_len,
            });
        }
        heap_storage(len)
    }

    fn deallocate(&self, storage: Storage<T>) {
        drop(storage);
    }

    fn rebind<U>(&self) -> Global {
        Global
    }
}

/// Allocation counters shared by a family of [`Budgeted`] allocators.
#[derive(Default)]
pub struct AllocStats {
    allocations: Cell<usize>,
    deallocations: Cell<usize>,
    live_slots: Cell<usize>,
    peak_slots: Cell<usize>,
}

impl AllocStats {
    /// Number of successful `allocate` calls.
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    /// Number of `deallocate` calls.
    pub fn deallocations(&self) -> usize {
        self.deallocations.get()
    }

    /// Element slots currently handed out.
    pub fn live_slots(&self) -> usize {
        self.live_slots.get()
    }

    /// Highest value `live_slots` has reached.
    pub fn peak_slots(&self) -> usize {
        self.peak_slots.get()
    }

    /// Storage blocks allocated but not yet returned.
    pub fn outstanding(&self) -> usize {
        self.allocations() - self.deallocations()
    }

    fn record_alloc(&self, slots: usize) {
        self.allocations.set(self.allocations.get() + 1);
        let live = self.live_slots.get() + slots;
        self.live_slots.set(live);
        if live > self.peak_slots.get() {
            self.peak_slots.set(live);
        }
    }

    fn record_dealloc(&self, slots: usize) {
        self.deallocations.set(self.deallocations.get() + 1);
        self.live_slots.set(self.live_slots.get().saturating_sub(slots));
    }
}

impl fmt::Debug for AllocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocStats")
            .field("allocations", &self.allocations())
            .field("deallocations", &self.deallocations())
            .field("live_slots", &self.live_slots())
            .field("peak_slots", &self.peak_slots())
            .finish()
    }
}

/// Heap allocator with a hard cap on element count and shared statistics.
///
/// Clones and rebinds share the same [`AllocStats`] and compare equal to
/// each other. Two independently created `Budgeted` allocators never
/// compare equal.
#[derive(Clone, Debug)]
pub struct Budgeted {
    max_len: usize,
    stats: Rc<AllocStats>,
}

impl Budgeted {
    /// Create an allocator that refuses requests above `max_len` elements.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            stats: Rc::new(AllocStats::default()),
        }
    }

    /// Create an allocator bounded only by the element type's addressable maximum.
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    /// The configured element cap.
    pub fn budget(&self) -> usize {
        self.max_len
    }

    /// Statistics shared with every clone and rebind of this allocator.
    pub fn stats(&self) -> &AllocStats {
        &self.stats
    }
}

impl PartialEq for Budgeted {
    fn eq(&self, other: &Self) -> bool {
        self.max_len == other.max_len && Rc::ptr_eq(&self.stats, &other.stats)
    }
}

impl Eq for Budgeted {}

impl<T> Allocator<T> for Budgeted {
    type Rebind<U> = Budgeted;

    fn allocate(&self, len: usize) -> Result<Storage<T>, ContainerError> {
        let max_len = Allocator::<T>::max_len(self);
        if len > max_len {
            return Err(ContainerError::CapacityOverflow {
                requested: len,
                max_len,
            });
        }
        let storage = heap_storage(len)?;
        self.stats.record_alloc(len);
        Ok(storage)
    }

    fn deallocate(&self, storage: Storage<T>) {
        self.stats.record_dealloc(storage.len());
        drop(storage);
    }

    fn max_len(&self) -> usize {
        self.max_len.min(default_max_len::<T>())
    }

    fn rebind<U>(&self) -> Budgeted {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_allocates_requested_len() {
        let storage: Storage<u64> = Global.allocate(16).unwrap();
        assert_eq!(storage.len(), 16);
        Allocator::<u64>::deallocate(&Global, storage);
    }

    #[test]
    fn global_rejects_len_above_max() {
        let max = Allocator::<u64>::max_len(&Global);
        let result: Result<Storage<u64>, _> = Global.allocate(max + 1);
        assert_eq!(
            result.unwrap_err(),
            ContainerError::CapacityOverflow {
                requested: max + 1,
                max_len: max
            }
        );
    }

    #[test]
    fn zero_sized_types_are_unbounded() {
        assert_eq!(default_max_len::<()>(), usize::MAX);
        assert_eq!(default_max_len::<u32>(), isize::MAX as usize / 4);
    }

    #[test]
    #[allow(unsafe_code)]
    fn initialize_and_deinitialize_round_trip() {
        let alloc = Global;
        let mut storage: Storage<String> = alloc.allocate(2).unwrap();
        let value = alloc.initialize(&mut storage[0], "hello".to_string());
        assert_eq!(value, "hello");
        // SAFETY: slot 0 was initialised above and is not read again.
        unsafe {
            alloc.deinitialize(&mut storage[0]);
        }
        alloc.deallocate(storage);
    }

    #[test]
    fn initialize_range_stops_at_shorter_side() {
        let alloc = Global;
        let mut storage: Storage<u32> = alloc.allocate(4).unwrap();
        let written = alloc.initialize_range(&mut storage[..], [1, 2]);
        assert_eq!(written, 2);
        let written = alloc.initialize_range(&mut storage[2..], 10..100);
        assert_eq!(written, 2);
        alloc.deallocate(storage);
    }

    #[test]
    fn budgeted_enforces_cap() {
        let alloc = Budgeted::new(8);
        let ok: Result<Storage<u8>, _> = alloc.allocate(8);
        assert!(ok.is_ok());
        alloc.deallocate(ok.unwrap());
        let err: Result<Storage<u8>, _> = alloc.allocate(9);
        assert!(err.unwrap_err().is_resource());
    }

    #[test]
    fn budgeted_stats_track_live_slots() {
        let alloc = Budgeted::unbounded();
        let a: Storage<u32> = alloc.allocate(10).unwrap();
        let b: Storage<u32> = alloc.allocate(5).unwrap();
        assert_eq!(alloc.stats().allocations(), 2);
        assert_eq!(alloc.stats().live_slots(), 15);
        alloc.deallocate(a);
        assert_eq!(alloc.stats().live_slots(), 5);
        assert_eq!(alloc.stats().peak_slots(), 15);
        alloc.deallocate(b);
        assert_eq!(alloc.stats().outstanding(), 0);
    }

    #[test]
    fn rebind_shares_stats_and_compares_equal() {
        let alloc = Budgeted::new(64);
        let sibling: Budgeted = Allocator::<u32>::rebind::<String>(&alloc);
        assert_eq!(alloc, sibling);
        let storage: Storage<String> = sibling.allocate(3).unwrap();
        assert_eq!(alloc.stats().allocations(), 1);
        sibling.deallocate(storage);
    }

    #[test]
    fn independent_budgets_are_not_equal() {
        assert_ne!(Budgeted::new(4), Budgeted::new(4));
        assert_eq!(Global, Global);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn budgeted_stats_balance(
                ops in proptest::collection::vec((any::<bool>(), 0usize..48), 0..80),
            ) {
                let alloc = Budgeted::new(32);
                let mut held: Vec<Storage<u16>> = Vec::new();
                let mut live = 0usize;
                let mut peak = 0usize;
                for (release, len) in ops {
                    if release && !held.is_empty() {
                        let storage = held.swap_remove(len % held.len());
                        live -= storage.len();
                        alloc.deallocate(storage);
                    } else {
                        match alloc.allocate(len) {
                            Ok(storage) => {
                                prop_assert!(len <= 32);
                                prop_assert_eq!(storage.len(), len);
                                live += len;
                                peak = peak.max(live);
                                held.push(storage);
                            }
                            Err(err) => {
                                prop_assert!(len > 32);
                                prop_assert!(err.is_resource());
                            }
                        }
                    }
                    let stats = alloc.stats();
                    prop_assert_eq!(stats.outstanding(), held.len());
                    prop_assert_eq!(stats.live_slots(), live);
                    prop_assert_eq!(stats.peak_slots(), peak);
                }
                let allocations = alloc.stats().allocations();
                for storage in held.drain(..) {
                    alloc.deallocate(storage);
                }
                prop_assert_eq!(alloc.stats().deallocations(), allocations);
                prop_assert_eq!(alloc.stats().live_slots(), 0);
            }

            #[test]
            fn initialize_range_writes_the_shorter_side(
                slots in 0usize..16,
                values in proptest::collection::vec(any::<u32>(), 0..24),
            ) {
                let alloc = Global;
                let mut storage: Storage<u32> = alloc.allocate(slots).unwrap();
                let written = alloc.initialize_range(&mut storage[..], values.iter().copied());
                prop_assert_eq!(written, slots.min(values.len()));
                alloc.deallocate(storage);
            }
        }
    }
}

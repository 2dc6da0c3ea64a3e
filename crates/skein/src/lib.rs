//! Skein: reference-counted containers with checked cursors.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Skein sub-crates. For most users, adding `skein` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use skein::prelude::*;
//!
//! // Handles are shallow: `b` aliases `a`.
//! let a: List<i32> = List::new();
//! let b = a.clone();
//! a.add_range([1, 2, 3]).unwrap();
//! a.erase(1).unwrap();
//! assert_eq!(b, [1, 3]);
//!
//! // Sorted lists keep keys ascending and reject duplicates.
//! let s: SortedList<String, i32> = SortedList::new();
//! s.add("b".into(), 2).unwrap();
//! s.add("a".into(), 1).unwrap();
//! assert_eq!(s.add("a".into(), 9).unwrap_err(), ContainerError::DuplicateKey);
//! assert_eq!(s.first(), Some(("a".into(), 1)));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`core`] | `skein-core` | Errors, allocators, comparators, configuration |
//! | [`list`] | `skein-list` | `List`, list cursors, the iterator tracker |
//! | [`sorted`] | `skein-sorted` | `SortedList` and its cursors |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Errors, allocation strategies, comparators, and configuration (`skein-core`).
///
/// Allocators implement [`core::Allocator`]; [`core::Global`] is the
/// default and [`core::Budgeted`] caps growth and records statistics.
pub use skein_core as core;

/// Reference-counted dynamic array (`skein-list`).
///
/// [`list::List`] is the handle type; [`list::Cursor`] is a checked
/// position inside it.
pub use skein_list as list;

/// Sorted key/value container (`skein-sorted`).
///
/// [`sorted::SortedList`] keeps parallel key and value lists ordered by a
/// [`core::Comparator`].
pub use skein_sorted as sorted;

/// Common imports for typical Skein usage.
///
/// ```rust
/// use skein::prelude::*;
/// ```
pub mod prelude {
    // Containers
    pub use skein_list::{Cursor, Direction, List};
    pub use skein_sorted::{SortedCursor, SortedList};

    // Allocation, ordering and configuration
    pub use skein_core::{Allocator, Budgeted, Comparator, ContainerConfig, Global, Natural};

    // Errors
    pub use skein_core::{ContainerError, ErrorKind};
}

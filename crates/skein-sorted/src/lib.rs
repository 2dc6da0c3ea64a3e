//! Sorted key/value container for Skein.
//!
//! [`SortedList`] maps keys to values over two parallel reference-counted
//! lists kept in ascending key order. Keys are ordered by a
//! [`Comparator`]: [`Natural`] for any `K: Ord`, or any
//! `Fn(&K, &K) -> Ordering` closure.
//!
//! ```
//! use skein_sorted::SortedList;
//!
//! let ages: SortedList<&str, u32> = SortedList::new();
//! ages.add("bob", 31).unwrap();
//! ages.add("alice", 27).unwrap();
//! assert!(ages.add("bob", 40).unwrap_err().is_logic());
//! assert!(ages.update("bob", 40).unwrap());
//!
//! let pairs: Vec<_> = ages.iter().collect();
//! assert_eq!(pairs, [("alice", 27), ("bob", 40)]);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cursor;
pub mod sorted;

pub use cursor::{SortedCursor, SortedIter};
pub use sorted::SortedList;

pub use skein_core::{Comparator, ContainerError, Natural};

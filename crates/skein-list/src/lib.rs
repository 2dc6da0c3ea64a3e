//! Reference-counted dynamic array for Skein.
//!
//! [`List`] is a handle onto a shared, growable element buffer. Handles are
//! shallow: cloning one aliases the same elements, and the buffer is freed
//! when the last handle is dropped. Positions inside a list are expressed
//! as [`Cursor`]s, which in debug builds are checked against an
//! [`IteratorTracker`] so that use after a disturbing mutation is reported
//! as [`ContainerError::OrphanedCursor`] instead of reading stale data.
//!
//! # Example
//!
//! ```
//! use skein_list::List;
//!
//! let scores: List<u32> = [30, 10, 20].into();
//! scores.view_mut().unwrap().sort();
//! assert_eq!(scores.binary_search(&20), 1);
//! assert_eq!(!scores.binary_search(&25), 2);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod cursor;
pub mod list;
mod object;
mod raw;
pub mod tracker;

pub use cursor::{Cursor, Direction, Iter};
pub use list::List;
pub use tracker::IteratorTracker;

pub use skein_core::{Allocator, ContainerConfig, ContainerError, ErrorKind, Global};

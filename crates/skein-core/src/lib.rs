//! Core types and traits for the Skein container library.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! abstractions shared by every container in the workspace: the error
//! taxonomy, the pluggable allocation strategy, key comparators, and
//! container configuration.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod alloc;
pub mod compare;
pub mod config;
pub mod error;

pub use alloc::{AllocStats, Allocator, Budgeted, Global, Storage};
pub use compare::{Comparator, Natural};
pub use config::ContainerConfig;
pub use error::{ContainerError, ErrorKind};

//! Error types for the Skein container library.
//!
//! Every fallible container operation reports a [`ContainerError`]. The
//! variants fall into three families, exposed through [`ErrorKind`]:
//! range errors, logic errors, and resource errors.

use std::error::Error;
use std::fmt;

/// Coarse classification of a [`ContainerError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An index or cursor lies outside the live range.
    Range,
    /// The container was used in a way its contract forbids.
    Logic,
    /// Storage could not be obtained.
    Resource,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range => write!(f, "range error"),
            Self::Logic => write!(f, "logic error"),
            Self::Resource => write!(f, "resource error"),
        }
    }
}

/// Errors raised by list and sorted-list operations.
///
/// All errors are raised synchronously at the point of misuse. None are
/// retried internally, and single-element operations leave the container
/// unchanged when they fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContainerError {
    /// An index or cursor position is outside `[0, len)`.
    OutOfRange {
        /// The offending position.
        index: usize,
        /// Live length of the container at the time of the call.
        len: usize,
    },
    /// A key is already present in a sorted container.
    DuplicateKey,
    /// A key required by the call is not present.
    KeyNotFound,
    /// A cursor was invalidated by a structural mutation, outlived its
    /// container, or was never attached to one.
    OrphanedCursor {
        /// Generation the cursor was last validated against.
        cursor_generation: u64,
        /// Current generation of the container (0 if it no longer exists).
        current_generation: u64,
    },
    /// A cursor was paired with a container it does not belong to.
    ForeignCursor,
    /// The container is currently borrowed through a view or guard and
    /// cannot be accessed in the requested mode.
    BorrowConflict,
    /// The requested capacity exceeds what the allocator can represent.
    CapacityOverflow {
        /// Number of elements requested.
        requested: usize,
        /// Largest element count the allocator supports.
        max_len: usize,
    },
    /// The allocator failed to provide storage.
    AllocationFailed {
        /// Number of elements requested.
        requested: usize,
    },
}

impl ContainerError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfRange { .. } => ErrorKind::Range,
            Self::DuplicateKey
            | Self::KeyNotFound
            | Self::OrphanedCursor { .. }
            | Self::ForeignCursor
            | Self::BorrowConflict => ErrorKind::Logic,
            Self::CapacityOverflow { .. } | Self::AllocationFailed { .. } => ErrorKind::Resource,
        }
    }

    /// Whether this is a range error.
    pub fn is_range(&self) -> bool {
        self.kind() == ErrorKind::Range
    }

    /// Whether this is a logic error.
    pub fn is_logic(&self) -> bool {
        self.kind() == ErrorKind::Logic
    }

    /// Whether this is a resource (out-of-memory) error.
    pub fn is_resource(&self) -> bool {
        self.kind() == ErrorKind::Resource
    }
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::DuplicateKey => write!(f, "key already present"),
            Self::KeyNotFound => write!(f, "key not found"),
            Self::OrphanedCursor {
                cursor_generation,
                current_generation,
            } => {
                write!(
                    f,
                    "orphaned cursor: generation {cursor_generation}, container at {current_generation}"
                )
            }
            Self::ForeignCursor => write!(f, "cursor belongs to a different container"),
            Self::BorrowConflict => write!(f, "container is already borrowed"),
            Self::CapacityOverflow { requested, max_len } => {
                write!(
                    f,
                    "capacity overflow: requested {requested} elements, max {max_len}"
                )
            }
            Self::AllocationFailed { requested } => {
                write!(f, "allocation of {requested} elements failed")
            }
        }
    }
}

impl Error for ContainerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert!(ContainerError::OutOfRange { index: 3, len: 2 }.is_range());
        assert!(ContainerError::DuplicateKey.is_logic());
        assert!(ContainerError::KeyNotFound.is_logic());
        assert!(ContainerError::ForeignCursor.is_logic());
        assert!(ContainerError::BorrowConflict.is_logic());
        assert!(ContainerError::OrphanedCursor {
            cursor_generation: 1,
            current_generation: 2
        }
        .is_logic());
        assert!(ContainerError::AllocationFailed { requested: 8 }.is_resource());
        assert!(ContainerError::CapacityOverflow {
            requested: 9,
            max_len: 8
        }
        .is_resource());
    }

    #[test]
    fn display_mentions_bounds() {
        let msg = ContainerError::OutOfRange { index: 7, len: 4 }.to_string();
        assert_eq!(msg, "index 7 out of range for length 4");
        let msg = ContainerError::CapacityOverflow {
            requested: 100,
            max_len: 10,
        }
        .to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Resource.to_string(), "resource error");
    }
}

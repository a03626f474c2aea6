//! Storage-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during storage operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageError {
    /// The allocator could not satisfy an aligned request, or the requested
    /// size is not representable.
    OutOfMemory {
        /// Number of bytes requested (`usize::MAX` if the size overflowed).
        requested: usize,
        /// Required alignment in bytes.
        align: usize,
    },
    /// An index at or beyond the current length.
    IndexOutOfRange {
        /// The rejected index.
        index: usize,
        /// Length of the vector at the time of the call.
        len: usize,
    },
    /// A relocation was requested while zero-copy views of the current
    /// block are still leased to an external reader.
    ViewsOutstanding {
        /// Number of live leases.
        outstanding: usize,
    },
    /// Storage configuration is invalid.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested, align } => {
                write!(
                    f,
                    "out of memory: could not allocate {requested} bytes aligned to {align}"
                )
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::ViewsOutstanding { outstanding } => {
                write!(
                    f,
                    "cannot relocate storage: {outstanding} zero-copy view(s) still in flight"
                )
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid storage config: {reason}")
            }
        }
    }
}

impl Error for StorageError {}

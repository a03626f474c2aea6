//! Storage configuration parameters.

use crate::error::StorageError;
use crate::raw::page_size;

/// Configuration for [`PageAlignedVec`](crate::PageAlignedVec).
///
/// Controls the per-instance stride. Validated at construction; immutable
/// for the lifetime of a vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// Alignment every slot stride is rounded up to, in bytes.
    ///
    /// Some instancing backends require the per-instance stride to be a
    /// multiple of 4 or 16 bytes even when the record itself is smaller.
    /// Default: 1 (stride is the record's natural size).
    /// Must be a power of two no larger than the page size.
    pub stride_alignment: usize,
}

impl StorageConfig {
    /// Default stride alignment: no padding beyond the record size.
    pub const DEFAULT_STRIDE_ALIGNMENT: usize = 1;

    /// Create a config with the default stride alignment.
    pub fn new() -> Self {
        Self {
            stride_alignment: Self::DEFAULT_STRIDE_ALIGNMENT,
        }
    }

    /// Create a config whose strides are multiples of `stride_alignment`.
    pub fn with_stride_alignment(stride_alignment: usize) -> Self {
        Self { stride_alignment }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), StorageError> {
        if !self.stride_alignment.is_power_of_two() {
            return Err(StorageError::InvalidConfig {
                reason: format!(
                    "stride_alignment must be a power of two (got {})",
                    self.stride_alignment
                ),
            });
        }
        if self.stride_alignment > page_size() {
            return Err(StorageError::InvalidConfig {
                reason: format!(
                    "stride_alignment {} exceeds the page size {}",
                    self.stride_alignment,
                    page_size()
                ),
            });
        }
        Ok(())
    }

    /// Byte stride for slots holding `T`.
    ///
    /// `size_of::<T>()` (at least 1) rounded up to both `align_of::<T>()`
    /// and [`stride_alignment`](Self::stride_alignment). Assumes the config
    /// has been validated.
    pub fn stride_for<T>(&self) -> usize {
        let size = std::mem::size_of::<T>().max(1);
        let align = std::mem::align_of::<T>().max(self.stride_alignment);
        size.div_ceil(align) * align
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new()
    }
}

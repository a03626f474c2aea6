//! Page-aligned growable storage for zero-copy GPU instance buffers.
//!
//! Holds per-instance records in memory whose start address and length are
//! page multiples, so a rendering backend can import the block as a shared
//! buffer without copying, while ordinary code keeps growing, indexing and
//! mutating it every frame. This crate is the only one in the workspace
//! that contains `unsafe` code, confined to `raw.rs`, `vec.rs` and `view.rs`.
//!
//! # Architecture
//!
//! ```text
//! PageAlignedVec<T> (typed owner)
//! ├── AlignedStorage (one page-aligned block, capacity × stride bytes, page-rounded)
//! ├── Arc<LeaseState> (in-flight external reads of the current block)
//! └── GrowthStats (allocations, relocations)
//! ```
//!
//! # Zero-copy discipline
//!
//! - [`PageAlignedVec::raw_view`] describes the block: page-aligned pointer,
//!   capacity-based page-rounded length, stride.
//! - [`PageAlignedVec::lease_view`] hands out a [`ViewLease`]; while any
//!   lease is live, growth fails with [`StorageError::ViewsOutstanding`]
//!   instead of relocating the block under the reader.
//! - In-place writes (`for_each_mut`, `set`) remain legal during a lease.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod raw;
pub mod vec;
pub mod view;

// Public re-exports for the primary API surface.
pub use config::StorageConfig;
pub use error::StorageError;
pub use raw::{page_size, AlignedStorage};
pub use vec::{GrowthStats, PageAlignedVec};
pub use view::{RawView, ViewLease};

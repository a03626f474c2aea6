//! Swarm: zero-copy page-aligned instance storage and an animated Bezier
//! curve swarm built on it.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the sub-crates. For most users, adding `swarm` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use swarm::prelude::*;
//!
//! // A backend that finishes every frame as soon as it is submitted.
//! struct Immediate(u64);
//! impl FrameSink for Immediate {
//!     fn submit(&mut self, frame: FrameSubmission) {
//!         let view = frame.lease.view();
//!         assert_eq!(view.as_ptr() as usize % swarm::storage::page_size(), 0);
//!         self.0 += 1;
//!     }
//!     fn wait_idle(&mut self) {}
//! }
//!
//! let config = SwarmConfig {
//!     initial_curves: 100,
//!     seed: 42,
//!     ..SwarmConfig::default()
//! };
//! let mut swarm = CurveSwarm::new(config).unwrap();
//! let mut sink = Immediate(0);
//! for _ in 0..10 {
//!     swarm.step_frame(&mut sink);
//! }
//! swarm.spawn(1000, &mut sink).unwrap();
//! assert_eq!(swarm.curves().len(), 1100);
//! assert_eq!(sink.0, 10);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`storage`] | `swarm-storage` | `PageAlignedVec`, raw views, leases |
//! | [`curves`] | `swarm-curves` | `CurveParams`, geometry types, seeded factory |
//! | [`engine`] | `swarm-engine` | `CurveSwarm`, frame sinks, config, logging |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Page-aligned growable storage (`swarm-storage`).
///
/// [`storage::PageAlignedVec`] is usable on its own for any instance
/// record type.
pub use swarm_storage as storage;

/// Curve instance records and their integrator (`swarm-curves`).
pub use swarm_curves as curves;

/// Frame loop, sinks, and configuration (`swarm-engine`).
pub use swarm_engine as engine;

/// Common imports for typical usage.
///
/// ```rust
/// use swarm::prelude::*;
/// ```
pub mod prelude {
    // Storage
    pub use swarm_storage::{PageAlignedVec, RawView, StorageConfig, StorageError, ViewLease};

    // Curves
    pub use swarm_curves::{Color, CurveConfig, CurveFactory, CurveParams, Vec2};

    // Engine
    pub use swarm_engine::{
        ConfigError, CurveSwarm, FrameMetrics, FrameSink, FrameSubmission, SwarmConfig,
    };
}

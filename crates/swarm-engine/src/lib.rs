//! Frame loop driving a zero-copy swarm of animated Bezier curves.
//!
//! [`CurveSwarm`] owns the instance records in a
//! [`PageAlignedVec`](swarm_storage::PageAlignedVec) and, once per frame,
//! animates every record in place and hands a leased view of the backing
//! block to a [`FrameSink`]. The sink stands in for the rendering backend:
//! it imports the block without copying and drops the lease once the frame
//! has been consumed.
//!
//! # Frame protocol
//!
//! ```text
//! step_frame:  animate all records in place ──► lease_view ──► sink.submit
//! spawn:       [if growing] sink.wait_idle (all leases retired) ──► append
//! ```
//!
//! Growth is the only operation that moves the block, and it only happens
//! behind the sink's barrier.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod draw;
pub mod logging;
pub mod metrics;
pub mod sink;
pub mod swarm;

pub use config::{ConfigError, SwarmConfig};
pub use draw::{DrawGeometry, GlobalParams};
pub use metrics::FrameMetrics;
pub use sink::{FrameSink, FrameSubmission};
pub use swarm::CurveSwarm;

//! Benchmark profiles and utilities for the swarm workspace.
//!
//! - [`reference_profile`]: the default 2000-curve swarm
//! - [`stress_profile`]: 100K curves
//! - [`DiscardSink`]: a backend that finishes every frame on submit

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use swarm_curves::CurveConfig;
use swarm_engine::{FrameSink, FrameSubmission, SwarmConfig};

/// The default swarm: 2000 curves, 200 triangles each.
pub fn reference_profile(seed: u64) -> SwarmConfig {
    SwarmConfig {
        seed,
        ..SwarmConfig::default()
    }
}

/// 100K curves with the default curve parameters.
pub fn stress_profile(seed: u64) -> SwarmConfig {
    SwarmConfig {
        initial_curves: 100_000,
        curve: CurveConfig::default(),
        seed,
        ..SwarmConfig::default()
    }
}

/// Sink that drops every lease as soon as it is submitted.
#[derive(Debug, Default)]
pub struct DiscardSink {
    /// Frames received.
    pub frames: u64,
}

impl FrameSink for DiscardSink {
    fn submit(&mut self, frame: FrameSubmission) {
        self.frames += 1;
        drop(frame);
    }

    fn wait_idle(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_validate() {
        assert!(reference_profile(42).validate().is_ok());
        assert!(stress_profile(42).validate().is_ok());
        assert_eq!(reference_profile(1).initial_curves, 2000);
    }
}

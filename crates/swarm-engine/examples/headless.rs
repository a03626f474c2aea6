//! Headless swarm: the full frame loop without a GPU.
//!
//! Demonstrates:
//!   1. Building a CurveSwarm from a SwarmConfig
//!   2. A FrameSink that reads the leased block in place
//!   3. Spawning more curves behind the sink barrier
//!   4. Per-frame metrics
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example headless -- [frames] [spawn_every]

use swarm_engine::logging::{init_logging, LoggingConfig};
use swarm_engine::{CurveSwarm, FrameSink, FrameSubmission, SwarmConfig};

// ─── Sink: consumes each frame immediately ──────────────────────

/// Stands in for a backend that finishes every frame before the next.
#[derive(Default)]
struct LoggingSink {
    frames: u64,
    instances: u64,
    last_base: Option<*const u8>,
}

impl FrameSink for LoggingSink {
    fn submit(&mut self, frame: FrameSubmission) {
        let view = frame.lease.view();
        if self.last_base != Some(view.as_ptr()) {
            log::info!(
                "frame {}: importing block {:p} ({} bytes, stride {}, generation {})",
                frame.frame_index,
                view.as_ptr(),
                view.byte_len(),
                view.stride(),
                view.generation()
            );
            self.last_base = Some(view.as_ptr());
        }
        self.frames += 1;
        self.instances += frame.instance_count as u64;
        // Dropping the submission releases the lease: this frame is done.
    }

    fn wait_idle(&mut self) {}
}

// ─── Main ───────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args().skip(1);
    let frames: u64 = args.next().map(|a| a.parse()).transpose()?.unwrap_or(600);
    let spawn_every: u64 = args.next().map(|a| a.parse()).transpose()?.unwrap_or(120);

    let config = SwarmConfig {
        seed: 42,
        ..SwarmConfig::default()
    };
    let mut swarm = CurveSwarm::new(config)?;
    let mut sink = LoggingSink::default();
    log::info!("{swarm:?}");

    let mut animate_us = 0u64;
    for frame in 0..frames {
        let metrics = swarm.step_frame(&mut sink);
        animate_us += metrics.animate_us;
        if metrics.grew {
            log::info!("frame {}: drawing from a relocated block", metrics.frame_index);
        }
        if spawn_every > 0 && frame > 0 && frame % spawn_every == 0 {
            swarm.spawn(swarm.curves().len() / 2, &mut sink)?;
        }
    }

    log::info!(
        "{} frames, {} instances drawn, mean animate {:.1}us",
        sink.frames,
        sink.instances,
        animate_us as f64 / frames.max(1) as f64
    );
    Ok(())
}

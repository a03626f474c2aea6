//! The curve swarm and its frame loop.
//!
//! [`CurveSwarm`] is the primary user-facing API. Each
//! [`step_frame()`](CurveSwarm::step_frame) animates every curve in place
//! and submits a leased view of the instance block to a [`FrameSink`].
//! [`spawn()`](CurveSwarm::spawn) is the only path that can relocate the
//! block, and when it must grow it waits on the sink's barrier first.
//!
//! # Ownership model
//!
//! `CurveSwarm` is [`Send`] but all mutating methods take `&mut self`.
//! Leases handed to the sink are the only handles that outlive a call, and
//! they hold no borrow of the swarm.

use std::fmt;
use std::time::Instant;

use swarm_curves::{CurveFactory, CurveParams};
use swarm_storage::{PageAlignedVec, StorageError};

use crate::config::{ConfigError, SwarmConfig};
use crate::draw::DrawGeometry;
use crate::metrics::FrameMetrics;
use crate::sink::{FrameSink, FrameSubmission};

// Compile-time assertion: CurveSwarm can move to a render thread.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<CurveSwarm>();
    }
};

/// A swarm of animated Bezier curves backed by a zero-copy instance buffer.
///
/// # Example
///
/// ```ignore
/// let mut swarm = CurveSwarm::new(SwarmConfig::default())?;
/// loop {
///     let metrics = swarm.step_frame(&mut sink);
///     if wants_more {
///         swarm.spawn(100, &mut sink)?;
///     }
/// }
/// ```
pub struct CurveSwarm {
    curves: PageAlignedVec<CurveParams>,
    factory: CurveFactory,
    geometry: DrawGeometry,
    frame_index: u64,
    submitted_generation: Option<u64>,
}

impl CurveSwarm {
    /// Create a swarm of `config.initial_curves` random curves.
    ///
    /// Validates the config, then allocates the block once and fills it
    /// from a factory seeded with `config.seed`.
    pub fn new(config: SwarmConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut factory = CurveFactory::new(config.curve.clone(), config.seed)?;
        let curves = PageAlignedVec::construct_with_config(
            config.storage.clone(),
            config.initial_curves,
            || factory.next_curve(),
        )?;
        Self::assemble(&config, curves, factory)
    }

    /// Create a swarm from explicit curves, ignoring `config.initial_curves`.
    ///
    /// Later [`spawn`](Self::spawn) calls still draw from a factory seeded
    /// with `config.seed`.
    pub fn with_curves(
        config: SwarmConfig,
        curves: impl IntoIterator<Item = CurveParams>,
    ) -> Result<Self, ConfigError> {
        config.validate_layout()?;
        let factory = CurveFactory::new(config.curve.clone(), config.seed)?;
        let mut block = PageAlignedVec::with_config(config.storage.clone())?;
        for curve in curves {
            block.append(curve)?;
        }
        Self::assemble(&config, block, factory)
    }

    fn assemble(
        config: &SwarmConfig,
        curves: PageAlignedVec<CurveParams>,
        factory: CurveFactory,
    ) -> Result<Self, ConfigError> {
        let geometry = DrawGeometry::new(config.elements_per_instance)?;
        log::debug!(
            "swarm ready: {} curves, capacity {}, {} bytes",
            curves.len(),
            curves.capacity(),
            curves.raw_view().byte_len()
        );
        Ok(Self {
            curves,
            factory,
            geometry,
            frame_index: 0,
            submitted_generation: None,
        })
    }

    /// Animate every curve and submit the frame.
    ///
    /// Never relocates the block, so it is valid while earlier frames are
    /// still in flight. Records being read by an earlier frame are updated
    /// in place.
    pub fn step_frame<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> FrameMetrics {
        let start = Instant::now();
        self.curves.for_each_mut(|_, curve| curve.animate());
        let animate_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        let lease = self.curves.lease_view();
        let view = lease.view();
        let grew = self
            .submitted_generation
            .is_some_and(|g| g != view.generation());
        self.submitted_generation = Some(view.generation());

        let metrics = FrameMetrics {
            frame_index: self.frame_index,
            animate_us,
            instance_count: view.len(),
            buffer_bytes: view.byte_len(),
            grew,
        };
        log::trace!(
            "frame {}: {} instances, animate {}us",
            metrics.frame_index,
            metrics.instance_count,
            metrics.animate_us
        );

        sink.submit(FrameSubmission {
            lease,
            globals: self.geometry.globals(),
            instance_count: view.len(),
            index_count: self.geometry.index_count(),
            frame_index: self.frame_index,
        });
        self.frame_index += 1;
        metrics
    }

    /// Add `count` random curves, returning the new curve count.
    ///
    /// Appends that fit the current block leave in-flight frames alone.
    /// Otherwise waits for the sink to retire every in-flight frame, then
    /// grows the block once and appends.
    ///
    /// # Errors
    ///
    /// [`StorageError::ViewsOutstanding`] if leases survive the sink's
    /// barrier (a misbehaving sink), or [`StorageError::OutOfMemory`]. The
    /// swarm is unchanged in both cases.
    pub fn spawn<S: FrameSink + ?Sized>(
        &mut self,
        count: usize,
        sink: &mut S,
    ) -> Result<usize, StorageError> {
        if self.curves.len().saturating_add(count) > self.curves.capacity() {
            sink.wait_idle();
        }

        let generation = self.curves.generation();
        let old_capacity = self.curves.capacity();
        self.curves.reserve(count)?;
        if self.curves.generation() != generation {
            log::debug!(
                "instance block grew {} -> {} slots ({} bytes)",
                old_capacity,
                self.curves.capacity(),
                self.curves.raw_view().byte_len()
            );
        }

        for _ in 0..count {
            self.curves.append(self.factory.next_curve())?;
        }
        log::info!("spawned {count} curves, {} total", self.curves.len());
        Ok(self.curves.len())
    }

    /// The instance records.
    pub fn curves(&self) -> &PageAlignedVec<CurveParams> {
        &self.curves
    }

    /// Shared draw geometry.
    pub fn geometry(&self) -> &DrawGeometry {
        &self.geometry
    }

    /// Index of the next frame to be submitted.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl fmt::Debug for CurveSwarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveSwarm")
            .field("curves", &self.curves.len())
            .field("capacity", &self.curves.capacity())
            .field("frame_index", &self.frame_index)
            .finish()
    }
}

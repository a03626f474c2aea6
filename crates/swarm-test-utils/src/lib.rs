//! Test sinks and fixture curves for swarm development.
//!
//! Provides two [`FrameSink`] implementations standing in for a rendering
//! backend:
//!
//! - [`RecordingSink`] records every submission and holds its lease until
//!   [`complete`](RecordingSink::complete) or `wait_idle`.
//! - [`ThreadedSink`] retires leases on a reader thread, the way a GPU
//!   completion handler would.
//!
//! [`fixtures`] holds deterministic curves and reference integrators.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use swarm_engine::{FrameSink, FrameSubmission};
use swarm_storage::ViewLease;

/// What a sink saw of one submitted frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedFrame {
    pub frame_index: u64,
    pub instance_count: usize,
    pub index_count: u32,
    pub elements_per_instance: u32,
    /// Address of the leased block.
    pub base: usize,
    pub byte_len: usize,
    pub stride: usize,
    pub generation: u64,
}

impl RecordedFrame {
    fn of(frame: &FrameSubmission) -> Self {
        let view = frame.lease.view();
        Self {
            frame_index: frame.frame_index,
            instance_count: frame.instance_count,
            index_count: frame.index_count,
            elements_per_instance: frame.globals.elements_per_instance,
            base: view.as_ptr() as usize,
            byte_len: view.byte_len(),
            stride: view.stride(),
            generation: view.generation(),
        }
    }
}

/// Mock backend that holds leases until told the frames are done.
#[derive(Debug, Default)]
pub struct RecordingSink {
    frames: Vec<RecordedFrame>,
    held: Vec<ViewLease>,
    idle_waits: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every frame submitted so far, oldest first.
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    /// Number of leases still held.
    pub fn in_flight(&self) -> usize {
        self.held.len()
    }

    /// Number of `wait_idle` calls received.
    pub fn idle_waits(&self) -> usize {
        self.idle_waits
    }

    /// Retire every held lease.
    pub fn complete(&mut self) {
        self.held.clear();
    }
}

impl FrameSink for RecordingSink {
    fn submit(&mut self, frame: FrameSubmission) {
        self.frames.push(RecordedFrame::of(&frame));
        self.held.push(frame.lease);
    }

    fn wait_idle(&mut self) {
        self.idle_waits += 1;
        self.complete();
    }
}

/// Mock backend that consumes frames on its own thread.
///
/// Each frame is held for `read_time` before its lease is dropped and the
/// frame index acknowledged. [`wait_idle`](FrameSink::wait_idle) blocks
/// until every submitted frame has been acknowledged.
pub struct ThreadedSink {
    frames: Option<Sender<FrameSubmission>>,
    done: Receiver<RecordedFrame>,
    in_flight: usize,
    completed: Vec<RecordedFrame>,
    reader: Option<JoinHandle<()>>,
}

impl ThreadedSink {
    pub fn new(read_time: Duration) -> Self {
        let (frame_tx, frame_rx) = crossbeam_channel::unbounded::<FrameSubmission>();
        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        let reader = std::thread::Builder::new()
            .name("swarm-test-reader".into())
            .spawn(move || {
                while let Ok(frame) = frame_rx.recv() {
                    if !read_time.is_zero() {
                        std::thread::sleep(read_time);
                    }
                    let record = RecordedFrame::of(&frame);
                    // Lease is released before the acknowledgement is sent.
                    drop(frame);
                    if done_tx.send(record).is_err() {
                        break;
                    }
                }
            })
            .ok();
        if reader.is_none() {
            log::error!("could not spawn test reader thread");
        }
        Self {
            frames: Some(frame_tx),
            done: done_rx,
            in_flight: 0,
            completed: Vec::new(),
            reader,
        }
    }

    /// Frames acknowledged by the reader, in completion order.
    pub fn completed(&self) -> &[RecordedFrame] {
        &self.completed
    }

    /// Submitted frames not yet collected by `wait_idle`.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl FrameSink for ThreadedSink {
    fn submit(&mut self, frame: FrameSubmission) {
        let Some(frames) = &self.frames else {
            return;
        };
        // A dead reader hands the frame back inside the error; dropping it
        // releases the lease immediately.
        if frames.send(frame).is_ok() {
            self.in_flight += 1;
        }
    }

    fn wait_idle(&mut self) {
        while self.in_flight > 0 {
            match self.done.recv() {
                Ok(record) => {
                    self.in_flight -= 1;
                    self.completed.push(record);
                }
                Err(_) => break,
            }
        }
    }
}

impl Drop for ThreadedSink {
    fn drop(&mut self) {
        self.frames.take();
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

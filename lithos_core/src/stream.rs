// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A surface's stream of submitted buffers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::FrameBuffer;
use crate::output::OutputId;
use crate::schedule::{QueueingSchedule, Schedule};

#[derive(Debug, Default)]
struct Front {
    buffer: Option<Arc<FrameBuffer>>,
    generation: u64,
    /// Last generation each output composed.
    seen: HashMap<OutputId, u64>,
}

impl Front {
    fn seen_by(&self, output: OutputId) -> bool {
        self.buffer.is_some() && self.seen.get(&output) == Some(&self.generation)
    }
}

/// Pairs a [`Schedule`] with the buffer currently on screen.
///
/// The client side submits with [`submit_buffer`](Self::submit_buffer). Each
/// output calls [`lock_compositor_buffer`](Self::lock_compositor_buffer)
/// once per frame. The front only advances for an output that has already
/// composed it, so an output showing the surface never misses a buffer
/// because another output composed faster. Advancing drops the stream's
/// hold on the previous front.
#[derive(Debug)]
pub struct BufferStream {
    schedule: Arc<dyn Schedule>,
    front: Mutex<Front>,
    has_alpha: bool,
}

impl BufferStream {
    /// Creates a stream backed by a [`QueueingSchedule`].
    #[must_use]
    pub fn new(has_alpha: bool) -> Self {
        Self::with_schedule(Arc::new(QueueingSchedule::new()), has_alpha)
    }

    /// Creates a stream backed by the given schedule.
    #[must_use]
    pub fn with_schedule(schedule: Arc<dyn Schedule>, has_alpha: bool) -> Self {
        Self {
            schedule,
            front: Mutex::new(Front::default()),
            has_alpha,
        }
    }

    /// Queues a buffer for composition.
    pub fn submit_buffer(&self, buffer: Arc<FrameBuffer>) {
        self.schedule.schedule(buffer);
    }

    /// Number of submitted buffers not yet shown.
    #[must_use]
    pub fn buffers_ready_for_compositor(&self) -> usize {
        self.schedule.num_scheduled()
    }

    /// Whether the next [`lock_compositor_buffer`](Self::lock_compositor_buffer)
    /// for `output` would return a buffer it has not composed yet.
    #[must_use]
    pub fn has_frame_for(&self, output: OutputId) -> bool {
        let front = self.front.lock();
        (front.buffer.is_some() && !front.seen_by(output)) || self.schedule.num_scheduled() > 0
    }

    /// Returns the front buffer for `output`, first advancing to the next
    /// scheduled buffer if `output` has already composed the current one.
    ///
    /// Returns `None` if the client has never submitted anything.
    #[must_use]
    pub fn lock_compositor_buffer(&self, output: OutputId) -> Option<Arc<FrameBuffer>> {
        let mut front = self.front.lock();
        if front.buffer.is_none() || front.seen_by(output) {
            if let Ok(next) = self.schedule.next_buffer() {
                front.buffer = Some(next);
                front.generation += 1;
            }
        }
        if front.buffer.is_some() {
            let generation = front.generation;
            front.seen.insert(output, generation);
        }
        front.buffer.clone()
    }

    /// Whether the stream's content may be translucent.
    #[must_use]
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
            || self
                .front
                .lock()
                .buffer
                .as_ref()
                .is_some_and(|buffer| buffer.has_alpha())
    }
}

// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-stream FIFO of buffers awaiting composition.
//!
//! The producing client thread calls [`Schedule::schedule`]; a compositor
//! thread checks [`Schedule::num_scheduled`] and takes buffers with
//! [`Schedule::next_buffer`]. Frames are consumed strictly in submission
//! order and none is duplicated or silently dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::FrameBuffer;

/// Misuse of a [`Schedule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// `next_buffer` was called with nothing scheduled.
    #[error("no buffer is scheduled")]
    Empty,
}

/// An ordered queue of frame buffers for one stream.
pub trait Schedule: Send + Sync + core::fmt::Debug {
    /// Appends `buffer` to the tail.
    fn schedule(&self, buffer: Arc<FrameBuffer>);

    /// Number of buffers waiting.
    fn num_scheduled(&self) -> usize;

    /// Removes and returns the head.
    ///
    /// Returns [`ScheduleError::Empty`] if nothing is scheduled; callers
    /// should check [`num_scheduled`](Self::num_scheduled) first.
    fn next_buffer(&self) -> Result<Arc<FrameBuffer>, ScheduleError>;
}

/// A lock-protected FIFO [`Schedule`].
#[derive(Debug, Default)]
pub struct QueueingSchedule {
    queue: Mutex<VecDeque<Arc<FrameBuffer>>>,
}

impl QueueingSchedule {
    /// Creates an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Schedule for QueueingSchedule {
    fn schedule(&self, buffer: Arc<FrameBuffer>) {
        self.queue.lock().push_back(buffer);
    }

    fn num_scheduled(&self) -> usize {
        self.queue.lock().len()
    }

    fn next_buffer(&self) -> Result<Arc<FrameBuffer>, ScheduleError> {
        self.queue.lock().pop_front().ok_or(ScheduleError::Empty)
    }
}

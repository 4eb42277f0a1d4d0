// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client frame buffers and their return path.
//!
//! A [`FrameBuffer`] is an opaque pixel-bearing handle submitted by a client.
//! It is shared as `Arc<FrameBuffer>`: first by a [`Schedule`], then by the
//! buffer stream's front slot, a frame's scene elements, and the compositor's
//! renderable list. When the last `Arc` goes away the buffer's
//! [`BufferReleaser`] is told, exactly once, that the client may reuse it.
//!
//! [`Schedule`]: crate::schedule::Schedule

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use kurbo::Size;

/// Identifies a client buffer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(pub u64);

impl BufferId {
    /// Allocates a process-unique buffer id.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId({})", self.0)
    }
}

/// Receives buffers back once the server holds no more references.
///
/// Implemented by the producing side (a client connection, or a test
/// double). Called from whichever thread drops the last reference, which is
/// usually a compositor thread.
pub trait BufferReleaser: Send + Sync {
    /// The buffer `id` is no longer referenced by the server.
    fn release(&self, id: BufferId);
}

/// An opaque client buffer.
pub struct FrameBuffer {
    id: BufferId,
    size: Size,
    has_alpha: bool,
    releaser: Option<Arc<dyn BufferReleaser>>,
}

impl FrameBuffer {
    /// Creates a buffer with a fresh id and no releaser.
    #[must_use]
    pub fn new(size: Size, has_alpha: bool) -> Self {
        Self {
            id: BufferId::next(),
            size,
            has_alpha,
            releaser: None,
        }
    }

    /// Attaches the producer that should be told when the buffer is free.
    #[must_use]
    pub fn with_releaser(mut self, releaser: Arc<dyn BufferReleaser>) -> Self {
        self.releaser = Some(releaser);
        self
    }

    /// Returns the buffer id.
    #[must_use]
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Returns the buffer size in pixels.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Whether the pixel format carries an alpha channel.
    #[must_use]
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        if let Some(releaser) = self.releaser.take() {
            releaser.release(self.id);
        }
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("has_alpha", &self.has_alpha)
            .field("releaser", &self.releaser.is_some())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use parking_lot::Mutex;

    use super::{BufferId, BufferReleaser};

    /// Records released ids in order.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingReleaser {
        pub(crate) released: Mutex<Vec<BufferId>>,
    }

    impl BufferReleaser for RecordingReleaser {
        fn release(&self, id: BufferId) {
            self.released.lock().push(id);
        }
    }
}

// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display outputs.
//!
//! [`OutputId`] is a lightweight handle identifying a specific display.
//! [`DisplayBuffer`] is the contract a platform backend implements for each
//! output the compositor draws into: where it sits in screen space, how it
//! is rotated or mirrored, whether it can take a frame as hardware overlays,
//! and how to present.

use core::fmt;
use std::sync::Arc;

use kurbo::Rect;
use parking_lot::Mutex;

use crate::scene::Renderable;
use crate::time::HostTime;

/// Identifies a specific display output.
///
/// Backends assign output IDs to distinguish multiple displays. Core code
/// passes them through without interpreting the value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OutputId(pub u32);

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputId({})", self.0)
    }
}

/// Rotation of an output relative to its natural orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Not rotated.
    #[default]
    Normal,
    /// Rotated 90° counter-clockwise.
    Left,
    /// Rotated 180°.
    Inverted,
    /// Rotated 270° counter-clockwise.
    Right,
}

impl Orientation {
    /// Rotation in degrees.
    #[must_use]
    pub const fn degrees(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::Left => 90,
            Self::Inverted => 180,
            Self::Right => 270,
        }
    }
}

/// Mirroring applied after rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MirrorMode {
    /// No mirroring.
    #[default]
    None,
    /// Flip about the vertical axis.
    Horizontal,
    /// Flip about the horizontal axis.
    Vertical,
}

/// A vsync count paired with the time it occurred.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Frame {
    /// Media stream counter: number of vsyncs seen.
    pub msc: u64,
    /// Unadjusted system time of the latest vsync.
    pub ust: HostTime,
}

/// A [`Frame`] that is updated and read as a unit.
#[derive(Debug, Default)]
pub struct AtomicFrame {
    frame: Mutex<Frame>,
}

impl AtomicFrame {
    /// Creates a counter at `frame`.
    #[must_use]
    pub fn new(frame: Frame) -> Self {
        Self {
            frame: Mutex::new(frame),
        }
    }

    /// Returns the current frame.
    #[must_use]
    pub fn load(&self) -> Frame {
        *self.frame.lock()
    }

    /// Replaces the current frame.
    pub fn store(&self, frame: Frame) {
        *self.frame.lock() = frame;
    }

    /// Counts a vsync at the current time and returns the new frame.
    pub fn increment_now(&self) -> Frame {
        self.increment_with_timestamp(HostTime::now())
    }

    /// Counts a vsync at `ust` and returns the new frame.
    pub fn increment_with_timestamp(&self, ust: HostTime) -> Frame {
        let mut frame = self.frame.lock();
        frame.msc = frame.msc.wrapping_add(1);
        frame.ust = ust;
        *frame
    }
}

/// Failures reported by a [`DisplayBuffer`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DisplayError {
    /// The hardware refused or failed an overlay configuration.
    #[error("overlay failed: {0}")]
    Overlay(String),
    /// Presenting the frame failed.
    #[error("post failed: {0}")]
    Post(String),
    /// The device went away.
    #[error("display device lost")]
    DeviceLost,
}

/// One output's drawable target.
pub trait DisplayBuffer: Send + Sync {
    /// The output this buffer belongs to.
    fn id(&self) -> OutputId;

    /// The screen-space rectangle this output shows.
    fn view_area(&self) -> Rect;

    /// Offers the whole renderable list for hardware composition.
    ///
    /// `Ok(true)` means the hardware will show the frame and software
    /// rendering must be skipped; the implementation keeps its own clones of
    /// whatever it scans out. Errors are treated like `Ok(false)` by the
    /// compositor.
    fn overlay(&self, renderables: &[Arc<Renderable>]) -> Result<bool, DisplayError> {
        _ = renderables;
        Ok(false)
    }

    /// Current rotation.
    fn orientation(&self) -> Orientation {
        Orientation::Normal
    }

    /// Current mirroring.
    fn mirror_mode(&self) -> MirrorMode {
        MirrorMode::None
    }

    /// Presents the composed frame.
    fn post(&self) -> Result<(), DisplayError>;

    /// Latest vsync.
    fn frame(&self) -> Frame;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_are_counted_with_their_timestamp() {
        let frame = AtomicFrame::default();
        assert_eq!(frame.load(), Frame::default());

        let f = frame.increment_with_timestamp(HostTime(1_000));
        assert_eq!(f, Frame { msc: 1, ust: HostTime(1_000) });
        assert_eq!(frame.load(), f);

        frame.store(Frame { msc: 41, ust: HostTime(5) });
        let f = frame.increment_now();
        assert_eq!(f.msc, 42);
        assert!(f.ust.nanos() >= 5, "monotonic clock is past the stored stamp");
    }

    #[test]
    fn increments_from_many_threads_are_not_lost() {
        let frame = Arc::new(AtomicFrame::default());
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let frame = Arc::clone(&frame);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        frame.increment_now();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(frame.load().msc, 1_000);
    }

    #[test]
    fn orientation_degrees() {
        assert_eq!(Orientation::Normal.degrees(), 0);
        assert_eq!(Orientation::Right.degrees(), 270);
    }
}

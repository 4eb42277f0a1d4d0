// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reporting hooks for the composition and input pipelines.
//!
//! The compositor and the input sender call these at fixed points. Every
//! method has a default no-op body, so a sink only overrides what it cares
//! about. Sinks must not panic and have no way to influence control flow.
//!
//! Ready-made sinks (pretty printing, `tracing` forwarding) live in the
//! `lithos_debug` crate.

use std::sync::Arc;

use crate::channel::ChannelId;
use crate::output::OutputId;
use crate::scene::Renderable;
use crate::time::HostTime;

/// Receives per-frame composition events.
pub trait CompositorReport: Send + Sync {
    /// Composition of a frame for `output` started.
    fn began_frame(&self, output: OutputId) {
        _ = output;
    }

    /// The renderables that survived occlusion culling.
    fn renderables_in_frame(&self, output: OutputId, renderables: &[Arc<Renderable>]) {
        _ = (output, renderables);
    }

    /// The software renderer drew the frame.
    fn rendered_frame(&self, output: OutputId) {
        _ = output;
    }

    /// Composition of the frame finished, on either path.
    fn finished_frame(&self, output: OutputId) {
        _ = output;
    }
}

/// Receives input publishing events.
pub trait InputReport: Send + Sync {
    /// A key event went out on `channel` as `seq`.
    fn published_key_event(&self, channel: ChannelId, seq: u32, time: HostTime) {
        _ = (channel, seq, time);
    }

    /// A pointer or touch event went out on `channel` as `seq`.
    fn published_motion_event(&self, channel: ChannelId, seq: u32, time: HostTime) {
        _ = (channel, seq, time);
    }

    /// The client finished handling event `seq`.
    fn received_event_finished_signal(&self, channel: ChannelId, seq: u32, handled: bool) {
        _ = (channel, seq, handled);
    }
}

/// A sink that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopReport;

impl CompositorReport for NoopReport {}
impl InputReport for NoopReport {}

// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Report events as `tracing` events.
//!
//! Frame lifecycle and acknowledgements are emitted at `TRACE`, publishing
//! at `DEBUG`, all under the `lithos::report` target.

use std::sync::Arc;

use lithos_core::channel::ChannelId;
use lithos_core::output::OutputId;
use lithos_core::report::{CompositorReport, InputReport};
use lithos_core::scene::Renderable;
use lithos_core::time::HostTime;

/// Forwards every report event to the current `tracing` subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReport;

impl CompositorReport for TracingReport {
    fn began_frame(&self, output: OutputId) {
        tracing::trace!(target: "lithos::report", output = output.0, "began frame");
    }

    fn renderables_in_frame(&self, output: OutputId, renderables: &[Arc<Renderable>]) {
        tracing::trace!(
            target: "lithos::report",
            output = output.0,
            count = renderables.len(),
            "renderables in frame"
        );
    }

    fn rendered_frame(&self, output: OutputId) {
        tracing::trace!(target: "lithos::report", output = output.0, "rendered frame");
    }

    fn finished_frame(&self, output: OutputId) {
        tracing::trace!(target: "lithos::report", output = output.0, "finished frame");
    }
}

impl InputReport for TracingReport {
    fn published_key_event(&self, channel: ChannelId, seq: u32, time: HostTime) {
        tracing::debug!(
            target: "lithos::report",
            channel = channel.0,
            seq,
            time = time.nanos(),
            "published key event"
        );
    }

    fn published_motion_event(&self, channel: ChannelId, seq: u32, time: HostTime) {
        tracing::debug!(
            target: "lithos::report",
            channel = channel.0,
            seq,
            time = time.nanos(),
            "published motion event"
        );
    }

    fn received_event_finished_signal(&self, channel: ChannelId, seq: u32, handled: bool) {
        tracing::trace!(
            target: "lithos::report",
            channel = channel.0,
            seq,
            handled,
            "event finished"
        );
    }
}

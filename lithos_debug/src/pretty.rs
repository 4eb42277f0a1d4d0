// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable report output.
//!
//! [`PrettyPrintReport`] writes one line per event to a
//! [`Write`](std::io::Write) destination (default: stderr). Host times are
//! printed in microseconds.

use std::io::Write;
use std::sync::Arc;

use lithos_core::channel::ChannelId;
use lithos_core::output::OutputId;
use lithos_core::report::{CompositorReport, InputReport};
use lithos_core::scene::Renderable;
use lithos_core::time::HostTime;
use parking_lot::Mutex;

/// Writes human-readable report lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPrintReport<W: Write + Send = Box<dyn Write + Send>> {
    writer: Mutex<W>,
}

impl<W: Write + Send> std::fmt::Debug for PrettyPrintReport<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintReport").finish_non_exhaustive()
    }
}

impl PrettyPrintReport {
    /// Creates a report that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a report that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> PrettyPrintReport<W> {
    /// Creates a report that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the destination.
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    fn line(&self, args: std::fmt::Arguments<'_>) {
        let mut writer = self.writer.lock();
        let _ = writer.write_fmt(args);
        let _ = writer.write_all(b"\n");
    }
}

fn host_us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

impl<W: Write + Send> CompositorReport for PrettyPrintReport<W> {
    fn began_frame(&self, output: OutputId) {
        self.line(format_args!("[frame:begin] output={}", output.0));
    }

    fn renderables_in_frame(&self, output: OutputId, renderables: &[Arc<Renderable>]) {
        let surfaces: Vec<_> = renderables.iter().map(|r| r.surface()).collect();
        self.line(format_args!(
            "[frame:renderables] output={} count={} surfaces={surfaces:?}",
            output.0,
            renderables.len(),
        ));
    }

    fn rendered_frame(&self, output: OutputId) {
        self.line(format_args!("[frame:rendered] output={}", output.0));
    }

    fn finished_frame(&self, output: OutputId) {
        self.line(format_args!("[frame:finished] output={}", output.0));
    }
}

impl<W: Write + Send> InputReport for PrettyPrintReport<W> {
    fn published_key_event(&self, channel: ChannelId, seq: u32, time: HostTime) {
        self.line(format_args!(
            "[input:key] channel={} seq={seq} at={:.1}µs",
            channel.0,
            host_us(time),
        ));
    }

    fn published_motion_event(&self, channel: ChannelId, seq: u32, time: HostTime) {
        self.line(format_args!(
            "[input:motion] channel={} seq={seq} at={:.1}µs",
            channel.0,
            host_us(time),
        ));
    }

    fn received_event_finished_signal(&self, channel: ChannelId, seq: u32, handled: bool) {
        let handled = if handled { "handled" } else { "ignored" };
        self.line(format_args!(
            "[input:ack] channel={} seq={seq} {handled}",
            channel.0,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_lines() {
        let report = PrettyPrintReport::with_writer(Vec::<u8>::new());
        report.began_frame(OutputId(2));
        report.renderables_in_frame(OutputId(2), &[]);
        report.finished_frame(OutputId(2));
        let output = String::from_utf8(report.into_writer()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines,
            [
                "[frame:begin] output=2",
                "[frame:renderables] output=2 count=0 surfaces=[]",
                "[frame:finished] output=2",
            ]
        );
    }

    #[test]
    fn input_lines() {
        let report = PrettyPrintReport::with_writer(Vec::<u8>::new());
        report.published_motion_event(ChannelId(4), 9, HostTime(1_500));
        report.received_event_finished_signal(ChannelId(4), 9, false);
        let output = String::from_utf8(report.into_writer()).unwrap();
        assert!(output.contains("[input:motion] channel=4 seq=9 at=1.5µs"), "got: {output}");
        assert!(output.contains("[input:ack] channel=4 seq=9 ignored"), "got: {output}");
    }
}

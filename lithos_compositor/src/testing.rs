// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles shared by this crate's tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use kurbo::Rect;
use lithos_core::output::{
    AtomicFrame, DisplayBuffer, DisplayError, Frame, MirrorMode, Orientation, OutputId,
};
use lithos_core::report::CompositorReport;
use lithos_core::scene::{Renderable, SceneElement};
use parking_lot::Mutex;

use crate::renderer::Renderer;

/// An event seen by one of the doubles, in order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    Occluded(u64),
    Rendered(u64),
    BeganFrame(OutputId),
    RenderablesInFrame(OutputId, Vec<u64>),
    RenderedFrame(OutputId),
    FinishedFrame(OutputId),
    SetTransform(Orientation, MirrorMode),
    Render(Vec<u64>),
    Suspend,
    Overlay(Vec<u64>),
    Post(OutputId),
}

/// A shared, ordered call log.
pub(crate) type Log = Arc<Mutex<Vec<Call>>>;

fn surface_ids(renderables: &[Arc<Renderable>]) -> Vec<u64> {
    renderables.iter().map(|r| r.surface().0).collect()
}

/// A scene element that logs its outcome.
pub(crate) struct StubElement {
    renderable: Arc<Renderable>,
    log: Option<Log>,
    outcomes: Arc<AtomicUsize>,
}

impl StubElement {
    pub(crate) fn new(renderable: Renderable) -> Self {
        Self {
            renderable: Arc::new(renderable),
            log: None,
            outcomes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn logged(renderable: Renderable, log: &Log) -> Self {
        Self {
            log: Some(Arc::clone(log)),
            ..Self::new(renderable)
        }
    }

    /// Counter of `rendered`/`occluded` calls, readable after the element is
    /// dropped.
    pub(crate) fn outcomes(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.outcomes)
    }

    fn record(&self, call: Call) {
        self.outcomes.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            log.lock().push(call);
        }
    }
}

impl SceneElement for StubElement {
    fn renderable(&self) -> &Arc<Renderable> {
        &self.renderable
    }

    fn rendered(&self) {
        self.record(Call::Rendered(self.renderable.surface().0));
    }

    fn occluded(&self) {
        self.record(Call::Occluded(self.renderable.surface().0));
    }
}

/// A renderer that logs what it is asked to do.
pub(crate) struct RecordingRenderer {
    pub(crate) log: Log,
}

impl Renderer for RecordingRenderer {
    fn set_output_transform(&mut self, orientation: Orientation, mirror: MirrorMode) {
        self.log.lock().push(Call::SetTransform(orientation, mirror));
    }

    fn render(&mut self, renderables: &[Arc<Renderable>]) {
        self.log.lock().push(Call::Render(surface_ids(renderables)));
    }

    fn suspend(&mut self) {
        self.log.lock().push(Call::Suspend);
    }
}

/// How a [`StubDisplay`] answers overlay offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OverlayAnswer {
    Accept,
    Reject,
    Fail,
}

/// An output with a fixed view area.
pub(crate) struct StubDisplay {
    pub(crate) id: OutputId,
    pub(crate) view_area: Rect,
    pub(crate) orientation: Orientation,
    pub(crate) overlay: OverlayAnswer,
    pub(crate) log: Log,
    pub(crate) posts: AtomicUsize,
    pub(crate) panic_on_post: AtomicBool,
    pub(crate) frame: AtomicFrame,
}

impl StubDisplay {
    pub(crate) fn new(id: u32, view_area: Rect, log: &Log) -> Self {
        Self {
            id: OutputId(id),
            view_area,
            orientation: Orientation::Normal,
            overlay: OverlayAnswer::Reject,
            log: Arc::clone(log),
            posts: AtomicUsize::new(0),
            panic_on_post: AtomicBool::new(false),
            frame: AtomicFrame::default(),
        }
    }
}

impl DisplayBuffer for StubDisplay {
    fn id(&self) -> OutputId {
        self.id
    }

    fn view_area(&self) -> Rect {
        self.view_area
    }

    fn overlay(&self, renderables: &[Arc<Renderable>]) -> Result<bool, DisplayError> {
        self.log.lock().push(Call::Overlay(surface_ids(renderables)));
        match self.overlay {
            OverlayAnswer::Accept => Ok(true),
            OverlayAnswer::Reject => Ok(false),
            OverlayAnswer::Fail => Err(DisplayError::Overlay("plane allocation failed".into())),
        }
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn post(&self) -> Result<(), DisplayError> {
        assert!(
            !self.panic_on_post.load(Ordering::SeqCst),
            "display {:?} lost its device",
            self.id
        );
        self.posts.fetch_add(1, Ordering::SeqCst);
        self.frame.increment_now();
        self.log.lock().push(Call::Post(self.id));
        Ok(())
    }

    fn frame(&self) -> Frame {
        self.frame.load()
    }
}

/// A report sink that logs every hook.
pub(crate) struct RecordingReport {
    pub(crate) log: Log,
}

impl CompositorReport for RecordingReport {
    fn began_frame(&self, output: OutputId) {
        self.log.lock().push(Call::BeganFrame(output));
    }

    fn renderables_in_frame(&self, output: OutputId, renderables: &[Arc<Renderable>]) {
        self.log
            .lock()
            .push(Call::RenderablesInFrame(output, surface_ids(renderables)));
    }

    fn rendered_frame(&self, output: OutputId) {
        self.log.lock().push(Call::RenderedFrame(output));
    }

    fn finished_frame(&self, output: OutputId) {
        self.log.lock().push(Call::FinishedFrame(output));
    }
}

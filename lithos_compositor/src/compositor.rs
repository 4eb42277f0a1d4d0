// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One output's frame algorithm.
//!
//! [`DisplayBufferCompositor::composite`] turns a scene snapshot into a
//! frame:
//!
//! 1. Occluded elements are told [`occluded`](SceneElement::occluded), the
//!    rest [`rendered`](SceneElement::rendered) and collected, in order, into
//!    the renderable list. The elements themselves are dropped.
//! 2. The list is offered to the output's hardware overlays. If accepted,
//!    the renderer is suspended and nothing is drawn in software.
//! 3. Otherwise the output transform is applied, the renderer draws the
//!    list, and the list is cleared before returning so that clients get
//!    their buffers back before the (possibly slow) post.
//!
//! Report hooks fire on both paths.

use std::sync::Arc;

use lithos_core::output::DisplayBuffer;
use lithos_core::report::CompositorReport;
use lithos_core::scene::{Renderable, Scene, SceneElement};

use crate::config::CompositorConfig;
use crate::occlusion::filter_occlusions_from;
use crate::renderer::Renderer;

/// Which path a frame took.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FramePath {
    /// Hardware overlays took the frame.
    Overlay,
    /// The software renderer drew the frame.
    Rendered,
}

/// Composes frames for one [`DisplayBuffer`].
pub struct DisplayBufferCompositor {
    display: Arc<dyn DisplayBuffer>,
    renderer: Box<dyn Renderer>,
    report: Arc<dyn CompositorReport>,
    config: CompositorConfig,
}

impl DisplayBufferCompositor {
    /// Creates a compositor drawing into `display` with `renderer`.
    #[must_use]
    pub fn new(
        display: Arc<dyn DisplayBuffer>,
        renderer: Box<dyn Renderer>,
        report: Arc<dyn CompositorReport>,
        config: CompositorConfig,
    ) -> Self {
        Self {
            display,
            renderer,
            report,
            config,
        }
    }

    /// The output being composed.
    #[must_use]
    pub fn display(&self) -> &Arc<dyn DisplayBuffer> {
        &self.display
    }

    /// Takes a snapshot of `scene` for this output and composes it.
    pub fn composite_scene(&mut self, scene: &dyn Scene) -> FramePath {
        let elements = scene.scene_elements_for(self.display.id(), self.display.view_area());
        self.composite(elements)
    }

    /// Composes one frame from `elements` (bottom to top).
    pub fn composite(&mut self, mut elements: Vec<Box<dyn SceneElement>>) -> FramePath {
        let output = self.display.id();
        self.report.began_frame(output);

        if self.config.occlusion_culling {
            let occluded = filter_occlusions_from(&mut elements, self.display.view_area());
            for element in &occluded {
                element.occluded();
            }
        }

        let mut renderables: Vec<Arc<Renderable>> = elements
            .iter()
            .map(|element| {
                element.rendered();
                Arc::clone(element.renderable())
            })
            .collect();
        drop(elements);

        let path = if self.try_overlay(&renderables) {
            self.report.renderables_in_frame(output, &renderables);
            self.renderer.suspend();
            FramePath::Overlay
        } else {
            self.renderer
                .set_output_transform(self.display.orientation(), self.display.mirror_mode());
            self.renderer.render(&renderables);
            self.report.renderables_in_frame(output, &renderables);
            self.report.rendered_frame(output);
            renderables.clear();
            FramePath::Rendered
        };

        self.report.finished_frame(output);
        path
    }

    fn try_overlay(&self, renderables: &[Arc<Renderable>]) -> bool {
        if !self.config.overlay {
            return false;
        }
        match self.display.overlay(renderables) {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::warn!(output = ?self.display.id(), %err, "overlay failed, rendering in software");
                false
            }
        }
    }
}

impl core::fmt::Debug for DisplayBufferCompositor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DisplayBufferCompositor")
            .field("output", &self.display.id())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use kurbo::{Point, Rect, Size};
    use lithos_core::buffer::{BufferId, BufferReleaser, FrameBuffer};
    use lithos_core::output::{Orientation, OutputId};
    use lithos_core::report::NoopReport;
    use lithos_core::scene::SurfaceStack;
    use lithos_core::stream::BufferStream;
    use lithos_core::surface::{SessionId, Surface, SurfaceId, Visibility};
    use parking_lot::Mutex;

    use super::*;
    use crate::testing::{
        Call, Log, OverlayAnswer, RecordingRenderer, RecordingReport, StubDisplay, StubElement,
    };

    const VIEW: Rect = Rect::new(0.0, 0.0, 1024.0, 768.0);

    struct Fixture {
        log: Log,
        display: Arc<StubDisplay>,
    }

    impl Fixture {
        fn new(overlay: OverlayAnswer) -> Self {
            let log = Log::default();
            let mut display = StubDisplay::new(3, VIEW, &log);
            display.overlay = overlay;
            display.orientation = Orientation::Left;
            Self {
                display: Arc::new(display),
                log,
            }
        }

        fn compositor(&self, config: CompositorConfig) -> DisplayBufferCompositor {
            DisplayBufferCompositor::new(
                self.display.clone(),
                Box::new(RecordingRenderer {
                    log: Arc::clone(&self.log),
                }),
                Arc::new(RecordingReport {
                    log: Arc::clone(&self.log),
                }),
                config,
            )
        }

        fn element(&self, id: u64, rect: Rect) -> Box<dyn SceneElement> {
            Box::new(StubElement::logged(renderable(id, rect, None), &self.log))
        }

        fn calls(&self) -> Vec<Call> {
            self.log.lock().clone()
        }
    }

    fn renderable(id: u64, rect: Rect, releaser: Option<Arc<dyn BufferReleaser>>) -> Renderable {
        let mut buffer = FrameBuffer::new(Size::new(rect.width(), rect.height()), false);
        if let Some(releaser) = releaser {
            buffer = buffer.with_releaser(releaser);
        }
        Renderable::new(SurfaceId(id), Arc::new(buffer), rect)
    }

    const OUT: OutputId = OutputId(3);

    #[test]
    fn software_frame_sequence() {
        let fx = Fixture::new(OverlayAnswer::Reject);
        let mut compositor = fx.compositor(CompositorConfig::DEFAULT);
        let path = compositor.composite(vec![
            fx.element(1, Rect::new(10.0, 10.0, 20.0, 20.0)),
            fx.element(2, Rect::new(0.0, 0.0, 100.0, 100.0)),
        ]);
        assert_eq!(path, FramePath::Rendered);
        assert_eq!(
            fx.calls(),
            vec![
                Call::BeganFrame(OUT),
                Call::Occluded(1),
                Call::Rendered(2),
                Call::Overlay(vec![2]),
                Call::SetTransform(Orientation::Left, lithos_core::output::MirrorMode::None),
                Call::Render(vec![2]),
                Call::RenderablesInFrame(OUT, vec![2]),
                Call::RenderedFrame(OUT),
                Call::FinishedFrame(OUT),
            ]
        );
    }

    #[test]
    fn accepted_overlay_skips_render_but_still_reports() {
        let fx = Fixture::new(OverlayAnswer::Accept);
        let mut compositor = fx.compositor(CompositorConfig::DEFAULT);
        let path = compositor.composite(vec![fx.element(1, Rect::new(0.0, 0.0, 10.0, 10.0))]);
        assert_eq!(path, FramePath::Overlay);

        let calls = fx.calls();
        assert!(
            !calls.iter().any(|c| matches!(c, Call::Render(_))),
            "render must not run on the overlay path"
        );
        assert_eq!(
            calls,
            vec![
                Call::BeganFrame(OUT),
                Call::Rendered(1),
                Call::Overlay(vec![1]),
                Call::RenderablesInFrame(OUT, vec![1]),
                Call::Suspend,
                Call::FinishedFrame(OUT),
            ]
        );
    }

    #[test]
    fn overlay_error_falls_back_to_software() {
        let fx = Fixture::new(OverlayAnswer::Fail);
        let mut compositor = fx.compositor(CompositorConfig::DEFAULT);
        let path = compositor.composite(vec![fx.element(1, Rect::new(0.0, 0.0, 10.0, 10.0))]);
        assert_eq!(path, FramePath::Rendered);
        assert!(fx.calls().contains(&Call::Render(vec![1])));
    }

    #[test]
    fn software_only_never_offers_overlays() {
        let fx = Fixture::new(OverlayAnswer::Accept);
        let mut compositor = fx.compositor(CompositorConfig::software_only());
        let path = compositor.composite(vec![fx.element(1, Rect::new(0.0, 0.0, 10.0, 10.0))]);
        assert_eq!(path, FramePath::Rendered);
        assert!(!fx.calls().iter().any(|c| matches!(c, Call::Overlay(_))));
    }

    #[test]
    fn culling_disabled_renders_everything() {
        let fx = Fixture::new(OverlayAnswer::Reject);
        let config = CompositorConfig {
            occlusion_culling: false,
            ..CompositorConfig::DEFAULT
        };
        let mut compositor = fx.compositor(config);
        compositor.composite(vec![
            fx.element(1, Rect::new(10.0, 10.0, 20.0, 20.0)),
            fx.element(2, Rect::new(0.0, 0.0, 100.0, 100.0)),
        ]);
        assert!(fx.calls().contains(&Call::Render(vec![1, 2])));
    }

    #[test]
    fn every_element_gets_exactly_one_outcome() {
        for answer in [OverlayAnswer::Accept, OverlayAnswer::Reject] {
            let fx = Fixture::new(answer);
            let mut compositor = fx.compositor(CompositorConfig::DEFAULT);
            let rects = [
                Rect::new(0.0, 0.0, 50.0, 50.0),
                Rect::new(5000.0, 0.0, 5010.0, 10.0),
                Rect::new(10.0, 10.0, 20.0, 20.0),
                Rect::new(0.0, 0.0, 1024.0, 768.0),
                Rect::new(100.0, 100.0, 200.0, 200.0),
            ];
            let mut counters = Vec::new();
            let elements: Vec<Box<dyn SceneElement>> = rects
                .iter()
                .enumerate()
                .map(|(i, &rect)| {
                    let element = StubElement::new(renderable(i as u64, rect, None));
                    counters.push(element.outcomes());
                    Box::new(element) as Box<dyn SceneElement>
                })
                .collect();
            compositor.composite(elements);
            for (i, counter) in counters.iter().enumerate() {
                assert_eq!(counter.load(Ordering::SeqCst), 1, "element {i} with {answer:?}");
            }
        }
    }

    #[test]
    fn buffers_are_released_before_composite_returns_on_software_path() {
        #[derive(Default)]
        struct Releases(Mutex<Vec<BufferId>>);
        impl BufferReleaser for Releases {
            fn release(&self, id: BufferId) {
                self.0.lock().push(id);
            }
        }

        let fx = Fixture::new(OverlayAnswer::Reject);
        let mut compositor = fx.compositor(CompositorConfig::DEFAULT);
        let releases = Arc::new(Releases::default());
        let releaser = || Some(releases.clone() as Arc<dyn BufferReleaser>);
        let shown = renderable(1, Rect::new(0.0, 0.0, 10.0, 10.0), releaser());
        let hidden = renderable(2, Rect::new(0.0, 0.0, 5.0, 5.0), releaser());
        let ids = [shown.buffer().id(), hidden.buffer().id()];

        compositor.composite(vec![
            Box::new(StubElement::new(hidden)),
            Box::new(StubElement::new(shown)),
        ]);
        let mut released = releases.0.lock().clone();
        released.sort();
        let mut expected = ids.to_vec();
        expected.sort();
        assert_eq!(released, expected, "both buffers go back to the client");
    }

    #[test]
    fn posting_is_left_to_the_caller() {
        let fx = Fixture::new(OverlayAnswer::Reject);
        let mut compositor = fx.compositor(CompositorConfig::DEFAULT);
        compositor.composite(Vec::new());
        assert_eq!(fx.display.posts.load(Ordering::SeqCst), 0);
        assert_eq!(
            fx.calls(),
            vec![
                Call::BeganFrame(OUT),
                Call::Overlay(vec![]),
                Call::SetTransform(Orientation::Left, lithos_core::output::MirrorMode::None),
                Call::Render(vec![]),
                Call::RenderablesInFrame(OUT, vec![]),
                Call::RenderedFrame(OUT),
                Call::FinishedFrame(OUT),
            ]
        );
    }

    #[test]
    fn outputs_leave_surfaces_they_do_not_show_alone() {
        let log = Log::default();
        let left_display = Arc::new(StubDisplay::new(1, Rect::new(0.0, 0.0, 100.0, 100.0), &log));
        let right_display =
            Arc::new(StubDisplay::new(2, Rect::new(100.0, 0.0, 200.0, 100.0), &log));
        let compositor_for = |display: &Arc<StubDisplay>| {
            DisplayBufferCompositor::new(
                Arc::clone(display) as Arc<dyn DisplayBuffer>,
                Box::new(RecordingRenderer {
                    log: Arc::clone(&log),
                }),
                Arc::new(NoopReport),
                CompositorConfig::software_only(),
            )
        };
        let mut left = compositor_for(&left_display);
        let mut right = compositor_for(&right_display);

        let scene = SurfaceStack::new();
        let stream = Arc::new(BufferStream::new(false));
        let ids: Vec<_> = (0..3)
            .map(|_| {
                let buffer = Arc::new(FrameBuffer::new(Size::new(50.0, 50.0), false));
                let id = buffer.id();
                stream.submit_buffer(buffer);
                id
            })
            .collect();
        let surface = Arc::new(
            Surface::new("s", SessionId(1), Point::ZERO, Size::new(50.0, 50.0))
                .with_stream(Arc::clone(&stream)),
        );
        scene.add_surface(Arc::clone(&surface));

        right.composite_scene(&scene);
        assert_eq!(stream.buffers_ready_for_compositor(), 3, "right took no buffer");
        assert_eq!(surface.visibility(), None, "right never saw s");

        for (shown, &id) in ids.iter().enumerate() {
            left.composite_scene(&scene);
            right.composite_scene(&scene);
            assert_eq!(stream.buffers_ready_for_compositor(), 2 - shown);
            assert_eq!(surface.visibility(), Some(Visibility::Exposed));
            // An output that has never composed reads the front without advancing it.
            let front = stream.lock_compositor_buffer(OutputId(99));
            assert_eq!(front.map(|b| b.id()), Some(id));
        }
    }
}

// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One compositing thread per output.
//!
//! [`MultiThreadedCompositor`] owns a named thread for each
//! [`DisplayBuffer`]. Each thread sleeps until frames are scheduled, takes a
//! scene snapshot for its own view area, composes it with its own
//! [`DisplayBufferCompositor`] and posts. Outputs never wait on each other.
//!
//! A scene observer schedules one frame on every output whenever the scene
//! changes. After a frame, an output schedules another one for itself if
//! buffers are still waiting.

use core::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use lithos_core::output::{DisplayBuffer, OutputId};
use lithos_core::report::CompositorReport;
use lithos_core::scene::{Scene, SceneObserver};
use parking_lot::{Condvar, Mutex};

use crate::compositor::DisplayBufferCompositor;
use crate::config::CompositorConfig;
use crate::renderer::RendererFactory;

#[derive(Debug)]
struct Pending {
    frames_scheduled: u32,
    running: bool,
}

/// State shared between one output thread and its schedulers.
#[derive(Debug)]
struct WorkerShared {
    pending: Mutex<Pending>,
    wake: Condvar,
}

impl WorkerShared {
    fn new() -> Self {
        Self {
            pending: Mutex::new(Pending {
                frames_scheduled: 0,
                running: true,
            }),
            wake: Condvar::new(),
        }
    }

    /// Raises the scheduled count to at least `frames`.
    fn schedule(&self, frames: u32) {
        let mut pending = self.pending.lock();
        if pending.frames_scheduled < frames {
            pending.frames_scheduled = frames;
            self.wake.notify_one();
        }
    }

    fn stop(&self) {
        self.pending.lock().running = false;
        self.wake.notify_one();
    }

    /// Blocks until a frame is due. Returns `false` once stopped.
    fn wait_for_frame(&self) -> bool {
        let mut pending = self.pending.lock();
        while pending.running && pending.frames_scheduled == 0 {
            self.wake.wait(&mut pending);
        }
        if !pending.running {
            return false;
        }
        pending.frames_scheduled -= 1;
        true
    }
}

struct Worker {
    output: OutputId,
    shared: Arc<WorkerShared>,
    handle: JoinHandle<()>,
}

struct SchedulingObserver {
    workers: Vec<Arc<WorkerShared>>,
}

impl SceneObserver for SchedulingObserver {
    fn scene_changed(&self) {
        for worker in &self.workers {
            worker.schedule(1);
        }
    }
}

#[derive(Default)]
struct Running {
    workers: Vec<Worker>,
    observer: Option<Arc<dyn SceneObserver>>,
}

/// Composes every output on its own thread.
pub struct MultiThreadedCompositor {
    displays: Vec<Arc<dyn DisplayBuffer>>,
    scene: Arc<dyn Scene>,
    renderer_factory: Arc<dyn RendererFactory>,
    report: Arc<dyn CompositorReport>,
    config: CompositorConfig,
    running: Mutex<Running>,
}

impl MultiThreadedCompositor {
    /// Creates a stopped compositor for `displays`.
    #[must_use]
    pub fn new(
        displays: Vec<Arc<dyn DisplayBuffer>>,
        scene: Arc<dyn Scene>,
        renderer_factory: Arc<dyn RendererFactory>,
        report: Arc<dyn CompositorReport>,
        config: CompositorConfig,
    ) -> Self {
        Self {
            displays,
            scene,
            renderer_factory,
            report,
            config,
            running: Mutex::new(Running::default()),
        }
    }

    /// Starts one thread per output and begins listening to the scene.
    ///
    /// Does nothing if already started.
    pub fn start(&self) {
        let mut running = self.running.lock();
        if running.observer.is_some() {
            return;
        }

        for display in &self.displays {
            if let Some(worker) = self.spawn_worker(display) {
                running.workers.push(worker);
            }
        }

        let observer: Arc<dyn SceneObserver> = Arc::new(SchedulingObserver {
            workers: running.workers.iter().map(|w| Arc::clone(&w.shared)).collect(),
        });
        self.scene.add_observer(&observer);
        running.observer = Some(observer);

        for worker in &running.workers {
            worker.shared.schedule(self.config.initial_frames);
        }
        tracing::debug!(outputs = running.workers.len(), "compositor started");
    }

    /// Stops listening to the scene and joins every output thread.
    ///
    /// Does nothing if not started. A thread that panicked is logged and
    /// does not prevent the others from being joined.
    pub fn stop(&self) {
        let mut running = self.running.lock();
        let Some(observer) = running.observer.take() else {
            return;
        };
        self.scene.remove_observer(&observer);

        let workers = core::mem::take(&mut running.workers);
        for worker in &workers {
            worker.shared.stop();
        }
        for worker in workers {
            if worker.handle.join().is_err() {
                tracing::error!(output = ?worker.output, "compositing thread panicked");
            }
        }
        tracing::debug!("compositor stopped");
    }

    /// Whether output threads are running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.lock().observer.is_some()
    }

    /// Schedules at least `frames` frames on every output.
    pub fn schedule_compositing(&self, frames: u32) {
        for worker in &self.running.lock().workers {
            worker.shared.schedule(frames);
        }
    }

    fn spawn_worker(&self, display: &Arc<dyn DisplayBuffer>) -> Option<Worker> {
        let output = display.id();
        let shared = Arc::new(WorkerShared::new());
        let thread_shared = Arc::clone(&shared);
        let display = Arc::clone(display);
        let scene = Arc::clone(&self.scene);
        let factory = Arc::clone(&self.renderer_factory);
        let report = Arc::clone(&self.report);
        let config = self.config;

        let spawned = thread::Builder::new()
            .name(format!("lithos-comp-{}", output.0))
            .spawn(move || {
                let renderer = factory.create_renderer_for(&display);
                let mut compositor =
                    DisplayBufferCompositor::new(Arc::clone(&display), renderer, report, config);
                run_output(&thread_shared, &mut compositor, scene.as_ref());
            });

        match spawned {
            Ok(handle) => Some(Worker {
                output,
                shared,
                handle,
            }),
            Err(err) => {
                tracing::error!(?output, %err, "failed to spawn compositing thread");
                None
            }
        }
    }
}

fn run_output(shared: &WorkerShared, compositor: &mut DisplayBufferCompositor, scene: &dyn Scene) {
    let output = compositor.display().id();
    tracing::trace!(?output, "compositing thread running");
    while shared.wait_for_frame() {
        compositor.composite_scene(scene);
        if let Err(err) = compositor.display().post() {
            tracing::warn!(?output, %err, "post failed");
        }
        if scene.frames_pending(output, compositor.display().view_area()) > 0 {
            shared.schedule(1);
        }
    }
    tracing::trace!(?output, "compositing thread exiting");
}

impl Drop for MultiThreadedCompositor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for MultiThreadedCompositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiThreadedCompositor")
            .field("outputs", &self.displays.iter().map(|d| d.id()).collect::<Vec<_>>())
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::{Duration, Instant};

    use kurbo::{Point, Rect, Size};
    use lithos_core::buffer::{BufferId, FrameBuffer};
    use lithos_core::output::{MirrorMode, Orientation};
    use lithos_core::scene::Renderable;
    use lithos_core::report::NoopReport;
    use lithos_core::scene::SurfaceStack;
    use lithos_core::stream::BufferStream;
    use lithos_core::surface::{SessionId, Surface};

    use super::*;
    use crate::renderer::Renderer;
    use crate::testing::{Log, RecordingRenderer, StubDisplay};

    fn wait_until(what: &str, mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::sleep(Duration::from_millis(1));
        }
    }

    struct Fixture {
        log: Log,
        scene: Arc<SurfaceStack>,
        displays: Vec<Arc<StubDisplay>>,
    }

    impl Fixture {
        fn new(outputs: u32) -> Self {
            let log = Log::default();
            let displays = (0..outputs)
                .map(|i| {
                    let x = f64::from(i) * 100.0;
                    Arc::new(StubDisplay::new(i, Rect::new(x, 0.0, x + 100.0, 100.0), &log))
                })
                .collect();
            Self {
                log,
                scene: Arc::new(SurfaceStack::new()),
                displays,
            }
        }

        fn compositor(&self, config: CompositorConfig) -> MultiThreadedCompositor {
            let log = Arc::clone(&self.log);
            let factory = move |_: &Arc<dyn DisplayBuffer>| -> Box<dyn Renderer> {
                Box::new(RecordingRenderer {
                    log: Arc::clone(&log),
                })
            };
            self.compositor_with(Arc::new(factory), config)
        }

        fn compositor_with(
            &self,
            factory: Arc<dyn RendererFactory>,
            config: CompositorConfig,
        ) -> MultiThreadedCompositor {
            MultiThreadedCompositor::new(
                self.displays
                    .iter()
                    .map(|d| Arc::clone(d) as Arc<dyn DisplayBuffer>)
                    .collect(),
                self.scene.clone(),
                factory,
                Arc::new(NoopReport),
                config,
            )
        }

        fn posts(&self, i: usize) -> usize {
            self.displays[i].posts.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn initial_frames_are_posted_on_every_output() {
        let fx = Fixture::new(2);
        let compositor = fx.compositor(CompositorConfig {
            initial_frames: 2,
            ..CompositorConfig::DEFAULT
        });
        compositor.start();
        wait_until("two posts per output", || fx.posts(0) == 2 && fx.posts(1) == 2);
        compositor.stop();
        assert_eq!(fx.posts(0), 2);
        assert_eq!(fx.posts(1), 2);
    }

    #[test]
    fn scene_changes_schedule_frames() {
        let fx = Fixture::new(1);
        let compositor = fx.compositor(CompositorConfig {
            initial_frames: 0,
            ..CompositorConfig::DEFAULT
        });
        compositor.start();
        let surface = Arc::new(Surface::new("s", SessionId(1), Point::ZERO, Size::new(10.0, 10.0)));
        fx.scene.add_surface(surface);
        wait_until("a frame for the new surface", || fx.posts(0) >= 1);
        compositor.stop();
    }

    #[test]
    fn pending_buffers_keep_the_output_busy() {
        let fx = Fixture::new(1);
        let stream = Arc::new(BufferStream::new(false));
        let surface = Surface::new("s", SessionId(1), Point::ZERO, Size::new(10.0, 10.0))
            .with_stream(Arc::clone(&stream));
        for _ in 0..3 {
            stream.submit_buffer(Arc::new(FrameBuffer::new(Size::new(10.0, 10.0), false)));
        }
        fx.scene.add_surface(Arc::new(surface));

        let compositor = fx.compositor(CompositorConfig::DEFAULT);
        compositor.start();
        wait_until("every buffer consumed", || {
            stream.buffers_ready_for_compositor() == 0 && fx.posts(0) >= 3
        });
        compositor.stop();
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let fx = Fixture::new(1);
        let compositor = fx.compositor(CompositorConfig::DEFAULT);
        compositor.stop();
        compositor.start();
        compositor.start();
        assert!(compositor.is_running());
        wait_until("first frame", || fx.posts(0) >= 1);
        compositor.stop();
        compositor.stop();
        assert!(!compositor.is_running());

        // Stopped: scene changes no longer produce frames.
        let before = fx.posts(0);
        fx.scene.notify_scene_changed();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(fx.posts(0), before);
    }

    #[test]
    fn a_panicking_output_does_not_stop_the_others() {
        let fx = Fixture::new(2);
        fx.displays[0].panic_on_post.store(true, Ordering::SeqCst);
        let compositor = fx.compositor(CompositorConfig::DEFAULT);
        compositor.start();
        wait_until("healthy output posts", || fx.posts(1) >= 1);

        fx.scene.notify_scene_changed();
        wait_until("healthy output keeps posting", || fx.posts(1) >= 2);
        compositor.stop();
        assert_eq!(fx.posts(0), 0);
    }

    #[test]
    fn each_output_renders_its_own_frame() {
        let fx = Fixture::new(2);
        let compositor = fx.compositor(CompositorConfig::software_only());
        compositor.start();
        wait_until("both outputs posted", || fx.posts(0) >= 1 && fx.posts(1) >= 1);
        compositor.stop();
        let renders = fx
            .log
            .lock()
            .iter()
            .filter(|c| matches!(c, crate::testing::Call::Render(_)))
            .count();
        assert!(renders >= 2, "one software render per output");
    }

    /// Buffers drawn per output, in order.
    type Shown = Arc<Mutex<Vec<(OutputId, BufferId)>>>;

    struct BufferRenderer {
        output: OutputId,
        shown: Shown,
    }

    impl Renderer for BufferRenderer {
        fn set_output_transform(&mut self, _orientation: Orientation, _mirror: MirrorMode) {}

        fn render(&mut self, renderables: &[Arc<Renderable>]) {
            let mut shown = self.shown.lock();
            for renderable in renderables {
                shown.push((self.output, renderable.buffer().id()));
            }
        }

        fn suspend(&mut self) {}
    }

    #[test]
    fn hosting_output_shows_every_buffer_while_another_output_runs() {
        let fx = Fixture::new(2);
        let stream = Arc::new(BufferStream::new(false));
        let surface = Surface::new("s", SessionId(1), Point::ZERO, Size::new(50.0, 50.0))
            .with_stream(Arc::clone(&stream));
        let ids: Vec<_> = (0..5)
            .map(|_| {
                let buffer = Arc::new(FrameBuffer::new(Size::new(50.0, 50.0), false));
                let id = buffer.id();
                stream.submit_buffer(buffer);
                id
            })
            .collect();
        fx.scene.add_surface(Arc::new(surface));

        let shown = Shown::default();
        let factory_shown = Arc::clone(&shown);
        let factory = move |display: &Arc<dyn DisplayBuffer>| -> Box<dyn Renderer> {
            Box::new(BufferRenderer {
                output: display.id(),
                shown: Arc::clone(&factory_shown),
            })
        };
        let compositor = fx.compositor_with(Arc::new(factory), CompositorConfig::software_only());
        compositor.start();
        let last = ids[ids.len() - 1];
        wait_until("the last buffer on output 0", || {
            shown.lock().contains(&(OutputId(0), last))
        });
        // Keep output 1 busy for a while after output 0 has drained.
        fx.scene.notify_scene_changed();
        wait_until("output 1 posted", || fx.posts(1) >= 2);
        compositor.stop();

        let shown = shown.lock();
        let mut on_host: Vec<_> = shown
            .iter()
            .filter(|(output, _)| *output == OutputId(0))
            .map(|&(_, id)| id)
            .collect();
        on_host.dedup();
        assert_eq!(on_host, ids, "every buffer, in submission order");
        assert!(
            !shown.iter().any(|(output, _)| *output == OutputId(1)),
            "output 1 does not show s"
        );
    }
}

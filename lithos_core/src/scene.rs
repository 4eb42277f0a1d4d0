// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene: stacked surfaces and their per-frame elements.
//!
//! [`SurfaceStack`] is the [`Scene`] implementation: an ordered list of
//! surfaces (bottom to top) behind a reader/writer lock, plus an observer
//! registry. Observers are notified after the stack lock is released, so an
//! observer may read the scene from within a callback.
//!
//! Each compositor frame asks the scene for
//! [`scene_elements_for`](Scene::scene_elements_for) its output and view
//! area. That produces one [`SceneElement`] per stream of each visible
//! surface overlapping the view area that has a buffer to show, bottom to
//! top. Surfaces outside the view area are left untouched, so their streams
//! only advance for the outputs that show them. The compositor tells every
//! element exactly once whether it was [`rendered`](SceneElement::rendered)
//! or [`occluded`](SceneElement::occluded), then drops it.

use core::fmt;
use std::sync::{Arc, Weak};

use kurbo::{Affine, Point, Rect, Size};
use parking_lot::RwLock;

use crate::buffer::FrameBuffer;
use crate::observer::ObserverMultiplexer;
use crate::output::OutputId;
use crate::surface::{Surface, SurfaceId};

/// One buffer positioned on screen for one frame.
pub struct Renderable {
    surface: SurfaceId,
    buffer: Arc<FrameBuffer>,
    screen_rect: Rect,
    alpha: f64,
    shaped: bool,
    transform: Affine,
}

impl Renderable {
    /// Creates a fully opaque, untransformed renderable.
    #[must_use]
    pub fn new(surface: SurfaceId, buffer: Arc<FrameBuffer>, screen_rect: Rect) -> Self {
        let shaped = buffer.has_alpha();
        Self {
            surface,
            buffer,
            screen_rect,
            alpha: 1.0,
            shaped,
            transform: Affine::IDENTITY,
        }
    }

    /// Sets the plane alpha.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Marks the content as non-rectangular (per-pixel alpha).
    #[must_use]
    pub fn with_shaped(mut self, shaped: bool) -> Self {
        self.shaped = shaped;
        self
    }

    /// Sets the transform applied around the screen rectangle.
    #[must_use]
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    /// The surface this was generated from.
    #[must_use]
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// The buffer to show.
    #[must_use]
    pub fn buffer(&self) -> &Arc<FrameBuffer> {
        &self.buffer
    }

    /// Screen-space destination.
    #[must_use]
    pub fn screen_rect(&self) -> Rect {
        self.screen_rect
    }

    /// Plane alpha.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Whether the content has per-pixel transparency.
    #[must_use]
    pub fn shaped(&self) -> bool {
        self.shaped
    }

    /// Transform applied when drawing.
    #[must_use]
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Whether this hides everything behind its screen rectangle.
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.alpha >= 1.0 && !self.shaped && self.transform == Affine::IDENTITY
    }
}

impl fmt::Debug for Renderable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderable")
            .field("surface", &self.surface)
            .field("buffer", &self.buffer.id())
            .field("screen_rect", &self.screen_rect)
            .field("alpha", &self.alpha)
            .field("shaped", &self.shaped)
            .field("transform", &self.transform)
            .finish()
    }
}

/// A renderable with a one-shot composition outcome.
pub trait SceneElement: Send {
    /// The renderable to draw.
    fn renderable(&self) -> &Arc<Renderable>;

    /// The element was drawn in this frame.
    fn rendered(&self);

    /// The element was culled from this frame.
    fn occluded(&self);
}

/// A [`SceneElement`] that records its outcome on the source surface.
pub struct SurfaceSceneElement {
    renderable: Arc<Renderable>,
    surface: Weak<Surface>,
}

impl SurfaceSceneElement {
    /// Wraps `renderable` for `surface`.
    #[must_use]
    pub fn new(renderable: Renderable, surface: &Arc<Surface>) -> Self {
        Self {
            renderable: Arc::new(renderable),
            surface: Arc::downgrade(surface),
        }
    }
}

impl SceneElement for SurfaceSceneElement {
    fn renderable(&self) -> &Arc<Renderable> {
        &self.renderable
    }

    fn rendered(&self) {
        if let Some(surface) = self.surface.upgrade() {
            surface.mark_exposed();
        }
    }

    fn occluded(&self) {
        if let Some(surface) = self.surface.upgrade() {
            surface.mark_occluded();
        }
    }
}

impl fmt::Debug for SurfaceSceneElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceSceneElement")
            .field("renderable", &self.renderable)
            .finish_non_exhaustive()
    }
}

/// Scene membership and geometry notifications.
///
/// All methods default to no-ops. Callbacks run on the thread that changed
/// the scene, after the scene lock has been released.
pub trait SceneObserver: Send + Sync {
    /// `surface` was added on top of the stack.
    fn surface_added(&self, surface: &Arc<Surface>) {
        _ = surface;
    }

    /// `surface` was removed from the stack.
    fn surface_removed(&self, surface: &Arc<Surface>) {
        _ = surface;
    }

    /// `surface` moved to `top_left`.
    fn surface_moved(&self, surface: &Arc<Surface>, top_left: Point) {
        _ = (surface, top_left);
    }

    /// `surface` was resized to `size`.
    fn surface_resized(&self, surface: &Arc<Surface>, size: Size) {
        _ = (surface, size);
    }

    /// Something visible changed and outputs should redraw.
    fn scene_changed(&self) {}
}

/// What the compositor and dispatcher need from a scene.
pub trait Scene: Send + Sync {
    /// Elements for one frame of `output`, which shows `view_area`, bottom
    /// to top.
    ///
    /// Advances the stream of every surface in `view_area` for `output`.
    fn scene_elements_for(&self, output: OutputId, view_area: Rect)
    -> Vec<Box<dyn SceneElement>>;

    /// Every surface, topmost first.
    fn surfaces_top_to_bottom(&self) -> Vec<Arc<Surface>>;

    /// Number of streams in `view_area` with a buffer `output` has not
    /// composed yet.
    fn frames_pending(&self, output: OutputId, view_area: Rect) -> usize;

    /// Registers `observer` for future changes.
    fn add_observer(&self, observer: &Arc<dyn SceneObserver>);

    /// Unregisters `observer`.
    fn remove_observer(&self, observer: &Arc<dyn SceneObserver>);
}

/// Surfaces in stacking order.
#[derive(Debug, Default)]
pub struct SurfaceStack {
    surfaces: RwLock<Vec<Arc<Surface>>>,
    observers: ObserverMultiplexer<dyn SceneObserver>,
}

impl SurfaceStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `surface` on top. Adding a surface already in the stack does
    /// nothing.
    pub fn add_surface(&self, surface: Arc<Surface>) {
        {
            let mut surfaces = self.surfaces.write();
            if surfaces.iter().any(|s| s.id() == surface.id()) {
                return;
            }
            surfaces.push(Arc::clone(&surface));
        }
        tracing::debug!(surface = ?surface.id(), name = surface.name(), "surface added");
        self.observers.for_each(|o| {
            o.surface_added(&surface);
            o.scene_changed();
        });
    }

    /// Removes the surface `id`, returning it if it was present.
    pub fn remove_surface(&self, id: SurfaceId) -> Option<Arc<Surface>> {
        let removed = {
            let mut surfaces = self.surfaces.write();
            let index = surfaces.iter().position(|s| s.id() == id)?;
            surfaces.remove(index)
        };
        tracing::debug!(surface = ?id, "surface removed");
        self.observers.for_each(|o| {
            o.surface_removed(&removed);
            o.scene_changed();
        });
        Some(removed)
    }

    /// Moves the surface `id` to the top. Returns `false` if unknown.
    pub fn raise(&self, id: SurfaceId) -> bool {
        {
            let mut surfaces = self.surfaces.write();
            let Some(index) = surfaces.iter().position(|s| s.id() == id) else {
                return false;
            };
            let surface = surfaces.remove(index);
            surfaces.push(surface);
        }
        self.observers.for_each(|o| o.scene_changed());
        true
    }

    /// Moves the surface `id` so its top-left is at `top_left`.
    pub fn move_surface(&self, id: SurfaceId, top_left: Point) -> bool {
        let Some(surface) = self.find(id) else {
            return false;
        };
        surface.move_to(top_left);
        self.observers.for_each(|o| {
            o.surface_moved(&surface, top_left);
            o.scene_changed();
        });
        true
    }

    /// Resizes the surface `id`.
    pub fn resize_surface(&self, id: SurfaceId, size: Size) -> bool {
        let Some(surface) = self.find(id) else {
            return false;
        };
        surface.resize(size);
        self.observers.for_each(|o| {
            o.surface_resized(&surface, size);
            o.scene_changed();
        });
        true
    }

    /// Tells observers that content changed (e.g. a buffer was submitted).
    pub fn notify_scene_changed(&self) {
        self.observers.for_each(|o| o.scene_changed());
    }

    /// Looks up a surface by id.
    #[must_use]
    pub fn find(&self, id: SurfaceId) -> Option<Arc<Surface>> {
        self.surfaces.read().iter().find(|s| s.id() == id).cloned()
    }

    /// Number of surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.read().len()
    }

    /// Whether the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.read().is_empty()
    }
}

fn shown_in(surface: &Surface, view_area: Rect) -> bool {
    surface.visible() && !surface.rect().intersect(view_area).is_zero_area()
}

impl Scene for SurfaceStack {
    fn scene_elements_for(
        &self,
        output: OutputId,
        view_area: Rect,
    ) -> Vec<Box<dyn SceneElement>> {
        let surfaces = self.surfaces.read().clone();
        let mut elements: Vec<Box<dyn SceneElement>> = Vec::new();
        for surface in surfaces.iter().filter(|s| shown_in(s, view_area)) {
            let rect = surface.rect();
            let alpha = surface.alpha();
            for stream in surface.streams() {
                let Some(buffer) = stream.lock_compositor_buffer(output) else {
                    continue;
                };
                let renderable = Renderable::new(surface.id(), buffer, rect)
                    .with_alpha(alpha)
                    .with_shaped(stream.has_alpha());
                elements.push(Box::new(SurfaceSceneElement::new(renderable, surface)));
            }
        }
        tracing::trace!(?output, ?view_area, elements = elements.len(), "scene snapshot");
        elements
    }

    fn surfaces_top_to_bottom(&self) -> Vec<Arc<Surface>> {
        self.surfaces.read().iter().rev().cloned().collect()
    }

    fn frames_pending(&self, output: OutputId, view_area: Rect) -> usize {
        self.surfaces
            .read()
            .iter()
            .filter(|s| shown_in(s, view_area))
            .flat_map(|s| s.streams())
            .filter(|stream| stream.has_frame_for(output))
            .count()
    }

    fn add_observer(&self, observer: &Arc<dyn SceneObserver>) {
        self.observers.register(observer);
    }

    fn remove_observer(&self, observer: &Arc<dyn SceneObserver>) {
        self.observers.unregister(observer);
    }
}

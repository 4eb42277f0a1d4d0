// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Client surfaces.
//!
//! A [`Surface`] is a client window as the server sees it: screen-space
//! geometry, a window-state stack, an input shape, buffer streams and an
//! optional input channel. Surfaces are shared as `Arc<Surface>` by the
//! scene; everything else (dispatcher focus and gesture slots, senders)
//! refers to them weakly or by [`SurfaceId`].
//!
//! Geometry is changed through the scene
//! ([`SurfaceStack::move_surface`](crate::scene::SurfaceStack::move_surface)
//! and friends) so that observers hear about it.

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use kurbo::{Point, Rect, Size};
use parking_lot::{Mutex, RwLock};

use crate::channel::InputChannel;
use crate::stream::BufferStream;
use crate::window_state::{SurfaceStateStack, WindowState};

/// Identifies a surface.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    /// Allocates a process-unique surface id.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// Identifies the client session owning a surface.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct SessionId(pub u32);

/// Last composition outcome of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Drawn in the most recent frame that included it.
    Exposed,
    /// Fully covered or off-screen in the most recent frame.
    Occluded,
}

/// A client window.
pub struct Surface {
    id: SurfaceId,
    name: String,
    session: SessionId,
    rect: RwLock<Rect>,
    /// Input-accepting rectangles in surface-local coordinates. Empty means
    /// the whole surface.
    input_shape: RwLock<Vec<Rect>>,
    states: Mutex<SurfaceStateStack>,
    alpha: RwLock<f64>,
    streams: RwLock<Vec<Arc<BufferStream>>>,
    input_channel: Option<Arc<InputChannel>>,
    visibility: Mutex<Option<Visibility>>,
    frames_composed: AtomicU64,
}

impl Surface {
    /// Creates a restored, fully opaque surface at `top_left` with `size`.
    #[must_use]
    pub fn new(name: impl Into<String>, session: SessionId, top_left: Point, size: Size) -> Self {
        Self {
            id: SurfaceId::next(),
            name: name.into(),
            session,
            rect: RwLock::new(Rect::from_origin_size(top_left, size)),
            input_shape: RwLock::new(Vec::new()),
            states: Mutex::new(SurfaceStateStack::default()),
            alpha: RwLock::new(1.0),
            streams: RwLock::new(Vec::new()),
            input_channel: None,
            visibility: Mutex::new(None),
            frames_composed: AtomicU64::new(0),
        }
    }

    /// Attaches the channel events for this surface are published on.
    #[must_use]
    pub fn with_input_channel(mut self, channel: Arc<InputChannel>) -> Self {
        self.input_channel = Some(channel);
        self
    }

    /// Adds a buffer stream on top of any existing ones.
    #[must_use]
    pub fn with_stream(self, stream: Arc<BufferStream>) -> Self {
        self.streams.write().push(stream);
        self
    }

    /// Returns the surface id.
    #[must_use]
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Returns the surface name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning session.
    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Screen-space bounds.
    #[must_use]
    pub fn rect(&self) -> Rect {
        *self.rect.read()
    }

    /// Screen-space top-left corner.
    #[must_use]
    pub fn top_left(&self) -> Point {
        self.rect.read().origin()
    }

    /// Surface size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.rect.read().size()
    }

    pub(crate) fn move_to(&self, top_left: Point) {
        let mut rect = self.rect.write();
        *rect = rect.with_origin(top_left);
    }

    pub(crate) fn resize(&self, size: Size) {
        let mut rect = self.rect.write();
        *rect = rect.with_size(size);
    }

    /// Replaces the input shape. Rectangles are surface-local; an empty
    /// shape accepts input over the whole surface.
    pub fn set_input_shape(&self, shape: Vec<Rect>) {
        *self.input_shape.write() = shape;
    }

    /// Whether the surface is visible and accepts input at screen `point`.
    #[must_use]
    pub fn input_area_contains(&self, point: Point) -> bool {
        if !self.visible() {
            return false;
        }
        let rect = self.rect();
        if !rect.contains(point) {
            return false;
        }
        let shape = self.input_shape.read();
        if shape.is_empty() {
            return true;
        }
        let local = point - rect.origin().to_vec2();
        shape.iter().any(|r| r.contains(local))
    }

    /// Screen-space bounds of the input shape.
    #[must_use]
    pub fn input_bounds(&self) -> Rect {
        let rect = self.rect();
        let shape = self.input_shape.read();
        let offset = rect.origin().to_vec2();
        shape
            .iter()
            .map(|r| *r + offset)
            .reduce(|a, b| a.union(b))
            .map_or(rect, |bounds| bounds.intersect(rect))
    }

    /// Returns a copy of the window-state stack.
    #[must_use]
    pub fn states(&self) -> SurfaceStateStack {
        *self.states.lock()
    }

    /// The active window state.
    #[must_use]
    pub fn state(&self) -> WindowState {
        self.states.lock().active_state()
    }

    /// Applies `change` to the window-state stack and returns the new active
    /// state.
    pub fn update_states(&self, change: impl FnOnce(&mut SurfaceStateStack)) -> WindowState {
        let mut states = self.states.lock();
        change(&mut states);
        states.active_state()
    }

    /// Whether the surface should be drawn and hit-tested.
    #[must_use]
    pub fn visible(&self) -> bool {
        !matches!(self.state(), WindowState::Minimized | WindowState::Hidden)
    }

    /// Surface-wide opacity in `0.0..=1.0`.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        *self.alpha.read()
    }

    /// Sets the surface-wide opacity, clamped to `0.0..=1.0`.
    pub fn set_alpha(&self, alpha: f64) {
        *self.alpha.write() = alpha.clamp(0.0, 1.0);
    }

    /// The buffer streams, bottom first.
    #[must_use]
    pub fn streams(&self) -> Vec<Arc<BufferStream>> {
        self.streams.read().clone()
    }

    /// Adds a buffer stream on top of existing ones.
    pub fn add_stream(&self, stream: Arc<BufferStream>) {
        self.streams.write().push(stream);
    }

    /// The input channel, if the surface has one.
    #[must_use]
    pub fn input_channel(&self) -> Option<&Arc<InputChannel>> {
        self.input_channel.as_ref()
    }

    /// Records that the surface was drawn in a frame.
    pub fn mark_exposed(&self) {
        *self.visibility.lock() = Some(Visibility::Exposed);
        self.frames_composed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records that the surface was culled from a frame.
    pub fn mark_occluded(&self) {
        *self.visibility.lock() = Some(Visibility::Occluded);
        self.frames_composed.fetch_add(1, Ordering::Relaxed);
    }

    /// Outcome of the latest frame that included the surface, if any.
    #[must_use]
    pub fn visibility(&self) -> Option<Visibility> {
        *self.visibility.lock()
    }

    /// Number of frames the surface has taken part in.
    #[must_use]
    pub fn frames_composed(&self) -> u64 {
        self.frames_composed.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("session", &self.session)
            .field("rect", &self.rect())
            .field("state", &self.state())
            .field("alpha", &self.alpha())
            .field("streams", &self.streams.read().len())
            .field("input_channel", &self.input_channel.as_ref().map(|c| c.id()))
            .field("visibility", &self.visibility())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> Surface {
        Surface::new("s", SessionId(1), Point::new(100.0, 100.0), Size::new(50.0, 40.0))
    }

    #[test]
    fn unshaped_surface_accepts_its_whole_rect() {
        let s = surface();
        assert!(s.input_area_contains(Point::new(100.0, 100.0)));
        assert!(s.input_area_contains(Point::new(149.0, 139.0)));
        assert!(!s.input_area_contains(Point::new(150.0, 120.0)));
        assert!(!s.input_area_contains(Point::new(99.0, 120.0)));
    }

    #[test]
    fn input_shape_is_surface_local() {
        let s = surface();
        s.set_input_shape(vec![Rect::new(0.0, 0.0, 10.0, 10.0)]);
        assert!(s.input_area_contains(Point::new(105.0, 105.0)));
        assert!(!s.input_area_contains(Point::new(120.0, 120.0)));
        assert_eq!(s.input_bounds(), Rect::new(100.0, 100.0, 110.0, 110.0));
    }

    #[test]
    fn hidden_and_minimized_surfaces_are_not_hit() {
        let s = surface();
        let inside = Point::new(110.0, 110.0);
        s.update_states(|st| {
            st.with(WindowState::Minimized);
        });
        assert!(!s.visible());
        assert!(!s.input_area_contains(inside));

        let state = s.update_states(|st| {
            st.without(WindowState::Minimized).with(WindowState::Fullscreen);
        });
        assert_eq!(state, WindowState::Fullscreen);
        assert!(s.input_area_contains(inside));
    }

    #[test]
    fn move_and_resize_keep_the_other_half() {
        let s = surface();
        s.move_to(Point::new(0.0, 0.0));
        assert_eq!(s.size(), Size::new(50.0, 40.0));
        s.resize(Size::new(10.0, 10.0));
        assert_eq!(s.rect(), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn visibility_counts_frames() {
        let s = surface();
        assert_eq!(s.visibility(), None);
        s.mark_exposed();
        s.mark_occluded();
        assert_eq!(s.visibility(), Some(Visibility::Occluded));
        assert_eq!(s.frames_composed(), 2);
    }
}

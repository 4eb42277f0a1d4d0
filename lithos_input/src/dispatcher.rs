// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routing of input events to surfaces.
//!
//! [`SurfaceInputDispatcher`] keeps, per pointer device, the surface under the
//! pointer (`target`) and the surface that owns the current button gesture;
//! per touch device, the surface owning the current touch gesture; and one
//! keyboard focus slot. All slots hold weak references: a surface that went
//! away reads as absent.
//!
//! Pointer routing:
//!
//! - With a live gesture owner, every event goes to the owner. The release of
//!   the last button clears the owner and hit-tests again, unless a
//!   drag-and-drop handle is set.
//! - Otherwise the scene is hit-tested top to bottom. When the hit surface
//!   differs from `target`, the old target gets a
//!   [`Leave`](PointerAction::Leave) and the new one an
//!   [`Enter`](PointerAction::Enter) before the event itself. A press makes
//!   the hit surface the gesture owner.
//!
//! Delivered events carry surface-local coordinates in `local_position`.

use core::fmt;
use core::ptr;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use kurbo::Point;
use lithos_core::event::{
    DeviceId, InputEvent, KeyEvent, PointerAction, PointerButtons, PointerEvent, TouchEvent,
};
use lithos_core::observer::ObserverMultiplexer;
use lithos_core::scene::{Scene, SceneObserver};
use lithos_core::surface::Surface;
use parking_lot::Mutex;

/// Where routed events end up.
pub trait InputSink: Send + Sync {
    /// Hands `event`, already in surface-local coordinates, to `surface`.
    fn deliver(&self, surface: &Arc<Surface>, event: &InputEvent);
}

/// Observes keyboard routing.
///
/// Callbacks run with the dispatcher locked and must not call back into it.
pub trait KeyboardObserver: Send + Sync {
    /// A key event is being routed.
    fn keyboard_event(&self, event: &KeyEvent) {
        _ = event;
    }

    /// Keyboard focus moved to `surface`, or was cleared.
    fn keyboard_focus_set(&self, surface: Option<&Arc<Surface>>) {
        _ = surface;
    }
}

/// Routes input events.
pub trait InputDispatcher: Send + Sync {
    /// Routes `event`, returning whether any surface received it.
    ///
    /// Events dispatched while stopped are dropped.
    fn dispatch(&self, event: &InputEvent) -> bool;

    /// Starts accepting events. Idempotent.
    fn start(&self);

    /// Stops accepting events and forgets pointer and touch gestures.
    /// Idempotent.
    fn stop(&self);
}

#[derive(Debug, Default)]
struct PointerState {
    target: Option<Weak<Surface>>,
    gesture_owner: Option<Weak<Surface>>,
    buttons: PointerButtons,
}

#[derive(Debug, Default)]
struct TouchState {
    gesture_owner: Option<Weak<Surface>>,
}

#[derive(Debug, Default)]
struct DispatchState {
    started: bool,
    pointers: HashMap<DeviceId, PointerState>,
    touches: HashMap<DeviceId, TouchState>,
    focus: Option<Weak<Surface>>,
    drag_and_drop_handle: Option<Vec<u8>>,
}

struct Shared {
    scene: Arc<dyn Scene>,
    sink: Arc<dyn InputSink>,
    state: Mutex<DispatchState>,
    keyboard_observers: ObserverMultiplexer<dyn KeyboardObserver>,
}

/// Clears slots referring to surfaces leaving the scene.
struct RemovalObserver {
    shared: Weak<Shared>,
}

impl SceneObserver for RemovalObserver {
    fn surface_removed(&self, surface: &Arc<Surface>) {
        if let Some(shared) = self.shared.upgrade() {
            shared.forget_surface(surface);
        }
    }
}

/// The scene-driven [`InputDispatcher`].
pub struct SurfaceInputDispatcher {
    shared: Arc<Shared>,
    observer: Arc<dyn SceneObserver>,
}

impl SurfaceInputDispatcher {
    /// Creates a stopped dispatcher routing events over `scene` into `sink`.
    pub fn new(scene: Arc<dyn Scene>, sink: Arc<dyn InputSink>) -> Self {
        let shared = Arc::new(Shared {
            scene,
            sink,
            state: Mutex::new(DispatchState::default()),
            keyboard_observers: ObserverMultiplexer::new(),
        });
        let observer: Arc<dyn SceneObserver> = Arc::new(RemovalObserver {
            shared: Arc::downgrade(&shared),
        });
        Self { shared, observer }
    }

    /// Gives keyboard focus to `surface`.
    pub fn set_focus(&self, surface: &Arc<Surface>) {
        let mut state = self.shared.state.lock();
        state.focus = Some(Arc::downgrade(surface));
        tracing::debug!(surface = ?surface.id(), "keyboard focus set");
        self.shared
            .keyboard_observers
            .for_each(|o| o.keyboard_focus_set(Some(surface)));
    }

    /// Clears keyboard focus.
    pub fn clear_focus(&self) {
        let mut state = self.shared.state.lock();
        state.focus = None;
        tracing::debug!("keyboard focus cleared");
        self.shared
            .keyboard_observers
            .for_each(|o| o.keyboard_focus_set(None));
    }

    /// The surface holding keyboard focus, if it is still alive.
    #[must_use]
    pub fn focus(&self) -> Option<Arc<Surface>> {
        upgrade(&self.shared.state.lock().focus)
    }

    /// Registers a keyboard observer.
    pub fn register_interest(&self, observer: &Arc<dyn KeyboardObserver>) {
        self.shared.keyboard_observers.register(observer);
    }

    /// Unregisters a keyboard observer.
    pub fn unregister_interest(&self, observer: &Arc<dyn KeyboardObserver>) {
        self.shared.keyboard_observers.unregister(observer);
    }

    /// Starts a drag-and-drop operation identified by `handle`.
    ///
    /// While set, releasing the last button keeps the gesture owner.
    pub fn set_drag_and_drop_handle(&self, handle: Vec<u8>) {
        self.shared.state.lock().drag_and_drop_handle = Some(handle);
    }

    /// Ends the drag-and-drop operation, releasing gesture owners of
    /// pointers with no button held.
    pub fn clear_drag_and_drop_handle(&self) {
        let mut state = self.shared.state.lock();
        state.drag_and_drop_handle = None;
        for pointer in state.pointers.values_mut() {
            if pointer.buttons.is_empty() {
                pointer.gesture_owner = None;
            }
        }
    }
}

impl InputDispatcher for SurfaceInputDispatcher {
    fn dispatch(&self, event: &InputEvent) -> bool {
        let mut state = self.shared.state.lock();
        if !state.started {
            return false;
        }
        match event {
            InputEvent::Pointer(event) => self.shared.dispatch_pointer(&mut state, event),
            InputEvent::Touch(event) => self.shared.dispatch_touch(&mut state, event),
            InputEvent::Key(event) => self.shared.dispatch_key(&state, event),
            InputEvent::DeviceReset { device, .. } => {
                state.pointers.remove(device);
                state.touches.remove(device);
                tracing::debug!(?device, "device reset");
                true
            }
        }
    }

    fn start(&self) {
        let mut state = self.shared.state.lock();
        if state.started {
            return;
        }
        state.started = true;
        self.shared.scene.add_observer(&self.observer);
        tracing::debug!("input dispatcher started");
    }

    fn stop(&self) {
        let mut state = self.shared.state.lock();
        if !state.started {
            return;
        }
        state.started = false;
        self.shared.scene.remove_observer(&self.observer);
        state.pointers.clear();
        state.touches.clear();
        tracing::debug!("input dispatcher stopped");
    }
}

impl Drop for SurfaceInputDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for SurfaceInputDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("SurfaceInputDispatcher")
            .field("started", &state.started)
            .field("pointers", &state.pointers.len())
            .field("touches", &state.touches.len())
            .field("focus", &upgrade(&state.focus).map(|s| s.id()))
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn dispatch_pointer(&self, state: &mut DispatchState, event: &PointerEvent) -> bool {
        let dragging = state.drag_and_drop_handle.is_some();
        let pointer = state.pointers.entry(event.device).or_default();
        pointer.buttons = event.buttons;

        if let Some(owner) = upgrade(&pointer.gesture_owner) {
            self.deliver(&owner, &InputEvent::Pointer(*event));
            if event.is_last_button_up() && !dragging {
                pointer.gesture_owner = None;
                let target = self.hit_test(event.position);
                self.retarget(pointer, target.as_ref(), event);
            }
            return true;
        }
        pointer.gesture_owner = None;

        if event.action == PointerAction::ButtonUp {
            return false;
        }
        let target = self.hit_test(event.position);
        let crossed = self.retarget(pointer, target.as_ref(), event);
        let Some(target) = target else {
            return crossed;
        };
        if event.is_button_down() {
            pointer.gesture_owner = Some(Arc::downgrade(&target));
        }
        self.deliver(&target, &InputEvent::Pointer(*event));
        true
    }

    /// Moves `target` to `hit`, emitting leave and enter events. Returns
    /// whether anything was delivered.
    fn retarget(
        &self,
        pointer: &mut PointerState,
        hit: Option<&Arc<Surface>>,
        event: &PointerEvent,
    ) -> bool {
        let current = upgrade(&pointer.target);
        if current.as_ref().map(Arc::as_ptr) == hit.map(Arc::as_ptr) {
            return false;
        }
        if let Some(old) = &current {
            self.deliver(old, &crossing(event, PointerAction::Leave));
        }
        if let Some(new) = hit {
            self.deliver(new, &crossing(event, PointerAction::Enter));
        }
        pointer.target = hit.map(Arc::downgrade);
        true
    }

    fn dispatch_touch(&self, state: &mut DispatchState, event: &TouchEvent) -> bool {
        let touch = state.touches.entry(event.device).or_default();
        if event.all_down() {
            touch.gesture_owner = event
                .first_position()
                .and_then(|position| self.hit_test(position))
                .as_ref()
                .map(Arc::downgrade);
        }
        let Some(owner) = upgrade(&touch.gesture_owner) else {
            touch.gesture_owner = None;
            return false;
        };
        self.deliver(&owner, &InputEvent::Touch(event.clone()));
        if event.all_up() {
            touch.gesture_owner = None;
        }
        true
    }

    fn dispatch_key(&self, state: &DispatchState, event: &KeyEvent) -> bool {
        self.keyboard_observers.for_each(|o| o.keyboard_event(event));
        let Some(focus) = upgrade(&state.focus) else {
            return false;
        };
        self.deliver(&focus, &InputEvent::Key(*event));
        true
    }

    fn hit_test(&self, position: Point) -> Option<Arc<Surface>> {
        self.scene
            .surfaces_top_to_bottom()
            .into_iter()
            .find(|s| s.input_area_contains(position))
    }

    fn deliver(&self, surface: &Arc<Surface>, event: &InputEvent) {
        self.sink.deliver(surface, &event.translate_to(surface.top_left()));
    }

    fn forget_surface(&self, surface: &Arc<Surface>) {
        let mut state = self.state.lock();
        for pointer in state.pointers.values_mut() {
            if refers_to(&pointer.target, surface) {
                pointer.target = None;
            }
            if refers_to(&pointer.gesture_owner, surface) {
                pointer.gesture_owner = None;
            }
        }
        for touch in state.touches.values_mut() {
            if refers_to(&touch.gesture_owner, surface) {
                touch.gesture_owner = None;
            }
        }
        if refers_to(&state.focus, surface) {
            state.focus = None;
            self.keyboard_observers.for_each(|o| o.keyboard_focus_set(None));
        }
        tracing::trace!(surface = ?surface.id(), "forgot removed surface");
    }
}

fn upgrade(slot: &Option<Weak<Surface>>) -> Option<Arc<Surface>> {
    slot.as_ref().and_then(Weak::upgrade)
}

fn refers_to(slot: &Option<Weak<Surface>>, surface: &Arc<Surface>) -> bool {
    slot.as_ref()
        .is_some_and(|weak| ptr::eq(weak.as_ptr(), Arc::as_ptr(surface)))
}

fn crossing(event: &PointerEvent, action: PointerAction) -> InputEvent {
    InputEvent::Pointer(PointerEvent { action, ..*event })
}

// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input events as seen by the dispatcher and delivered to clients.
//!
//! Every event carries screen-space positions in `position`. When an event is
//! routed to a surface, [`InputEvent::translate_to`] fills `local_position`
//! with coordinates relative to that surface's top-left corner; the screen
//! position is left intact.

use core::fmt;

use bitflags::bitflags;
use kurbo::Point;

use crate::time::HostTime;

/// Identifies an input device.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DeviceId(pub u32);

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

bitflags! {
    /// Pointer buttons held down.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PointerButtons: u32 {
        /// Usually the left button.
        const PRIMARY = 1 << 0;
        /// Usually the right button.
        const SECONDARY = 1 << 1;
        /// Usually the middle button.
        const TERTIARY = 1 << 2;
        /// Side "back" button.
        const BACK = 1 << 3;
        /// Side "forward" button.
        const FORWARD = 1 << 4;
    }
}

bitflags! {
    /// Keyboard modifiers active when an event was generated.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        /// Shift.
        const SHIFT = 1 << 0;
        /// Control.
        const CTRL = 1 << 1;
        /// Alt.
        const ALT = 1 << 2;
        /// Meta / logo key.
        const META = 1 << 3;
        /// Caps lock is on.
        const CAPS_LOCK = 1 << 4;
        /// Num lock is on.
        const NUM_LOCK = 1 << 5;
    }
}

/// What a pointer event reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerAction {
    /// The pointer moved.
    Motion,
    /// A button was pressed.
    ButtonDown,
    /// A button was released.
    ButtonUp,
    /// The pointer entered the receiving surface. Synthesized by the
    /// dispatcher.
    Enter,
    /// The pointer left the receiving surface. Synthesized by the dispatcher.
    Leave,
}

/// A pointer event.
///
/// `buttons` is the set of buttons held *after* the event: a button-down
/// includes the pressed button, a button-up of the last held button has
/// `buttons` empty.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    /// Originating device.
    pub device: DeviceId,
    /// Time the event was generated.
    pub time: HostTime,
    /// What happened.
    pub action: PointerAction,
    /// Screen-space position.
    pub position: Point,
    /// Position relative to the receiving surface.
    pub local_position: Point,
    /// Buttons held after the event.
    pub buttons: PointerButtons,
    /// Active keyboard modifiers.
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Creates an event at screen `position` with no buttons or modifiers.
    #[must_use]
    pub fn new(device: DeviceId, time: HostTime, action: PointerAction, position: Point) -> Self {
        Self {
            device,
            time,
            action,
            position,
            local_position: position,
            buttons: PointerButtons::empty(),
            modifiers: Modifiers::empty(),
        }
    }

    /// Sets the held buttons.
    #[must_use]
    pub fn with_buttons(mut self, buttons: PointerButtons) -> Self {
        self.buttons = buttons;
        self
    }

    /// Whether this is the press that starts a gesture.
    #[must_use]
    pub fn is_button_down(&self) -> bool {
        self.action == PointerAction::ButtonDown
    }

    /// Whether this is the release of the last held button.
    #[must_use]
    pub fn is_last_button_up(&self) -> bool {
        self.action == PointerAction::ButtonUp && self.buttons.is_empty()
    }
}

/// What a key event reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// The key was pressed.
    Down,
    /// The key was released.
    Up,
    /// Auto-repeat of a held key.
    Repeat,
}

/// A keyboard event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// Originating device.
    pub device: DeviceId,
    /// Time the event was generated.
    pub time: HostTime,
    /// What happened.
    pub action: KeyAction,
    /// Layout-dependent key symbol.
    pub key_code: u32,
    /// Hardware scan code.
    pub scan_code: u32,
    /// Active keyboard modifiers.
    pub modifiers: Modifiers,
}

/// What a single touch point reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchAction {
    /// The contact started.
    Down,
    /// The contact lifted.
    Up,
    /// The contact moved or changed pressure.
    Change,
}

/// One contact within a [`TouchEvent`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    /// Contact id, stable for the lifetime of the contact.
    pub id: u32,
    /// What happened to this contact.
    pub action: TouchAction,
    /// Screen-space position.
    pub position: Point,
    /// Position relative to the receiving surface.
    pub local_position: Point,
}

impl TouchPoint {
    /// Creates a touch point at screen `position`.
    #[must_use]
    pub fn new(id: u32, action: TouchAction, position: Point) -> Self {
        Self {
            id,
            action,
            position,
            local_position: position,
        }
    }
}

/// A touch event covering every contact of one device.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchEvent {
    /// Originating device.
    pub device: DeviceId,
    /// Time the event was generated.
    pub time: HostTime,
    /// Every current contact.
    pub points: Vec<TouchPoint>,
    /// Active keyboard modifiers.
    pub modifiers: Modifiers,
}

impl TouchEvent {
    /// Every contact is going down: the start of a gesture.
    #[must_use]
    pub fn all_down(&self) -> bool {
        !self.points.is_empty() && self.points.iter().all(|p| p.action == TouchAction::Down)
    }

    /// Every contact is lifting: the end of a gesture.
    #[must_use]
    pub fn all_up(&self) -> bool {
        !self.points.is_empty() && self.points.iter().all(|p| p.action == TouchAction::Up)
    }

    /// Position of the first contact.
    #[must_use]
    pub fn first_position(&self) -> Option<Point> {
        self.points.first().map(|p| p.position)
    }
}

/// Any event the dispatcher routes.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// Keyboard input.
    Key(KeyEvent),
    /// Pointer input.
    Pointer(PointerEvent),
    /// Touch input.
    Touch(TouchEvent),
    /// The device was disabled or removed.
    DeviceReset {
        /// The device that went away.
        device: DeviceId,
        /// Time of the reset.
        time: HostTime,
    },
}

impl InputEvent {
    /// The originating device.
    #[must_use]
    pub fn device(&self) -> DeviceId {
        match self {
            Self::Key(e) => e.device,
            Self::Pointer(e) => e.device,
            Self::Touch(e) => e.device,
            Self::DeviceReset { device, .. } => *device,
        }
    }

    /// When the event was generated.
    #[must_use]
    pub fn time(&self) -> HostTime {
        match self {
            Self::Key(e) => e.time,
            Self::Pointer(e) => e.time,
            Self::Touch(e) => e.time,
            Self::DeviceReset { time, .. } => *time,
        }
    }

    /// Returns a copy whose local positions are relative to `origin`.
    #[must_use]
    pub fn translate_to(&self, origin: Point) -> Self {
        let offset = origin.to_vec2();
        let mut out = self.clone();
        match &mut out {
            Self::Pointer(e) => e.local_position = e.position - offset,
            Self::Touch(e) => {
                for p in &mut e.points {
                    p.local_position = p.position - offset;
                }
            }
            Self::Key(_) | Self::DeviceReset { .. } => {}
        }
        out
    }
}

impl From<KeyEvent> for InputEvent {
    fn from(e: KeyEvent) -> Self {
        Self::Key(e)
    }
}

impl From<PointerEvent> for InputEvent {
    fn from(e: PointerEvent) -> Self {
        Self::Pointer(e)
    }
}

impl From<TouchEvent> for InputEvent {
    fn from(e: TouchEvent) -> Self {
        Self::Touch(e)
    }
}

// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stacked window states.
//!
//! A surface can hold several states at once (e.g. maximized *and*
//! minimized); the one with the highest precedence is the active state:
//!
//! ```text
//! restored < horiz/vert maximized < maximized < attached
//!          < fullscreen < minimized < hidden
//! ```
//!
//! Maximized is the pair of horizontal and vertical maximization: adding it
//! sets both, removing it clears both, and removing just one of the pair
//! demotes the surface to the other. Restored is always present.

use bitflags::bitflags;

/// A window state as requested by a client or the window manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WindowState {
    /// Normal, unmaximized placement.
    Restored,
    /// Maximized horizontally only.
    HorizMaximized,
    /// Maximized vertically only.
    VertMaximized,
    /// Maximized in both directions.
    Maximized,
    /// Attached to an output edge.
    Attached,
    /// Covering the whole output.
    Fullscreen,
    /// Minimized.
    Minimized,
    /// Hidden.
    Hidden,
}

impl WindowState {
    /// All states, lowest precedence first.
    pub const ALL: [Self; 8] = [
        Self::Restored,
        Self::HorizMaximized,
        Self::VertMaximized,
        Self::Maximized,
        Self::Attached,
        Self::Fullscreen,
        Self::Minimized,
        Self::Hidden,
    ];

    /// Precedence rank; the active state is the held state with the largest
    /// rank.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Restored => 1,
            Self::HorizMaximized | Self::VertMaximized => 2,
            Self::Maximized => 3,
            Self::Attached => 4,
            Self::Fullscreen => 5,
            Self::Minimized => 6,
            Self::Hidden => 7,
        }
    }

    const fn flags(self) -> StateFlags {
        match self {
            Self::Restored => StateFlags::empty(),
            Self::HorizMaximized => StateFlags::HORIZ_MAXIMIZED,
            Self::VertMaximized => StateFlags::VERT_MAXIMIZED,
            Self::Maximized => StateFlags::MAXIMIZED,
            Self::Attached => StateFlags::ATTACHED,
            Self::Fullscreen => StateFlags::FULLSCREEN,
            Self::Minimized => StateFlags::MINIMIZED,
            Self::Hidden => StateFlags::HIDDEN,
        }
    }
}

/// A raw state value outside the known set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WindowStateError {
    /// The value does not name a window state.
    #[error("unknown window state value {0}")]
    Unknown(u32),
}

impl TryFrom<u32> for WindowState {
    type Error = WindowStateError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::Restored,
            2 => Self::Minimized,
            3 => Self::Maximized,
            4 => Self::VertMaximized,
            5 => Self::Fullscreen,
            6 => Self::HorizMaximized,
            7 => Self::Hidden,
            8 => Self::Attached,
            other => return Err(WindowStateError::Unknown(other)),
        })
    }
}

impl From<WindowState> for u32 {
    fn from(state: WindowState) -> Self {
        match state {
            WindowState::Restored => 1,
            WindowState::Minimized => 2,
            WindowState::Maximized => 3,
            WindowState::VertMaximized => 4,
            WindowState::Fullscreen => 5,
            WindowState::HorizMaximized => 6,
            WindowState::Hidden => 7,
            WindowState::Attached => 8,
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    struct StateFlags: u8 {
        const HORIZ_MAXIMIZED = 1 << 0;
        const VERT_MAXIMIZED = 1 << 1;
        const MAXIMIZED = Self::HORIZ_MAXIMIZED.bits() | Self::VERT_MAXIMIZED.bits();
        const ATTACHED = 1 << 2;
        const FULLSCREEN = 1 << 3;
        const MINIMIZED = 1 << 4;
        const HIDDEN = 1 << 5;
    }
}

/// The set of states a surface currently holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceStateStack {
    flags: StateFlags,
}

impl SurfaceStateStack {
    /// Creates a stack holding only `initial` (plus restored).
    #[must_use]
    pub const fn new(initial: WindowState) -> Self {
        Self {
            flags: initial.flags(),
        }
    }

    /// Replaces every held state with `state`.
    pub fn set_active_state(&mut self, state: WindowState) {
        self.flags = state.flags();
    }

    /// Adds `state`.
    pub fn with(&mut self, state: WindowState) -> &mut Self {
        self.flags.insert(state.flags());
        self
    }

    /// Removes `state`.
    pub fn without(&mut self, state: WindowState) -> &mut Self {
        self.flags.remove(state.flags());
        self
    }

    /// Whether `state` is held.
    #[must_use]
    pub fn has(&self, state: WindowState) -> bool {
        self.flags.contains(state.flags())
    }

    /// The held state with the highest precedence.
    #[must_use]
    pub fn active_state(&self) -> WindowState {
        WindowState::ALL
            .iter()
            .rev()
            .copied()
            .find(|&state| self.has(state))
            .unwrap_or(WindowState::Restored)
    }
}

impl Default for SurfaceStateStack {
    fn default() -> Self {
        Self::new(WindowState::Restored)
    }
}

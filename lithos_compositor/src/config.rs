// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor configuration.

/// Switches for the per-output frame algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompositorConfig {
    /// Skip elements hidden behind opaque elements in front of them.
    ///
    /// When disabled, every element is reported as rendered.
    pub occlusion_culling: bool,
    /// Offer each frame to the output's hardware overlays before falling
    /// back to the software renderer.
    pub overlay: bool,
    /// Frames scheduled on every output when compositing starts.
    pub initial_frames: u32,
}

impl CompositorConfig {
    /// Culling and overlays enabled, one initial frame.
    pub const DEFAULT: Self = Self {
        occlusion_culling: true,
        overlay: true,
        initial_frames: 1,
    };

    /// Never attempt overlays; always render in software.
    #[must_use]
    pub const fn software_only() -> Self {
        Self {
            overlay: false,
            ..Self::DEFAULT
        }
    }
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

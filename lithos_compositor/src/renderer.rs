// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software renderer contract.
//!
//! Pixel work is opaque to the compositor. A [`Renderer`] is created for one
//! output by a [`RendererFactory`] on that output's compositing thread and
//! is only ever used from there, so it need not be `Send`.

use std::sync::Arc;

use lithos_core::output::{DisplayBuffer, MirrorMode, Orientation};
use lithos_core::scene::Renderable;

/// Draws renderable lists into one output.
pub trait Renderer {
    /// Sets the rotation and mirroring applied to the next frame.
    fn set_output_transform(&mut self, orientation: Orientation, mirror: MirrorMode);

    /// Draws `renderables`, bottom first.
    fn render(&mut self, renderables: &[Arc<Renderable>]);

    /// Releases transient resources (texture caches and the like) while
    /// frames are going to hardware overlays.
    fn suspend(&mut self);
}

/// Creates a [`Renderer`] for an output.
pub trait RendererFactory: Send + Sync {
    /// Called on the output's compositing thread.
    fn create_renderer_for(&self, display: &Arc<dyn DisplayBuffer>) -> Box<dyn Renderer>;
}

impl<F> RendererFactory for F
where
    F: Fn(&Arc<dyn DisplayBuffer>) -> Box<dyn Renderer> + Send + Sync,
{
    fn create_renderer_for(&self, display: &Arc<dyn DisplayBuffer>) -> Box<dyn Renderer> {
        self(display)
    }
}

// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-output frame composition for lithos.
//!
//! Every output is composed independently, usually on its own thread:
//!
//! ```text
//!   Scene::scene_elements_for(output, view_area)
//!          │
//!          ▼
//!   filter_occlusions_from ──► occluded() on hidden elements
//!          │
//!          ▼
//!   rendered() on the rest ──► renderable list
//!          │
//!          ├── DisplayBuffer::overlay accepted ──► Renderer::suspend
//!          │
//!          └── otherwise ──► Renderer::render ──► list cleared
//!                                                     │
//!                                                     ▼
//!                                          DisplayBuffer::post
//! ```
//!
//! **[`occlusion`]**: front-to-back culling against opaque coverage.
//!
//! **[`compositor`]**: [`DisplayBufferCompositor`](compositor::DisplayBufferCompositor),
//! the frame algorithm for one output.
//!
//! **[`multithreaded`]**: [`MultiThreadedCompositor`](multithreaded::MultiThreadedCompositor),
//! one condvar-driven thread per output, woken by scene changes.
//!
//! **[`renderer`]**: the opaque software renderer contract.
//!
//! **[`config`]**: [`CompositorConfig`](config::CompositorConfig) presets.

pub mod compositor;
pub mod config;
pub mod multithreaded;
pub mod occlusion;
pub mod renderer;

#[cfg(test)]
mod testing;

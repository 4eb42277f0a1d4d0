// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data model for the lithos display-server core.
//!
//! `lithos_core` holds the types shared by the composition and input
//! pipelines: surfaces and their buffer streams, the scene, outputs, input
//! events and channels, and the reporting hooks both pipelines emit.
//!
//! # Architecture
//!
//! Two pipelines meet at the scene:
//!
//! ```text
//!   client render loop                    hardware input
//!          │                                     │
//!          ▼                                     ▼
//!   BufferStream::submit_buffer          SurfaceInputDispatcher
//!          │                              (hit-tests the Scene)
//!          ▼                                     │
//!   Schedule (per stream FIFO)                   ▼
//!          │                              InputSender ──► InputChannel
//!          ▼                                                  │
//!   Scene::scene_elements_for ◄── per-output compositor      ▼
//!          │                                                client
//!          ▼
//!   occlusion ──► overlay or Renderer ──► DisplayBuffer::post
//! ```
//!
//! **[`buffer`]**: [`FrameBuffer`](buffer::FrameBuffer) handles, returned to
//! their producer exactly once when the last holder drops them.
//!
//! **[`schedule`]** and **[`stream`]**: per-stream FIFO of submitted buffers
//! and the front buffer each output shows.
//!
//! **[`surface`]**: client windows, with geometry, input shape and a
//! [`window_state`] stack.
//!
//! **[`scene`]**: the [`SurfaceStack`](scene::SurfaceStack), per-frame
//! [`SceneElement`](scene::SceneElement)s and scene observers.
//!
//! **[`output`]**: [`OutputId`](output::OutputId), the
//! [`DisplayBuffer`](output::DisplayBuffer) contract and vsync counters.
//!
//! **[`event`]** and **[`channel`]**: input events and the per-surface
//! socket pair they are published on.
//!
//! **[`observer`]**: weak, linearized observer registries.
//!
//! **[`report`]**: no-op-by-default reporting hooks.
//!
//! **[`region`]**: rectangle-list regions used for occlusion.
//!
//! **[`time`]**: monotonic [`HostTime`](time::HostTime).

pub mod buffer;
pub mod channel;
pub mod event;
pub mod observer;
pub mod output;
pub mod region;
pub mod report;
pub mod scene;
pub mod schedule;
pub mod stream;
pub mod surface;
pub mod time;
pub mod window_state;

// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input routing and delivery for lithos.
//!
//! ```text
//!   InputEvent
//!       │
//!       ▼
//!   SurfaceInputDispatcher ── hit test / gesture owner / focus
//!       │
//!       ▼ InputSink
//!   SenderSink ──► InputSender::send_event ──► InputChannel (client)
//!                                                   │
//!                      AckLoop ◄──── Ack ───────────┘
//!                         │
//!                         ▼
//!                   InputReport
//! ```
//!
//! **[`dispatcher`]**: the pointer, touch and keyboard routing state machine.
//!
//! **[`sender`]**: per-channel transfers, sequence numbers and the
//! [`SenderSink`](sender::SenderSink) adapter.
//!
//! **[`ack_loop`]**: a `calloop` thread draining client acknowledgements.
//!
//! **[`encoder`]**: the wire records for events and acknowledgements.
//!
//! **[`error`]**: [`SendError`](error::SendError).

pub mod ack_loop;
pub mod dispatcher;
pub mod encoder;
pub mod error;
pub mod sender;

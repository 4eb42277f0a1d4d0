// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Publishing events on surface channels.
//!
//! [`InputSender`] keeps one transfer per input channel of a surface in the
//! scene. Sending encodes the event with a fresh sequence number and writes
//! it to the channel without waiting for the client; acknowledgements are
//! picked up later by the [`AckLoop`] and forwarded to the [`InputReport`].

use core::fmt;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Weak};

use lithos_core::channel::{ChannelId, InputChannel};
use lithos_core::event::InputEvent;
use lithos_core::report::InputReport;
use lithos_core::scene::{Scene, SceneObserver};
use lithos_core::surface::{Surface, SurfaceId};
use parking_lot::Mutex;

use crate::ack_loop::AckLoop;
use crate::dispatcher::InputSink;
use crate::encoder::{EventEncoder, HEADER_LEN};
use crate::error::SendError;

struct Transfer {
    channel: Arc<InputChannel>,
    surface: SurfaceId,
    subscribed: bool,
}

#[derive(Default)]
struct Transfers {
    by_channel: HashMap<ChannelId, Transfer>,
    last_seq: u32,
}

impl Transfers {
    /// Next sequence number. Zero means "no sequence" and is skipped.
    fn next_seq(&mut self) -> u32 {
        self.last_seq = self.last_seq.wrapping_add(1);
        if self.last_seq == 0 {
            self.last_seq = 1;
        }
        self.last_seq
    }
}

struct SenderState {
    transfers: Mutex<Transfers>,
    encoder: Arc<dyn EventEncoder>,
    report: Arc<dyn InputReport>,
    acks: AckLoop,
}

impl SenderState {
    fn add_transfer(&self, surface: &Arc<Surface>) -> bool {
        let Some(channel) = surface.input_channel() else {
            return false;
        };
        let mut transfers = self.transfers.lock();
        if transfers.by_channel.contains_key(&channel.id()) {
            return false;
        }
        transfers.by_channel.insert(
            channel.id(),
            Transfer {
                channel: Arc::clone(channel),
                surface: surface.id(),
                subscribed: false,
            },
        );
        tracing::debug!(channel = ?channel.id(), surface = ?surface.id(), "transfer added");
        true
    }

    fn remove_transfer(&self, channel: ChannelId) -> bool {
        let mut transfers = self.transfers.lock();
        let Some(transfer) = transfers.by_channel.get(&channel) else {
            return false;
        };
        if transfer.subscribed {
            if let Err(err) = self.acks.unregister(channel) {
                tracing::warn!(?channel, %err, "failed to stop watching channel");
            }
        }
        let surface = transfer.surface;
        transfers.by_channel.remove(&channel);
        tracing::debug!(?channel, ?surface, "transfer removed");
        true
    }

    fn send_event(&self, event: &InputEvent, channel: ChannelId) -> Result<u32, SendError> {
        let seq = {
            let mut transfers = self.transfers.lock();
            if !transfers.by_channel.contains_key(&channel) {
                return Err(SendError::UnknownChannel(channel));
            }
            let seq = transfers.next_seq();
            let Some(transfer) = transfers.by_channel.get_mut(&channel) else {
                return Err(SendError::UnknownChannel(channel));
            };

            let mut record = Vec::with_capacity(HEADER_LEN + 48);
            self.encoder.encode(seq, event, &mut record);
            transfer
                .channel
                .server_socket()
                .send(&record)
                .map_err(|err| SendError::from_write(channel, err))?;

            if !transfer.subscribed {
                transfer.subscribed = self.subscribe(transfer);
            }
            seq
        };

        match event {
            InputEvent::Key(key) => self.report.published_key_event(channel, seq, key.time),
            _ => self.report.published_motion_event(channel, seq, event.time()),
        }
        Ok(seq)
    }

    /// Starts draining acknowledgements of `transfer`. Returns whether the
    /// subscription went through.
    fn subscribe(&self, transfer: &Transfer) -> bool {
        let channel = transfer.channel.id();
        let report = Arc::clone(&self.report);
        let registered = self
            .acks
            .register(channel, transfer.channel.server_socket(), move |ack| {
                report.received_event_finished_signal(channel, ack.seq, ack.handled);
            });
        match registered {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(?channel, %err, "failed to watch channel for acknowledgements");
                false
            }
        }
    }
}

/// Keeps transfers in step with the scene.
struct TransferObserver {
    state: Weak<SenderState>,
}

impl SceneObserver for TransferObserver {
    fn surface_added(&self, surface: &Arc<Surface>) {
        if let Some(state) = self.state.upgrade() {
            state.add_transfer(surface);
        }
    }

    fn surface_removed(&self, surface: &Arc<Surface>) {
        if let (Some(state), Some(channel)) = (self.state.upgrade(), surface.input_channel()) {
            state.remove_transfer(channel.id());
        }
    }
}

/// Writes events to the input channels of surfaces in a scene.
pub struct InputSender {
    state: Arc<SenderState>,
    scene: Arc<dyn Scene>,
    observer: Arc<dyn SceneObserver>,
}

impl InputSender {
    /// Creates a sender tracking the channels of `scene`'s surfaces.
    ///
    /// Fails if the acknowledgement thread cannot be spawned.
    pub fn new(
        scene: Arc<dyn Scene>,
        encoder: Arc<dyn EventEncoder>,
        report: Arc<dyn InputReport>,
    ) -> io::Result<Self> {
        let state = Arc::new(SenderState {
            transfers: Mutex::new(Transfers::default()),
            encoder,
            report,
            acks: AckLoop::new()?,
        });
        let observer: Arc<dyn SceneObserver> = Arc::new(TransferObserver {
            state: Arc::downgrade(&state),
        });
        scene.add_observer(&observer);
        for surface in scene.surfaces_top_to_bottom() {
            state.add_transfer(&surface);
        }
        Ok(Self {
            state,
            scene,
            observer,
        })
    }

    /// Publishes `event` on `channel`, returning its sequence number.
    ///
    /// Never waits for the client. [Fatal](SendError::is_fatal) errors mean
    /// the transfer should be removed.
    pub fn send_event(&self, event: &InputEvent, channel: ChannelId) -> Result<u32, SendError> {
        self.state.send_event(event, channel)
    }

    /// Starts tracking the channel of `surface`. Returns `false` if the
    /// surface has no channel or its channel is already tracked.
    pub fn add_transfer(&self, surface: &Arc<Surface>) -> bool {
        self.state.add_transfer(surface)
    }

    /// Stops tracking `channel`. Returns `false` if it was not tracked.
    pub fn remove_transfer(&self, channel: ChannelId) -> bool {
        self.state.remove_transfer(channel)
    }

    /// Whether `channel` is tracked.
    #[must_use]
    pub fn has_transfer(&self, channel: ChannelId) -> bool {
        self.state.transfers.lock().by_channel.contains_key(&channel)
    }
}

impl Drop for InputSender {
    fn drop(&mut self) {
        self.scene.remove_observer(&self.observer);
    }
}

impl fmt::Debug for InputSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transfers = self.state.transfers.lock();
        f.debug_struct("InputSender")
            .field("transfers", &transfers.by_channel.len())
            .field("last_seq", &transfers.last_seq)
            .finish_non_exhaustive()
    }
}

/// Adapts an [`InputSender`] to the dispatcher's [`InputSink`].
///
/// Events for surfaces without a channel are dropped. A fatal send error
/// removes the transfer; other errors are logged.
#[derive(Debug)]
pub struct SenderSink {
    sender: Arc<InputSender>,
}

impl SenderSink {
    /// Wraps `sender`.
    #[must_use]
    pub fn new(sender: Arc<InputSender>) -> Self {
        Self { sender }
    }
}

impl InputSink for SenderSink {
    fn deliver(&self, surface: &Arc<Surface>, event: &InputEvent) {
        let Some(channel) = surface.input_channel() else {
            tracing::trace!(surface = ?surface.id(), "surface has no input channel");
            return;
        };
        match self.sender.send_event(event, channel.id()) {
            Ok(_) => {}
            Err(err) if err.is_fatal() => {
                tracing::warn!(surface = ?surface.id(), %err, "dropping input transfer");
                self.sender.remove_transfer(err.channel());
            }
            Err(err) => tracing::warn!(surface = ?surface.id(), %err, "failed to deliver input"),
        }
    }
}

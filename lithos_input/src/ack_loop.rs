// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Acknowledgement watcher.
//!
//! [`AckLoop`] runs a `calloop` event loop on a dedicated thread. Channels
//! are registered for readability through a command channel; whenever a
//! registered socket turns readable, every pending [`Ack`] on it is drained
//! and handed to the channel's callback. Senders therefore never block on a
//! client to learn that an event was handled.

use core::fmt;
use std::collections::HashMap;
use std::io;
use std::os::unix::net::UnixDatagram;
use std::thread::{self, JoinHandle};

use calloop::channel::{self, Channel, Sender};
use calloop::generic::Generic;
use calloop::{EventLoop, Interest, LoopHandle, Mode, PostAction, RegistrationToken};
use lithos_core::channel::ChannelId;

use crate::encoder::{ACK_LEN, Ack};

type AckHandler = Box<dyn FnMut(Ack) + Send>;

enum Command {
    Register {
        channel: ChannelId,
        socket: UnixDatagram,
        on_ack: AckHandler,
    },
    Unregister {
        channel: ChannelId,
    },
}

#[derive(Default)]
struct LoopState {
    registrations: HashMap<ChannelId, RegistrationToken>,
}

impl LoopState {
    /// Forgets the token of a source that removed itself, so a later
    /// unregistration does not remove it again.
    fn source_removed(&mut self, channel: ChannelId) {
        if self.registrations.remove(&channel).is_some() {
            tracing::debug!(?channel, "stopped watching failed channel");
        }
    }
}

/// A single-threaded readability loop for input channels.
pub struct AckLoop {
    commands: Option<Sender<Command>>,
    thread: Option<JoinHandle<()>>,
}

impl AckLoop {
    /// Spawns the loop thread.
    pub fn new() -> io::Result<Self> {
        let (commands, receiver) = channel::channel();
        let thread = thread::Builder::new()
            .name("lithos-input-acks".into())
            .spawn(move || run(receiver))?;
        Ok(Self {
            commands: Some(commands),
            thread: Some(thread),
        })
    }

    /// Watches `socket` and calls `on_ack` for every acknowledgement read
    /// from it, on the loop thread.
    ///
    /// Registering a channel again replaces the previous registration.
    pub fn register(
        &self,
        channel: ChannelId,
        socket: &UnixDatagram,
        on_ack: impl FnMut(Ack) + Send + 'static,
    ) -> io::Result<()> {
        let socket = socket.try_clone()?;
        self.send(Command::Register {
            channel,
            socket,
            on_ack: Box::new(on_ack),
        })
    }

    /// Stops watching `channel`. Unknown channels are ignored.
    pub fn unregister(&self, channel: ChannelId) -> io::Result<()> {
        self.send(Command::Unregister { channel })
    }

    fn send(&self, command: Command) -> io::Result<()> {
        let commands = self
            .commands
            .as_ref()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
        commands
            .send(command)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "acknowledgement loop exited"))
    }
}

impl Drop for AckLoop {
    fn drop(&mut self) {
        // Closing the command channel stops the loop.
        drop(self.commands.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("acknowledgement loop panicked");
            }
        }
    }
}

impl fmt::Debug for AckLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AckLoop")
            .field("running", &self.commands.is_some())
            .finish_non_exhaustive()
    }
}

fn run(commands: Channel<Command>) {
    let mut event_loop: EventLoop<'static, LoopState> = match EventLoop::try_new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            tracing::error!(%err, "failed to create acknowledgement loop");
            return;
        }
    };
    let handle = event_loop.handle();
    let signal = event_loop.get_signal();

    let command_handle = handle.clone();
    let inserted = handle.insert_source(commands, move |event, _, state: &mut LoopState| {
        match event {
            channel::Event::Msg(Command::Register {
                channel,
                socket,
                on_ack,
            }) => register(&command_handle, state, channel, socket, on_ack),
            channel::Event::Msg(Command::Unregister { channel }) => {
                unregister(&command_handle, state, channel);
            }
            channel::Event::Closed => signal.stop(),
        }
    });
    if let Err(err) = inserted {
        tracing::error!(error = %err.error, "failed to watch acknowledgement commands");
        return;
    }

    let mut state = LoopState::default();
    if let Err(err) = event_loop.run(None, &mut state, |_| {}) {
        tracing::error!(%err, "acknowledgement loop failed");
    }
}

fn register(
    handle: &LoopHandle<'static, LoopState>,
    state: &mut LoopState,
    channel: ChannelId,
    socket: UnixDatagram,
    mut on_ack: AckHandler,
) {
    if let Some(previous) = state.registrations.remove(&channel) {
        handle.remove(previous);
    }
    let reader = match socket.try_clone() {
        Ok(reader) => reader,
        Err(err) => {
            tracing::warn!(?channel, %err, "cannot watch channel");
            return;
        }
    };
    let source = Generic::new(socket, Interest::READ, Mode::Level);
    let inserted = handle.insert_source(source, move |_readiness, _socket, state| {
        let action = drain(channel, &reader, &mut on_ack);
        if matches!(action, PostAction::Remove) {
            state.source_removed(channel);
        }
        Ok(action)
    });
    match inserted {
        Ok(token) => {
            state.registrations.insert(channel, token);
            tracing::trace!(?channel, "watching channel");
        }
        Err(err) => tracing::warn!(?channel, error = %err.error, "cannot watch channel"),
    }
}

/// Removes the source watching `channel`. Returns `false` if there was none.
fn unregister(
    handle: &LoopHandle<'static, LoopState>,
    state: &mut LoopState,
    channel: ChannelId,
) -> bool {
    let Some(token) = state.registrations.remove(&channel) else {
        return false;
    };
    handle.remove(token);
    tracing::trace!(?channel, "stopped watching channel");
    true
}

/// Reads every queued acknowledgement from `socket`.
///
/// An empty datagram is a short record, not end of stream.
fn drain(channel: ChannelId, socket: &UnixDatagram, on_ack: &mut AckHandler) -> PostAction {
    let mut buf = [0_u8; 64];
    loop {
        match socket.recv(&mut buf) {
            Ok(n) => match Ack::decode(&buf[..n]) {
                Some(ack) => on_ack(ack),
                None => tracing::warn!(?channel, len = n, min = ACK_LEN, "short acknowledgement"),
            },
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => return PostAction::Continue,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => {
                tracing::warn!(?channel, %err, "reading acknowledgements failed");
                return PostAction::Remove;
            }
        }
    }
}

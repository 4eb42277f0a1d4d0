// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-surface input channels.
//!
//! An [`InputChannel`] is a connected pair of datagram sockets. The server
//! end stays here, non-blocking, and is used to publish events and read
//! delivery acknowledgements. The client end is handed to the client once,
//! via [`InputChannel::take_client_end`].

use core::fmt;
use std::io;
use std::os::unix::net::UnixDatagram;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Identifies an input channel.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(pub u64);

impl ChannelId {
    /// Allocates a process-unique channel id.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", self.0)
    }
}

/// The server side of a surface's duplex event transport.
pub struct InputChannel {
    id: ChannelId,
    server: UnixDatagram,
    client: Mutex<Option<UnixDatagram>>,
}

impl InputChannel {
    /// Creates a connected socket pair with a non-blocking server end.
    pub fn new() -> io::Result<Self> {
        let (server, client) = UnixDatagram::pair()?;
        server.set_nonblocking(true)?;
        Ok(Self {
            id: ChannelId::next(),
            server,
            client: Mutex::new(Some(client)),
        })
    }

    /// Returns the channel id.
    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// The server-side socket.
    #[must_use]
    pub fn server_socket(&self) -> &UnixDatagram {
        &self.server
    }

    /// Hands out the client end. Returns `None` after the first call.
    pub fn take_client_end(&self) -> Option<UnixDatagram> {
        self.client.lock().take()
    }
}

impl fmt::Debug for InputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputChannel")
            .field("id", &self.id)
            .field("server", &self.server)
            .field("client_taken", &self.client.lock().is_none())
            .finish()
    }
}

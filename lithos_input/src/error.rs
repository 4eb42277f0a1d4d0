// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input delivery errors.

use std::io;

use lithos_core::channel::ChannelId;

/// Why [`InputSender::send_event`](crate::sender::InputSender::send_event)
/// failed.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// No transfer is registered for the channel.
    #[error("{0:?} has no active transfer")]
    UnknownChannel(ChannelId),
    /// The client is not draining its channel.
    #[error("{0:?} would block")]
    WouldBlock(ChannelId),
    /// The client end of the channel is gone.
    #[error("{0:?} is dead")]
    ChannelDead(ChannelId),
    /// Any other write failure.
    #[error("write to {channel:?} failed")]
    Io {
        /// The channel written to.
        channel: ChannelId,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

impl SendError {
    /// Classifies a failed socket write.
    pub(crate) fn from_write(channel: ChannelId, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock => Self::WouldBlock(channel),
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::NotConnected => Self::ChannelDead(channel),
            _ => Self::Io {
                channel,
                source: err,
            },
        }
    }

    /// Whether the transfer should be torn down.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::WouldBlock(_) | Self::ChannelDead(_))
    }

    /// The channel the error concerns.
    #[must_use]
    pub fn channel(&self) -> ChannelId {
        match self {
            Self::UnknownChannel(channel) | Self::WouldBlock(channel) | Self::ChannelDead(channel) => {
                *channel
            }
            Self::Io { channel, .. } => *channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_errors_are_classified() {
        let id = ChannelId(9);
        let classify = |kind| SendError::from_write(id, io::Error::from(kind));
        assert!(matches!(classify(io::ErrorKind::WouldBlock), SendError::WouldBlock(_)));
        assert!(matches!(classify(io::ErrorKind::BrokenPipe), SendError::ChannelDead(_)));
        assert!(matches!(classify(io::ErrorKind::ConnectionRefused), SendError::ChannelDead(_)));
        assert!(matches!(classify(io::ErrorKind::PermissionDenied), SendError::Io { .. }));
    }

    #[test]
    fn only_blocked_and_dead_channels_are_fatal() {
        let id = ChannelId(1);
        assert!(SendError::WouldBlock(id).is_fatal());
        assert!(SendError::ChannelDead(id).is_fatal());
        assert!(!SendError::UnknownChannel(id).is_fatal());
        let io = SendError::Io {
            channel: id,
            source: io::Error::other("boom"),
        };
        assert!(!io.is_fatal());
        assert_eq!(io.channel(), id);
    }
}

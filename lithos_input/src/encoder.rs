// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event and acknowledgement records on the channel wire.
//!
//! Every event goes out as one datagram, written by an [`EventEncoder`].
//! [`RecordEncoder`] writes fixed little-endian records:
//!
//! ```text
//! header (20 bytes)
//!   kind   u8      1 key, 2 pointer, 3 touch, 4 device reset
//!   pad    [u8; 3]
//!   seq    u32
//!   device u32
//!   time   u64     monotonic nanoseconds
//! key body
//!   action u8, pad [u8; 3], key_code u32, scan_code u32, modifiers u32
//! pointer body
//!   action u8, pad [u8; 3], buttons u32, modifiers u32,
//!   local x f64, local y f64, screen x f64, screen y f64
//! touch body
//!   count u32, modifiers u32, then per point:
//!   id u32, action u8, pad [u8; 3], local x f64, local y f64
//! ```
//!
//! The client answers each event with an [`Ack`] datagram:
//! `seq u32, handled u8`.

use core::fmt;

use lithos_core::event::{InputEvent, KeyAction, PointerAction, TouchAction};
use lithos_core::time::HostTime;

/// Size of the record header.
pub const HEADER_LEN: usize = 20;

/// Size of an acknowledgement record.
pub const ACK_LEN: usize = 5;

/// Record kind tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordKind {
    /// A [`KeyEvent`](lithos_core::event::KeyEvent).
    Key = 1,
    /// A [`PointerEvent`](lithos_core::event::PointerEvent).
    Pointer = 2,
    /// A [`TouchEvent`](lithos_core::event::TouchEvent).
    Touch = 3,
    /// A device reset.
    DeviceReset = 4,
}

impl RecordKind {
    fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => Self::Key,
            2 => Self::Pointer,
            3 => Self::Touch,
            4 => Self::DeviceReset,
            _ => return None,
        })
    }
}

/// Writes an event for the device-native wire.
pub trait EventEncoder: Send + Sync {
    /// Appends the record for `event`, tagged with `seq`, to `out`.
    fn encode(&self, seq: u32, event: &InputEvent, out: &mut Vec<u8>);
}

/// Fixed little-endian records.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordEncoder;

impl EventEncoder for RecordEncoder {
    fn encode(&self, seq: u32, event: &InputEvent, out: &mut Vec<u8>) {
        let kind = match event {
            InputEvent::Key(_) => RecordKind::Key,
            InputEvent::Pointer(_) => RecordKind::Pointer,
            InputEvent::Touch(_) => RecordKind::Touch,
            InputEvent::DeviceReset { .. } => RecordKind::DeviceReset,
        };
        out.push(kind as u8);
        out.extend_from_slice(&[0; 3]);
        out.extend_from_slice(&seq.to_le_bytes());
        out.extend_from_slice(&event.device().0.to_le_bytes());
        out.extend_from_slice(&event.time().nanos().to_le_bytes());

        match event {
            InputEvent::Key(e) => {
                out.push(key_action_tag(e.action));
                out.extend_from_slice(&[0; 3]);
                out.extend_from_slice(&e.key_code.to_le_bytes());
                out.extend_from_slice(&e.scan_code.to_le_bytes());
                out.extend_from_slice(&e.modifiers.bits().to_le_bytes());
            }
            InputEvent::Pointer(e) => {
                out.push(pointer_action_tag(e.action));
                out.extend_from_slice(&[0; 3]);
                out.extend_from_slice(&e.buttons.bits().to_le_bytes());
                out.extend_from_slice(&e.modifiers.bits().to_le_bytes());
                for v in [e.local_position.x, e.local_position.y, e.position.x, e.position.y] {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            InputEvent::Touch(e) => {
                let count = u32::try_from(e.points.len()).unwrap_or(u32::MAX);
                out.extend_from_slice(&count.to_le_bytes());
                out.extend_from_slice(&e.modifiers.bits().to_le_bytes());
                for p in e.points.iter().take(count as usize) {
                    out.extend_from_slice(&p.id.to_le_bytes());
                    out.push(touch_action_tag(p.action));
                    out.extend_from_slice(&[0; 3]);
                    out.extend_from_slice(&p.local_position.x.to_le_bytes());
                    out.extend_from_slice(&p.local_position.y.to_le_bytes());
                }
            }
            InputEvent::DeviceReset { .. } => {}
        }
    }
}

fn key_action_tag(action: KeyAction) -> u8 {
    match action {
        KeyAction::Down => 0,
        KeyAction::Up => 1,
        KeyAction::Repeat => 2,
    }
}

fn pointer_action_tag(action: PointerAction) -> u8 {
    match action {
        PointerAction::Motion => 0,
        PointerAction::ButtonDown => 1,
        PointerAction::ButtonUp => 2,
        PointerAction::Enter => 3,
        PointerAction::Leave => 4,
    }
}

fn touch_action_tag(action: TouchAction) -> u8 {
    match action {
        TouchAction::Down => 0,
        TouchAction::Up => 1,
        TouchAction::Change => 2,
    }
}

/// The fixed header of a record, as read back by a client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordHeader {
    /// What follows the header.
    pub kind: RecordKind,
    /// Sequence number to acknowledge.
    pub seq: u32,
    /// Originating device.
    pub device: u32,
    /// Event time.
    pub time: HostTime,
}

impl RecordHeader {
    /// Parses the header at the start of `record`.
    #[must_use]
    pub fn decode(record: &[u8]) -> Option<Self> {
        let header = record.get(..HEADER_LEN)?;
        let kind = RecordKind::from_tag(header[0])?;
        let seq = u32::from_le_bytes(header[4..8].try_into().ok()?);
        let device = u32::from_le_bytes(header[8..12].try_into().ok()?);
        let time = u64::from_le_bytes(header[12..20].try_into().ok()?);
        Some(Self {
            kind,
            seq,
            device,
            time: HostTime(time),
        })
    }
}

/// A client's report that it finished handling an event.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ack {
    /// The acknowledged sequence number.
    pub seq: u32,
    /// Whether the client consumed the event.
    pub handled: bool,
}

impl Ack {
    /// Serializes the acknowledgement.
    #[must_use]
    pub fn encode(self) -> [u8; ACK_LEN] {
        let seq = self.seq.to_le_bytes();
        [seq[0], seq[1], seq[2], seq[3], u8::from(self.handled)]
    }

    /// Parses an acknowledgement datagram.
    #[must_use]
    pub fn decode(record: &[u8]) -> Option<Self> {
        let record = record.get(..ACK_LEN)?;
        Some(Self {
            seq: u32::from_le_bytes(record[..4].try_into().ok()?),
            handled: record[4] != 0,
        })
    }
}

impl fmt::Debug for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ack(#{}, handled={})", self.seq, self.handled)
    }
}

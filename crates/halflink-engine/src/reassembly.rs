//! Inbound reassembly buffers keyed by `(type, context)`.

use std::collections::BTreeMap;

use bytes::{Bytes, BytesMut};
use halflink_frame::PacketType;

/// Payload recorded for an inbound PING or PONG.
pub const MARKER: [u8; 1] = [1];

/// Identifies one logical inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageKey {
    pub packet_type: PacketType,
    pub context: u8,
}

impl MessageKey {
    pub fn new(packet_type: PacketType, context: u8) -> Self {
        Self {
            packet_type,
            context,
        }
    }
}

/// Accumulates fragment bodies until the engine goes idle.
///
/// Iteration order is by type, then context.
#[derive(Debug, Default)]
pub struct ReassemblyStore {
    entries: BTreeMap<MessageKey, BytesMut>,
}

impl ReassemblyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure an entry exists for `key`, possibly empty.
    pub fn open(&mut self, key: MessageKey) {
        self.entries.entry(key).or_default();
    }

    /// Append a fragment body to the entry for `key`.
    pub fn append(&mut self, key: MessageKey, body: &[u8]) {
        self.entries.entry(key).or_default().extend_from_slice(body);
    }

    /// Replace the entry for `key` with the one-byte [`MARKER`].
    pub fn mark(&mut self, key: MessageKey) {
        self.entries.insert(key, BytesMut::from(&MARKER[..]));
    }

    pub fn get(&self, key: &MessageKey) -> Option<&[u8]> {
        self.entries.get(key).map(|buf| buf.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take every entry, leaving the store empty.
    pub fn take(&mut self) -> Vec<(MessageKey, Bytes)> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(key, buf)| (key, buf.freeze()))
            .collect()
    }
}

//! Outbound FIFO and fragmenter.

use std::collections::VecDeque;

use bytes::Bytes;
use halflink_frame::PacketType;

/// One slice of a payload, ready to be framed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub sequence: u8,
    pub body: Bytes,
}

/// A message waiting to be sent, or in flight.
///
/// The payload is never modified; a cursor tracks how much has been handed
/// out as fragments.
#[derive(Debug, Clone)]
pub struct OutboundTransfer {
    payload: Bytes,
    packet_type: PacketType,
    context: u8,
    cursor: usize,
    next_sequence: u8,
}

impl OutboundTransfer {
    pub fn new(payload: Bytes, packet_type: PacketType, context: u8) -> Self {
        Self {
            payload,
            packet_type,
            context,
            cursor: 0,
            next_sequence: 0,
        }
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub fn context(&self) -> u8 {
        self.context
    }

    /// Full payload length, as announced by START.
    pub fn total_len(&self) -> usize {
        self.payload.len()
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> usize {
        self.payload.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Sequence number the next fragment will carry.
    pub fn next_sequence(&self) -> u8 {
        self.next_sequence
    }

    /// Cut the next fragment of at most `max_body` bytes.
    ///
    /// Returns `None` once the payload is exhausted; an empty remainder is
    /// never turned into a fragment.
    pub fn next_fragment(&mut self, max_body: usize) -> Option<Fragment> {
        if self.is_exhausted() || max_body == 0 {
            return None;
        }

        let end = self.payload.len().min(self.cursor + max_body);
        let body = self.payload.slice(self.cursor..end);
        let sequence = self.next_sequence;

        self.cursor = end;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        Some(Fragment { sequence, body })
    }
}

/// FIFO of submitted messages. Only the front one is ever in flight.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    transfers: VecDeque<OutboundTransfer>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transfer: OutboundTransfer) {
        self.transfers.push_back(transfer);
    }

    pub fn front(&self) -> Option<&OutboundTransfer> {
        self.transfers.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut OutboundTransfer> {
        self.transfers.front_mut()
    }

    pub fn pop_front(&mut self) -> Option<OutboundTransfer> {
        self.transfers.pop_front()
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(len: usize) -> OutboundTransfer {
        let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
        OutboundTransfer::new(Bytes::from(payload), PacketType::new(99), 3)
    }

    fn drain(transfer: &mut OutboundTransfer, max_body: usize) -> Vec<Fragment> {
        std::iter::from_fn(|| transfer.next_fragment(max_body)).collect()
    }

    #[test]
    fn splits_into_capped_fragments() {
        let mut t = transfer(300);
        let sizes: Vec<usize> = drain(&mut t, 88).iter().map(|f| f.body.len()).collect();
        assert_eq!(sizes, vec![88, 88, 88, 36]);
        assert!(t.is_exhausted());
    }

    #[test]
    fn sequences_increment_per_fragment() {
        let mut t = transfer(10);
        let seqs: Vec<u8> = drain(&mut t, 3).iter().map(|f| f.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
        assert_eq!(t.next_sequence(), 4);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let mut t = transfer(176);
        let fragments = drain(&mut t, 88);
        assert_eq!(fragments.len(), 2);
        assert!(fragments.iter().all(|f| f.body.len() == 88));
    }

    #[test]
    fn empty_payload_has_no_fragments() {
        let mut t = transfer(0);
        assert!(t.is_exhausted());
        assert!(t.next_fragment(88).is_none());
        assert_eq!(t.total_len(), 0);
    }

    #[test]
    fn fragments_concatenate_to_payload() {
        let mut t = transfer(200);
        let joined: Vec<u8> = drain(&mut t, 7)
            .iter()
            .flat_map(|f| f.body.iter().copied())
            .collect();
        let expected: Vec<u8> = (0..200).map(|i| i as u8).collect();
        assert_eq!(joined, expected);
    }

    #[test]
    fn sequence_wraps() {
        let mut t = transfer(300);
        let fragments = drain(&mut t, 1);
        assert_eq!(fragments[255].sequence, 255);
        assert_eq!(fragments[256].sequence, 0);
    }

    #[test]
    fn queue_is_fifo() {
        let mut queue = OutboundQueue::new();
        queue.push(OutboundTransfer::new(Bytes::from_static(b"a"), PacketType::new(99), 1));
        queue.push(OutboundTransfer::new(Bytes::from_static(b"b"), PacketType::new(99), 2));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.front().map(|t| t.context()), Some(1));
        assert_eq!(queue.pop_front().map(|t| t.context()), Some(1));
        assert_eq!(queue.pop_front().map(|t| t.context()), Some(2));
        assert!(queue.is_empty());
    }
}

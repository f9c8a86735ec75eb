use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::packet::{Control, PacketType, Role};

/// Frame header: type, sequence, context, length, checksum + 3 reserved = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Default packet size on the wire.
pub const DEFAULT_PACKET_SIZE: usize = 96;

/// Smallest packet that still carries one body byte.
pub const MIN_PACKET_SIZE: usize = HEADER_SIZE + 1;

/// Largest packet whose length fits the one-byte length field.
pub const MAX_PACKET_SIZE: usize = u8::MAX as usize;

const TYPE_OFFSET: usize = 0;
const SEQUENCE_OFFSET: usize = 1;
const CONTEXT_OFFSET: usize = 2;
const LENGTH_OFFSET: usize = 3;
const CHECKSUM_OFFSET: usize = 4;
const RESERVED_OFFSET: usize = 5;

/// A decoded frame.
///
/// `length` and `checksum` are the values carried on the wire. They are
/// recomputed by [`encode_frame`], so a frame built with [`Frame::new`] never
/// needs them set by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub packet_type: PacketType,
    pub sequence: u8,
    pub context: u8,
    pub length: u8,
    pub checksum: u8,
    pub reserved: [u8; 3],
    pub body: Bytes,
}

impl Frame {
    /// Create a frame with a computed length and checksum.
    pub fn new(
        packet_type: PacketType,
        sequence: u8,
        context: u8,
        body: impl Into<Bytes>,
    ) -> Self {
        let body = body.into();
        let length = u8::try_from(HEADER_SIZE + body.len()).unwrap_or(u8::MAX);
        let mut frame = Self {
            packet_type,
            sequence,
            context,
            length,
            checksum: 0,
            reserved: [0; 3],
            body,
        };
        frame.checksum = frame.compute_checksum();
        frame
    }

    /// A header-only control frame.
    pub fn control(packet_type: PacketType) -> Self {
        Self::new(packet_type, 0, 0, Bytes::new())
    }

    /// Placeholder used when the inbound channel holds less than a header.
    pub fn synthetic_noop(role: Role) -> Self {
        Self::control(role.inbound(Control::Noop))
    }

    /// The 8 header bytes as carried on the wire.
    pub fn header_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[TYPE_OFFSET] = self.packet_type.code();
        header[SEQUENCE_OFFSET] = self.sequence;
        header[CONTEXT_OFFSET] = self.context;
        header[LENGTH_OFFSET] = self.length;
        header[CHECKSUM_OFFSET] = self.checksum;
        header[RESERVED_OFFSET..].copy_from_slice(&self.reserved);
        header
    }

    /// Checksum over this frame's header and body, bounded by `length`.
    pub fn compute_checksum(&self) -> u8 {
        let header = self.header_bytes();
        fold_checksum(
            self.packet_type.code(),
            header.iter().chain(self.body.iter()),
            usize::from(self.length),
        )
    }

    /// Whether the carried checksum matches the frame contents.
    pub fn has_valid_checksum(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    /// Number of body bytes the header claims.
    pub fn body_len(&self) -> usize {
        usize::from(self.length).saturating_sub(HEADER_SIZE)
    }
}

/// XOR checksum of a raw frame.
///
/// Seeded with the type byte, folds every byte in `[1, length)` except the
/// checksum byte itself. `length` is read from the header and clamped to the
/// bytes available.
pub fn checksum(raw: &[u8]) -> u8 {
    let Some(&packet_type) = raw.first() else {
        return 0;
    };
    let length = raw.get(LENGTH_OFFSET).copied().map_or(0, usize::from);
    fold_checksum(packet_type, raw.iter(), length)
}

fn fold_checksum<'a>(seed: u8, bytes: impl Iterator<Item = &'a u8>, length: usize) -> u8 {
    bytes
        .enumerate()
        .take(length)
        .skip(1)
        .filter(|(offset, _)| *offset != CHECKSUM_OFFSET)
        .fold(seed, |acc, (_, byte)| acc ^ byte)
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬─────┬─────┬─────┬─────┬──────────┬──────────────┬─────────────┐
/// │ Type │ Seq │ Ctx │ Len │ Sum │ Reserved │ Body         │ Zero pad    │
/// │ (1B) │(1B) │(1B) │(1B) │(1B) │ (3B)     │ (Len - 8 B)  │ to pkt size │
/// └──────┴─────┴─────┴─────┴─────┴──────────┴──────────────┴─────────────┘
/// ```
///
/// Length and checksum are computed from the body; the values stored in
/// `frame` are ignored.
pub fn encode_frame(frame: &Frame, config: &FrameConfig, dst: &mut BytesMut) -> Result<()> {
    let max = config.max_body();
    if frame.body.len() > max {
        return Err(FrameError::BodyTooLarge {
            size: frame.body.len(),
            max,
        });
    }

    let start = dst.len();
    dst.reserve(config.packet_size);
    dst.put_u8(frame.packet_type.code());
    dst.put_u8(frame.sequence);
    dst.put_u8(frame.context);
    // Fits: packet_size <= MAX_PACKET_SIZE and body <= packet_size - 8.
    dst.put_u8((HEADER_SIZE + frame.body.len()) as u8);
    dst.put_u8(0);
    dst.put_slice(&frame.reserved);
    dst.put_slice(&frame.body);

    let sum = checksum(&dst[start..]);
    dst[start + CHECKSUM_OFFSET] = sum;
    dst.resize(start + config.packet_size, 0);
    Ok(())
}

/// Decode a raw chunk read from the inbound channel.
///
/// Never fails: a chunk shorter than the header yields the synthetic NOOP
/// for `role`, and a body truncated by the chunk end is kept as-is (its
/// checksum will not match).
pub fn decode_frame(raw: &[u8], role: Role) -> Frame {
    if raw.len() < HEADER_SIZE {
        return Frame::synthetic_noop(role);
    }

    let length = raw[LENGTH_OFFSET];
    let body_end = usize::from(length).clamp(HEADER_SIZE, raw.len());
    let mut reserved = [0u8; 3];
    reserved.copy_from_slice(&raw[RESERVED_OFFSET..HEADER_SIZE]);

    Frame {
        packet_type: PacketType::new(raw[TYPE_OFFSET]),
        sequence: raw[SEQUENCE_OFFSET],
        context: raw[CONTEXT_OFFSET],
        length,
        checksum: raw[CHECKSUM_OFFSET],
        reserved,
        body: Bytes::copy_from_slice(&raw[HEADER_SIZE..body_end]),
    }
}

/// Configuration for the frame codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Fixed size of every frame on the wire. Default: 96.
    pub packet_size: usize,
}

impl FrameConfig {
    /// Create a validated configuration.
    pub fn new(packet_size: usize) -> Result<Self> {
        let config = Self { packet_size };
        config.validate()?;
        Ok(config)
    }

    /// Check that the packet size is usable.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PACKET_SIZE..=MAX_PACKET_SIZE).contains(&self.packet_size) {
            return Err(FrameError::InvalidPacketSize {
                size: self.packet_size,
                min: MIN_PACKET_SIZE,
                max: MAX_PACKET_SIZE,
            });
        }
        Ok(())
    }

    /// Body bytes available in one frame.
    pub fn max_body(&self) -> usize {
        self.packet_size.saturating_sub(HEADER_SIZE)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            packet_size: DEFAULT_PACKET_SIZE,
        }
    }
}

use bytes::{Bytes, BytesMut};
use halflink_transport::Channel;
use tracing::trace;

use crate::codec::{decode_frame, encode_frame, Frame, FrameConfig};
use crate::error::Result;
use crate::packet::{type_name, Role};

/// Reads and writes whole frames over a [`Channel`].
///
/// Remembers the exact bytes of the last frame written so it can be
/// retransmitted verbatim.
pub struct FramedChannel<C> {
    inner: C,
    config: FrameConfig,
    role: Role,
    buf: BytesMut,
    last_sent: Option<Bytes>,
}

impl<C: Channel> FramedChannel<C> {
    /// Create a framed channel with default configuration.
    pub fn new(inner: C, role: Role) -> Self {
        Self::with_config(inner, FrameConfig::default(), role)
    }

    /// Create a framed channel with explicit configuration.
    pub fn with_config(inner: C, config: FrameConfig, role: Role) -> Self {
        Self {
            inner,
            config,
            role,
            buf: BytesMut::with_capacity(config.packet_size),
            last_sent: None,
        }
    }

    /// Decode the most recent packet on the inbound channel.
    ///
    /// Always yields a frame; see [`decode_frame`].
    pub fn read_frame(&mut self) -> Result<Frame> {
        let raw = self.inner.read_latest(self.config.packet_size)?;
        let frame = decode_frame(&raw, self.role);
        trace!(
            packet_type = frame.packet_type.code(),
            name = type_name(frame.packet_type),
            sequence = frame.sequence,
            context = frame.context,
            length = frame.length,
            "read frame"
        );
        Ok(frame)
    }

    /// Encode and append a frame.
    pub fn send(&mut self, frame: &Frame) -> Result<()> {
        self.buf.clear();
        encode_frame(frame, &self.config, &mut self.buf)?;
        let bytes = self.buf.split().freeze();

        self.inner.append(&bytes)?;
        trace!(
            packet_type = frame.packet_type.code(),
            name = type_name(frame.packet_type),
            sequence = frame.sequence,
            context = frame.context,
            body = frame.body.len(),
            "sent frame"
        );
        self.last_sent = Some(bytes);
        Ok(())
    }

    /// Append the last sent frame again, byte for byte.
    ///
    /// Returns `false` without writing when nothing has been sent yet.
    pub fn resend(&mut self) -> Result<bool> {
        let Some(bytes) = &self.last_sent else {
            return Ok(false);
        };
        self.inner.append(bytes)?;
        trace!(len = bytes.len(), "resent last frame");
        Ok(true)
    }

    /// Exact bytes of the last frame written.
    pub fn last_sent(&self) -> Option<&Bytes> {
        self.last_sent.as_ref()
    }

    /// Borrow the underlying channel.
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    /// Mutably borrow the underlying channel.
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Consume the framed channel and return the inner channel.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Current codec configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// The role this side plays.
    pub fn role(&self) -> Role {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use halflink_transport::{MemoryChannel, TransportError};

    use super::*;
    use crate::codec::DEFAULT_PACKET_SIZE;
    use crate::error::FrameError;
    use crate::packet::{Control, PacketType};

    #[test]
    fn send_appends_full_packet() {
        let channel = MemoryChannel::new();
        let mut framed = FramedChannel::new(channel.clone(), Role::Host);

        framed
            .send(&Frame::control(Role::Host.outbound(Control::Ping)))
            .unwrap();

        let wire = channel.outbound().snapshot();
        assert_eq!(wire.len(), DEFAULT_PACKET_SIZE);
        assert_eq!(wire[0], 3);
        assert_eq!(framed.last_sent().unwrap().as_ref(), wire.as_slice());
    }

    #[test]
    fn read_frame_decodes_latest_packet() {
        let (host, device) = MemoryChannel::pair();
        let mut host = FramedChannel::new(host, Role::Host);
        let mut device = FramedChannel::new(device, Role::Device);

        device
            .send(&Frame::new(PacketType::new(100), 0, 1, Bytes::from_static(b"old")))
            .unwrap();
        device
            .send(&Frame::new(PacketType::new(100), 1, 1, Bytes::from_static(b"new")))
            .unwrap();

        let frame = host.read_frame().unwrap();
        assert_eq!(frame.sequence, 1);
        assert_eq!(frame.body.as_ref(), b"new");
        assert!(frame.has_valid_checksum());
    }

    #[test]
    fn read_frame_on_empty_channel_is_noop() {
        let mut framed = FramedChannel::new(MemoryChannel::new(), Role::Host);
        let frame = framed.read_frame().unwrap();
        assert_eq!(frame.packet_type, Role::Host.inbound(Control::Noop));
    }

    #[test]
    fn resend_repeats_exact_bytes() {
        let channel = MemoryChannel::new();
        let mut framed = FramedChannel::new(channel.clone(), Role::Host);
        framed
            .send(&Frame::new(PacketType::new(99), 5, 2, Bytes::from_static(b"chunk")))
            .unwrap();

        assert!(framed.resend().unwrap());

        let wire = channel.outbound().snapshot();
        let (first, second) = wire.split_at(DEFAULT_PACKET_SIZE);
        assert_eq!(first, second);
    }

    #[test]
    fn resend_before_any_send_writes_nothing() {
        let channel = MemoryChannel::new();
        let mut framed = FramedChannel::new(channel.clone(), Role::Host);

        assert!(!framed.resend().unwrap());
        assert!(channel.outbound().is_empty());
    }

    #[test]
    fn oversized_body_is_not_written() {
        let channel = MemoryChannel::new();
        let config = FrameConfig::new(16).unwrap();
        let mut framed = FramedChannel::with_config(channel.clone(), config, Role::Host);

        let err = framed
            .send(&Frame::new(PacketType::new(99), 0, 0, vec![1u8; 9]))
            .unwrap_err();
        assert!(matches!(err, FrameError::BodyTooLarge { .. }));
        assert!(channel.outbound().is_empty());
        assert!(framed.last_sent().is_none());
    }

    #[test]
    fn transport_failure_propagates() {
        let channel = MemoryChannel::new();
        channel.close();
        let mut framed = FramedChannel::new(channel, Role::Host);

        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Transport(TransportError::Closed)));
    }
}

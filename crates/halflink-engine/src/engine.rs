use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use halflink_frame::{
    type_name, Control, Frame, FrameConfig, FramedChannel, PacketType, Role, HEADER_SIZE,
};
use halflink_transport::Channel;
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::queue::{OutboundQueue, OutboundTransfer};
use crate::reassembly::{MessageKey, ReassemblyStore};
use crate::registry::{Dispatch, Message, Registry};

/// Transfer state. `Idle` is both the initial state and the state between
/// transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Idle,
    /// START sent, waiting for the peer to acknowledge it.
    AwaitStartAck,
    /// Fragments of the front transfer are going out, one per ACK.
    Sending,
    /// The peer announced a message; fragments are being collected.
    Receiving,
}

impl State {
    pub const fn name(self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::AwaitStartAck => "await_start_ack",
            State::Sending => "sending",
            State::Receiving => "receiving",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Point-to-point protocol engine over a half-duplex [`Channel`].
///
/// Nothing happens on the wire except inside [`tick`](Self::tick) and
/// [`ping`](Self::ping); the caller decides how often to tick.
pub struct Engine<C> {
    framed: FramedChannel<C>,
    role: Role,
    state: State,
    queue: OutboundQueue,
    store: ReassemblyStore,
    registry: Registry,
}

impl<C: Channel> Engine<C> {
    /// Create an engine with default configuration (host role, 96-byte packets).
    pub fn new(channel: C) -> Self {
        Self::build(channel, FrameConfig::default(), Role::Host)
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(channel: C, config: EngineConfig) -> Result<Self> {
        let frame_config = config.frame_config()?;
        Ok(Self::build(channel, frame_config, config.role))
    }

    fn build(channel: C, frame_config: FrameConfig, role: Role) -> Self {
        debug!(
            role = role.name(),
            packet_size = frame_config.packet_size,
            "engine created"
        );
        Self {
            framed: FramedChannel::with_config(channel, frame_config, role),
            role,
            state: State::Idle,
            queue: OutboundQueue::new(),
            store: ReassemblyStore::new(),
            registry: Registry::for_role(role),
        }
    }

    /// Queue a message for sending.
    ///
    /// Nothing is written here; the transfer starts on a later tick once the
    /// engine is idle and the peer is quiet.
    pub fn submit(
        &mut self,
        payload: impl Into<Bytes>,
        packet_type: impl Into<PacketType>,
        context: u8,
    ) -> Result<()> {
        let payload = payload.into();
        announced_length(payload.len())?;

        let packet_type = packet_type.into();
        debug!(
            packet_type = packet_type.code(),
            context,
            len = payload.len(),
            queued = self.queue.len() + 1,
            "message submitted"
        );
        self.queue
            .push(OutboundTransfer::new(payload, packet_type, context));
        Ok(())
    }

    /// Install a callback for completed messages of `packet_type`.
    ///
    /// Replaces any previous handler, including the built-in PING responder.
    pub fn register<F>(&mut self, packet_type: impl Into<PacketType>, callback: F)
    where
        F: FnMut(Message) + Send + 'static,
    {
        self.registry.register(packet_type, callback);
    }

    /// Remove the handler for `packet_type`; its messages are dropped from now on.
    pub fn unregister(&mut self, packet_type: impl Into<PacketType>) {
        self.registry.unregister(packet_type);
    }

    /// Send a PING right away.
    pub fn ping(&mut self) -> Result<()> {
        self.send_control(Control::Ping)
    }

    /// Read the latest inbound frame, react to it, and flush completed
    /// messages if the engine ends up idle.
    pub fn tick(&mut self) -> Result<()> {
        let frame = self.framed.read_frame()?;
        self.process(&frame)?;
        if self.state == State::Idle {
            self.flush()?;
        }
        Ok(())
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Messages submitted but not yet fully acknowledged.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Reassembly entries waiting for the next idle flush.
    pub fn buffered(&self) -> usize {
        self.store.len()
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            packet_size: self.framed.config().packet_size,
            role: self.role,
        }
    }

    /// Exact bytes of the last frame written.
    pub fn last_sent(&self) -> Option<&Bytes> {
        self.framed.last_sent()
    }

    /// Borrow the underlying channel.
    pub fn channel(&self) -> &C {
        self.framed.get_ref()
    }

    /// Mutably borrow the underlying channel.
    pub fn channel_mut(&mut self) -> &mut C {
        self.framed.get_mut()
    }

    /// Consume the engine and return the channel.
    pub fn into_inner(self) -> C {
        self.framed.into_inner()
    }

    fn process(&mut self, frame: &Frame) -> Result<()> {
        if frame.packet_type == self.role.inbound(Control::Noop) {
            return self.on_noop();
        }

        if !self.role.accepts(frame.packet_type) {
            trace!(packet_type = frame.packet_type.code(), "ignoring own-side frame");
            return Ok(());
        }

        if !frame.has_valid_checksum() {
            warn!(
                packet_type = frame.packet_type.code(),
                sequence = frame.sequence,
                context = frame.context,
                expected = frame.compute_checksum(),
                actual = frame.checksum,
                "checksum mismatch, rejecting"
            );
            return self.reply(Control::Reject, frame);
        }

        match frame.packet_type.control() {
            Some(Control::Ping | Control::Pong) => {
                self.store
                    .mark(MessageKey::new(frame.packet_type, frame.context));
            }
            Some(Control::Start) => {
                self.on_start(frame);
                return self.reply(Control::Ack, frame);
            }
            Some(Control::End) => {
                self.transition(State::Idle);
                self.reply(Control::Ack, frame)?;
            }
            Some(Control::Reject) => {
                warn!(sequence = frame.sequence, context = frame.context, "peer rejected, resending");
                self.framed.resend()?;
            }
            Some(Control::Ack) => self.on_ack()?,
            Some(Control::Noop) | None => {}
        }

        if self.state == State::Receiving && frame.packet_type.is_data() {
            self.receive(frame)?;
        }
        Ok(())
    }

    fn on_noop(&mut self) -> Result<()> {
        if self.state == State::Idle {
            if let Some(transfer) = self.queue.front() {
                let start = start_frame(self.role, transfer, self.framed.config().max_body());
                debug!(
                    packet_type = transfer.packet_type().code(),
                    context = transfer.context(),
                    len = transfer.total_len(),
                    "starting transfer"
                );
                self.framed.send(&start)?;
                self.transition(State::AwaitStartAck);
                return Ok(());
            }
        }
        self.send_control(Control::Noop)
    }

    fn on_start(&mut self, frame: &Frame) {
        self.transition(State::Receiving);

        // Open the announced entry so zero-length messages still reach their
        // callback.
        let Some(&announced) = frame.body.first() else {
            return;
        };
        let announced = PacketType::new(announced);
        if self.role.accepts(announced) && announced.is_data() {
            let len = frame
                .body
                .get(1..5)
                .and_then(|b| <[u8; 4]>::try_from(b).ok())
                .map(u32::from_le_bytes);
            debug!(
                packet_type = announced.code(),
                context = frame.context,
                len,
                "peer started transfer"
            );
            self.store.open(MessageKey::new(announced, frame.context));
        }
    }

    fn on_ack(&mut self) -> Result<()> {
        match self.state {
            State::Idle => self.send_control(Control::Noop),
            State::AwaitStartAck => {
                self.transition(State::Sending);
                self.send_next()
            }
            State::Sending => self.send_next(),
            State::Receiving => Ok(()),
        }
    }

    fn send_next(&mut self) -> Result<()> {
        let max_body = self.framed.config().max_body();
        let Some(transfer) = self.queue.front_mut() else {
            self.transition(State::Idle);
            return Ok(());
        };

        if let Some(fragment) = transfer.next_fragment(max_body) {
            let frame = Frame::new(
                transfer.packet_type(),
                fragment.sequence,
                transfer.context(),
                fragment.body,
            );
            trace!(
                sequence = frame.sequence,
                remaining = transfer.remaining(),
                "sending fragment"
            );
            return Ok(self.framed.send(&frame)?);
        }

        let end = Frame::new(
            self.role.outbound(Control::End),
            0,
            transfer.context(),
            Bytes::copy_from_slice(&[transfer.packet_type().code()]),
        );
        self.framed.send(&end)?;
        if let Some(done) = self.queue.pop_front() {
            debug!(
                packet_type = done.packet_type().code(),
                context = done.context(),
                len = done.total_len(),
                "transfer complete"
            );
        }
        self.transition(State::Idle);
        Ok(())
    }

    fn receive(&mut self, frame: &Frame) -> Result<()> {
        if usize::from(frame.length) <= HEADER_SIZE {
            return Ok(());
        }
        self.store
            .append(MessageKey::new(frame.packet_type, frame.context), &frame.body);
        trace!(
            packet_type = frame.packet_type.code(),
            sequence = frame.sequence,
            len = frame.body.len(),
            "fragment stored"
        );
        self.reply(Control::Ack, frame)
    }

    fn flush(&mut self) -> Result<()> {
        if self.store.is_empty() {
            return Ok(());
        }

        let mut pongs = Vec::new();
        for (key, payload) in self.store.take() {
            let len = payload.len();
            let message = Message {
                packet_type: key.packet_type,
                context: key.context,
                payload,
            };
            match self.registry.dispatch(message) {
                Dispatch::Delivered => debug!(
                    packet_type = key.packet_type.code(),
                    name = type_name(key.packet_type),
                    context = key.context,
                    len,
                    "message delivered"
                ),
                Dispatch::ReplyPong => pongs.push(key.context),
                Dispatch::Unhandled => trace!(
                    packet_type = key.packet_type.code(),
                    context = key.context,
                    len,
                    "no handler, dropping message"
                ),
            }
        }

        for context in pongs {
            let pong = Frame::new(self.role.outbound(Control::Pong), 0, context, Bytes::new());
            self.framed.send(&pong)?;
        }
        Ok(())
    }

    /// Answer `frame` with ACK or REJECT, echoing its sequence, context and type.
    fn reply(&mut self, control: Control, frame: &Frame) -> Result<()> {
        let reply = Frame::new(
            self.role.outbound(control),
            frame.sequence,
            frame.context,
            Bytes::copy_from_slice(&[frame.packet_type.code()]),
        );
        Ok(self.framed.send(&reply)?)
    }

    fn send_control(&mut self, control: Control) -> Result<()> {
        let frame = Frame::control(self.role.outbound(control));
        Ok(self.framed.send(&frame)?)
    }

    fn transition(&mut self, next: State) {
        if self.state != next {
            debug!(from = self.state.name(), to = next.name(), "state change");
            self.state = next;
        }
    }
}

impl<C> fmt::Debug for Engine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("role", &self.role)
            .field("state", &self.state)
            .field("pending", &self.queue.len())
            .field("buffered", &self.store.len())
            .field("registry", &self.registry)
            .finish()
    }
}

/// START body: message type followed by the total length, little endian.
///
/// Packets too small to hold the length carry only as much of it as fits.
fn start_frame(role: Role, transfer: &OutboundTransfer, max_body: usize) -> Frame {
    let mut body = BytesMut::with_capacity(5);
    body.put_u8(transfer.packet_type().code());
    // Checked by `submit`.
    body.put_u32_le(transfer.total_len() as u32);
    body.truncate(max_body);
    Frame::new(
        role.outbound(Control::Start),
        0,
        transfer.context(),
        body.freeze(),
    )
}

fn announced_length(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| EngineError::PayloadTooLarge {
        size: len,
        max: u32::MAX as usize,
    })
}

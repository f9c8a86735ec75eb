//! Packet type codes.
//!
//! Every control packet exists in two variants that differ only in the lowest
//! bit: even codes are sent by the device, odd codes by the host. Application
//! data types (codes from [`FIRST_DATA_TYPE`] up) follow the same convention.

use std::fmt;

/// First code available for application data.
pub const FIRST_DATA_TYPE: u8 = 14;

/// One-byte packet type as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PacketType(u8);

impl PacketType {
    /// Wrap a raw code.
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// The raw code.
    pub const fn code(self) -> u8 {
        self.0
    }

    /// The side that sends packets of this type.
    pub const fn origin(self) -> Role {
        if self.0 % 2 == 0 {
            Role::Device
        } else {
            Role::Host
        }
    }

    /// The same type sent from the other side.
    pub const fn counterpart(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// The control packet this code stands for, if any.
    pub const fn control(self) -> Option<Control> {
        Control::from_code(self.0)
    }

    /// Whether this code carries application data rather than control.
    pub const fn is_data(self) -> bool {
        self.0 >= FIRST_DATA_TYPE
    }
}

impl From<u8> for PacketType {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl From<PacketType> for u8 {
    fn from(packet_type: PacketType) -> Self {
        packet_type.0
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", type_name(*self), self.0)
    }
}

/// Control packets understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Keep-alive, also the "nothing to read" placeholder.
    Noop,
    /// Liveness probe.
    Ping,
    /// Liveness reply.
    Pong,
    /// Positive acknowledgment of the last received frame.
    Ack,
    /// Checksum failure on the last received frame.
    Reject,
    /// Announces a message: type and total length.
    Start,
    /// Closes a message.
    End,
}

impl Control {
    /// The device-side (even) code.
    pub const fn base(self) -> u8 {
        match self {
            Control::Noop => 0,
            Control::Ping => 2,
            Control::Pong => 4,
            Control::Ack => 6,
            Control::Reject => 8,
            Control::Start => 10,
            Control::End => 12,
        }
    }

    /// Decode either variant of a control code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code & !1 {
            0 => Some(Control::Noop),
            2 => Some(Control::Ping),
            4 => Some(Control::Pong),
            6 => Some(Control::Ack),
            8 => Some(Control::Reject),
            10 => Some(Control::Start),
            12 => Some(Control::End),
            _ => None,
        }
    }

    /// Upper-case name used in logs and CLI output.
    pub const fn name(self) -> &'static str {
        match self {
            Control::Noop => "NOOP",
            Control::Ping => "PING",
            Control::Pong => "PONG",
            Control::Ack => "ACK",
            Control::Reject => "REJECT",
            Control::Start => "START",
            Control::End => "END",
        }
    }
}

/// Which end of the link an engine plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Sends odd codes, accepts even codes.
    #[default]
    Host,
    /// Sends even codes, accepts odd codes.
    Device,
}

impl Role {
    /// The opposite end.
    pub const fn peer(self) -> Role {
        match self {
            Role::Host => Role::Device,
            Role::Device => Role::Host,
        }
    }

    /// Code this role uses when sending `control`.
    pub const fn outbound(self, control: Control) -> PacketType {
        match self {
            Role::Host => PacketType(control.base() + 1),
            Role::Device => PacketType(control.base()),
        }
    }

    /// Code the peer uses when sending `control` to this role.
    pub const fn inbound(self, control: Control) -> PacketType {
        self.peer().outbound(control)
    }

    /// Whether frames of this type are addressed to this role.
    ///
    /// Frames with this role's own parity are echoes of its own traffic and
    /// are never processed.
    pub const fn accepts(self, packet_type: PacketType) -> bool {
        !matches!(
            (self, packet_type.origin()),
            (Role::Host, Role::Host) | (Role::Device, Role::Device)
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Device => "device",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns a human-readable name for a packet type.
pub fn type_name(packet_type: PacketType) -> &'static str {
    match packet_type.control() {
        Some(control) => control.name(),
        None => "DATA",
    }
}

//! Fixed-size packet framing for half-duplex links.
//!
//! Every frame is padded to the configured packet size and starts with an
//! 8-byte header:
//! - type, sequence, context, length (1 byte each)
//! - an XOR checksum byte
//! - 3 reserved bytes
//!
//! The body follows the header. `length` counts the header too, so a bare
//! control frame has length 8.

pub mod codec;
pub mod error;
pub mod framed;
pub mod packet;

pub use codec::{
    checksum, decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_PACKET_SIZE, HEADER_SIZE,
    MAX_PACKET_SIZE, MIN_PACKET_SIZE,
};
pub use error::{FrameError, Result};
pub use framed::FramedChannel;
pub use packet::{type_name, Control, PacketType, Role, FIRST_DATA_TYPE};

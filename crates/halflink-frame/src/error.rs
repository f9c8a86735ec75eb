use halflink_transport::TransportError;

/// Errors that can occur during frame encoding or channel I/O.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The body does not fit in one packet.
    #[error("frame body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: usize, max: usize },

    /// The packet size cannot hold a header plus at least one body byte,
    /// or does not fit the one-byte length field.
    #[error("invalid packet size {size} (expected {min}..={max})")]
    InvalidPacketSize { size: usize, min: usize, max: usize },

    /// The underlying channel failed.
    #[error("channel error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;

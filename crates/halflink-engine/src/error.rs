use halflink_frame::FrameError;
use halflink_transport::TransportError;

/// Errors surfaced by the engine.
///
/// Protocol faults (bad checksums, rejections, unhandled types) never show up
/// here; they are handled on the wire.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Channel-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(FrameError),

    /// The payload length does not fit the 32-bit START length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

impl From<FrameError> for EngineError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Transport(err) => EngineError::Transport(err),
            other => EngineError::Frame(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

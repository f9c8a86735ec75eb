use std::path::PathBuf;

/// Errors that can occur in channel operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to read the tail of the inbound channel.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to append to the outbound channel.
    #[error("failed to append to {path}: {source}")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the channel.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel has been closed.
    #[error("channel closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;

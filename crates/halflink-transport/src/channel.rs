use crate::error::Result;

/// A half-duplex byte channel made of two append-only logs.
///
/// Writes always go to the end of the outbound log. Reads only ever look at
/// the tail of the inbound log; older bytes are never consumed or removed.
pub trait Channel {
    /// Append `bytes` to the outbound log.
    fn append(&mut self, bytes: &[u8]) -> Result<()>;

    /// Return the most recent `n` bytes of the inbound log.
    ///
    /// Returns fewer than `n` bytes (possibly none) when the log is shorter.
    fn read_latest(&mut self, n: usize) -> Result<Vec<u8>>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).append(bytes)
    }

    fn read_latest(&mut self, n: usize) -> Result<Vec<u8>> {
        (**self).read_latest(n)
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).append(bytes)
    }

    fn read_latest(&mut self, n: usize) -> Result<Vec<u8>> {
        (**self).read_latest(n)
    }
}

/// Slice the last `n` bytes off a log.
pub(crate) fn tail(log: &[u8], n: usize) -> &[u8] {
    &log[log.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_returns_last_bytes() {
        assert_eq!(tail(b"abcdef", 2), b"ef");
        assert_eq!(tail(b"abcdef", 6), b"abcdef");
    }

    #[test]
    fn tail_of_short_log_is_whole_log() {
        assert_eq!(tail(b"abc", 96), b"abc");
        assert!(tail(b"", 8).is_empty());
    }
}

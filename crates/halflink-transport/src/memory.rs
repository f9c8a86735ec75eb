use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use crate::channel::{tail, Channel};
use crate::error::{Result, TransportError};

/// An append-only byte log that can be shared between channels.
#[derive(Debug, Clone, Default)]
pub struct SharedLog {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes to the end of the log.
    pub fn push(&self, bytes: &[u8]) {
        self.lock().extend_from_slice(bytes);
    }

    /// Copy of the whole log.
    pub fn snapshot(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Current log length in bytes.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn tail(&self, n: usize) -> Vec<u8> {
        tail(&self.lock(), n).to_vec()
    }

    // A panic while holding the lock cannot leave a Vec<u8> half-updated.
    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// In-memory channel over two shared logs.
///
/// Used by tests and demos. Clones share the same logs and the same closed
/// flag.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    inbound: SharedLog,
    outbound: SharedLog,
    closed: Arc<AtomicBool>,
}

impl MemoryChannel {
    /// Create a channel with fresh, empty logs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel over existing logs.
    pub fn from_logs(inbound: SharedLog, outbound: SharedLog) -> Self {
        Self {
            inbound,
            outbound,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create two channels wired back to back.
    ///
    /// Whatever the first appends is read by the second and vice versa.
    pub fn pair() -> (Self, Self) {
        let a_to_b = SharedLog::new();
        let b_to_a = SharedLog::new();
        (
            Self::from_logs(b_to_a.clone(), a_to_b.clone()),
            Self::from_logs(a_to_b, b_to_a),
        )
    }

    /// The log this channel reads from.
    pub fn inbound(&self) -> &SharedLog {
        &self.inbound
    }

    /// The log this channel appends to.
    pub fn outbound(&self) -> &SharedLog {
        &self.outbound
    }

    /// Fail every subsequent operation with [`TransportError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        Ok(())
    }
}

impl Channel for MemoryChannel {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.outbound.push(bytes);
        trace!(len = bytes.len(), "appended");
        Ok(())
    }

    fn read_latest(&mut self, n: usize) -> Result<Vec<u8>> {
        self.ensure_open()?;
        Ok(self.inbound.tail(n))
    }
}

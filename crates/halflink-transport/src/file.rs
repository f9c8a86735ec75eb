use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::channel::Channel;
use crate::error::{Result, TransportError};

/// Channel backed by two files shared with the peer.
///
/// The peer appends its frames to `inbound`; this side appends to `outbound`.
/// Neither file is ever truncated, so both grow for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct FileChannel {
    inbound: PathBuf,
    outbound: PathBuf,
}

impl FileChannel {
    /// Create a channel over the given file pair.
    ///
    /// No file is touched until the first read or append. The outbound file is
    /// created on first append; the inbound file must be created by the peer.
    pub fn new(inbound: impl AsRef<Path>, outbound: impl AsRef<Path>) -> Self {
        let inbound = inbound.as_ref().to_path_buf();
        let outbound = outbound.as_ref().to_path_buf();
        debug!(?inbound, ?outbound, "file channel configured");
        Self { inbound, outbound }
    }

    /// Path the peer writes to.
    pub fn inbound_path(&self) -> &Path {
        &self.inbound
    }

    /// Path this side writes to.
    pub fn outbound_path(&self) -> &Path {
        &self.outbound
    }

    /// Current size of the inbound file.
    ///
    /// Callers that want to react only to fresh frames compare successive
    /// values instead of re-reading the same tail.
    pub fn inbound_len(&self) -> Result<u64> {
        std::fs::metadata(&self.inbound)
            .map(|meta| meta.len())
            .map_err(|source| TransportError::Read {
                path: self.inbound.clone(),
                source,
            })
    }

    fn read_tail(&self, n: usize) -> std::io::Result<Vec<u8>> {
        let mut file = File::open(&self.inbound)?;
        let len = file.metadata()?.len();
        let start = len.saturating_sub(n as u64);
        file.seek(SeekFrom::Start(start))?;

        let mut buf = Vec::with_capacity((len - start) as usize);
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn append_all(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.outbound)?;
        file.write_all(bytes)?;
        file.flush()
    }
}

impl Channel for FileChannel {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.append_all(bytes).map_err(|source| TransportError::Append {
            path: self.outbound.clone(),
            source,
        })?;
        trace!(path = ?self.outbound, len = bytes.len(), "appended");
        Ok(())
    }

    fn read_latest(&mut self, n: usize) -> Result<Vec<u8>> {
        let buf = self.read_tail(n).map_err(|source| TransportError::Read {
            path: self.inbound.clone(),
            source,
        })?;
        trace!(path = ?self.inbound, len = buf.len(), "read tail");
        Ok(buf)
    }
}

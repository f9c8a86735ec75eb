//! Byte channels for the halflink protocol engine.
//!
//! The engine needs very little from its transport:
//! - append a complete frame to the outbound channel
//! - read the most recent fixed-size chunk from the inbound channel
//!
//! Both directions behave like growing append-only logs. This crate provides
//! the [`Channel`] trait plus two implementations:
//! - [`FileChannel`] for a pair of files shared with the peer
//! - [`MemoryChannel`] for tests, demos and in-process loopback

pub mod channel;
pub mod error;
pub mod file;
pub mod memory;

pub use channel::Channel;
pub use error::{Result, TransportError};
pub use file::FileChannel;
pub use memory::{MemoryChannel, SharedLog};

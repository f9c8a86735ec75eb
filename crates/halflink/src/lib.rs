//! Framed packet protocol over half-duplex byte channels.
//!
//! halflink exchanges short control packets and arbitrary-length payloads
//! between two endpoints that share nothing but a pair of append-only byte
//! logs. Payloads are split into fixed-size frames, every frame is checksummed
//! and acknowledged, and the receiver reassembles messages before handing them
//! to per-type callbacks.
//!
//! # Crate Structure
//!
//! - [`transport`]: the [`Channel`](transport::Channel) trait plus file and
//!   in-memory channels
//! - [`frame`]: packet types, frame codec and checksum
//! - [`engine`]: transfer state machine, fragmentation, reassembly and dispatch
//!
//! # Example
//!
//! ```
//! use halflink::engine::{Engine, EngineConfig};
//! use halflink::frame::Role;
//! use halflink::transport::MemoryChannel;
//!
//! let (a, b) = MemoryChannel::pair();
//! let mut host = Engine::new(a);
//! let mut device =
//!     Engine::with_config(b, EngineConfig::default().with_role(Role::Device)).unwrap();
//!
//! host.submit(&b"hello"[..], 99u8, 0).unwrap();
//! while host.pending() > 0 {
//!     host.tick().unwrap();
//!     device.tick().unwrap();
//! }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use halflink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use halflink_frame::*;
}

/// Re-export engine types.
pub mod engine {
    pub use halflink_engine::*;
}

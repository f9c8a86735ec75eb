//! Protocol engine for half-duplex framed links.
//!
//! The caller drives everything through [`Engine::tick`]: each tick reads the
//! latest inbound frame, runs it through the transfer state machine (which may
//! write one response frame) and, once the engine is idle, hands completed
//! messages to the registered callbacks.
//!
//! Large payloads are split into packet-sized fragments on the way out and
//! reassembled per `(type, context)` on the way in.

pub mod config;
pub mod engine;
pub mod error;
pub mod queue;
pub mod reassembly;
pub mod registry;

pub use config::EngineConfig;
pub use engine::{Engine, State};
pub use error::{EngineError, Result};
pub use queue::{Fragment, OutboundQueue, OutboundTransfer};
pub use reassembly::{MessageKey, ReassemblyStore, MARKER};
pub use registry::{Dispatch, Handler, Message, Registry};

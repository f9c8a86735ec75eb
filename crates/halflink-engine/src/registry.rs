//! Callback dispatch table, one slot per packet type.

use std::fmt;

use bytes::Bytes;
use halflink_frame::{Control, PacketType, Role};

/// A completed inbound message handed to a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub packet_type: PacketType,
    pub context: u8,
    pub payload: Bytes,
}

/// Boxed user callback.
pub type Callback = Box<dyn FnMut(Message) + Send>;

/// What a slot does with a message.
pub enum Handler {
    /// Built-in: answer with a PONG.
    AutoPong,
    /// User callback.
    Callback(Callback),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::AutoPong => f.write_str("AutoPong"),
            Handler::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Outcome of dispatching one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A user callback received the message.
    Delivered,
    /// The engine should reply with a PONG.
    ReplyPong,
    /// No handler; the message was dropped.
    Unhandled,
}

const SLOTS: usize = u8::MAX as usize + 1;

/// Maps each packet type to at most one handler.
///
/// Empty slots drop messages silently.
pub struct Registry {
    slots: Vec<Option<Handler>>,
}

impl Registry {
    /// A registry with every slot empty.
    pub fn empty() -> Self {
        Self {
            slots: (0..SLOTS).map(|_| None).collect(),
        }
    }

    /// The default registry for `role`: inbound PINGs are answered with PONG.
    pub fn for_role(role: Role) -> Self {
        let mut registry = Self::empty();
        registry.set(role.inbound(Control::Ping), Handler::AutoPong);
        registry
    }

    /// Install `callback` for `packet_type`, replacing any previous handler.
    pub fn register<F>(&mut self, packet_type: impl Into<PacketType>, callback: F)
    where
        F: FnMut(Message) + Send + 'static,
    {
        self.set(packet_type.into(), Handler::Callback(Box::new(callback)));
    }

    /// Install a handler, returning the one it replaced.
    pub fn set(&mut self, packet_type: PacketType, handler: Handler) -> Option<Handler> {
        self.slots[slot(packet_type)].replace(handler)
    }

    /// Empty the slot for `packet_type`.
    pub fn unregister(&mut self, packet_type: impl Into<PacketType>) -> Option<Handler> {
        self.slots[slot(packet_type.into())].take()
    }

    pub fn is_registered(&self, packet_type: impl Into<PacketType>) -> bool {
        self.slots[slot(packet_type.into())].is_some()
    }

    /// Route a message to its slot.
    pub fn dispatch(&mut self, message: Message) -> Dispatch {
        match &mut self.slots[slot(message.packet_type)] {
            Some(Handler::Callback(callback)) => {
                callback(message);
                Dispatch::Delivered
            }
            Some(Handler::AutoPong) => Dispatch::ReplyPong,
            None => Dispatch::Unhandled,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::for_role(Role::default())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.slots
                    .iter()
                    .enumerate()
                    .filter_map(|(code, handler)| handler.as_ref().map(|h| (code, h))),
            )
            .finish()
    }
}

fn slot(packet_type: PacketType) -> usize {
    usize::from(packet_type.code())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn message(code: u8, payload: &'static [u8]) -> Message {
        Message {
            packet_type: PacketType::new(code),
            context: 0,
            payload: Bytes::from_static(payload),
        }
    }

    #[test]
    fn default_answers_device_ping() {
        let mut registry = Registry::default();
        assert!(registry.is_registered(2u8));
        assert_eq!(registry.dispatch(message(2, &[1])), Dispatch::ReplyPong);
    }

    #[test]
    fn device_role_answers_host_ping() {
        let mut registry = Registry::for_role(Role::Device);
        assert!(registry.is_registered(3u8));
        assert!(!registry.is_registered(2u8));
        assert_eq!(registry.dispatch(message(3, &[1])), Dispatch::ReplyPong);
    }

    #[test]
    fn unregistered_types_are_dropped() {
        let mut registry = Registry::default();
        assert_eq!(registry.dispatch(message(100, b"data")), Dispatch::Unhandled);
    }

    #[test]
    fn register_delivers_payload() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut registry = Registry::default();
        registry.register(100u8, move |msg: Message| sink.lock().unwrap().push(msg.payload));

        assert_eq!(registry.dispatch(message(100, b"data")), Dispatch::Delivered);
        assert_eq!(seen.lock().unwrap().as_slice(), &[Bytes::from_static(b"data")]);
    }

    #[test]
    fn register_overwrites_previous_handler() {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let first = hits.clone();
        let second = hits.clone();
        let mut registry = Registry::default();
        registry.register(100u8, move |_| first.lock().unwrap().push("first"));
        registry.register(100u8, move |_| second.lock().unwrap().push("second"));

        registry.dispatch(message(100, b""));
        assert_eq!(hits.lock().unwrap().as_slice(), &["second"]);
    }

    #[test]
    fn registering_ping_replaces_auto_pong() {
        let mut registry = Registry::default();
        registry.register(2u8, |_| {});
        assert_eq!(registry.dispatch(message(2, &[1])), Dispatch::Delivered);
    }

    #[test]
    fn unregister_empties_slot() {
        let mut registry = Registry::default();
        assert!(matches!(registry.unregister(2u8), Some(Handler::AutoPong)));
        assert_eq!(registry.dispatch(message(2, &[1])), Dispatch::Unhandled);
    }
}

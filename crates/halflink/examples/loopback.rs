//! Two engines in one process, joined by an in-memory channel pair.
//!
//! Run with:
//!   cargo run --example loopback

use std::sync::mpsc;

use halflink::engine::{Engine, EngineConfig};
use halflink::frame::{Control, Role};
use halflink::transport::MemoryChannel;

const GREETING: u8 = 99;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (a, b) = MemoryChannel::pair();
    let config = EngineConfig::default().with_packet_size(32);
    let mut host = Engine::with_config(a, config)?;
    let mut device = Engine::with_config(b, config.with_role(Role::Device))?;

    let (tx, rx) = mpsc::channel();
    device.register(GREETING, move |message| {
        let _ = tx.send(message);
    });
    host.register(Role::Host.inbound(Control::Pong), |message| {
        eprintln!("host: pong on context {}", message.context);
    });

    let text = "a greeting long enough to need several 24-byte fragments";
    host.submit(text.as_bytes().to_vec(), GREETING, 1)?;
    while host.pending() > 0 || device.state() != halflink::engine::State::Idle {
        host.tick()?;
        device.tick()?;
    }

    let message = rx.recv()?;
    eprintln!(
        "device: {} bytes on {} context {}: {}",
        message.payload.len(),
        message.packet_type,
        message.context,
        String::from_utf8_lossy(&message.payload)
    );

    host.ping()?;
    device.tick()?;
    host.tick()?;
    Ok(())
}

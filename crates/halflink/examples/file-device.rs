//! Device end of a file channel: prints every message and answers pings.
//!
//! Run with:
//!   cargo run --example file-device -- /tmp/to_device.bin /tmp/to_host.bin
//!
//! In another terminal:
//!   cargo run --features cli -- send /tmp/to_host.bin /tmp/to_device.bin \
//!     --type 99 --data hello

use std::fs::OpenOptions;
use std::thread;
use std::time::Duration;

use halflink::engine::{Engine, EngineConfig};
use halflink::frame::{Role, FIRST_DATA_TYPE};
use halflink::transport::FileChannel;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let inbound = args.next().unwrap_or_else(|| "/tmp/to_device.bin".into());
    let outbound = args.next().unwrap_or_else(|| "/tmp/to_host.bin".into());

    // Both sides need the other's file to exist before the first read.
    for path in [&inbound, &outbound] {
        OpenOptions::new().create(true).append(true).open(path)?;
    }

    let config = EngineConfig::default().with_role(Role::Device);
    let mut engine = Engine::with_config(FileChannel::new(&inbound, &outbound), config)?;
    for code in (FIRST_DATA_TYPE..=u8::MAX).filter(|c| c % 2 == 1) {
        engine.register(code, |message| {
            eprintln!(
                "{} context={} {:?}",
                message.packet_type,
                message.context,
                String::from_utf8_lossy(&message.payload)
            );
        });
    }
    eprintln!("device listening on {inbound}, writing to {outbound}");

    let mut seen = 0;
    loop {
        let len = engine.channel().inbound_len()?;
        if len != seen {
            seen = len;
            engine.tick()?;
        }
        thread::sleep(Duration::from_millis(20));
    }
}

use std::sync::mpsc;

use halflink_engine::Message;
use halflink_frame::PacketType;
use tracing::info;

use crate::cmd::{peer_data_types, EchoArgs, Session};
use crate::exit::{engine_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: EchoArgs, _format: OutputFormat) -> CliResult<i32> {
    let mut session = Session::open(&args.channel)?;
    let types = args
        .types
        .unwrap_or_else(|| peer_data_types(session.engine().role()));

    let (tx, rx) = mpsc::channel();
    for code in types {
        let tx = tx.clone();
        session.engine_mut().register(code, move |message| {
            let _ = tx.send(message);
        });
    }

    while session.is_running() {
        if session.poll()? {
            for message in rx.try_iter() {
                let reply = reply_type(&message);
                info!(
                    packet_type = message.packet_type.code(),
                    reply_type = reply.code(),
                    context = message.context,
                    size = message.payload.len(),
                    "echoing message"
                );
                session
                    .engine_mut()
                    .submit(message.payload, reply, message.context)
                    .map_err(|err| engine_error("echo submit failed", err))?;
            }
        }
        session.sleep();
    }

    Ok(SUCCESS)
}

/// Replies go out on the same type with this side's parity.
fn reply_type(message: &Message) -> PacketType {
    message.packet_type.counterpart()
}

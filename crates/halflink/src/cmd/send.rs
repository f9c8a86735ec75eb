use std::fs;
use std::time::Instant;

use bytes::Bytes;
use halflink_engine::State;
use halflink_frame::PacketType;
use tracing::info;

use crate::cmd::{timeout_error, Deadline, SendArgs, Session};
use crate::exit::{engine_error, io_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_sent, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let deadline = Deadline::parse(args.timeout.as_deref())?;
    let payload = resolve_payload(&args)?;
    let size = payload.len();
    let packet_type = PacketType::new(args.packet_type);

    let mut session = Session::open(&args.channel)?;
    session
        .engine_mut()
        .submit(payload, packet_type, args.context)
        .map_err(|err| engine_error("submit failed", err))?;
    info!(
        packet_type = packet_type.code(),
        context = args.context,
        size,
        "message queued"
    );

    let started = Instant::now();
    while session.is_running() {
        if deadline.expired() {
            return Err(timeout_error("the transfer to complete"));
        }

        session.poll()?;
        if is_complete(session.engine().pending(), session.engine().state()) {
            print_sent(packet_type, args.context, size, started.elapsed(), format);
            return Ok(SUCCESS);
        }
        session.sleep();
    }

    Err(CliError::new(FAILURE, "interrupted before the transfer completed"))
}

fn is_complete(pending: usize, state: State) -> bool {
    pending == 0 && state == State::Idle
}

fn resolve_payload(args: &SendArgs) -> CliResult<Bytes> {
    if let Some(data) = &args.data {
        return Ok(Bytes::copy_from_slice(data.as_bytes()));
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map(Bytes::from)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Bytes::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_only_when_idle_and_drained() {
        assert!(is_complete(0, State::Idle));
        assert!(!is_complete(1, State::Idle));
        assert!(!is_complete(0, State::Receiving));
    }
}

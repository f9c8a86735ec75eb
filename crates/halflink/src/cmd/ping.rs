use std::sync::mpsc;
use std::time::Instant;

use halflink_frame::Control;

use crate::cmd::{timeout_error, Deadline, PingArgs, Session};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_pong, OutputFormat};

pub fn run(args: PingArgs, format: OutputFormat) -> CliResult<i32> {
    let deadline = Deadline::parse(args.timeout.as_deref())?;
    let mut session = Session::open(&args.channel)?;

    let (tx, rx) = mpsc::channel();
    let pong = session.engine().role().inbound(Control::Pong);
    session.engine_mut().register(pong, move |message| {
        let _ = tx.send(message);
    });

    let mut received = 0usize;
    let mut sent_at = Instant::now();
    session.ping()?;

    while session.is_running() {
        if deadline.expired() {
            if received > 0 && args.count.is_none() {
                return Ok(SUCCESS);
            }
            return Err(timeout_error("pong"));
        }

        if session.poll()? {
            let mut answered = false;
            for message in rx.try_iter() {
                received += 1;
                answered = true;
                print_pong(received, message.context, sent_at.elapsed(), format);
                if args.count.is_some_and(|count| received >= count) {
                    return Ok(SUCCESS);
                }
            }
            if answered {
                session.sleep();
                sent_at = Instant::now();
                session.ping()?;
                continue;
            }
        }
        session.sleep();
    }

    Ok(SUCCESS)
}

use std::sync::mpsc;

use crate::cmd::{peer_data_types, ListenArgs, Session};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
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

    let mut printed = 0usize;
    while session.is_running() {
        if session.poll()? {
            for message in rx.try_iter() {
                print_message(&message, format);
                printed = printed.saturating_add(1);

                if args.count.is_some_and(|count| printed >= count) {
                    return Ok(SUCCESS);
                }
            }
        }
        session.sleep();
    }

    Ok(SUCCESS)
}

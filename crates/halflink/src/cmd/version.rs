use halflink_frame::{DEFAULT_PACKET_SIZE, HEADER_SIZE, MAX_PACKET_SIZE, MIN_PACKET_SIZE};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("halflink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: halflink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("HALFLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("header_size: {HEADER_SIZE}");
    println!("packet_size: default={DEFAULT_PACKET_SIZE} min={MIN_PACKET_SIZE} max={MAX_PACKET_SIZE}");

    Ok(SUCCESS)
}

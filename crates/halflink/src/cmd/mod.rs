use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Subcommand, ValueEnum};
use halflink_engine::{Engine, EngineConfig};
use halflink_frame::{Role, DEFAULT_PACKET_SIZE, FIRST_DATA_TYPE};
use halflink_transport::FileChannel;
use tracing::debug;

use crate::exit::{engine_error, transport_error, CliError, CliResult, INTERNAL, TIMEOUT, USAGE};
use crate::output::OutputFormat;

pub mod echo;
pub mod listen;
pub mod ping;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ping the peer and print each PONG.
    Ping(PingArgs),
    /// Send one message and wait until the transfer completes.
    Send(SendArgs),
    /// Print received messages.
    Listen(ListenArgs),
    /// Send every received message back on the peer's counterpart type.
    Echo(EchoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ping(args) => ping::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Echo(args) => echo::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Host,
    Device,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Host => Role::Host,
            RoleArg::Device => Role::Device,
        }
    }
}

#[derive(Args, Debug)]
pub struct ChannelArgs {
    /// File the peer appends to.
    pub inbound: PathBuf,
    /// File this side appends to.
    pub outbound: PathBuf,
    /// Fixed frame size in bytes (9-255).
    #[arg(long, default_value_t = DEFAULT_PACKET_SIZE)]
    pub packet_size: usize,
    /// Which end of the link to play.
    #[arg(long, value_enum, default_value = "host")]
    pub role: RoleArg,
    /// How often to check the inbound file for a new frame (e.g. 50ms, 1s).
    #[arg(long, default_value = "50ms")]
    pub interval: String,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    #[command(flatten)]
    pub channel: ChannelArgs,
    /// Exit after receiving N pongs.
    #[arg(long)]
    pub count: Option<usize>,
    /// Give up after this long (e.g. 5s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub channel: ChannelArgs,
    /// Message type code.
    #[arg(long = "type", short = 't', default_value_t = 99)]
    pub packet_type: u8,
    /// Context byte identifying the message.
    #[arg(long, short = 'c', default_value_t = 0)]
    pub context: u8,
    /// Raw string payload.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Give up if the transfer has not completed after this long (e.g. 5s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub channel: ChannelArgs,
    /// Message types to print (comma-separated). Default: every data type the peer sends.
    #[arg(long, value_delimiter = ',')]
    pub types: Option<Vec<u8>>,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    #[command(flatten)]
    pub channel: ChannelArgs,
    /// Message types to echo (comma-separated). Default: every data type the peer sends.
    #[arg(long, value_delimiter = ',')]
    pub types: Option<Vec<u8>>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Types to register when the user gave none: every data type the peer can send.
pub fn peer_data_types(role: Role) -> Vec<u8> {
    (FIRST_DATA_TYPE..=u8::MAX)
        .filter(|code| role.accepts((*code).into()))
        .collect()
}

/// Engine over a file pair, ticked in lockstep with the peer.
///
/// Every frame the engine reads must be one the peer wrote since the last
/// tick, otherwise a stale ACK would be acted on twice. `poll` therefore only
/// ticks when the inbound file has changed size. The host opens the exchange
/// with one unconditional tick.
pub struct Session {
    engine: Engine<FileChannel>,
    interval: Duration,
    seen: Option<u64>,
    running: Arc<AtomicBool>,
}

impl Session {
    pub fn open(args: &ChannelArgs) -> CliResult<Self> {
        let interval = parse_duration(&args.interval)?;
        let config = EngineConfig::default()
            .with_packet_size(args.packet_size)
            .with_role(args.role.into());
        let channel = FileChannel::new(&args.inbound, &args.outbound);
        let engine = Engine::with_config(channel, config)
            .map_err(|err| engine_error("invalid configuration", err))?;

        let running = Arc::new(AtomicBool::new(true));
        install_ctrlc_handler(running.clone())?;

        Ok(Self {
            engine,
            interval,
            seen: None,
            running,
        })
    }

    pub fn engine(&self) -> &Engine<FileChannel> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<FileChannel> {
        &mut self.engine
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Tick if the peer has written since the last tick. Returns whether a
    /// tick happened.
    pub fn poll(&mut self) -> CliResult<bool> {
        let len = self.inbound_len()?;
        let fresh = match self.seen {
            Some(prev) => len != prev,
            None => self.engine.role() == Role::Host || len > 0,
        };
        self.seen = Some(len);
        if !fresh {
            return Ok(false);
        }

        self.engine
            .tick()
            .map_err(|err| engine_error("tick failed", err))?;
        debug!(
            inbound = len,
            state = %self.engine.state(),
            pending = self.engine.pending(),
            "tick"
        );
        Ok(true)
    }

    /// Send a PING outside the tick cadence.
    pub fn ping(&mut self) -> CliResult<()> {
        if self.seen.is_none() {
            self.seen = Some(self.inbound_len()?);
        }
        self.engine
            .ping()
            .map_err(|err| engine_error("ping failed", err))
    }

    pub fn sleep(&self) {
        std::thread::sleep(self.interval);
    }

    fn inbound_len(&self) -> CliResult<u64> {
        self.engine
            .channel()
            .inbound_len()
            .map_err(|err| transport_error("read failed", err))
    }
}

/// Deadline helper shared by the commands that take `--timeout`.
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn parse(timeout: Option<&str>) -> CliResult<Self> {
        let timeout = timeout.map(parse_duration).transpose()?;
        Ok(Self(timeout.map(|t| Instant::now() + t)))
    }

    pub fn expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

pub fn timeout_error(what: &str) -> CliError {
    CliError::new(TIMEOUT, format!("timed out waiting for {what}"))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

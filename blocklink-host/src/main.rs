//! `blocklink` binary: exchange broadcasts with a board over serial.
//!
//! Subcommands: `send`, `listen`, `demo`, `ping`, `version`, `ports`.

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use blocklink_hal::Connector;
use blocklink_host::serial::{available_ports, describe_port};
use blocklink_host::{Bridge, BridgeConfig, BridgeError, SerialConnector, SerialTransport};
use blocklink_protocol::{DeviceMessage, HostCommand};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

/// Broadcasts sent by `demo`, one second apart
const DEMO_BROADCASTS: [&str; 3] = ["sad", "happy", "clear"];

/// How long `ping`/`version` wait for a reply
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "blocklink")]
#[command(about = "Exchange broadcasts with a blocks-interpreter board over serial")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Serial device (overrides `port` in the config file)
    #[arg(short, long, env = "BLOCKLINK_PORT", global = true)]
    port: Option<String>,

    /// Baud rate (overrides `baudrate` in the config file)
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// TOML config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose: log every frame sent
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one broadcast per argument
    Send {
        #[arg(required = true)]
        messages: Vec<String>,
    },
    /// Print received broadcasts until interrupted
    Listen,
    /// Send "sad", "happy", "clear", then listen
    Demo,
    /// Ping the board and wait for the reply
    Ping,
    /// Ask the board for its firmware version
    Version,
    /// List serial ports
    Ports,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), BridgeError> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = Some(port);
    }
    if let Some(baud) = args.baud {
        config.baudrate = baud;
    }

    if let Command::Ports = args.cmd {
        return list_ports();
    }

    let port = config.port.clone().ok_or(BridgeError::NoPort)?;
    let mut connector = SerialConnector::new();
    let transport = connector
        .open(&port, &config.serial())
        .map_err(|source| BridgeError::Open {
            port: port.clone(),
            source,
        })?;
    let mut bridge = Bridge::with_read_chunk(transport, config.read_chunk);

    let result = match args.cmd {
        Command::Send { messages } => send_all(&mut bridge, &messages),
        Command::Listen => listen(&mut bridge, &config),
        Command::Demo => demo(&mut bridge, &config),
        Command::Ping => ping(&mut bridge, &config),
        Command::Version => version(&mut bridge, &config),
        Command::Ports => unreachable!("handled before opening the port"),
    };

    if let Err(e) = connector.close(bridge.into_inner()) {
        warn!(error = %e, "failed to close {port}");
    }
    result
}

fn list_ports() -> Result<(), BridgeError> {
    let ports = available_ports().map_err(BridgeError::transport)?;
    if ports.is_empty() {
        info!("no serial ports found");
    }
    for port in &ports {
        println!("{}", describe_port(port));
    }
    Ok(())
}

fn send_all(bridge: &mut Bridge<SerialTransport>, messages: &[String]) -> Result<(), BridgeError> {
    for msg in messages {
        bridge.send_broadcast(msg)?;
        info!(text = %msg, "broadcast sent");
    }
    Ok(())
}

fn listen(bridge: &mut Bridge<SerialTransport>, config: &BridgeConfig) -> Result<(), BridgeError> {
    info!(
        port = bridge.transport().name(),
        "listening for broadcasts (Ctrl+C to stop)"
    );
    loop {
        for msg in bridge.receive_broadcasts()? {
            // Decode failures are already logged by the bridge
            if let Ok(text) = msg {
                println!("{text}");
            }
        }
        thread::sleep(config.poll_interval());
    }
}

fn demo(bridge: &mut Bridge<SerialTransport>, config: &BridgeConfig) -> Result<(), BridgeError> {
    for (i, msg) in DEMO_BROADCASTS.iter().enumerate() {
        if i > 0 {
            thread::sleep(Duration::from_secs(1));
        }
        bridge.send_broadcast(msg)?;
        info!(text = %msg, "broadcast sent");
    }
    listen(bridge, config)
}

/// Poll until `pick` accepts a message or the reply timeout expires
fn await_reply<R>(
    bridge: &mut Bridge<SerialTransport>,
    config: &BridgeConfig,
    mut pick: impl FnMut(DeviceMessage) -> Option<R>,
) -> Result<Option<R>, BridgeError> {
    let deadline = Instant::now() + REPLY_TIMEOUT;
    while Instant::now() < deadline {
        for msg in bridge.receive_messages()?.into_iter().flatten() {
            if let Some(reply) = pick(msg) {
                return Ok(Some(reply));
            }
        }
        thread::sleep(config.poll_interval());
    }
    Ok(None)
}

fn ping(bridge: &mut Bridge<SerialTransport>, config: &BridgeConfig) -> Result<(), BridgeError> {
    let sent = Instant::now();
    bridge.send(&HostCommand::Ping)?;
    let reply = await_reply(bridge, config, |msg| match msg {
        DeviceMessage::Ping { .. } => Some(()),
        _ => None,
    })?;
    match reply {
        Some(()) => println!("pong in {} ms", sent.elapsed().as_millis()),
        None => warn!("no ping reply within {:?}", REPLY_TIMEOUT),
    }
    Ok(())
}

fn version(bridge: &mut Bridge<SerialTransport>, config: &BridgeConfig) -> Result<(), BridgeError> {
    bridge.send(&HostCommand::GetVersion)?;
    let reply = await_reply(bridge, config, |msg| match msg {
        DeviceMessage::Version(v) => Some(v),
        _ => None,
    })?;
    match reply {
        Some(v) => println!("{v}"),
        None => warn!("no version reply within {:?}", REPLY_TIMEOUT),
    }
    Ok(())
}

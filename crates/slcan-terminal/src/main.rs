//! slcan-terminal - interactive terminal for SLCAN serial adapters

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use slcan_terminal_core::config::{parse_init_commands, TerminalConfig};
use slcan_terminal_core::link::find_slcan_device;
use slcan_terminal_core::session::{Console, Session};
use slcan_terminal_core::terminal::RawStdin;

const AFTER_HELP: &str = "\
If no tty_device is specified, the first device in /dev/serial/by-id
containing 'slcan' in its name is used.

Examples:
  slcan-terminal                          (auto-detect SLCAN device)
  slcan-terminal /dev/ttyUSB0             (specify device)
  slcan-terminal -i \"C,S6,O\"              (auto-detect + init commands)
  slcan-terminal --init \"C,V,S6,ON\" /dev/ttyS1
  slcan-terminal -i 'C,s\"1,119,40,40\",ON' (custom bitrate with quoted commas)

Common SLCAN commands:
  V       - Get version and serial number
  S0-S8   - Set CAN speed (0=10k, 4=125k, 6=500k, 8=1000k)
  O       - Open channel (normal mode)
  ON      - Open channel (normal mode, SLCAN 2.5)
  OS      - Open channel (silent mode)
  L       - Open channel (listen-only mode)
  C       - Close channel
  F       - Read status flags

Sending CAN frames (simplified syntax with #):
  <type><can_id>#<data>  - Auto-calculates DLC, supports dots
  Packet types: t/T (classic), r/R (RTR), d/D (FD), b/B (FD+BRS)
    t123#DEADBEEF       -> t12304DEADBEEF
    t7E0#11.22.33.44    -> t7E00411223344
    T18AABBCC#112233    -> T18AABBCC03112233
    r123#               -> r1230 (RTR with DLC=0)

Raw SLCAN format:
  tiiildd          - Transmit standard CAN frame
  Tiiiiiiiildd     - Transmit extended CAN frame
  riiil            - Transmit standard RTR frame
  Riiiiiiiil       - Transmit extended RTR frame";

#[derive(Parser)]
#[command(name = "slcan-terminal")]
#[command(version, about = "Interactive terminal for SLCAN serial communication")]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// Serial device of the adapter
    tty_device: Option<String>,

    /// Initialization commands (comma-separated, double quotes protect commas)
    #[arg(short, long, value_name = "CMDS")]
    init: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "SLCAN_TERMINAL_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = match &cli.config {
        Some(path) => TerminalConfig::load_from(path)?,
        None => TerminalConfig::load().unwrap_or_else(|e| {
            warn!("{e}; using defaults");
            TerminalConfig::default()
        }),
    };

    let init_commands = cli.init.as_deref().map(|list| {
        println!("command string: {list}");
        parse_init_commands(list)
    });
    let config = config.merge_with_args(cli.tty_device.as_deref(), init_commands);

    let device = match config.device.clone() {
        Some(device) => device,
        None => {
            println!("No TTY device specified, searching for SLCAN device...");
            match find_slcan_device() {
                Some(device) => {
                    println!("Found SLCAN device: {device}");
                    device
                }
                None => bail!(
                    "No SLCAN device found in /dev/serial/by-id; please specify a TTY device manually"
                ),
            }
        }
    };

    let init = config.init_commands.clone();
    let mut session = Session::new(config, Console::stdout());
    session
        .open(&device)
        .with_context(|| format!("Failed to open device: {device}"))?;
    info!(device = %device, "Device opened");

    // SIGINT, SIGTERM and SIGHUP all end the session through the normal path
    let running = session.running_flag();
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("Failed to install termination handler")?;

    session.run_init_commands(&init)?;

    let input = RawStdin::enable().context("Failed to configure standard input")?;
    session.run_interactive(input)?;
    debug!("Session finished");

    Ok(())
}

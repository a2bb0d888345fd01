use anyhow::{Result, anyhow};
use clap::Parser;
use std::num::NonZeroUsize;
use std::process::ExitCode;
use tracing::debug;

use ring_exchange::{Console, ExchangeMode, REQUIRED_GROUP_SIZE, RingConfig, launch};

const DEFAULT_NP: NonZeroUsize = match NonZeroUsize::new(REQUIRED_GROUP_SIZE) {
    Some(np) => np,
    None => NonZeroUsize::MIN,
};

#[derive(Parser, Debug)]
#[command(name = "ring-exchange")]
#[command(about = "Participants in a ring swap one number with their neighbors and check local ordering")]
#[command(version)]
struct Args {
    /// Number of participants to launch
    #[arg(short = 'n', long, default_value_t = DEFAULT_NP)]
    np: NonZeroUsize,

    /// How values move around the ring
    #[arg(short, long, value_enum, default_value_t = ExchangeMode::Paired)]
    mode: ExchangeMode,

    /// Pin each participant to a CPU core (default: false)
    #[arg(long, default_value = "false")]
    pin: bool,

    /// Verbose logging (default: false)
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// One integer per participant, in rank order
    #[arg(allow_negative_numbers = true)]
    numbers: Vec<String>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Diagnostics go to stderr; stdout carries the participants' lines
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    let program = std::env::args()
        .next()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

    let config = RingConfig {
        mode: args.mode,
        pin_cores: args.pin,
        program,
        ..RingConfig::default()
    };
    debug!("{:?}", config);

    let console = Console::stdout();
    let outcome = launch(args.np.get(), &args.numbers, &config, &console);

    Ok(ExitCode::from(outcome.exit_code()))
}

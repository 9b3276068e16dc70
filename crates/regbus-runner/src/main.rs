//! `regbus` command-line tool.

use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use regbus_engine::{telemetry, LinuxI2cBus, Poller, ShutdownSignal, TransactionEngine};
use regbus_runner::config::parse_address;
use regbus_runner::console::{self, SessionEnd};
use regbus_runner::monitor;
use regbus_runner::session::{DacSession, LineHandler, McuSession, RawRequest};
use regbus_runner::{ConfigOverrides, RunnerConfig, RunnerError, RunnerResult};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "regbus", version, about = "Talk to the STM32 and DAC over I2C")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// I2C bus device node [default: /dev/i2c-1]
    #[arg(short, long, global = true)]
    device: Option<PathBuf>,

    /// STM32 bus address (decimal or 0x hex)
    #[arg(long, global = true, value_parser = parse_address)]
    mcu_address: Option<u16>,

    /// DAC bus address (decimal or 0x hex)
    #[arg(long, global = true, value_parser = parse_address)]
    dac_address: Option<u16>,

    /// Delay between request and response in milliseconds
    #[arg(long, global = true)]
    settle_ms: Option<u64>,

    /// Monitor refresh period in milliseconds
    #[arg(long, global = true)]
    refresh_ms: Option<u64>,

    /// Enable debug logging (frames sent and received)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive STM32 command session
    Mcu,
    /// Interactive DAC register session
    Dac,
    /// Live table of every readable STM32 register
    Monitor,
    /// Send one raw STM32 request and print the reported value
    Send {
        /// 1 = read, 0 = write
        direction: String,
        /// Peripheral type code (0 to 127)
        peripheral_type: String,
        /// Register index (0 to 255)
        index: String,
        /// 16-bit value
        value: String,
    },
}

impl Command {
    /// Whether the command loops and so takes over Ctrl+C. Anything else
    /// keeps the default handler, which ends the process at once.
    fn traps_interrupts(&self) -> bool {
        !matches!(self, Command::Send { .. })
    }
}

impl GlobalArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            device: self.device.clone(),
            mcu_address: self.mcu_address,
            dac_address: self.dac_address,
            settle_ms: self.settle_ms,
            refresh_ms: self.refresh_ms,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "regbus failed");
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> RunnerResult<()> {
    let config = RunnerConfig::resolve(cli.global.config.as_deref(), &cli.global.overrides())?;
    info!(?config, "configuration resolved");
    telemetry::describe_metrics();

    let shutdown = ShutdownSignal::new();
    let interrupts = if cli.command.traps_interrupts() {
        Some(console::install_interrupt_handler(shutdown.clone())?)
    } else {
        None
    };

    let mut bus = LinuxI2cBus::open(&config.device)?;
    let mut engine = TransactionEngine::new(&mut bus, config.engine_config());
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match (cli.command, interrupts) {
        (Command::Mcu, Some(interrupts)) => {
            let lines = console::spawn_line_reader(BufReader::new(io::stdin()))?;
            let mut session = McuSession::new(&mut engine);
            finish_session(&mut session, &lines, &interrupts, &mut out)
        }
        (Command::Dac, Some(interrupts)) => {
            let lines = console::spawn_line_reader(BufReader::new(io::stdin()))?;
            let mut session = DacSession::new(&mut engine);
            finish_session(&mut session, &lines, &interrupts, &mut out)
        }
        (Command::Monitor, _) => {
            let poller = Poller::new(config.refresh_period());
            let sweeps = monitor::run_monitor(&poller, &mut engine, &shutdown, &mut out)?;
            info!(sweeps, "monitor stopped");
            Ok(())
        }
        (
            Command::Send {
                direction,
                peripheral_type,
                index,
                value,
            },
            _,
        ) => {
            let request = RawRequest {
                direction,
                peripheral_type,
                index,
                value,
            };
            request.send(&mut engine, &mut out).map(|_| ())
        }
        (Command::Mcu | Command::Dac, None) => Err(RunnerError::Config(
            "interactive session started without a Ctrl+C handler".to_string(),
        )),
    }
}

fn finish_session(
    session: &mut dyn LineHandler,
    lines: &crossbeam_channel::Receiver<String>,
    interrupts: &crossbeam_channel::Receiver<()>,
    out: &mut dyn io::Write,
) -> RunnerResult<()> {
    let end = console::run_session(session, lines, interrupts, out)?;
    if end == SessionEnd::InputClosed {
        info!("standard input closed");
    }
    Ok(())
}

//! Signal Sampler - cellular modem signal quality logger
//!
//! A standalone binary that samples RSRP/RSRQ/SINR from a Quectel modem into a CSV file.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use signal_sampler::{
    open_validated, run_sampling, snapshot_once, CsvRecorder, MetricReadings, ModemConfig,
    ModemError, PortArbiter, SamplerConfig, SignalCollector, DEFAULT_AT_PORT, DEFAULT_BAUD,
    DEFAULT_EXPERIMENT_ID, DEFAULT_INTERVAL_MS, DEFAULT_SAMPLES, DEFAULT_TIMEOUT_MS,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "signal_sampler")]
#[command(about = "📶 Signal Sampler - Cellular Modem Signal Quality Logger")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Samples RSRP, RSRQ and SINR from a Quectel modem over AT commands")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// AT command port
    #[arg(long, default_value = DEFAULT_AT_PORT)]
    device: String,

    /// Serial baud rate
    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// Serial read timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Attempts to open and validate the port
    #[arg(long, default_value_t = 5)]
    retries: u32,

    /// Do not stop ModemManager before opening the port
    #[arg(long)]
    no_release: bool,

    /// Run fuser/systemctl without sudo
    #[arg(long)]
    no_sudo: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect samples into a CSV file (default)
    Collect(CollectArgs),

    /// Read all metrics once and exit
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
struct CollectArgs {
    /// Experiment identifier written into every row
    #[arg(short, long, default_value = DEFAULT_EXPERIMENT_ID)]
    experiment_id: String,

    /// Number of samples to take
    #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLES)]
    samples: u32,

    /// Pause between samples in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_INTERVAL_MS)]
    interval_ms: u64,

    /// Output CSV path (default: signal_metrics_<EXP_ID>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Default for CollectArgs {
    fn default() -> Self {
        Self {
            experiment_id: DEFAULT_EXPERIMENT_ID.to_string(),
            samples: DEFAULT_SAMPLES,
            interval_ms: DEFAULT_INTERVAL_MS,
            output: None,
        }
    }
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let modem = modem_config(&cli);
    modem.validate()?;

    match &cli.command {
        Some(Commands::Collect(args)) => collect_command(&modem, args),
        Some(Commands::Snapshot(args)) => snapshot_command(&modem, args),
        None => collect_command(&modem, &CollectArgs::default()),
    }
}

/// Level used when `RUST_LOG` is unset.
fn log_level(cli: &Cli) -> Level {
    if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    }
}

fn log_filter(cli: &Cli) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(log_level(cli)).into())
        .from_env_lossy()
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(cli))
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn modem_config(cli: &Cli) -> ModemConfig {
    let defaults = ModemConfig::default();
    ModemConfig::new(&cli.device, cli.baud)
        .with_timeout(Duration::from_millis(cli.timeout_ms))
        .with_retries(cli.retries, defaults.retry_delay)
        .with_release(!cli.no_release)
        .with_sudo(!cli.no_sudo)
}

fn sampler_config(args: &CollectArgs) -> SamplerConfig {
    let config = SamplerConfig::new(&args.experiment_id)
        .with_samples(args.samples)
        .with_interval(Duration::from_millis(args.interval_ms));
    match &args.output {
        Some(path) => config.with_output(path),
        None => config,
    }
}

fn collect_command(modem: &ModemConfig, args: &CollectArgs) -> anyhow::Result<()> {
    let sampler = sampler_config(args);
    sampler.validate()?;

    let arbiter = PortArbiter::new(modem);
    if modem.release_owner {
        if let Err(e) = arbiter.release_conflicting_owner(&modem.device) {
            warn!("{}", e);
        }
    }
    if let Err(e @ ModemError::PortBusy { .. }) = arbiter.check_port(&modem.device) {
        warn!("{}. Close minicom or other tools if open.", e);
    }

    let mut recorder = CsvRecorder::create(&sampler.output, &sampler.experiment_id)
        .with_context(|| format!("failed to create {}", sampler.output.display()))?;

    println!(
        "Collecting {} signal samples... (saving to {})",
        sampler.samples,
        sampler.output.display()
    );

    let port = open_validated(modem).map_err(|e| {
        error!("{}", e);
        e
    })?;
    let mut collector = SignalCollector::new(port, modem.command_settle);

    info!("Sampling every {:?}", sampler.interval);
    let summary = run_sampling(&mut collector, &mut recorder, &sampler)?;

    println!(
        "Data collection complete. {} samples ({} complete, {} degraded) saved to {}",
        summary.samples,
        summary.complete,
        summary.degraded,
        sampler.output.display()
    );

    Ok(())
}

fn snapshot_command(modem: &ModemConfig, args: &SnapshotArgs) -> anyhow::Result<()> {
    let readings = snapshot_once(modem).context("failed to read signal metrics")?;

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&readings)?;
            println!("{}", json);
        }
        "pretty" => print_pretty_readings(&readings),
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

fn print_pretty_readings(readings: &MetricReadings) {
    println!(
        "📶 Signal Snapshot ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("==========================================");
    println!("  RSRP: {}", with_unit(readings.rsrp, "dBm"));
    println!("  RSRQ: {}", with_unit(readings.rsrq, "dB"));
    println!("  SINR: {}", with_unit(readings.sinr, "dB"));
}

fn with_unit(value: Option<i32>, unit: &str) -> String {
    match value {
        Some(v) => format!("{} {}", v, unit),
        None => "n/a".to_string(),
    }
}

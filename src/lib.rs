//! # Signal Sampler - Cellular Modem Signal Quality on Raspberry Pi
//!
//! Polls a Quectel 5G HAT over its AT command port for RSRP, RSRQ and SINR
//! and records each reading to a CSV file.
//!
//! ## Features
//!
//! - **Port arbitration**: stops ModemManager and reports other holders of the AT port
//! - **Validated open**: retries until the port answers `AT` with `OK`
//! - **Tolerant parsing**: a missing or garbled reply yields an absent value, never a zero
//! - **Degrade and continue**: a serial fault costs one sample, not the run
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use signal_sampler::{
//!     open_validated, run_sampling, CsvRecorder, ModemConfig, SamplerConfig, SignalCollector,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let modem = ModemConfig::default();
//!     let sampler = SamplerConfig::new("EXP_001").with_samples(10);
//!
//!     let mut recorder = CsvRecorder::create(&sampler.output, &sampler.experiment_id)?;
//!     let port = open_validated(&modem)?;
//!     let mut collector = SignalCollector::new(port, modem.command_settle);
//!
//!     let summary = run_sampling(&mut collector, &mut recorder, &sampler)?;
//!     println!("{} samples written", summary.samples);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod modem;
pub mod recorder;

// Re-export public API
pub use config::{ModemConfig, SamplerConfig};
pub use error::{ModemError, Result};
pub use modem::{
    arbiter::{CommandRunner, PortArbiter, SystemRunner},
    collector::{snapshot_once, SignalCollector},
    data::{MetricReadings, Sample},
    parser::{parse_primary, Metric},
    port::{open_validated, SerialCommandPort},
    traits::{CommandPort, SignalSource},
};
pub use recorder::{run_sampling, CsvRecorder, SamplingSummary};

/// The default AT command port of the Quectel HAT
pub const DEFAULT_AT_PORT: &str = "/dev/ttyUSB2";

/// The default serial baud rate
pub const DEFAULT_BAUD: u32 = 115_200;

/// The default serial read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// The default experiment identifier
pub const DEFAULT_EXPERIMENT_ID: &str = "EXP_001";

/// The default number of samples per run
pub const DEFAULT_SAMPLES: u32 = 10;

/// The default pause between samples in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 500;

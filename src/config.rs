//! Modem and sampler configuration.

use crate::error::{ModemError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for reaching the modem's AT command port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemConfig {
    /// Serial device path of the AT port
    pub device: String,
    /// Baud rate
    pub baud: u32,
    /// Read timeout applied to the serial handle
    pub timeout: Duration,
    /// Number of open-and-handshake attempts before giving up
    pub open_retries: u32,
    /// Delay between failed open attempts
    pub retry_delay: Duration,
    /// Wait between writing the handshake and reading its reply
    pub handshake_settle: Duration,
    /// Maximum bytes read back for the handshake reply
    pub handshake_read_limit: usize,
    /// Wait between writing a query and collecting its reply lines
    pub command_settle: Duration,
    /// Service known to grab the port (e.g. ModemManager)
    pub conflicting_service: String,
    /// Wait after stopping the service so the kernel releases the device
    pub release_settle: Duration,
    /// Stop the conflicting service before opening the port
    pub release_owner: bool,
    /// Prefix privileged commands with sudo
    pub use_sudo: bool,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            device: crate::DEFAULT_AT_PORT.to_string(),
            baud: crate::DEFAULT_BAUD,
            timeout: Duration::from_millis(crate::DEFAULT_TIMEOUT_MS),
            open_retries: 5,
            retry_delay: Duration::from_millis(400),
            handshake_settle: Duration::from_millis(150),
            handshake_read_limit: 128,
            command_settle: Duration::from_millis(250),
            conflicting_service: "ModemManager.service".to_string(),
            release_settle: Duration::from_millis(300),
            release_owner: true,
            use_sudo: true,
        }
    }
}

impl ModemConfig {
    /// Create a configuration for a specific device and baud rate.
    pub fn new(device: impl Into<String>, baud: u32) -> Self {
        Self {
            device: device.into(),
            baud,
            ..Default::default()
        }
    }

    /// Set the serial device path.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Set the baud rate.
    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    /// Set the serial read timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the open retry budget and the delay between attempts.
    pub fn with_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.open_retries = retries;
        self.retry_delay = delay;
        self
    }

    /// Set the handshake and command settle delays.
    pub fn with_settle(mut self, handshake: Duration, command: Duration) -> Self {
        self.handshake_settle = handshake;
        self.command_settle = command;
        self
    }

    /// Set the conflicting service and how long to wait after stopping it.
    pub fn with_conflicting_service(mut self, service: impl Into<String>, settle: Duration) -> Self {
        self.conflicting_service = service.into();
        self.release_settle = settle;
        self
    }

    /// Enable or disable stopping the conflicting service before opening.
    pub fn with_release(mut self, release_owner: bool) -> Self {
        self.release_owner = release_owner;
        self
    }

    /// Enable or disable sudo for privileged commands.
    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    /// Reject configurations that can never produce a working port.
    pub fn validate(&self) -> Result<()> {
        if self.device.trim().is_empty() {
            return Err(ModemError::config_error("device path is empty"));
        }
        if self.baud == 0 {
            return Err(ModemError::config_error("baud rate must be non-zero"));
        }
        if self.open_retries == 0 {
            return Err(ModemError::config_error("open retries must be at least 1"));
        }
        if self.handshake_read_limit == 0 {
            return Err(ModemError::config_error("handshake read limit must be non-zero"));
        }
        Ok(())
    }
}

/// Configuration for the bounded sampling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Experiment identifier written into every row
    pub experiment_id: String,
    /// Number of samples to take
    pub samples: u32,
    /// Pause between samples
    pub interval: Duration,
    /// CSV output path
    pub output: PathBuf,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::new(crate::DEFAULT_EXPERIMENT_ID)
    }
}

impl SamplerConfig {
    /// Create a sampler configuration for an experiment, deriving the output file name.
    pub fn new(experiment_id: impl Into<String>) -> Self {
        let experiment_id = experiment_id.into();
        Self {
            output: default_output_path(&experiment_id),
            experiment_id,
            samples: crate::DEFAULT_SAMPLES,
            interval: Duration::from_millis(crate::DEFAULT_INTERVAL_MS),
        }
    }

    /// Set the number of samples.
    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    /// Set the interval between samples.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the CSV output path.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Reject configurations that would write unattributed rows.
    pub fn validate(&self) -> Result<()> {
        if self.experiment_id.trim().is_empty() {
            return Err(ModemError::config_error("experiment id is empty"));
        }
        Ok(())
    }
}

/// Default CSV file name for an experiment.
pub fn default_output_path(experiment_id: &str) -> PathBuf {
    PathBuf::from(format!("signal_metrics_{}.csv", experiment_id))
}

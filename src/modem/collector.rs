//! Signal-quality collection over an open AT port.

use crate::config::ModemConfig;
use crate::error::Result;
use crate::modem::{
    arbiter::{CommandRunner, PortArbiter},
    data::{MetricReadings, Sample},
    exchange::exchange,
    parser::Metric,
    port::{open_validated_with, SerialCommandPort},
    traits::{CommandPort, SignalSource},
};
use std::time::Duration;
use tracing::{debug, warn};

/// Queries RSRP, RSRQ and SINR from a modem, one exchange per metric.
///
/// Owns the port for its lifetime; dropping the collector closes it.
pub struct SignalCollector<P: CommandPort> {
    port: P,
    command_settle: Duration,
}

impl<P: CommandPort> SignalCollector<P> {
    /// Create a collector over an already validated port.
    pub fn new(port: P, command_settle: Duration) -> Self {
        Self {
            port,
            command_settle,
        }
    }

    /// Query a single metric.
    pub fn read_metric(&mut self, metric: Metric) -> Result<Option<i32>> {
        let lines = exchange(&mut self.port, metric.command(), self.command_settle)?;
        let value = metric.parse(&lines);
        if value.is_none() {
            debug!("{} missing from response {:?}", metric, lines);
        }
        Ok(value)
    }

    /// Give the port back to the caller.
    pub fn into_inner(self) -> P {
        self.port
    }
}

impl<P: CommandPort> SignalSource for SignalCollector<P> {
    fn read_metrics(&mut self) -> Result<MetricReadings> {
        let rsrp = self.read_metric(Metric::Rsrp)?;
        let rsrq = self.read_metric(Metric::Rsrq)?;
        let sinr = self.read_metric(Metric::Sinr)?;
        Ok(MetricReadings { rsrp, rsrq, sinr })
    }

    fn collect_sample(&mut self, sequence: u32) -> Sample {
        match self.read_metrics() {
            Ok(readings) => Sample::new(sequence, readings),
            Err(err) => {
                warn!("Sample {}: {}; recording absent values", sequence, err);
                Sample::degraded(sequence)
            }
        }
    }
}

/// Free the port, open it, read every metric once, and close it again.
///
/// The conflicting service is only stopped when `config.release_owner` is set.
pub fn snapshot_once(config: &ModemConfig) -> Result<MetricReadings> {
    let arbiter = PortArbiter::new(config);
    snapshot_with(config, &arbiter, || SerialCommandPort::open(config))
}

/// One-shot read using the given arbiter and port factory.
pub fn snapshot_with<R, P, F>(config: &ModemConfig, arbiter: &PortArbiter<R>, open: F) -> Result<MetricReadings>
where
    R: CommandRunner,
    P: CommandPort,
    F: FnMut() -> Result<P>,
{
    config.validate()?;

    if config.release_owner {
        if let Err(err) = arbiter.release_conflicting_owner(&config.device) {
            warn!("{}", err);
        }
    } else {
        debug!("Leaving {} running", config.conflicting_service);
    }

    let port = open_validated_with(config, open)?;
    let mut collector = SignalCollector::new(port, config.command_settle);
    collector.read_metrics()
}

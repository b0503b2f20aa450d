//! Data structures for signal-quality samples.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Primary-branch values of the three signal metrics.
///
/// `None` means the metric could not be read. It is never conflated with a
/// genuine zero reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricReadings {
    /// Reference Signal Received Power (dBm)
    pub rsrp: Option<i32>,
    /// Reference Signal Received Quality (dB)
    pub rsrq: Option<i32>,
    /// Signal-to-Interference-plus-Noise Ratio (dB)
    pub sinr: Option<i32>,
}

impl MetricReadings {
    /// Readings with every metric absent.
    pub fn absent() -> Self {
        Self::default()
    }

    /// Number of metrics that carry a value.
    pub fn present_count(&self) -> usize {
        [self.rsrp, self.rsrq, self.sinr]
            .iter()
            .filter(|v| v.is_some())
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.present_count() == 3
    }

    pub fn is_empty(&self) -> bool {
        self.present_count() == 0
    }
}

/// One reading taken during a sampling tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// 1-based tick number
    pub sequence: u32,
    /// Local wall-clock time the sample was taken
    pub timestamp: DateTime<Local>,
    /// The metric values
    #[serde(flatten)]
    pub readings: MetricReadings,
}

impl Sample {
    /// Create a sample stamped with the current local time.
    pub fn new(sequence: u32, readings: MetricReadings) -> Self {
        Self::at(sequence, Local::now(), readings)
    }

    /// Create a sample with an explicit timestamp.
    pub fn at(sequence: u32, timestamp: DateTime<Local>, readings: MetricReadings) -> Self {
        Self {
            sequence,
            timestamp,
            readings,
        }
    }

    /// Create an all-absent sample for a tick whose exchange failed.
    pub fn degraded(sequence: u32) -> Self {
        Self::new(sequence, MetricReadings::absent())
    }
}

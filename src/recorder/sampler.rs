//! The bounded sampling loop.

use crate::config::SamplerConfig;
use crate::error::Result;
use crate::modem::traits::SignalSource;
use crate::recorder::csv::CsvRecorder;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::thread;
use tracing::info;

/// Outcome of a sampling run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingSummary {
    /// Rows written
    pub samples: u32,
    /// Rows with every metric absent
    pub degraded: u32,
    /// Rows with all three metrics present
    pub complete: u32,
}

/// Take `config.samples` samples from `source`, recording each one.
///
/// Every tick produces exactly one row; metric failures become empty fields.
/// Only a failure to write the record stops the run early.
pub fn run_sampling<S, W>(
    source: &mut S,
    recorder: &mut CsvRecorder<W>,
    config: &SamplerConfig,
) -> Result<SamplingSummary>
where
    S: SignalSource + ?Sized,
    W: Write,
{
    let mut summary = SamplingSummary::default();

    for sequence in 1..=config.samples {
        let sample = source.collect_sample(sequence);
        recorder.record(&sample)?;

        summary.samples += 1;
        if sample.readings.is_empty() {
            summary.degraded += 1;
        }
        if sample.readings.is_complete() {
            summary.complete += 1;
        }

        info!(
            "[{}] #{} RSRP={} RSRQ={} SINR={}",
            sample.timestamp.format(crate::recorder::TIMESTAMP_FORMAT),
            sequence,
            or_dash(sample.readings.rsrp),
            or_dash(sample.readings.rsrq),
            or_dash(sample.readings.sinr),
        );

        if sequence < config.samples {
            thread::sleep(config.interval);
        }
    }

    Ok(summary)
}

fn or_dash(value: Option<i32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModemError;
    use crate::modem::data::{MetricReadings, Sample};
    use std::io;
    use std::time::Duration;

    /// Yields scripted results; `None` simulates a communication fault.
    struct FakeSource {
        script: Vec<Option<MetricReadings>>,
        calls: usize,
    }

    impl SignalSource for FakeSource {
        fn read_metrics(&mut self) -> Result<MetricReadings> {
            let next = self.script.get(self.calls).copied().flatten();
            self.calls += 1;
            next.ok_or_else(|| {
                ModemError::Communication(io::Error::new(io::ErrorKind::TimedOut, "no reply"))
            })
        }

        fn collect_sample(&mut self, sequence: u32) -> Sample {
            match self.read_metrics() {
                Ok(readings) => Sample::new(sequence, readings),
                Err(_) => Sample::degraded(sequence),
            }
        }
    }

    #[test]
    fn test_one_row_per_tick() {
        let full = MetricReadings {
            rsrp: Some(-90),
            rsrq: Some(-10),
            sinr: Some(15),
        };
        let partial = MetricReadings {
            rsrp: Some(-91),
            ..MetricReadings::absent()
        };
        let mut source = FakeSource {
            script: vec![Some(full), None, Some(partial)],
            calls: 0,
        };
        let mut recorder = CsvRecorder::new(Vec::new(), "EXP_T").unwrap();
        let config = SamplerConfig::new("EXP_T")
            .with_samples(3)
            .with_interval(Duration::ZERO);

        let summary = run_sampling(&mut source, &mut recorder, &config).unwrap();
        assert_eq!(
            summary,
            SamplingSummary {
                samples: 3,
                degraded: 1,
                complete: 1,
            }
        );

        let text = String::from_utf8(recorder.into_inner()).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("EXP_T,1,") && rows[0].ends_with(",-90,-10,15"));
        assert!(rows[1].starts_with("EXP_T,2,") && rows[1].ends_with(",,,"));
        assert!(rows[2].ends_with(",-91,,"));
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some(-95)), "-95");
        assert_eq!(or_dash(Some(0)), "0");
        assert_eq!(or_dash(None), "-");
    }

    #[test]
    fn test_zero_samples() {
        let mut source = FakeSource {
            script: Vec::new(),
            calls: 0,
        };
        let mut recorder = CsvRecorder::new(Vec::new(), "EXP_T").unwrap();
        let config = SamplerConfig::new("EXP_T").with_samples(0);
        let summary = run_sampling(&mut source, &mut recorder, &config).unwrap();
        assert_eq!(summary.samples, 0);
        assert_eq!(source.calls, 0);
    }
}

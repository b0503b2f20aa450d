//! CSV output of signal samples.
//!
//! Format: `Exp_ID,Sample_No,Timestamp,RSRP,RSRQ,SINR`, one row per sample.
//! Absent metrics are written as empty fields so they never read as zero.

use crate::error::{ModemError, Result};
use crate::modem::data::Sample;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Header row written once at the top of every file.
pub const CSV_HEADER: [&str; 6] = ["Exp_ID", "Sample_No", "Timestamp", "RSRP", "RSRQ", "SINR"];

/// Local-time format of the timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes samples as CSV rows, flushing after each one.
pub struct CsvRecorder<W: Write> {
    writer: W,
    experiment_id: String,
    rows: u32,
}

impl CsvRecorder<BufWriter<File>> {
    /// Create (or truncate) `path` and write the header.
    pub fn create(path: impl AsRef<Path>, experiment_id: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            ModemError::recorder_error(format!("cannot create {}: {}", path.display(), e))
        })?;
        Self::new(BufWriter::new(file), experiment_id)
    }
}

impl<W: Write> CsvRecorder<W> {
    /// Wrap a writer and emit the header row.
    pub fn new(writer: W, experiment_id: impl Into<String>) -> Result<Self> {
        let mut recorder = Self {
            writer,
            experiment_id: experiment_id.into(),
            rows: 0,
        };
        let header = CSV_HEADER.join(",");
        recorder.write_line(&header)?;
        Ok(recorder)
    }

    /// Append one sample and flush it to the underlying writer.
    pub fn record(&mut self, sample: &Sample) -> Result<()> {
        let row = format_row(&self.experiment_id, sample);
        self.write_line(&row)?;
        self.rows += 1;
        Ok(())
    }

    /// Number of sample rows written so far.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|e| ModemError::recorder_error(format!("write failed: {}", e)))
    }
}

/// Render one CSV row for a sample.
pub fn format_row(experiment_id: &str, sample: &Sample) -> String {
    let fields = [
        escape_field(experiment_id),
        sample.sequence.to_string(),
        sample.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        optional_field(sample.readings.rsrp),
        optional_field(sample.readings.rsrq),
        optional_field(sample.readings.sinr),
    ];
    fields.join(",")
}

fn optional_field(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

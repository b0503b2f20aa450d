//! Persisting samples: the CSV writer and the bounded sampling loop.

pub mod csv;
pub mod sampler;

pub use self::csv::{CsvRecorder, CSV_HEADER, TIMESTAMP_FORMAT};
pub use sampler::{run_sampling, SamplingSummary};

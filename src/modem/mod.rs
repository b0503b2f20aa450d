//! Modem access: port arbitration, validated open, AT exchanges and parsing.
//!
//! The modem is a Quectel 5G HAT whose AT port speaks a line-oriented ASCII
//! protocol with no response terminator, so every exchange waits a fixed
//! settle time before collecting what has arrived.

pub mod arbiter;
pub mod collector;
pub mod data;
pub mod decode;
pub mod exchange;
pub mod parser;
pub mod port;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

// Re-export commonly used items
pub use arbiter::{CommandRunner, PortArbiter, SystemRunner};
pub use collector::{snapshot_once, snapshot_with, SignalCollector};
pub use data::{MetricReadings, Sample};
pub use decode::best_effort_decode;
pub use exchange::exchange;
pub use parser::{parse_primary, parse_report, BranchReport, Metric};
pub use port::{open_validated, open_validated_with, SerialCommandPort};
pub use traits::{CommandPort, SignalSource};

//! Traits at the serial and sampling seams.

use crate::error::Result;
use crate::modem::data::{MetricReadings, Sample};

/// A duplex byte channel to a modem's AT command interface.
///
/// The serial driver implements this for real hardware; tests substitute
/// an in-memory port.
pub trait CommandPort {
    /// Discard anything already sitting in the input buffer.
    fn clear_input(&mut self) -> Result<()>;

    /// Write all bytes and flush them to the device.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read into `buf`. Returns `Ok(0)` when nothing arrived before the read timeout.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Number of bytes already received and waiting to be read.
    fn bytes_to_read(&mut self) -> Result<u32>;
}

impl<P: CommandPort + ?Sized> CommandPort for Box<P> {
    fn clear_input(&mut self) -> Result<()> {
        (**self).clear_input()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn bytes_to_read(&mut self) -> Result<u32> {
        (**self).bytes_to_read()
    }
}

/// Source of signal-quality samples.
pub trait SignalSource {
    /// Query all three metrics once.
    ///
    /// Each metric resolves independently; a missing response line yields
    /// an absent value. Errors are communication faults from the port.
    fn read_metrics(&mut self) -> Result<MetricReadings>;

    /// Take one sample for the given tick.
    ///
    /// Never fails: a communication fault degrades the sample to all-absent.
    fn collect_sample(&mut self, sequence: u32) -> Sample;
}

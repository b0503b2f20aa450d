//! Error handling for the signal sampler crate.

/// A specialized `Result` type for signal sampler operations.
pub type Result<T> = std::result::Result<T, ModemError>;

/// The main error type for modem access and sampling.
#[derive(Debug, thiserror::Error)]
pub enum ModemError {
    /// Another process holds the AT port. Informational only.
    #[error("AT port {device} appears busy (held by: {holders})")]
    PortBusy { device: String, holders: String },

    /// The port could not be opened and validated within the retry budget
    #[error("Could not open/validate AT port {device} after {attempts} attempt(s): {}", .last_error.as_deref().unwrap_or("no response to handshake"))]
    PortUnavailable {
        device: String,
        attempts: u32,
        last_error: Option<String>,
    },

    /// I/O failure while talking to the modem
    #[error("Communication fault: {0}")]
    Communication(#[from] std::io::Error),

    /// Serial driver failure (open, clear, or query)
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Querying or stopping a system service failed
    #[error("Service control error: {0}")]
    ServiceControl(String),

    /// Writing the output record failed
    #[error("Recorder error: {0}")]
    Recorder(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ModemError {
    /// Create a new service control error
    pub fn service_error(msg: impl Into<String>) -> Self {
        Self::ServiceControl(msg.into())
    }

    /// Create a new recorder error
    pub fn recorder_error(msg: impl Into<String>) -> Self {
        Self::Recorder(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error happened on the wire during an exchange.
    ///
    /// Communication faults are recovered per tick by the sampler.
    pub fn is_communication_fault(&self) -> bool {
        matches!(self, Self::Communication(_) | Self::Serial(_))
    }
}

//! Serial AT port handle and the validated opener.

use crate::config::ModemConfig;
use crate::error::{ModemError, Result};
use crate::modem::decode::best_effort_decode;
use crate::modem::traits::CommandPort;
use serialport::{ClearBuffer, SerialPort, SerialPortBuilder};
use std::io::{self, Read, Write};
use std::thread;
use tracing::{debug, info, warn};

/// Handshake written to check the port is a live AT interface.
const HANDSHAKE_COMMAND: &str = "AT";

/// Token expected somewhere in the handshake reply.
const HANDSHAKE_OK: &str = "OK";

/// An open serial connection to the modem's AT port.
///
/// The underlying device is closed when this value is dropped.
pub struct SerialCommandPort {
    device: String,
    port: Box<dyn SerialPort>,
}

impl SerialCommandPort {
    /// Open the configured device without taking an exclusive lock.
    pub fn open(config: &ModemConfig) -> Result<Self> {
        let builder = serialport::new(&config.device, config.baud).timeout(config.timeout);
        let port = open_shared(builder)?;
        debug!("Opened {} at {} baud", config.device, config.baud);
        Ok(Self {
            device: config.device.clone(),
            port,
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

#[cfg(unix)]
fn open_shared(builder: SerialPortBuilder) -> Result<Box<dyn SerialPort>> {
    let mut port = builder.open_native()?;
    port.set_exclusive(false)?;
    Ok(Box::new(port))
}

#[cfg(not(unix))]
fn open_shared(builder: SerialPortBuilder) -> Result<Box<dyn SerialPort>> {
    Ok(builder.open()?)
}

impl CommandPort for SerialCommandPort {
    fn clear_input(&mut self) -> Result<()> {
        SerialPort::clear(&*self.port, ClearBuffer::Input)?;
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        Write::write_all(&mut self.port, bytes)?;
        Write::flush(&mut self.port)?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match Read::read(&mut self.port, buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn bytes_to_read(&mut self) -> Result<u32> {
        Ok(SerialPort::bytes_to_read(&*self.port)?)
    }
}

/// Open the configured AT port and confirm it answers the handshake.
pub fn open_validated(config: &ModemConfig) -> Result<SerialCommandPort> {
    let port = open_validated_with(config, || SerialCommandPort::open(config))?;
    info!("AT port {} validated", port.device());
    Ok(port)
}

/// Open-and-handshake loop over an arbitrary port factory.
///
/// Makes up to `config.open_retries` attempts. A port that opens but fails
/// the handshake is dropped (closing it) before the next attempt. The first port
/// that answers is returned without re-probing.
pub fn open_validated_with<P, F>(config: &ModemConfig, mut open: F) -> Result<P>
where
    P: CommandPort,
    F: FnMut() -> Result<P>,
{
    let mut last_error: Option<String> = None;

    for attempt in 1..=config.open_retries {
        match open() {
            Ok(mut port) => match handshake(&mut port, config) {
                Ok(true) => {
                    debug!("Handshake succeeded on attempt {}", attempt);
                    return Ok(port);
                }
                Ok(false) => {
                    debug!("Attempt {}: no {} in handshake reply", attempt, HANDSHAKE_OK);
                }
                Err(e) => {
                    warn!("Attempt {}: handshake failed on {}: {}", attempt, config.device, e);
                    last_error = Some(e.to_string());
                }
            },
            Err(e) => {
                warn!("Attempt {}: could not open {}: {}", attempt, config.device, e);
                last_error = Some(e.to_string());
            }
        }

        if attempt < config.open_retries {
            thread::sleep(config.retry_delay);
        }
    }

    Err(ModemError::PortUnavailable {
        device: config.device.clone(),
        attempts: config.open_retries,
        last_error,
    })
}

/// Write the handshake and look for the success token in the first bounded read.
fn handshake<P: CommandPort + ?Sized>(port: &mut P, config: &ModemConfig) -> Result<bool> {
    port.clear_input()?;
    port.write_all(format!("{}\r", HANDSHAKE_COMMAND).as_bytes())?;
    thread::sleep(config.handshake_settle);

    let mut buf = vec![0u8; config.handshake_read_limit];
    let mut filled = 0;
    while filled < buf.len() {
        let n = port.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    let reply = best_effort_decode(&buf[..filled]);
    debug!("Handshake reply: {:?}", reply);
    Ok(reply.contains(HANDSHAKE_OK))
}

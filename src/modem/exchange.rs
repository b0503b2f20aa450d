//! Single command/response exchange over an AT port.

use crate::error::Result;
use crate::modem::decode::best_effort_decode;
use crate::modem::traits::CommandPort;
use std::thread;
use std::time::Duration;
use tracing::debug;

const READ_CHUNK: usize = 256;

/// Send `command` and collect the reply lines.
///
/// The modem gives no end-of-response marker, so the reply is whatever has
/// been buffered once `settle` has elapsed. Lines are decoded tolerantly,
/// trimmed, and empty lines dropped; arrival order is preserved. I/O errors
/// propagate unchanged.
pub fn exchange<P: CommandPort + ?Sized>(
    port: &mut P,
    command: &str,
    settle: Duration,
) -> Result<Vec<String>> {
    port.clear_input()?;
    port.write_all(format!("{}\r", command).as_bytes())?;
    debug!("-> {}", command);

    thread::sleep(settle);

    let raw = drain_pending(port)?;
    let lines = split_lines(&raw);
    debug!("<- {} line(s) for {}: {:?}", lines.len(), command, lines);
    Ok(lines)
}

/// Read everything currently buffered on the port.
fn drain_pending<P: CommandPort + ?Sized>(port: &mut P) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let pending = port.bytes_to_read()? as usize;
        if pending == 0 {
            break;
        }
        let n = port.read(&mut chunk[..pending.min(READ_CHUNK)])?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..n]);
    }

    Ok(raw)
}

/// Split raw reply bytes on `\n` into trimmed, non-empty lines.
pub(crate) fn split_lines(raw: &[u8]) -> Vec<String> {
    raw.split(|&b| b == b'\n')
        .map(best_effort_decode)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

//! In-memory AT port and command runner for unit tests.

use crate::error::{ModemError, Result};
use crate::modem::arbiter::CommandRunner;
use crate::modem::traits::CommandPort;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;

/// Replies to known commands with canned bytes.
#[derive(Debug, Default)]
pub(crate) struct ScriptedPort {
    replies: HashMap<String, Vec<u8>>,
    rx: VecDeque<u8>,
    written: Vec<String>,
    fail_on_write: Option<usize>,
}

impl ScriptedPort {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` whenever `command` is written.
    pub(crate) fn respond(mut self, command: &str, reply: impl AsRef<[u8]>) -> Self {
        self.replies
            .insert(command.to_string(), reply.as_ref().to_vec());
        self
    }

    /// Fail the n-th write (1-based) and every write after it.
    pub(crate) fn fail_on_write(mut self, n: usize) -> Self {
        self.fail_on_write = Some(n);
        self
    }

    pub(crate) fn push_unsolicited(&mut self, bytes: impl AsRef<[u8]>) {
        self.rx.extend(bytes.as_ref());
    }

    pub(crate) fn written(&self) -> &[String] {
        &self.written
    }
}

impl CommandPort for ScriptedPort {
    fn clear_input(&mut self) -> Result<()> {
        self.rx.clear();
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail_on_write == Some(self.written.len() + 1) {
            return Err(ModemError::Communication(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device disconnected",
            )));
        }
        let text = String::from_utf8_lossy(bytes).to_string();
        if let Some(reply) = self.replies.get(text.trim_end_matches('\r')) {
            self.rx.extend(reply.iter().copied());
        }
        self.written.push(text);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn bytes_to_read(&mut self) -> Result<u32> {
        Ok(self.rx.len() as u32)
    }
}

/// Records every invocation and answers from a table keyed by the full argv.
///
/// Programs with no scripted output behave as if they are not installed.
#[derive(Debug, Default)]
pub(crate) struct ScriptedRunner {
    outputs: HashMap<String, String>,
    stop_status: Option<bool>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_output(mut self, argv: &str, output: &str) -> Self {
        self.outputs.insert(argv.to_string(), output.to_string());
        self
    }

    /// Exit status for status-only runs; `None` means the program cannot start.
    pub(crate) fn with_stop_status(mut self, status: Option<bool>) -> Self {
        self.stop_status = status;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, program: &str, args: &[&str]) -> String {
        let argv = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.borrow_mut().push(argv.clone());
        argv
    }
}

impl CommandRunner for ScriptedRunner {
    fn output(&self, program: &str, args: &[&str]) -> Option<String> {
        let argv = self.record(program, args);
        self.outputs.get(&argv).cloned()
    }

    fn status(&self, program: &str, args: &[&str]) -> io::Result<bool> {
        self.record(program, args);
        self.stop_status
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "No such file or directory"))
    }
}

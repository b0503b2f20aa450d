//! Exclusive-access checks for the AT port.
//!
//! ModemManager grabs the Quectel AT port as soon as it is enumerated, and
//! tools like minicom hold it open. The arbiter stops the known service and
//! reports whoever else still has the device open.

use crate::config::ModemConfig;
use crate::error::{ModemError, Result};
use std::io;
use std::process::Command;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runs the external tools the arbiter relies on.
pub trait CommandRunner {
    /// Run `program` and return its combined stdout and stderr.
    ///
    /// `None` when the program could not be started.
    fn output(&self, program: &str, args: &[&str]) -> Option<String>;

    /// Run `program` for its exit status; `Ok(true)` on success.
    fn status(&self, program: &str, args: &[&str]) -> io::Result<bool>;
}

/// Runs tools as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, program: &str, args: &[&str]) -> Option<String> {
        let output = Command::new(program).args(args).output().ok()?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Some(text)
    }

    fn status(&self, program: &str, args: &[&str]) -> io::Result<bool> {
        Ok(Command::new(program).args(args).status()?.success())
    }
}

/// Inspects and frees the AT port using system tools (`systemctl`, `fuser`).
#[derive(Debug, Clone)]
pub struct PortArbiter<R: CommandRunner = SystemRunner> {
    runner: R,
    service: String,
    settle: Duration,
    use_sudo: bool,
}

impl PortArbiter<SystemRunner> {
    pub fn new(config: &ModemConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: CommandRunner> PortArbiter<R> {
    /// Create an arbiter that runs its tools through `runner`.
    pub fn with_runner(config: &ModemConfig, runner: R) -> Self {
        Self {
            runner,
            service: config.conflicting_service.clone(),
            settle: config.release_settle,
            use_sudo: config.use_sudo,
        }
    }

    /// Whether no process currently holds `device`.
    ///
    /// When `fuser` cannot be run the port is assumed free.
    pub fn is_port_free(&self, device: &str) -> bool {
        self.check_port(device).is_ok()
    }

    /// Return `PortBusy` with the holder listing when `device` is in use.
    pub fn check_port(&self, device: &str) -> Result<()> {
        let Some(output) = self.output(true, "fuser", &["-v", device]) else {
            debug!("fuser unavailable, assuming {} is free", device);
            return Ok(());
        };
        if output_mentions_device(&output, device) {
            return Err(ModemError::PortBusy {
                device: device.to_string(),
                holders: summarize_holders(&output, device),
            });
        }
        Ok(())
    }

    /// Stop the conflicting service if it is active, then let the device settle.
    ///
    /// Returns whether a stop was issued. An inactive or missing service is
    /// not an error.
    pub fn release_conflicting_owner(&self, device: &str) -> Result<bool> {
        let state = self
            .output(false, "systemctl", &["is-active", self.service.as_str()])
            .unwrap_or_default();

        if !is_active_state(&state) {
            debug!("{} is {:?}, nothing to release", self.service, state.trim());
            return Ok(false);
        }

        info!("Stopping {} to free {}", self.service, device);
        let stopped = self
            .status(true, "systemctl", &["stop", self.service.as_str()])
            .map_err(|e| ModemError::service_error(format!("failed to run systemctl stop: {}", e)))?;

        if !stopped {
            warn!("systemctl stop {} did not succeed", self.service);
        }

        thread::sleep(self.settle);
        Ok(true)
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    fn output(&self, privileged: bool, program: &str, args: &[&str]) -> Option<String> {
        let (program, args) = self.argv(privileged, program, args);
        self.runner.output(program, &args)
    }

    fn status(&self, privileged: bool, program: &str, args: &[&str]) -> io::Result<bool> {
        let (program, args) = self.argv(privileged, program, args);
        self.runner.status(program, &args)
    }

    /// Prefix privileged invocations with sudo when configured.
    fn argv<'a>(&self, privileged: bool, program: &'a str, args: &[&'a str]) -> (&'a str, Vec<&'a str>) {
        if privileged && self.use_sudo {
            let mut full = Vec::with_capacity(args.len() + 1);
            full.push(program);
            full.extend_from_slice(args);
            ("sudo", full)
        } else {
            (program, args.to_vec())
        }
    }
}

/// `systemctl is-active` prints exactly `active` for a running unit.
pub fn is_active_state(state: &str) -> bool {
    state.trim() == "active"
}

/// `fuser -v` prints a `<device>:` row only when some process holds it.
pub fn output_mentions_device(output: &str, device: &str) -> bool {
    output.lines().any(|line| {
        line.trim_start()
            .strip_prefix(device)
            .is_some_and(|rest| rest.starts_with(':'))
    })
}

/// Pull the command names out of a `fuser -v` listing.
fn summarize_holders(output: &str, device: &str) -> String {
    let holders: Vec<&str> = output
        .lines()
        .filter(|line| !line.trim_start().starts_with("USER"))
        .filter_map(|line| {
            let line = line.trim().trim_start_matches(device).trim_start_matches(':');
            line.split_whitespace().last()
        })
        .collect();

    if holders.is_empty() {
        "unknown".to_string()
    } else {
        holders.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modem::mock::ScriptedRunner;
    use std::time::Instant;

    const FUSER_BUSY: &str = "                     USER        PID ACCESS COMMAND\n\
                              /dev/ttyUSB2:        root       1234 F.... minicom\n";

    fn config(settle: Duration) -> ModemConfig {
        ModemConfig::default().with_conflicting_service("ModemManager.service", settle)
    }

    #[test]
    fn test_active_state() {
        assert!(is_active_state("active\n"));
        assert!(!is_active_state("inactive\n"));
        assert!(!is_active_state("activating"));
        assert!(!is_active_state(""));
    }

    #[test]
    fn test_device_mention() {
        assert!(output_mentions_device(FUSER_BUSY, "/dev/ttyUSB2"));
        assert!(!output_mentions_device("", "/dev/ttyUSB2"));
        assert!(!output_mentions_device(FUSER_BUSY, "/dev/ttyUSB3"));
        assert!(!output_mentions_device(
            "Specified filename /dev/ttyUSB2 does not exist.",
            "/dev/ttyUSB2"
        ));
    }

    #[test]
    fn test_holder_summary() {
        assert_eq!(summarize_holders(FUSER_BUSY, "/dev/ttyUSB2"), "minicom");
        assert_eq!(summarize_holders("", "/dev/ttyUSB2"), "unknown");
    }

    #[test]
    fn test_inactive_service_left_alone() {
        let runner = ScriptedRunner::new().with_output("systemctl is-active ModemManager.service", "inactive\n");
        let arbiter = PortArbiter::with_runner(&config(Duration::ZERO), runner);

        assert!(!arbiter.release_conflicting_owner("/dev/ttyUSB2").unwrap());
        assert_eq!(arbiter.runner.calls(), ["systemctl is-active ModemManager.service"]);
    }

    #[test]
    fn test_missing_systemctl_is_not_an_error() {
        let arbiter = PortArbiter::with_runner(&config(Duration::ZERO), ScriptedRunner::new());

        assert!(!arbiter.release_conflicting_owner("/dev/ttyUSB2").unwrap());
        assert_eq!(arbiter.runner.calls().len(), 1);
    }

    #[test]
    fn test_active_service_stopped_then_settles() {
        let runner = ScriptedRunner::new()
            .with_output("systemctl is-active ModemManager.service", "active\n")
            .with_stop_status(Some(true));
        let settle = Duration::from_millis(20);
        let arbiter = PortArbiter::with_runner(&config(settle), runner);

        let started = Instant::now();
        assert!(arbiter.release_conflicting_owner("/dev/ttyUSB2").unwrap());
        assert!(started.elapsed() >= settle);
        assert_eq!(
            arbiter.runner.calls(),
            [
                "systemctl is-active ModemManager.service",
                "sudo systemctl stop ModemManager.service",
            ]
        );
    }

    #[test]
    fn test_failed_stop_is_only_logged() {
        let runner = ScriptedRunner::new()
            .with_output("systemctl is-active ModemManager.service", "active\n")
            .with_stop_status(Some(false));
        let arbiter = PortArbiter::with_runner(&config(Duration::ZERO), runner);

        assert!(arbiter.release_conflicting_owner("/dev/ttyUSB2").unwrap());
    }

    #[test]
    fn test_unrunnable_stop_is_a_service_error() {
        let runner = ScriptedRunner::new()
            .with_output("systemctl is-active ModemManager.service", "active\n")
            .with_stop_status(None);
        let arbiter = PortArbiter::with_runner(&config(Duration::ZERO), runner);

        let err = arbiter.release_conflicting_owner("/dev/ttyUSB2").unwrap_err();
        assert!(matches!(err, ModemError::ServiceControl(_)));
    }

    #[test]
    fn test_busy_port_reports_holders() {
        let runner = ScriptedRunner::new().with_output("sudo fuser -v /dev/ttyUSB2", FUSER_BUSY);
        let arbiter = PortArbiter::with_runner(&config(Duration::ZERO), runner);

        match arbiter.check_port("/dev/ttyUSB2") {
            Err(ModemError::PortBusy { device, holders }) => {
                assert_eq!(device, "/dev/ttyUSB2");
                assert_eq!(holders, "minicom");
            }
            other => panic!("expected PortBusy, got {other:?}"),
        }
        assert!(!arbiter.is_port_free("/dev/ttyUSB2"));
    }

    #[test]
    fn test_free_port_without_sudo() {
        let runner = ScriptedRunner::new().with_output("fuser -v /dev/ttyUSB2", "");
        let arbiter = PortArbiter::with_runner(&config(Duration::ZERO).with_sudo(false), runner);

        assert!(arbiter.is_port_free("/dev/ttyUSB2"));
        assert_eq!(arbiter.runner.calls(), ["fuser -v /dev/ttyUSB2"]);
    }

    #[test]
    fn test_missing_fuser_assumes_free() {
        let arbiter = PortArbiter::with_runner(&config(Duration::ZERO), ScriptedRunner::new());
        assert!(arbiter.check_port("/dev/ttyUSB2").is_ok());
    }
}

//! Parsing of Quectel signal-quality responses.
//!
//! Each query answers with a line shaped like
//! `+QRSRP: <prx>,<drx>,<rx2>,<rx3>,<mode>`: four per-antenna-branch
//! integers followed by the serving system mode. Only the primary (PRX)
//! branch is kept.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref QRSRP_RE: Regex = branch_pattern("QRSRP");
    static ref QRSRQ_RE: Regex = branch_pattern("QRSRQ");
    static ref QSINR_RE: Regex = branch_pattern("QSINR");
}

fn branch_pattern(tag: &str) -> Regex {
    let pattern = format!(r"\+{tag}:\s*(-?\d+),(-?\d+),(-?\d+),(-?\d+),(\w+)");
    // The pattern is assembled from a fixed template and a literal tag.
    Regex::new(&pattern).unwrap_or_else(|e| panic!("invalid {tag} pattern: {e}"))
}

/// A signal-quality metric the modem can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Rsrp,
    Rsrq,
    Sinr,
}

impl Metric {
    /// Query order used for every sample.
    pub const ALL: [Metric; 3] = [Metric::Rsrp, Metric::Rsrq, Metric::Sinr];

    /// AT query command, without the trailing carriage return.
    pub fn command(self) -> &'static str {
        match self {
            Metric::Rsrp => "AT+QRSRP",
            Metric::Rsrq => "AT+QRSRQ",
            Metric::Sinr => "AT+QSINR",
        }
    }

    /// Expected response shape.
    pub fn pattern(self) -> &'static Regex {
        match self {
            Metric::Rsrp => &QRSRP_RE,
            Metric::Rsrq => &QRSRQ_RE,
            Metric::Sinr => &QSINR_RE,
        }
    }

    /// Column / display name.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Rsrp => "RSRP",
            Metric::Rsrq => "RSRQ",
            Metric::Sinr => "SINR",
        }
    }

    /// Extract this metric's primary-branch value from response lines.
    pub fn parse<S: AsRef<str>>(self, lines: &[S]) -> Option<i32> {
        parse_primary(lines, self.pattern())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Full multi-branch report from one response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchReport {
    /// PRX, DRX, RX2, RX3
    pub branches: [i32; 4],
    /// Serving system mode, e.g. `LTE` or `NR5G`
    pub mode: String,
}

impl BranchReport {
    pub fn primary(&self) -> i32 {
        self.branches[0]
    }
}

/// Return the first line that matches `pattern`, decoded into a branch report.
///
/// A line whose fields match the shape but overflow `i32` is skipped.
pub fn parse_report<S: AsRef<str>>(lines: &[S], pattern: &Regex) -> Option<BranchReport> {
    lines
        .iter()
        .filter_map(|line| pattern.captures(line.as_ref()))
        .find_map(|caps| {
            let mut branches = [0i32; 4];
            for (i, slot) in branches.iter_mut().enumerate() {
                *slot = caps.get(i + 1)?.as_str().parse().ok()?;
            }
            let mode = caps.get(5)?.as_str().to_string();
            Some(BranchReport { branches, mode })
        })
}

/// Return the primary-branch value from the first matching line, if any.
pub fn parse_primary<S: AsRef<str>>(lines: &[S], pattern: &Regex) -> Option<i32> {
    parse_report(lines, pattern).map(|report| report.primary())
}

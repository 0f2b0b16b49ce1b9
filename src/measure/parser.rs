//! iperf3 text output parsing
//!
//! Extracts the per-interval bitrate readings from a client's log and
//! averages them after discarding warm-up and cool-down intervals.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

use super::RunResult;

/// Per-interval report line of an iperf3 TCP client:
///
/// `[  5]   1.00-2.00   sec  1.25 GBytes  10.7 Gbits/sec    0   2.75 MBytes`
///
/// The summary lines (`sender` / `receiver`) carry no congestion window and
/// therefore never match.
const INTERVAL_LINE: &str = r"^\[\s*\d+\]\s+\d+(?:\.\d+)?-\d+(?:\.\d+)?\s+sec\s+\S+\s+[KMGT]?Bytes\s+(?P<rate>\S+)\s+(?P<unit>[KMGT]?)bits/sec\s+\S+\s+\S+\s+[KMGT]?Bytes\s*$";

/// Log parsing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("invalid bitrate {value:?} on line {line}")]
    InvalidRate { line: usize, value: String },

    #[error(
        "found {matched} interval samples, need more than {leading} leading + {trailing} trailing"
    )]
    InsufficientSamples {
        matched: usize,
        leading: usize,
        trailing: usize,
    },
}

fn interval_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(INTERVAL_LINE).expect("interval line pattern is valid"))
}

/// Scale factor from an iperf3 rate unit prefix to Gbits/sec
fn gbits_scale(prefix: &str) -> f64 {
    match prefix {
        "K" => 1e-6,
        "M" => 1e-3,
        "G" => 1.0,
        "T" => 1e3,
        _ => 1e-9,
    }
}

/// Collect every interval bitrate in order of appearance, in Gbits/sec
fn interval_samples(logs: &str) -> Result<Vec<f64>, ParseError> {
    let pattern = interval_line();
    let mut samples = Vec::new();

    for (number, line) in logs.lines().enumerate() {
        let Some(caps) = pattern.captures(line.trim_end()) else {
            continue;
        };

        let raw = &caps["rate"];
        let value: f64 = raw.parse().map_err(|_| ParseError::InvalidRate {
            line: number + 1,
            value: raw.to_string(),
        })?;

        samples.push(value * gbits_scale(&caps["unit"]));
    }

    Ok(samples)
}

/// Parse a client log into a single averaged bitrate.
///
/// The first `leading` and last `trailing` samples are dropped; the rest are
/// averaged. Every matched sample must be numeric, trimmed or not.
pub fn parse_logs(logs: &str, leading: usize, trailing: usize) -> Result<RunResult, ParseError> {
    let samples = interval_samples(logs)?;
    let matched = samples.len();

    if matched <= leading + trailing {
        return Err(ParseError::InsufficientSamples {
            matched,
            leading,
            trailing,
        });
    }

    let retained = &samples[leading..matched - trailing];
    let count = retained.len() as f64;
    let bitrate = retained.iter().map(|value| value / count).sum();

    debug!(
        "Parsed {} interval samples, averaged {} ({:.3} Gbits/sec)",
        matched,
        retained.len(),
        bitrate
    );

    Ok(RunResult::new(bitrate))
}

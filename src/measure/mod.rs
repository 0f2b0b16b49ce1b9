//! Throughput measurement
//!
//! Turns raw iperf3 client output into per-run results and combines them.

mod aggregate;
mod parser;

pub use aggregate::aggregate;
pub use parser::{parse_logs, ParseError};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Throughput measured by a single client/server pair, in Gbits/sec
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub bitrate: f64,
}

impl RunResult {
    pub fn new(bitrate: f64) -> Self {
        Self { bitrate }
    }
}

/// Combined throughput of every pair in one invocation
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Sum of the per-run bitrates, in Gbits/sec
    pub bitrate: f64,

    /// Number of runs folded into `bitrate`
    pub runs: usize,
}

impl fmt::Display for AggregateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitrate: {:.6} Gbits/sec", self.bitrate)
    }
}

//! Result aggregation across parallel runs

use super::{AggregateResult, RunResult};

/// Sum every run's bitrate; parallel streams carry equal weight.
pub fn aggregate(results: &[RunResult]) -> AggregateResult {
    AggregateResult {
        bitrate: results.iter().map(|r| r.bitrate).sum(),
        runs: results.len(),
    }
}

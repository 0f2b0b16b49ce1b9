//! Timer utilities
//!
//! Wall-clock timing for measurement runs.

use std::time::{Duration, Instant};
use tracing::info;

/// Wall-clock timer for a labelled operation
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    /// Create and start a new timer
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop timer, log and return elapsed time
    pub fn stop(self) -> Duration {
        let elapsed = self.elapsed();
        info!("{} finished in {:.1}s", self.label, elapsed.as_secs_f64());
        elapsed
    }
}

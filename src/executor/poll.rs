//! Fixed-interval polling with a deadline and cancellation

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// Interval and ceiling of a polling loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Why a polling loop stopped without a value
#[derive(Debug, PartialEq)]
pub enum PollError<E> {
    /// The deadline passed; carries the time spent waiting
    Timeout(Duration),
    Cancelled,
    /// The probe itself failed
    Probe(E),
}

/// Call `probe` until it yields `Some`, sleeping `policy.interval` between
/// attempts. Probe errors end the loop immediately.
pub async fn poll_until<T, E, F, Fut>(
    policy: PollPolicy,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let start = Instant::now();

    loop {
        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            attempt = probe() => attempt,
        };

        if let Some(value) = attempt.map_err(PollError::Probe)? {
            return Ok(value);
        }

        let waited = start.elapsed();
        if waited >= policy.timeout {
            return Err(PollError::Timeout(waited));
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            _ = sleep(policy.interval.min(policy.timeout - waited)) => {}
        }
    }
}

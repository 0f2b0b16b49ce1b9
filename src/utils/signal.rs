//! Interrupt handling
//!
//! The first interrupt cancels the run so cleanup can delete the pods; a
//! second one means the caller should stop waiting for cleanup.

use std::future::Future;
use std::io;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Cancel `cancel` on the first interrupt. Returns `true` once a second
/// interrupt arrives, `false` if the signal listener fails.
pub async fn watch_interrupts<F, Fut>(mut interrupt: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(e) = interrupt().await {
        warn!("Failed to listen for interrupts: {}", e);
        return false;
    }

    warn!("Interrupted, cleaning up iperf3 pods (interrupt again to exit now)");
    cancel.cancel();

    interrupt().await.is_ok()
}

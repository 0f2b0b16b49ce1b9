//! Created-resources ledger
//!
//! Every successfully created unit is recorded here and deleted when the
//! run ends, whatever the outcome.

use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, warn};

use super::CleanupError;
use crate::gateway::{GatewayError, ResourceGateway, Role};

/// Units created during one run, in creation order
#[derive(Clone, Debug, Default)]
pub struct CreatedLedger {
    entries: Vec<(Role, usize)>,
}

impl CreatedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a unit; call only after its create succeeded
    pub fn record(&mut self, role: Role, index: usize) {
        self.entries.push((role, index));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Delete every recorded unit. Deletes are independent; a failure is
    /// collected and never stops the others.
    pub async fn drain<G>(&mut self, gateway: &G, delete_timeout: Duration) -> CleanupReport
    where
        G: ResourceGateway + ?Sized,
    {
        let entries = std::mem::take(&mut self.entries);

        let attempts = entries.into_iter().map(|(role, index)| async move {
            let outcome = match tokio::time::timeout(delete_timeout, gateway.delete(role, index))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout(delete_timeout.as_secs())),
            };
            (role, index, outcome)
        });

        let mut report = CleanupReport::default();
        for (role, index, outcome) in join_all(attempts).await {
            match outcome {
                Ok(()) => {
                    debug!("Deleted {} {}", role, index);
                    report.deleted.push((role, index));
                }
                Err(source) => {
                    let err = CleanupError {
                        role,
                        index,
                        source,
                    };
                    warn!("{}", err);
                    report.failures.push(err);
                }
            }
        }

        report
    }
}

/// Outcome of draining the ledger
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CleanupReport {
    pub deleted: Vec<(Role, usize)>,
    pub failures: Vec<CleanupError>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.deleted.len() + self.failures.len()
    }

    /// Names of the units that could not be deleted
    pub fn leftover_names(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|f| f.role.unit_name(f.index))
            .collect()
    }
}

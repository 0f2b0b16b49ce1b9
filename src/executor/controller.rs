//! iperf3 workload controller
//!
//! Drives one measurement run: server pods, their addresses, client pods,
//! completion, log collection and aggregation. Every pod that was created
//! is deleted on the way out, on success, error and cancellation alike.

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ledger::{CleanupReport, CreatedLedger};
use super::poll::{poll_until, PollError, PollPolicy};
use super::RunError;
use crate::gateway::{ResourceGateway, Role, RunPolicy, UnitPhase, WorkloadUnit};
use crate::measure::{aggregate, parse_logs, AggregateResult, RunResult};
use crate::utils::Timer;

/// Stage of a measurement run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    CreatingReceivers,
    AwaitingAddresses,
    CreatingGenerators,
    AwaitingCompletion,
    CollectingResults,
    Aggregating,
    Done,
    Cleanup,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::CreatingReceivers => "creating receivers",
            Phase::AwaitingAddresses => "awaiting addresses",
            Phase::CreatingGenerators => "creating generators",
            Phase::AwaitingCompletion => "awaiting completion",
            Phase::CollectingResults => "collecting results",
            Phase::Aggregating => "aggregating",
            Phase::Done => "done",
            Phase::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-invocation run parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Node for the iperf3 server pods
    pub server_node: Option<String>,
    /// Node for the iperf3 client pods
    pub client_node: Option<String>,
    pub parallel_count: usize,
}

impl RunConfig {
    pub fn new(parallel_count: usize) -> Result<Self, RunError> {
        if parallel_count == 0 {
            return Err(RunError::InvalidConfig(
                "parallel count must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            server_node: None,
            client_node: None,
            parallel_count,
        })
    }

    pub fn with_server_node(mut self, node: Option<String>) -> Self {
        self.server_node = node.filter(|n| !n.is_empty());
        self
    }

    pub fn with_client_node(mut self, node: Option<String>) -> Self {
        self.client_node = node.filter(|n| !n.is_empty());
        self
    }
}

/// Tool and timing settings shared by every run of a controller
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerSettings {
    pub image: String,
    /// iperf3 client duration (`-t`), in seconds
    pub duration_secs: u64,
    /// Interval samples dropped from the start of each client log
    pub omit_start: usize,
    /// Interval samples dropped from the end of each client log
    pub omit_end: usize,
    pub address_poll: PollPolicy,
    pub completion_poll: PollPolicy,
    pub delete_timeout: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            image: "networkstatic/iperf3".to_string(),
            duration_secs: 70,
            omit_start: 10,
            omit_end: 10,
            address_poll: PollPolicy::new(Duration::from_secs(1), Duration::from_secs(300)),
            completion_poll: PollPolicy::new(Duration::from_secs(1), Duration::from_secs(600)),
            delete_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of a run together with its cleanup
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub outcome: Result<AggregateResult, RunError>,
    pub cleanup: CleanupReport,
}

/// Orchestrates iperf3 server/client pairs through a [`ResourceGateway`]
pub struct WorkloadController<G> {
    gateway: G,
    settings: ControllerSettings,
}

impl<G: ResourceGateway> WorkloadController<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            settings: ControllerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ControllerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Run a measurement and report both its outcome and the cleanup
    pub async fn run_with_report(
        &self,
        config: &RunConfig,
        cancel: &CancellationToken,
    ) -> RunReport {
        let timer = Timer::start("iperf3 run");
        let mut ledger = CreatedLedger::new();

        let outcome = self.execute(config, cancel, &mut ledger).await;
        if let Err(e) = &outcome {
            warn!("Run failed while {}: {}", e.phase(), e);
        }

        debug!("Entering {}", Phase::Cleanup);
        info!("Deleting {} iperf3 pods", ledger.len());
        let cleanup = ledger.drain(&self.gateway, self.settings.delete_timeout).await;
        if !cleanup.is_clean() {
            warn!(
                "{} of {} pods could not be deleted",
                cleanup.failures.len(),
                cleanup.attempted()
            );
        }

        timer.stop();
        RunReport { outcome, cleanup }
    }

    async fn execute(
        &self,
        config: &RunConfig,
        cancel: &CancellationToken,
        ledger: &mut CreatedLedger,
    ) -> Result<AggregateResult, RunError> {
        let count = config.parallel_count;
        if count == 0 {
            return Err(RunError::InvalidConfig(
                "parallel count must be at least 1".to_string(),
            ));
        }

        info!("Creating {} iperf3 server pods", count);
        for index in 0..count {
            let unit = self.receiver_unit(config, index);
            self.create(unit, Phase::CreatingReceivers, cancel, ledger)
                .await?;
        }

        info!("Waiting for iperf3 server pods to start");
        let addresses =
            try_join_all((0..count).map(|index| self.await_address(index, cancel))).await?;

        info!("Creating {} iperf3 client pods", count);
        for (index, address) in addresses.iter().enumerate() {
            let unit = self.generator_unit(config, index, address);
            self.create(unit, Phase::CreatingGenerators, cancel, ledger)
                .await?;
        }

        info!("Waiting for iperf3 client pods to finish");
        let results: Vec<RunResult> =
            try_join_all((0..count).map(|index| self.collect_result(index, cancel))).await?;

        debug!("Entering {}", Phase::Aggregating);
        let total = aggregate(&results);
        info!(
            "Aggregate bitrate over {} pairs: {:.3} Gbits/sec",
            total.runs, total.bitrate
        );
        debug!("Entering {}", Phase::Done);

        Ok(total)
    }

    fn receiver_unit(&self, config: &RunConfig, index: usize) -> WorkloadUnit {
        WorkloadUnit::new(Role::Receiver, index, &self.settings.image)
            .with_placement(config.server_node.clone())
            .with_run_policy(RunPolicy::Always)
            .with_args(["-s"])
    }

    fn generator_unit(&self, config: &RunConfig, index: usize, address: &str) -> WorkloadUnit {
        WorkloadUnit::new(Role::Generator, index, &self.settings.image)
            .with_placement(config.client_node.clone())
            .with_run_policy(RunPolicy::OnFailure)
            .with_args([
                "-f".to_string(),
                "g".to_string(),
                "-t".to_string(),
                self.settings.duration_secs.to_string(),
                "-c".to_string(),
                address.to_string(),
            ])
    }

    async fn create(
        &self,
        unit: WorkloadUnit,
        phase: Phase,
        cancel: &CancellationToken,
        ledger: &mut CreatedLedger,
    ) -> Result<(), RunError> {
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled { phase });
        }

        self.gateway
            .create(&unit)
            .await
            .map_err(|source| RunError::CreateFailed {
                role: unit.role,
                index: unit.index,
                source,
            })?;

        ledger.record(unit.role, unit.index);
        debug!("Created pod {}", unit.name);
        Ok(())
    }

    async fn await_address(
        &self,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<String, RunError> {
        let address = poll_until(self.settings.address_poll, cancel, || async move {
            self.gateway
                .get(Role::Receiver, index)
                .await
                .map(|status| status.address)
        })
        .await
        .map_err(|e| match e {
            PollError::Timeout(waited) => RunError::Timeout {
                phase: Phase::AwaitingAddresses,
                role: Role::Receiver,
                index,
                waited,
            },
            PollError::Cancelled => RunError::Cancelled {
                phase: Phase::AwaitingAddresses,
            },
            PollError::Probe(source) => RunError::AddressDiscoveryFailed { index, source },
        })?;

        info!("iperf3 server pod {} IP address: {}", index, address);
        Ok(address)
    }

    async fn collect_result(
        &self,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<RunResult, RunError> {
        poll_until(self.settings.completion_poll, cancel, || async move {
            self.gateway
                .get(Role::Generator, index)
                .await
                .map_err(|source| RunError::GeneratorStatusFailed { index, source })
                .and_then(|status| match status.phase {
                    UnitPhase::Succeeded => Ok(Some(())),
                    UnitPhase::Failed => Err(RunError::GeneratorFailed {
                        index,
                        phase: status.phase,
                    }),
                    _ => Ok(None),
                })
        })
        .await
        .map_err(|e| match e {
            PollError::Timeout(waited) => RunError::Timeout {
                phase: Phase::AwaitingCompletion,
                role: Role::Generator,
                index,
                waited,
            },
            PollError::Cancelled => RunError::Cancelled {
                phase: Phase::AwaitingCompletion,
            },
            PollError::Probe(err) => err,
        })?;

        info!("iperf3 client pod {} finished", index);

        let logs = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(RunError::Cancelled { phase: Phase::CollectingResults });
            }
            logs = self.gateway.get_logs(Role::Generator, index) => {
                logs.map_err(|source| RunError::LogFetchFailed { index, source })?
            }
        };

        let result = parse_logs(&logs, self.settings.omit_start, self.settings.omit_end)
            .map_err(|source| RunError::ParseFailed { index, source })?;

        info!(
            "iperf3 client pod {} bitrate: {:.3} Gbits/sec",
            index, result.bitrate
        );
        Ok(result)
    }
}

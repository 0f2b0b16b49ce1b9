//! Measurement run errors

use std::time::Duration;
use thiserror::Error;

use super::Phase;
use crate::gateway::{GatewayError, Role, UnitPhase};
use crate::measure::ParseError;

/// Errors that abort a measurement run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to create {role} {index}: {source}")]
    CreateFailed {
        role: Role,
        index: usize,
        #[source]
        source: GatewayError,
    },

    #[error("failed to get address of receiver {index}: {source}")]
    AddressDiscoveryFailed {
        index: usize,
        #[source]
        source: GatewayError,
    },

    #[error("failed to get status of generator {index}: {source}")]
    GeneratorStatusFailed {
        index: usize,
        #[source]
        source: GatewayError,
    },

    #[error("generator {index} finished with phase {phase:?}")]
    GeneratorFailed { index: usize, phase: UnitPhase },

    #[error("failed to get logs of generator {index}: {source}")]
    LogFetchFailed {
        index: usize,
        #[source]
        source: GatewayError,
    },

    #[error("failed to parse logs of generator {index}: {source}")]
    ParseFailed {
        index: usize,
        #[source]
        source: ParseError,
    },

    #[error("timed out after {}s waiting for {role} {index} ({phase})", waited.as_secs())]
    Timeout {
        phase: Phase,
        role: Role,
        index: usize,
        waited: Duration,
    },

    #[error("cancelled while {phase}")]
    Cancelled { phase: Phase },
}

impl RunError {
    /// Phase a run error belongs to
    pub fn phase(&self) -> Phase {
        match self {
            RunError::InvalidConfig(_) => Phase::CreatingReceivers,
            RunError::CreateFailed {
                role: Role::Receiver,
                ..
            } => Phase::CreatingReceivers,
            RunError::CreateFailed { .. } => Phase::CreatingGenerators,
            RunError::AddressDiscoveryFailed { .. } => Phase::AwaitingAddresses,
            RunError::GeneratorStatusFailed { .. } | RunError::GeneratorFailed { .. } => {
                Phase::AwaitingCompletion
            }
            RunError::LogFetchFailed { .. } | RunError::ParseFailed { .. } => {
                Phase::CollectingResults
            }
            RunError::Timeout { phase, .. } | RunError::Cancelled { phase } => *phase,
        }
    }
}

/// A unit that could not be deleted during cleanup
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to delete {role} {index}: {source}")]
pub struct CleanupError {
    pub role: Role,
    pub index: usize,
    #[source]
    pub source: GatewayError,
}

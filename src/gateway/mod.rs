//! Workload gateway
//!
//! The contract the controller uses to manage iperf3 workload units on a
//! platform. The Kubernetes implementation lives in `crate::k8s`.

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Role of a workload unit in a measurement pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// iperf3 server, accepts the stream
    Receiver,
    /// iperf3 client, drives the stream and reports the bitrate
    Generator,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Receiver => "receiver",
            Role::Generator => "generator",
        }
    }

    /// Prefix of unit names for this role
    pub fn unit_prefix(&self) -> &'static str {
        match self {
            Role::Receiver => "iperf3-server",
            Role::Generator => "iperf3-client",
        }
    }

    /// Deterministic unit name for an index
    pub fn unit_name(&self, index: usize) -> String {
        format!("{}-{}", self.unit_prefix(), index)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Restart behavior requested for a unit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPolicy {
    Always,
    OnFailure,
    Never,
}

impl RunPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPolicy::Always => "Always",
            RunPolicy::OnFailure => "OnFailure",
            RunPolicy::Never => "Never",
        }
    }
}

/// A workload unit to be created on the platform
#[derive(Clone, Debug, PartialEq)]
pub struct WorkloadUnit {
    pub name: String,
    pub role: Role,
    pub index: usize,
    /// Node the unit should be scheduled on, if pinned
    pub placement: Option<String>,
    pub run_policy: RunPolicy,
    pub image: String,
    pub args: Vec<String>,
}

impl WorkloadUnit {
    pub fn new(role: Role, index: usize, image: impl Into<String>) -> Self {
        Self {
            name: role.unit_name(index),
            role,
            index,
            placement: None,
            run_policy: RunPolicy::Never,
            image: image.into(),
            args: Vec::new(),
        }
    }

    pub fn with_placement(mut self, node: Option<String>) -> Self {
        self.placement = node;
        self
    }

    pub fn with_run_policy(mut self, policy: RunPolicy) -> Self {
        self.run_policy = policy;
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Lifecycle phase of a unit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl UnitPhase {
    pub fn from_str(s: &str) -> Self {
        match s {
            "Pending" => UnitPhase::Pending,
            "Running" => UnitPhase::Running,
            "Succeeded" => UnitPhase::Succeeded,
            "Failed" => UnitPhase::Failed,
            _ => UnitPhase::Unknown,
        }
    }
}

/// Observed state of a unit
#[derive(Clone, Debug, PartialEq)]
pub struct UnitStatus {
    /// Network address, once assigned
    pub address: Option<String>,
    pub phase: UnitPhase,
}

impl UnitStatus {
    pub fn new(address: Option<String>, phase: UnitPhase) -> Self {
        Self {
            address: address.filter(|a| !a.is_empty()),
            phase,
        }
    }
}

/// Gateway call errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("API error on {name} ({code}): {message}")]
    Api {
        name: String,
        code: u16,
        message: String,
    },

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("{0}")]
    Other(String),
}

/// Operations the controller needs from a workload platform
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    /// Create the unit
    async fn create(&self, unit: &WorkloadUnit) -> Result<(), GatewayError>;

    /// Current address and phase of a unit
    async fn get(&self, role: Role, index: usize) -> Result<UnitStatus, GatewayError>;

    /// Full textual output of a unit
    async fn get_logs(&self, role: Role, index: usize) -> Result<String, GatewayError>;

    /// Delete the unit
    async fn delete(&self, role: Role, index: usize) -> Result<(), GatewayError>;
}

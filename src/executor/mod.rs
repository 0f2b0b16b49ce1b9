//! Measurement run execution
//!
//! Provides the workload controller and the polling and cleanup machinery
//! it runs on.

mod controller;
mod error;
mod ledger;
mod poll;

pub use controller::{ControllerSettings, Phase, RunConfig, WorkloadController};
pub use error::{CleanupError, RunError};
pub use ledger::CleanupReport;
pub use poll::PollPolicy;

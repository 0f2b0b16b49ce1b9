//! Kubernetes API client module
//!
//! Runs iperf3 workload units as pods.

mod client;
mod pod;

pub use client::K8sClient;
pub use pod::PodGateway;

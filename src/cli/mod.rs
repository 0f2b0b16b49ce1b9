//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::Parser;

use crate::config::AppConfig;

/// Run iperf3 tests between Kubernetes nodes
#[derive(Parser, Debug)]
#[command(name = "k8s-iperf3")]
#[command(version)]
#[command(about = "k8s-iperf3 is a tool to run iperf3 tests on Kubernetes")]
#[command(long_about = None)]
pub struct Args {
    /// Path to the kubeconfig file [default: $KUBECONFIG, then ~/.kube/config]
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Node name for the iperf3 server pods
    #[arg(long)]
    pub server_node_name: Option<String>,

    /// Node name for the iperf3 client pods
    #[arg(long)]
    pub client_node_name: Option<String>,

    /// Number of parallel iperf3 tests
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub parallel_count: u32,

    /// Namespace for the iperf3 pods
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// iperf3 container image
    #[arg(long)]
    pub image: Option<String>,

    /// iperf3 client run time in seconds
    #[arg(long)]
    pub duration: Option<u64>,

    /// Interval samples discarded at the start of each run
    #[arg(long)]
    pub omit_start: Option<usize>,

    /// Interval samples discarded at the end of each run
    #[arg(long)]
    pub omit_end: Option<usize>,

    /// Pod status poll interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Seconds to wait for server pods to get an address
    #[arg(long)]
    pub address_timeout: Option<u64>,

    /// Seconds to wait for client pods to finish
    #[arg(long)]
    pub completion_timeout: Option<u64>,

    /// Seconds to wait for each pod deletion during cleanup
    #[arg(long)]
    pub delete_timeout: Option<u64>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Write the effective configuration to a file and exit
    #[arg(long)]
    pub write_config: Option<String>,

    /// List recognised environment variables and exit
    #[arg(long)]
    pub env_help: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Overlay flags given on the command line
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(image) = &self.image {
            config.image = image.clone();
        }
        if let Some(duration) = self.duration {
            config.duration_secs = duration;
        }
        if let Some(omit) = self.omit_start {
            config.omit_start = omit;
        }
        if let Some(omit) = self.omit_end {
            config.omit_end = omit;
        }
        if let Some(interval) = self.poll_interval_ms {
            config.poll_interval_ms = interval;
        }
        if let Some(timeout) = self.address_timeout {
            config.address_timeout_secs = timeout;
        }
        if let Some(timeout) = self.completion_timeout {
            config.completion_timeout_secs = timeout;
        }
        if let Some(timeout) = self.delete_timeout {
            config.delete_timeout_secs = timeout;
        }
        config
    }
}

//! k8s-iperf3 - Kubernetes node-to-node throughput measurement
//!
//! Runs parallel iperf3 server/client pod pairs between two nodes, parses
//! the client reports and prints the aggregate bitrate.
//!
//! ## Usage
//!
//! ```bash
//! # One pair between two nodes
//! k8s-iperf3 --server-node-name worker-1 --client-node-name worker-2
//!
//! # Four parallel pairs in a dedicated namespace
//! k8s-iperf3 --server-node-name worker-1 --client-node-name worker-2 \
//!     --parallel-count 4 --namespace bench
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod cli;
mod config;
mod executor;
mod gateway;
mod k8s;
mod measure;
mod utils;

use cli::Args;
use config::{print_env_help, AppConfig, EnvConfig, KubeconfigPath};
use executor::{CleanupReport, RunConfig, WorkloadController};
use k8s::{K8sClient, PodGateway};
use utils::{init_logger, watch_interrupts, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.env_help {
        print_env_help();
        return Ok(());
    }

    let env = EnvConfig::load();
    let level = if args.verbose || env.verbose.unwrap_or(false) {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    init_logger(level);

    let config = load_config(&args, &env)?;

    if let Some(path) = &args.write_config {
        config.save(path)?;
        info!("Configuration written to {}", path);
        return Ok(());
    }

    let kubeconfig = env.kubeconfig_path(args.kubeconfig.as_deref());
    let client = connect(&kubeconfig, &config.namespace)
        .await
        .context("while getting Kubernetes client")?;

    let controller = WorkloadController::new(PodGateway::new(client))
        .with_settings(config.controller_settings());

    let run_config = RunConfig::new(args.parallel_count as usize)?
        .with_server_node(args.server_node_name.clone())
        .with_client_node(args.client_node_name.clone());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, trigger).await {
            warn!("Interrupted again, exiting without waiting for cleanup");
            std::process::exit(130);
        }
    });

    info!(
        "Running {} iperf3 pair(s) in namespace {}",
        run_config.parallel_count, config.namespace
    );

    let report = controller.run_with_report(&run_config, &cancel).await;
    warn_leftover_pods(&report.cleanup);

    let result = report.outcome.context("while running iperf3")?;

    println!("{result}");

    Ok(())
}

/// Build the client; a kubeconfig named by flag or `KUBECONFIG` must exist,
/// a missing default falls back to the inferred configuration
async fn connect(kubeconfig: &KubeconfigPath, namespace: &str) -> Result<K8sClient> {
    if kubeconfig.is_required() || kubeconfig.path.exists() {
        return K8sClient::from_kubeconfig(&kubeconfig.path, namespace).await;
    }

    warn!(
        "Kubeconfig {} not found, using inferred configuration",
        kubeconfig.path.display()
    );
    K8sClient::new(namespace).await
}

/// Name the pods cleanup could not remove so they can be deleted by hand
fn warn_leftover_pods(cleanup: &CleanupReport) {
    if cleanup.is_clean() {
        return;
    }

    warn!("Pods left behind: {}", cleanup.leftover_names().join(" "));
}

/// Defaults, then config file, then environment, then flags
fn load_config(args: &Args, env: &EnvConfig) -> Result<AppConfig> {
    let path = args.config.clone().or_else(|| env.config_file.clone());

    let base = match path {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::default(),
    };

    let config = args.apply(base.apply_env(env));
    config.validate().context("invalid configuration")?;

    Ok(config)
}

//! Kubernetes client wrapper
//!
//! Builds the kube client from a kubeconfig file or the inferred
//! environment.

use anyhow::{bail, Context, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::Api,
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};
use std::path::Path;
use tracing::info;

/// Kubernetes client wrapper
#[derive(Clone)]
pub struct K8sClient {
    client: Client,
    namespace: String,
}

impl K8sClient {
    /// Create a client from the inferred config (in-cluster or default kubeconfig)
    pub async fn new(namespace: impl Into<String>) -> Result<Self> {
        let client = Client::try_default()
            .await
            .context("Failed to create Kubernetes client")?;

        Ok(Self {
            client,
            namespace: namespace.into(),
        })
    }

    /// Create a client from a kubeconfig file, which must exist
    pub async fn from_kubeconfig(path: &Path, namespace: impl Into<String>) -> Result<Self> {
        if !path.exists() {
            bail!("Kubeconfig {} not found", path.display());
        }

        let kubeconfig = Kubeconfig::read_from(path)
            .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .context("Failed to build config from kubeconfig")?;

        info!("Using kubeconfig {}", path.display());
        Self::with_config(config, namespace)
    }

    /// Create client with custom config
    pub fn with_config(config: Config, namespace: impl Into<String>) -> Result<Self> {
        let client =
            Client::try_from(config).context("Failed to create Kubernetes client from config")?;

        Ok(Self {
            client,
            namespace: namespace.into(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Pod API scoped to the client's namespace
    pub fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

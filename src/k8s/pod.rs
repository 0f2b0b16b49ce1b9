//! Pod-backed workload gateway
//!
//! Maps workload units onto bare pods in a single namespace.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use kube::api::{DeleteParams, LogParams, PostParams};
use std::collections::BTreeMap;
use tracing::debug;

use super::K8sClient;
use crate::gateway::{GatewayError, ResourceGateway, Role, UnitPhase, UnitStatus, WorkloadUnit};

const APP_LABEL: &str = "k8s-iperf3";
const ROLE_LABEL: &str = "k8s-iperf3/role";
const CONTAINER_NAME: &str = "iperf3";

/// [`ResourceGateway`] running each unit as a pod
pub struct PodGateway {
    client: K8sClient,
}

impl PodGateway {
    pub fn new(client: K8sClient) -> Self {
        Self { client }
    }
}

/// Pod manifest for a workload unit
fn build_pod(unit: &WorkloadUnit, namespace: &str) -> Pod {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), APP_LABEL.to_string());
    labels.insert(ROLE_LABEL.to_string(), unit.role.name().to_string());

    Pod {
        metadata: kube::core::ObjectMeta {
            name: Some(unit.name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: unit.placement.clone(),
            containers: vec![Container {
                name: CONTAINER_NAME.to_string(),
                image: Some(unit.image.clone()),
                args: Some(unit.args.clone()),
                ..Default::default()
            }],
            restart_policy: Some(unit.run_policy.as_str().to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Status of a pod as seen by the controller
fn pod_status(pod: &Pod) -> UnitStatus {
    let status = pod.status.as_ref();
    let address = status.and_then(|s| s.pod_ip.clone());
    let phase = status
        .and_then(|s| s.phase.as_deref())
        .map(UnitPhase::from_str)
        .unwrap_or(UnitPhase::Pending);

    UnitStatus::new(address, phase)
}

fn map_kube_error(name: &str, err: kube::Error) -> GatewayError {
    match err {
        kube::Error::Api(resp) if resp.code == 404 => GatewayError::NotFound(name.to_string()),
        kube::Error::Api(resp) if resp.code == 409 => {
            GatewayError::AlreadyExists(name.to_string())
        }
        kube::Error::Api(resp) => GatewayError::Api {
            name: name.to_string(),
            code: resp.code,
            message: resp.message,
        },
        other => GatewayError::Other(format!("{name}: {other}")),
    }
}

#[async_trait]
impl ResourceGateway for PodGateway {
    async fn create(&self, unit: &WorkloadUnit) -> Result<(), GatewayError> {
        let pod = build_pod(unit, self.client.namespace());

        self.client
            .pods()
            .create(&PostParams::default(), &pod)
            .await
            .map_err(|e| map_kube_error(&unit.name, e))?;

        debug!(
            "Created pod {}/{} on node {:?}",
            self.client.namespace(),
            unit.name,
            unit.placement
        );
        Ok(())
    }

    async fn get(&self, role: Role, index: usize) -> Result<UnitStatus, GatewayError> {
        let name = role.unit_name(index);
        let pod = self
            .client
            .pods()
            .get(&name)
            .await
            .map_err(|e| map_kube_error(&name, e))?;

        let status = pod_status(&pod);
        debug!("Pod {} phase: {:?}", name, status.phase);
        Ok(status)
    }

    async fn get_logs(&self, role: Role, index: usize) -> Result<String, GatewayError> {
        let name = role.unit_name(index);
        let params = LogParams {
            container: Some(CONTAINER_NAME.to_string()),
            ..Default::default()
        };

        self.client
            .pods()
            .logs(&name, &params)
            .await
            .map_err(|e| map_kube_error(&name, e))
    }

    async fn delete(&self, role: Role, index: usize) -> Result<(), GatewayError> {
        let name = role.unit_name(index);

        self.client
            .pods()
            .delete(&name, &DeleteParams::default())
            .await
            .map_err(|e| map_kube_error(&name, e))?;

        Ok(())
    }
}

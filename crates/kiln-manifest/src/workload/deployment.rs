//! Deployment and pod template types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::volume::{Volume, VolumeMount};
use super::ObjectMeta;
use crate::kind::ResourceKind;
use crate::resource::FieldMap;
use crate::schema::{paths, APP_LABEL};
use crate::Result;

/// Kubernetes Deployment
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: DeploymentSpec,
}

/// Deployment spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    /// Number of replicas
    pub replicas: u32,
    /// Label selector
    pub selector: LabelSelector,
    /// Pod template
    pub template: PodTemplateSpec,
    /// Deployment strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<DeploymentStrategy>,
}

/// Deployment strategy
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStrategy {
    /// RollingUpdate or Recreate
    #[serde(rename = "type")]
    pub type_: String,
}

/// Label selector
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Match labels
    pub match_labels: BTreeMap<String, String>,
}

/// Pod template spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
    /// Pod metadata
    pub metadata: PodMeta,
    /// Pod spec
    pub spec: PodSpec,
}

/// Pod metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodMeta {
    /// Labels
    pub labels: BTreeMap<String, String>,
}

/// Pod spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    /// Containers
    pub containers: Vec<Container>,
    /// Volumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

/// Container spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container name
    pub name: String,
    /// Image
    pub image: String,
    /// Ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    /// Environment from ConfigMap/Secret references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_from: Vec<EnvFromSource>,
    /// Resource requirements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    /// Liveness probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<Probe>,
    /// Readiness probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<Probe>,
    /// Volume mounts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

/// Container port
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    /// Port number
    pub container_port: u16,
}

/// Reference to a ConfigMap or Secret for loading env vars
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvFromSource {
    /// ConfigMap reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_ref: Option<NameReference>,
    /// Secret reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<NameReference>,
}

/// Reference to an object by name
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NameReference {
    /// Object name
    pub name: String,
}

/// Resource requirements
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    /// Requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceQuantity>,
    /// Limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceQuantity>,
}

/// CPU and memory quantities
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceQuantity {
    /// CPU, e.g. `500m`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    /// Memory, e.g. `512Mi`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

impl ResourceQuantity {
    fn from_parts(cpu: Option<&str>, memory: Option<&str>) -> Option<Self> {
        if cpu.is_none() && memory.is_none() {
            return None;
        }
        Some(Self {
            cpu: cpu.map(str::to_string),
            memory: memory.map(str::to_string),
        })
    }
}

/// HTTP probe
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    /// HTTP GET action
    pub http_get: HttpGetAction,
    /// Seconds after container start before probes begin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay_seconds: Option<u32>,
    /// Seconds between probe attempts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_seconds: Option<u32>,
}

/// HTTP GET action for a probe
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HttpGetAction {
    /// Path
    pub path: String,
    /// Port
    pub port: u16,
}

struct ProbePaths {
    path: &'static str,
    port: &'static str,
    delay: &'static str,
    period: &'static str,
}

const LIVENESS: ProbePaths = ProbePaths {
    path: paths::DEPLOY_LIVENESS_PATH,
    port: paths::DEPLOY_LIVENESS_PORT,
    delay: paths::DEPLOY_LIVENESS_DELAY,
    period: paths::DEPLOY_LIVENESS_PERIOD,
};

const READINESS: ProbePaths = ProbePaths {
    path: paths::DEPLOY_READINESS_PATH,
    port: paths::DEPLOY_READINESS_PORT,
    delay: paths::DEPLOY_READINESS_DELAY,
    period: paths::DEPLOY_READINESS_PERIOD,
};

/// A probe exists only when its path is set; delay and period alone emit
/// nothing.
fn compile_probe(fields: &FieldMap, probe: &ProbePaths) -> Result<Option<Probe>> {
    let Some(path) = fields.opt_str(probe.path)? else {
        return Ok(None);
    };
    Ok(Some(Probe {
        http_get: HttpGetAction {
            path: path.to_string(),
            port: fields.port(probe.port)?,
        },
        initial_delay_seconds: fields.opt_count(probe.delay)?,
        period_seconds: fields.opt_count(probe.period)?,
    }))
}

fn compile_resources(fields: &FieldMap) -> Result<Option<ResourceRequirements>> {
    let requests = ResourceQuantity::from_parts(
        fields.opt_str(paths::DEPLOY_CPU_REQUEST)?,
        fields.opt_str(paths::DEPLOY_MEMORY_REQUEST)?,
    );
    let limits = ResourceQuantity::from_parts(
        fields.opt_str(paths::DEPLOY_CPU_LIMIT)?,
        fields.opt_str(paths::DEPLOY_MEMORY_LIMIT)?,
    );
    if requests.is_none() && limits.is_none() {
        return Ok(None);
    }
    Ok(Some(ResourceRequirements { requests, limits }))
}

fn compile_env_from(fields: &FieldMap) -> Result<Vec<EnvFromSource>> {
    let mut sources = Vec::new();
    if let Some(name) = fields.opt_str(paths::DEPLOY_ENV_FROM_CONFIGMAP)? {
        sources.push(EnvFromSource {
            config_map_ref: Some(NameReference {
                name: name.to_string(),
            }),
            secret_ref: None,
        });
    }
    if let Some(name) = fields.opt_str(paths::DEPLOY_ENV_FROM_SECRET)? {
        sources.push(EnvFromSource {
            config_map_ref: None,
            secret_ref: Some(NameReference {
                name: name.to_string(),
            }),
        });
    }
    Ok(sources)
}

/// Build a single-container Deployment from resolved fields
pub(super) fn compile_deployment(fields: &FieldMap) -> Result<Deployment> {
    let selector_app = fields.str(paths::DEPLOY_SELECTOR_APP)?;
    let pod_app = fields.str(paths::DEPLOY_POD_APP)?;
    let replicas = fields
        .opt_count(paths::DEPLOY_REPLICAS)?
        .ok_or_else(|| crate::Error::internal("spec.replicas was not resolved"))?;

    let container = Container {
        name: fields.str(paths::DEPLOY_CONTAINER_NAME)?.to_string(),
        image: fields.str(paths::DEPLOY_IMAGE)?.to_string(),
        ports: vec![ContainerPort {
            container_port: fields.port(paths::DEPLOY_CONTAINER_PORT)?,
        }],
        env_from: compile_env_from(fields)?,
        resources: compile_resources(fields)?,
        liveness_probe: compile_probe(fields, &LIVENESS)?,
        readiness_probe: compile_probe(fields, &READINESS)?,
        volume_mounts: vec![VolumeMount {
            name: fields.str(paths::DEPLOY_MOUNT_NAME)?.to_string(),
            mount_path: fields.str(paths::DEPLOY_MOUNT_PATH)?.to_string(),
        }],
    };

    Ok(Deployment {
        api_version: ResourceKind::Deployment.api_version().to_string(),
        kind: ResourceKind::Deployment.kind_str().to_string(),
        metadata: ObjectMeta::from_fields(fields)?,
        spec: DeploymentSpec {
            replicas,
            selector: LabelSelector {
                match_labels: BTreeMap::from([(APP_LABEL.to_string(), selector_app.to_string())]),
            },
            template: PodTemplateSpec {
                metadata: PodMeta {
                    labels: BTreeMap::from([(APP_LABEL.to_string(), pod_app.to_string())]),
                },
                spec: PodSpec {
                    containers: vec![container],
                    volumes: vec![Volume::from_pvc(
                        fields.str(paths::DEPLOY_VOLUME_NAME)?,
                        fields.str(paths::DEPLOY_VOLUME_CLAIM)?,
                    )],
                },
            },
            strategy: fields
                .opt_str(paths::DEPLOY_STRATEGY)?
                .map(|s| DeploymentStrategy {
                    type_: s.to_string(),
                }),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::FieldValue;

    fn str_field(fields: &mut FieldMap, path: &str, value: &str) {
        fields.insert(path, FieldValue::Str(value.to_string()));
    }

    fn minimal_fields() -> FieldMap {
        let mut fields = FieldMap::new();
        for (path, value) in [
            (paths::NAME, "n8n"),
            (paths::NAMESPACE, "n8n"),
            (paths::APP_LABEL, "n8n"),
            (paths::DEPLOY_SELECTOR_APP, "n8n"),
            (paths::DEPLOY_POD_APP, "n8n"),
            (paths::DEPLOY_CONTAINER_NAME, "n8n"),
            (paths::DEPLOY_IMAGE, "docker.n8n.io/n8nio/n8n:1.118.2"),
            (paths::DEPLOY_MOUNT_NAME, "data"),
            (paths::DEPLOY_MOUNT_PATH, "/home/node/.n8n"),
            (paths::DEPLOY_VOLUME_NAME, "data"),
            (paths::DEPLOY_VOLUME_CLAIM, "n8n-data"),
        ] {
            str_field(&mut fields, path, value);
        }
        fields.insert(paths::DEPLOY_REPLICAS, FieldValue::Int(1));
        fields.insert(paths::DEPLOY_CONTAINER_PORT, FieldValue::Int(3008));
        fields
    }

    // =========================================================================
    // Story: Minimal Deployment
    // =========================================================================

    #[test]
    fn story_minimal_deployment_omits_optional_blocks() {
        let deployment = compile_deployment(&minimal_fields()).unwrap();
        let container = &deployment.spec.template.spec.containers[0];

        assert_eq!(deployment.spec.replicas, 1);
        assert_eq!(container.ports[0].container_port, 3008);
        assert!(container.env_from.is_empty());
        assert!(container.resources.is_none());
        assert!(container.liveness_probe.is_none());
        assert!(deployment.spec.strategy.is_none());
        assert_eq!(
            deployment.spec.template.spec.volumes[0]
                .persistent_volume_claim
                .claim_name,
            "n8n-data"
        );
    }

    #[test]
    fn story_container_keys_follow_kubectl_order() {
        let mut fields = minimal_fields();
        str_field(&mut fields, paths::DEPLOY_ENV_FROM_CONFIGMAP, "n8n-config");
        let value = serde_json::to_value(compile_deployment(&fields).unwrap()).unwrap();
        let container = &value["spec"]["template"]["spec"]["containers"][0];
        let keys: Vec<_> = container.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["name", "image", "ports", "envFrom", "volumeMounts"]
        );
        assert_eq!(container["envFrom"][0]["configMapRef"]["name"], "n8n-config");
    }

    // =========================================================================
    // Story: Probes and Resources
    // =========================================================================

    #[test]
    fn story_probe_needs_a_path() {
        let mut fields = minimal_fields();
        fields.insert(paths::DEPLOY_LIVENESS_DELAY, FieldValue::Int(30));
        let deployment = compile_deployment(&fields).unwrap();
        assert!(deployment.spec.template.spec.containers[0]
            .liveness_probe
            .is_none());
    }

    #[test]
    fn story_probe_with_timing() {
        let mut fields = minimal_fields();
        str_field(&mut fields, paths::DEPLOY_READINESS_PATH, "/healthz");
        fields.insert(paths::DEPLOY_READINESS_PORT, FieldValue::Int(5678));
        fields.insert(paths::DEPLOY_READINESS_DELAY, FieldValue::Int(10));
        fields.insert(paths::DEPLOY_READINESS_PERIOD, FieldValue::Int(5));

        let deployment = compile_deployment(&fields).unwrap();
        let probe = deployment.spec.template.spec.containers[0]
            .readiness_probe
            .clone()
            .expect("readiness probe");
        assert_eq!(probe.http_get.path, "/healthz");
        assert_eq!(probe.http_get.port, 5678);
        assert_eq!(probe.initial_delay_seconds, Some(10));
        assert_eq!(probe.period_seconds, Some(5));
    }

    #[test]
    fn story_limits_without_requests() {
        let mut fields = minimal_fields();
        str_field(&mut fields, paths::DEPLOY_MEMORY_LIMIT, "1Gi");
        let deployment = compile_deployment(&fields).unwrap();
        let resources = deployment.spec.template.spec.containers[0]
            .resources
            .clone()
            .expect("resources");
        assert!(resources.requests.is_none());
        assert_eq!(resources.limits.unwrap().memory.as_deref(), Some("1Gi"));
    }

    #[test]
    fn story_strategy_is_written_last() {
        let mut fields = minimal_fields();
        str_field(&mut fields, paths::DEPLOY_STRATEGY, "Recreate");
        let value = serde_json::to_value(compile_deployment(&fields).unwrap()).unwrap();
        let keys: Vec<_> = value["spec"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["replicas", "selector", "template", "strategy"]);
        assert_eq!(value["spec"]["strategy"]["type"], "Recreate");
    }
}

//! Typed manifest documents and the compiler that builds them
//!
//! Every kind has a serde struct whose field order is the order the emitter
//! writes: `apiVersion`, `kind`, `metadata`, then `spec` or `data`. The
//! [`WorkloadCompiler`] turns a resolved [`FieldMap`] into one of these.
//!
//! - [`Namespace`], [`ConfigMap`], [`Secret`], [`Kustomization`]: defined here
//! - [`Deployment`] and its pod template: [`deployment`]
//! - [`Service`]: [`service`]
//! - [`PersistentVolumeClaim`], [`Volume`], [`VolumeMount`]: [`volume`]

pub mod deployment;
pub mod service;
pub mod volume;

use std::collections::BTreeMap;

use kiln_common::to_yaml_string;
use serde::{Deserialize, Serialize};

use crate::kind::ResourceKind;
use crate::resource::FieldMap;
use crate::schema::{paths, APP_LABEL};
use crate::Result;

pub use deployment::{
    Container, ContainerPort, Deployment, DeploymentSpec, DeploymentStrategy, EnvFromSource,
    HttpGetAction, LabelSelector, NameReference, PodMeta, PodSpec, PodTemplateSpec, Probe,
    ResourceQuantity, ResourceRequirements,
};
pub use service::{Service, ServicePort, ServiceSpec};
pub use volume::{
    PersistentVolumeClaim, PvcSpec, PvcVolumeSource, StorageRequest, Volume, VolumeMount,
};

// =============================================================================
// Metadata
// =============================================================================

/// Object metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name
    pub name: String,
    /// Resource namespace; absent for cluster-scoped kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Cluster-scoped metadata with no labels
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            labels: BTreeMap::new(),
        }
    }

    /// Set the namespace
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Name, namespace and `app` label of a namespaced resource
    fn from_fields(fields: &FieldMap) -> Result<Self> {
        let meta = Self::new(fields.str(paths::NAME)?).in_namespace(fields.str(paths::NAMESPACE)?);
        Ok(match fields.opt_str(paths::APP_LABEL)? {
            Some(app) => meta.with_label(APP_LABEL, app),
            None => meta,
        })
    }
}

// =============================================================================
// Namespace
// =============================================================================

/// Kubernetes Namespace
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
}

impl Namespace {
    /// Create a Namespace
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: ResourceKind::Namespace.api_version().to_string(),
            kind: ResourceKind::Namespace.kind_str().to_string(),
            metadata: ObjectMeta::new(name),
        }
    }
}

// =============================================================================
// ConfigMap and Secret
// =============================================================================

/// Kubernetes ConfigMap
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// String data
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl ConfigMap {
    /// Create an empty ConfigMap
    pub fn new(metadata: ObjectMeta) -> Self {
        Self {
            api_version: ResourceKind::ConfigMap.api_version().to_string(),
            kind: ResourceKind::ConfigMap.kind_str().to_string(),
            metadata,
            data: BTreeMap::new(),
        }
    }

    /// Add a data entry
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Kubernetes Secret
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Secret type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    /// String data, base64-encoded by the API server on write
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_data: BTreeMap<String, String>,
}

impl Secret {
    /// Create an empty Secret
    pub fn new(metadata: ObjectMeta) -> Self {
        Self {
            api_version: ResourceKind::Secret.api_version().to_string(),
            kind: ResourceKind::Secret.kind_str().to_string(),
            metadata,
            type_: None,
            string_data: BTreeMap::new(),
        }
    }
}

// =============================================================================
// Kustomization
// =============================================================================

/// kustomize `Kustomization` listing the files of one application
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Kustomization {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Namespace applied to every listed resource
    pub namespace: String,
    /// Files, in application order
    #[serde(default)]
    pub resources: Vec<String>,
}

// =============================================================================
// Manifest
// =============================================================================

/// Any document kiln can emit
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Manifest {
    /// Namespace
    Namespace(Namespace),
    /// ConfigMap
    ConfigMap(ConfigMap),
    /// Secret
    Secret(Secret),
    /// PersistentVolumeClaim
    PersistentVolumeClaim(PersistentVolumeClaim),
    /// Deployment
    Deployment(Box<Deployment>),
    /// Service
    Service(Service),
    /// Kustomization
    Kustomization(Kustomization),
}

impl Manifest {
    /// Kind of the wrapped document
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Namespace(_) => ResourceKind::Namespace,
            Self::ConfigMap(_) => ResourceKind::ConfigMap,
            Self::Secret(_) => ResourceKind::Secret,
            Self::PersistentVolumeClaim(_) => ResourceKind::PersistentVolumeClaim,
            Self::Deployment(_) => ResourceKind::Deployment,
            Self::Service(_) => ResourceKind::Service,
            Self::Kustomization(_) => ResourceKind::Kustomization,
        }
    }

    /// The document as a JSON value, keys in declaration order
    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| crate::Error::serialization_for_kind(self.kind().kind_str(), e.to_string()))
    }

    /// The document as YAML text
    pub fn to_yaml(&self) -> Result<String> {
        to_yaml_string(&self.to_value()?)
            .map_err(|e| crate::Error::serialization_for_kind(self.kind().kind_str(), e.to_string()))
    }
}

// =============================================================================
// Compiler
// =============================================================================

/// Builds typed manifests from resolved fields
pub struct WorkloadCompiler;

impl WorkloadCompiler {
    /// Compile the manifest of `kind` from its resolved fields
    pub fn compile(kind: ResourceKind, fields: &FieldMap) -> Result<Manifest> {
        Ok(match kind {
            ResourceKind::Namespace => Manifest::Namespace(Namespace::new(fields.str(paths::NAME)?)),
            ResourceKind::ConfigMap => Manifest::ConfigMap(Self::compile_config_map(fields)?),
            ResourceKind::Secret => Manifest::Secret(Self::compile_secret(fields)?),
            ResourceKind::PersistentVolumeClaim => {
                Manifest::PersistentVolumeClaim(volume::compile_pvc(fields)?)
            }
            ResourceKind::Deployment => {
                Manifest::Deployment(Box::new(deployment::compile_deployment(fields)?))
            }
            ResourceKind::Service => Manifest::Service(service::compile_service(fields)?),
            ResourceKind::Kustomization => Manifest::Kustomization(Kustomization {
                api_version: kind.api_version().to_string(),
                kind: kind.kind_str().to_string(),
                namespace: fields.str(paths::KUSTOMIZATION_NAMESPACE)?.to_string(),
                resources: fields.list(paths::KUSTOMIZATION_RESOURCES)?,
            }),
        })
    }

    fn compile_config_map(fields: &FieldMap) -> Result<ConfigMap> {
        let config_map = ConfigMap::new(ObjectMeta::from_fields(fields)?);
        Ok(fields
            .map(paths::CONFIGMAP_DATA)?
            .into_iter()
            .fold(config_map, |cm, (k, v)| cm.with_data(k, v)))
    }

    fn compile_secret(fields: &FieldMap) -> Result<Secret> {
        let mut secret = Secret::new(ObjectMeta::from_fields(fields)?);
        secret.type_ = fields.opt_str(paths::SECRET_TYPE)?.map(str::to_string);
        secret.string_data = fields.map(paths::SECRET_STRING_DATA)?;
        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::FieldValue;

    fn meta_fields(name: &str) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert(paths::NAME, FieldValue::Str(name.to_string()));
        fields.insert(paths::NAMESPACE, FieldValue::Str("n8n".to_string()));
        fields.insert(paths::APP_LABEL, FieldValue::Str("n8n".to_string()));
        fields
    }

    // =========================================================================
    // Story: Document Shape
    // =========================================================================

    #[test]
    fn story_top_level_keys_follow_declaration_order() {
        let mut fields = meta_fields("n8n-config");
        fields.insert(
            paths::CONFIGMAP_DATA,
            FieldValue::Map(BTreeMap::from([("N8N_PORT".to_string(), "3008".to_string())])),
        );
        let manifest = WorkloadCompiler::compile(ResourceKind::ConfigMap, &fields).unwrap();
        let value = manifest.to_value().unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["apiVersion", "kind", "metadata", "data"]);
        assert_eq!(value["data"]["N8N_PORT"], "3008");
        assert_eq!(value["metadata"]["labels"]["app"], "n8n");
    }

    #[test]
    fn story_namespace_has_no_namespace_field() {
        let mut fields = FieldMap::new();
        fields.insert(paths::NAME, FieldValue::Str("n8n".to_string()));
        let value = WorkloadCompiler::compile(ResourceKind::Namespace, &fields)
            .unwrap()
            .to_value()
            .unwrap();
        assert_eq!(value["metadata"], serde_json::json!({ "name": "n8n" }));
    }

    #[test]
    fn story_secret_writes_type_before_string_data() {
        let mut fields = meta_fields("n8n-secret");
        fields.insert(paths::SECRET_TYPE, FieldValue::Str("Opaque".to_string()));
        fields.insert(
            paths::SECRET_STRING_DATA,
            FieldValue::Map(BTreeMap::from([(
                "DB_PASSWORD".to_string(),
                "hunter2".to_string(),
            )])),
        );
        let value = WorkloadCompiler::compile(ResourceKind::Secret, &fields)
            .unwrap()
            .to_value()
            .unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["apiVersion", "kind", "metadata", "type", "stringData"]);
    }

    #[test]
    fn story_kustomization_lists_resources() {
        let mut fields = FieldMap::new();
        fields.insert(
            paths::KUSTOMIZATION_NAMESPACE,
            FieldValue::Str("n8n".to_string()),
        );
        fields.insert(
            paths::KUSTOMIZATION_RESOURCES,
            FieldValue::List(vec!["namespace.yaml".to_string(), "pvc.yaml".to_string()]),
        );
        let manifest = WorkloadCompiler::compile(ResourceKind::Kustomization, &fields).unwrap();
        assert_eq!(manifest.kind(), ResourceKind::Kustomization);
        let value = manifest.to_value().unwrap();
        assert_eq!(value["apiVersion"], "kustomize.config.k8s.io/v1beta1");
        assert_eq!(value["resources"][1], "pvc.yaml");
    }

    #[test]
    fn story_missing_name_is_an_internal_error() {
        let fields = FieldMap::new();
        assert!(matches!(
            WorkloadCompiler::compile(ResourceKind::Namespace, &fields),
            Err(crate::Error::Internal { .. })
        ));
    }
}

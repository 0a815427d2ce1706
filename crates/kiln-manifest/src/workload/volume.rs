//! Persistent storage: claims, pod volumes and mounts

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ObjectMeta;
use crate::kind::ResourceKind;
use crate::resource::FieldMap;
use crate::schema::paths;
use crate::Result;

/// Kubernetes PersistentVolumeClaim
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaim {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: PvcSpec,
}

/// PersistentVolumeClaim spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PvcSpec {
    /// Access modes, e.g. `ReadWriteOnce`
    pub access_modes: Vec<String>,
    /// Requested storage
    pub resources: StorageRequest,
    /// Storage class; the cluster default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
}

/// `resources` block of a claim
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StorageRequest {
    /// `storage` request keyed by resource name
    pub requests: BTreeMap<String, String>,
}

/// Pod volume backed by a PersistentVolumeClaim
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Volume name
    pub name: String,
    /// PVC source
    pub persistent_volume_claim: PvcVolumeSource,
}

impl Volume {
    /// Create a Volume backed by a PVC.
    pub fn from_pvc(name: impl Into<String>, claim_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persistent_volume_claim: PvcVolumeSource {
                claim_name: claim_name.into(),
            },
        }
    }
}

/// PVC volume source
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PvcVolumeSource {
    /// PVC claim name
    pub claim_name: String,
}

/// Volume mount
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// Volume name
    pub name: String,
    /// Mount path
    pub mount_path: String,
}

pub(super) fn compile_pvc(fields: &FieldMap) -> Result<PersistentVolumeClaim> {
    Ok(PersistentVolumeClaim {
        api_version: ResourceKind::PersistentVolumeClaim.api_version().to_string(),
        kind: ResourceKind::PersistentVolumeClaim.kind_str().to_string(),
        metadata: ObjectMeta::from_fields(fields)?,
        spec: PvcSpec {
            access_modes: vec![fields.str(paths::PVC_ACCESS_MODE)?.to_string()],
            resources: StorageRequest {
                requests: BTreeMap::from([(
                    "storage".to_string(),
                    fields.str(paths::PVC_STORAGE)?.to_string(),
                )]),
            },
            storage_class_name: fields.opt_str(paths::PVC_STORAGE_CLASS)?.map(str::to_string),
        },
    })
}

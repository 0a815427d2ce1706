//! The closed set of resource kinds kiln renders

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::Error;

/// Resource kinds with a registered schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ResourceKind {
    /// Namespace (v1)
    Namespace,
    /// ConfigMap (v1)
    ConfigMap,
    /// Secret (v1)
    Secret,
    /// PersistentVolumeClaim (v1)
    PersistentVolumeClaim,
    /// Deployment (apps/v1)
    Deployment,
    /// Service (v1)
    Service,
    /// Kustomization (kustomize.config.k8s.io/v1beta1)
    Kustomization,
}

/// All ResourceKind variants in canonical order.
pub const ALL_KINDS: &[ResourceKind] = &[
    ResourceKind::Namespace,
    ResourceKind::ConfigMap,
    ResourceKind::Secret,
    ResourceKind::PersistentVolumeClaim,
    ResourceKind::Deployment,
    ResourceKind::Service,
    ResourceKind::Kustomization,
];

impl ResourceKind {
    /// Kubernetes Kind string.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Namespace => "Namespace",
            Self::ConfigMap => "ConfigMap",
            Self::Secret => "Secret",
            Self::PersistentVolumeClaim => "PersistentVolumeClaim",
            Self::Deployment => "Deployment",
            Self::Service => "Service",
            Self::Kustomization => "Kustomization",
        }
    }

    /// `apiVersion` written into the manifest.
    pub fn api_version(&self) -> &'static str {
        match self {
            Self::Namespace
            | Self::ConfigMap
            | Self::Secret
            | Self::PersistentVolumeClaim
            | Self::Service => "v1",
            Self::Deployment => "apps/v1",
            Self::Kustomization => "kustomize.config.k8s.io/v1beta1",
        }
    }

    /// Whether the manifest carries `metadata.namespace`.
    pub fn is_namespaced(&self) -> bool {
        !matches!(self, Self::Namespace | Self::Kustomization)
    }

    /// Application order class. Lower applies first.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Namespace => 0,
            Self::ConfigMap | Self::Secret | Self::PersistentVolumeClaim => 1,
            Self::Deployment => 2,
            Self::Service => 3,
            Self::Kustomization => 4,
        }
    }

    /// File name used in a kustomize directory layout.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Namespace => "namespace.yaml",
            Self::ConfigMap => "configmap.yaml",
            Self::Secret => "secret.yaml",
            Self::PersistentVolumeClaim => "pvc.yaml",
            Self::Deployment => "deployment.yaml",
            Self::Service => "service.yaml",
            Self::Kustomization => "kustomization.yaml",
        }
    }

    /// Reverse of [`ResourceKind::file_name`].
    pub fn from_file_name(name: &str) -> Option<Self> {
        ALL_KINDS.iter().copied().find(|k| k.file_name() == name)
    }

    /// kubectl-style short name, if the kind has one.
    fn short_name(&self) -> Option<&'static str> {
        match self {
            Self::Namespace => Some("ns"),
            Self::ConfigMap => Some("cm"),
            Self::PersistentVolumeClaim => Some("pvc"),
            Self::Deployment => Some("deploy"),
            Self::Service => Some("svc"),
            Self::Secret | Self::Kustomization => None,
        }
    }

    /// Comma-separated list of registered kind names.
    pub fn registered_names() -> String {
        ALL_KINDS
            .iter()
            .map(|k| k.kind_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_str())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    /// Accepts the Kind string case-insensitively, or a kubectl short name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ALL_KINDS
            .iter()
            .copied()
            .find(|k| {
                k.kind_str().eq_ignore_ascii_case(wanted)
                    || k.short_name().is_some_and(|n| n.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| Error::UnknownKind {
                kind: wanted.to_string(),
                registered: Self::registered_names(),
            })
    }
}

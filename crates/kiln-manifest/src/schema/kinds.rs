//! Built-in schema definitions
//!
//! One static field table per kind. Parameters shared across kinds (names,
//! namespace, ports) are declared once as [`ParamRef`] constants so every kind
//! resolves them to the same value and default.

use super::{DefaultValue, FieldSource, FieldSpec, FieldType, ParamRef, Schema};
use crate::kind::ResourceKind;
use crate::params::{ENV_FAMILY, SECRET_FAMILY};

/// Label key linking a Deployment's pods, its Service selector and every
/// other resource of the application
pub const APP_LABEL: &str = "app";

/// Allowed PVC access modes
pub const ACCESS_MODES: &[&str] = &[
    "ReadWriteOnce",
    "ReadWriteMany",
    "ReadOnlyMany",
    "ReadWriteOncePod",
];

/// Allowed Service types
pub const SERVICE_TYPES: &[&str] = &["ClusterIP", "NodePort", "LoadBalancer"];

/// Allowed Deployment strategy types
pub const DEPLOY_STRATEGIES: &[&str] = &["RollingUpdate", "Recreate"];

/// Allowed port protocols
pub const PROTOCOLS: &[&str] = &["TCP", "UDP", "SCTP"];

/// Field paths shared between the schema tables and the manifest compiler
pub(crate) mod paths {
    pub const NAME: &str = "metadata.name";
    pub const NAMESPACE: &str = "metadata.namespace";
    pub const APP_LABEL: &str = "metadata.labels.app";

    pub const CONFIGMAP_DATA: &str = "data";

    pub const SECRET_TYPE: &str = "type";
    pub const SECRET_STRING_DATA: &str = "stringData";

    pub const PVC_ACCESS_MODE: &str = "spec.accessModes[0]";
    pub const PVC_STORAGE: &str = "spec.resources.requests.storage";
    pub const PVC_STORAGE_CLASS: &str = "spec.storageClassName";

    pub const DEPLOY_REPLICAS: &str = "spec.replicas";
    pub const DEPLOY_STRATEGY: &str = "spec.strategy.type";
    pub const DEPLOY_SELECTOR_APP: &str = "spec.selector.matchLabels.app";
    pub const DEPLOY_POD_APP: &str = "spec.template.metadata.labels.app";
    pub const DEPLOY_CONTAINER_NAME: &str = "spec.template.spec.containers[0].name";
    pub const DEPLOY_IMAGE: &str = "spec.template.spec.containers[0].image";
    pub const DEPLOY_CONTAINER_PORT: &str =
        "spec.template.spec.containers[0].ports[0].containerPort";
    pub const DEPLOY_ENV_FROM_CONFIGMAP: &str =
        "spec.template.spec.containers[0].envFrom[0].configMapRef.name";
    pub const DEPLOY_ENV_FROM_SECRET: &str =
        "spec.template.spec.containers[0].envFrom[1].secretRef.name";
    pub const DEPLOY_CPU_REQUEST: &str = "spec.template.spec.containers[0].resources.requests.cpu";
    pub const DEPLOY_MEMORY_REQUEST: &str =
        "spec.template.spec.containers[0].resources.requests.memory";
    pub const DEPLOY_CPU_LIMIT: &str = "spec.template.spec.containers[0].resources.limits.cpu";
    pub const DEPLOY_MEMORY_LIMIT: &str =
        "spec.template.spec.containers[0].resources.limits.memory";
    pub const DEPLOY_LIVENESS_PATH: &str =
        "spec.template.spec.containers[0].livenessProbe.httpGet.path";
    pub const DEPLOY_LIVENESS_PORT: &str =
        "spec.template.spec.containers[0].livenessProbe.httpGet.port";
    pub const DEPLOY_LIVENESS_DELAY: &str =
        "spec.template.spec.containers[0].livenessProbe.initialDelaySeconds";
    pub const DEPLOY_LIVENESS_PERIOD: &str =
        "spec.template.spec.containers[0].livenessProbe.periodSeconds";
    pub const DEPLOY_READINESS_PATH: &str =
        "spec.template.spec.containers[0].readinessProbe.httpGet.path";
    pub const DEPLOY_READINESS_PORT: &str =
        "spec.template.spec.containers[0].readinessProbe.httpGet.port";
    pub const DEPLOY_READINESS_DELAY: &str =
        "spec.template.spec.containers[0].readinessProbe.initialDelaySeconds";
    pub const DEPLOY_READINESS_PERIOD: &str =
        "spec.template.spec.containers[0].readinessProbe.periodSeconds";
    pub const DEPLOY_MOUNT_NAME: &str = "spec.template.spec.containers[0].volumeMounts[0].name";
    pub const DEPLOY_MOUNT_PATH: &str =
        "spec.template.spec.containers[0].volumeMounts[0].mountPath";
    pub const DEPLOY_VOLUME_NAME: &str = "spec.template.spec.volumes[0].name";
    pub const DEPLOY_VOLUME_CLAIM: &str =
        "spec.template.spec.volumes[0].persistentVolumeClaim.claimName";

    pub const SERVICE_TYPE: &str = "spec.type";
    pub const SERVICE_SELECTOR_APP: &str = "spec.selector.app";
    pub const SERVICE_PORT_NAME: &str = "spec.ports[0].name";
    pub const SERVICE_PORT: &str = "spec.ports[0].port";
    pub const SERVICE_TARGET_PORT: &str = "spec.ports[0].targetPort";
    pub const SERVICE_PROTOCOL: &str = "spec.ports[0].protocol";

    pub const KUSTOMIZATION_NAMESPACE: &str = "namespace";
    pub const KUSTOMIZATION_RESOURCES: &str = "resources";
}

// =============================================================================
// Shared parameters
// =============================================================================

const APP_NAME: ParamRef = ParamRef::required("app-name");
const NAMESPACE: ParamRef = ParamRef::derived("namespace", "${app-name}");
const IMAGE: ParamRef = ParamRef::required("image");
const PORT: ParamRef = ParamRef::required("port");
const REPLICA_COUNT: ParamRef = ParamRef::with_default("replica-count", DefaultValue::Int(1));
const CONTAINER_NAME: ParamRef = ParamRef::derived("container-name", "${app-name}");
const CONFIGMAP_NAME: ParamRef = ParamRef::derived("configmap-name", "${app-name}-config");
const SECRET_NAME: ParamRef = ParamRef::derived("secret-name", "${app-name}-secret");
const PVC_NAME: ParamRef = ParamRef::derived("pvc-name", "${app-name}-data");
const VOLUME_NAME: ParamRef = ParamRef::with_default("volume-name", DefaultValue::Str("data"));
const MOUNT_PATH: ParamRef = ParamRef::with_default("mount-path", DefaultValue::Str("/data"));
const STORAGE_SIZE: ParamRef = ParamRef::required("storage-size");
const ACCESS_MODE: ParamRef =
    ParamRef::with_default("access-mode", DefaultValue::Str("ReadWriteOnce"));
const SERVICE_NAME: ParamRef = ParamRef::derived("service-name", "${app-name}");
const SERVICE_TYPE: ParamRef =
    ParamRef::with_default("service-type", DefaultValue::Str("ClusterIP"));
const SERVICE_PORT: ParamRef = ParamRef::derived("service-port", "${port}");
const SERVICE_PORT_NAME: ParamRef =
    ParamRef::with_default("service-port-name", DefaultValue::Str("http"));

const fn param(path: &'static str, ty: FieldType, param: ParamRef) -> FieldSpec {
    FieldSpec::new(path, ty, FieldSource::Param(param))
}

const fn optional(path: &'static str, ty: FieldType, key: &'static str) -> FieldSpec {
    FieldSpec::new(path, ty, FieldSource::Optional(key))
}

const fn when_present(
    path: &'static str,
    ty: FieldType,
    trigger: &'static str,
    param: ParamRef,
) -> FieldSpec {
    FieldSpec::new(path, ty, FieldSource::WhenPresent { trigger, param })
}

// =============================================================================
// Schemas
// =============================================================================

static NAMESPACE_SCHEMA: Schema = Schema {
    kind: ResourceKind::Namespace,
    api_version: "v1",
    fields: &[param(paths::NAME, FieldType::Name, NAMESPACE)],
};

static CONFIGMAP_SCHEMA: Schema = Schema {
    kind: ResourceKind::ConfigMap,
    api_version: "v1",
    fields: &[
        param(paths::NAME, FieldType::Name, CONFIGMAP_NAME),
        param(paths::NAMESPACE, FieldType::Name, NAMESPACE),
        param(paths::APP_LABEL, FieldType::Name, APP_NAME),
        FieldSpec::new(
            paths::CONFIGMAP_DATA,
            FieldType::StringMap,
            FieldSource::Family(ENV_FAMILY),
        ),
    ],
};

static SECRET_SCHEMA: Schema = Schema {
    kind: ResourceKind::Secret,
    api_version: "v1",
    fields: &[
        param(paths::NAME, FieldType::Name, SECRET_NAME),
        param(paths::NAMESPACE, FieldType::Name, NAMESPACE),
        param(paths::APP_LABEL, FieldType::Name, APP_NAME),
        FieldSpec::new(
            paths::SECRET_TYPE,
            FieldType::String,
            FieldSource::Fixed(DefaultValue::Str("Opaque")),
        ),
        FieldSpec::new(
            paths::SECRET_STRING_DATA,
            FieldType::StringMap,
            FieldSource::Family(SECRET_FAMILY),
        ),
    ],
};

static PVC_SCHEMA: Schema = Schema {
    kind: ResourceKind::PersistentVolumeClaim,
    api_version: "v1",
    fields: &[
        param(paths::NAME, FieldType::Name, PVC_NAME),
        param(paths::NAMESPACE, FieldType::Name, NAMESPACE),
        param(paths::APP_LABEL, FieldType::Name, APP_NAME),
        param(
            paths::PVC_ACCESS_MODE,
            FieldType::OneOf(ACCESS_MODES),
            ACCESS_MODE,
        ),
        param(paths::PVC_STORAGE, FieldType::Quantity, STORAGE_SIZE),
        optional(paths::PVC_STORAGE_CLASS, FieldType::String, "storage-class"),
    ],
};

static DEPLOYMENT_SCHEMA: Schema = Schema {
    kind: ResourceKind::Deployment,
    api_version: "apps/v1",
    fields: &[
        param(paths::NAME, FieldType::Name, APP_NAME),
        param(paths::NAMESPACE, FieldType::Name, NAMESPACE),
        param(paths::APP_LABEL, FieldType::Name, APP_NAME),
        param(paths::DEPLOY_REPLICAS, FieldType::Count, REPLICA_COUNT),
        optional(
            paths::DEPLOY_STRATEGY,
            FieldType::OneOf(DEPLOY_STRATEGIES),
            "deploy-strategy",
        ),
        param(paths::DEPLOY_SELECTOR_APP, FieldType::Name, APP_NAME),
        param(paths::DEPLOY_POD_APP, FieldType::Name, APP_NAME),
        param(paths::DEPLOY_CONTAINER_NAME, FieldType::Name, CONTAINER_NAME),
        param(paths::DEPLOY_IMAGE, FieldType::Image, IMAGE),
        param(paths::DEPLOY_CONTAINER_PORT, FieldType::Port, PORT),
        when_present(
            paths::DEPLOY_ENV_FROM_CONFIGMAP,
            FieldType::Name,
            ENV_FAMILY,
            CONFIGMAP_NAME,
        ),
        when_present(
            paths::DEPLOY_ENV_FROM_SECRET,
            FieldType::Name,
            SECRET_FAMILY,
            SECRET_NAME,
        ),
        optional(paths::DEPLOY_CPU_REQUEST, FieldType::Quantity, "cpu-request"),
        optional(
            paths::DEPLOY_MEMORY_REQUEST,
            FieldType::Quantity,
            "memory-request",
        ),
        optional(paths::DEPLOY_CPU_LIMIT, FieldType::Quantity, "cpu-limit"),
        optional(paths::DEPLOY_MEMORY_LIMIT, FieldType::Quantity, "memory-limit"),
        optional(
            paths::DEPLOY_LIVENESS_PATH,
            FieldType::AbsolutePath,
            "liveness-path",
        ),
        when_present(
            paths::DEPLOY_LIVENESS_PORT,
            FieldType::Port,
            "liveness-path",
            PORT,
        ),
        optional(
            paths::DEPLOY_LIVENESS_DELAY,
            FieldType::Count,
            "liveness-initial-delay",
        ),
        optional(paths::DEPLOY_LIVENESS_PERIOD, FieldType::Count, "probe-period"),
        optional(
            paths::DEPLOY_READINESS_PATH,
            FieldType::AbsolutePath,
            "readiness-path",
        ),
        when_present(
            paths::DEPLOY_READINESS_PORT,
            FieldType::Port,
            "readiness-path",
            PORT,
        ),
        optional(
            paths::DEPLOY_READINESS_DELAY,
            FieldType::Count,
            "readiness-initial-delay",
        ),
        optional(
            paths::DEPLOY_READINESS_PERIOD,
            FieldType::Count,
            "probe-period",
        ),
        param(paths::DEPLOY_MOUNT_NAME, FieldType::Name, VOLUME_NAME),
        param(paths::DEPLOY_MOUNT_PATH, FieldType::AbsolutePath, MOUNT_PATH),
        param(paths::DEPLOY_VOLUME_NAME, FieldType::Name, VOLUME_NAME),
        param(paths::DEPLOY_VOLUME_CLAIM, FieldType::Name, PVC_NAME),
    ],
};

static SERVICE_SCHEMA: Schema = Schema {
    kind: ResourceKind::Service,
    api_version: "v1",
    fields: &[
        param(paths::NAME, FieldType::Name, SERVICE_NAME),
        param(paths::NAMESPACE, FieldType::Name, NAMESPACE),
        param(paths::APP_LABEL, FieldType::Name, APP_NAME),
        param(
            paths::SERVICE_TYPE,
            FieldType::OneOf(SERVICE_TYPES),
            SERVICE_TYPE,
        ),
        param(paths::SERVICE_SELECTOR_APP, FieldType::Name, APP_NAME),
        param(paths::SERVICE_PORT_NAME, FieldType::Name, SERVICE_PORT_NAME),
        param(paths::SERVICE_PORT, FieldType::Port, SERVICE_PORT),
        param(paths::SERVICE_TARGET_PORT, FieldType::Port, PORT),
        FieldSpec::new(
            paths::SERVICE_PROTOCOL,
            FieldType::OneOf(PROTOCOLS),
            FieldSource::Fixed(DefaultValue::Str("TCP")),
        ),
    ],
};

static KUSTOMIZATION_SCHEMA: Schema = Schema {
    kind: ResourceKind::Kustomization,
    api_version: "kustomize.config.k8s.io/v1beta1",
    fields: &[
        param(paths::KUSTOMIZATION_NAMESPACE, FieldType::Name, NAMESPACE),
        FieldSpec::new(
            paths::KUSTOMIZATION_RESOURCES,
            FieldType::StringList,
            FieldSource::RenderedFiles,
        ),
    ],
};

/// Static schema of a kind
pub(super) fn schema_for(kind: ResourceKind) -> &'static Schema {
    match kind {
        ResourceKind::Namespace => &NAMESPACE_SCHEMA,
        ResourceKind::ConfigMap => &CONFIGMAP_SCHEMA,
        ResourceKind::Secret => &SECRET_SCHEMA,
        ResourceKind::PersistentVolumeClaim => &PVC_SCHEMA,
        ResourceKind::Deployment => &DEPLOYMENT_SCHEMA,
        ResourceKind::Service => &SERVICE_SCHEMA,
        ResourceKind::Kustomization => &KUSTOMIZATION_SCHEMA,
    }
}

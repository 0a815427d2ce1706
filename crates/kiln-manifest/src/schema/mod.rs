//! Schema registry: the static shape of every renderable kind
//!
//! Each [`Schema`] lists the field paths a kind produces, the type each value
//! must coerce to, and where the value comes from. Schemas are compiled into
//! the binary; the registry is built once and only read afterwards, so
//! concurrent renders share it freely.

mod coerce;
mod kinds;

use std::collections::BTreeSet;
use std::sync::OnceLock;

use kiln_common::template::referenced_identifiers;
use serde::Serialize;

use crate::kind::{ResourceKind, ALL_KINDS};
use crate::Result;

pub(crate) use kinds::paths;
pub use kinds::{ACCESS_MODES, APP_LABEL, DEPLOY_STRATEGIES, PROTOCOLS, SERVICE_TYPES};

/// Expected type of a resolved field value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    /// Any string. Integers and booleans are rendered as text.
    String,
    /// DNS-1123 label: lowercase alphanumerics and '-', at most 63 chars
    Name,
    /// Container image reference
    Image,
    /// Non-negative 32-bit integer
    Count,
    /// TCP/UDP port, 1-65535
    Port,
    /// Boolean
    Bool,
    /// Positive integer with an optional Kubernetes quantity suffix
    Quantity,
    /// Path starting with '/'
    AbsolutePath,
    /// One of a fixed set of strings
    OneOf(&'static [&'static str]),
    /// String-to-string map assembled from a parameter family
    StringMap,
    /// List of strings
    StringList,
}

/// A literal or derived default
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultValue {
    /// Literal string
    Str(&'static str),
    /// Literal integer
    Int(i64),
    /// Literal boolean
    Bool(bool),
    /// `${...}` template over other parameters, e.g. `${app-name}-data`
    Derived(&'static str),
}

/// Reference to a parameter, with its default if it has one
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ParamRef {
    /// Parameter key
    pub key: &'static str,
    /// Value used when the key is absent. `None` makes the parameter required.
    pub default: Option<DefaultValue>,
}

impl ParamRef {
    /// A parameter without a default
    pub const fn required(key: &'static str) -> Self {
        Self { key, default: None }
    }

    /// A parameter with a literal or derived default
    pub const fn with_default(key: &'static str, default: DefaultValue) -> Self {
        Self {
            key,
            default: Some(default),
        }
    }

    /// A parameter whose default is a `${...}` template
    pub const fn derived(key: &'static str, template: &'static str) -> Self {
        Self::with_default(key, DefaultValue::Derived(template))
    }
}

/// Where a field's value comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldSource {
    /// A parameter, falling back to its default
    Param(ParamRef),
    /// A parameter; the field is omitted when it is absent
    Optional(&'static str),
    /// A constant
    Fixed(DefaultValue),
    /// A parameter, emitted only when `trigger` is present (an exact key, or
    /// a family prefix ending in '.')
    WhenPresent {
        /// Key or family prefix that enables the field
        trigger: &'static str,
        /// Parameter supplying the value
        param: ParamRef,
    },
    /// Every parameter under a prefix, as a map keyed by suffix
    Family(&'static str),
    /// File names of the kinds rendered in the same pass
    RenderedFiles,
}

/// One field of a kind's schema
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Dotted path inside the manifest, e.g. `spec.replicas`
    pub path: &'static str,
    /// Expected value type
    #[serde(rename = "type")]
    pub ty: FieldType,
    /// Value source
    pub source: FieldSource,
}

impl FieldSpec {
    /// Create a field spec
    pub const fn new(path: &'static str, ty: FieldType, source: FieldSource) -> Self {
        Self { path, ty, source }
    }

    /// Whether expansion fails when the caller supplies nothing for this field
    pub fn is_required(&self) -> bool {
        matches!(self.source, FieldSource::Param(ParamRef { default: None, .. }))
    }
}

/// The static shape of one kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Kind this schema describes
    pub kind: ResourceKind,
    /// `apiVersion` of the emitted manifest
    pub api_version: &'static str,
    /// Field specs in manifest order
    pub fields: &'static [FieldSpec],
}

impl Schema {
    /// Look up a field by path
    pub fn field(&self, path: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// Fields whose parameter has no default
    pub fn required_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| f.is_required())
    }

    /// Every parameter key this schema reads, including keys referenced by
    /// derived defaults
    pub fn parameter_keys(&self) -> BTreeSet<String> {
        fn add_param(param: &ParamRef, keys: &mut BTreeSet<String>) {
            keys.insert(param.key.to_string());
            if let Some(DefaultValue::Derived(template)) = param.default {
                keys.extend(referenced_identifiers(template));
            }
        }

        let mut keys = BTreeSet::new();
        for field in self.fields {
            match &field.source {
                FieldSource::Param(param) => add_param(param, &mut keys),
                FieldSource::Optional(key) => {
                    keys.insert((*key).to_string());
                }
                FieldSource::WhenPresent { trigger, param } => {
                    if !trigger.ends_with('.') {
                        keys.insert((*trigger).to_string());
                    }
                    add_param(param, &mut keys);
                }
                FieldSource::Fixed(_) | FieldSource::Family(_) | FieldSource::RenderedFiles => {}
            }
        }
        keys
    }

    /// Family prefixes this schema reads
    pub fn families(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().filter_map(|f| match f.source {
            FieldSource::Family(prefix) => Some(prefix),
            _ => None,
        })
    }

    /// Whether a parameter key is read by this schema
    pub fn consumes(&self, key: &str) -> bool {
        self.families().any(|prefix| key.starts_with(prefix))
            || self.parameter_keys().contains(key)
    }
}

/// Registry of all built-in schemas
#[derive(Debug)]
pub struct SchemaRegistry {
    schemas: Vec<&'static Schema>,
}

impl SchemaRegistry {
    fn builtin() -> Self {
        Self {
            schemas: ALL_KINDS.iter().map(|kind| kinds::schema_for(*kind)).collect(),
        }
    }

    /// The process-wide registry
    pub fn global() -> &'static SchemaRegistry {
        static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::builtin)
    }

    /// Resolve a kind name to its schema. Fails with `UnknownKind`.
    pub fn lookup(&self, kind: &str) -> Result<&'static Schema> {
        let kind: ResourceKind = kind.parse()?;
        Ok(self.get(kind))
    }

    /// Schema of a known kind
    pub fn get(&self, kind: ResourceKind) -> &'static Schema {
        kinds::schema_for(kind)
    }

    /// All schemas in canonical kind order
    pub fn schemas(&self) -> impl Iterator<Item = &'static Schema> + '_ {
        self.schemas.iter().copied()
    }
}

/// Resolve a kind name against the global registry
pub fn lookup(kind: &str) -> Result<&'static Schema> {
    SchemaRegistry::global().lookup(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    // =========================================================================
    // Story: Registry Lookup
    // =========================================================================

    #[test]
    fn story_every_kind_has_a_schema() {
        let registry = SchemaRegistry::global();
        let kinds: Vec<_> = registry.schemas().map(|s| s.kind).collect();
        assert_eq!(kinds, ALL_KINDS.to_vec());
        for schema in registry.schemas() {
            assert_eq!(schema.api_version, schema.kind.api_version());
            assert!(!schema.fields.is_empty());
        }
    }

    #[test]
    fn story_lookup_by_name() {
        let schema = lookup("deployment").expect("Deployment should be registered");
        assert_eq!(schema.kind, ResourceKind::Deployment);
        assert_eq!(schema.api_version, "apps/v1");
    }

    #[test]
    fn story_unknown_kind_fails() {
        let err = lookup("StatefulSet").expect_err("StatefulSet is not registered");
        assert!(matches!(err, Error::UnknownKind { kind, .. } if kind == "StatefulSet"));
    }

    // =========================================================================
    // Story: Schema Introspection
    // =========================================================================

    #[test]
    fn story_required_fields_have_no_default() {
        let schema = lookup("Deployment").unwrap();
        let required: Vec<_> = schema.required_fields().map(|f| f.path).collect();
        assert!(required.contains(&paths::DEPLOY_IMAGE));
        assert!(required.contains(&paths::DEPLOY_CONTAINER_PORT));
        assert!(!required.contains(&paths::DEPLOY_REPLICAS));
    }

    #[test]
    fn story_pvc_requires_storage_size() {
        let schema = lookup("pvc").unwrap();
        let field = schema.field(paths::PVC_STORAGE).expect("storage field");
        assert!(field.is_required());
        assert_eq!(field.ty, FieldType::Quantity);
    }

    #[test]
    fn story_parameter_keys_include_derived_references() {
        let schema = lookup("Service").unwrap();
        let keys = schema.parameter_keys();
        assert!(keys.contains("service-port"));
        assert!(keys.contains("port"));
        assert!(keys.contains("app-name"));
    }

    #[test]
    fn story_families_are_consumed_by_prefix() {
        let configmap = lookup("ConfigMap").unwrap();
        assert!(configmap.consumes("env.N8N_PORT"));
        assert!(!configmap.consumes("secret.DB_PASSWORD"));
        let secret = lookup("Secret").unwrap();
        assert!(secret.consumes("secret.DB_PASSWORD"));
    }

    #[test]
    fn story_field_paths_are_unique_per_schema() {
        for schema in SchemaRegistry::global().schemas() {
            let mut seen = BTreeSet::new();
            for field in schema.fields {
                assert!(
                    seen.insert(field.path),
                    "{} declares {} twice",
                    schema.kind,
                    field.path
                );
            }
        }
    }
}

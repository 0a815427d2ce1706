//! Rendered resources and the sets they travel in
//!
//! A render moves through three set types. [`ResourceSet`] holds whatever the
//! expander produced. [`ValidatedResourceSet`] can only be obtained from the
//! validator, and [`OrderedResourceSet`] only from the orderer, so the emitter
//! never sees a set that skipped a stage.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::kind::ResourceKind;
use crate::schema::paths;
use crate::workload::{Manifest, WorkloadCompiler};
use crate::{Error, Result};

/// Name recorded for a Kustomization, which has no `metadata.name`
pub const KUSTOMIZATION_NAME: &str = "kustomization";

/// A resolved field value
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// String
    Str(String),
    /// Integer
    Int(i64),
    /// Boolean
    Bool(bool),
    /// List of strings
    List(Vec<String>),
    /// String map
    Map(BTreeMap<String, String>),
}

impl FieldValue {
    /// The string form of a scalar value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer form of a scalar value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Whether a string anywhere in this value still carries `${`
    pub fn has_placeholder(&self) -> bool {
        match self {
            Self::Str(s) => s.contains("${"),
            Self::Int(_) | Self::Bool(_) => false,
            Self::List(items) => items.iter().any(|s| s.contains("${")),
            Self::Map(map) => map
                .iter()
                .any(|(k, v)| k.contains("${") || v.contains("${")),
        }
    }
}

/// Field path to resolved value, for one resource
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldMap {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldMap {
    /// Create an empty field map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field
    pub fn insert(&mut self, path: impl Into<String>, value: FieldValue) {
        self.fields.insert(path.into(), value);
    }

    /// Look up a field
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.fields.get(path)
    }

    /// Iterate in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of resolved fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field was resolved
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A required string field
    pub fn str(&self, path: &str) -> Result<&str> {
        self.opt_str(path)?
            .ok_or_else(|| Error::internal(format!("field {} was not resolved", path)))
    }

    /// An optional string field
    pub fn opt_str(&self, path: &str) -> Result<Option<&str>> {
        match self.fields.get(path) {
            None => Ok(None),
            Some(FieldValue::Str(s)) => Ok(Some(s)),
            Some(other) => Err(wrong_shape(path, "string", other)),
        }
    }

    /// A required integer field
    pub fn int(&self, path: &str) -> Result<i64> {
        self.opt_int(path)?
            .ok_or_else(|| Error::internal(format!("field {} was not resolved", path)))
    }

    /// An optional integer field
    pub fn opt_int(&self, path: &str) -> Result<Option<i64>> {
        match self.fields.get(path) {
            None => Ok(None),
            Some(FieldValue::Int(i)) => Ok(Some(*i)),
            Some(other) => Err(wrong_shape(path, "integer", other)),
        }
    }

    /// A required port field, narrowed to `u16`
    pub fn port(&self, path: &str) -> Result<u16> {
        let value = self.int(path)?;
        u16::try_from(value).map_err(|_| Error::internal(format!("{} is not a port", path)))
    }

    /// An optional port field
    pub fn opt_port(&self, path: &str) -> Result<Option<u16>> {
        match self.opt_int(path)? {
            None => Ok(None),
            Some(_) => self.port(path).map(Some),
        }
    }

    /// An optional count field, narrowed to `u32`
    pub fn opt_count(&self, path: &str) -> Result<Option<u32>> {
        self.opt_int(path)?
            .map(|i| {
                u32::try_from(i).map_err(|_| Error::internal(format!("{} is not a count", path)))
            })
            .transpose()
    }

    /// A string map field, empty when absent
    pub fn map(&self, path: &str) -> Result<BTreeMap<String, String>> {
        match self.fields.get(path) {
            None => Ok(BTreeMap::new()),
            Some(FieldValue::Map(m)) => Ok(m.clone()),
            Some(other) => Err(wrong_shape(path, "map", other)),
        }
    }

    /// A string list field, empty when absent
    pub fn list(&self, path: &str) -> Result<Vec<String>> {
        match self.fields.get(path) {
            None => Ok(Vec::new()),
            Some(FieldValue::List(l)) => Ok(l.clone()),
            Some(other) => Err(wrong_shape(path, "list", other)),
        }
    }

    /// Fields under a dotted prefix, keyed by the remainder of the path
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a FieldValue)> + 'a {
        self.fields
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(move |(k, v)| (&k[prefix.len()..], v))
    }
}

fn wrong_shape(path: &str, expected: &str, got: &FieldValue) -> Error {
    Error::internal(format!(
        "field {} should hold a {}, found {:?}",
        path, expected, got
    ))
}

/// A reference from one resource to another, checked by the validator
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum CrossReference {
    /// A Service selects pods carrying these labels
    SelectsPods {
        /// Label selector
        selector: BTreeMap<String, String>,
    },
    /// A Service forwards to this container port
    TargetsPort {
        /// Target port
        port: u16,
    },
    /// A Deployment mounts this PersistentVolumeClaim
    MountsClaim {
        /// Claim name
        claim: String,
    },
    /// A Deployment loads environment from a ConfigMap or Secret
    LoadsEnvFrom {
        /// ConfigMap or Secret
        kind: ResourceKind,
        /// Referenced name
        name: String,
    },
    /// A Kustomization lists this file
    ListsFile {
        /// File name relative to the kustomization
        file: String,
    },
}

/// Identity of a resource within a set
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResourceRef {
    /// Kind
    pub kind: ResourceKind,
    /// Namespace, for namespaced kinds
    pub namespace: Option<String>,
    /// Name
    pub name: String,
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// One fully expanded resource
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedResource {
    kind: ResourceKind,
    name: String,
    namespace: Option<String>,
    app: Option<String>,
    fields: FieldMap,
    references: Vec<CrossReference>,
    manifest: Manifest,
}

impl RenderedResource {
    /// Build a resource from resolved fields, compiling its manifest and
    /// collecting its cross-references
    pub fn from_fields(kind: ResourceKind, fields: FieldMap) -> Result<Self> {
        let manifest = WorkloadCompiler::compile(kind, &fields)?;

        let name = match kind {
            ResourceKind::Kustomization => KUSTOMIZATION_NAME.to_string(),
            _ => fields.str(paths::NAME)?.to_string(),
        };
        let namespace = if kind.is_namespaced() {
            Some(fields.str(paths::NAMESPACE)?.to_string())
        } else {
            None
        };
        let app = fields.opt_str(paths::APP_LABEL)?.map(str::to_string);
        let references = collect_references(kind, &fields)?;

        Ok(Self {
            kind,
            name,
            namespace,
            app,
            fields,
            references,
            manifest,
        })
    }

    /// Kind
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// `metadata.name`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `metadata.namespace`, absent for cluster-scoped kinds
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Value of the `app` label
    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }

    /// Resolved fields
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Declared cross-references
    pub fn references(&self) -> &[CrossReference] {
        &self.references
    }

    /// Typed manifest document
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Identity within a set
    pub fn resource_ref(&self) -> ResourceRef {
        ResourceRef {
            kind: self.kind,
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }

    /// Labels on the pod template, for a Deployment
    pub fn pod_labels(&self) -> BTreeMap<String, String> {
        self.string_fields_under("spec.template.metadata.labels.")
    }

    /// Container ports declared by a Deployment
    pub fn container_ports(&self) -> Vec<u16> {
        self.fields
            .iter()
            .filter(|(path, _)| path.ends_with(".containerPort"))
            .filter_map(|(_, v)| v.as_int())
            .filter_map(|i| u16::try_from(i).ok())
            .collect()
    }

    /// Target namespace of a Kustomization
    pub fn target_namespace(&self) -> Option<&str> {
        match self.kind {
            ResourceKind::Kustomization => self
                .fields
                .get(paths::KUSTOMIZATION_NAMESPACE)
                .and_then(FieldValue::as_str),
            _ => None,
        }
    }

    fn string_fields_under(&self, prefix: &str) -> BTreeMap<String, String> {
        self.fields
            .with_prefix(prefix)
            .filter_map(|(key, v)| v.as_str().map(|s| (key.to_string(), s.to_string())))
            .collect()
    }
}

fn collect_references(kind: ResourceKind, fields: &FieldMap) -> Result<Vec<CrossReference>> {
    let mut refs = Vec::new();
    match kind {
        ResourceKind::Deployment => {
            if let Some(claim) = fields.opt_str(paths::DEPLOY_VOLUME_CLAIM)? {
                refs.push(CrossReference::MountsClaim {
                    claim: claim.to_string(),
                });
            }
            if let Some(name) = fields.opt_str(paths::DEPLOY_ENV_FROM_CONFIGMAP)? {
                refs.push(CrossReference::LoadsEnvFrom {
                    kind: ResourceKind::ConfigMap,
                    name: name.to_string(),
                });
            }
            if let Some(name) = fields.opt_str(paths::DEPLOY_ENV_FROM_SECRET)? {
                refs.push(CrossReference::LoadsEnvFrom {
                    kind: ResourceKind::Secret,
                    name: name.to_string(),
                });
            }
        }
        ResourceKind::Service => {
            let selector = fields
                .with_prefix("spec.selector.")
                .filter_map(|(key, v)| v.as_str().map(|s| (key.to_string(), s.to_string())))
                .collect::<BTreeMap<_, _>>();
            if !selector.is_empty() {
                refs.push(CrossReference::SelectsPods { selector });
            }
            if let Some(port) = fields.opt_port(paths::SERVICE_TARGET_PORT)? {
                refs.push(CrossReference::TargetsPort { port });
            }
        }
        ResourceKind::Kustomization => {
            for file in fields.list(paths::KUSTOMIZATION_RESOURCES)? {
                refs.push(CrossReference::ListsFile { file });
            }
        }
        ResourceKind::Namespace
        | ResourceKind::ConfigMap
        | ResourceKind::Secret
        | ResourceKind::PersistentVolumeClaim => {}
    }
    Ok(refs)
}

// =============================================================================
// Sets
// =============================================================================

/// The candidate set produced by one expansion pass
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResourceSet {
    resources: Vec<RenderedResource>,
}

impl ResourceSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource
    pub fn push(&mut self, resource: RenderedResource) {
        self.resources.push(resource);
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &RenderedResource> {
        self.resources.iter()
    }

    /// Resources of one kind, in insertion order
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &RenderedResource> {
        self.resources.iter().filter(move |r| r.kind == kind)
    }

    /// Find a resource by kind, namespace and name
    pub fn find(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Option<&RenderedResource> {
        self.resources
            .iter()
            .find(|r| r.kind == kind && r.namespace() == namespace && r.name == name)
    }

    /// The Kustomization, if one was rendered
    pub fn kustomization(&self) -> Option<&RenderedResource> {
        self.of_kind(ResourceKind::Kustomization).next()
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub(crate) fn into_validated(self) -> ValidatedResourceSet {
        ValidatedResourceSet {
            resources: self.resources,
        }
    }
}

impl FromIterator<RenderedResource> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = RenderedResource>>(iter: I) -> Self {
        Self {
            resources: iter.into_iter().collect(),
        }
    }
}

/// A set that passed every cross-reference rule
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedResourceSet {
    resources: Vec<RenderedResource>,
}

impl ValidatedResourceSet {
    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &RenderedResource> {
        self.resources.iter()
    }

    pub(crate) fn into_resources(self) -> Vec<RenderedResource> {
        self.resources
    }
}

/// A validated set in application order
#[derive(Clone, Debug, PartialEq)]
pub struct OrderedResourceSet {
    resources: Vec<RenderedResource>,
}

impl OrderedResourceSet {
    pub(crate) fn new(resources: Vec<RenderedResource>) -> Self {
        Self { resources }
    }

    /// Iterate in application order
    pub fn iter(&self) -> impl Iterator<Item = &RenderedResource> {
        self.resources.iter()
    }

    /// Kinds in application order
    pub fn kinds(&self) -> Vec<ResourceKind> {
        self.resources.iter().map(|r| r.kind).collect()
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

//! Cross-reference validation over a whole resource set
//!
//! Each relationship the manifests rely on (selectors, claims, envFrom
//! targets, ports, namespaces, kustomization file lists) is a
//! [`ReferenceRule`]. Every rule runs on every set and every violation is
//! collected, so one pass reports all inconsistencies at once.

mod rules;

use std::fmt;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::resource::{ResourceRef, ResourceSet, ValidatedResourceSet};
use crate::{Error, Result};

pub use rules::{
    ConfigReferenceRule, KustomizationResourcesRule, NamespaceConsistencyRule,
    PortConsistencyRule, SelectorLabelsRule, UniqueNamesRule, VolumeBindingRule,
};

/// Identifier of a cross-reference rule
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    /// Namespaced resources live in the Kustomization namespace
    NamespaceConsistency,
    /// Service selectors match Deployment pod labels
    SelectorLabels,
    /// Mounted claims exist
    VolumeBinding,
    /// envFrom targets exist
    ConfigReference,
    /// Service target ports are container ports
    PortConsistency,
    /// Kustomization files map to rendered resources
    KustomizationResources,
    /// No two resources share kind, namespace and name
    UniqueNames,
}

impl RuleId {
    /// Stable rule name used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NamespaceConsistency => "namespace-consistency",
            Self::SelectorLabels => "selector-labels",
            Self::VolumeBinding => "volume-binding",
            Self::ConfigReference => "config-reference",
            Self::PortConsistency => "port-consistency",
            Self::KustomizationResources => "kustomization-resources",
            Self::UniqueNames => "unique-names",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violated relationship
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReferenceError {
    /// Rule that failed
    pub rule: RuleId,
    /// Resource the failure is attributed to
    pub resource: ResourceRef,
    /// What is wrong
    pub detail: String,
}

impl ReferenceError {
    /// Create a reference error
    pub fn new(rule: RuleId, resource: ResourceRef, detail: impl Into<String>) -> Self {
        Self {
            rule,
            resource,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.rule, self.resource, self.detail)
    }
}

/// Every violation found in one set
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Violations, grouped by rule in run order
    pub errors: Vec<ReferenceError>,
}

impl ValidationReport {
    /// Whether any rule failed
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of violations
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether a given rule failed
    pub fn has_rule(&self, rule: RuleId) -> bool {
        self.errors.iter().any(|e| e.rule == rule)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cross-reference error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  {}", error)?;
        }
        Ok(())
    }
}

/// A pluggable cross-reference check.
///
/// Rules only read the set. They append one [`ReferenceError`] per violation
/// and never stop early.
pub trait ReferenceRule: Send + Sync {
    /// Rule identifier
    fn id(&self) -> RuleId;

    /// Append every violation in `set` to `errors`
    fn check(&self, set: &ResourceSet, errors: &mut Vec<ReferenceError>);
}

/// Runs a fixed list of rules in order
pub struct Validator {
    rules: Vec<Box<dyn ReferenceRule>>,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            rules: vec![
                Box::new(NamespaceConsistencyRule),
                Box::new(SelectorLabelsRule),
                Box::new(VolumeBindingRule),
                Box::new(ConfigReferenceRule),
                Box::new(PortConsistencyRule),
                Box::new(KustomizationResourcesRule),
                Box::new(UniqueNamesRule),
            ],
        }
    }
}

impl Validator {
    /// A validator with no rules
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule
    pub fn with_rule(mut self, rule: impl ReferenceRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Identifiers of the configured rules, in run order
    pub fn rule_ids(&self) -> Vec<RuleId> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Run every rule and collect all violations
    #[instrument(skip_all, fields(resources = set.len()))]
    pub fn validate(&self, set: &ResourceSet) -> Vec<ReferenceError> {
        let mut errors = Vec::new();
        for rule in &self.rules {
            let before = errors.len();
            rule.check(set, &mut errors);
            debug!(rule = %rule.id(), violations = errors.len() - before, "rule checked");
        }
        errors
    }

    /// Validate and, when consistent, promote the set
    pub fn check(&self, set: ResourceSet) -> Result<ValidatedResourceSet> {
        let errors = self.validate(&set);
        if errors.is_empty() {
            Ok(set.into_validated())
        } else {
            Err(Error::Validation(ValidationReport { errors }))
        }
    }
}

/// Run the default rules over a set
pub fn validate(set: &ResourceSet) -> Vec<ReferenceError> {
    Validator::default().validate(set)
}

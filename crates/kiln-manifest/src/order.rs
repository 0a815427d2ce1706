//! Application ordering
//!
//! Kinds fall into precedence classes: Namespace, then the things pods
//! consume (ConfigMap, Secret, PersistentVolumeClaim), then Deployment, then
//! Service, then Kustomization. The sort is stable so resources of one class
//! keep the order the expander produced them in.

use crate::resource::{OrderedResourceSet, ValidatedResourceSet};

/// Sort a validated set into application order
pub fn order(set: ValidatedResourceSet) -> OrderedResourceSet {
    let mut resources = set.into_resources();
    resources.sort_by_key(|r| r.kind().precedence());
    OrderedResourceSet::new(resources)
}

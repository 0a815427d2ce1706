//! Built-in cross-reference rules

use std::collections::BTreeMap;

use super::{ReferenceError, ReferenceRule, RuleId};
use crate::kind::ResourceKind;
use crate::resource::{CrossReference, RenderedResource, ResourceSet};

/// Deployments in `namespace` whose `app` label is `app`
fn deployments_for<'a>(
    set: &'a ResourceSet,
    namespace: Option<&'a str>,
    app: Option<&'a str>,
) -> impl Iterator<Item = &'a RenderedResource> + 'a {
    set.of_kind(ResourceKind::Deployment)
        .filter(move |d| d.namespace() == namespace && app.is_some() && d.app() == app)
}

fn error(rule: RuleId, resource: &RenderedResource, detail: String) -> ReferenceError {
    ReferenceError::new(rule, resource.resource_ref(), detail)
}

/// Every namespaced resource, and the Namespace itself, matches the
/// Kustomization namespace. Without a Kustomization there is nothing to
/// compare against.
pub struct NamespaceConsistencyRule;

impl ReferenceRule for NamespaceConsistencyRule {
    fn id(&self) -> RuleId {
        RuleId::NamespaceConsistency
    }

    fn check(&self, set: &ResourceSet, errors: &mut Vec<ReferenceError>) {
        let Some(target) = set.kustomization().and_then(|k| k.target_namespace()) else {
            return;
        };
        for resource in set.iter() {
            let actual = match resource.kind() {
                ResourceKind::Namespace => Some(resource.name()),
                ResourceKind::Kustomization => None,
                _ => resource.namespace(),
            };
            if let Some(actual) = actual.filter(|ns| *ns != target) {
                errors.push(error(
                    self.id(),
                    resource,
                    format!(
                        "namespace '{}' differs from kustomization namespace '{}'",
                        actual, target
                    ),
                ));
            }
        }
    }
}

/// Every Service selector is a subset of the pod labels of the Deployment
/// sharing its `app` label
pub struct SelectorLabelsRule;

impl ReferenceRule for SelectorLabelsRule {
    fn id(&self) -> RuleId {
        RuleId::SelectorLabels
    }

    fn check(&self, set: &ResourceSet, errors: &mut Vec<ReferenceError>) {
        for service in set.of_kind(ResourceKind::Service) {
            for reference in service.references() {
                let CrossReference::SelectsPods { selector } = reference else {
                    continue;
                };
                let deployments: Vec<_> =
                    deployments_for(set, service.namespace(), service.app()).collect();
                if deployments.is_empty() {
                    errors.push(error(
                        self.id(),
                        service,
                        format!(
                            "no Deployment with label app={} for selector {}",
                            service.app().unwrap_or("<none>"),
                            format_labels(selector)
                        ),
                    ));
                    continue;
                }
                for deployment in deployments {
                    let labels = deployment.pod_labels();
                    let missing: BTreeMap<_, _> = selector
                        .iter()
                        .filter(|(k, v)| labels.get(*k) != Some(*v))
                        .collect();
                    if !missing.is_empty() {
                        errors.push(error(
                            self.id(),
                            service,
                            format!(
                                "selector {} does not match pod labels {} of Deployment {}",
                                format_labels(selector),
                                format_labels(&labels),
                                deployment.name()
                            ),
                        ));
                    }
                }
            }
        }
    }
}

/// Every claim mounted by a Deployment is a PersistentVolumeClaim in the set
pub struct VolumeBindingRule;

impl ReferenceRule for VolumeBindingRule {
    fn id(&self) -> RuleId {
        RuleId::VolumeBinding
    }

    fn check(&self, set: &ResourceSet, errors: &mut Vec<ReferenceError>) {
        for deployment in set.of_kind(ResourceKind::Deployment) {
            for reference in deployment.references() {
                let CrossReference::MountsClaim { claim } = reference else {
                    continue;
                };
                if set
                    .find(
                        ResourceKind::PersistentVolumeClaim,
                        deployment.namespace(),
                        claim,
                    )
                    .is_none()
                {
                    errors.push(error(
                        self.id(),
                        deployment,
                        format!(
                            "volume claim '{}' has no PersistentVolumeClaim in namespace '{}'",
                            claim,
                            deployment.namespace().unwrap_or_default()
                        ),
                    ));
                }
            }
        }
    }
}

/// Every envFrom target is a ConfigMap or Secret in the set
pub struct ConfigReferenceRule;

impl ReferenceRule for ConfigReferenceRule {
    fn id(&self) -> RuleId {
        RuleId::ConfigReference
    }

    fn check(&self, set: &ResourceSet, errors: &mut Vec<ReferenceError>) {
        for deployment in set.of_kind(ResourceKind::Deployment) {
            for reference in deployment.references() {
                let CrossReference::LoadsEnvFrom { kind, name } = reference else {
                    continue;
                };
                if set.find(*kind, deployment.namespace(), name).is_none() {
                    errors.push(error(
                        self.id(),
                        deployment,
                        format!("envFrom references missing {} '{}'", kind, name),
                    ));
                }
            }
        }
    }
}

/// Every Service target port is a container port of its Deployment. A
/// Service with no Deployment is left to [`SelectorLabelsRule`].
pub struct PortConsistencyRule;

impl ReferenceRule for PortConsistencyRule {
    fn id(&self) -> RuleId {
        RuleId::PortConsistency
    }

    fn check(&self, set: &ResourceSet, errors: &mut Vec<ReferenceError>) {
        for service in set.of_kind(ResourceKind::Service) {
            for reference in service.references() {
                let CrossReference::TargetsPort { port } = reference else {
                    continue;
                };
                for deployment in deployments_for(set, service.namespace(), service.app()) {
                    let ports = deployment.container_ports();
                    if !ports.contains(port) {
                        errors.push(error(
                            self.id(),
                            service,
                            format!(
                                "targetPort {} is not a container port of Deployment {} (ports: {:?})",
                                port,
                                deployment.name(),
                                ports
                            ),
                        ));
                    }
                }
            }
        }
    }
}

/// Every file listed by the Kustomization was rendered in the same set
pub struct KustomizationResourcesRule;

impl ReferenceRule for KustomizationResourcesRule {
    fn id(&self) -> RuleId {
        RuleId::KustomizationResources
    }

    fn check(&self, set: &ResourceSet, errors: &mut Vec<ReferenceError>) {
        for kustomization in set.of_kind(ResourceKind::Kustomization) {
            for reference in kustomization.references() {
                let CrossReference::ListsFile { file } = reference else {
                    continue;
                };
                let detail = match ResourceKind::from_file_name(file) {
                    None => format!("resource '{}' is not a known manifest file", file),
                    Some(kind) if set.of_kind(kind).next().is_none() => {
                        format!("resource '{}' lists a {} that was not rendered", file, kind)
                    }
                    Some(_) => continue,
                };
                errors.push(error(self.id(), kustomization, detail));
            }
        }
    }
}

/// No two resources share kind, namespace and name
pub struct UniqueNamesRule;

impl ReferenceRule for UniqueNamesRule {
    fn id(&self) -> RuleId {
        RuleId::UniqueNames
    }

    fn check(&self, set: &ResourceSet, errors: &mut Vec<ReferenceError>) {
        let mut seen = BTreeMap::new();
        for resource in set.iter() {
            let count = seen.entry(resource.resource_ref()).or_insert(0usize);
            *count += 1;
            if *count == 2 {
                errors.push(error(
                    self.id(),
                    resource,
                    "declared more than once".to_string(),
                ));
            }
        }
    }
}

fn format_labels(labels: &BTreeMap<String, String>) -> String {
    let pairs: Vec<_> = labels.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{{{}}}", pairs.join(","))
}

//! Template expansion: parameters in, resolved resources out
//!
//! Each schema field is resolved from its source, coerced to its declared
//! type and collected into a [`FieldMap`]. Expansion is all or nothing: the
//! first missing parameter or type mismatch aborts the resource, and no
//! partially filled resource is ever returned.

use kiln_common::template::{referenced_identifiers, TemplateContext, TemplateEngine};
use tracing::debug;

use crate::kind::{ResourceKind, ALL_KINDS};
use crate::params::{ParamValue, ParameterSet};
use crate::resource::{FieldMap, FieldValue, RenderedResource, ResourceSet};
use crate::schema::{DefaultValue, FieldSource, FieldSpec, FieldType, ParamRef, SchemaRegistry};
use crate::{Error, Result};

/// Expands schemas against one parameter set
pub struct TemplateExpander<'p> {
    params: &'p ParameterSet,
    scope: Vec<ResourceKind>,
    engine: TemplateEngine,
    context: TemplateContext,
}

impl<'p> TemplateExpander<'p> {
    /// Create an expander whose scope is every registered kind
    pub fn new(params: &'p ParameterSet) -> Result<Self> {
        let engine = TemplateEngine::new().map_err(|e| Error::internal(e.to_string()))?;
        Ok(Self {
            params,
            scope: ALL_KINDS.to_vec(),
            engine,
            context: params.template_context(),
        })
    }

    /// Restrict the kinds rendered together. Kinds are kept in canonical
    /// order and duplicates are dropped.
    pub fn with_scope(mut self, kinds: &[ResourceKind]) -> Self {
        self.scope = ALL_KINDS
            .iter()
            .copied()
            .filter(|k| kinds.contains(k))
            .collect();
        self
    }

    /// Kinds rendered by [`TemplateExpander::expand_all`]
    pub fn scope(&self) -> &[ResourceKind] {
        &self.scope
    }

    /// Expand every kind in scope
    pub fn expand_all(&self) -> Result<ResourceSet> {
        self.scope.iter().map(|kind| self.expand(*kind)).collect()
    }

    /// Expand one kind
    pub fn expand(&self, kind: ResourceKind) -> Result<RenderedResource> {
        let schema = SchemaRegistry::global().get(kind);
        let mut fields = FieldMap::new();

        for spec in schema.fields {
            if let Some(value) = self.resolve(spec)? {
                if value.has_placeholder() {
                    return Err(Error::template(spec.path, "value still holds a placeholder"));
                }
                fields.insert(spec.path, value);
            }
        }

        let resource = RenderedResource::from_fields(kind, fields)?;
        debug!(
            kind = %kind,
            name = resource.name(),
            fields = resource.fields().len(),
            "expanded resource"
        );
        Ok(resource)
    }

    fn resolve(&self, spec: &FieldSpec) -> Result<Option<FieldValue>> {
        match &spec.source {
            FieldSource::Param(param) => self.resolve_param(spec, param).map(Some),
            FieldSource::Optional(key) => self
                .params
                .get(key)
                .map(|value| spec.ty.coerce(spec.path, value))
                .transpose(),
            FieldSource::Fixed(value) => spec.ty.coerce(spec.path, &literal(value)).map(Some),
            FieldSource::WhenPresent { trigger, param } => {
                if self.params.is_present(trigger) {
                    self.resolve_param(spec, param).map(Some)
                } else {
                    Ok(None)
                }
            }
            FieldSource::Family(prefix) => self.resolve_family(spec, prefix).map(Some),
            FieldSource::RenderedFiles => Ok(Some(FieldValue::List(self.rendered_files()))),
        }
    }

    fn resolve_param(&self, spec: &FieldSpec, param: &ParamRef) -> Result<FieldValue> {
        if let Some(value) = self.params.get(param.key) {
            return spec.ty.coerce(spec.path, value);
        }
        match &param.default {
            None => Err(Error::missing_parameter(spec.path, param.key)),
            Some(DefaultValue::Derived(template)) => {
                let rendered = self.render_derived(spec.path, template)?;
                spec.ty.coerce(spec.path, &ParamValue::Str(rendered))
            }
            Some(value) => spec.ty.coerce(spec.path, &literal(value)),
        }
    }

    /// Derived defaults may only reference caller-supplied parameters. The
    /// first absent one is reported against the field being resolved.
    fn render_derived(&self, path: &str, template: &str) -> Result<String> {
        if let Some(absent) = referenced_identifiers(template)
            .into_iter()
            .find(|name| !self.params.contains(name))
        {
            return Err(Error::missing_parameter(path, absent));
        }
        self.engine
            .render(template, &self.context)
            .map_err(|e| Error::template(path, e.to_string()))
    }

    fn resolve_family(&self, spec: &FieldSpec, prefix: &str) -> Result<FieldValue> {
        if spec.ty != FieldType::StringMap {
            return Err(Error::internal(format!(
                "family field {} must be a string map",
                spec.path
            )));
        }
        let mut entries = std::collections::BTreeMap::new();
        for (key, value) in self.params.family(prefix) {
            if !is_config_key(key) {
                return Err(Error::invalid_parameter(
                    format!("{}{}", prefix, key),
                    "keys may only contain alphanumerics, '-', '_' and '.'",
                ));
            }
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(FieldValue::Map(entries))
    }

    fn rendered_files(&self) -> Vec<String> {
        self.scope
            .iter()
            .filter(|k| **k != ResourceKind::Kustomization)
            .map(|k| k.file_name().to_string())
            .collect()
    }
}

/// Expand one kind with every registered kind in scope
pub fn expand(kind: ResourceKind, params: &ParameterSet) -> Result<RenderedResource> {
    TemplateExpander::new(params)?.expand(kind)
}

fn literal(value: &DefaultValue) -> ParamValue {
    match value {
        DefaultValue::Str(s) | DefaultValue::Derived(s) => ParamValue::Str((*s).to_string()),
        DefaultValue::Int(i) => ParamValue::Int(*i),
        DefaultValue::Bool(b) => ParamValue::Bool(*b),
    }
}

/// ConfigMap and Secret data keys
fn is_config_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

//! The full render: expand, validate, order, emit
//!
//! Any failure stops the pipeline before emission, so a caller gets either
//! every document of a consistent set or nothing.

use tracing::{info, instrument, warn};

use crate::emit::{emit, emit_files, EmittedFile};
use crate::expand::TemplateExpander;
use crate::kind::{ResourceKind, ALL_KINDS};
use crate::order::order;
use crate::params::{ParameterSet, ENV_FAMILY, SECRET_FAMILY};
use crate::resource::OrderedResourceSet;
use crate::schema::SchemaRegistry;
use crate::validate::{ReferenceError, Validator};
use crate::{Error, Result};

/// Options for one render
#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
    /// Kinds to render; the defaults for the parameter set when `None`
    pub kinds: Option<Vec<ResourceKind>>,
    /// Fail on parameters no rendered kind reads
    pub strict: bool,
}

/// A successful render
#[derive(Clone, Debug)]
pub struct RenderOutput {
    /// Resources in application order
    pub resources: OrderedResourceSet,
    /// One YAML file per kind
    pub files: Vec<EmittedFile>,
    /// All documents as one `---`-separated stream
    pub stream: String,
}

/// Runs the render pipeline with a fixed validator
#[derive(Default)]
pub struct Renderer {
    validator: Validator,
    options: RenderOptions,
}

impl Renderer {
    /// Create a renderer with the default rules
    pub fn new(options: RenderOptions) -> Self {
        Self {
            validator: Validator::default(),
            options,
        }
    }

    /// Replace the validator
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Kinds this renderer will produce for `params`
    pub fn kinds_for(&self, params: &ParameterSet) -> Vec<ResourceKind> {
        self.options
            .kinds
            .clone()
            .unwrap_or_else(|| default_kinds(params))
    }

    /// Expand and validate without emitting. Returns every cross-reference
    /// error, empty when the set is consistent.
    #[instrument(skip_all, fields(params = params.len()))]
    pub fn check(&self, params: &ParameterSet) -> Result<Vec<ReferenceError>> {
        let kinds = self.kinds_for(params);
        self.check_unused(params, &kinds)?;
        let set = TemplateExpander::new(params)?
            .with_scope(&kinds)
            .expand_all()?;
        Ok(self.validator.validate(&set))
    }

    /// Run the full pipeline
    #[instrument(skip_all, fields(params = params.len()))]
    pub fn render(&self, params: &ParameterSet) -> Result<RenderOutput> {
        let kinds = self.kinds_for(params);
        self.check_unused(params, &kinds)?;

        let set = TemplateExpander::new(params)?
            .with_scope(&kinds)
            .expand_all()?;
        let resources = order(self.validator.check(set)?);
        let stream = emit(&resources)?;
        let files = emit_files(&resources)?;

        info!(
            resources = resources.len(),
            files = files.len(),
            bytes = stream.len(),
            "render complete"
        );
        Ok(RenderOutput {
            resources,
            files,
            stream,
        })
    }

    fn check_unused(&self, params: &ParameterSet, kinds: &[ResourceKind]) -> Result<()> {
        let unused = unused_parameters(params, kinds);
        if unused.is_empty() {
            return Ok(());
        }
        if self.options.strict {
            return Err(Error::UnknownParameter { names: unused });
        }
        for name in &unused {
            warn!(parameter = %name, "parameter is not read by any rendered kind");
        }
        Ok(())
    }
}

/// Kinds rendered when the caller does not choose. ConfigMap and Secret only
/// appear when their parameter family has members.
pub fn default_kinds(params: &ParameterSet) -> Vec<ResourceKind> {
    ALL_KINDS
        .iter()
        .copied()
        .filter(|kind| match kind {
            ResourceKind::ConfigMap => params.is_present(ENV_FAMILY),
            ResourceKind::Secret => params.is_present(SECRET_FAMILY),
            _ => true,
        })
        .collect()
}

/// Parameter keys no schema among `kinds` reads, sorted
pub fn unused_parameters(params: &ParameterSet, kinds: &[ResourceKind]) -> Vec<String> {
    let registry = SchemaRegistry::global();
    params
        .keys()
        .filter(|key| !kinds.iter().any(|k| registry.get(*k).consumes(key)))
        .map(str::to_string)
        .collect()
}

/// Render `kinds` (or the defaults) and return the YAML stream
pub fn render(params: &ParameterSet, kinds: Option<&[ResourceKind]>) -> Result<String> {
    let options = RenderOptions {
        kinds: kinds.map(<[ResourceKind]>::to_vec),
        strict: false,
    };
    Ok(Renderer::new(options).render(params)?.stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;
    use crate::validate::RuleId;

    fn params() -> ParameterSet {
        ParameterSet::from_pairs([
            ("app-name", ParamValue::from("n8n")),
            ("image", ParamValue::from("docker.n8n.io/n8nio/n8n:1.118.2")),
            ("port", ParamValue::from(3008)),
            ("storage-size", ParamValue::from("1Gi")),
        ])
        .unwrap()
    }

    // =========================================================================
    // Story: Kind Selection
    // =========================================================================

    #[test]
    fn story_families_switch_on_config_kinds() {
        assert_eq!(
            default_kinds(&params()),
            vec![
                ResourceKind::Namespace,
                ResourceKind::PersistentVolumeClaim,
                ResourceKind::Deployment,
                ResourceKind::Service,
                ResourceKind::Kustomization,
            ]
        );
        let with_env = params().with("env.TZ", "UTC").unwrap();
        assert!(default_kinds(&with_env).contains(&ResourceKind::ConfigMap));
        assert!(!default_kinds(&with_env).contains(&ResourceKind::Secret));
    }

    // =========================================================================
    // Story: Unused Parameters
    // =========================================================================

    #[test]
    fn story_unused_parameters_are_reported_in_strict_mode() {
        let p = params().with("colour", "blue").unwrap();
        let renderer = Renderer::new(RenderOptions {
            kinds: None,
            strict: true,
        });
        let err = renderer.render(&p).unwrap_err();
        assert!(matches!(err, Error::UnknownParameter { ref names } if names == &["colour"]));
    }

    #[test]
    fn story_unused_parameters_are_tolerated_by_default() {
        let p = params().with("colour", "blue").unwrap();
        assert!(Renderer::default().render(&p).is_ok());
    }

    #[test]
    fn story_family_not_rendered_is_unused() {
        let p = params().with("env.TZ", "UTC").unwrap();
        let unused = unused_parameters(&p, &[ResourceKind::Deployment]);
        assert_eq!(unused, vec!["env.TZ"]);
    }

    // =========================================================================
    // Story: All or Nothing
    // =========================================================================

    #[test]
    fn story_inconsistent_set_emits_nothing() {
        let renderer = Renderer::new(RenderOptions {
            kinds: Some(vec![ResourceKind::Namespace, ResourceKind::Deployment]),
            strict: false,
        });
        match renderer.render(&params()) {
            Err(Error::Validation(report)) => {
                assert!(report.has_rule(RuleId::VolumeBinding));
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn story_check_reports_without_failing() {
        let renderer = Renderer::new(RenderOptions {
            kinds: Some(vec![ResourceKind::Deployment]),
            strict: false,
        });
        let errors = renderer.check(&params()).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, RuleId::VolumeBinding);
    }

    #[test]
    fn story_render_is_idempotent() {
        let first = render(&params(), None).unwrap();
        let second = render(&params(), None).unwrap();
        assert_eq!(first, second);
        assert!(!first.contains("${"));
    }

    #[test]
    fn story_expansion_errors_stop_the_pipeline() {
        let p = ParameterSet::from_pairs([("app-name", "n8n")]).unwrap();
        assert!(matches!(
            render(&p, None),
            Err(Error::MissingParameter { .. })
        ));
    }
}

//! kiln manifest engine: schemas, expansion, cross-reference validation,
//! ordering and YAML emission for a closed set of Kubernetes kinds

#![deny(missing_docs)]

pub mod emit;
pub mod error;
pub mod expand;
pub mod kind;
pub mod order;
pub mod params;
pub mod pipeline;
pub mod resource;
pub mod schema;
pub mod validate;
pub mod workload;

pub use emit::{emit, emit_files, EmittedFile};
pub use error::Error;
pub use expand::{expand, TemplateExpander};
pub use kind::{ResourceKind, ALL_KINDS};
pub use order::order;
pub use params::{ParamValue, ParameterSet, ENV_FAMILY, SECRET_FAMILY};
pub use pipeline::{default_kinds, render, RenderOptions, RenderOutput, Renderer};
pub use resource::{
    CrossReference, FieldMap, FieldValue, OrderedResourceSet, RenderedResource, ResourceRef,
    ResourceSet, ValidatedResourceSet,
};
pub use schema::{lookup, FieldSpec, FieldType, Schema, SchemaRegistry};
pub use validate::{validate, ReferenceError, ReferenceRule, RuleId, ValidationReport, Validator};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

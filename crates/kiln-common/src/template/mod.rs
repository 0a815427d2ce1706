//! `${...}` templating for derived parameter defaults such as
//! `${app-name}-data`
//!
//! Rendering goes through minijinja with custom delimiters. Hyphenated
//! identifiers are accepted and undefined variables are errors.

mod context;
mod engine;
mod error;
mod filters;

pub use context::TemplateContext;
pub use engine::{contains_template_syntax, referenced_identifiers, TemplateEngine};
pub use error::TemplateError;

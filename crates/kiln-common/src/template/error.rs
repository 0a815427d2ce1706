//! Template errors

use thiserror::Error;

/// Failure to build the engine or render a template
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The delimiter configuration was rejected
    #[error("template syntax error: {0}")]
    Syntax(String),

    /// An expression named a variable the context does not define
    #[error("undefined variable: {0}")]
    Undefined(String),

    /// Rendering failed for another reason (bad filter argument, parse error)
    #[error("template render error: {0}")]
    Render(#[source] minijinja::Error),
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        match err.kind() {
            minijinja::ErrorKind::UndefinedError => Self::Undefined(err.to_string()),
            _ => Self::Render(err),
        }
    }
}

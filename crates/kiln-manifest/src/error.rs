//! Error types for manifest rendering
//!
//! Expansion errors are fatal and name the field that failed. Cross-reference
//! errors are collected into a [`ValidationReport`] so every inconsistency in
//! a resource set is reported at once.

use thiserror::Error;

use crate::validate::ValidationReport;

/// Main error type for kiln rendering
#[derive(Debug, Error)]
pub enum Error {
    /// A kind name is not in the schema registry
    #[error("unknown resource kind '{kind}' (registered: {registered})")]
    UnknownKind {
        /// The name that failed to resolve
        kind: String,
        /// Comma-separated registered kind names
        registered: String,
    },

    /// A required, default-less parameter is absent
    #[error("missing parameter '{parameter}' for field {field}")]
    MissingParameter {
        /// Field path being resolved (e.g. "spec.replicas")
        field: String,
        /// Parameter key the field needed
        parameter: String,
    },

    /// A value cannot be coerced to the field's declared type
    #[error("type mismatch at {field}: expected {expected}, got {got}")]
    TypeMismatch {
        /// Field path being resolved
        field: String,
        /// Description of the declared type
        expected: String,
        /// Description of the supplied value
        got: String,
    },

    /// The same parameter key was supplied twice
    #[error("duplicate parameter '{name}'")]
    DuplicateParameter {
        /// The repeated key
        name: String,
    },

    /// Parameters that no rendered kind consumes (strict mode)
    #[error("unknown parameters: {}", names.join(", "))]
    UnknownParameter {
        /// Unconsumed keys, sorted
        names: Vec<String>,
    },

    /// A parameter value or document is malformed
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Offending key (or "<document>" for the whole input)
        name: String,
        /// Description of what's invalid
        message: String,
    },

    /// A derived default failed to render
    #[error("template error at {field}: {message}")]
    Template {
        /// Field path being resolved
        field: String,
        /// Engine message
        message: String,
    },

    /// Cross-reference validation failed
    #[error("{0}")]
    Validation(ValidationReport),

    /// Serialization of a manifest failed
    #[error("serialization error for {kind}: {message}")]
    Serialization {
        /// Resource kind being serialized
        kind: String,
        /// Description of what failed
        message: String,
    },

    /// Schema and manifest builder disagree
    #[error("internal error: {message}")]
    Internal {
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a missing-parameter error
    pub fn missing_parameter(field: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            field: field.into(),
            parameter: parameter.into(),
        }
    }

    /// Create a type-mismatch error
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create an invalid-parameter error
    pub fn invalid_parameter(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a template error
    pub fn template(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Template {
            field: field.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            kind: kind.into(),
            message: msg.into(),
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
        }
    }

    /// The field path this error is attributed to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingParameter { field, .. }
            | Self::TypeMismatch { field, .. }
            | Self::Template { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_names_field_and_key() {
        let err = Error::missing_parameter("spec.template.spec.containers[0].image", "image");
        let msg = err.to_string();
        assert!(msg.contains("'image'"));
        assert!(msg.contains("containers[0].image"));
        assert_eq!(err.field(), Some("spec.template.spec.containers[0].image"));
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = Error::type_mismatch(
            "spec.resources.requests.storage",
            "positive integer quantity",
            "string \"lots\"",
        );
        assert_eq!(
            err.to_string(),
            "type mismatch at spec.resources.requests.storage: expected positive integer quantity, got string \"lots\""
        );
    }

    #[test]
    fn test_unknown_parameter_lists_names() {
        let err = Error::UnknownParameter {
            names: vec!["colour".to_string(), "imge".to_string()],
        };
        assert_eq!(err.to_string(), "unknown parameters: colour, imge");
        assert_eq!(err.field(), None);
    }
}

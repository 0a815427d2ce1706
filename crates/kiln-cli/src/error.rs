//! Error types for the CLI

use std::path::{Path, PathBuf};

use kiln_common::telemetry::TelemetryError;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error(transparent)]
    Render(#[from] kiln_manifest::Error),

    #[error("{}: {message}", path.display())]
    Params { path: PathBuf, message: String },

    #[error("no parameter file: pass -f, set KILN_PARAMS, or create ./kiln.yaml")]
    NoParams,

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn params(path: &Path, message: impl Into<String>) -> Self {
        Error::Params {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }
}

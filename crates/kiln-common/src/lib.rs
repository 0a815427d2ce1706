//! Shared utilities for kiln: tracing setup, YAML parse/write, templating

#![deny(missing_docs)]

pub mod telemetry;
pub mod template;
pub mod yaml;

pub use yaml::{parse_yaml, parse_yaml_multi, to_yaml_string, YamlError};

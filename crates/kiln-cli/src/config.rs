//! Parameter loading for the CLI
//!
//! The parameter-file chain (highest priority first):
//! 1. Explicit `-f` flags
//! 2. `KILN_PARAMS` environment variable
//! 3. `./kiln.yaml` when it exists
//!
//! `--set key=value` overrides are applied on top of each loaded file.

use std::path::{Path, PathBuf};

use clap::Args;
use kiln_common::parse_yaml;
use kiln_manifest::{ParamValue, ParameterSet, ResourceKind};

use crate::{Error, Result};

/// Environment variable naming a parameter file
pub const PARAMS_ENV: &str = "KILN_PARAMS";
/// Parameter file picked up from the working directory
pub const DEFAULT_PARAMS_FILE: &str = "kiln.yaml";

/// Arguments shared by commands that expand parameter files
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// Parameter file; repeat to render several applications
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Override a parameter, e.g. `--set port=5678`
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    pub overrides: Vec<(String, String)>,

    /// Render only these kinds (defaults to what the parameters call for)
    #[arg(short = 'k', long = "kind", value_name = "KIND")]
    pub kinds: Vec<ResourceKind>,

    /// Fail on parameters that no rendered kind reads
    #[arg(long)]
    pub strict: bool,
}

impl ParamArgs {
    /// Kind selection, `None` when no `--kind` was given
    pub fn kind_selection(&self) -> Option<Vec<ResourceKind>> {
        (!self.kinds.is_empty()).then(|| self.kinds.clone())
    }

    /// Resolve and load every parameter file, overrides applied
    pub fn load(&self) -> Result<Vec<(PathBuf, ParameterSet)>> {
        let cwd = std::env::current_dir()?;
        let env = std::env::var(PARAMS_ENV).ok();
        resolve_param_files(&self.files, env.as_deref(), &cwd)?
            .into_iter()
            .map(|path| {
                let params = load_params(&path, &self.overrides)?;
                Ok((path, params))
            })
            .collect()
    }
}

/// Split `KEY=VALUE` at the first '='
pub fn parse_override(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("invalid override '{}': expected KEY=VALUE", raw)),
    }
}

/// Pick parameter files from the flag, environment and working directory
pub fn resolve_param_files(
    explicit: &[PathBuf],
    env: Option<&str>,
    cwd: &Path,
) -> Result<Vec<PathBuf>> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }
    if let Some(path) = env.map(str::trim).filter(|p| !p.is_empty()) {
        return Ok(vec![PathBuf::from(path)]);
    }
    let fallback = cwd.join(DEFAULT_PARAMS_FILE);
    if fallback.is_file() {
        return Ok(vec![fallback]);
    }
    Err(Error::NoParams)
}

/// Read one parameter document and apply overrides
pub fn load_params(path: &Path, overrides: &[(String, String)]) -> Result<ParameterSet> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::params(path, format!("failed to read: {}", e)))?;
    let document = parse_yaml(&text).map_err(|e| Error::params(path, e.to_string()))?;
    let mut params =
        ParameterSet::from_value(&document).map_err(|e| Error::params(path, e.to_string()))?;

    for (key, raw) in overrides {
        params.set_override(key.clone(), ParamValue::parse_loose(raw))?;
    }
    Ok(params)
}

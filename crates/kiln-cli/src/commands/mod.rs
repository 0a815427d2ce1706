//! CLI commands

use std::path::PathBuf;
use std::sync::Arc;

use kiln_manifest::ParameterSet;
use tokio::task::JoinSet;
use tracing::debug;

use crate::{Error, Result};

pub mod render;
pub mod schema;
pub mod validate;

/// Run `job` over every loaded parameter set on the blocking pool.
///
/// Renders are CPU-bound and independent, so each file gets its own blocking
/// task. Results come back in input order, one per file, so a failure in one
/// application does not hide the others.
pub async fn run_each<T, F>(
    inputs: Vec<(PathBuf, ParameterSet)>,
    job: F,
) -> Result<Vec<(PathBuf, Result<T>)>>
where
    T: Send + 'static,
    F: Fn(&ParameterSet) -> Result<T> + Send + Sync + 'static,
{
    let job = Arc::new(job);
    let mut tasks = JoinSet::new();
    let count = inputs.len();

    for (index, (path, params)) in inputs.into_iter().enumerate() {
        let job = Arc::clone(&job);
        tasks.spawn_blocking(move || {
            debug!(path = %path.display(), "rendering");
            let result = job(&params);
            (index, path, result)
        });
    }

    let mut results = Vec::with_capacity(count);
    while let Some(joined) = tasks.join_next().await {
        let (index, path, result) =
            joined.map_err(|e| Error::Other(format!("render task failed: {}", e)))?;
        results.push((index, path, result));
    }
    results.sort_by_key(|(index, _, _)| *index);
    Ok(results
        .into_iter()
        .map(|(_, path, result)| (path, result))
        .collect())
}

//! Render command

use std::path::{Path, PathBuf};

use clap::Args;
use kiln_common::yaml::DOCUMENT_SEPARATOR;
use kiln_manifest::{EmittedFile, ParameterSet, RenderOptions, Renderer};
use tracing::{error, info};

use super::run_each;
use crate::config::ParamArgs;
use crate::{Error, Result};

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub params: ParamArgs,

    /// Write `DIR/<app-name>/<kind>.yaml` instead of printing the stream
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

pub async fn run(args: RenderArgs) -> Result<()> {
    let inputs = args.params.load()?;
    let total = inputs.len();
    let options = RenderOptions {
        kinds: args.params.kind_selection(),
        strict: args.params.strict,
    };

    let results = run_each(inputs, move |params| {
        let output = Renderer::new(options.clone()).render(params)?;
        Ok((app_name(params), output))
    })
    .await?;

    let mut streams = Vec::new();
    let mut failed = 0;
    for (path, result) in results {
        match result {
            Ok((app, output)) => match &args.output_dir {
                Some(dir) => {
                    let app = app.unwrap_or_else(|| file_stem(&path));
                    let written = write_files(dir, &app, &output.files)?;
                    info!(
                        params = %path.display(),
                        dir = %written.display(),
                        files = output.files.len(),
                        "wrote manifests"
                    );
                }
                None => streams.push(output.stream),
            },
            Err(e) => {
                failed += 1;
                error!(params = %path.display(), "render failed");
                eprintln!("{}: {}", path.display(), e);
            }
        }
    }

    if !streams.is_empty() {
        print!("{}", streams.join(DOCUMENT_SEPARATOR));
    }

    if failed > 0 {
        return Err(Error::validation(format!(
            "{} of {} renders failed",
            failed, total
        )));
    }
    Ok(())
}

/// Write one application's files under `dir/app`, returning that directory
pub fn write_files(dir: &Path, app: &str, files: &[EmittedFile]) -> Result<PathBuf> {
    let app_dir = dir.join(app);
    std::fs::create_dir_all(&app_dir)?;
    for file in files {
        std::fs::write(app_dir.join(&file.file_name), &file.content)?;
    }
    Ok(app_dir)
}

fn app_name(params: &ParameterSet) -> Option<String> {
    params.get("app-name").map(ToString::to_string)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string())
}

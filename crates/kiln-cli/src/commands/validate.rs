//! Validate command

use clap::Args;
use kiln_manifest::{RenderOptions, Renderer};

use super::run_each;
use crate::config::ParamArgs;
use crate::{Error, Result};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub params: ParamArgs,
}

pub async fn run(args: ValidateArgs) -> Result<()> {
    let inputs = args.params.load()?;
    let options = RenderOptions {
        kinds: args.params.kind_selection(),
        strict: args.params.strict,
    };

    let results = run_each(inputs, move |params| {
        Ok(Renderer::new(options.clone()).check(params)?)
    })
    .await?;

    let mut error_count = 0;
    for (path, result) in &results {
        match result {
            Ok(errors) if errors.is_empty() => println!("  {} valid", path.display()),
            Ok(errors) => {
                println!("  {}: {} error(s)", path.display(), errors.len());
                for error in errors {
                    println!("    - {}", error);
                }
                error_count += errors.len();
            }
            Err(e) => {
                println!("  {}: {}", path.display(), e);
                error_count += 1;
            }
        }
    }

    println!();
    if error_count == 0 {
        println!("All validations passed");
        Ok(())
    } else {
        Err(Error::validation(format!(
            "{} validation errors",
            error_count
        )))
    }
}

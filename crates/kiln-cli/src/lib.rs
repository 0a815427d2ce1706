//! kiln CLI library

pub mod commands;
pub mod config;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};
use kiln_common::telemetry::{LogFormat, TelemetryError};

/// kiln - render and validate Kubernetes manifest sets
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format on stderr: text or json
    #[arg(long, global = true, default_value = "text", value_parser = parse_log_format)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render parameter files into ordered manifests
    Render(commands::render::RenderArgs),
    /// Expand and cross-check parameter files without emitting
    Validate(commands::validate::ValidateArgs),
    /// List registered kinds or describe one
    Schema(commands::schema::SchemaArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Render(args) => commands::render::run(args).await,
            Commands::Validate(args) => commands::validate::run(args).await,
            Commands::Schema(args) => commands::schema::run(args).await,
        }
    }
}

fn parse_log_format(raw: &str) -> std::result::Result<LogFormat, TelemetryError> {
    raw.parse()
}

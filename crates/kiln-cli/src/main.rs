//! kiln CLI
//!
//! Renders parameter files into ordered, cross-checked Kubernetes manifests.

use clap::Parser;
use kiln_common::telemetry::{init_telemetry, TelemetryConfig};

use kiln_cli::{Cli, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_telemetry(TelemetryConfig {
        format: cli.log_format,
        ..Default::default()
    })?;

    cli.run().await
}

//! Flowviz CLI binary.

use anyhow::Result;
use flowviz::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the flowviz CLI.
///
/// The whole derivation chain is synchronous and in-memory, so there is no
/// async runtime here: parse, execute, exit.
fn main() -> Result<()> {
    // Initialize tracing subscriber
    // Can be controlled via RUST_LOG environment variable
    // Example: RUST_LOG=flowviz=debug,flowviz_graph=trace flowviz view pipeline.json
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("flowviz=info,flowviz_graph=info")),
        )
        .with_target(false)
        .init();

    tracing::debug!("Starting flowviz CLI");

    let cli = Cli::parse_args();
    cli.execute()?;

    tracing::debug!("Flowviz CLI completed successfully");
    Ok(())
}

use anyhow::Result;
use clap::Parser;
use deck_builder::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for the summary and `list` output.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    tracing::info!("CLI application startup: tracing initialised");

    let cli = Cli::parse();
    tracing::info!("CLI arguments parsed, invoking run");
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}

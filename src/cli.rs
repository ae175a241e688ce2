//! CLI glue for deck-builder: command parsing, the async `run` entrypoint and
//! user-visible output.
//!
//! All listing, conversion and assembly logic lives in `deck-builder-core`;
//! this module only wires a loaded deck file to it.

use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deck_builder_core::assemble::build_deck;
use deck_builder_core::contract::{AssembleOptions, FailurePolicy};
use deck_builder_core::convert::HtmlSlideConverter;
use deck_builder_core::pptx::PptxDeckBuilder;
use std::path::PathBuf;

/// CLI for deck-builder: assemble HTML slides into one presentation.
#[derive(Parser)]
#[clap(
    name = "deck-builder",
    version,
    about = "Assemble an ordered set of HTML slides into a single .pptx presentation"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert every slide and write the presentation described by the deck file
    Build {
        /// Path to the YAML deck file
        #[clap(long)]
        config: PathBuf,
        /// Override the deck file's on_error policy (fail_fast or skip)
        #[clap(long)]
        on_error: Option<FailurePolicy>,
    },
    /// Print the ordered slide sources of a deck file without converting them
    List {
        /// Path to the YAML deck file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Build { config, on_error } => {
            let mut config = load_config(config)?;
            if let Some(policy) = on_error {
                tracing::info!(%policy, "Failure policy overridden on the command line");
                config.policy = policy;
            }
            let options = AssembleOptions {
                policy: config.policy,
            };

            println!("Building deck \"{}\"...", config.metadata.title);
            match build_deck(
                &config.selection,
                &config.metadata,
                &config.output,
                options,
                PptxDeckBuilder::new(),
                &HtmlSlideConverter::new(),
            )
            .await
            {
                Ok(report) => {
                    println!("Created: {}", report.output_path.display());
                    println!("   Success: {} slides", report.slides_added);
                    println!("   Skipped: {} slides", report.slides_skipped);
                    for skipped in &report.skipped {
                        println!("     - {}: {}", skipped.source.display(), skipped.reason);
                    }
                    tracing::info!(command = "build", ?report, "Deck build complete");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "build", error = %e, "Deck build failed");
                    Err(anyhow::Error::new(e).context("Deck build failed"))
                }
            }
        }
        Commands::List { config } => {
            let config = load_config(config)?;
            let sources = config
                .selection
                .resolve()
                .context("Failed to list slide sources")?;
            tracing::info!(command = "list", count = sources.len(), "Resolved slide sources");
            for source in &sources {
                println!("{}", source.path.display());
            }
            Ok(())
        }
    }
}

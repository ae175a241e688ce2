//! `load_config` module: loads a YAML deck file and adapts it into a [`DeckConfig`].
//!
//! This is the only place where user-supplied YAML is parsed and mapped onto the
//! strongly-typed models of `deck-builder-core`.
//!
//! # Responsibilities
//! - Parse the deck file (metadata, slide selection, output path, failure policy)
//! - Resolve relative paths against the directory holding the deck file
//! - Reject slide sections that name neither a directory nor a file list
//!
//! # Errors
//! All errors use `anyhow::Error` with context and are surfaced at the CLI boundary.
//!
//! Accepted schema:
//!
//! ```yaml
//! deck:
//!   title: "Quarterly review"
//!   author: "Team"
//!   subject: "optional"
//!   layout: LAYOUT_16x9
//! slides:
//!   dir: slides
//!   extension: html
//!   files: [cover.html, summary.html]
//! output: deck.pptx
//! on_error: fail_fast
//! ```

use anyhow::Result;
use deck_builder_core::contract::{DeckMetadata, FailurePolicy};
use deck_builder_core::listing::{SourceSelection, DEFAULT_EXTENSION};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// A deck file after parsing and path resolution.
#[derive(Debug, Clone)]
pub struct DeckConfig {
    pub metadata: DeckMetadata,
    pub selection: SourceSelection,
    pub output: PathBuf,
    pub policy: FailurePolicy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDeckFile {
    deck: DeckMetadata,
    slides: SlidesSection,
    output: PathBuf,
    #[serde(default)]
    on_error: FailurePolicy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SlidesSection {
    #[serde(default)]
    dir: Option<PathBuf>,
    #[serde(default)]
    extension: Option<String>,
    #[serde(default)]
    files: Option<Vec<PathBuf>>,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DeckConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading deck file");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read deck file");
        anyhow::anyhow!("Failed to read deck file {:?}: {}", path_ref, e)
    })?;

    let raw: RawDeckFile = match serde_yaml::from_str(&content) {
        Ok(raw) => {
            info!(config_path = ?path_ref, "Parsed deck YAML successfully");
            raw
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse deck YAML");
            return Err(anyhow::anyhow!("Failed to parse deck YAML: {e}"));
        }
    };

    let base = match path_ref.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let resolve = |p: &Path| -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            base.join(p)
        }
    };

    let dir = raw.slides.dir.as_deref().map(resolve);
    let selection = match (raw.slides.files, dir) {
        (Some(files), dir) => {
            let root = dir.unwrap_or_else(|| base.clone());
            SourceSelection::Explicit(
                files
                    .iter()
                    .map(|f| if f.is_absolute() { f.clone() } else { root.join(f) })
                    .collect(),
            )
        }
        (None, Some(dir)) => SourceSelection::Directory {
            dir,
            extension: raw
                .slides
                .extension
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
        },
        (None, None) => {
            error!(config_path = ?path_ref, "Deck file names no slides");
            anyhow::bail!("slides section must set `dir` or `files`");
        }
    };

    let config = DeckConfig {
        metadata: raw.deck,
        selection,
        output: resolve(&raw.output),
        policy: raw.on_error,
    };

    info!(
        title = %config.metadata.title,
        layout = config.metadata.layout.name(),
        output = %config.output.display(),
        policy = %config.policy,
        "Deck file loaded"
    );
    Ok(config)
}


//! Batch assembly: turns an ordered list of slide sources into one presentation file.
//!
//! The driver owns a fresh [`PresentationBuilder`] for the run, applies the deck
//! metadata, then hands each slide source to a [`SlideConverter`] strictly one
//! at a time and in list order. What happens when a slide fails depends on the
//! [`FailurePolicy`]:
//!
//! - `FailFast`: the run stops at the first failure and nothing is written.
//! - `SkipFailed`: the failure is logged and recorded, the slide is left out,
//!   and the remaining slides are still converted.
//!
//! On a run that is not aborted the builder is serialized exactly once.
//!
//! # Navigation
//! - Main entrypoint: [`assemble`]
//! - Listing + assembly in one call: [`build_deck`]

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::contract::{
    AssembleOptions, DeckMetadata, FailurePolicy, PresentationBuilder, RunError, RunResult,
    SkippedSlide, SlideConverter, SlideSource,
};
use crate::listing::SourceSelection;

pub async fn assemble<B, C>(
    sources: &[SlideSource],
    metadata: &DeckMetadata,
    output_path: &Path,
    options: AssembleOptions,
    mut builder: B,
    converter: &C,
) -> Result<RunResult, RunError>
where
    B: PresentationBuilder,
    C: SlideConverter + ?Sized,
{
    info!(
        slides = sources.len(),
        policy = %options.policy,
        output = %output_path.display(),
        "[ASSEMBLE] Starting deck assembly"
    );

    builder.set_metadata(metadata);

    let mut slides_added = 0;
    let mut skipped: Vec<SkippedSlide> = Vec::new();

    for (index, source) in sources.iter().enumerate() {
        info!(index, slide = %source.name(), "[ASSEMBLE] Adding slide");
        match converter.convert(source, &mut builder).await {
            Ok(()) => {
                slides_added += 1;
                debug!(index, slide = %source.name(), deck_size = builder.slide_count(), "[ASSEMBLE] Slide added");
            }
            Err(e) => match options.policy {
                FailurePolicy::FailFast => {
                    error!(index, slide = %source.name(), error = %e, "[ASSEMBLE][ERROR] Slide conversion failed, aborting run");
                    return Err(RunError::Conversion {
                        slide: source.path.clone(),
                        error: e,
                    });
                }
                FailurePolicy::SkipFailed => {
                    warn!(index, slide = %source.name(), error = %e, "[ASSEMBLE] Skipped slide after conversion error");
                    skipped.push(SkippedSlide {
                        source: source.path.clone(),
                        reason: e.to_string(),
                    });
                }
            },
        }
    }

    if let Err(e) = builder.serialize(output_path).await {
        error!(output = %output_path.display(), error = %e, "[ASSEMBLE][ERROR] Failed to serialize deck");
        return Err(RunError::Serialize {
            output: output_path.to_path_buf(),
            error: e,
        });
    }

    let result = RunResult {
        slides_added,
        slides_skipped: skipped.len(),
        skipped,
        output_path: output_path.to_path_buf(),
    };

    info!(
        added = result.slides_added,
        skipped = result.slides_skipped,
        output = %output_path.display(),
        "[ASSEMBLE] Deck assembly complete"
    );
    match serde_json::to_string_pretty(&result) {
        Ok(json) => debug!(json = %json, "[ASSEMBLE][DEBUG] Run result as JSON"),
        Err(e) => error!(error = ?e, "[ASSEMBLE][DEBUG] Failed to serialize run result as JSON"),
    }

    Ok(result)
}

/// Resolves the slide sources of `selection`, then runs [`assemble`] over them.
///
/// An unreadable slide directory ends the run before a builder is touched.
pub async fn build_deck<B, C>(
    selection: &SourceSelection,
    metadata: &DeckMetadata,
    output_path: &Path,
    options: AssembleOptions,
    builder: B,
    converter: &C,
) -> Result<RunResult, RunError>
where
    B: PresentationBuilder,
    C: SlideConverter + ?Sized,
{
    let sources = selection.resolve().map_err(|e| {
        error!(error = %e, "[ASSEMBLE][ERROR] Failed to resolve slide sources");
        RunError::from(e)
    })?;
    assemble(&sources, metadata, output_path, options, builder, converter).await
}

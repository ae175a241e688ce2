//! # contract: shared types and collaborator traits for deck assembly
//!
//! This module defines the data that flows through a run (slide sources, deck
//! metadata, the slide representation, the run report) and the two traits the
//! assembly driver talks to:
//!
//! - [`SlideConverter`]: turns one slide source into one slide appended to a builder.
//! - [`PresentationBuilder`]: accumulates slides and metadata, then serializes once.
//!
//! ## Mocking & Testing
//! - [`PresentationBuilder`] is annotated for `mockall` (behind the `test-export-mocks`
//!   feature) so consumers can assert how often a run finalizes.
//! - Converters are easiest to fake by hand; see the core test suite.
//!
//! ## Errors
//! Every failure is a `thiserror` enum. [`ConversionError`] is the per-slide kind,
//! [`RunError`] is what aborts a whole run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One input HTML document. Its position in the source list is its position in the deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideSource {
    pub path: PathBuf,
}

impl SlideSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name used in logs and reports; falls back to the full path.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Slide dimensions preset, named the way presentation tooling usually names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    #[default]
    #[serde(rename = "LAYOUT_16x9")]
    Layout16x9,
    #[serde(rename = "LAYOUT_16x10")]
    Layout16x10,
    #[serde(rename = "LAYOUT_4x3")]
    Layout4x3,
    #[serde(rename = "LAYOUT_WIDE")]
    LayoutWide,
}

impl Layout {
    /// Slide width and height in EMU (914400 per inch).
    pub fn dimensions(&self) -> (u64, u64) {
        match self {
            Layout::Layout16x9 => (9_144_000, 5_143_500),
            Layout::Layout16x10 => (9_144_000, 5_715_000),
            Layout::Layout4x3 => (9_144_000, 6_858_000),
            Layout::LayoutWide => (12_192_000, 6_858_000),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Layout::Layout16x9 => "LAYOUT_16x9",
            Layout::Layout16x10 => "LAYOUT_16x10",
            Layout::Layout4x3 => "LAYOUT_4x3",
            Layout::LayoutWide => "LAYOUT_WIDE",
        }
    }
}

/// Top-level deck properties, applied to the builder before any slide is converted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckMetadata {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub layout: Layout,
}

/// What to do when a single slide fails to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Abort the run on the first failure; no output file is written.
    #[default]
    #[serde(rename = "fail_fast")]
    FailFast,
    /// Log the failure, leave the slide out and keep going.
    #[serde(rename = "skip", alias = "skip_failed")]
    SkipFailed,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail_fast" => Ok(FailurePolicy::FailFast),
            "skip" | "skip_failed" => Ok(FailurePolicy::SkipFailed),
            other => Err(format!("unknown failure policy: {other}")),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::FailFast => f.write_str("fail_fast"),
            FailurePolicy::SkipFailed => f.write_str("skip"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions {
    pub policy: FailurePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphKind {
    Heading,
    Body,
    Bullet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub kind: ParagraphKind,
}

/// The builder's representation of one converted slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub title: Option<String>,
    pub paragraphs: Vec<Paragraph>,
    /// Slide source this slide was converted from.
    pub source: PathBuf,
}

/// A slide left out of the deck under [`FailurePolicy::SkipFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSlide {
    pub source: PathBuf,
    pub reason: String,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub slides_added: usize,
    pub slides_skipped: usize,
    pub skipped: Vec<SkippedSlide>,
    pub output_path: PathBuf,
}

/// One slide failed to convert.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to read slide {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("slide {} has no <body> element", .path.display())]
    MissingBody { path: PathBuf },
    #[error("slide {} has no visible text", .path.display())]
    EmptySlide { path: PathBuf },
    #[error("invalid slide: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to write presentation: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to build presentation package: {0}")]
    Package(#[from] zip::result::ZipError),
    #[error("failed to move presentation into place at {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("presentation was already serialized")]
    AlreadySerialized,
}

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("failed to read slide directory {}: {source}", .dir.display())]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that terminate a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Listing(#[from] ListingError),
    #[error("run aborted: {error}")]
    Conversion {
        slide: PathBuf,
        error: ConversionError,
    },
    #[error("failed to serialize deck to {}: {error}", .output.display())]
    Serialize {
        output: PathBuf,
        #[source]
        error: BuildError,
    },
}

/// Accumulates converted slides and deck metadata, then persists them exactly once.
///
/// Implemented by [`crate::pptx::PptxDeckBuilder`] and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PresentationBuilder: Send {
    /// Set title, author, subject and layout. Called before any slide is added.
    fn set_metadata(&mut self, metadata: &DeckMetadata);

    /// Append one slide at the end of the deck.
    fn add_slide(&mut self, slide: Slide);

    fn slide_count(&self) -> usize;

    /// Write the deck to `output_path`. Called once per run, after all conversions.
    async fn serialize(&mut self, output_path: &Path) -> Result<(), BuildError>;
}

/// Converts one slide source, appending the result to the builder.
///
/// On error the builder must be left untouched.
#[async_trait]
pub trait SlideConverter: Send + Sync {
    async fn convert(
        &self,
        source: &SlideSource,
        builder: &mut dyn PresentationBuilder,
    ) -> Result<(), ConversionError>;
}

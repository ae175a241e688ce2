//! Slide source discovery.
//!
//! A deck is either an explicit, ordered list of files or every file with the
//! slide extension in a directory, sorted by file name (byte order).

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::contract::{ListingError, SlideSource};

pub const DEFAULT_EXTENSION: &str = "html";

/// Where the ordered slide sources of a deck come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    /// Every file in `dir` ending in `.{extension}`, sorted by name.
    Directory { dir: PathBuf, extension: String },
    /// Exactly these files, in this order.
    Explicit(Vec<PathBuf>),
}

impl SourceSelection {
    pub fn resolve(&self) -> Result<Vec<SlideSource>, ListingError> {
        match self {
            SourceSelection::Directory { dir, extension } => list_slide_dir(dir, extension),
            SourceSelection::Explicit(files) => {
                info!(count = files.len(), "Using explicit slide list");
                Ok(files.iter().cloned().map(SlideSource::new).collect())
            }
        }
    }
}

/// Lists the slide files of `dir` with the given extension, sorted by file name.
///
/// Subdirectories are not descended into. The extension may be given with or
/// without its leading dot and is matched case-sensitively.
pub fn list_slide_dir(dir: &Path, extension: &str) -> Result<Vec<SlideSource>, ListingError> {
    let extension = extension.trim_start_matches('.');
    let suffix = format!(".{extension}");
    debug!(dir = %dir.display(), extension, "Listing slide directory");

    let entries = std::fs::read_dir(dir).map_err(|e| {
        error!(error = ?e, dir = %dir.display(), "Failed to read slide directory");
        ListingError::ReadDir {
            dir: dir.to_path_buf(),
            source: e,
        }
    })?;

    let mut names: Vec<OsString> = Vec::new();
    for entry_res in entries {
        let entry = entry_res.map_err(|e| ListingError::ReadDir {
            dir: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            debug!(path = %path.display(), "Skipping non-file entry");
            continue;
        }
        let name = entry.file_name();
        if !name.to_string_lossy().ends_with(&suffix) {
            continue;
        }
        names.push(name);
    }
    names.sort();

    let sources: Vec<SlideSource> = names
        .into_iter()
        .map(|name| SlideSource::new(dir.join(name)))
        .collect();

    info!(
        dir = %dir.display(),
        count = sources.len(),
        "Discovered slide sources"
    );
    Ok(sources)
}

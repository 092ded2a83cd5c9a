// crates/atomic-index-core/src/discovery.rs
// ============================================================================
// Module: Technique File Discovery
// Description: Recursive enumeration of atomic test definition files.
// Purpose: Produce a deterministic list of candidate input documents.
// Dependencies: walkdir
// ============================================================================

//! ## Overview
//! Discovery walks the scan root recursively and keeps regular files named
//! like `T1003.yaml` or `T1003.001.yml`. Directory layout is not inspected.
//! Results are sorted by path so downstream appends are reproducible.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::error::IndexError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File extensions accepted for technique documents.
const TECHNIQUE_EXTENSIONS: &[&str] = &["yaml", "yml"];

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Recursively discovers technique files under `root`, sorted by path.
///
/// # Errors
///
/// Returns [`IndexError::Discovery`] when any directory entry under `root`
/// (including `root` itself) cannot be read.
pub fn discover_technique_files(
    root: &Path,
    follow_links: bool,
) -> Result<Vec<PathBuf>, IndexError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(follow_links) {
        let entry = entry.map_err(|err| IndexError::Discovery {
            root: root.display().to_string(),
            message: err.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_str().is_some_and(is_technique_file_name) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Returns true when `name` is a technique document file name.
///
/// Accepted names are a capital `T`, at least one leading digit, then digits
/// and dots, followed by a `.yaml` or `.yml` extension.
#[must_use]
pub fn is_technique_file_name(name: &str) -> bool {
    let Some((stem, extension)) = name.rsplit_once('.') else {
        return false;
    };
    if !TECHNIQUE_EXTENSIONS.contains(&extension) {
        return false;
    }
    let Some(rest) = stem.strip_prefix('T') else {
        return false;
    };
    rest.starts_with(|ch: char| ch.is_ascii_digit())
        && rest.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// crates/atomic-index-core/src/store.rs
// ============================================================================
// Module: Index Store
// Description: Load and persist the reduced YAML index document.
// Purpose: Own the only mutation boundary of an indexing run.
// Dependencies: serde_yaml
// ============================================================================

//! ## Overview
//! The store reads the index through a scoped handle, treats an empty or
//! `atomics`-less document as a fresh index, and writes updates through a
//! temporary sibling that is synced and renamed over the original. A crash
//! mid-write leaves the previous index intact.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsString;
use std::fs;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde_yaml::Value;

use crate::error::IndexError;
use crate::io::read_utf8_with_limit;
use crate::model::OutputIndex;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Attempts made to allocate a unique temporary file name.
const MAX_TEMP_ATTEMPTS: u32 = 64;

// ============================================================================
// SECTION: Store
// ============================================================================

/// File-backed index store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStore {
    /// Index document path.
    path: PathBuf,
    /// Maximum index size accepted on load.
    max_bytes: usize,
}

impl IndexStore {
    /// Creates a store for the index at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            path: path.into(),
            max_bytes,
        }
    }

    /// Returns the index path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates an empty index file when none exists; existing content is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] when the file cannot be created.
    pub fn ensure_exists(&self) -> Result<(), IndexError> {
        OpenOptions::new().create(true).append(true).open(&self.path).map_err(|err| {
            IndexError::Io {
                path: self.path.display().to_string(),
                message: err.to_string(),
            }
        })?;
        Ok(())
    }

    /// Loads the index, returning a fresh index for empty documents.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] when the file cannot be read, exceeds the size
    /// limit, or does not parse as an index.
    pub fn load(&self) -> Result<OutputIndex, IndexError> {
        let content = read_utf8_with_limit(&self.path, self.max_bytes)?;
        parse_index(&self.path, &content)
    }

    /// Writes the full index, atomically replacing the previous document.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Persist`] when rendering or writing fails.
    pub fn persist(&self, index: &OutputIndex) -> Result<(), IndexError> {
        let rendered = render_index(index).map_err(|message| self.persist_error(message))?;
        write_file_atomic(&self.path, rendered.as_bytes())
            .map_err(|message| self.persist_error(message))
    }

    /// Builds a persist error for this store.
    fn persist_error(&self, message: String) -> IndexError {
        IndexError::Persist {
            path: self.path.display().to_string(),
            message,
        }
    }
}

// ============================================================================
// SECTION: Codec
// ============================================================================

/// Parses index content; empty, null, or `atomics`-less documents are fresh.
///
/// Other root keys are kept in place and written back by [`render_index`].
///
/// # Errors
///
/// Returns [`IndexError::Parse`] when the content is not YAML, the root is
/// not a mapping, or the groups do not match the index shape.
pub fn parse_index(source: &Path, content: &str) -> Result<OutputIndex, IndexError> {
    let parse_error = |message: String| IndexError::Parse {
        path: source.display().to_string(),
        message,
    };
    if content.trim().is_empty() {
        return Ok(OutputIndex::default());
    }
    let value: Value = serde_yaml::from_str(content).map_err(|err| parse_error(err.to_string()))?;
    match value {
        Value::Null => Ok(OutputIndex::default()),
        Value::Mapping(_) => {
            serde_yaml::from_value(value).map_err(|err| parse_error(err.to_string()))
        }
        _ => Err(parse_error("expected a mapping at the index root".to_string())),
    }
}

/// Renders the index as block-style YAML.
///
/// # Errors
///
/// Returns the serializer diagnostic when rendering fails.
pub fn render_index(index: &OutputIndex) -> Result<String, String> {
    serde_yaml::to_string(index).map_err(|err| err.to_string())
}

// ============================================================================
// SECTION: Atomic Writes
// ============================================================================

/// Writes file bytes using a temporary sibling and atomic rename.
fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<(), String> {
    let Some(file_name) = path.file_name() else {
        return Err("index path has no file name".to_string());
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    for attempt in 0 .. MAX_TEMP_ATTEMPTS {
        let temp_path = parent.join(temp_file_name(file_name, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&temp_path) {
            Ok(mut temp_file) => {
                let written = temp_file
                    .write_all(bytes)
                    .and_then(|()| temp_file.sync_all())
                    .and_then(|()| fs::rename(&temp_path, path));
                if let Err(err) = written {
                    let _ = fs::remove_file(&temp_path);
                    return Err(err.to_string());
                }
                return Ok(());
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
            Err(err) => return Err(err.to_string()),
        }
    }
    Err("unable to allocate temporary index file".to_string())
}

/// Builds a deterministic temporary file name for atomic writes.
fn temp_file_name(file_name: &std::ffi::OsStr, attempt: u32) -> OsString {
    let mut temp = OsString::from(".tmp-");
    temp.push(file_name);
    temp.push(format!(".{}.{}", std::process::id(), attempt));
    temp
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// crates/atomic-index-core/src/pipeline.rs
// ============================================================================
// Module: Indexing Pipeline
// Description: Discover, extract, aggregate, and merge in a single run.
// Purpose: Provide the end-to-end operation behind the CLI.
// Dependencies: Standard library
// ============================================================================

//! ## Overview
//! A run discovers technique files under an explicit scan root, aggregates
//! the tests that support [`TARGET_PLATFORM`], and merges them into the index
//! at the output path. The index is only written after every input file has
//! been processed successfully.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use crate::aggregate::gather_atomics;
use crate::discovery::discover_technique_files;
use crate::error::IndexError;
use crate::events::RunEvent;
use crate::events::RunEventKind;
use crate::events::RunEventSink;
use crate::merge::merge_into;
use crate::model::TARGET_PLATFORM;
use crate::store::IndexStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum size of one technique document.
pub const DEFAULT_MAX_FILE_BYTES: usize = 1024 * 1024;
/// Default maximum size of the persisted index.
pub const DEFAULT_MAX_INDEX_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Discovery and extraction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Follow symbolic links while walking the scan root.
    pub follow_links: bool,
    /// Maximum size of one technique document.
    pub max_file_bytes: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            follow_links: false,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Options for one indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Discovery and extraction options.
    pub scan: ScanOptions,
    /// Maximum size of the persisted index.
    pub max_index_bytes: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            scan: ScanOptions::default(),
            max_index_bytes: DEFAULT_MAX_INDEX_BYTES,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Technique files discovered and extracted.
    pub files_scanned: usize,
    /// Techniques with at least one target-platform test.
    pub techniques_matched: usize,
    /// Technique groups appended to the index.
    pub techniques_added: usize,
    /// Reduced tests appended to the index.
    pub tests_added: usize,
    /// Tests skipped because their guid was already indexed.
    pub duplicates_skipped: usize,
}

// ============================================================================
// SECTION: Run
// ============================================================================

/// Indexes every technique file under `input_root` into `output_path`.
///
/// # Errors
///
/// Returns the first [`IndexError`] from discovery, extraction, index load,
/// merge, or persistence. Nothing is written unless every earlier step
/// succeeded.
pub fn run(
    input_root: &Path,
    output_path: &Path,
    options: &RunOptions,
    sink: &dyn RunEventSink,
) -> Result<RunSummary, IndexError> {
    let files = discover_technique_files(input_root, options.scan.follow_links)?;
    sink.record(&RunEvent::new(RunEventKind::FilesDiscovered {
        root: input_root.display().to_string(),
        files: files.len(),
    }));

    let aggregated =
        gather_atomics(&files, TARGET_PLATFORM, options.scan.max_file_bytes, sink)?;

    let store = IndexStore::new(output_path, options.max_index_bytes);
    store.ensure_exists()?;
    let mut index = store.load()?;
    let report = merge_into(&mut index, &aggregated, sink)?;
    store.persist(&index)?;
    sink.record(&RunEvent::new(RunEventKind::IndexPersisted {
        path: output_path.display().to_string(),
        techniques: index.atomics.len(),
        tests: index.test_count(),
    }));

    Ok(RunSummary {
        files_scanned: files.len(),
        techniques_matched: aggregated.len(),
        techniques_added: report.techniques_added,
        tests_added: report.tests_added,
        duplicates_skipped: report.duplicates_skipped,
    })
}

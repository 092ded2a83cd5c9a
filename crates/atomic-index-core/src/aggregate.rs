// crates/atomic-index-core/src/aggregate.rs
// ============================================================================
// Module: Test Aggregation
// Description: Group extracted tests by technique across all input files.
// Purpose: Build the insertion-ordered technique mapping fed to the merger.
// Dependencies: Standard library
// ============================================================================

//! ## Overview
//! Aggregation concatenates the filtered tests of every file that shares a
//! technique identifier. Files that retain no tests contribute nothing, so a
//! technique only appears once some file supplies at least one test for it.
//!
//! ## Invariants
//! - Techniques iterate in first-insertion order.
//! - No technique maps to an empty test list.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::IndexError;
use crate::events::RunEvent;
use crate::events::RunEventKind;
use crate::events::RunEventSink;
use crate::extract::extract_file;
use crate::model::TestEntry;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Technique → filtered tests mapping in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedTests {
    /// Technique groups in insertion order.
    groups: Vec<(String, Vec<TestEntry>)>,
    /// Position of each technique within `groups`.
    positions: HashMap<String, usize>,
}

impl AggregatedTests {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `tests` under `technique`; an empty `tests` is ignored.
    pub fn extend(&mut self, technique: &str, tests: Vec<TestEntry>) {
        if tests.is_empty() {
            return;
        }
        if let Some(&position) = self.positions.get(technique) {
            self.groups[position].1.extend(tests);
            return;
        }
        self.positions.insert(technique.to_string(), self.groups.len());
        self.groups.push((technique.to_string(), tests));
    }

    /// Returns the tests gathered for a technique.
    #[must_use]
    pub fn get(&self, technique: &str) -> Option<&[TestEntry]> {
        self.positions.get(technique).map(|&position| self.groups[position].1.as_slice())
    }

    /// Iterates techniques and their tests in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TestEntry])> {
        self.groups.iter().map(|(technique, tests)| (technique.as_str(), tests.as_slice()))
    }

    /// Returns the number of techniques.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true when no technique has been gathered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the number of tests across all techniques.
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.groups.iter().map(|(_, tests)| tests.len()).sum()
    }
}

// ============================================================================
// SECTION: Gathering
// ============================================================================

/// Extracts every file in order and aggregates the retained tests.
///
/// # Errors
///
/// Returns the first [`IndexError`] raised by extraction; no further files
/// are processed after a failure.
pub fn gather_atomics(
    files: &[PathBuf],
    platform: &str,
    max_file_bytes: usize,
    sink: &dyn RunEventSink,
) -> Result<AggregatedTests, IndexError> {
    let mut aggregated = AggregatedTests::new();
    for path in files {
        let extraction = extract_file(path, platform, max_file_bytes)?;
        sink.record(&RunEvent::new(RunEventKind::FileExtracted {
            path: path.display().to_string(),
            attack_technique: extraction.attack_technique.clone(),
            declared: extraction.declared,
            retained: extraction.tests.len(),
        }));
        aggregated.extend(&extraction.attack_technique, extraction.tests);
    }
    Ok(aggregated)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

// crates/atomic-index-core/src/merge.rs
// ============================================================================
// Module: Index Merge
// Description: Additive merge of aggregated tests into the persisted index.
// Purpose: Append unseen techniques and tests while deduplicating by guid.
// Dependencies: Standard library
// ============================================================================

//! ## Overview
//! The merger appends technique groups that are not yet indexed and appends
//! tests whose `auto_generated_guid` is not yet recorded for their technique.
//! Nothing already in the index is removed, rewritten, or reordered.
//!
//! ## Invariants
//! - The guid already on disk wins any collision; the newcomer is dropped.
//! - Two newcomers sharing a guid produce a single entry (first wins).
//! - New groups and tests are appended after existing ones.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;

use crate::aggregate::AggregatedTests;
use crate::error::IndexError;
use crate::events::RunEvent;
use crate::events::RunEventKind;
use crate::events::RunEventSink;
use crate::model::OutputIndex;
use crate::model::ReducedTestEntry;
use crate::model::TechniqueGroup;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Counts describing what a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Technique groups appended to the index.
    pub techniques_added: usize,
    /// Reduced tests appended to the index.
    pub tests_added: usize,
    /// Tests skipped because their guid was already present.
    pub duplicates_skipped: usize,
}

/// Lookup from technique to its group position and recorded guids.
struct TechniqueLookup {
    /// Group position for each technique.
    positions: HashMap<String, usize>,
    /// Guids recorded under each technique.
    guids: HashMap<String, HashSet<String>>,
}

impl TechniqueLookup {
    /// Indexes the existing groups; a repeated technique resolves to its last group.
    fn build(index: &OutputIndex) -> Self {
        let mut positions = HashMap::new();
        let mut guids = HashMap::new();
        for (position, group) in index.atomics.iter().enumerate() {
            positions.insert(group.attack_technique.clone(), position);
            let recorded: HashSet<String> = group
                .atomic_tests
                .iter()
                .map(|test| test.auto_generated_guid.clone())
                .collect();
            guids.insert(group.attack_technique.clone(), recorded);
        }
        Self {
            positions,
            guids,
        }
    }
}

// ============================================================================
// SECTION: Merge
// ============================================================================

/// Merges aggregated tests into `index` in place.
///
/// # Errors
///
/// Returns [`IndexError::Validation`] when an aggregated test lacks `name` or
/// `auto_generated_guid`. The index may already hold earlier appends when
/// this happens; callers must not persist it.
pub fn merge_into(
    index: &mut OutputIndex,
    aggregated: &AggregatedTests,
    sink: &dyn RunEventSink,
) -> Result<MergeReport, IndexError> {
    let mut lookup = TechniqueLookup::build(index);
    let mut report = MergeReport::default();

    for (technique, tests) in aggregated.iter() {
        let position = match lookup.positions.get(technique) {
            Some(&position) => position,
            None => {
                let position = index.atomics.len();
                index.atomics.push(TechniqueGroup::new(technique));
                lookup.positions.insert(technique.to_string(), position);
                report.techniques_added += 1;
                sink.record(&RunEvent::new(RunEventKind::TechniqueAppended {
                    attack_technique: technique.to_string(),
                }));
                position
            }
        };
        let recorded = lookup.guids.entry(technique.to_string()).or_default();

        let mut appended = 0_usize;
        let mut skipped = 0_usize;
        for test in tests {
            let reduced =
                ReducedTestEntry::project(test).ok_or_else(|| IndexError::Validation {
                    path: "<aggregated>".to_string(),
                    technique: technique.to_string(),
                    message: "test is missing `name` or `auto_generated_guid`".to_string(),
                })?;
            if !recorded.insert(reduced.auto_generated_guid.clone()) {
                skipped += 1;
                continue;
            }
            index.atomics[position].atomic_tests.push(reduced);
            appended += 1;
        }

        report.tests_added += appended;
        report.duplicates_skipped += skipped;
        sink.record(&RunEvent::new(RunEventKind::TestsAppended {
            attack_technique: technique.to_string(),
            appended,
            skipped,
        }));
    }
    Ok(report)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

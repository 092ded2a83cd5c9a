// crates/atomic-index-core/tests/merge_properties.rs
// ============================================================================
// Module: Merge Property Tests
// Description: Property-based checks for the additive index merge.
// Purpose: Ensure merges never rewrite existing data and converge on rerun.
// Dependencies: atomic-index-core, proptest
// ============================================================================

//! ## Overview
//! Generates small indexes and aggregated inputs over a narrow technique and
//! guid alphabet so collisions are frequent, then checks the merge invariants.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::collections::HashSet;

use atomic_index_core::AggregatedTests;
use atomic_index_core::NoopEventSink;
use atomic_index_core::OutputIndex;
use atomic_index_core::ReducedTestEntry;
use atomic_index_core::TARGET_PLATFORM;
use atomic_index_core::TechniqueGroup;
use atomic_index_core::TestEntry;
use atomic_index_core::merge_into;
use proptest::prelude::*;

fn technique_id() -> impl Strategy<Value = String> {
    (1001_u32 ..= 1004).prop_map(|n| format!("T{n}"))
}

fn guid() -> impl Strategy<Value = String> {
    (0_u32 .. 8).prop_map(|n| format!("g{n}"))
}

fn existing_index() -> impl Strategy<Value = OutputIndex> {
    prop::collection::btree_map(technique_id(), prop::collection::btree_set(guid(), 0 .. 4), 0 .. 4)
        .prop_map(|groups| OutputIndex {
            atomics: groups
                .into_iter()
                .map(|(technique, guids)| {
                    let mut group = TechniqueGroup::new(technique);
                    group.atomic_tests = guids
                        .into_iter()
                        .map(|guid| ReducedTestEntry::new(format!("on disk {guid}"), guid))
                        .collect();
                    group
                })
                .collect(),
            ..OutputIndex::default()
        })
}

fn aggregated() -> impl Strategy<Value = AggregatedTests> {
    prop::collection::vec((technique_id(), prop::collection::vec(guid(), 0 .. 4)), 0 .. 6)
        .prop_map(|files| {
            let mut aggregated = AggregatedTests::new();
            for (technique, guids) in files {
                let tests = guids
                    .into_iter()
                    .map(|guid| TestEntry {
                        name: Some(format!("new {guid}")),
                        auto_generated_guid: Some(guid),
                        supported_platforms: vec![TARGET_PLATFORM.to_string()],
                    })
                    .collect();
                aggregated.extend(&technique, tests);
            }
            aggregated
        })
}

proptest! {
    #[test]
    fn merge_only_appends(index in existing_index(), input in aggregated()) {
        let before = index.clone();
        let mut merged = index;
        merge_into(&mut merged, &input, &NoopEventSink).expect("merge");

        prop_assert!(merged.atomics.len() >= before.atomics.len());
        for (old, new) in before.atomics.iter().zip(&merged.atomics) {
            prop_assert_eq!(&old.attack_technique, &new.attack_technique);
            prop_assert_eq!(&old.atomic_tests[..], &new.atomic_tests[.. old.atomic_tests.len()]);
        }
    }

    #[test]
    fn merged_groups_have_unique_techniques_and_guids(
        index in existing_index(),
        input in aggregated(),
    ) {
        let mut merged = index;
        merge_into(&mut merged, &input, &NoopEventSink).expect("merge");

        let mut techniques = HashSet::new();
        for group in &merged.atomics {
            prop_assert!(techniques.insert(group.attack_technique.clone()));
            let mut guids = HashSet::new();
            for test in &group.atomic_tests {
                prop_assert!(guids.insert(test.auto_generated_guid.clone()));
            }
        }
    }

    #[test]
    fn merging_twice_changes_nothing(index in existing_index(), input in aggregated()) {
        let mut merged = index;
        merge_into(&mut merged, &input, &NoopEventSink).expect("first merge");
        let once = merged.clone();
        let report = merge_into(&mut merged, &input, &NoopEventSink).expect("second merge");

        prop_assert_eq!(report.tests_added, 0);
        prop_assert_eq!(report.techniques_added, 0);
        prop_assert_eq!(once, merged);
    }
}

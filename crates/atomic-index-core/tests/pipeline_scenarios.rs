// crates/atomic-index-core/tests/pipeline_scenarios.rs
// ============================================================================
// Module: Pipeline Scenario Tests
// Description: End-to-end runs over temporary technique trees.
// Purpose: Pin the merge outcomes for fresh, filtered, duplicate, and split inputs.
// Dependencies: atomic-index-core, serde_yaml, tempfile
// ============================================================================

//! ## Overview
//! Each test lays out a technique tree and an index file on disk, runs the
//! full pipeline, and inspects the persisted YAML.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use atomic_index_core::IndexError;
use atomic_index_core::NoopEventSink;
use atomic_index_core::OutputIndex;
use atomic_index_core::RunEvent;
use atomic_index_core::RunEventKind;
use atomic_index_core::RunEventSink;
use atomic_index_core::RunOptions;
use atomic_index_core::RunSummary;
use atomic_index_core::run;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn atomics(&self) -> PathBuf {
        self.root.path().join("atomics")
    }

    fn output(&self) -> PathBuf {
        self.root.path().join("index.yaml")
    }

    fn write_technique(&self, relative: &str, content: &str) {
        let path = self.atomics().join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("create technique dir");
        fs::write(path, content).expect("write technique");
    }

    fn run(&self) -> Result<RunSummary, IndexError> {
        fs::create_dir_all(self.atomics()).expect("create atomics");
        run(&self.atomics(), &self.output(), &RunOptions::default(), &NoopEventSink)
    }

    fn index(&self) -> OutputIndex {
        read_index(&self.output())
    }
}

fn read_index(path: &Path) -> OutputIndex {
    let content = fs::read_to_string(path).expect("read index");
    serde_yaml::from_str(&content).expect("parse index")
}

fn technique(id: &str, tests: &[(&str, &str, &str)]) -> String {
    let mut doc = format!("attack_technique: {id}\ndisplay_name: Demo\natomic_tests:\n");
    for (name, guid, platforms) in tests {
        doc.push_str(&format!(
            "- name: {name}\n  auto_generated_guid: {guid}\n  supported_platforms: [{platforms}]\n  \
             executor:\n    name: sh\n    command: echo {guid}\n"
        ));
    }
    doc
}

fn guids(index: &OutputIndex, technique: &str) -> Vec<String> {
    index
        .group(technique)
        .map(|group| group.atomic_tests.iter().map(|t| t.auto_generated_guid.clone()).collect())
        .unwrap_or_default()
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<RunEvent>>,
}

impl RunEventSink for RecordingSink {
    fn record(&self, event: &RunEvent) {
        self.events.lock().expect("lock").push(event.clone());
    }
}

// ============================================================================
// SECTION: Scenarios
// ============================================================================

#[test]
fn fresh_index_receives_linux_test() {
    let ws = Workspace::new();
    ws.write_technique("T1001/T1001.yaml", &technique("T1001", &[("Probe", "g1", "linux")]));
    fs::write(ws.output(), "").expect("touch output");

    let summary = ws.run().expect("run");
    assert_eq!(summary.tests_added, 1);
    let content = fs::read_to_string(ws.output()).expect("read index");
    assert_eq!(
        content,
        "atomics:\n- attack_technique: T1001\n  atomic_tests:\n  - name: Probe\n    \
         auto_generated_guid: g1\n"
    );
}

#[test]
fn windows_only_input_leaves_index_empty() {
    let ws = Workspace::new();
    ws.write_technique("T1001/T1001.yaml", &technique("T1001", &[("Probe", "g1", "windows")]));
    fs::write(ws.output(), "").expect("touch output");

    let summary = ws.run().expect("run");
    assert_eq!(summary.techniques_matched, 0);
    assert_eq!(fs::read_to_string(ws.output()).expect("read index"), "atomics: []\n");
}

#[test]
fn existing_guid_is_kept_and_only_new_guid_appended() {
    let ws = Workspace::new();
    fs::write(
        ws.output(),
        "atomics:\n- attack_technique: T1001\n  atomic_tests:\n  - name: Original\n    \
         auto_generated_guid: g1\n",
    )
    .expect("seed index");
    ws.write_technique(
        "T1001/T1001.yaml",
        &technique("T1001", &[("Renamed", "g1", "linux"), ("Second", "g2", "linux")]),
    );

    let summary = ws.run().expect("run");
    assert_eq!(summary.tests_added, 1);
    assert_eq!(summary.duplicates_skipped, 1);
    let index = ws.index();
    assert_eq!(guids(&index, "T1001"), vec!["g1", "g2"]);
    assert_eq!(index.atomics[0].atomic_tests[0].name, "Original");
}

#[test]
fn split_technique_files_merge_into_one_group() {
    let ws = Workspace::new();
    ws.write_technique("T1002/T1002.yaml", &technique("T1002", &[("Left", "g3", "linux")]));
    ws.write_technique("extra/T1002.yaml", &technique("T1002", &[("Right", "g4", "linux")]));

    ws.run().expect("run");
    let index = ws.index();
    assert_eq!(index.atomics.len(), 1);
    assert_eq!(guids(&index, "T1002"), vec!["g3", "g4"]);
}

// ============================================================================
// SECTION: Properties
// ============================================================================

#[test]
fn second_run_is_idempotent() {
    let ws = Workspace::new();
    ws.write_technique(
        "T1001/T1001.yaml",
        &technique("T1001", &[("A", "g1", "linux"), ("B", "g2", "linux, macos")]),
    );
    ws.write_technique("T1003/T1003.001.yaml", &technique("T1003.001", &[("C", "g5", "linux")]));

    ws.run().expect("first run");
    let first = fs::read_to_string(ws.output()).expect("read first");
    let summary = ws.run().expect("second run");
    let second = fs::read_to_string(ws.output()).expect("read second");

    assert_eq!(summary.tests_added, 0);
    assert_eq!(summary.techniques_added, 0);
    assert_eq!(first, second);
}

#[test]
fn merge_preserves_existing_groups_and_unknown_fields() {
    let ws = Workspace::new();
    fs::write(
        ws.output(),
        "atomics:\n- attack_technique: T1999\n  atomic_tests:\n  - name: Kept\n    \
         auto_generated_guid: g9\n    reviewed: true\n  owner: purple-team\n",
    )
    .expect("seed index");
    ws.write_technique("T1001/T1001.yaml", &technique("T1001", &[("New", "g1", "linux")]));

    ws.run().expect("run");
    let index = ws.index();
    let order: Vec<&str> = index.atomics.iter().map(|g| g.attack_technique.as_str()).collect();
    assert_eq!(order, vec!["T1999", "T1001"]);
    let kept = index.group("T1999").expect("kept group");
    assert_eq!(kept.extra.get("owner"), Some(&serde_yaml::Value::from("purple-team")));
    assert_eq!(kept.atomic_tests[0].extra.get("reviewed"), Some(&serde_yaml::Value::from(true)));
}

#[test]
fn run_without_new_tests_leaves_reordered_index_byte_identical() {
    let ws = Workspace::new();
    let seeded = "version: 2\natomics:\n- owner: red\n  attack_technique: T1999\n  \
                  atomic_tests:\n  - auto_generated_guid: g9\n    name: Kept\n";
    fs::write(ws.output(), seeded).expect("seed index");

    let summary = ws.run().expect("run");
    assert_eq!(summary.tests_added, 0);
    assert_eq!(fs::read_to_string(ws.output()).expect("read index"), seeded);
}

#[test]
fn appending_keeps_existing_nodes_in_on_disk_key_order() {
    let ws = Workspace::new();
    fs::write(
        ws.output(),
        "atomics:\n- atomic_tests:\n  - auto_generated_guid: g1\n    name: Old\n  \
         attack_technique: T1001\n",
    )
    .expect("seed index");
    ws.write_technique("T1001/T1001.yaml", &technique("T1001", &[("New", "g2", "linux")]));

    ws.run().expect("run");
    assert_eq!(
        fs::read_to_string(ws.output()).expect("read index"),
        "atomics:\n- atomic_tests:\n  - auto_generated_guid: g1\n    name: Old\n  - name: New\n    \
         auto_generated_guid: g2\n  attack_technique: T1001\n"
    );
}

#[test]
fn missing_output_file_is_created() {
    let ws = Workspace::new();
    ws.write_technique("T1001/T1001.yaml", &technique("T1001", &[("A", "g1", "linux")]));

    ws.run().expect("run");
    assert_eq!(guids(&ws.index(), "T1001"), vec!["g1"]);
}

#[test]
fn parse_failure_leaves_existing_index_untouched() {
    let ws = Workspace::new();
    let seeded = "atomics:\n- attack_technique: T1999\n  atomic_tests: []\n";
    fs::write(ws.output(), seeded).expect("seed index");
    ws.write_technique("T1001/T1001.yaml", &technique("T1001", &[("A", "g1", "linux")]));
    ws.write_technique("T1002/T1002.yaml", "atomic_tests: [broken\n");

    let err = ws.run().expect_err("parse failure aborts");
    assert!(matches!(err, IndexError::Parse { .. }));
    assert_eq!(fs::read_to_string(ws.output()).expect("read index"), seeded);
}

#[test]
fn run_emits_events_in_pipeline_order() {
    let ws = Workspace::new();
    ws.write_technique("T1001/T1001.yaml", &technique("T1001", &[("A", "g1", "linux")]));
    fs::create_dir_all(ws.atomics()).expect("create atomics");
    let sink = RecordingSink::default();

    run(&ws.atomics(), &ws.output(), &RunOptions::default(), &sink).expect("run");
    let labels: Vec<&'static str> = sink
        .events
        .lock()
        .expect("lock")
        .iter()
        .map(|event| match event.kind {
            RunEventKind::FilesDiscovered { .. } => "files_discovered",
            RunEventKind::FileExtracted { .. } => "file_extracted",
            RunEventKind::TechniqueAppended { .. } => "technique_appended",
            RunEventKind::TestsAppended { .. } => "tests_appended",
            RunEventKind::IndexPersisted { .. } => "index_persisted",
        })
        .collect();
    assert_eq!(labels, vec![
        "files_discovered",
        "file_extracted",
        "technique_appended",
        "tests_appended",
        "index_persisted",
    ]);
}

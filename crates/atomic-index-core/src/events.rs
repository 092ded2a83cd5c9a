// crates/atomic-index-core/src/events.rs
// ============================================================================
// Module: Run Events
// Description: Structured JSON-line events emitted during an indexing run.
// Purpose: Record discovery, extraction, and merge progress without hard deps.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Run events describe what an indexing run touched. Sinks render each event
//! as one JSON object per line so operators can route them to any log
//! pipeline. Recording never fails the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event payload variants.
///
/// # Invariants
/// - Variant names are stable `event` labels in the serialized output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEventKind {
    /// Discovery finished under the scan root.
    FilesDiscovered {
        /// Scan root.
        root: String,
        /// Number of technique files found.
        files: usize,
    },
    /// One technique file was parsed and filtered.
    FileExtracted {
        /// File path.
        path: String,
        /// Technique declared by the file.
        attack_technique: String,
        /// Entries declared before filtering.
        declared: usize,
        /// Entries retained for the target platform.
        retained: usize,
    },
    /// A technique group was appended to the index.
    TechniqueAppended {
        /// Technique identifier.
        attack_technique: String,
    },
    /// Tests were appended under a technique.
    TestsAppended {
        /// Technique identifier.
        attack_technique: String,
        /// Tests appended.
        appended: usize,
        /// Tests skipped because their guid was already present.
        skipped: usize,
    },
    /// The index was written back to disk.
    IndexPersisted {
        /// Index path.
        path: String,
        /// Technique groups in the written index.
        techniques: usize,
        /// Reduced tests in the written index.
        tests: usize,
    },
}

/// Timestamped run event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunEvent {
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event payload.
    #[serde(flatten)]
    pub kind: RunEventKind,
}

impl RunEvent {
    /// Creates a new event with the current timestamp.
    #[must_use]
    pub fn new(kind: RunEventKind) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            timestamp_ms,
            kind,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for run events.
pub trait RunEventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &RunEvent);
}

/// Sink that discards every event.
pub struct NoopEventSink;

impl RunEventSink for NoopEventSink {
    fn record(&self, _event: &RunEvent) {}
}

/// Sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl RunEventSink for StderrEventSink {
    fn record(&self, event: &RunEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that logs JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl RunEventSink for FileEventSink {
    fn record(&self, event: &RunEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use std::fs;

    use serde_json::Value;

    use super::*;

    #[test]
    fn events_serialize_with_flat_event_label() {
        let event = RunEvent {
            timestamp_ms: 7,
            kind: RunEventKind::TechniqueAppended {
                attack_technique: "T1001".to_string(),
            },
        };
        let value: Value = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(value["event"], "technique_appended");
        assert_eq!(value["attack_technique"], "T1001");
        assert_eq!(value["timestamp_ms"], 7);
    }

    #[test]
    fn file_sink_appends_one_line_per_event() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.jsonl");
        let sink = FileEventSink::new(&path).expect("open sink");
        sink.record(&RunEvent::new(RunEventKind::FilesDiscovered {
            root: "atomics".to_string(),
            files: 2,
        }));
        sink.record(&RunEvent::new(RunEventKind::IndexPersisted {
            path: "index.yaml".to_string(),
            techniques: 1,
            tests: 2,
        }));

        let contents = fs::read_to_string(&path).expect("read log");
        let events: Vec<Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["event"], "files_discovered");
        assert_eq!(events[1]["event"], "index_persisted");
    }
}

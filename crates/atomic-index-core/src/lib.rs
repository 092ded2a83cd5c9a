// crates/atomic-index-core/src/lib.rs
// ============================================================================
// Module: Atomic Index Core Library
// Description: Discovery, extraction, aggregation, and merge of atomic tests.
// Purpose: Maintain a reduced per-technique index of linux atomic tests.
// Dependencies: serde, serde_json, serde_yaml, thiserror, walkdir
// ============================================================================

//! ## Overview
//! `atomic-index-core` scans a tree of atomic test definition files, keeps the
//! tests that support the target platform, and merges their identifying fields
//! into a persisted YAML index. The merge is additive-only and deduplicates by
//! `auto_generated_guid`.
//!
//! ## Invariants
//! - Technique identifiers are unique within the index.
//! - Test guids are unique within each technique group.
//! - Existing groups and entries are never removed, rewritten, or reordered.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod aggregate;
pub mod discovery;
pub mod error;
pub mod events;
pub mod extract;
pub mod io;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregate::AggregatedTests;
pub use aggregate::gather_atomics;
pub use discovery::discover_technique_files;
pub use discovery::is_technique_file_name;
pub use error::IndexError;
pub use events::FileEventSink;
pub use events::NoopEventSink;
pub use events::RunEvent;
pub use events::RunEventKind;
pub use events::RunEventSink;
pub use events::StderrEventSink;
pub use extract::Extraction;
pub use extract::extract_document;
pub use extract::extract_file;
pub use merge::MergeReport;
pub use merge::merge_into;
pub use model::AtomicTestFile;
pub use model::OutputIndex;
pub use model::ReducedTestEntry;
pub use model::TARGET_PLATFORM;
pub use model::TechniqueGroup;
pub use model::TestEntry;
pub use pipeline::RunOptions;
pub use pipeline::RunSummary;
pub use pipeline::ScanOptions;
pub use pipeline::run;
pub use store::IndexStore;

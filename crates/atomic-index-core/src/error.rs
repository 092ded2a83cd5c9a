// crates/atomic-index-core/src/error.rs
// ============================================================================
// Module: Index Errors
// Description: Error taxonomy for discovery, parsing, and persistence.
// Purpose: Surface every fatal failure with the path that caused it.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every failure in an indexing run is fatal. Errors carry the offending path
//! as display text so the CLI can report them without further context.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by the atomic index pipeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// Filesystem traversal failed under the scan root.
    #[error("discovery failed under {root}: {message}")]
    Discovery {
        /// Scan root being traversed.
        root: String,
        /// Underlying traversal failure.
        message: String,
    },
    /// A document is not valid YAML or lacks the expected shape.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Document path.
        path: String,
        /// Parser diagnostic.
        message: String,
    },
    /// A retained test entry cannot be projected into the index.
    #[error("invalid test entry in {path} (technique {technique}): {message}")]
    Validation {
        /// Source document path.
        path: String,
        /// Technique the entry belongs to.
        technique: String,
        /// Description of the missing or invalid field.
        message: String,
    },
    /// Writing the updated index failed.
    #[error("failed to persist index {path}: {message}")]
    Persist {
        /// Index path.
        path: String,
        /// Underlying write failure.
        message: String,
    },
    /// Reading a file failed.
    #[error("failed to read {path}: {message}")]
    Io {
        /// File path.
        path: String,
        /// Underlying read failure.
        message: String,
    },
    /// A file exceeds its configured size limit.
    #[error("refusing to read {path}: {size} bytes exceeds limit of {limit}")]
    TooLarge {
        /// File path.
        path: String,
        /// Observed size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: usize,
    },
}

// crates/atomic-index-core/src/io.rs
// ============================================================================
// Module: Bounded File Reads
// Description: Size-limited UTF-8 reads for input documents and the index.
// Purpose: Reject oversized files before they reach the YAML parser.
// Dependencies: Standard library
// ============================================================================

//! ## Overview
//! Every document the crate reads goes through [`read_bytes_with_limit`]. The
//! size is checked against file metadata before reading, and the read itself
//! is capped one byte past the limit so a file growing mid-read still fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::IndexError;

// ============================================================================
// SECTION: Reads
// ============================================================================

/// Reads a file from disk while enforcing a hard size limit.
///
/// # Errors
///
/// Returns [`IndexError::Io`] when the file cannot be opened or read and
/// [`IndexError::TooLarge`] when it exceeds `max_bytes`.
pub fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, IndexError> {
    let io_error = |err: std::io::Error| IndexError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    };
    let too_large = |size: u64| IndexError::TooLarge {
        path: path.display().to_string(),
        size,
        limit: max_bytes,
    };
    let file = File::open(path).map_err(io_error)?;
    let size = file.metadata().map_err(io_error)?.len();
    let limit = u64::try_from(max_bytes).map_err(|_| too_large(size))?;
    if size > limit {
        return Err(too_large(size));
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(io_error)?;
    if bytes.len() > max_bytes {
        return Err(too_large(u64::try_from(bytes.len()).unwrap_or(u64::MAX)));
    }
    Ok(bytes)
}

/// Reads a UTF-8 document from disk while enforcing a hard size limit.
///
/// # Errors
///
/// Returns the errors of [`read_bytes_with_limit`], plus
/// [`IndexError::Parse`] when the content is not valid UTF-8.
pub fn read_utf8_with_limit(path: &Path, max_bytes: usize) -> Result<String, IndexError> {
    let bytes = read_bytes_with_limit(path, max_bytes)?;
    String::from_utf8(bytes).map_err(|_| IndexError::Parse {
        path: path.display().to_string(),
        message: "document must be utf-8".to_string(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

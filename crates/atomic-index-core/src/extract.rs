// crates/atomic-index-core/src/extract.rs
// ============================================================================
// Module: Test Extraction
// Description: Parse one atomic test document and keep target-platform tests.
// Purpose: Reduce each input file to its technique and applicable tests.
// Dependencies: serde_yaml
// ============================================================================

//! ## Overview
//! Extraction parses a technique document, keeps the entries whose
//! `supported_platforms` list the target platform, and checks that every
//! retained entry carries the fields the index needs. Entries that are
//! filtered out are never validated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use serde_yaml::Value;

use crate::error::IndexError;
use crate::io::read_utf8_with_limit;
use crate::model::AtomicTestFile;
use crate::model::TestEntry;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Result of extracting one technique document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Attack technique identifier (empty when the document omits it).
    pub attack_technique: String,
    /// Entries supporting the target platform, in document order.
    pub tests: Vec<TestEntry>,
    /// Number of entries declared by the document before filtering.
    pub declared: usize,
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Reads and extracts a technique document from disk.
///
/// # Errors
///
/// Returns [`IndexError`] when the file cannot be read, exceeds `max_bytes`,
/// fails to parse, or retains an entry without `name` or guid.
pub fn extract_file(
    path: &Path,
    platform: &str,
    max_bytes: usize,
) -> Result<Extraction, IndexError> {
    let content = read_utf8_with_limit(path, max_bytes)?;
    extract_document(path, &content, platform)
}

/// Extracts a technique document already loaded into memory.
///
/// `source` is only used for diagnostics.
///
/// # Errors
///
/// Returns [`IndexError::Parse`] when the content is not a YAML mapping of the
/// expected shape and [`IndexError::Validation`] when a retained entry lacks
/// `name` or `auto_generated_guid`.
pub fn extract_document(
    source: &Path,
    content: &str,
    platform: &str,
) -> Result<Extraction, IndexError> {
    let parse_error = |message: String| IndexError::Parse {
        path: source.display().to_string(),
        message,
    };
    let value: Value = serde_yaml::from_str(content).map_err(|err| parse_error(err.to_string()))?;
    if !value.is_mapping() {
        return Err(parse_error("expected a mapping at the document root".to_string()));
    }
    let document: AtomicTestFile =
        serde_yaml::from_value(value).map_err(|err| parse_error(err.to_string()))?;

    let declared = document.atomic_tests.len();
    let tests = filter_platform(document.atomic_tests, platform);
    for entry in &tests {
        validate_retained(source, &document.attack_technique, entry)?;
    }
    Ok(Extraction {
        attack_technique: document.attack_technique,
        tests,
        declared,
    })
}

/// Keeps the entries that list `platform`, preserving order.
#[must_use]
pub fn filter_platform(tests: Vec<TestEntry>, platform: &str) -> Vec<TestEntry> {
    tests.into_iter().filter(|entry| entry.supports(platform)).collect()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures a retained entry can be projected into the index.
fn validate_retained(source: &Path, technique: &str, entry: &TestEntry) -> Result<(), IndexError> {
    let missing = match (&entry.name, &entry.auto_generated_guid) {
        (Some(_), Some(_)) => return Ok(()),
        (None, Some(_)) => "name",
        (_, None) => "auto_generated_guid",
    };
    Err(IndexError::Validation {
        path: source.display().to_string(),
        technique: technique.to_string(),
        message: format!("retained test is missing `{missing}`"),
    })
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

    use super::*;
    use crate::model::TARGET_PLATFORM;

    fn extract(content: &str) -> Result<Extraction, IndexError> {
        extract_document(Path::new("T1001.yaml"), content, TARGET_PLATFORM)
    }

    #[test]
    fn missing_atomic_tests_yields_empty_sequence() {
        let extraction = extract("attack_technique: T1001\n").expect("extract");
        assert_eq!(extraction.attack_technique, "T1001");
        assert!(extraction.tests.is_empty());
        assert_eq!(extraction.declared, 0);
    }

    #[test]
    fn missing_technique_defaults_to_empty_string() {
        let extraction = extract("atomic_tests: []\n").expect("extract");
        assert_eq!(extraction.attack_technique, "");
    }

    #[test]
    fn entries_without_target_platform_are_excluded() {
        let content = r"
attack_technique: T1001
atomic_tests:
  - name: windows only
    auto_generated_guid: g1
    supported_platforms: [windows]
    executor: {name: powershell}
  - name: linux and macos
    auto_generated_guid: g2
    supported_platforms: [macos, linux]
  - name: no platforms
    auto_generated_guid: g3
";
        let extraction = extract(content).expect("extract");
        assert_eq!(extraction.declared, 3);
        assert_eq!(extraction.tests.len(), 1);
        assert_eq!(extraction.tests[0].auto_generated_guid.as_deref(), Some("g2"));
    }

    #[test]
    fn filtered_out_entries_are_not_validated() {
        let content = r"
attack_technique: T1001
atomic_tests:
  - supported_platforms: [windows]
";
        let extraction = extract(content).expect("extract");
        assert!(extraction.tests.is_empty());
    }

    #[test]
    fn retained_entry_without_guid_is_rejected() {
        let content = r"
attack_technique: T1001
atomic_tests:
  - name: linux test
    supported_platforms: [linux]
";
        let err = extract(content).expect_err("missing guid rejected");
        assert!(matches!(err, IndexError::Validation { .. }));
        assert!(err.to_string().contains("auto_generated_guid"));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = extract("attack_technique: [unclosed\n").expect_err("parse failure");
        assert!(matches!(err, IndexError::Parse { .. }));
    }

    #[test]
    fn non_mapping_root_is_a_parse_error() {
        assert!(matches!(extract("- T1001\n"), Err(IndexError::Parse { .. })));
        assert!(matches!(extract(""), Err(IndexError::Parse { .. })));
    }

    #[test]
    fn atomic_tests_of_wrong_type_is_a_parse_error() {
        let err = extract("attack_technique: T1001\natomic_tests: 7\n").expect_err("wrong shape");
        assert!(matches!(err, IndexError::Parse { .. }));
    }
}

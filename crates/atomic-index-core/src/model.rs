// crates/atomic-index-core/src/model.rs
// ============================================================================
// Module: Atomic Index Model
// Description: Input test documents and the persisted reduced index.
// Purpose: Define the serde shapes consumed and produced by the pipeline.
// Dependencies: serde, serde_yaml
// ============================================================================

//! ## Overview
//! Input documents are read permissively: missing keys fall back to empty
//! defaults and fields outside the consumed subset are ignored. Every index
//! node keeps the [`Mapping`] it was read from, with known keys replaced by
//! `null` placeholders, and is written back through that mapping. A
//! read-modify-write cycle therefore neither drops nor reorders keys it did
//! not create.
//!
//! ## Invariants
//! - [`ReducedTestEntry`] is the only test shape written to the index.
//! - Keys read from disk are re-emitted in their on-disk order.
//! - Keys missing from a node are appended after the keys it already has.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::DeserializeOwned;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde_yaml::Mapping;
use serde_yaml::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Platform a test must support to enter the index.
pub const TARGET_PLATFORM: &str = "linux";
/// Index root key holding the technique groups.
const ATOMICS_KEY: &str = "atomics";
/// Group key holding the technique identifier.
const TECHNIQUE_KEY: &str = "attack_technique";
/// Group key holding the reduced tests.
const TESTS_KEY: &str = "atomic_tests";
/// Test key holding the display name.
const NAME_KEY: &str = "name";
/// Test key holding the guid.
const GUID_KEY: &str = "auto_generated_guid";

// ============================================================================
// SECTION: Input Documents
// ============================================================================

/// One parsed atomic test definition file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AtomicTestFile {
    /// Attack technique identifier (for example `T1003.001`).
    #[serde(default)]
    pub attack_technique: String,
    /// Test cases declared by the file, in document order.
    #[serde(default)]
    pub atomic_tests: Vec<TestEntry>,
}

/// One test case within an atomic test file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TestEntry {
    /// Human-readable test name.
    #[serde(default)]
    pub name: Option<String>,
    /// Corpus-wide unique test identifier.
    #[serde(default)]
    pub auto_generated_guid: Option<String>,
    /// Platforms the test can execute on.
    #[serde(default)]
    pub supported_platforms: Vec<String>,
}

impl TestEntry {
    /// Returns true when the entry lists `platform` among its supported platforms.
    #[must_use]
    pub fn supports(&self, platform: &str) -> bool {
        self.supported_platforms.iter().any(|candidate| candidate == platform)
    }
}

// ============================================================================
// SECTION: Index Documents
// ============================================================================

/// Persisted projection of a [`TestEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedTestEntry {
    /// Human-readable test name.
    pub name: String,
    /// Corpus-wide unique test identifier.
    pub auto_generated_guid: String,
    /// Node layout as read from disk; known keys hold `null` placeholders.
    pub extra: Mapping,
}

impl ReducedTestEntry {
    /// Creates a reduced entry holding only the identifying fields.
    #[must_use]
    pub fn new(name: impl Into<String>, auto_generated_guid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_generated_guid: auto_generated_guid.into(),
            extra: Mapping::new(),
        }
    }

    /// Projects a test entry, returning `None` when `name` or the guid is absent.
    #[must_use]
    pub fn project(entry: &TestEntry) -> Option<Self> {
        let name = entry.name.as_deref()?;
        let guid = entry.auto_generated_guid.as_deref()?;
        Some(Self::new(name, guid))
    }
}

impl<'de> Deserialize<'de> for ReducedTestEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut extra = Mapping::deserialize(deserializer)?;
        let name = take_field(&mut extra, NAME_KEY)
            .map_err(D::Error::custom)?
            .ok_or_else(|| D::Error::missing_field(NAME_KEY))?;
        let auto_generated_guid = take_field(&mut extra, GUID_KEY)
            .map_err(D::Error::custom)?
            .ok_or_else(|| D::Error::missing_field(GUID_KEY))?;
        Ok(Self {
            name,
            auto_generated_guid,
            extra,
        })
    }
}

impl Serialize for ReducedTestEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut node = self.extra.clone();
        node.insert(Value::from(NAME_KEY), Value::from(self.name.as_str()));
        node.insert(Value::from(GUID_KEY), Value::from(self.auto_generated_guid.as_str()));
        node.serialize(serializer)
    }
}

/// Index entries for one attack technique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechniqueGroup {
    /// Attack technique identifier, unique within the index.
    pub attack_technique: String,
    /// Reduced tests, unique by guid.
    pub atomic_tests: Vec<ReducedTestEntry>,
    /// Node layout as read from disk; known keys hold `null` placeholders.
    pub extra: Mapping,
}

impl TechniqueGroup {
    /// Creates an empty group for a technique.
    #[must_use]
    pub fn new(attack_technique: impl Into<String>) -> Self {
        Self {
            attack_technique: attack_technique.into(),
            atomic_tests: Vec::new(),
            extra: Mapping::new(),
        }
    }
}

impl<'de> Deserialize<'de> for TechniqueGroup {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut extra = Mapping::deserialize(deserializer)?;
        let attack_technique = take_field(&mut extra, TECHNIQUE_KEY)
            .map_err(D::Error::custom)?
            .ok_or_else(|| D::Error::missing_field(TECHNIQUE_KEY))?;
        let atomic_tests =
            take_field(&mut extra, TESTS_KEY).map_err(D::Error::custom)?.unwrap_or_default();
        Ok(Self {
            attack_technique,
            atomic_tests,
            extra,
        })
    }
}

impl Serialize for TechniqueGroup {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let tests = serde_yaml::to_value(&self.atomic_tests).map_err(S::Error::custom)?;
        let mut node = self.extra.clone();
        node.insert(Value::from(TECHNIQUE_KEY), Value::from(self.attack_technique.as_str()));
        node.insert(Value::from(TESTS_KEY), tests);
        node.serialize(serializer)
    }
}

/// The persisted index document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputIndex {
    /// Technique groups in first-seen order.
    pub atomics: Vec<TechniqueGroup>,
    /// Root layout as read from disk; `atomics` holds a `null` placeholder.
    pub extra: Mapping,
}

impl<'de> Deserialize<'de> for OutputIndex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut extra = Mapping::deserialize(deserializer)?;
        let atomics =
            take_field(&mut extra, ATOMICS_KEY).map_err(D::Error::custom)?.unwrap_or_default();
        Ok(Self {
            atomics,
            extra,
        })
    }
}

impl Serialize for OutputIndex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let atomics = serde_yaml::to_value(&self.atomics).map_err(S::Error::custom)?;
        let mut node = self.extra.clone();
        node.insert(Value::from(ATOMICS_KEY), atomics);
        node.serialize(serializer)
    }
}

impl OutputIndex {
    /// Returns the total number of reduced tests across all groups.
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.atomics.iter().map(|group| group.atomic_tests.len()).sum()
    }

    /// Returns the group for a technique, if present.
    #[must_use]
    pub fn group(&self, attack_technique: &str) -> Option<&TechniqueGroup> {
        self.atomics.iter().find(|group| group.attack_technique == attack_technique)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Takes a known key out of `node`, leaving a `null` placeholder in its slot.
///
/// Absent and `null` values both yield `None`.
fn take_field<T: DeserializeOwned>(
    node: &mut Mapping,
    key: &str,
) -> Result<Option<T>, serde_yaml::Error> {
    let Some(slot) = node.get_mut(key) else {
        return Ok(None);
    };
    let value = std::mem::replace(slot, Value::Null);
    if value.is_null() {
        return Ok(None);
    }
    serde_yaml::from_value(value).map(Some)
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

    #[test]
    fn test_entry_defaults_missing_platforms_to_empty() {
        let entry: TestEntry =
            serde_yaml::from_str("name: demo\nauto_generated_guid: g1\n").expect("parse entry");
        assert!(entry.supported_platforms.is_empty());
        assert!(!entry.supports(TARGET_PLATFORM));
    }

    #[test]
    fn test_entry_supports_matches_literal_platform() {
        let entry = TestEntry {
            supported_platforms: vec!["macos".to_string(), "linux".to_string()],
            ..TestEntry::default()
        };
        assert!(entry.supports("linux"));
        assert!(!entry.supports("Linux"));
    }

    #[test]
    fn project_requires_name_and_guid() {
        let complete = TestEntry {
            name: Some("demo".to_string()),
            auto_generated_guid: Some("g1".to_string()),
            ..TestEntry::default()
        };
        assert_eq!(ReducedTestEntry::project(&complete), Some(ReducedTestEntry::new("demo", "g1")));

        let nameless = TestEntry {
            auto_generated_guid: Some("g1".to_string()),
            ..TestEntry::default()
        };
        assert_eq!(ReducedTestEntry::project(&nameless), None);
    }

    #[test]
    fn index_round_trip_keeps_unknown_keys() {
        let source = "atomics:\n- attack_technique: T1001\n  atomic_tests:\n  - name: one\n    \
                      auto_generated_guid: g1\n    reviewed: true\n  owner: red\n";
        let index: OutputIndex = serde_yaml::from_str(source).expect("parse index");
        let group = index.group("T1001").expect("group present");
        assert_eq!(group.extra.get("owner"), Some(&Value::from("red")));
        assert_eq!(group.atomic_tests[0].extra.get("reviewed"), Some(&Value::from(true)));

        let rendered = serde_yaml::to_string(&index).expect("render index");
        assert_eq!(rendered, source);
    }

    #[test]
    fn index_round_trip_keeps_on_disk_key_order() {
        let source = "version: 2\natomics:\n- owner: red\n  attack_technique: T1999\n  \
                      atomic_tests:\n  - auto_generated_guid: g9\n    name: Kept\nnotes: end\n";
        let index: OutputIndex = serde_yaml::from_str(source).expect("parse index");
        assert_eq!(index.atomics[0].atomic_tests[0].name, "Kept");

        let rendered = serde_yaml::to_string(&index).expect("render index");
        assert_eq!(rendered, source);
    }

    #[test]
    fn appended_tests_keep_known_key_order_of_new_nodes() {
        let source = "atomics:\n- atomic_tests:\n  - auto_generated_guid: g1\n    name: one\n  \
                      attack_technique: T1001\n";
        let mut index: OutputIndex = serde_yaml::from_str(source).expect("parse index");
        index.atomics[0].atomic_tests.push(ReducedTestEntry::new("two", "g2"));
        index.atomics.push(TechniqueGroup::new("T1002"));

        let rendered = serde_yaml::to_string(&index).expect("render index");
        assert_eq!(
            rendered,
            "atomics:\n- atomic_tests:\n  - auto_generated_guid: g1\n    name: one\n  - name: \
             two\n    auto_generated_guid: g2\n  attack_technique: T1001\n- attack_technique: \
             T1002\n  atomic_tests: []\n"
        );
    }

    #[test]
    fn null_atomic_tests_read_as_empty_group() {
        let group: TechniqueGroup =
            serde_yaml::from_str("attack_technique: T1001\natomic_tests:\n").expect("parse group");
        assert!(group.atomic_tests.is_empty());
    }

    #[test]
    fn reduced_entry_requires_guid() {
        let err = serde_yaml::from_str::<ReducedTestEntry>("name: orphan\n").expect_err("no guid");
        assert!(err.to_string().contains("auto_generated_guid"));
    }
}

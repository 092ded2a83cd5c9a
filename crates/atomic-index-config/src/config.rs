// crates/atomic-index-config/src/config.rs
// ============================================================================
// Module: Atomic Index Configuration
// Description: Configuration loading and validation for atomic-index.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: atomic-index-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The file is optional: when neither `--config` nor `ATOMIC_INDEX_CONFIG`
//! names one and `atomic-index.toml` is absent, built-in defaults apply. An
//! explicitly named file that cannot be read is an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::path::Path;
use std::path::PathBuf;

use atomic_index_core::IndexError;
use atomic_index_core::RunOptions;
use atomic_index_core::ScanOptions;
use atomic_index_core::io::read_bytes_with_limit;
use atomic_index_core::pipeline::DEFAULT_MAX_FILE_BYTES;
use atomic_index_core::pipeline::DEFAULT_MAX_INDEX_BYTES;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "atomic-index.toml";
/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "ATOMIC_INDEX_CONFIG";
/// Maximum size of the config file.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of one path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum length of a full path.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound for `scan.max_file_bytes`.
pub(crate) const MAX_FILE_BYTES_LIMIT: usize = 64 * 1024 * 1024;
/// Upper bound for `index.max_index_bytes`.
pub(crate) const MAX_INDEX_BYTES_LIMIT: usize = 512 * 1024 * 1024;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level atomic-index configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtomicIndexConfig {
    /// Discovery and extraction settings.
    #[serde(default)]
    pub scan: ScanConfig,
    /// Index document settings.
    #[serde(default)]
    pub index: IndexConfig,
    /// Run event logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Discovery and extraction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Follow symbolic links while walking the input directory.
    #[serde(default)]
    pub follow_links: bool,
    /// Maximum size of one technique document, in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_links: false,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Index document settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Maximum size of the persisted index, in bytes.
    #[serde(default = "default_max_index_bytes")]
    pub max_index_bytes: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_index_bytes: DEFAULT_MAX_INDEX_BYTES,
        }
    }
}

/// Run event sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSinkKind {
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to `logging.path`.
    File,
    /// Events are discarded.
    #[default]
    None,
}

/// Run event logging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Selected sink.
    #[serde(default)]
    pub sink: EventSinkKind,
    /// Event log path, required for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Where the config file path came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named by `--config` or the environment; must exist.
    Explicit(PathBuf),
    /// The default filename; optional.
    Default(PathBuf),
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl AtomicIndexConfig {
    /// Loads configuration from `path`, the environment, or the default file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicit config file is missing, or any
    /// config file fails path, size, encoding, parse, or validation checks.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match resolve_source(path, env::var(CONFIG_ENV_VAR).ok())? {
            ConfigSource::Explicit(path) => Self::load_file(&path),
            ConfigSource::Default(path) if path.is_file() => Self::load_file(&path),
            ConfigSource::Default(_) => Ok(Self::default()),
        }
    }

    /// Loads and validates the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file fails path, size, encoding,
    /// parse, or validation checks.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes =
            read_bytes_with_limit(path, MAX_CONFIG_FILE_SIZE).map_err(|err| match err {
                IndexError::TooLarge { .. } => {
                    ConfigError::Invalid("config file exceeds size limit".to_string())
                }
                other => ConfigError::Io(other.to_string()),
            })?;
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates config text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML and
    /// [`ConfigError::Invalid`] for out-of-range settings.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scan.validate()?;
        self.index.validate()?;
        self.logging.validate()
    }

    /// Returns the pipeline options described by this configuration.
    #[must_use]
    pub const fn run_options(&self) -> RunOptions {
        RunOptions {
            scan: ScanOptions {
                follow_links: self.scan.follow_links,
                max_file_bytes: self.scan.max_file_bytes,
            },
            max_index_bytes: self.index.max_index_bytes,
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

impl ScanConfig {
    /// Validates scan limits.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_byte_limit("scan.max_file_bytes", self.max_file_bytes, MAX_FILE_BYTES_LIMIT)
    }
}

impl IndexConfig {
    /// Validates index limits.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_byte_limit("index.max_index_bytes", self.max_index_bytes, MAX_INDEX_BYTES_LIMIT)
    }
}

impl LoggingConfig {
    /// Validates sink and path pairing.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (EventSinkKind::File, None) => Err(ConfigError::Invalid(
                "logging.path is required when logging.sink = \"file\"".to_string(),
            )),
            (EventSinkKind::File, Some(path)) => {
                validate_path_string("logging.path", &path.to_string_lossy())
            }
            (_, Some(_)) => Err(ConfigError::Invalid(
                "logging.path is only valid when logging.sink = \"file\"".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default for `scan.max_file_bytes`.
const fn default_max_file_bytes() -> usize {
    DEFAULT_MAX_FILE_BYTES
}

/// Default for `index.max_index_bytes`.
const fn default_max_index_bytes() -> usize {
    DEFAULT_MAX_INDEX_BYTES
}

/// Resolves the config source from CLI or environment defaults.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the environment path is too long.
pub fn resolve_source(
    path: Option<&Path>,
    env_path: Option<String>,
) -> Result<ConfigSource, ConfigError> {
    if let Some(path) = path {
        return Ok(ConfigSource::Explicit(path.to_path_buf()));
    }
    if let Some(env_path) = env_path {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(ConfigSource::Explicit(PathBuf::from(env_path)));
    }
    Ok(ConfigSource::Default(PathBuf::from(DEFAULT_CONFIG_NAME)))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a byte limit lies within `1..=max`.
fn validate_byte_limit(field: &str, value: usize, max: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(format!("{field} must be greater than zero")));
    }
    if value > max {
        return Err(ConfigError::Invalid(format!("{field} must be at most {max}")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

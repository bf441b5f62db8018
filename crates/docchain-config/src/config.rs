// crates/docchain-config/src/config.rs
// ============================================================================
// Module: DocChain Configuration
// Description: Configuration loading and validation for the registry host.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: docchain-core, docchain-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `DOCCHAIN_CONFIG`, then
//! `./docchain.toml`. Only the implicit default file may be absent, in which
//! case built-in defaults apply. Everything else fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use docchain_core::DEFAULT_ALLOWED_EXTENSIONS;
use docchain_core::DEFAULT_AUDIT_RETENTION;
use docchain_core::DEFAULT_HISTORY_LIMIT;
use docchain_core::DEFAULT_MAX_INPUT_BYTES;
use docchain_core::EngineConfig;
use docchain_store_sqlite::SqliteStoreConfig;
use docchain_store_sqlite::SqliteStoreMode;
use docchain_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "docchain.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "DOCCHAIN_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default `SQLite` database path used when the sqlite store omits one.
pub const DEFAULT_STORE_PATH: &str = "docchain.sqlite";
/// Default `SQLite` busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single allowed extension.
const MAX_EXTENSION_LENGTH: usize = 16;
/// Maximum number of allowed extensions.
const MAX_ALLOWED_EXTENSIONS: usize = 64;

// ============================================================================
// SECTION: Root Configuration
// ============================================================================

/// `DocChain` configuration loaded from `docchain.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocchainConfig {
    /// Document store backend configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Audit log configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Registry engine limits.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Operation log sink configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Path the configuration was read from, when one was read.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl DocchainConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved.path)?;
        if !resolved.explicit && !resolved.path.exists() {
            let mut config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved.path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::parse(content)?;
        config.source_path = Some(resolved.path);
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.audit.validate()?;
        self.registry.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Returns the `SQLite` store configuration, or `None` for the memory
    /// backend.
    #[must_use]
    pub fn sqlite_store_config(&self) -> Option<SqliteStoreConfig> {
        match self.store.store_type {
            StoreType::Memory => None,
            StoreType::Sqlite => {
                let path =
                    self.store.path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));
                Some(SqliteStoreConfig {
                    path,
                    busy_timeout_ms: self.store.busy_timeout_ms,
                    journal_mode: self.store.journal_mode,
                    sync_mode: self.store.sync_mode,
                    audit_retention: self.audit.retention,
                })
            }
        }
    }

    /// Returns the engine configuration for the registry limits.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        self.registry.engine_config()
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Document store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory store must not set path".to_string()));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                if let Some(path) = &self.path {
                    validate_path_string("store.path", &path.to_string_lossy())?;
                }
                if self.busy_timeout_ms == 0 {
                    return Err(ConfigError::Invalid(
                        "store busy_timeout_ms must be greater than zero".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Document store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use the in-memory store; state is lost when the process exits.
    Memory,
    /// Use the `SQLite`-backed durable store.
    #[default]
    Sqlite,
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit log configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Maximum number of retained audit events.
    #[serde(default = "default_audit_retention")]
    pub retention: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            retention: default_audit_retention(),
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.retention == 0 {
            return Err(ConfigError::Invalid(
                "audit retention must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registry engine limits.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Maximum accepted input size in bytes.
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,
    /// Accepted file extensions.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Default number of events returned by history queries.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_input_bytes(),
            allowed_extensions: default_allowed_extensions(),
            history_limit: default_history_limit(),
        }
    }
}

impl RegistryConfig {
    /// Validates registry limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_input_bytes == 0 {
            return Err(ConfigError::Invalid(
                "registry max_input_bytes must be greater than zero".to_string(),
            ));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "registry history_limit must be greater than zero".to_string(),
            ));
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "registry allowed_extensions must be non-empty".to_string(),
            ));
        }
        if self.allowed_extensions.len() > MAX_ALLOWED_EXTENSIONS {
            return Err(ConfigError::Invalid(
                "registry allowed_extensions exceeds max entries".to_string(),
            ));
        }
        for extension in &self.allowed_extensions {
            if extension.is_empty()
                || extension.len() > MAX_EXTENSION_LENGTH
                || !extension.chars().all(|ch| ch.is_ascii_alphanumeric())
            {
                return Err(ConfigError::Invalid(format!(
                    "registry allowed_extensions entry {extension:?} must be 1-{MAX_EXTENSION_LENGTH} \
                     ascii alphanumerics"
                )));
            }
        }
        Ok(())
    }

    /// Returns the engine configuration for these limits.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        let allowed: BTreeSet<String> =
            self.allowed_extensions.iter().map(|ext| ext.to_ascii_lowercase()).collect();
        EngineConfig {
            max_input_bytes: Some(self.max_input_bytes),
            allowed_extensions: Some(allowed),
            ..EngineConfig::default()
        }
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Operation log configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Sink receiving operation log lines.
    #[serde(default)]
    pub sink: LogSinkType,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.sink {
            LogSinkType::File => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("file logging sink requires path".to_string())
                })?;
                validate_path_string("logging.path", &path.to_string_lossy())
            }
            LogSinkType::Stderr | LogSinkType::None => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "logging path is only valid for the file sink".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Operation log sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkType {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard operation logs.
    None,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
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

/// Config path plus whether the caller chose it.
struct ResolvedPath {
    /// Resolved path.
    path: PathBuf,
    /// True when the path came from the CLI or the environment.
    explicit: bool,
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<ResolvedPath, ConfigError> {
    if let Some(path) = path {
        return Ok(ResolvedPath {
            path: path.to_path_buf(),
            explicit: true,
        });
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(ResolvedPath {
            path: PathBuf::from(env_path),
            explicit: true,
        });
    }
    Ok(ResolvedPath {
        path: PathBuf::from(DEFAULT_CONFIG_NAME),
        explicit: false,
    })
}

/// Validates the resolved path against security limits.
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
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default busy timeout for the sqlite store.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Default audit retention.
const fn default_audit_retention() -> usize {
    DEFAULT_AUDIT_RETENTION
}

/// Default input size cap.
const fn default_max_input_bytes() -> u64 {
    DEFAULT_MAX_INPUT_BYTES
}

/// Default history page size.
const fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

/// Default extension allow-list.
fn default_allowed_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS.iter().map(|ext| (*ext).to_string()).collect()
}

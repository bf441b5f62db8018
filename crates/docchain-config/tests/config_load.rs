// crates/docchain-config/tests/config_load.rs
// ============================================================================
// Module: Config Load Tests
// Description: Validate docchain.toml parsing, limits, and cross-field rules.
// Purpose: Ensure configuration stays fail-closed and maps onto runtime types.
// ============================================================================

//! ## Overview
//! Loads configuration from temp files and inline TOML, checking defaults,
//! rejection messages, and the derived store and engine settings.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::path::PathBuf;

use docchain_config::ConfigError;
use docchain_config::DEFAULT_STORE_PATH;
use docchain_config::DocchainConfig;
use docchain_config::LogSinkType;
use docchain_config::StoreType;
use docchain_config::config_toml_example;
use docchain_core::DEFAULT_AUDIT_RETENTION;
use docchain_core::DEFAULT_HISTORY_LIMIT;
use docchain_core::EngineConfig;
use docchain_store_sqlite::SqliteStoreMode;
use docchain_store_sqlite::SqliteSyncMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Asserts that parsing `toml` fails with an invalid-config message containing `needle`.
fn assert_invalid(toml: &str, needle: &str) {
    match DocchainConfig::parse(toml) {
        Err(ConfigError::Invalid(message)) => {
            assert!(message.contains(needle), "error {message} did not contain {needle}");
        }
        Err(other) => panic!("expected invalid config, got {other}"),
        Ok(_) => panic!("expected invalid config for {toml}"),
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn empty_config_uses_defaults() {
    let config = DocchainConfig::parse("").unwrap();
    assert_eq!(config.store.store_type, StoreType::Sqlite);
    assert_eq!(config.audit.retention, DEFAULT_AUDIT_RETENTION);
    assert_eq!(config.registry.history_limit, DEFAULT_HISTORY_LIMIT);
    assert_eq!(config.logging.sink, LogSinkType::Stderr);
    assert_eq!(config.engine_config(), EngineConfig::restricted());

    let sqlite = config.sqlite_store_config().unwrap();
    assert_eq!(sqlite.path, PathBuf::from(DEFAULT_STORE_PATH));
    assert_eq!(sqlite.busy_timeout_ms, 5_000);
    assert_eq!(sqlite.journal_mode, SqliteStoreMode::Wal);
    assert_eq!(sqlite.sync_mode, SqliteSyncMode::Full);
    assert_eq!(sqlite.audit_retention, DEFAULT_AUDIT_RETENTION);
}

#[test]
fn example_config_matches_defaults() {
    let example = DocchainConfig::parse(&config_toml_example()).unwrap();
    let defaults = DocchainConfig::parse("").unwrap();
    assert_eq!(example.engine_config(), defaults.engine_config());
    assert_eq!(example.audit.retention, defaults.audit.retention);
    assert_eq!(
        example.sqlite_store_config().unwrap().path,
        defaults.sqlite_store_config().unwrap().path
    );
}

// ============================================================================
// SECTION: File Loading
// ============================================================================

#[test]
fn load_reads_explicit_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docchain.toml");
    fs::write(
        &path,
        r#"
[store]
type = "memory"

[audit]
retention = 25

[registry]
max_input_bytes = 1024
allowed_extensions = ["PDF", "txt"]
history_limit = 5

[logging]
sink = "none"
"#,
    )
    .unwrap();
    let config = DocchainConfig::load(Some(&path)).unwrap();
    assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    assert!(config.sqlite_store_config().is_none());
    assert_eq!(config.audit.retention, 25);
    assert_eq!(config.registry.history_limit, 5);
    assert_eq!(config.logging.sink, LogSinkType::None);

    let engine = config.engine_config();
    assert_eq!(engine.max_input_bytes, Some(1024));
    let allowed: Vec<String> = engine.allowed_extensions.unwrap().into_iter().collect();
    assert_eq!(allowed, vec!["pdf".to_string(), "txt".to_string()]);
}

#[test]
fn explicit_missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = DocchainConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn oversized_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docchain.toml");
    let mut content = String::from("# padding\n");
    content.push_str(&"#".repeat(1024 * 1024));
    fs::write(&path, content).unwrap();
    let err = DocchainConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("config file exceeds size limit"));
}

#[test]
fn non_utf8_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docchain.toml");
    fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
    let err = DocchainConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("utf-8"));
}

#[test]
fn overlong_path_component_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("c".repeat(300));
    let err = DocchainConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("config path component too long"));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = DocchainConfig::parse("[store\ntype = ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    let err = DocchainConfig::parse("[store]\ntype = \"postgres\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

// ============================================================================
// SECTION: Validation
// ============================================================================

#[test]
fn memory_store_rejects_path() {
    assert_invalid("[store]\ntype = \"memory\"\npath = \"x.db\"\n", "memory store must not set path");
}

#[test]
fn sqlite_store_rejects_zero_busy_timeout_and_blank_path() {
    assert_invalid("[store]\nbusy_timeout_ms = 0\n", "busy_timeout_ms must be greater than zero");
    assert_invalid("[store]\npath = \"  \"\n", "store.path must be non-empty");
}

#[test]
fn zero_limits_are_rejected() {
    assert_invalid("[audit]\nretention = 0\n", "audit retention must be greater than zero");
    assert_invalid(
        "[registry]\nmax_input_bytes = 0\n",
        "registry max_input_bytes must be greater than zero",
    );
    assert_invalid(
        "[registry]\nhistory_limit = 0\n",
        "registry history_limit must be greater than zero",
    );
}

#[test]
fn extension_list_is_validated() {
    assert_invalid("[registry]\nallowed_extensions = []\n", "allowed_extensions must be non-empty");
    assert_invalid("[registry]\nallowed_extensions = [\".pdf\"]\n", "ascii alphanumerics");
    assert_invalid("[registry]\nallowed_extensions = [\"\"]\n", "ascii alphanumerics");
}

#[test]
fn logging_sink_paths_are_checked() {
    assert_invalid("[logging]\nsink = \"file\"\n", "file logging sink requires path");
    assert_invalid(
        "[logging]\nsink = \"stderr\"\npath = \"ops.log\"\n",
        "logging path is only valid for the file sink",
    );
    let config = DocchainConfig::parse("[logging]\nsink = \"file\"\npath = \"ops.log\"\n").unwrap();
    assert_eq!(config.logging.sink, LogSinkType::File);
    assert_eq!(config.logging.path, Some(PathBuf::from("ops.log")));
}

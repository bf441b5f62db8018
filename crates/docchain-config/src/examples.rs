// crates/docchain-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and `docchain config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `docchain.toml`. Every value shown is the built-in
//! default, so loading the example is equivalent to loading no file.

/// Returns a canonical example `docchain.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[store]
type = "sqlite"
path = "docchain.sqlite"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "full"

[audit]
retention = 1000

[registry]
max_input_bytes = 16777216
allowed_extensions = ["pdf", "png", "jpg", "jpeg", "txt", "doc", "docx", "zip"]
history_limit = 50

[logging]
sink = "stderr"
"#,
    )
}

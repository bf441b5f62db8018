// crates/docchain-store-sqlite/src/lib.rs
// ============================================================================
// Module: DocChain SQLite Store Library
// Description: SQLite-backed document store and audit log.
// Purpose: Persist the registry durably across process restarts.
// Dependencies: docchain-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteRegistryStore`] implements both
//! [`DocumentStore`](docchain_core::DocumentStore) and
//! [`AuditLog`](docchain_core::AuditLog) over a single database file.
//! Invariants:
//! - Every write commits before returning.
//! - Audit rows carry a canonical JSON hash and fail closed on mismatch.
//! - Audit retention is enforced inside the append transaction.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteRegistryStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;

// crates/docchain-core/src/core/mod.rs
// ============================================================================
// Module: DocChain Core Types
// Description: Canonical document, audit, and fingerprint structures.
// Purpose: Provide stable, serializable types for the registry and its callers.
// Dependencies: serde, sha2, uuid
// ============================================================================

//! ## Overview
//! Core types define document records, audit events, identifiers, and the
//! fingerprinting primitives. These types are the canonical source of truth
//! for any derived API surface (CLI, HTTP, SDKs).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod document;
pub mod fingerprint;
pub mod hashing;
pub mod identifiers;
pub mod stats;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditAction;
pub use audit::AuditEvent;
pub use audit::DEFAULT_AUDIT_RETENTION;
pub use audit::FailureReason;
pub use document::AnchorRef;
pub use document::DEFAULT_OWNER;
pub use document::DocumentRecord;
pub use document::DocumentState;
pub use document::FileName;
pub use document::LabelError;
pub use document::Owner;
pub use fingerprint::DEFAULT_CHUNK_SIZE;
pub use fingerprint::Fingerprint;
pub use fingerprint::Fingerprinter;
pub use fingerprint::InputError;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::normalize_hash;
pub use identifiers::DocumentId;
pub use identifiers::IdentifierError;
pub use stats::RegistryStats;
pub use self::time::Timestamp;

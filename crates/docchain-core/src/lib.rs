// crates/docchain-core/src/lib.rs
// ============================================================================
// Module: DocChain Core Library
// Description: Document registry and verification engine.
// Purpose: Fingerprint content, keep the registry consistent, and audit it.
// Dependencies: serde, serde_jcs, sha2, thiserror, time, uuid
// ============================================================================

//! ## Overview
//! DocChain records content fingerprints against document identifiers,
//! accepts caller-confirmed external anchors, and re-verifies presented
//! content against the stored record. Every mutation and verification is
//! written to a bounded, append-only audit log.
//! Invariants:
//! - A record's fingerprint never changes after registration.
//! - A record is anchored at most once.
//! - The audit log never exceeds its retention bound.
//!
//! Transport, ledger clients, and upload file storage live outside this crate.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::AnchorRef;
pub use crate::core::AuditAction;
pub use crate::core::AuditEvent;
pub use crate::core::DEFAULT_AUDIT_RETENTION;
pub use crate::core::DEFAULT_OWNER;
pub use crate::core::DocumentId;
pub use crate::core::DocumentRecord;
pub use crate::core::DocumentState;
pub use crate::core::FailureReason;
pub use crate::core::FileName;
pub use crate::core::Fingerprint;
pub use crate::core::Fingerprinter;
pub use crate::core::HashAlgorithm;
pub use crate::core::HashDigest;
pub use crate::core::InputError;
pub use crate::core::Owner;
pub use crate::core::RegistryStats;
pub use crate::core::Timestamp;
pub use crate::core::hashing;
pub use crate::core::normalize_hash;
pub use crate::interfaces::AnchorWrite;
pub use crate::interfaces::AuditLog;
pub use crate::interfaces::Clock;
pub use crate::interfaces::DocumentStore;
pub use crate::interfaces::RegistryBackend;
pub use crate::interfaces::StoreError;
pub use crate::runtime::AnchorConfirmation;
pub use crate::runtime::AnchorInstructions;
pub use crate::runtime::DEFAULT_ALLOWED_EXTENSIONS;
pub use crate::runtime::DEFAULT_HISTORY_LIMIT;
pub use crate::runtime::DEFAULT_MAX_INPUT_BYTES;
pub use crate::runtime::EngineConfig;
pub use crate::runtime::ErrorKind;
pub use crate::runtime::InMemoryAuditLog;
pub use crate::runtime::InMemoryDocumentStore;
pub use crate::runtime::InMemoryRegistry;
pub use crate::runtime::RegisterRequest;
pub use crate::runtime::Registration;
pub use crate::runtime::RegistryEngine;
pub use crate::runtime::RegistryError;
pub use crate::runtime::SharedRegistryBackend;
pub use crate::runtime::SystemClock;
pub use crate::runtime::VerificationOutcome;
pub use crate::runtime::VerifyReason;
pub use crate::runtime::VerifyRequest;

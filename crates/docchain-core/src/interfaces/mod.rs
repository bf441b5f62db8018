// crates/docchain-core/src/interfaces/mod.rs
// ============================================================================
// Module: DocChain Interfaces
// Description: Backend-agnostic storage, audit, and clock interfaces.
// Purpose: Define the contract surfaces used by the registry engine.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The registry engine owns every business rule; the collaborators defined
//! here are passive. A [`DocumentStore`] overwrites unconditionally and an
//! [`AuditLog`] appends unconditionally, so backends can be swapped (memory,
//! `SQLite`, or anything else) without changing registry semantics.
//!
//! A [`RegistryBackend`] joins both behind one commit boundary. Its
//! conditional writes check the stored record and persist the record with its
//! audit event in a single atomic step, serialized across every handle that
//! shares the backend (clones, other engines, other processes).
//!
//! Implementations must make each write durable before returning and must be
//! atomic with respect to concurrent callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::AnchorRef;
use crate::core::AuditAction;
use crate::core::AuditEvent;
use crate::core::DocumentId;
use crate::core::DocumentRecord;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Storage errors shared by document stores and audit logs.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("registry store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("registry store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("registry store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("registry store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("registry store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Document Store
// ============================================================================

/// Durable mapping from document identifier to record.
pub trait DocumentStore {
    /// Inserts or overwrites the record keyed by its `document_id`.
    ///
    /// Overwriting keeps the record's original insertion position.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write cannot be made durable.
    fn upsert(&self, record: &DocumentRecord) -> Result<(), StoreError>;

    /// Loads a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn get(&self, document_id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError>;

    /// Returns the earliest-inserted record whose hash equals `normalized_hash`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn find_by_hash(&self, normalized_hash: &str) -> Result<Option<DocumentRecord>, StoreError>;

    /// Returns all records, newest `created_at` first.
    ///
    /// Records sharing a timestamp are ordered most recently inserted first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn list_all(&self) -> Result<Vec<DocumentRecord>, StoreError>;

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when counting fails.
    fn count(&self) -> Result<u64, StoreError>;

    /// Returns the number of records matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn count_where(&self, predicate: &dyn Fn(&DocumentRecord) -> bool)
    -> Result<u64, StoreError>;
}

// ============================================================================
// SECTION: Audit Log
// ============================================================================

/// Append-only, size-bounded audit event sequence.
pub trait AuditLog {
    /// Appends an event, evicting the oldest events beyond the retention bound.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the append cannot be made durable.
    fn append(&self, event: &AuditEvent) -> Result<(), StoreError>;

    /// Returns up to `limit` events, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn list_recent(&self, limit: usize) -> Result<Vec<AuditEvent>, StoreError>;

    /// Returns the number of retained events.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when counting fails.
    fn len(&self) -> Result<u64, StoreError>;

    /// Returns true when no events are retained.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when counting fails.
    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Returns the number of retained events with the given action.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when counting fails.
    fn count_action(&self, action: AuditAction) -> Result<u64, StoreError>;

    /// Returns the retention bound.
    fn retention(&self) -> usize;
}

// ============================================================================
// SECTION: Registry Backend
// ============================================================================

/// Result of a conditional anchor write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorWrite {
    /// The record was anchored and its event appended.
    Anchored(DocumentRecord),
    /// The record already carried an anchor; nothing was written.
    AlreadyAnchored(DocumentRecord),
    /// No record exists for the id; nothing was written.
    Missing,
}

/// Document store and audit log sharing one commit boundary.
///
/// # Invariants
/// - A conditional write either persists the record and its event together
///   or persists neither.
/// - The check and the write of a conditional write are serialized against
///   every other conditional write on the same backend.
pub trait RegistryBackend: DocumentStore + AuditLog {
    /// Inserts `record` and appends `event` unless the id is already present.
    ///
    /// Returns the stored record, untouched, when the id exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the commit fails; nothing is written then.
    fn insert_if_absent(
        &self,
        record: &DocumentRecord,
        event: &AuditEvent,
    ) -> Result<Option<DocumentRecord>, StoreError>;

    /// Anchors an unanchored record and appends `event` in the same commit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the commit fails; nothing is written then.
    fn anchor_if_unanchored(
        &self,
        document_id: &DocumentId,
        anchor_ref: &AnchorRef,
        anchored_at: Timestamp,
        event: &AuditEvent,
    ) -> Result<AnchorWrite, StoreError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Time source for registry timestamps.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

// crates/docchain-core/src/runtime/store.rs
// ============================================================================
// Module: DocChain In-Memory Stores
// Description: In-memory document store, bounded audit log, and shared backends.
// Purpose: Provide simple backends for tests and ephemeral registries.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryDocumentStore`] keeps records keyed by id alongside an insertion
//! sequence and a secondary hash index, so `find_by_hash` is a map lookup
//! rather than a scan. [`InMemoryAuditLog`] is a FIFO ring bounded by its
//! retention setting. [`InMemoryRegistry`] pairs the two and locks both for
//! its conditional writes, so every clone observes them atomically. None of
//! them survives process exit.
//!
//! [`SharedRegistryBackend`] erases a concrete backend behind an
//! `Arc<dyn ..>` so hosts can pick a backend at runtime without making the
//! engine generic over the choice.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::AnchorRef;
use crate::core::AuditAction;
use crate::core::AuditEvent;
use crate::core::DEFAULT_AUDIT_RETENTION;
use crate::core::DocumentId;
use crate::core::DocumentRecord;
use crate::core::Timestamp;
use crate::interfaces::AnchorWrite;
use crate::interfaces::AuditLog;
use crate::interfaces::DocumentStore;
use crate::interfaces::RegistryBackend;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Document Store
// ============================================================================

/// Stored record with its insertion sequence.
#[derive(Debug, Clone)]
struct StoredDocument {
    /// Insertion sequence; preserved across overwrites.
    seq: u64,
    /// Current record.
    record: DocumentRecord,
}

/// Mutable state of the in-memory document store.
#[derive(Debug, Default)]
struct DocumentTable {
    /// Next insertion sequence.
    next_seq: u64,
    /// Records keyed by id.
    rows: BTreeMap<DocumentId, StoredDocument>,
    /// Hash index: hash -> insertion sequence -> id.
    by_hash: BTreeMap<String, BTreeMap<u64, DocumentId>>,
}

impl DocumentTable {
    /// Removes `seq` from the index entry for `hash`.
    fn unindex(&mut self, hash: &str, seq: u64) {
        if let Some(entries) = self.by_hash.get_mut(hash) {
            entries.remove(&seq);
            if entries.is_empty() {
                self.by_hash.remove(hash);
            }
        }
    }

    /// Inserts or overwrites `record`, keeping the original insertion sequence.
    fn put(&mut self, record: &DocumentRecord) {
        let seq = if let Some(existing) = self.rows.get(&record.document_id) {
            let seq = existing.seq;
            let previous_hash = existing.record.file_hash.clone();
            self.unindex(&previous_hash, seq);
            seq
        } else {
            let seq = self.next_seq;
            self.next_seq = self.next_seq.saturating_add(1);
            seq
        };
        self.by_hash
            .entry(record.file_hash.clone())
            .or_default()
            .insert(seq, record.document_id.clone());
        self.rows.insert(
            record.document_id.clone(),
            StoredDocument {
                seq,
                record: record.clone(),
            },
        );
    }
}

/// In-memory document store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    /// Table state protected by a mutex.
    table: Arc<Mutex<DocumentTable>>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the table, mapping poisoning to a store error.
    fn lock(&self) -> Result<MutexGuard<'_, DocumentTable>, StoreError> {
        self.table
            .lock()
            .map_err(|_| StoreError::Store("document store mutex poisoned".to_string()))
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn upsert(&self, record: &DocumentRecord) -> Result<(), StoreError> {
        self.lock()?.put(record);
        Ok(())
    }

    fn get(&self, document_id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.rows.get(document_id).map(|stored| stored.record.clone()))
    }

    fn find_by_hash(&self, normalized_hash: &str) -> Result<Option<DocumentRecord>, StoreError> {
        let guard = self.lock()?;
        let Some((_, document_id)) =
            guard.by_hash.get(normalized_hash).and_then(|entries| entries.first_key_value())
        else {
            return Ok(None);
        };
        Ok(guard.rows.get(document_id).map(|stored| stored.record.clone()))
    }

    fn list_all(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        let guard = self.lock()?;
        let mut rows: Vec<&StoredDocument> = guard.rows.values().collect();
        rows.sort_by(|left, right| {
            right
                .record
                .created_at
                .cmp(&left.record.created_at)
                .then_with(|| right.seq.cmp(&left.seq))
        });
        Ok(rows.into_iter().map(|stored| stored.record.clone()).collect())
    }

    fn count(&self) -> Result<u64, StoreError> {
        let guard = self.lock()?;
        Ok(u64::try_from(guard.rows.len()).unwrap_or(u64::MAX))
    }

    fn count_where(
        &self,
        predicate: &dyn Fn(&DocumentRecord) -> bool,
    ) -> Result<u64, StoreError> {
        let guard = self.lock()?;
        let matched = guard.rows.values().filter(|stored| predicate(&stored.record)).count();
        Ok(u64::try_from(matched).unwrap_or(u64::MAX))
    }
}

// ============================================================================
// SECTION: In-Memory Audit Log
// ============================================================================

/// In-memory audit log with FIFO eviction.
///
/// # Invariants
/// - Never holds more than `retention` events.
#[derive(Debug, Clone)]
pub struct InMemoryAuditLog {
    /// Events in append order, oldest at the front.
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    /// Maximum retained events.
    retention: usize,
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::with_retention(DEFAULT_AUDIT_RETENTION)
    }
}

impl InMemoryAuditLog {
    /// Creates an empty log with the default retention bound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty log keeping at most `retention` events.
    ///
    /// A zero retention is raised to one.
    #[must_use]
    pub fn with_retention(retention: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            retention: retention.max(1),
        }
    }

    /// Locks the event queue, mapping poisoning to a store error.
    fn lock(&self) -> Result<MutexGuard<'_, VecDeque<AuditEvent>>, StoreError> {
        self.events.lock().map_err(|_| StoreError::Store("audit log mutex poisoned".to_string()))
    }

    /// Pushes `event` onto a locked queue and evicts beyond the retention bound.
    fn push(&self, events: &mut VecDeque<AuditEvent>, event: &AuditEvent) {
        events.push_back(event.clone());
        while events.len() > self.retention {
            events.pop_front();
        }
    }
}

impl AuditLog for InMemoryAuditLog {
    fn append(&self, event: &AuditEvent) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        self.push(&mut guard, event);
        Ok(())
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<AuditEvent>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }

    fn len(&self) -> Result<u64, StoreError> {
        let guard = self.lock()?;
        Ok(u64::try_from(guard.len()).unwrap_or(u64::MAX))
    }

    fn count_action(&self, action: AuditAction) -> Result<u64, StoreError> {
        let guard = self.lock()?;
        let matched = guard.iter().filter(|event| event.action == action).count();
        Ok(u64::try_from(matched).unwrap_or(u64::MAX))
    }

    fn retention(&self) -> usize {
        self.retention
    }
}

// ============================================================================
// SECTION: In-Memory Registry
// ============================================================================

/// In-memory registry backend pairing a document store with an audit log.
///
/// # Invariants
/// - Conditional writes lock the document table before the audit queue and
///   hold both until the record and its event are in place.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    /// Document records.
    documents: InMemoryDocumentStore,
    /// Audit trail.
    audit: InMemoryAuditLog,
}

impl InMemoryRegistry {
    /// Creates an empty registry with the default audit retention.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry keeping at most `retention` audit events.
    #[must_use]
    pub fn with_retention(retention: usize) -> Self {
        Self {
            documents: InMemoryDocumentStore::new(),
            audit: InMemoryAuditLog::with_retention(retention),
        }
    }
}

impl DocumentStore for InMemoryRegistry {
    fn upsert(&self, record: &DocumentRecord) -> Result<(), StoreError> {
        self.documents.upsert(record)
    }

    fn get(&self, document_id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        self.documents.get(document_id)
    }

    fn find_by_hash(&self, normalized_hash: &str) -> Result<Option<DocumentRecord>, StoreError> {
        self.documents.find_by_hash(normalized_hash)
    }

    fn list_all(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        self.documents.list_all()
    }

    fn count(&self) -> Result<u64, StoreError> {
        self.documents.count()
    }

    fn count_where(
        &self,
        predicate: &dyn Fn(&DocumentRecord) -> bool,
    ) -> Result<u64, StoreError> {
        self.documents.count_where(predicate)
    }
}

impl AuditLog for InMemoryRegistry {
    fn append(&self, event: &AuditEvent) -> Result<(), StoreError> {
        self.audit.append(event)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<AuditEvent>, StoreError> {
        self.audit.list_recent(limit)
    }

    fn len(&self) -> Result<u64, StoreError> {
        self.audit.len()
    }

    fn count_action(&self, action: AuditAction) -> Result<u64, StoreError> {
        self.audit.count_action(action)
    }

    fn retention(&self) -> usize {
        self.audit.retention()
    }
}

impl RegistryBackend for InMemoryRegistry {
    fn insert_if_absent(
        &self,
        record: &DocumentRecord,
        event: &AuditEvent,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        let mut table = self.documents.lock()?;
        if let Some(existing) = table.rows.get(&record.document_id) {
            return Ok(Some(existing.record.clone()));
        }
        let mut events = self.audit.lock()?;
        table.put(record);
        self.audit.push(&mut events, event);
        Ok(None)
    }

    fn anchor_if_unanchored(
        &self,
        document_id: &DocumentId,
        anchor_ref: &AnchorRef,
        anchored_at: Timestamp,
        event: &AuditEvent,
    ) -> Result<AnchorWrite, StoreError> {
        let mut table = self.documents.lock()?;
        let Some(stored) = table.rows.get(document_id) else {
            return Ok(AnchorWrite::Missing);
        };
        if stored.record.anchored {
            return Ok(AnchorWrite::AlreadyAnchored(stored.record.clone()));
        }
        let updated = stored.record.clone().into_anchored(anchor_ref.clone(), anchored_at);
        let mut events = self.audit.lock()?;
        table.put(&updated);
        self.audit.push(&mut events, event);
        Ok(AnchorWrite::Anchored(updated))
    }
}

// ============================================================================
// SECTION: Shared Backend
// ============================================================================

/// Shared registry backend behind a trait object.
#[derive(Clone)]
pub struct SharedRegistryBackend {
    /// Inner backend implementation.
    inner: Arc<dyn RegistryBackend + Send + Sync>,
}

impl SharedRegistryBackend {
    /// Wraps a registry backend implementation.
    #[must_use]
    pub fn new(backend: impl RegistryBackend + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(backend),
        }
    }
}

impl DocumentStore for SharedRegistryBackend {
    fn upsert(&self, record: &DocumentRecord) -> Result<(), StoreError> {
        self.inner.upsert(record)
    }

    fn get(&self, document_id: &DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        self.inner.get(document_id)
    }

    fn find_by_hash(&self, normalized_hash: &str) -> Result<Option<DocumentRecord>, StoreError> {
        self.inner.find_by_hash(normalized_hash)
    }

    fn list_all(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        self.inner.list_all()
    }

    fn count(&self) -> Result<u64, StoreError> {
        self.inner.count()
    }

    fn count_where(
        &self,
        predicate: &dyn Fn(&DocumentRecord) -> bool,
    ) -> Result<u64, StoreError> {
        self.inner.count_where(predicate)
    }
}

impl AuditLog for SharedRegistryBackend {
    fn append(&self, event: &AuditEvent) -> Result<(), StoreError> {
        self.inner.append(event)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<AuditEvent>, StoreError> {
        self.inner.list_recent(limit)
    }

    fn len(&self) -> Result<u64, StoreError> {
        self.inner.len()
    }

    fn count_action(&self, action: AuditAction) -> Result<u64, StoreError> {
        self.inner.count_action(action)
    }

    fn retention(&self) -> usize {
        self.inner.retention()
    }
}

impl RegistryBackend for SharedRegistryBackend {
    fn insert_if_absent(
        &self,
        record: &DocumentRecord,
        event: &AuditEvent,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        self.inner.insert_if_absent(record, event)
    }

    fn anchor_if_unanchored(
        &self,
        document_id: &DocumentId,
        anchor_ref: &AnchorRef,
        anchored_at: Timestamp,
        event: &AuditEvent,
    ) -> Result<AnchorWrite, StoreError> {
        self.inner.anchor_if_unanchored(document_id, anchor_ref, anchored_at, event)
    }
}

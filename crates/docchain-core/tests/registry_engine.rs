// crates/docchain-core/tests/registry_engine.rs
// ============================================================================
// Module: Registry Engine Tests
// Description: End-to-end registry scenarios over in-memory backends.
// ============================================================================
//! ## Overview
//! Drives registration, anchor confirmation, and verification through the
//! engine and checks the resulting records, outcomes, audit trail, and stats.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io;
use std::io::Read;
use std::sync::Arc;
use std::sync::Barrier;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::thread;

use docchain_core::AnchorRef;
use docchain_core::AnchorWrite;
use docchain_core::AuditAction;
use docchain_core::AuditEvent;
use docchain_core::AuditLog;
use docchain_core::Clock;
use docchain_core::DocumentId;
use docchain_core::DocumentRecord;
use docchain_core::DocumentState;
use docchain_core::DocumentStore;
use docchain_core::EngineConfig;
use docchain_core::ErrorKind;
use docchain_core::FailureReason;
use docchain_core::FileName;
use docchain_core::HashAlgorithm;
use docchain_core::InMemoryRegistry;
use docchain_core::Owner;
use docchain_core::RegisterRequest;
use docchain_core::Registration;
use docchain_core::RegistryBackend;
use docchain_core::RegistryEngine;
use docchain_core::RegistryError;
use docchain_core::StoreError;
use docchain_core::Timestamp;
use docchain_core::VerifyReason;
use docchain_core::VerifyRequest;
use docchain_core::hashing::hash_bytes;

/// Clock advancing one millisecond per reading.
#[derive(Clone, Default)]
struct StepClock {
    /// Next timestamp to hand out.
    next: Arc<AtomicI64>,
}

impl Clock for StepClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.next.fetch_add(1, Ordering::SeqCst) + 1_000)
    }
}

/// Engine over the in-memory backend.
type TestEngine = RegistryEngine<InMemoryRegistry, StepClock>;

/// Builds an engine with the given config.
fn engine_with(config: EngineConfig) -> TestEngine {
    RegistryEngine::new(InMemoryRegistry::new(), StepClock::default(), config)
}

/// Builds an engine with default config.
fn engine() -> TestEngine {
    engine_with(EngineConfig::default())
}

/// Registers `content` with optional owner and id.
fn register(
    engine: &TestEngine,
    content: &[u8],
    name: &str,
    owner: Option<&str>,
    document_id: Option<&str>,
) -> Result<Registration, RegistryError> {
    engine.register(RegisterRequest {
        reader: content,
        file_name: name.to_string(),
        owner: owner.map(str::to_string),
        document_id: document_id.map(str::to_string),
    })
}

/// Verifies `content` with an optional claimed id.
fn verify(
    engine: &TestEngine,
    content: &[u8],
    document_id: Option<&str>,
) -> Result<docchain_core::VerificationOutcome, RegistryError> {
    engine.verify(VerifyRequest {
        reader: content,
        document_id: document_id.map(str::to_string),
    })
}

/// Returns the audit trail oldest first.
fn audit_trail(engine: &TestEngine) -> Vec<AuditEvent> {
    let mut events = engine.recent_history(usize::MAX).unwrap();
    events.reverse();
    events
}

#[test]
fn report_scenario_end_to_end() {
    let engine = engine();
    let content = b"quarterly report contents";
    let registration = register(&engine, content, "report.pdf", Some("alice"), None).unwrap();
    let record = registration.record.clone();
    let document_id = record.document_id.as_str().to_string();
    let expected_hash = hash_bytes(HashAlgorithm::Sha256, content).value;

    assert!(registration.newly_registered);
    assert_eq!(record.file_hash, expected_hash);
    assert_eq!(record.owner.as_str(), "alice");
    assert_eq!(record.state(), DocumentState::Prepared);
    assert_eq!(registration.instructions.document_id, record.document_id);
    assert_eq!(registration.instructions.file_hash, expected_hash);

    let confirmation = engine.confirm_anchor(&document_id, "0xabc", Some(100)).unwrap();
    assert!(confirmation.newly_anchored);
    assert_eq!(confirmation.external_tx_id, "0xabc");
    let anchored = engine.get_document(&document_id).unwrap();
    assert!(anchored.anchored);
    assert_eq!(anchored.state(), DocumentState::Anchored);
    assert_eq!(anchored.anchor_ref.as_ref().unwrap().block_number, Some(100));
    assert!(anchored.anchored_at.is_some());

    let verified = verify(&engine, content, Some(&document_id)).unwrap();
    assert!(verified.verified);
    assert_eq!(verified.reason, VerifyReason::Verified);
    assert_eq!(verified.stored_hash.as_deref(), Some(expected_hash.as_str()));
    assert_eq!(verified.anchor_ref.as_ref().unwrap().external_tx_id, "0xabc");

    let tampered = verify(&engine, b"quarterly report contentz", Some(&document_id)).unwrap();
    assert!(!tampered.verified);
    assert_eq!(tampered.reason, VerifyReason::Tampered);
    assert_eq!(tampered.stored_hash.as_deref(), Some(expected_hash.as_str()));
    assert_ne!(tampered.computed_hash, expected_hash);

    let by_hash = verify(&engine, content, None).unwrap();
    assert!(by_hash.verified);
    assert_eq!(by_hash.document_id.unwrap().as_str(), document_id);

    let actions: Vec<AuditAction> =
        audit_trail(&engine).into_iter().map(|event| event.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::UploadPrepared,
            AuditAction::AnchorConfirmed,
            AuditAction::VerifySuccess,
            AuditAction::VerifyFailed,
            AuditAction::VerifySuccess,
        ]
    );
    let stats = engine.get_stats().unwrap();
    assert_eq!(stats.total_documents, 1);
    assert_eq!(stats.anchored_documents, 1);
    assert_eq!(stats.pending_documents, 0);
    assert_eq!(stats.total_verifications, 3);
    assert_eq!(stats.successful_verifications, 2);
    assert_eq!(stats.failed_verifications, 1);
}

#[test]
fn tampered_event_records_computed_hash_and_reason() {
    let engine = engine();
    let registration = register(&engine, b"original", "a.txt", None, None).unwrap();
    let id = registration.record.document_id.as_str().to_string();
    let outcome = verify(&engine, b"0riginal", Some(&id)).unwrap();

    let event = engine.recent_history(1).unwrap().pop().unwrap();
    assert_eq!(event.action, AuditAction::VerifyFailed);
    assert!(!event.success);
    assert_eq!(event.reason, Some(FailureReason::Tampered));
    assert_eq!(event.file_hash, outcome.computed_hash);
    assert_eq!(event.document_id.unwrap().as_str(), id);
}

#[test]
fn every_single_byte_mutation_is_tampered() {
    let engine = engine();
    let content = b"abcdefgh".to_vec();
    let id = register(&engine, &content, "a.txt", None, None)
        .unwrap()
        .record
        .document_id
        .as_str()
        .to_string();
    for index in 0..content.len() {
        let mut mutated = content.clone();
        mutated[index] ^= 0x01;
        let outcome = verify(&engine, &mutated, Some(&id)).unwrap();
        assert_eq!(outcome.reason, VerifyReason::Tampered, "byte {index}");
    }
}

#[test]
fn unknown_id_is_not_registered_and_audited() {
    let engine = engine();
    let unknown = "abcdef00-0000-4000-8000-000000000000";
    let outcome = verify(&engine, b"anything", Some(unknown)).unwrap();
    assert!(!outcome.verified);
    assert_eq!(outcome.reason, VerifyReason::NotRegistered);
    assert!(outcome.stored_hash.is_none());

    let event = engine.recent_history(1).unwrap().pop().unwrap();
    assert_eq!(event.action, AuditAction::VerifyFailed);
    assert_eq!(event.reason, Some(FailureReason::NotRegistered));
    assert_eq!(event.document_id.unwrap().as_str(), unknown);
}

#[test]
fn unknown_content_without_id_audits_null_document() {
    let engine = engine();
    register(&engine, b"known", "k.txt", None, None).unwrap();
    let outcome = verify(&engine, b"unknown", None).unwrap();
    assert_eq!(outcome.reason, VerifyReason::NotRegistered);
    assert!(outcome.document_id.is_none());
    let event = engine.recent_history(1).unwrap().pop().unwrap();
    assert!(event.document_id.is_none());
    assert_eq!(event.reason, Some(FailureReason::NotRegistered));
}

#[test]
fn hash_lookup_returns_earliest_registration() {
    let engine = engine();
    let first = register(&engine, b"same bytes", "one.txt", None, None).unwrap();
    register(&engine, b"same bytes", "two.txt", Some("bob"), None).unwrap();
    let outcome = verify(&engine, b"same bytes", None).unwrap();
    assert_eq!(outcome.document_id, Some(first.record.document_id));
    assert_eq!(outcome.document.unwrap().file_name.as_str(), "one.txt");
}

#[test]
fn verify_decision_ignores_display_name_and_owner() {
    let engine = engine();
    let id = register(&engine, b"payload", "name-a.txt", Some("alice"), None)
        .unwrap()
        .record
        .document_id;
    let outcome = verify(&engine, b"payload", Some(id.as_str())).unwrap();
    assert!(outcome.verified);
}

#[test]
fn blank_verify_id_uses_hash_lookup() {
    let engine = engine();
    register(&engine, b"payload", "p.txt", None, None).unwrap();
    let outcome = verify(&engine, b"payload", Some("   ")).unwrap();
    assert!(outcome.verified);
}

#[test]
fn malformed_verify_id_fails_without_audit() {
    let engine = engine();
    let err = verify(&engine, b"payload", Some("not-an-id")).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidDocumentId(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(engine.backend().is_empty().unwrap());
}

#[test]
fn empty_input_is_rejected_everywhere() {
    let engine = engine();
    let err = register(&engine, b"", "empty.txt", None, None).unwrap_err();
    assert!(matches!(err, RegistryError::EmptyInput));
    let err = verify(&engine, b"", None).unwrap_err();
    assert!(matches!(err, RegistryError::EmptyInput));
    assert_eq!(engine.backend().count().unwrap(), 0);
    assert!(engine.backend().is_empty().unwrap());
}

#[test]
fn owner_validation_and_default() {
    let engine = engine();
    let err = register(&engine, b"x", "x.txt", Some("alice@example.com"), None).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidOwner));
    assert_eq!(err.kind(), ErrorKind::Validation);
    let registration = register(&engine, b"x", "x.txt", Some(""), None).unwrap();
    assert_eq!(registration.record.owner.as_str(), "anonymous");
    let registration = register(&engine, b"y", "y.txt", None, None).unwrap();
    assert_eq!(registration.record.owner.as_str(), "anonymous");
}

#[test]
fn caller_supplied_ids_are_validated_and_used() {
    let engine = engine();
    let err = register(&engine, b"x", "x.txt", None, Some("ABC")).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidDocumentId(_)));
    let id = "12345678-aaaa-4bbb-8ccc-1234567890ab";
    let registration = register(&engine, b"x", "x.txt", None, Some(id)).unwrap();
    assert_eq!(registration.record.document_id.as_str(), id);
}

#[test]
fn reregistering_same_content_is_idempotent() {
    let engine = engine();
    let id = "12345678-aaaa-4bbb-8ccc-1234567890ab";
    let first = register(&engine, b"content", "c.txt", Some("alice"), Some(id)).unwrap();
    let second = register(&engine, b"content", "renamed.txt", Some("bob"), Some(id)).unwrap();
    assert!(!second.newly_registered);
    assert_eq!(second.record, first.record);
    assert_eq!(engine.recent_history(10).unwrap().len(), 1);
}

#[test]
fn reregistering_different_content_conflicts() {
    let engine = engine();
    let id = "12345678-aaaa-4bbb-8ccc-1234567890ab";
    let first = register(&engine, b"content", "c.txt", None, Some(id)).unwrap();
    let err = register(&engine, b"other", "c.txt", None, Some(id)).unwrap_err();
    assert!(matches!(err, RegistryError::HashConflict { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(engine.get_document(id).unwrap(), first.record);
    assert_eq!(engine.recent_history(10).unwrap().len(), 1);
}

#[test]
fn confirm_anchor_is_idempotent_and_conflicts_on_new_tx() {
    let engine = engine();
    let id = register(&engine, b"doc", "d.pdf", None, None)
        .unwrap()
        .record
        .document_id
        .as_str()
        .to_string();
    engine.confirm_anchor(&id, "0xabc", Some(100)).unwrap();
    let anchored = engine.get_document(&id).unwrap();

    let repeat = engine.confirm_anchor(&id, "0xabc", Some(100)).unwrap();
    assert!(!repeat.newly_anchored);
    assert_eq!(engine.get_document(&id).unwrap(), anchored);

    let err = engine.confirm_anchor(&id, "0xdef", Some(101)).unwrap_err();
    match &err {
        RegistryError::AnchorConflict { existing_tx_id, .. } => assert_eq!(existing_tx_id, "0xabc"),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(engine.get_document(&id).unwrap(), anchored);

    let confirmations = audit_trail(&engine)
        .into_iter()
        .filter(|event| event.action == AuditAction::AnchorConfirmed)
        .count();
    assert_eq!(confirmations, 1);
}

#[test]
fn confirm_anchor_input_errors() {
    let engine = engine();
    let err = engine.confirm_anchor("", "", None).unwrap_err();
    match err {
        RegistryError::MissingFields(fields) => assert_eq!(fields, "document_id, external_tx_id"),
        other => panic!("unexpected error {other:?}"),
    }
    let err = engine.confirm_anchor("abcdef00-0000-4000-8000-000000000000", " ", None).unwrap_err();
    assert!(matches!(err, RegistryError::MissingFields(_)));
    let err = engine.confirm_anchor("bogus", "0xabc", None).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidDocumentId(_)));
    let err =
        engine.confirm_anchor("abcdef00-0000-4000-8000-000000000000", "0xabc", None).unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(engine.backend().is_empty().unwrap());
}

#[test]
fn restricted_config_enforces_extensions_and_size() {
    let mut config = EngineConfig::restricted();
    config.max_input_bytes = Some(8);
    let engine = engine_with(config);

    let err = register(&engine, b"data", "script.exe", None, None).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidFileName(_)));
    let err = register(&engine, b"data", "noextension", None, None).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidFileName(_)));
    let err = register(&engine, b"123456789", "big.pdf", None, None).unwrap_err();
    assert!(matches!(err, RegistryError::InputTooLarge { limit: 8 }));
    assert!(register(&engine, b"data", "Scan.PDF", None, None).is_ok());
}

#[test]
fn read_failures_surface_as_read_errors() {
    /// Reader that always fails.
    struct Broken;
    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("broken pipe"))
        }
    }
    let engine = engine();
    let err = engine
        .register(RegisterRequest {
            reader: Broken,
            file_name: "a.txt".to_string(),
            owner: None,
            document_id: None,
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Read);
    assert_eq!(engine.backend().count().unwrap(), 0);
}

#[test]
fn list_documents_newest_first() {
    let engine = engine();
    let first = register(&engine, b"1", "1.txt", None, None).unwrap();
    let second = register(&engine, b"2", "2.txt", None, None).unwrap();
    let listed: Vec<DocumentRecord> = engine.list_documents().unwrap();
    assert_eq!(listed, vec![second.record, first.record]);
}

#[test]
fn stats_verification_totals_always_balance() {
    let engine = engine();
    let id = register(&engine, b"doc", "d.txt", None, None).unwrap().record.document_id;
    for round in 0..7_u8 {
        let content: &[u8] = if round % 3 == 0 { b"doc" } else { b"tampered" };
        verify(&engine, content, Some(id.as_str())).unwrap();
        let stats = engine.get_stats().unwrap();
        assert_eq!(
            stats.total_verifications,
            stats.successful_verifications + stats.failed_verifications
        );
    }
}

/// Backend whose conditional writes always fail.
struct RejectingBackend {
    /// Backing registry for reads.
    inner: InMemoryRegistry,
}

impl DocumentStore for RejectingBackend {
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

impl AuditLog for RejectingBackend {
    fn append(&self, _event: &AuditEvent) -> Result<(), StoreError> {
        Err(StoreError::Io("audit volume full".to_string()))
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

impl RegistryBackend for RejectingBackend {
    fn insert_if_absent(
        &self,
        _record: &DocumentRecord,
        _event: &AuditEvent,
    ) -> Result<Option<DocumentRecord>, StoreError> {
        Err(StoreError::Io("disk full".to_string()))
    }

    fn anchor_if_unanchored(
        &self,
        _document_id: &DocumentId,
        _anchor_ref: &AnchorRef,
        _anchored_at: Timestamp,
        _event: &AuditEvent,
    ) -> Result<AnchorWrite, StoreError> {
        Err(StoreError::Io("disk full".to_string()))
    }
}

#[test]
fn failed_commit_leaves_no_record_or_event() {
    let inner = InMemoryRegistry::new();
    let engine = RegistryEngine::new(
        RejectingBackend {
            inner: inner.clone(),
        },
        StepClock::default(),
        EngineConfig::default(),
    );
    let err = engine
        .register(RegisterRequest {
            reader: &b"doc"[..],
            file_name: "d.txt".to_string(),
            owner: None,
            document_id: None,
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(inner.count().unwrap(), 0);
    assert!(inner.is_empty().unwrap());

    let pending = DocumentRecord::prepared(
        DocumentId::parse("12345678-aaaa-4bbb-8ccc-1234567890ab").unwrap(),
        FileName::parse("d.txt").unwrap(),
        hash_bytes(HashAlgorithm::Sha256, b"doc").value,
        Owner::parse("").unwrap(),
        Timestamp::from_unix_millis(1),
    );
    inner.upsert(&pending).unwrap();
    let err = engine.confirm_anchor(pending.document_id.as_str(), "0xabc", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(inner.get(&pending.document_id).unwrap(), Some(pending));
    assert!(inner.is_empty().unwrap());

    let err = verify_with(&engine, b"doc").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

/// Verifies `content` by hash lookup on any backend.
fn verify_with<B: RegistryBackend>(
    engine: &RegistryEngine<B, StepClock>,
    content: &[u8],
) -> Result<docchain_core::VerificationOutcome, RegistryError> {
    engine.verify(VerifyRequest {
        reader: content,
        document_id: None,
    })
}

#[test]
fn engines_sharing_a_backend_register_one_id_once() {
    /// Engines racing for the same id.
    const CONTENDERS: usize = 8;
    let id = "12345678-aaaa-4bbb-8ccc-1234567890ab";
    let backend = InMemoryRegistry::new();
    let engines: Vec<TestEngine> = (0..CONTENDERS)
        .map(|_| {
            RegistryEngine::new(backend.clone(), StepClock::default(), EngineConfig::default())
        })
        .collect();
    let barrier = Barrier::new(CONTENDERS);
    let results: Vec<Result<Registration, RegistryError>> = thread::scope(|scope| {
        let handles: Vec<_> = engines
            .iter()
            .enumerate()
            .map(|(index, engine)| {
                let barrier = &barrier;
                scope.spawn(move || {
                    let content = format!("content {index}").into_bytes();
                    barrier.wait();
                    register(engine, &content, "c.txt", None, Some(id))
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let winners: Vec<&Registration> =
        results.iter().filter_map(|result| result.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(winners[0].newly_registered);
    for err in results.iter().filter_map(|result| result.as_ref().err()) {
        assert!(matches!(err, RegistryError::HashConflict { .. }), "unexpected {err:?}");
    }
    let stored = backend.get(&winners[0].record.document_id).unwrap();
    assert_eq!(stored.as_ref(), Some(&winners[0].record));
    assert_eq!(backend.count_action(AuditAction::UploadPrepared).unwrap(), 1);

    let anchors: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = engines
            .iter()
            .enumerate()
            .map(|(index, engine)| {
                scope.spawn(move || {
                    engine.confirm_anchor(id, &format!("0x{index:02x}"), None).is_ok()
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });
    assert_eq!(anchors.iter().filter(|anchored| **anchored).count(), 1);
    assert_eq!(backend.count_action(AuditAction::AnchorConfirmed).unwrap(), 1);
}

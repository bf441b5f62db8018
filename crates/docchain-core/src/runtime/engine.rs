// crates/docchain-core/src/runtime/engine.rs
// ============================================================================
// Module: DocChain Registry Engine
// Description: Registration, anchor confirmation, and verification orchestration.
// Purpose: Own the document state machine and the verification decision.
// Dependencies: crate::{core, interfaces, runtime}, thiserror
// ============================================================================

//! ## Overview
//! The registry engine is the only component that creates or mutates
//! [`DocumentRecord`] values and appends [`AuditEvent`] entries. Stores and
//! logs are passive collaborators.
//!
//! Documents move `Prepared -> Anchored` once. Verification is a decision
//! procedure, not an error path: `not_registered` and `tampered` are returned
//! as [`VerificationOutcome`] values and audited like a success.
//!
//! Registration and anchor confirmation go through the conditional writes of
//! [`RegistryBackend`], which check the stored record and commit the record
//! with its audit event atomically. Serialization therefore belongs to the
//! backend, so engines in other threads or processes sharing the same store
//! cannot interleave a check with another writer's commit. Stream hashing
//! happens before any backend call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::io;
use std::io::Read;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::AnchorRef;
use crate::core::AuditAction;
use crate::core::AuditEvent;
use crate::core::DEFAULT_CHUNK_SIZE;
use crate::core::DEFAULT_HASH_ALGORITHM;
use crate::core::DocumentId;
use crate::core::DocumentRecord;
use crate::core::FailureReason;
use crate::core::FileName;
use crate::core::Fingerprinter;
use crate::core::HashAlgorithm;
use crate::core::IdentifierError;
use crate::core::InputError;
use crate::core::LabelError;
use crate::core::Owner;
use crate::core::RegistryStats;
use crate::core::Timestamp;
use crate::core::hashing::hashes_match;
use crate::core::normalize_hash;
use crate::interfaces::AnchorWrite;
use crate::interfaces::Clock;
use crate::interfaces::RegistryBackend;
use crate::interfaces::StoreError;
use crate::runtime::stats::compute_stats;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum accepted input size (16 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 16 * 1024 * 1024;

/// Default number of audit events returned by history queries.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Default file extension allow-list for registered documents.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 8] =
    ["pdf", "png", "jpg", "jpeg", "txt", "doc", "docx", "zip"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Error classes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller input was rejected; nothing was written.
    Validation,
    /// Referenced document does not exist.
    NotFound,
    /// Request contradicts stored state; record left untouched.
    Conflict,
    /// Input stream could not be read.
    Read,
    /// Backend failed to persist or load.
    Storage,
}

impl ErrorKind {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Read => "read",
            Self::Storage => "storage",
        }
    }
}

/// Registry engine errors.
///
/// # Invariants
/// - Validation, not-found, and conflict errors leave store and log untouched.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Owner label failed validation.
    #[error(
        "invalid owner: use only letters, numbers, spaces, hyphens, and underscores (max 50 chars)"
    )]
    InvalidOwner,
    /// Document identifier is malformed.
    #[error("invalid document id: {0}")]
    InvalidDocumentId(String),
    /// Display name is malformed or its type is not allowed.
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
    /// Required fields were absent or blank.
    #[error("missing required fields: {0}")]
    MissingFields(String),
    /// Input stream contained no bytes.
    #[error("input is empty")]
    EmptyInput,
    /// Input stream exceeded the configured size limit.
    #[error("input exceeds size limit of {limit} bytes")]
    InputTooLarge {
        /// Maximum accepted bytes.
        limit: u64,
    },
    /// Document does not exist.
    #[error("document not found: {0}")]
    NotFound(DocumentId),
    /// Document id already holds a different fingerprint.
    #[error("document {document_id} is already registered with a different hash")]
    HashConflict {
        /// Conflicting document id.
        document_id: DocumentId,
    },
    /// Document is already anchored to a different transaction.
    #[error("document {document_id} is already anchored to {existing_tx_id}")]
    AnchorConflict {
        /// Conflicting document id.
        document_id: DocumentId,
        /// Transaction id already stored.
        existing_tx_id: String,
    },
    /// Input stream failed.
    #[error("input read error: {0}")]
    Read(io::Error),
    /// Backend failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistryError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOwner
            | Self::InvalidDocumentId(_)
            | Self::InvalidFileName(_)
            | Self::MissingFields(_)
            | Self::EmptyInput
            | Self::InputTooLarge {
                ..
            } => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::HashConflict {
                ..
            }
            | Self::AnchorConflict {
                ..
            } => ErrorKind::Conflict,
            Self::Read(_) => ErrorKind::Read,
            Self::Store(_) => ErrorKind::Storage,
        }
    }
}

impl From<LabelError> for RegistryError {
    fn from(err: LabelError) -> Self {
        match err {
            LabelError::InvalidOwner => Self::InvalidOwner,
            LabelError::InvalidFileName(message) => Self::InvalidFileName(message),
        }
    }
}

impl From<IdentifierError> for RegistryError {
    fn from(err: IdentifierError) -> Self {
        match err {
            IdentifierError::InvalidFormat(value) => Self::InvalidDocumentId(value),
        }
    }
}

impl From<InputError> for RegistryError {
    fn from(err: InputError) -> Self {
        match err {
            InputError::Read(err) => Self::Read(err),
            InputError::TooLarge {
                limit,
            } => Self::InputTooLarge {
                limit,
            },
        }
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Registry engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Fingerprint algorithm.
    pub hash_algorithm: HashAlgorithm,
    /// Read chunk size for fingerprinting.
    pub chunk_size: usize,
    /// Maximum accepted input size; `None` accepts any size.
    pub max_input_bytes: Option<u64>,
    /// Lowercase extension allow-list; `None` accepts any name.
    pub allowed_extensions: Option<BTreeSet<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_input_bytes: None,
            allowed_extensions: None,
        }
    }
}

impl EngineConfig {
    /// Returns a configuration with the default upload restrictions applied.
    #[must_use]
    pub fn restricted() -> Self {
        Self {
            max_input_bytes: Some(DEFAULT_MAX_INPUT_BYTES),
            allowed_extensions: Some(
                DEFAULT_ALLOWED_EXTENSIONS.iter().map(|ext| (*ext).to_string()).collect(),
            ),
            ..Self::default()
        }
    }
}

// ============================================================================
// SECTION: Requests and Results
// ============================================================================

/// Registration request.
#[derive(Debug)]
pub struct RegisterRequest<R> {
    /// Content stream.
    pub reader: R,
    /// Display name of the file.
    pub file_name: String,
    /// Owner label; `None` or blank becomes `anonymous`.
    pub owner: Option<String>,
    /// Caller-chosen document id; generated when absent.
    pub document_id: Option<String>,
}

/// Values a caller needs to anchor a fingerprint externally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorInstructions {
    /// Document id to reference in the anchor.
    pub document_id: DocumentId,
    /// Fingerprint to anchor.
    pub file_hash: String,
    /// Fingerprint algorithm.
    pub hash_algorithm: HashAlgorithm,
}

/// Registration result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Stored record.
    pub record: DocumentRecord,
    /// Anchoring instructions.
    pub instructions: AnchorInstructions,
    /// False when an identical registration already existed.
    pub newly_registered: bool,
}

/// Anchor confirmation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorConfirmation {
    /// Anchored document.
    pub document_id: DocumentId,
    /// Stored transaction id.
    pub external_tx_id: String,
    /// Stored block number.
    pub block_number: Option<u64>,
    /// False when the same anchor was already recorded.
    pub newly_anchored: bool,
}

/// Verification request.
#[derive(Debug)]
pub struct VerifyRequest<R> {
    /// Presented content stream.
    pub reader: R,
    /// Claimed document id; blank or absent selects hash lookup.
    pub document_id: Option<String>,
}

/// Verification decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyReason {
    /// Presented content matches the stored fingerprint.
    Verified,
    /// Presented content differs from the stored fingerprint.
    Tampered,
    /// No record exists for the id or content.
    NotRegistered,
}

impl VerifyReason {
    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Tampered => "tampered",
            Self::NotRegistered => "not_registered",
        }
    }
}

/// Verification result.
///
/// # Invariants
/// - `verified` is true exactly when `reason` is [`VerifyReason::Verified`].
/// - `document` is present only for verified outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Whether the content verified.
    pub verified: bool,
    /// Decision reason.
    pub reason: VerifyReason,
    /// Fingerprint of the presented content.
    pub computed_hash: String,
    /// Stored fingerprint, when a record was found.
    pub stored_hash: Option<String>,
    /// Claimed or matched document id.
    pub document_id: Option<DocumentId>,
    /// Anchor reference of the matched record.
    pub anchor_ref: Option<AnchorRef>,
    /// Matched record metadata.
    pub document: Option<DocumentRecord>,
}

impl VerificationOutcome {
    /// Builds a verified outcome for `record`.
    fn verified(computed_hash: String, record: DocumentRecord) -> Self {
        Self {
            verified: true,
            reason: VerifyReason::Verified,
            computed_hash,
            stored_hash: Some(record.file_hash.clone()),
            document_id: Some(record.document_id.clone()),
            anchor_ref: record.anchor_ref.clone(),
            document: Some(record),
        }
    }

    /// Builds a tampered outcome for `record`.
    fn tampered(computed_hash: String, record: DocumentRecord) -> Self {
        Self {
            verified: false,
            reason: VerifyReason::Tampered,
            computed_hash,
            stored_hash: Some(record.file_hash),
            document_id: Some(record.document_id),
            anchor_ref: record.anchor_ref,
            document: None,
        }
    }

    /// Builds a not-registered outcome.
    const fn not_registered(computed_hash: String, document_id: Option<DocumentId>) -> Self {
        Self {
            verified: false,
            reason: VerifyReason::NotRegistered,
            computed_hash,
            stored_hash: None,
            document_id,
            anchor_ref: None,
            document: None,
        }
    }

    /// Builds the audit event recording this outcome.
    fn audit_event(&self, timestamp: Timestamp) -> AuditEvent {
        let document_id = self.document_id.clone();
        let file_hash = self.computed_hash.clone();
        let anchor_ref = self.anchor_ref.clone();
        match self.reason {
            VerifyReason::Verified => AuditEvent::success(
                timestamp,
                AuditAction::VerifySuccess,
                document_id,
                file_hash,
                anchor_ref,
            ),
            VerifyReason::Tampered => AuditEvent::failure(
                timestamp,
                AuditAction::VerifyFailed,
                document_id,
                file_hash,
                anchor_ref,
                FailureReason::Tampered,
            ),
            VerifyReason::NotRegistered => AuditEvent::failure(
                timestamp,
                AuditAction::VerifyFailed,
                document_id,
                file_hash,
                anchor_ref,
                FailureReason::NotRegistered,
            ),
        }
    }
}

// ============================================================================
// SECTION: Registry Engine
// ============================================================================

/// Document registry and verification engine.
pub struct RegistryEngine<B, C> {
    /// Document store and audit log.
    backend: B,
    /// Timestamp source.
    clock: C,
    /// Content fingerprinter.
    fingerprinter: Fingerprinter,
    /// Lowercase extension allow-list.
    allowed_extensions: Option<BTreeSet<String>>,
}

impl<B, C> RegistryEngine<B, C>
where
    B: RegistryBackend,
    C: Clock,
{
    /// Creates a registry engine over the provided collaborators.
    #[must_use]
    pub fn new(backend: B, clock: C, config: EngineConfig) -> Self {
        let mut fingerprinter =
            Fingerprinter::new(config.hash_algorithm).with_chunk_size(config.chunk_size);
        if let Some(limit) = config.max_input_bytes {
            fingerprinter = fingerprinter.with_limit(limit);
        }
        let allowed_extensions = config.allowed_extensions.map(|extensions| {
            extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect()
        });
        Self {
            backend,
            clock,
            fingerprinter,
            allowed_extensions,
        }
    }

    /// Returns the registry backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Registers content under a new or caller-chosen document id.
    ///
    /// Re-registering identical content under an existing id returns the
    /// stored record unchanged without writing or auditing.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for invalid labels or ids, empty, oversized,
    /// or unreadable input, a hash conflict on an existing id, or backend
    /// failure.
    pub fn register<R: Read>(
        &self,
        request: RegisterRequest<R>,
    ) -> Result<Registration, RegistryError> {
        let owner = Owner::parse(request.owner.as_deref().unwrap_or_default())?;
        let file_name = FileName::parse(&request.file_name)?;
        self.check_extension(&file_name)?;
        let document_id =
            parse_optional_id(request.document_id.as_deref())?.unwrap_or_else(DocumentId::generate);
        let file_hash = self.fingerprint(request.reader)?;

        let record =
            DocumentRecord::prepared(document_id, file_name, file_hash, owner, self.clock.now());
        let event = AuditEvent::success(
            record.created_at,
            AuditAction::UploadPrepared,
            Some(record.document_id.clone()),
            record.file_hash.clone(),
            None,
        );
        match self.backend.insert_if_absent(&record, &event)? {
            None => Ok(self.registration(record, true)),
            Some(existing) if hashes_match(&existing.file_hash, &record.file_hash) => {
                Ok(self.registration(existing, false))
            }
            Some(_) => Err(RegistryError::HashConflict {
                document_id: record.document_id,
            }),
        }
    }

    /// Records a caller-confirmed external anchor for a document.
    ///
    /// Repeating a confirmation with the stored transaction id succeeds
    /// without writing.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for blank or malformed inputs, unknown
    /// documents, a different existing anchor, or backend failure.
    pub fn confirm_anchor(
        &self,
        document_id: &str,
        external_tx_id: &str,
        block_number: Option<u64>,
    ) -> Result<AnchorConfirmation, RegistryError> {
        let raw_id = document_id.trim();
        let tx_id = external_tx_id.trim();
        let mut missing = Vec::new();
        if raw_id.is_empty() {
            missing.push("document_id");
        }
        if tx_id.is_empty() {
            missing.push("external_tx_id");
        }
        if !missing.is_empty() {
            return Err(RegistryError::MissingFields(missing.join(", ")));
        }
        let document_id = DocumentId::parse(raw_id)?;

        let Some(record) = self.backend.get(&document_id)? else {
            return Err(RegistryError::NotFound(document_id));
        };
        if record.anchored {
            return existing_anchor(document_id, record, tx_id);
        }

        let anchored_at = self.clock.now();
        let anchor_ref = AnchorRef {
            external_tx_id: tx_id.to_string(),
            block_number,
        };
        // The fingerprint never changes after registration, so the event can
        // be built from the record read above.
        let event = AuditEvent::success(
            anchored_at,
            AuditAction::AnchorConfirmed,
            Some(document_id.clone()),
            record.file_hash,
            Some(anchor_ref.clone()),
        );
        match self.backend.anchor_if_unanchored(&document_id, &anchor_ref, anchored_at, &event)? {
            AnchorWrite::Anchored(updated) => Ok(AnchorConfirmation {
                document_id: updated.document_id,
                external_tx_id: anchor_ref.external_tx_id,
                block_number,
                newly_anchored: true,
            }),
            AnchorWrite::AlreadyAnchored(current) => existing_anchor(document_id, current, tx_id),
            AnchorWrite::Missing => Err(RegistryError::NotFound(document_id)),
        }
    }

    /// Verifies presented content against the registry.
    ///
    /// With a document id the stored fingerprint for that id is compared;
    /// without one the earliest record carrying the same fingerprint is
    /// matched. Every decision is audited.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for a malformed id, empty, oversized, or
    /// unreadable input, or backend failure. Unknown and tampered content are
    /// reported through [`VerificationOutcome`].
    pub fn verify<R: Read>(
        &self,
        request: VerifyRequest<R>,
    ) -> Result<VerificationOutcome, RegistryError> {
        let document_id = parse_optional_id(request.document_id.as_deref())?;
        let computed_hash = self.fingerprint(request.reader)?;

        let outcome = match document_id {
            Some(document_id) => match self.backend.get(&document_id)? {
                Some(record) if hashes_match(&record.file_hash, &computed_hash) => {
                    VerificationOutcome::verified(computed_hash, record)
                }
                Some(record) => VerificationOutcome::tampered(computed_hash, record),
                None => VerificationOutcome::not_registered(computed_hash, Some(document_id)),
            },
            None => match self.backend.find_by_hash(&computed_hash)? {
                Some(record) => VerificationOutcome::verified(computed_hash, record),
                None => VerificationOutcome::not_registered(computed_hash, None),
            },
        };
        self.backend.append(&outcome.audit_event(self.clock.now()))?;
        Ok(outcome)
    }

    /// Loads a single document.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for a malformed or unknown id, or backend
    /// failure.
    pub fn get_document(&self, document_id: &str) -> Result<DocumentRecord, RegistryError> {
        let document_id = DocumentId::parse(document_id.trim())?;
        self.backend.get(&document_id)?.ok_or(RegistryError::NotFound(document_id))
    }

    /// Lists all documents, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] on backend failure.
    pub fn list_documents(&self) -> Result<Vec<DocumentRecord>, RegistryError> {
        Ok(self.backend.list_all()?)
    }

    /// Returns up to `limit` audit events, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] on backend failure.
    pub fn recent_history(&self, limit: usize) -> Result<Vec<AuditEvent>, RegistryError> {
        Ok(self.backend.list_recent(limit)?)
    }

    /// Computes registry statistics.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] on backend failure.
    pub fn get_stats(&self) -> Result<RegistryStats, RegistryError> {
        Ok(compute_stats(&self.backend, &self.backend)?)
    }

    /// Fingerprints a stream and returns its normalized hash.
    fn fingerprint<R: Read>(&self, reader: R) -> Result<String, RegistryError> {
        let fingerprint = self.fingerprinter.fingerprint_reader(reader)?;
        if fingerprint.is_empty() {
            return Err(RegistryError::EmptyInput);
        }
        Ok(normalize_hash(fingerprint.hex()))
    }

    /// Rejects names whose extension is outside the allow-list.
    fn check_extension(&self, file_name: &FileName) -> Result<(), RegistryError> {
        let Some(allowed) = &self.allowed_extensions else {
            return Ok(());
        };
        match file_name.extension() {
            Some(ext) if allowed.contains(&ext) => Ok(()),
            Some(ext) => {
                Err(RegistryError::InvalidFileName(format!("file type not allowed: {ext}")))
            }
            None => Err(RegistryError::InvalidFileName("file has no extension".to_string())),
        }
    }

    /// Builds a registration result for `record`.
    fn registration(&self, record: DocumentRecord, newly_registered: bool) -> Registration {
        Registration {
            instructions: AnchorInstructions {
                document_id: record.document_id.clone(),
                file_hash: record.file_hash.clone(),
                hash_algorithm: self.fingerprinter.algorithm(),
            },
            record,
            newly_registered,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses an optional caller-supplied id; blank values count as absent.
fn parse_optional_id(value: Option<&str>) -> Result<Option<DocumentId>, RegistryError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(raw) => Ok(Some(DocumentId::parse(raw)?)),
        None => Ok(None),
    }
}

/// Resolves a confirmation against a record that already carries an anchor.
fn existing_anchor(
    document_id: DocumentId,
    record: DocumentRecord,
    tx_id: &str,
) -> Result<AnchorConfirmation, RegistryError> {
    let existing = record.anchor_ref.unwrap_or_else(|| AnchorRef {
        external_tx_id: String::new(),
        block_number: None,
    });
    if existing.external_tx_id != tx_id {
        return Err(RegistryError::AnchorConflict {
            document_id,
            existing_tx_id: existing.external_tx_id,
        });
    }
    Ok(AnchorConfirmation {
        document_id,
        external_tx_id: existing.external_tx_id,
        block_number: existing.block_number,
        newly_anchored: false,
    })
}

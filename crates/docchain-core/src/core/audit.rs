// crates/docchain-core/src/core/audit.rs
// ============================================================================
// Module: DocChain Audit Events
// Description: Audit trail entries for registry mutations and verifications.
// Purpose: Define the append-only event model shared by all audit log backends.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every registration, anchor confirmation, and verification attempt produces
//! one [`AuditEvent`]. Events are immutable once appended. Backends keep the
//! most recent [`DEFAULT_AUDIT_RETENTION`] events unless configured otherwise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::document::AnchorRef;
use crate::core::identifiers::DocumentId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of audit events retained.
pub const DEFAULT_AUDIT_RETENTION: usize = 1_000;

// ============================================================================
// SECTION: Actions
// ============================================================================

/// Audited action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Fingerprint recorded for a new document.
    UploadPrepared,
    /// External anchor accepted for a document.
    AnchorConfirmed,
    /// Presented content matched a registered fingerprint.
    VerifySuccess,
    /// Presented content did not match, or no record was found.
    VerifyFailed,
}

impl AuditAction {
    /// Returns the stable action label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UploadPrepared => "upload_prepared",
            Self::AnchorConfirmed => "anchor_confirmed",
            Self::VerifySuccess => "verify_success",
            Self::VerifyFailed => "verify_failed",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reason recorded on unsuccessful events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Presented content differs from the stored fingerprint.
    Tampered,
    /// No record exists for the id or the content.
    NotRegistered,
}

impl FailureReason {
    /// Returns the stable reason label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tampered => "tampered",
            Self::NotRegistered => "not_registered",
        }
    }
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// Single audit trail entry.
///
/// # Invariants
/// - `reason` is `Some` only when `success` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Time the event was recorded.
    pub timestamp: Timestamp,
    /// Audited action.
    pub action: AuditAction,
    /// Document involved, when known.
    pub document_id: Option<DocumentId>,
    /// Fingerprint involved (computed hash for verifications).
    pub file_hash: String,
    /// Whether the action succeeded.
    pub success: bool,
    /// Anchor reference of the document, when anchored.
    pub anchor_ref: Option<AnchorRef>,
    /// Failure reason.
    pub reason: Option<FailureReason>,
}

impl AuditEvent {
    /// Builds a successful event.
    #[must_use]
    pub const fn success(
        timestamp: Timestamp,
        action: AuditAction,
        document_id: Option<DocumentId>,
        file_hash: String,
        anchor_ref: Option<AnchorRef>,
    ) -> Self {
        Self {
            timestamp,
            action,
            document_id,
            file_hash,
            success: true,
            anchor_ref,
            reason: None,
        }
    }

    /// Builds a failed event with its reason.
    #[must_use]
    pub const fn failure(
        timestamp: Timestamp,
        action: AuditAction,
        document_id: Option<DocumentId>,
        file_hash: String,
        anchor_ref: Option<AnchorRef>,
        reason: FailureReason,
    ) -> Self {
        Self {
            timestamp,
            action,
            document_id,
            file_hash,
            success: false,
            anchor_ref,
            reason: Some(reason),
        }
    }
}

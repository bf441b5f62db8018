// crates/docchain-core/src/core/document.rs
// ============================================================================
// Module: DocChain Document Records
// Description: Registry records, anchor references, and caller-facing labels.
// Purpose: Define the persisted document model and its field-level validation.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`DocumentRecord`] is created in the `Prepared` state with its fingerprint
//! fixed. Confirming an external anchor moves it to `Anchored`, setting
//! `anchor_ref` and `anchored_at` together. Before that transition both fields
//! are `None` and serialize as `null`.
//!
//! Serialized field names are a wire contract and must not be renamed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::DocumentId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Owner label used when the caller supplies none.
pub const DEFAULT_OWNER: &str = "anonymous";
/// Maximum owner label length in characters.
pub const MAX_OWNER_LENGTH: usize = 50;
/// Maximum display name length in characters.
pub const MAX_FILE_NAME_LENGTH: usize = 255;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Field validation errors for caller-supplied labels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    /// Owner label failed the allow-pattern.
    #[error(
        "invalid owner: use only letters, numbers, spaces, hyphens, and underscores (max 50 chars)"
    )]
    InvalidOwner,
    /// Display name is empty or malformed.
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
}

// ============================================================================
// SECTION: Owner
// ============================================================================

/// Free-text owner label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(String);

impl Owner {
    /// Validates a caller-supplied owner label.
    ///
    /// Leading and trailing whitespace is trimmed. An empty label becomes
    /// [`DEFAULT_OWNER`].
    ///
    /// # Errors
    ///
    /// Returns [`LabelError::InvalidOwner`] when the label contains characters
    /// outside `[A-Za-z0-9 _-]` or exceeds [`MAX_OWNER_LENGTH`].
    pub fn parse(value: &str) -> Result<Self, LabelError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(Self::anonymous());
        }
        if trimmed.chars().count() > MAX_OWNER_LENGTH {
            return Err(LabelError::InvalidOwner);
        }
        if !trimmed.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '-' | '_')) {
            return Err(LabelError::InvalidOwner);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the default owner label.
    #[must_use]
    pub fn anonymous() -> Self {
        Self(DEFAULT_OWNER.to_string())
    }

    /// Returns the owner as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Owner {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: File Name
// ============================================================================

/// Display name of a registered file. Never used for identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileName(String);

impl FileName {
    /// Sanitizes a caller-supplied display name.
    ///
    /// Directory components are dropped so only the final path segment
    /// remains.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError::InvalidFileName`] when the remaining name is
    /// empty, a relative path marker, contains control characters, or exceeds
    /// [`MAX_FILE_NAME_LENGTH`].
    pub fn parse(value: &str) -> Result<Self, LabelError> {
        let base = value.rsplit(['/', '\\']).next().unwrap_or(value).trim();
        if base.is_empty() || base == "." || base == ".." {
            return Err(LabelError::InvalidFileName("file name is empty".to_string()));
        }
        if base.chars().any(char::is_control) {
            return Err(LabelError::InvalidFileName(
                "file name contains control characters".to_string(),
            ));
        }
        if base.chars().count() > MAX_FILE_NAME_LENGTH {
            return Err(LabelError::InvalidFileName(format!(
                "file name exceeds {MAX_FILE_NAME_LENGTH} characters"
            )));
        }
        Ok(Self(base.to_string()))
    }

    /// Returns the lowercase extension, if the name has one.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.0.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Anchor Reference
// ============================================================================

/// Caller-confirmed external ledger reference. Opaque to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRef {
    /// External transaction identifier.
    pub external_tx_id: String,
    /// Block number containing the transaction, when reported.
    pub block_number: Option<u64>,
}

// ============================================================================
// SECTION: Document Record
// ============================================================================

/// Lifecycle state of a registered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    /// Fingerprint recorded; no anchor confirmed yet.
    Prepared,
    /// Anchor confirmed. Terminal.
    Anchored,
}

/// Registry record for a single document.
///
/// # Invariants
/// - `file_hash` is normalized lowercase hex and never changes after creation.
/// - `anchored`, `anchor_ref`, and `anchored_at` change together, once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Document identifier.
    pub document_id: DocumentId,
    /// Display name.
    pub file_name: FileName,
    /// Normalized content fingerprint.
    pub file_hash: String,
    /// Owner label.
    pub owner: Owner,
    /// Time of first registration.
    pub created_at: Timestamp,
    /// External anchor reference once confirmed.
    pub anchor_ref: Option<AnchorRef>,
    /// Whether an anchor has been confirmed.
    pub anchored: bool,
    /// Time of anchor confirmation.
    pub anchored_at: Option<Timestamp>,
}

impl DocumentRecord {
    /// Creates a new record in the `Prepared` state.
    #[must_use]
    pub const fn prepared(
        document_id: DocumentId,
        file_name: FileName,
        file_hash: String,
        owner: Owner,
        created_at: Timestamp,
    ) -> Self {
        Self {
            document_id,
            file_name,
            file_hash,
            owner,
            created_at,
            anchor_ref: None,
            anchored: false,
            anchored_at: None,
        }
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> DocumentState {
        if self.anchored { DocumentState::Anchored } else { DocumentState::Prepared }
    }

    /// Returns a copy transitioned to `Anchored`.
    #[must_use]
    pub fn into_anchored(mut self, anchor_ref: AnchorRef, anchored_at: Timestamp) -> Self {
        self.anchor_ref = Some(anchor_ref);
        self.anchored = true;
        self.anchored_at = Some(anchored_at);
        self
    }
}

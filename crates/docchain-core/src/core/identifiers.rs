// crates/docchain-core/src/core/identifiers.rs
// ============================================================================
// Module: DocChain Identifiers
// Description: Document identifiers and their wire format.
// Purpose: Provide a strongly typed, serializable document id with validation.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Document identifiers are lowercase hyphenated UUID strings. Identifiers
//! generated by the registry are random UUID v4 values; identifiers supplied
//! by callers are checked with [`DocumentId::parse`] at the engine boundary.
//! Deserialization does not re-validate, so stored records round-trip even if
//! they predate the format check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Exact length of a document identifier.
pub const DOCUMENT_ID_LENGTH: usize = 36;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Identifier does not match the expected format.
    #[error("invalid document id format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// SECTION: Document Identifier
// ============================================================================

/// Document identifier; primary key of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generates a fresh random document identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Parses a caller-supplied identifier.
    ///
    /// Accepts exactly 36 characters drawn from `[a-f0-9-]`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidFormat`] for any other input.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        let valid = value.len() == DOCUMENT_ID_LENGTH
            && value.bytes().all(|byte| matches!(byte, b'a'..=b'f' | b'0'..=b'9' | b'-'));
        if !valid {
            return Err(IdentifierError::InvalidFormat(truncate_for_error(value)));
        }
        Ok(Self(value.to_string()))
    }

    /// Wraps a stored identifier without validation.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Bounds identifier echoes in error messages.
fn truncate_for_error(value: &str) -> String {
    const MAX_ECHO: usize = 64;
    if value.chars().count() <= MAX_ECHO {
        return value.to_string();
    }
    let mut out: String = value.chars().take(MAX_ECHO).collect();
    out.push_str("...");
    out
}

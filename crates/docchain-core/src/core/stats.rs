// crates/docchain-core/src/core/stats.rs
// ============================================================================
// Module: DocChain Registry Statistics
// Description: Aggregate counts over the registry and audit trail.
// Purpose: Provide the serializable stats summary returned to callers.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Stats are derived on demand and never persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Stats
// ============================================================================

/// Aggregate registry counts.
///
/// # Invariants
/// - `pending_documents == total_documents - anchored_documents`.
/// - `total_verifications == successful_verifications + failed_verifications`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Number of registered documents.
    pub total_documents: u64,
    /// Documents with a confirmed anchor.
    pub anchored_documents: u64,
    /// Documents still awaiting anchor confirmation.
    pub pending_documents: u64,
    /// Retained verification events.
    pub total_verifications: u64,
    /// Retained successful verification events.
    pub successful_verifications: u64,
    /// Retained failed verification events.
    pub failed_verifications: u64,
}

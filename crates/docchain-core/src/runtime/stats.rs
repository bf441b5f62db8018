// crates/docchain-core/src/runtime/stats.rs
// ============================================================================
// Module: DocChain Stats Aggregator
// Description: Aggregate counts derived from the registry store and audit log.
// Purpose: Recompute registry statistics on demand without cached state.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Stats are a pure read over current store and log contents. Verification
//! counts cover retained audit events only, so they shrink as old events are
//! evicted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::AuditAction;
use crate::core::RegistryStats;
use crate::interfaces::AuditLog;
use crate::interfaces::DocumentStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Computes registry statistics from a store and an audit log.
///
/// # Invariants
/// - `pending_documents == total_documents - anchored_documents`.
/// - `total_verifications == successful_verifications + failed_verifications`.
///
/// # Errors
///
/// Returns [`StoreError`] when either backend fails to count.
pub fn compute_stats<S, L>(store: &S, log: &L) -> Result<RegistryStats, StoreError>
where
    S: DocumentStore + ?Sized,
    L: AuditLog + ?Sized,
{
    let total_documents = store.count()?;
    let anchored_documents = store.count_where(&|record| record.anchored)?;
    let successful_verifications = log.count_action(AuditAction::VerifySuccess)?;
    let failed_verifications = log.count_action(AuditAction::VerifyFailed)?;
    Ok(RegistryStats {
        total_documents,
        anchored_documents,
        pending_documents: total_documents.saturating_sub(anchored_documents),
        total_verifications: successful_verifications.saturating_add(failed_verifications),
        successful_verifications,
        failed_verifications,
    })
}

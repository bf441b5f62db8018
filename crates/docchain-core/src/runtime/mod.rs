// crates/docchain-core/src/runtime/mod.rs
// ============================================================================
// Module: DocChain Runtime
// Description: Registry engine, in-memory backends, clocks, and stats.
// Purpose: Execute registry operations over pluggable stores.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime wires the passive interfaces into the registry engine and
//! ships the in-memory backends used by tests and ephemeral hosts.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod clock;
pub mod engine;
pub mod stats;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::SystemClock;
pub use engine::AnchorConfirmation;
pub use engine::AnchorInstructions;
pub use engine::DEFAULT_ALLOWED_EXTENSIONS;
pub use engine::DEFAULT_HISTORY_LIMIT;
pub use engine::DEFAULT_MAX_INPUT_BYTES;
pub use engine::EngineConfig;
pub use engine::ErrorKind;
pub use engine::RegisterRequest;
pub use engine::Registration;
pub use engine::RegistryEngine;
pub use engine::RegistryError;
pub use engine::VerificationOutcome;
pub use engine::VerifyReason;
pub use engine::VerifyRequest;
pub use stats::compute_stats;
pub use store::InMemoryAuditLog;
pub use store::InMemoryDocumentStore;
pub use store::InMemoryRegistry;
pub use store::SharedRegistryBackend;

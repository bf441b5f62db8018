// crates/docchain-cli/src/lib.rs
// ============================================================================
// Module: DocChain CLI Library
// Description: Shared helpers for the docchain binary.
// Purpose: Expose the operation log so it can be tested outside the binary.
// Dependencies: docchain-config, docchain-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Library half of the `docchain` command line tool. The binary in
//! `main.rs` owns argument parsing and dispatch; this crate holds the
//! operation log sinks it writes through.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod oplog;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use oplog::FileOperationLogSink;
pub use oplog::NoopOperationLogSink;
pub use oplog::OperationLogEvent;
pub use oplog::OperationLogSink;
pub use oplog::OperationOutcome;
pub use oplog::StderrOperationLogSink;
pub use oplog::build_sink;

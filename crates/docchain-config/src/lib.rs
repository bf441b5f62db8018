// crates/docchain-config/src/lib.rs
// ============================================================================
// Module: DocChain Config Library
// Description: Canonical config model, validation, and example output.
// Purpose: Single source of truth for docchain.toml semantics.
// Dependencies: docchain-core, docchain-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `docchain-config` defines the configuration model for the `DocChain`
//! registry host. Loading is strict and fail-closed: oversized files, unknown
//! backends, and inconsistent sections are rejected before any store opens.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;

// crates/atomic-index-config/src/lib.rs
// ============================================================================
// Module: Atomic Index Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for atomic-index.toml semantics.
// Dependencies: atomic-index-core, serde, toml
// ============================================================================

//! ## Overview
//! `atomic-index-config` defines the optional `atomic-index.toml` file that
//! tunes discovery, size limits, and run event logging. Validation is strict
//! and fails closed; a missing default file falls back to built-in defaults.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;

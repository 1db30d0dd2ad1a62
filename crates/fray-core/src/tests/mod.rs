//! Determinism and integration tests for the combat pipeline.
//!
//! - **Determinism tests**: the same seed produces the same fight
//! - **Integration tests**: full turns through [`crate::session::CombatSession`]
//! - **Helper functions**: session setup, fighters and test handlers
//!
//! # Test Structure
//!
//! - `determinism.rs`: replay and seed tests
//! - `integration.rs`: end-to-end turn scenarios
//! - `helpers.rs`: test setup utilities and factory functions

mod helpers;
mod integration;

// Re-export for convenience
pub use helpers::*;

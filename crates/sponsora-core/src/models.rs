//! Domain models for Sponsora.
//!
//! These are the core types shared across all crates.

pub mod campaign;
pub mod donation;
pub mod inventory;

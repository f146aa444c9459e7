//! Sponsora Core — domain models, the error taxonomy and repository
//! traits shared by every Sponsora crate.

pub mod error;
pub mod models;
pub mod repository;

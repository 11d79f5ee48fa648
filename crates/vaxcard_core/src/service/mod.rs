//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate lookups, sequencing validation and persistence.
//! - Map repository errors into use-case errors with stable codes.
//!
//! # Invariants
//! - Services depend on repository traits only, never on SQLite types.

pub mod card_service;
pub mod catalog_service;
pub mod person_service;
pub mod vaccination_service;

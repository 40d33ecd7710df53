//! Domain model for managed client accounts.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own field-shape validation shared by service and storage read-back.
//!
//! # Invariants
//! - Every record is identified by a caller-chosen, immutable `ClientId`.
//! - Deletion is physical; there is no tombstone state.

pub mod client;

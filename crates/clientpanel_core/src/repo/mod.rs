//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repositories never apply business rules; uniqueness is backstopped by
//!   schema constraints and surfaced as `RepoError::UniqueViolation`.
//! - Repository APIs return "absent" as `Ok(None)`, never as an error.

pub mod client_repo;

//! Core domain logic for the client panel.
//! This crate is the single source of truth for client record invariants.

pub mod bootstrap;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod password;
pub mod repo;
pub mod service;

pub use bootstrap::{seed_admin, AdminSeed, SeedError};
pub use clock::{Clock, SystemClock};
pub use config::{ClientPanelConfig, ConfigError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::client::{
    ClientField, ClientId, ClientPatch, ClientRecord, ClientStatus, ClientValidationError,
    NewClient, Role, UniqueKey,
};
pub use password::{Argon2PasswordHasher, PasswordHashError, PasswordHasher};
pub use repo::client_repo::{
    ClientPage, ClientRepository, PageRequest, RepoError, RepoResult, SqliteClientRepository,
};
pub use service::client_service::{
    ClientService, ClientServiceError, DashboardStats, FieldConflict, ServiceResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

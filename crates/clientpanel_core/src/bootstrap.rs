//! One-time provisioning of the initial admin account.
//!
//! # Responsibility
//! - Insert a single `ADMIN` record into an empty store.
//!
//! # Invariants
//! - Seeding is idempotent: a non-empty store is left untouched.
//! - This is the only path that creates `Role::Admin` records.

use crate::clock::Clock;
use crate::model::client::{ClientRecord, ClientStatus, NewClient, Role};
use crate::password::{PasswordHashError, PasswordHasher};
use crate::repo::client_repo::{ClientRepository, RepoError};
use log::info;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Admin account provisioned by `seed_admin`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminSeed {
    pub client_id: String,
    pub email: String,
    pub name: String,
    pub mobile: String,
    pub phone_number_id: String,
    pub password: String,
    pub chat_prefix: Option<String>,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            client_id: "test001".to_string(),
            email: "admin@gmail.com".to_string(),
            name: "Admin User".to_string(),
            mobile: "1234567890".to_string(),
            phone_number_id: "123456789012345".to_string(),
            password: "admin".to_string(),
            chat_prefix: Some("Welcome to our service!".to_string()),
        }
    }
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("client_id", &self.client_id)
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl AdminSeed {
    /// Shape view used for validation; role is applied by `seed_admin`.
    pub fn to_new_client(&self) -> NewClient {
        NewClient {
            client_id: self.client_id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            mobile: self.mobile.clone(),
            phone_number_id: self.phone_number_id.clone(),
            password: self.password.clone(),
            chat_prefix: self.chat_prefix.clone(),
        }
    }
}

#[derive(Debug)]
pub enum SeedError {
    Invalid(crate::model::client::ClientValidationError),
    Password(PasswordHashError),
    Repo(RepoError),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "admin seed rejected: {err}"),
            Self::Password(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Password(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for SeedError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<PasswordHashError> for SeedError {
    fn from(value: PasswordHashError) -> Self {
        Self::Password(value)
    }
}

/// Inserts the admin account when the store holds no records.
///
/// Returns `true` when a record was created, `false` when the store was
/// already populated.
pub fn seed_admin(
    repo: &impl ClientRepository,
    hasher: &impl PasswordHasher,
    clock: &impl Clock,
    seed: &AdminSeed,
) -> Result<bool, SeedError> {
    if repo.count()? > 0 {
        info!("event=admin_seed module=bootstrap status=skipped reason=store_not_empty");
        return Ok(false);
    }

    seed.to_new_client().validate().map_err(SeedError::Invalid)?;

    let now = clock.now_epoch_ms();
    let record = ClientRecord {
        client_id: seed.client_id.clone(),
        email: seed.email.clone(),
        name: seed.name.clone(),
        mobile: seed.mobile.clone(),
        phone_number_id: seed.phone_number_id.clone(),
        password_hash: hasher.hash(&seed.password)?,
        chat_prefix: seed
            .chat_prefix
            .clone()
            .filter(|prefix| !prefix.trim().is_empty()),
        role: Role::Admin,
        status: ClientStatus::Active,
        created_at: now,
        updated_at: now,
    };
    repo.insert(&record)?;

    info!(
        "event=admin_seed module=bootstrap status=ok client_id={}",
        record.client_id
    );
    Ok(true)
}

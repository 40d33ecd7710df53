//! Client record use-case service.
//!
//! # Responsibility
//! - Own every business rule around client records: shape validation,
//!   uniqueness (global and excluding one record), creation defaults,
//!   partial updates, password changes and aggregate counts.
//! - Delegate persistence to a `ClientRepository`, hashing to a
//!   `PasswordHasher` and time to a `Clock`.
//!
//! # Invariants
//! - Validation failures are raised before the store is touched.
//! - `create_user` forces `role = Client`, `status = Active` and sets both
//!   timestamps from one clock reading.
//! - Every successful mutation strictly increases `updated_at`.
//! - A UNIQUE violation detected at write time surfaces as `Conflict`, the
//!   same kind a pre-write check produces.
//! - Plaintext passwords, emails and phone numbers are never logged.

use crate::clock::{Clock, SystemClock};
use crate::model::client::{
    validate_password, ClientField, ClientId, ClientPatch, ClientRecord, ClientStatus,
    ClientValidationError, NewClient, Role,
};
use crate::password::{Argon2PasswordHasher, PasswordHashError, PasswordHasher};
use crate::repo::client_repo::{ClientPage, ClientRepository, PageRequest, RepoError};
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ClientServiceError>;

/// One uniqueness violation: the field and the value already held elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldConflict {
    pub field: ClientField,
    pub value: String,
}

/// Service error for client use-cases.
#[derive(Debug)]
pub enum ClientServiceError {
    /// Shape or required-field violation. Correct the input and retry.
    Validation(ClientValidationError),
    /// One or more unique fields are held by another record.
    Conflict(Vec<FieldConflict>),
    /// No record exists for the id.
    NotFound(ClientId),
    /// Password hashing backend failure.
    Password(PasswordHashError),
    /// Store-level failure, surfaced as-is.
    Persistence(RepoError),
}

impl ClientServiceError {
    /// Fields reported by a `Conflict`; empty for every other kind.
    pub fn conflicting_fields(&self) -> Vec<ClientField> {
        match self {
            Self::Conflict(conflicts) => {
                conflicts.iter().map(|conflict| conflict.field).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Stable machine-readable code for logs and callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Password(_) => "password_hash_failed",
            Self::Persistence(_) => "persistence_failed",
        }
    }
}

impl Display for ClientServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(conflicts) => {
                let fields = conflicts
                    .iter()
                    .map(|conflict| conflict.field.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "already in use: {fields}")
            }
            Self::NotFound(id) => write!(f, "client not found: {id}"),
            Self::Password(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ClientServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Password(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Conflict(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<ClientValidationError> for ClientServiceError {
    fn from(value: ClientValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PasswordHashError> for ClientServiceError {
    fn from(value: PasswordHashError) -> Self {
        Self::Password(value)
    }
}

impl From<RepoError> for ClientServiceError {
    fn from(value: RepoError) -> Self {
        Self::Persistence(value)
    }
}

/// Aggregate counts shown on the status dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_users: u64,
    pub inactive_users: u64,
    pub total_users: u64,
}

/// Client service facade over repository, hasher and clock.
pub struct ClientService<R, H = Argon2PasswordHasher, C = SystemClock>
where
    R: ClientRepository,
    H: PasswordHasher,
    C: Clock,
{
    repo: R,
    hasher: H,
    clock: C,
}

impl<R: ClientRepository> ClientService<R> {
    /// Creates a service with Argon2 hashing and the system clock.
    pub fn new(repo: R) -> Self {
        Self::with_parts(repo, Argon2PasswordHasher::new(), SystemClock)
    }
}

impl<R, H, C> ClientService<R, H, C>
where
    R: ClientRepository,
    H: PasswordHasher,
    C: Clock,
{
    pub fn with_parts(repo: R, hasher: H, clock: C) -> Self {
        Self {
            repo,
            hasher,
            clock,
        }
    }

    /// Creates one client record.
    ///
    /// # Contract
    /// - Validates every field first; the first invalid field is reported.
    /// - Uniqueness is checked in the order email, mobile, phone number id,
    ///   then client id; only the first conflict is reported.
    /// - Forces `Role::Client` and `ClientStatus::Active`.
    /// - Returns the persisted record holding the password hash.
    pub fn create_user(&self, input: NewClient) -> ServiceResult<ClientRecord> {
        input.validate()?;

        if self.repo.find_by_email(&input.email)?.is_some() {
            return Err(self.reject_create(ClientField::Email, &input.email, &input.client_id));
        }
        if self.repo.find_by_mobile(&input.mobile)?.is_some() {
            return Err(self.reject_create(ClientField::Mobile, &input.mobile, &input.client_id));
        }
        if self
            .repo
            .find_by_phone_number_id(&input.phone_number_id)?
            .is_some()
        {
            return Err(self.reject_create(
                ClientField::PhoneNumberId,
                &input.phone_number_id,
                &input.client_id,
            ));
        }
        if self.repo.find_by_id(&input.client_id)?.is_some() {
            return Err(self.reject_create(
                ClientField::ClientId,
                &input.client_id,
                &input.client_id,
            ));
        }

        let password_hash = self.hasher.hash(&input.password)?;
        let now = self.clock.now_epoch_ms();
        let record = ClientRecord {
            client_id: input.client_id,
            email: input.email,
            name: input.name,
            mobile: input.mobile,
            phone_number_id: input.phone_number_id,
            password_hash,
            chat_prefix: input
                .chat_prefix
                .filter(|prefix| !prefix.trim().is_empty()),
            role: Role::Client,
            status: ClientStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .insert(&record)
            .map_err(|err| write_error(err, &record))?;
        info!(
            "event=client_create module=service status=ok client_id={}",
            created.client_id
        );
        Ok(created)
    }

    /// Applies a partial update to one client record.
    ///
    /// # Contract
    /// - Present patch fields are validated before any lookup.
    /// - `NotFound` when `id` does not resolve, including when the record
    ///   disappears between load and write.
    /// - Email, mobile and phone number id are re-checked excluding `id`;
    ///   every conflicting field is reported at once.
    /// - `client_id`, `role`, `created_at` and the password are untouched.
    pub fn update_user(&self, id: &str, patch: ClientPatch) -> ServiceResult<ClientRecord> {
        patch.validate()?;

        let mut current = self.load_required(id)?;

        let mut conflicts = Vec::new();
        if let Some(email) = patch.email.as_deref() {
            if !self.is_email_unique_excluding(email, id)? {
                conflicts.push(conflict(ClientField::Email, email));
            }
        }
        if let Some(mobile) = patch.mobile.as_deref() {
            if !self.is_mobile_unique_excluding(mobile, id)? {
                conflicts.push(conflict(ClientField::Mobile, mobile));
            }
        }
        if let Some(phone_number_id) = patch.phone_number_id.as_deref() {
            if !self.is_phone_number_id_unique_excluding(phone_number_id, id)? {
                conflicts.push(conflict(ClientField::PhoneNumberId, phone_number_id));
            }
        }
        if !conflicts.is_empty() {
            let fields = conflicts
                .iter()
                .map(|conflict| conflict.field.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let err = ClientServiceError::Conflict(conflicts);
            warn!(
                "event=client_update module=service status=error error_code={} client_id={} fields={}",
                err.code(),
                id,
                fields
            );
            return Err(err);
        }

        if let Some(email) = patch.email {
            current.email = email;
        }
        if let Some(name) = patch.name {
            current.name = name;
        }
        if let Some(mobile) = patch.mobile {
            current.mobile = mobile;
        }
        if let Some(phone_number_id) = patch.phone_number_id {
            current.phone_number_id = phone_number_id;
        }
        if let Some(chat_prefix) = patch.chat_prefix {
            current.chat_prefix = if chat_prefix.trim().is_empty() {
                None
            } else {
                Some(chat_prefix)
            };
        }
        if let Some(status) = patch.status {
            current.status = status;
        }
        current.updated_at = self.next_updated_at(current.updated_at);

        let updated = self.write_existing(&current)?;
        info!(
            "event=client_update module=service status=ok client_id={} client_status={}",
            updated.client_id, updated.status
        );
        Ok(updated)
    }

    /// Replaces the stored password hash for one client.
    pub fn change_password(&self, id: &str, new_password: &str) -> ServiceResult<ClientRecord> {
        validate_password(new_password)?;

        let mut current = self.load_required(id)?;
        current.password_hash = self.hasher.hash(new_password)?;
        current.updated_at = self.next_updated_at(current.updated_at);

        let updated = self.write_existing(&current)?;
        info!(
            "event=client_password_change module=service status=ok client_id={}",
            updated.client_id
        );
        Ok(updated)
    }

    /// Deletes one client record. Missing ids are a silent no-op.
    pub fn delete_user(&self, id: &str) -> ServiceResult<()> {
        self.repo.delete_by_id(id)?;
        info!(
            "event=client_delete module=service status=ok client_id={}",
            id
        );
        Ok(())
    }

    pub fn get_all_users(&self, page: PageRequest) -> ServiceResult<ClientPage> {
        Ok(self.repo.find_all(page)?)
    }

    pub fn get_users_by_status(
        &self,
        status: ClientStatus,
        page: PageRequest,
    ) -> ServiceResult<ClientPage> {
        Ok(self.repo.find_by_status(status, page)?)
    }

    pub fn get_user_by_id(&self, id: &str) -> ServiceResult<Option<ClientRecord>> {
        Ok(self.repo.find_by_id(id)?)
    }

    pub fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<ClientRecord>> {
        Ok(self.repo.find_by_email(email)?)
    }

    pub fn email_exists(&self, email: &str) -> ServiceResult<bool> {
        Ok(self.repo.find_by_email(email)?.is_some())
    }

    pub fn mobile_exists(&self, mobile: &str) -> ServiceResult<bool> {
        Ok(self.repo.find_by_mobile(mobile)?.is_some())
    }

    pub fn phone_number_id_exists(&self, phone_number_id: &str) -> ServiceResult<bool> {
        Ok(self.repo.find_by_phone_number_id(phone_number_id)?.is_some())
    }

    /// True when no record holds `email`, or only `excluded_id` holds it.
    pub fn is_email_unique_excluding(
        &self,
        email: &str,
        excluded_id: &str,
    ) -> ServiceResult<bool> {
        Ok(held_only_by(self.repo.find_by_email(email)?, excluded_id))
    }

    /// True when no record holds `mobile`, or only `excluded_id` holds it.
    pub fn is_mobile_unique_excluding(
        &self,
        mobile: &str,
        excluded_id: &str,
    ) -> ServiceResult<bool> {
        Ok(held_only_by(self.repo.find_by_mobile(mobile)?, excluded_id))
    }

    /// True when no record holds `phone_number_id`, or only `excluded_id` holds it.
    pub fn is_phone_number_id_unique_excluding(
        &self,
        phone_number_id: &str,
        excluded_id: &str,
    ) -> ServiceResult<bool> {
        Ok(held_only_by(
            self.repo.find_by_phone_number_id(phone_number_id)?,
            excluded_id,
        ))
    }

    pub fn get_active_users_count(&self) -> ServiceResult<u64> {
        Ok(self.repo.count_by_status(ClientStatus::Active)?)
    }

    pub fn get_inactive_users_count(&self) -> ServiceResult<u64> {
        Ok(self.repo.count_by_status(ClientStatus::Inactive)?)
    }

    pub fn get_total_users_count(&self) -> ServiceResult<u64> {
        Ok(self.repo.count()?)
    }

    /// Collects the three dashboard counters.
    pub fn dashboard_stats(&self) -> ServiceResult<DashboardStats> {
        Ok(DashboardStats {
            active_users: self.get_active_users_count()?,
            inactive_users: self.get_inactive_users_count()?,
            total_users: self.get_total_users_count()?,
        })
    }

    fn load_required(&self, id: &str) -> ServiceResult<ClientRecord> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| ClientServiceError::NotFound(id.to_string()))
    }

    /// Overwrites an existing row without ever re-inserting a deleted one.
    fn write_existing(&self, record: &ClientRecord) -> ServiceResult<ClientRecord> {
        self.repo
            .update(record)
            .map_err(|err| write_error(err, record))?
            .ok_or_else(|| {
                let err = ClientServiceError::NotFound(record.client_id.clone());
                warn!(
                    "event=client_write module=service status=error error_code={} client_id={}",
                    err.code(),
                    record.client_id
                );
                err
            })
    }

    /// Clock reading, bumped past `previous` when the clock has not advanced.
    fn next_updated_at(&self, previous: i64) -> i64 {
        self.clock
            .now_epoch_ms()
            .max(previous.saturating_add(1))
    }

    fn reject_create(
        &self,
        field: ClientField,
        value: &str,
        client_id: &str,
    ) -> ClientServiceError {
        let err = ClientServiceError::Conflict(vec![conflict(field, value)]);
        warn!(
            "event=client_create module=service status=error error_code={} client_id={} field={}",
            err.code(),
            client_id,
            field
        );
        err
    }
}

fn conflict(field: ClientField, value: &str) -> FieldConflict {
    FieldConflict {
        field,
        value: value.to_string(),
    }
}

fn held_only_by(holder: Option<ClientRecord>, excluded_id: &str) -> bool {
    holder.map_or(true, |record| record.client_id == excluded_id)
}

/// Maps write-time constraint failures onto the service error kinds.
fn write_error(err: RepoError, record: &ClientRecord) -> ClientServiceError {
    match err {
        RepoError::UniqueViolation(key) => {
            let err =
                ClientServiceError::Conflict(vec![conflict(key.field(), key.value_of(record))]);
            warn!(
                "event=client_write module=service status=error error_code={} client_id={} field={}",
                err.code(),
                record.client_id,
                key.field()
            );
            err
        }
        other => ClientServiceError::Persistence(other),
    }
}

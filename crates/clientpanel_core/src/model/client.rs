//! Client record domain model.
//!
//! # Responsibility
//! - Define the canonical client account record and its enum-like fields.
//! - Provide shape validation for every caller-supplied field.
//! - Define create input (`NewClient`) and partial-update input (`ClientPatch`).
//!
//! # Invariants
//! - `client_id` is immutable once a record exists.
//! - `email`, `mobile` and `phone_number_id` are unique across all records.
//! - `updated_at` is never earlier than `created_at`.
//! - `password_hash` is never serialized.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Primary key of a client record.
pub type ClientId = String;

pub const CLIENT_ID_MIN_CHARS: usize = 3;
pub const CLIENT_ID_MAX_CHARS: usize = 10;
pub const EMAIL_MAX_CHARS: usize = 255;
pub const NAME_MAX_CHARS: usize = 255;
pub const CHAT_PREFIX_MAX_CHARS: usize = 2000;

static CLIENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid client id regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+_.-]+@(.+)$").expect("valid email regex"));
static MOBILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10,15}$").expect("valid mobile regex"));
static PHONE_NUMBER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{15}$").expect("valid phone number id regex"));

/// Account role. Only privileged bootstrap may create `Admin` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "CLIENT")]
    Client,
}

impl Role {
    /// Storage and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Client => "CLIENT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ADMIN" => Some(Self::Admin),
            "CLIENT" => Some(Self::Client),
            _ => None,
        }
    }
}

/// Account status. A plain two-valued field with no workflow attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
}

impl ClientStatus {
    /// Storage and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(Self::Active),
            "Inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

impl FromStr for ClientStatus {
    type Err = ClientValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value.trim()).ok_or_else(|| {
            ClientValidationError::new(
                ClientField::Status,
                format!("unsupported status `{value}`; expected Active|Inactive"),
            )
        })
    }
}

impl Display for ClientStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field names used in validation and conflict reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientField {
    ClientId,
    Email,
    Name,
    Mobile,
    PhoneNumberId,
    Password,
    ChatPrefix,
    Status,
    UpdatedAt,
}

impl ClientField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientId => "clientId",
            Self::Email => "email",
            Self::Name => "name",
            Self::Mobile => "mobile",
            Self::PhoneNumberId => "phoneNumberId",
            Self::Password => "password",
            Self::ChatPrefix => "chatPrefix",
            Self::Status => "status",
            Self::UpdatedAt => "updatedAt",
        }
    }
}

impl Display for ClientField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Columns held unique across all client records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueKey {
    ClientId,
    Email,
    Mobile,
    PhoneNumberId,
}

impl UniqueKey {
    pub fn field(self) -> ClientField {
        match self {
            Self::ClientId => ClientField::ClientId,
            Self::Email => ClientField::Email,
            Self::Mobile => ClientField::Mobile,
            Self::PhoneNumberId => ClientField::PhoneNumberId,
        }
    }

    /// The value `record` holds for this key.
    pub fn value_of(self, record: &ClientRecord) -> &str {
        match self {
            Self::ClientId => &record.client_id,
            Self::Email => &record.email,
            Self::Mobile => &record.mobile,
            Self::PhoneNumberId => &record.phone_number_id,
        }
    }
}

/// Shape or required-field violation for one input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientValidationError {
    pub field: ClientField,
    pub reason: String,
}

impl ClientValidationError {
    pub fn new(field: ClientField, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl Display for ClientValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.reason)
    }
}

impl Error for ClientValidationError {}

/// Canonical persisted client account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub client_id: ClientId,
    pub email: String,
    pub name: String,
    pub mobile: String,
    pub phone_number_id: String,
    /// Argon2 PHC string. Kept out of every serialized projection.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub chat_prefix: Option<String>,
    pub role: Role,
    pub status: ClientStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Always >= `created_at`.
    pub updated_at: i64,
}

impl ClientRecord {
    /// Validates every persisted field, including timestamp ordering.
    ///
    /// Used on read-back so corrupted rows surface as errors instead of
    /// flowing into business logic.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        validate_client_id(&self.client_id)?;
        validate_email(&self.email)?;
        validate_name(&self.name)?;
        validate_mobile(&self.mobile)?;
        validate_phone_number_id(&self.phone_number_id)?;
        if self.password_hash.trim().is_empty() {
            return Err(ClientValidationError::new(
                ClientField::Password,
                "password hash is required",
            ));
        }
        if let Some(prefix) = self.chat_prefix.as_deref() {
            validate_chat_prefix(prefix)?;
        }
        if self.updated_at < self.created_at {
            return Err(ClientValidationError::new(
                ClientField::UpdatedAt,
                format!(
                    "updated_at {} is earlier than created_at {}",
                    self.updated_at, self.created_at
                ),
            ));
        }
        Ok(())
    }
}

/// Create input. Role, status and timestamps are not caller-settable.
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    pub client_id: String,
    pub email: String,
    pub name: String,
    pub mobile: String,
    pub phone_number_id: String,
    /// Plaintext; hashed before anything is persisted.
    pub password: String,
    pub chat_prefix: Option<String>,
}

impl std::fmt::Debug for NewClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewClient")
            .field("client_id", &self.client_id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("mobile", &self.mobile)
            .field("phone_number_id", &self.phone_number_id)
            .field("password", &"<redacted>")
            .field("chat_prefix", &self.chat_prefix)
            .finish()
    }
}

impl NewClient {
    /// Checks every field in declaration order and reports the first failure.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        validate_client_id(&self.client_id)?;
        validate_email(&self.email)?;
        validate_name(&self.name)?;
        validate_mobile(&self.mobile)?;
        validate_phone_number_id(&self.phone_number_id)?;
        validate_password(&self.password)?;
        if let Some(prefix) = self.chat_prefix.as_deref() {
            validate_chat_prefix(prefix)?;
        }
        Ok(())
    }
}

/// Partial update. `None` leaves the stored value unchanged.
///
/// `chat_prefix: Some("")` (or whitespace only) clears the stored prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub phone_number_id: Option<String>,
    pub chat_prefix: Option<String>,
    pub status: Option<ClientStatus>,
}

impl ClientPatch {
    /// Validates only the fields present in the patch.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if let Some(email) = self.email.as_deref() {
            validate_email(email)?;
        }
        if let Some(name) = self.name.as_deref() {
            validate_name(name)?;
        }
        if let Some(mobile) = self.mobile.as_deref() {
            validate_mobile(mobile)?;
        }
        if let Some(phone_number_id) = self.phone_number_id.as_deref() {
            validate_phone_number_id(phone_number_id)?;
        }
        if let Some(prefix) = self.chat_prefix.as_deref() {
            validate_chat_prefix(prefix)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

pub fn validate_client_id(value: &str) -> Result<(), ClientValidationError> {
    if value.trim().is_empty() {
        return Err(ClientValidationError::new(
            ClientField::ClientId,
            "client id is required",
        ));
    }
    let len = value.chars().count();
    if !(CLIENT_ID_MIN_CHARS..=CLIENT_ID_MAX_CHARS).contains(&len) {
        return Err(ClientValidationError::new(
            ClientField::ClientId,
            format!(
                "client id must be between {CLIENT_ID_MIN_CHARS} and {CLIENT_ID_MAX_CHARS} characters"
            ),
        ));
    }
    if !CLIENT_ID_RE.is_match(value) {
        return Err(ClientValidationError::new(
            ClientField::ClientId,
            "client id must contain only alphanumeric, underscore, and hyphen characters",
        ));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), ClientValidationError> {
    if value.trim().is_empty() {
        return Err(ClientValidationError::new(
            ClientField::Email,
            "email is required",
        ));
    }
    if value.chars().count() > EMAIL_MAX_CHARS {
        return Err(ClientValidationError::new(
            ClientField::Email,
            format!("email cannot exceed {EMAIL_MAX_CHARS} characters"),
        ));
    }
    if !EMAIL_RE.is_match(value) {
        return Err(ClientValidationError::new(
            ClientField::Email,
            "email should be valid",
        ));
    }
    Ok(())
}

pub fn validate_name(value: &str) -> Result<(), ClientValidationError> {
    if value.trim().is_empty() {
        return Err(ClientValidationError::new(
            ClientField::Name,
            "name is required",
        ));
    }
    if value.chars().count() > NAME_MAX_CHARS {
        return Err(ClientValidationError::new(
            ClientField::Name,
            format!("name cannot exceed {NAME_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

pub fn validate_mobile(value: &str) -> Result<(), ClientValidationError> {
    if value.is_empty() {
        return Err(ClientValidationError::new(
            ClientField::Mobile,
            "mobile number is required",
        ));
    }
    if !MOBILE_RE.is_match(value) {
        return Err(ClientValidationError::new(
            ClientField::Mobile,
            "mobile number must be numeric between 10 and 15 digits",
        ));
    }
    Ok(())
}

pub fn validate_phone_number_id(value: &str) -> Result<(), ClientValidationError> {
    if value.is_empty() {
        return Err(ClientValidationError::new(
            ClientField::PhoneNumberId,
            "phone number id is required",
        ));
    }
    if !PHONE_NUMBER_ID_RE.is_match(value) {
        return Err(ClientValidationError::new(
            ClientField::PhoneNumberId,
            "phone number id must be exactly 15 numeric digits",
        ));
    }
    Ok(())
}

pub fn validate_password(value: &str) -> Result<(), ClientValidationError> {
    if value.trim().is_empty() {
        return Err(ClientValidationError::new(
            ClientField::Password,
            "password is required",
        ));
    }
    Ok(())
}

pub fn validate_chat_prefix(value: &str) -> Result<(), ClientValidationError> {
    if value.chars().count() > CHAT_PREFIX_MAX_CHARS {
        return Err(ClientValidationError::new(
            ClientField::ChatPrefix,
            format!("chat prefix cannot exceed {CHAT_PREFIX_MAX_CHARS} characters"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        validate_client_id, validate_email, validate_mobile, validate_phone_number_id,
        ClientField, ClientPatch, ClientStatus, NewClient,
    };

    fn valid_new_client() -> NewClient {
        NewClient {
            client_id: "c001".to_string(),
            email: "a@x.com".to_string(),
            name: "Alice".to_string(),
            mobile: "1111111111".to_string(),
            phone_number_id: "100000000000001".to_string(),
            password: "secret".to_string(),
            chat_prefix: None,
        }
    }

    #[test]
    fn client_id_shape_rules() {
        assert!(validate_client_id("c_1-A").is_ok());
        assert!(validate_client_id("ab").is_err());
        assert!(validate_client_id("abcdefghijk").is_err());
        let err = validate_client_id("bad id").unwrap_err();
        assert_eq!(err.field, ClientField::ClientId);
    }

    #[test]
    fn email_requires_at_sign_with_domain() {
        assert!(validate_email("user.name+tag@example.com").is_ok());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("   ").is_err());
    }

    #[test]
    fn mobile_and_phone_number_id_are_digit_only() {
        assert!(validate_mobile("1234567890").is_ok());
        assert!(validate_mobile("123456789012345").is_ok());
        assert!(validate_mobile("123456789").is_err());
        assert!(validate_mobile("12345abc90").is_err());
        assert!(validate_phone_number_id("123456789012345").is_ok());
        assert!(validate_phone_number_id("12345678901234").is_err());
    }

    #[test]
    fn new_client_reports_first_invalid_field() {
        let mut input = valid_new_client();
        assert!(input.validate().is_ok());

        input.mobile = "12".to_string();
        input.password = String::new();
        let err = input.validate().unwrap_err();
        assert_eq!(err.field, ClientField::Mobile);
    }

    #[test]
    fn chat_prefix_is_capped() {
        let mut input = valid_new_client();
        input.chat_prefix = Some("x".repeat(2001));
        let err = input.validate().unwrap_err();
        assert_eq!(err.field, ClientField::ChatPrefix);
    }

    #[test]
    fn patch_validates_present_fields_only() {
        assert!(ClientPatch::default().validate().is_ok());
        assert!(ClientPatch::default().is_empty());

        let patch = ClientPatch {
            name: Some("  ".to_string()),
            ..ClientPatch::default()
        };
        assert_eq!(patch.validate().unwrap_err().field, ClientField::Name);
    }

    #[test]
    fn new_client_debug_redacts_password() {
        let rendered = format!("{:?}", valid_new_client());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn status_parses_exact_labels() {
        assert_eq!("Inactive".parse::<ClientStatus>().unwrap(), ClientStatus::Inactive);
        assert!("inactive".parse::<ClientStatus>().is_err());
        assert_eq!(ClientStatus::default(), ClientStatus::Active);
    }
}

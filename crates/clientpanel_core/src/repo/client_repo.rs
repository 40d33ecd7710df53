//! Client record repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed CRUD and query access over canonical `clients` storage.
//! - Keep SQL details inside the core persistence boundary.
//! - Classify write-time UNIQUE violations per field.
//!
//! # Invariants
//! - The store knows nothing about business validation; it only rejects
//!   rows that break schema constraints.
//! - Read paths reject invalid persisted state instead of masking it.
//! - List ordering is `client_id ASC`, stable across calls absent writes.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::client::{ClientRecord, ClientStatus, ClientValidationError, Role, UniqueKey};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Row, ToSql};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CLIENT_SELECT_SQL: &str = "SELECT
    client_id,
    email,
    name,
    mobile,
    phone_number_id,
    password_hash,
    chat_prefix,
    role,
    status,
    created_at,
    updated_at
FROM clients";

const REQUIRED_COLUMNS: &[&str] = &[
    "client_id",
    "email",
    "name",
    "mobile",
    "phone_number_id",
    "password_hash",
    "chat_prefix",
    "role",
    "status",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for client persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    UniqueViolation(UniqueKey),
    /// A persisted row failed domain validation on read-back.
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UniqueViolation(key) => {
                write!(f, "unique constraint violated on `{}`", key.field())
            }
            Self::InvalidData(message) => write!(f, "invalid persisted client data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match unique_violation_key(&value) {
            Some(key) => Self::UniqueViolation(key),
            None => Self::Db(DbError::Sqlite(value)),
        }
    }
}

impl From<ClientValidationError> for RepoError {
    fn from(value: ClientValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Zero-based page request. `page_size` is fixed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_index: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page_index: u32, page_size: u32) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    fn offset(self) -> i64 {
        i64::from(self.page_index) * i64::from(self.page_size)
    }
}

/// One page of client records plus the total row count of the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPage {
    /// Items ordered by `client_id ASC`.
    pub items: Vec<ClientRecord>,
    pub total_count: u64,
    pub page_index: u32,
    pub page_size: u32,
}

impl ClientPage {
    /// Number of pages needed to cover `total_count`; zero for empty scans.
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page_index) + 1 < self.total_pages()
    }
}

/// Repository interface for client record storage.
pub trait ClientRepository {
    fn find_by_id(&self, id: &str) -> RepoResult<Option<ClientRecord>>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<ClientRecord>>;
    fn find_by_mobile(&self, mobile: &str) -> RepoResult<Option<ClientRecord>>;
    fn find_by_phone_number_id(&self, phone_number_id: &str) -> RepoResult<Option<ClientRecord>>;
    fn find_all(&self, page: PageRequest) -> RepoResult<ClientPage>;
    fn find_by_status(&self, status: ClientStatus, page: PageRequest) -> RepoResult<ClientPage>;
    fn count_by_status(&self, status: ClientStatus) -> RepoResult<u64>;
    fn count(&self) -> RepoResult<u64>;
    /// Inserts a new record; an existing key is a `UniqueViolation(ClientId)`.
    fn insert(&self, record: &ClientRecord) -> RepoResult<ClientRecord>;
    /// Inserts when the key is new, otherwise overwrites the full row.
    fn save(&self, record: &ClientRecord) -> RepoResult<ClientRecord>;
    /// Overwrites an existing row; `Ok(None)` when the key is absent.
    fn update(&self, record: &ClientRecord) -> RepoResult<Option<ClientRecord>>;
    /// Removes the row; a missing key is not an error.
    fn delete_by_id(&self, id: &str) -> RepoResult<()>;
}

/// SQLite-backed client repository.
pub struct SqliteClientRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClientRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_client_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn find_one_by(&self, column: &'static str, value: &str) -> RepoResult<Option<ClientRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{CLIENT_SELECT_SQL} WHERE {column} = ?1;"))?;
        let mut rows = stmt.query([value])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_client_row(row)?)),
            None => Ok(None),
        }
    }

    fn select_page(
        &self,
        status: Option<ClientStatus>,
        page: PageRequest,
    ) -> RepoResult<ClientPage> {
        let total_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM clients WHERE (?1 IS NULL OR status = ?1);",
            [status],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare_cached(&format!(
            "{CLIENT_SELECT_SQL}
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY client_id ASC
             LIMIT ?2 OFFSET ?3;"
        ))?;
        let mut rows = stmt.query(params![
            status,
            i64::from(page.page_size),
            page.offset()
        ])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_client_row(row)?);
        }

        Ok(ClientPage {
            items,
            total_count: count_to_u64(total_count)?,
            page_index: page.page_index,
            page_size: page.page_size,
        })
    }
}

impl ClientRepository for SqliteClientRepository<'_> {
    fn find_by_id(&self, id: &str) -> RepoResult<Option<ClientRecord>> {
        self.find_one_by("client_id", id)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<ClientRecord>> {
        self.find_one_by("email", email)
    }

    fn find_by_mobile(&self, mobile: &str) -> RepoResult<Option<ClientRecord>> {
        self.find_one_by("mobile", mobile)
    }

    fn find_by_phone_number_id(&self, phone_number_id: &str) -> RepoResult<Option<ClientRecord>> {
        self.find_one_by("phone_number_id", phone_number_id)
    }

    fn find_all(&self, page: PageRequest) -> RepoResult<ClientPage> {
        self.select_page(None, page)
    }

    fn find_by_status(&self, status: ClientStatus, page: PageRequest) -> RepoResult<ClientPage> {
        self.select_page(Some(status), page)
    }

    fn count_by_status(&self, status: ClientStatus) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM clients WHERE status = ?1;",
            [status],
            |row| row.get(0),
        )?;
        count_to_u64(count)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM clients;", [], |row| row.get(0))?;
        count_to_u64(count)
    }

    fn insert(&self, record: &ClientRecord) -> RepoResult<ClientRecord> {
        self.conn.execute(
            "INSERT INTO clients (
                client_id,
                email,
                name,
                mobile,
                phone_number_id,
                password_hash,
                chat_prefix,
                role,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            &record_params(record)[..],
        )?;
        self.read_back(&record.client_id)
    }

    fn save(&self, record: &ClientRecord) -> RepoResult<ClientRecord> {
        // Single statement: the upsert is atomic per key under SQLite locking.
        self.conn.execute(
            "INSERT INTO clients (
                client_id,
                email,
                name,
                mobile,
                phone_number_id,
                password_hash,
                chat_prefix,
                role,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(client_id) DO UPDATE SET
                email = excluded.email,
                name = excluded.name,
                mobile = excluded.mobile,
                phone_number_id = excluded.phone_number_id,
                password_hash = excluded.password_hash,
                chat_prefix = excluded.chat_prefix,
                role = excluded.role,
                status = excluded.status,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at;",
            &record_params(record)[..],
        )?;
        self.read_back(&record.client_id)
    }

    fn update(&self, record: &ClientRecord) -> RepoResult<Option<ClientRecord>> {
        let changed = self.conn.execute(
            "UPDATE clients SET
                email = ?2,
                name = ?3,
                mobile = ?4,
                phone_number_id = ?5,
                password_hash = ?6,
                chat_prefix = ?7,
                role = ?8,
                status = ?9,
                created_at = ?10,
                updated_at = ?11
            WHERE client_id = ?1;",
            &record_params(record)[..],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.read_back(&record.client_id).map(Some)
    }

    fn delete_by_id(&self, id: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM clients WHERE client_id = ?1;", [id])?;
        Ok(())
    }
}

impl SqliteClientRepository<'_> {
    fn read_back(&self, id: &str) -> RepoResult<ClientRecord> {
        self.find_by_id(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("client `{id}` missing in read-back after write"))
        })
    }
}

fn record_params(record: &ClientRecord) -> [&dyn ToSql; 11] {
    [
        &record.client_id,
        &record.email,
        &record.name,
        &record.mobile,
        &record.phone_number_id,
        &record.password_hash,
        &record.chat_prefix,
        &record.role,
        &record.status,
        &record.created_at,
        &record.updated_at,
    ]
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Text(self.as_str().as_bytes())))
    }
}

impl ToSql for ClientStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(ValueRef::Text(self.as_str().as_bytes())))
    }
}

fn parse_client_row(row: &Row<'_>) -> RepoResult<ClientRecord> {
    let role_text: String = row.get("role")?;
    let role = Role::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in clients.role"))
    })?;

    let status_text: String = row.get("status")?;
    let status = ClientStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in clients.status"))
    })?;

    let record = ClientRecord {
        client_id: row.get("client_id")?,
        email: row.get("email")?,
        name: row.get("name")?,
        mobile: row.get("mobile")?,
        phone_number_id: row.get("phone_number_id")?,
        password_hash: row.get("password_hash")?,
        chat_prefix: row.get("chat_prefix")?,
        role,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    record.validate()?;
    Ok(record)
}

/// Maps a SQLite UNIQUE/PRIMARY KEY failure to the offending column.
///
/// SQLite reports these as `UNIQUE constraint failed: clients.<column>`.
fn unique_violation_key(err: &rusqlite::Error) -> Option<UniqueKey> {
    let rusqlite::Error::SqliteFailure(failure, message) = err else {
        return None;
    };
    if failure.code != ErrorCode::ConstraintViolation {
        return None;
    }
    if failure.extended_code != ffi::SQLITE_CONSTRAINT_UNIQUE
        && failure.extended_code != ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    {
        return None;
    }

    let column = message.as_deref()?.rsplit("clients.").next()?.trim();
    match column {
        "client_id" => Some(UniqueKey::ClientId),
        "email" => Some(UniqueKey::Email),
        "mobile" => Some(UniqueKey::Mobile),
        "phone_number_id" => Some(UniqueKey::PhoneNumberId),
        _ => None,
    }
}

fn count_to_u64(value: i64) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{value}`")))
}

fn ensure_client_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "clients")? {
        return Err(RepoError::MissingRequiredTable("clients"));
    }

    for &column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "clients", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "clients",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1
             FROM sqlite_master
             WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(exists.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

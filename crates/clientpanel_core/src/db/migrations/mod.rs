//! SQLite migration registry and executor.
//!
//! # Invariants
//! - `version` values strictly increase through `MIGRATIONS`.
//! - Pending steps run in one transaction; the applied version is mirrored
//!   to `PRAGMA user_version` only when every step succeeds.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_clients.sql"),
}];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the `clients` schema on `conn` up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the store is ahead of this binary.
/// - `Migration` naming the step that failed; the schema stays at its
///   previous version.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    run_steps(conn, MIGRATIONS)
}

/// Reads the schema version recorded in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn run_steps(conn: &mut Connection, steps: &[Migration]) -> DbResult<()> {
    let from_version = current_user_version(conn)?;
    let target = steps.last().map_or(0, |step| step.version);

    if from_version > target {
        return Err(DbError::UnsupportedSchemaVersion {
            found: from_version,
            supported: target,
        });
    }
    if from_version == target {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in steps.iter().filter(|step| step.version > from_version) {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| {
                error!(
                    "event=db_migrate module=db status=error version={} error={}",
                    step.version, source
                );
                DbError::Migration {
                    version: step.version,
                    source,
                }
            })?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        from_version, target
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{current_user_version, run_steps, Migration};
    use crate::db::DbError;
    use rusqlite::Connection;

    const BROKEN: &[Migration] = &[
        Migration {
            version: 1,
            sql: "CREATE TABLE first_step (id INTEGER PRIMARY KEY);",
        },
        Migration {
            version: 2,
            sql: "CREATE TABLE broken (",
        },
    ];

    #[test]
    fn failing_step_is_named_and_rolls_back_the_run() {
        let mut conn = Connection::open_in_memory().unwrap();

        let err = run_steps(&mut conn, BROKEN).unwrap_err();
        assert!(matches!(err, DbError::Migration { version: 2, .. }));
        assert!(err.to_string().contains("migration 2"));

        assert_eq!(current_user_version(&conn).unwrap(), 0);
        let first_step_tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'first_step';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(first_step_tables, 0);
    }

    #[test]
    fn steps_already_applied_are_skipped() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_steps(&mut conn, &BROKEN[..1]).unwrap();
        run_steps(&mut conn, &BROKEN[..1]).unwrap();
        assert_eq!(current_user_version(&conn).unwrap(), 1);
    }
}

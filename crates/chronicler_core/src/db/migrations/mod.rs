//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically, one transaction per step.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Each step commits its DDL together with the `PRAGMA user_version` bump,
//!   so an interrupted upgrade never leaves a half-applied step visible.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_worlds_regions.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_concentration.sql"),
    },
    Migration {
        version: 3,
        sql: include_str!("0003_audit_log.sql"),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// Re-running against an already-current database is a no-op. A database
/// stamped with a version newer than this binary understands is rejected
/// rather than modified.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        apply_step(conn, migration)?;
    }

    Ok(())
}

fn apply_step(conn: &mut Connection, migration: &Migration) -> DbResult<()> {
    let step = |conn: &mut Connection| -> Result<(), rusqlite::Error> {
        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        tx.commit()
    };

    step(conn).map_err(|source| DbError::Migration {
        version: migration.version,
        source,
    })
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

//! Versioned schema scripts for the earthquake store.
//!
//! Each script moves `PRAGMA user_version` up by one step. A run applies every
//! pending step inside a single transaction.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};

/// `(version, script)` pairs, strictly increasing.
const SCHEMA_STEPS: &[(u32, &str)] = &[(1, include_str!("0001_init.sql"))];

/// Returns the newest schema version this build can write.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |(version, _)| *version)
}

/// Versions that still have to run on a database at `from_version`.
pub fn pending_versions(from_version: u32) -> Vec<u32> {
    SCHEMA_STEPS
        .iter()
        .map(|(version, _)| *version)
        .filter(|version| *version > from_version)
        .collect()
}

/// Brings the connection's schema up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database is ahead of this build.
/// - `MigrationFailed` naming the step that broke; nothing from the run is kept.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();

    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending = pending_versions(from_version);
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, script) in SCHEMA_STEPS {
        if pending.contains(version) {
            run_step(&tx, *version, script)?;
        }
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} steps={}",
        from_version,
        latest,
        pending.len()
    );
    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn run_step(tx: &Transaction<'_>, version: u32, script: &str) -> DbResult<()> {
    tx.execute_batch(script)
        .and_then(|()| tx.pragma_update(None, "user_version", version))
        .map_err(|source| DbError::MigrationFailed { version, source })
}

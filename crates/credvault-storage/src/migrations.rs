// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Versioned schema migrations.
//!
//! Applied versions are recorded in `schema_migrations`. Every step is also
//! idempotent on its own (`IF NOT EXISTS`, column introspection), so vault
//! files that already carry some of the schema but no history converge
//! without error.

use rusqlite::{Connection, params};
use tracing::{debug, info};

/// One schema step.
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub apply: fn(&Connection) -> rusqlite::Result<()>,
}

/// Ordered list of every known migration.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "base_schema",
        apply: base_schema,
    },
    Migration {
        version: 2,
        name: "flexible_credentials",
        apply: flexible_credentials,
    },
    Migration {
        version: 3,
        name: "rotation_grace_period",
        apply: rotation_grace_period,
    },
];

/// Highest version this build knows.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Result of a [`run_migrations`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Versions applied by this call, ascending.
    pub applied: Vec<u32>,
    /// Schema version after the call.
    pub current_version: u32,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Apply every pending migration, each in its own transaction with its
/// history row.
///
/// A store written by a newer build (unknown version in the history) is
/// refused rather than modified.
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<MigrationReport> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            name       TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        );",
    )?;

    let recorded: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    let latest = latest_version();
    if let Some(found) = recorded
        && found > latest
    {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISMATCH),
            Some(format!(
                "vault schema version {found} is newer than the supported version {latest}"
            )),
        ));
    }

    let mut report = MigrationReport::default();
    for migration in MIGRATIONS {
        if is_applied(conn, migration.version)? {
            continue;
        }
        debug!(version = migration.version, name = migration.name, "applying migration");
        let tx = conn.transaction()?;
        (migration.apply)(&tx)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at)
             VALUES (?1, ?2, strftime('%s', 'now'))",
            params![migration.version, migration.name],
        )?;
        tx.commit()?;
        report.applied.push(migration.version);
    }

    report.current_version = latest;
    if !report.is_noop() {
        info!(applied = ?report.applied, version = latest, "vault schema migrated");
    }
    Ok(report)
}

fn is_applied(conn: &Connection, version: u32) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?1)",
        params![version],
        |row| row.get(0),
    )
}

/// Whether `table` has a column named `column`.
pub fn has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2)",
        params![table, column],
        |row| row.get(0),
    )
}

fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    decl: &str,
) -> rusqlite::Result<()> {
    if !has_column(conn, table, column)? {
        conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl}"))?;
    }
    Ok(())
}

fn base_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS config (
            key   TEXT PRIMARY KEY,
            value BLOB NOT NULL
        );
        CREATE TABLE IF NOT EXISTS credentials (
            id         TEXT PRIMARY KEY,
            name       TEXT UNIQUE NOT NULL,
            api_key    BLOB NOT NULL,
            api_type   TEXT,
            metadata   TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )
}

fn flexible_credentials(conn: &Connection) -> rusqlite::Result<()> {
    for (column, decl) in [
        ("environment", "TEXT"),
        ("public_key", "TEXT"),
        ("url", "TEXT"),
        ("config", "TEXT"),
        ("key_id", "TEXT"),
        ("last_rotated", "INTEGER"),
    ] {
        add_column_if_missing(conn, "credentials", column, decl)?;
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS rotations (
            id              TEXT PRIMARY KEY,
            credential_name TEXT NOT NULL,
            rotated_fields  TEXT NOT NULL,
            old_key_id      TEXT,
            new_key_id      TEXT,
            plugin_name     TEXT NOT NULL,
            rotated_at      INTEGER NOT NULL,
            rotated_by      TEXT NOT NULL,
            metadata        TEXT,
            FOREIGN KEY (credential_name) REFERENCES credentials(name) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_rotations_credential ON rotations(credential_name);
        CREATE INDEX IF NOT EXISTS idx_rotations_date ON rotations(rotated_at);",
    )
}

fn rotation_grace_period(conn: &Connection) -> rusqlite::Result<()> {
    add_column_if_missing(conn, "rotations", "grace_period_secs", "INTEGER")
}

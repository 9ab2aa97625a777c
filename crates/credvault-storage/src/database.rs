// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted database handle.
//!
//! One `tokio_rusqlite::Connection` per vault. Its background thread
//! serializes every statement, so all query modules go through
//! [`Database::connection`] and never open a second connection.

use std::path::{Path, PathBuf};
use std::time::Duration;

use credvault_core::VaultError;
use rusqlite::ErrorCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::migrations::{self, MigrationReport};

/// Map a tokio-rusqlite error to a storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> VaultError {
    VaultError::Store {
        source: Box::new(e),
    }
}

/// Whether a SQLite error is a constraint violation (UNIQUE, FOREIGN KEY).
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// An unlocked SQLCipher database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database at `path`, keyed with `passphrase`.
    ///
    /// The key is verified with a schema read before anything else runs; a
    /// wrong passphrase or a file that is not a vault is a `DecryptFailure`.
    pub async fn open(path: &Path, passphrase: &SecretString) -> Result<Self, VaultError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(VaultError::store)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| VaultError::Store {
                source: Box::new(e),
            })?;

        let passphrase = passphrase.clone();
        let unlocked = conn
            .call(move |conn| {
                conn.pragma_update(None, "key", passphrase.expose_secret())?;
                match conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
                    row.get::<_, i64>(0)
                }) {
                    Ok(_) => {}
                    Err(rusqlite::Error::SqliteFailure(e, _))
                        if e.code == ErrorCode::NotADatabase =>
                    {
                        return Ok(false);
                    }
                    Err(e) => return Err(e),
                }
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
                conn.pragma_update(None, "foreign_keys", "ON")?;
                conn.busy_timeout(Duration::from_secs(5))?;
                Ok(true)
            })
            .await
            .map_err(map_tr_err)?;

        if !unlocked {
            return Err(VaultError::DecryptFailure);
        }

        debug!(path = %path.display(), "database unlocked");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Bring the schema up to date. Safe to call on every open.
    pub async fn migrate(&self) -> Result<MigrationReport, VaultError> {
        self.conn
            .call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(map_tr_err)
    }

    /// The underlying connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the connection, flushing the WAL.
    pub async fn close(self) -> Result<(), VaultError> {
        self.conn.close().await.map_err(VaultError::store)?;
        debug!(path = %self.path.display(), "database closed");
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

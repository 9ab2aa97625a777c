// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential CRUD operations.

use credvault_core::VaultError;
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, is_constraint_violation, map_tr_err};
use crate::models::{CredentialRow, MetadataUpdate, SummaryRow};

const CREDENTIAL_COLUMNS: &str = "id, name, api_key, api_type, metadata, environment, public_key, \
     url, config, key_id, last_rotated, created_at, updated_at";

fn credential_from_row(row: &Row<'_>) -> rusqlite::Result<CredentialRow> {
    Ok(CredentialRow {
        id: row.get(0)?,
        name: row.get(1)?,
        api_key: row.get(2)?,
        api_type: row.get(3)?,
        metadata: row.get(4)?,
        environment: row.get(5)?,
        public_key: row.get(6)?,
        url: row.get(7)?,
        config: row.get(8)?,
        key_id: row.get(9)?,
        last_rotated: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Insert a credential. Returns `Duplicate` when the name is taken.
pub async fn insert_credential(db: &Database, row: &CredentialRow) -> Result<(), VaultError> {
    let row = row.clone();
    let name = row.name.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            let result = conn.execute(
                "INSERT INTO credentials (id, name, api_key, api_type, metadata, environment, \
                 public_key, url, config, key_id, last_rotated, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    row.id,
                    row.name,
                    row.api_key,
                    row.api_type,
                    row.metadata,
                    row.environment,
                    row.public_key,
                    row.url,
                    row.config,
                    row.key_id,
                    row.last_rotated,
                    row.created_at,
                    row.updated_at,
                ],
            );
            match result {
                Ok(_) => Ok(true),
                Err(e) if is_constraint_violation(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(VaultError::Duplicate { name })
    }
}

/// Fetch one full row by name.
pub async fn get_credential(db: &Database, name: &str) -> Result<Option<CredentialRow>, VaultError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE name = ?1"),
                params![name],
                credential_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All credentials ordered by name, without reading secret contents.
pub async fn list_credentials(db: &Database) -> Result<Vec<SummaryRow>, VaultError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name, api_type, environment,
                        length(api_key) > 0,
                        public_key IS NOT NULL AND length(public_key) > 0,
                        last_rotated, created_at, updated_at
                 FROM credentials ORDER BY name",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(SummaryRow {
                    name: row.get(0)?,
                    api_type: row.get(1)?,
                    environment: row.get(2)?,
                    has_secret: row.get(3)?,
                    has_public: row.get(4)?,
                    last_rotated: row.get(5)?,
                    created_at: row.get(6)?,
                    updated_at: row.get(7)?,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Update metadata columns. Returns whether a row matched.
///
/// `None` keeps a column; an empty environment or metadata string clears it.
pub async fn update_metadata(
    db: &Database,
    name: &str,
    update: MetadataUpdate,
) -> Result<bool, VaultError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE credentials SET
                    api_type    = COALESCE(?1, api_type),
                    environment = CASE WHEN ?2 IS NULL THEN environment ELSE NULLIF(?2, '') END,
                    config      = COALESCE(?3, config),
                    metadata    = CASE WHEN ?4 IS NULL THEN metadata ELSE NULLIF(?4, '') END,
                    updated_at  = ?5
                 WHERE name = ?6",
                params![
                    update.api_type,
                    update.environment,
                    update.config,
                    update.metadata,
                    update.updated_at,
                    name,
                ],
            )?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete by name. Returns whether a row was removed.
///
/// Rotation history goes with it through the foreign-key cascade.
pub async fn delete_credential(db: &Database, name: &str) -> Result<bool, VaultError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute("DELETE FROM credentials WHERE name = ?1", params![name])?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}

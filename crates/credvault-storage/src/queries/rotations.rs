// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The rotation transaction and audit history.

use credvault_core::VaultError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{RotationApplied, RotationRow, RotationWrite};

/// Apply a rotation: new values, `last_rotated`, and the audit row, all in
/// one transaction. Any failure rolls every part back.
pub async fn apply_rotation(
    db: &Database,
    credential_name: &str,
    write: RotationWrite,
) -> Result<RotationApplied, VaultError> {
    let name = credential_name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let Some(old_key_id) = tx
                .query_row(
                    "SELECT key_id FROM credentials WHERE name = ?1",
                    params![name],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()?
            else {
                return Ok(RotationApplied::NotFound);
            };

            let record = write.record;
            tx.execute(
                "UPDATE credentials SET
                    api_key      = COALESCE(?1, api_key),
                    public_key   = COALESCE(?2, public_key),
                    url          = COALESCE(?3, url),
                    key_id       = COALESCE(?4, key_id),
                    last_rotated = ?5,
                    updated_at   = ?5
                 WHERE name = ?6",
                params![
                    write.api_key,
                    write.public_key,
                    write.url,
                    write.key_id,
                    record.rotated_at,
                    name,
                ],
            )?;

            tx.execute(
                "INSERT INTO rotations (id, credential_name, rotated_fields, old_key_id, \
                 new_key_id, plugin_name, rotated_at, rotated_by, metadata, grace_period_secs)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    name,
                    record.rotated_fields,
                    old_key_id,
                    record.new_key_id,
                    record.plugin_name,
                    record.rotated_at,
                    record.rotated_by,
                    record.metadata,
                    record.grace_period_secs,
                ],
            )?;

            tx.commit()?;
            Ok(RotationApplied::Applied { old_key_id })
        })
        .await
        .map_err(map_tr_err)
}

/// Rotation records for a credential, most recent first, ties broken by
/// insertion order. `None` when the credential does not exist.
pub async fn rotation_history(
    db: &Database,
    credential_name: &str,
    limit: u32,
) -> Result<Option<Vec<RotationRow>>, VaultError> {
    let name = credential_name.to_string();
    db.connection()
        .call(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM credentials WHERE name = ?1)",
                params![name],
                |row| row.get(0),
            )?;
            if !exists {
                return Ok(None);
            }

            let mut stmt = conn.prepare(
                "SELECT id, credential_name, rotated_fields, old_key_id, new_key_id, plugin_name,
                        rotated_at, rotated_by, metadata, grace_period_secs
                 FROM rotations WHERE credential_name = ?1
                 ORDER BY rotated_at DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![name, limit], |row| {
                Ok(RotationRow {
                    id: row.get(0)?,
                    credential_name: row.get(1)?,
                    rotated_fields: row.get(2)?,
                    old_key_id: row.get(3)?,
                    new_key_id: row.get(4)?,
                    plugin_name: row.get(5)?,
                    rotated_at: row.get(6)?,
                    rotated_by: row.get(7)?,
                    metadata: row.get(8)?,
                    grace_period_secs: row.get(9)?,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map(Some)
        })
        .await
        .map_err(map_tr_err)
}

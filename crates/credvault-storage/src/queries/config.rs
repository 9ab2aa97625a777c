// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key/value rows in the `config` table (salt, KDF parameters).

use credvault_core::VaultError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Salt and KDF parameters as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyingMaterial {
    pub salt: Vec<u8>,
    /// `None` for vaults created before parameters were recorded.
    pub kdf_params: Option<Vec<u8>>,
    /// Whether this call wrote them.
    pub created: bool,
}

/// The stored salt and KDF parameters, `None` when the vault has no salt yet.
pub async fn load_keying(db: &Database) -> Result<Option<KeyingMaterial>, VaultError> {
    db.connection()
        .call(|conn| read_keying(conn))
        .await
        .map_err(map_tr_err)
}

fn read_keying(conn: &rusqlite::Connection) -> rusqlite::Result<Option<KeyingMaterial>> {
    let Some(salt) = conn
        .query_row("SELECT value FROM config WHERE key = 'salt'", [], |row| {
            row.get::<_, Vec<u8>>(0)
        })
        .optional()?
    else {
        return Ok(None);
    };
    let kdf_params = conn
        .query_row(
            "SELECT value FROM config WHERE key = 'kdf_params'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(Some(KeyingMaterial {
        salt,
        kdf_params,
        created: false,
    }))
}

/// Return the stored salt and KDF parameters, writing the given ones in the
/// same transaction when the vault has no salt yet.
pub async fn load_or_init_keying(
    db: &Database,
    salt: Vec<u8>,
    kdf_params: Vec<u8>,
) -> Result<KeyingMaterial, VaultError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let material = match read_keying(&tx)? {
                Some(stored) => stored,
                None => {
                    tx.execute(
                        "INSERT INTO config (key, value) VALUES ('salt', ?1)",
                        params![salt],
                    )?;
                    tx.execute(
                        "INSERT OR REPLACE INTO config (key, value) VALUES ('kdf_params', ?1)",
                        params![kdf_params],
                    )?;
                    KeyingMaterial {
                        salt,
                        kdf_params: Some(kdf_params),
                        created: true,
                    }
                }
            };
            tx.commit()?;
            Ok(material)
        })
        .await
        .map_err(map_tr_err)
}

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the credvault tables.
//!
//! Rows carry sealed blobs and unix-second timestamps exactly as stored;
//! sealing and time conversion happen in the vault crate.

use rusqlite::ToSql;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};

/// The `public_key` column.
///
/// Current writes store clear text. Rows written by older releases'
/// flexible path hold a sealed blob instead, which the reader must open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredPublic {
    Clear(String),
    Sealed(Vec<u8>),
}

impl FromSql for StoredPublic {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec())
                .map(StoredPublic::Clear)
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            ValueRef::Blob(bytes) => Ok(StoredPublic::Sealed(bytes.to_vec())),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

impl ToSql for StoredPublic {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            StoredPublic::Clear(text) => ToSqlOutput::from(text.as_str()),
            StoredPublic::Sealed(blob) => ToSqlOutput::from(blob.as_slice()),
        })
    }
}

/// A full `credentials` row.
#[derive(Debug, Clone)]
pub struct CredentialRow {
    pub id: String,
    pub name: String,
    /// Sealed secret; empty when the credential has no secret.
    pub api_key: Vec<u8>,
    pub api_type: Option<String>,
    pub metadata: Option<String>,
    pub environment: Option<String>,
    pub public_key: Option<StoredPublic>,
    pub url: Option<String>,
    /// JSON object of string pairs.
    pub config: Option<String>,
    pub key_id: Option<String>,
    pub last_rotated: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Listing columns only; never selects the secret blob itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub name: String,
    pub api_type: Option<String>,
    pub environment: Option<String>,
    pub has_secret: bool,
    pub has_public: bool,
    pub last_rotated: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Metadata columns touched by an update. `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct MetadataUpdate {
    pub api_type: Option<String>,
    pub environment: Option<String>,
    pub config: Option<String>,
    pub metadata: Option<String>,
    pub updated_at: i64,
}

/// A `rotations` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationRow {
    pub id: String,
    pub credential_name: String,
    /// JSON array of field names.
    pub rotated_fields: String,
    pub old_key_id: Option<String>,
    pub new_key_id: Option<String>,
    pub plugin_name: String,
    pub rotated_at: i64,
    pub rotated_by: String,
    /// JSON object of string pairs.
    pub metadata: Option<String>,
    pub grace_period_secs: Option<i64>,
}

/// Everything one rotation writes.
///
/// `None` value columns keep their current contents. The record's
/// `old_key_id` is filled in from the credential inside the transaction.
#[derive(Debug, Clone)]
pub struct RotationWrite {
    pub api_key: Option<Vec<u8>>,
    pub public_key: Option<String>,
    pub url: Option<String>,
    pub key_id: Option<String>,
    pub record: RotationRow,
}

/// Outcome of [`crate::queries::rotations::apply_rotation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationApplied {
    NotFound,
    Applied { old_key_id: Option<String> },
}

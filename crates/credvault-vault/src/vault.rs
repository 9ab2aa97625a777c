// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault lifecycle and credential operations.
//!
//! Two encryption layers: SQLCipher encrypts the whole file with the master
//! password, and secret values are additionally sealed with AES-256-GCM under
//! an Argon2id key derived from the same password and the vault's salt.
//! Public values, URLs and extra config are stored in clear inside the
//! encrypted file.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use credvault_config::VaultConfig;
use credvault_core::{
    Credential, CredentialSummary, CredentialUpdate, NewCredential, RotatedBy, RotatedField,
    RotationOutcome, RotationRecord, VaultError,
};
use credvault_storage::queries::{config, credentials, rotations};
use credvault_storage::{
    CredentialRow, Database, MetadataUpdate, RotationApplied, RotationRow, RotationWrite,
    StoredPublic, SummaryRow,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::{debug, info};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto;
use crate::kdf::{self, KdfParams};

/// An open vault, holding the derived field key in memory.
///
/// Reads (`get`, `list`, `history`) share a lock; writes (`add`, `update`,
/// `delete`, `rotate`) take it exclusively. `Debug` omits the key.
pub struct Vault {
    key: Zeroizing<[u8; 32]>,
    db: Database,
    lock: RwLock<()>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("path", &self.db.path())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl Vault {
    /// Whether a vault file exists at `path`.
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Open the vault at `path`, creating it on first use.
    ///
    /// A new vault gets a fresh salt and records the KDF parameters from
    /// `config`; an existing one unlocks with the parameters it recorded.
    /// A wrong password fails with `DecryptFailure` before any credential is
    /// readable; a migration failure aborts the open.
    pub async fn open(
        path: &Path,
        password: &SecretString,
        config: &VaultConfig,
    ) -> Result<Self, VaultError> {
        if password.expose_secret().is_empty() {
            return Err(VaultError::InvalidInput(
                "master password must not be empty".to_string(),
            ));
        }

        let fresh_params = KdfParams::from(config);
        if !Self::exists(path) {
            fresh_params.to_argon2()?;
        }

        let db = Database::open(path, password).await?;
        let report = db.migrate().await?;

        let material = match config::load_keying(&db).await? {
            Some(stored) => stored,
            None => {
                // Stored parameters are permanent; never record ones that cannot derive.
                fresh_params.to_argon2()?;
                config::load_or_init_keying(
                    &db,
                    kdf::generate_salt()?.to_vec(),
                    fresh_params.to_json()?,
                )
                .await?
            }
        };
        let salt = kdf::parse_salt(&material.salt)?;
        let params = match &material.kdf_params {
            Some(bytes) => KdfParams::from_json(bytes)?,
            None => KdfParams::LEGACY,
        };

        let password = password.clone();
        let key = tokio::task::spawn_blocking(move || {
            kdf::derive_key(password.expose_secret().as_bytes(), &salt, &params)
        })
        .await
        .map_err(|e| VaultError::Internal(format!("key derivation task failed: {e}")))??;

        if material.created {
            info!(path = %path.display(), "vault created");
        }
        info!(
            path = %path.display(),
            schema_version = report.current_version,
            migrated = report.applied.len(),
            "vault opened"
        );

        Ok(Self {
            key,
            db,
            lock: RwLock::new(()),
        })
    }

    /// Zero the field key, then close the database.
    pub async fn close(self) -> Result<(), VaultError> {
        let Vault { mut key, db, .. } = self;
        key.zeroize();
        drop(key);
        db.close().await?;
        debug!("vault closed");
        Ok(())
    }

    /// The underlying database, for maintenance and diagnostics.
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }

    /// Store a new credential.
    pub async fn add(&self, new: NewCredential) -> Result<Credential, VaultError> {
        new.validate()?;
        let _guard = self.lock.write().await;

        let now = Utc::now();
        let row = CredentialRow {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name.clone(),
            api_key: self.seal_secret(new.secret_value.as_ref())?,
            api_type: Some(new.provider_type.clone()),
            metadata: non_empty(new.notes.clone()),
            environment: non_empty(new.environment.clone()),
            public_key: non_empty(new.public_value.clone()).map(StoredPublic::Clear),
            url: non_empty(new.endpoint_url.clone()),
            config: encode_map(&new.extra_config)?,
            key_id: non_empty(new.provider_key_id.clone()),
            last_rotated: None,
            created_at: now.timestamp(),
            updated_at: now.timestamp(),
        };
        credentials::insert_credential(&self.db, &row).await?;
        debug!(name = %row.name, provider_type = %new.provider_type, "credential added");

        Ok(Credential {
            id: row.id,
            name: new.name,
            provider_type: new.provider_type,
            environment: row.environment,
            secret_value: new
                .secret_value
                .filter(|s| !s.expose_secret().is_empty()),
            public_value: row.public_key.and_then(|p| match p {
                StoredPublic::Clear(s) => Some(s),
                StoredPublic::Sealed(_) => None,
            }),
            endpoint_url: row.url,
            extra_config: new.extra_config,
            provider_key_id: row.key_id,
            notes: row.metadata,
            last_rotated_at: None,
            created_at: to_time(row.created_at),
            updated_at: to_time(row.updated_at),
        })
    }

    /// Fetch a credential with its secret opened.
    pub async fn get(&self, name: &str) -> Result<Credential, VaultError> {
        let _guard = self.lock.read().await;
        self.load(name).await
    }

    /// Non-secret metadata for every credential, ordered by name.
    pub async fn list(&self) -> Result<Vec<CredentialSummary>, VaultError> {
        let _guard = self.lock.read().await;
        let rows = credentials::list_credentials(&self.db).await?;
        Ok(rows.into_iter().map(summary_from_row).collect())
    }

    /// Change metadata fields. Values change only through [`Vault::rotate`].
    pub async fn update(
        &self,
        name: &str,
        update: CredentialUpdate,
    ) -> Result<Credential, VaultError> {
        if update.is_empty() {
            return Err(VaultError::InvalidInput(format!(
                "nothing to update for credential `{name}`"
            )));
        }
        let _guard = self.lock.write().await;

        let row_update = MetadataUpdate {
            api_type: update.provider_type,
            environment: update.environment,
            config: match &update.extra_config {
                // Stored as `{}` so COALESCE still overwrites the column.
                Some(map) if map.is_empty() => Some("{}".to_string()),
                Some(map) => encode_map(map)?,
                None => None,
            },
            metadata: update.notes,
            updated_at: Utc::now().timestamp(),
        };
        if !credentials::update_metadata(&self.db, name, row_update).await? {
            return Err(not_found(name));
        }
        debug!(name, "credential updated");
        self.load(name).await
    }

    /// Remove a credential and, through the cascade, its rotation history.
    pub async fn delete(&self, name: &str) -> Result<(), VaultError> {
        let _guard = self.lock.write().await;
        if !credentials::delete_credential(&self.db, name).await? {
            return Err(not_found(name));
        }
        debug!(name, "credential deleted");
        Ok(())
    }

    /// Single-secret add for callers of the legacy one-key model.
    pub async fn store_secret(
        &self,
        name: &str,
        api_key: &SecretString,
        api_type: &str,
    ) -> Result<(), VaultError> {
        let mut new = NewCredential::new(name, api_type);
        new.secret_value = Some(api_key.clone());
        self.add(new).await.map(|_| ())
    }

    /// Single-secret fetch. Fails with `InvalidInput` when the credential only
    /// holds a public value.
    pub async fn retrieve_secret(&self, name: &str) -> Result<SecretString, VaultError> {
        self.get(name).await?.secret_value.ok_or_else(|| {
            VaultError::InvalidInput(format!("credential `{name}` has no secret value"))
        })
    }

    /// Apply a rotation outcome and append its audit record atomically.
    ///
    /// Only the fields present in `outcome` change. The recorded
    /// `rotated_fields` comes from the outcome itself, never from the caller.
    pub async fn rotate(
        &self,
        name: &str,
        outcome: &RotationOutcome,
        plugin_name: &str,
        actor: &RotatedBy,
    ) -> Result<RotationRecord, VaultError> {
        let fields = outcome.rotated_fields();
        if fields.is_empty() {
            return Err(VaultError::InvalidInput(format!(
                "rotation of `{name}` changes no field"
            )));
        }
        if plugin_name.trim().is_empty() {
            return Err(VaultError::InvalidInput(
                "plugin name is required".to_string(),
            ));
        }

        let _guard = self.lock.write().await;

        let api_key = if fields.contains(&RotatedField::Secret) {
            Some(self.seal_secret(outcome.new_secret.as_ref())?)
        } else {
            None
        };
        let new_key_id = non_empty(outcome.key_id.clone());
        let rotated_at = Utc::now();
        let record = RotationRow {
            id: uuid::Uuid::new_v4().to_string(),
            credential_name: name.to_string(),
            rotated_fields: serde_json::to_string(&fields)
                .map_err(|e| VaultError::Internal(format!("failed to encode fields: {e}")))?,
            old_key_id: None,
            new_key_id: new_key_id.clone(),
            plugin_name: plugin_name.to_string(),
            rotated_at: rotated_at.timestamp(),
            rotated_by: actor.to_string(),
            metadata: encode_map(&outcome.metadata)?,
            grace_period_secs: outcome
                .grace_period
                .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX)),
        };
        let write = RotationWrite {
            api_key,
            public_key: non_empty(outcome.new_public.clone()),
            url: non_empty(outcome.new_url.clone()),
            key_id: new_key_id.clone(),
            record: record.clone(),
        };

        let old_key_id = match rotations::apply_rotation(&self.db, name, write).await? {
            RotationApplied::NotFound => return Err(not_found(name)),
            RotationApplied::Applied { old_key_id } => old_key_id,
        };
        info!(name, plugin = plugin_name, actor = %actor, fields = ?fields, "credential rotated");

        Ok(RotationRecord {
            id: record.id,
            credential_name: record.credential_name,
            rotated_fields: fields,
            old_key_id,
            new_key_id,
            plugin_name: record.plugin_name,
            rotated_by: actor.clone(),
            rotated_at: to_time(record.rotated_at),
            grace_period: outcome.grace_period,
            metadata: outcome.metadata.clone(),
        })
    }

    /// Rotation records, most recent first, at most `limit`.
    pub async fn history(&self, name: &str, limit: u32) -> Result<Vec<RotationRecord>, VaultError> {
        if limit == 0 {
            return Err(VaultError::InvalidInput(
                "history limit must be at least 1".to_string(),
            ));
        }
        let _guard = self.lock.read().await;
        let rows = rotations::rotation_history(&self.db, name, limit)
            .await?
            .ok_or_else(|| not_found(name))?;
        rows.into_iter().map(record_from_row).collect()
    }

    async fn load(&self, name: &str) -> Result<Credential, VaultError> {
        let row = credentials::get_credential(&self.db, name)
            .await?
            .ok_or_else(|| not_found(name))?;

        let secret_value = if row.api_key.is_empty() {
            None
        } else {
            Some(self.open_text(&row.api_key)?)
        };
        let public_value = match row.public_key {
            Some(StoredPublic::Clear(text)) => non_empty(Some(text)),
            Some(StoredPublic::Sealed(blob)) if !blob.is_empty() => {
                Some(self.open_text(&blob)?.expose_secret().to_string())
            }
            _ => None,
        };
        let extra_config = match row.config.as_deref() {
            Some(json) => decode_map(json).map_err(|_| {
                VaultError::Internal(format!("credential `{name}` has malformed config"))
            })?,
            None => BTreeMap::new(),
        };

        Ok(Credential {
            id: row.id,
            name: row.name,
            provider_type: row.api_type.unwrap_or_default(),
            environment: non_empty(row.environment),
            secret_value,
            public_value,
            endpoint_url: non_empty(row.url),
            extra_config,
            provider_key_id: non_empty(row.key_id),
            notes: non_empty(row.metadata),
            last_rotated_at: row.last_rotated.map(to_time),
            created_at: to_time(row.created_at),
            updated_at: to_time(row.updated_at),
        })
    }

    fn seal_secret(&self, secret: Option<&SecretString>) -> Result<Vec<u8>, VaultError> {
        match secret {
            Some(s) if !s.expose_secret().is_empty() => {
                crypto::seal(&self.key, s.expose_secret().as_bytes())
            }
            // Empty blob satisfies NOT NULL for public-only credentials.
            _ => Ok(Vec::new()),
        }
    }

    fn open_text(&self, blob: &[u8]) -> Result<SecretString, VaultError> {
        let mut plain = crypto::open(&self.key, blob)?;
        let text = String::from_utf8(std::mem::take(&mut *plain))
            .map_err(|_| VaultError::DecryptFailure)?;
        Ok(SecretString::from(text))
    }
}

fn not_found(name: &str) -> VaultError {
    VaultError::NotFound {
        name: name.to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn to_time(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn encode_map(map: &BTreeMap<String, String>) -> Result<Option<String>, VaultError> {
    if map.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(map)
        .map(Some)
        .map_err(|e| VaultError::Internal(format!("failed to encode map: {e}")))
}

fn decode_map(json: &str) -> Result<BTreeMap<String, String>, serde_json::Error> {
    serde_json::from_str(json)
}

fn summary_from_row(row: SummaryRow) -> CredentialSummary {
    CredentialSummary {
        name: row.name,
        provider_type: row.api_type.unwrap_or_default(),
        environment: non_empty(row.environment),
        has_secret: row.has_secret,
        has_public: row.has_public,
        last_rotated_at: row.last_rotated.map(to_time),
        created_at: to_time(row.created_at),
        updated_at: to_time(row.updated_at),
    }
}

fn record_from_row(row: RotationRow) -> Result<RotationRecord, VaultError> {
    let malformed = |what: &str| {
        VaultError::Internal(format!(
            "rotation record `{}` has malformed {what}",
            row.id
        ))
    };
    // Older writers stored `null` for an empty field list.
    let rotated_fields: Vec<RotatedField> =
        serde_json::from_str::<Option<Vec<RotatedField>>>(&row.rotated_fields)
            .map_err(|_| malformed("fields"))?
            .unwrap_or_default();
    let metadata = match row.metadata.as_deref() {
        Some(json) => decode_map(json).map_err(|_| malformed("metadata"))?,
        None => BTreeMap::new(),
    };
    let rotated_by = row
        .rotated_by
        .parse::<RotatedBy>()
        .unwrap_or_else(|never| match never {});

    Ok(RotationRecord {
        id: row.id,
        credential_name: row.credential_name,
        rotated_fields,
        old_key_id: non_empty(row.old_key_id),
        new_key_id: non_empty(row.new_key_id),
        plugin_name: row.plugin_name,
        rotated_by,
        rotated_at: to_time(row.rotated_at),
        grace_period: row
            .grace_period_secs
            .and_then(|s| u64::try_from(s).ok())
            .map(Duration::from_secs),
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn fast_config() -> VaultConfig {
        VaultConfig {
            kdf_memory_cost: 1024,
            kdf_iterations: 1,
            kdf_parallelism: 1,
            ..VaultConfig::default()
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn secret_values_never_reach_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let password = SecretString::from("log-test-password".to_string());
        let vault = Vault::open(&dir.path().join("vault.db"), &password, &fast_config())
            .await
            .unwrap();

        vault
            .add(NewCredential::new("svc-a", "openai").with_secret("sk-first-secret-value"))
            .await
            .unwrap();
        let outcome = RotationOutcome {
            new_secret: Some(SecretString::from("sk-second-secret-value".to_string())),
            key_id: Some("key-2".into()),
            ..RotationOutcome::default()
        };
        vault
            .rotate("svc-a", &outcome, "manual", &RotatedBy::Cli)
            .await
            .unwrap();
        let _ = vault.get("svc-a").await.unwrap();
        assert!(format!("{vault:?}").contains("[REDACTED]"));
        vault.close().await.unwrap();

        assert!(logs_contain("credential rotated"));
        assert!(!logs_contain("sk-first-secret-value"));
        assert!(!logs_contain("sk-second-secret-value"));
        assert!(!logs_contain("log-test-password"));
    }

    #[test]
    fn maps_encode_empty_as_null() {
        assert_eq!(encode_map(&BTreeMap::new()).unwrap(), None);
        let map: BTreeMap<_, _> = [("k".to_string(), "v".to_string())].into();
        let json = encode_map(&map).unwrap().unwrap();
        assert_eq!(decode_map(&json).unwrap(), map);
    }

    #[test]
    fn record_rows_decode() {
        let row = RotationRow {
            id: "r1".into(),
            credential_name: "svc-a".into(),
            rotated_fields: r#"["secret_key","url"]"#.into(),
            old_key_id: Some(String::new()),
            new_key_id: Some("k2".into()),
            plugin_name: "openai".into(),
            rotated_at: 1_700_000_000,
            rotated_by: "scheduled".into(),
            metadata: Some(r#"{"service_account":"sa_1"}"#.into()),
            grace_period_secs: Some(300),
        };
        let record = record_from_row(row).unwrap();
        assert_eq!(record.rotated_fields, vec![RotatedField::Secret, RotatedField::Url]);
        assert_eq!(record.old_key_id, None);
        assert_eq!(record.rotated_by, RotatedBy::Scheduled);
        assert_eq!(record.grace_period, Some(Duration::from_secs(300)));
        assert_eq!(record.metadata.get("service_account").map(String::as_str), Some("sa_1"));
    }

    #[test]
    fn null_field_list_decodes_as_empty() {
        let row = RotationRow {
            id: "r0".into(),
            credential_name: "svc-a".into(),
            rotated_fields: "null".into(),
            old_key_id: None,
            new_key_id: None,
            plugin_name: "manual".into(),
            rotated_at: 1_600_000_000,
            rotated_by: "cli".into(),
            metadata: None,
            grace_period_secs: None,
        };
        let record = record_from_row(row).unwrap();
        assert!(record.rotated_fields.is_empty());

        let broken = RotationRow {
            id: "r1".into(),
            credential_name: "svc-a".into(),
            rotated_fields: "{not json".into(),
            old_key_id: None,
            new_key_id: None,
            plugin_name: "manual".into(),
            rotated_at: 1_600_000_000,
            rotated_by: "cli".into(),
            metadata: None,
            grace_period_secs: None,
        };
        assert!(matches!(record_from_row(broken), Err(VaultError::Internal(_))));
    }
}

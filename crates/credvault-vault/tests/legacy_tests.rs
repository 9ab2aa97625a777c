// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vaults written by the earlier single-binary tool: no migration history,
//! no recorded KDF parameters, and sealed public values.

use std::path::Path;

use credvault_config::VaultConfig;
use credvault_core::{NewCredential, VaultError};
use credvault_vault::kdf::{self, KdfParams};
use credvault_vault::{Vault, crypto};
use rusqlite::{Connection, params};
use secrecy::{ExposeSecret, SecretString};

const PASSWORD: &str = "legacy-password";
const SALT: [u8; kdf::SALT_LEN] = [0x5a; kdf::SALT_LEN];

fn legacy_key() -> [u8; 32] {
    *kdf::derive_key(PASSWORD.as_bytes(), &SALT, &KdfParams::LEGACY).unwrap()
}

fn keyed(path: &Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    conn.pragma_update(None, "key", PASSWORD).unwrap();
    conn
}

/// The single-secret layout only.
fn write_v1_vault(path: &Path) {
    let conn = keyed(path);
    conn.execute_batch(
        "CREATE TABLE config (key TEXT PRIMARY KEY, value BLOB NOT NULL);
         CREATE TABLE credentials (
             id TEXT PRIMARY KEY, name TEXT UNIQUE NOT NULL, api_key BLOB NOT NULL,
             api_type TEXT, metadata TEXT,
             created_at INTEGER NOT NULL, updated_at INTEGER NOT NULL);",
    )
    .unwrap();
    conn.execute(
        "INSERT INTO config (key, value) VALUES ('salt', ?1)",
        params![SALT.to_vec()],
    )
    .unwrap();
    let blob = crypto::seal(&legacy_key(), b"sk-legacy-v1").unwrap();
    conn.execute(
        "INSERT INTO credentials (id, name, api_key, api_type, created_at, updated_at)
         VALUES ('id-1', 'openai', ?1, 'openai', 1700000000, 1700000000)",
        params![blob],
    )
    .unwrap();
}

/// The flexible layout, with the public value sealed as a blob.
fn write_v2_vault(path: &Path) {
    write_v1_vault(path);
    let conn = keyed(path);
    conn.execute_batch(
        "ALTER TABLE credentials ADD COLUMN environment TEXT;
         ALTER TABLE credentials ADD COLUMN public_key TEXT;
         ALTER TABLE credentials ADD COLUMN url TEXT;
         ALTER TABLE credentials ADD COLUMN config TEXT;
         ALTER TABLE credentials ADD COLUMN key_id TEXT;
         ALTER TABLE credentials ADD COLUMN last_rotated INTEGER;
         CREATE TABLE rotations (
             id TEXT PRIMARY KEY, credential_name TEXT NOT NULL,
             rotated_fields TEXT NOT NULL, old_key_id TEXT, new_key_id TEXT,
             plugin_name TEXT NOT NULL, rotated_at INTEGER NOT NULL,
             rotated_by TEXT NOT NULL, metadata TEXT,
             FOREIGN KEY (credential_name) REFERENCES credentials(name) ON DELETE CASCADE);",
    )
    .unwrap();
    let key = legacy_key();
    let secret = crypto::seal(&key, b"service-role").unwrap();
    let public = crypto::seal(&key, b"anon-public").unwrap();
    conn.execute(
        "INSERT INTO credentials
             (id, name, api_key, api_type, environment, public_key, url, config, key_id,
              created_at, updated_at)
         VALUES ('id-2', 'supabase-prod', ?1, 'supabase', 'prod', ?2,
                 'https://abc.supabase.co', '{\"project_ref\":\"abc\"}', 'k-1',
                 1700000000, 1700000000)",
        params![secret, public],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO rotations
             (id, credential_name, rotated_fields, new_key_id, plugin_name, rotated_at, rotated_by)
         VALUES ('r-0', 'supabase-prod', '[\"secret_key\"]', 'k-1', 'supabase', 1700000100, 'cli')",
        [],
    )
    .unwrap();
}

fn config() -> VaultConfig {
    VaultConfig {
        kdf_memory_cost: 1024,
        kdf_iterations: 1,
        kdf_parallelism: 1,
        ..VaultConfig::default()
    }
}

fn password() -> SecretString {
    SecretString::from(PASSWORD.to_string())
}

#[tokio::test]
async fn v1_vault_opens_and_converges() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    write_v1_vault(&path);

    let vault = Vault::open(&path, &password(), &config()).await.unwrap();
    assert_eq!(
        vault.retrieve_secret("openai").await.unwrap().expose_secret(),
        "sk-legacy-v1"
    );

    // The flexible model now works on the migrated file.
    vault
        .add(NewCredential::new("stripe", "stripe").with_public("pk_live"))
        .await
        .unwrap();
    let names: Vec<_> = vault.list().await.unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["openai", "stripe"]);
    assert!(vault.history("openai", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn v2_vault_reads_sealed_public_values_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    write_v2_vault(&path);

    let vault = Vault::open(&path, &password(), &config()).await.unwrap();
    let cred = vault.get("supabase-prod").await.unwrap();
    assert_eq!(cred.secret_value.unwrap().expose_secret(), "service-role");
    assert_eq!(cred.public_value.as_deref(), Some("anon-public"));
    assert_eq!(cred.environment.as_deref(), Some("prod"));
    assert_eq!(cred.provider_key_id.as_deref(), Some("k-1"));
    assert_eq!(cred.extra_config.get("project_ref").map(String::as_str), Some("abc"));

    let history = vault.history("supabase-prod", 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].grace_period, None);
}

#[tokio::test]
async fn legacy_vault_keeps_legacy_kdf_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    write_v1_vault(&path);

    let vault = Vault::open(&path, &password(), &config()).await.unwrap();
    vault.close().await.unwrap();
    let vault = Vault::open(&path, &password(), &config()).await.unwrap();
    assert_eq!(
        vault.retrieve_secret("openai").await.unwrap().expose_secret(),
        "sk-legacy-v1"
    );
}

#[tokio::test]
async fn malformed_salt_refuses_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    write_v1_vault(&path);
    keyed(&path)
        .execute("UPDATE config SET value = x'0102' WHERE key = 'salt'", [])
        .unwrap();

    let err = Vault::open(&path, &password(), &config()).await.unwrap_err();
    assert!(matches!(err, VaultError::DecryptFailure));
}

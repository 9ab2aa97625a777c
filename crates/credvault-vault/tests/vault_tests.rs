// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for vault operations against a real encrypted file.

use std::sync::Arc;
use std::time::Duration;

use credvault_config::VaultConfig;
use credvault_core::{
    CredentialUpdate, NewCredential, RotatedBy, RotatedField, RotationOutcome, VaultError,
};
use credvault_storage::Database;
use credvault_storage::queries::config;
use credvault_vault::Vault;
use secrecy::{ExposeSecret, SecretString};
use tempfile::TempDir;

fn fast_config() -> VaultConfig {
    VaultConfig {
        kdf_memory_cost: 1024,
        kdf_iterations: 1,
        kdf_parallelism: 1,
        ..VaultConfig::default()
    }
}

fn password(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

async fn open_vault() -> (Vault, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let vault = Vault::open(&dir.path().join("vault.db"), &password("pw"), &fast_config())
        .await
        .unwrap();
    (vault, dir)
}

fn new_secret(value: &str) -> RotationOutcome {
    RotationOutcome {
        new_secret: Some(password(value)),
        ..RotationOutcome::default()
    }
}

#[tokio::test]
async fn add_then_get_returns_every_field() {
    let (vault, _dir) = open_vault().await;
    let created = vault
        .add(
            NewCredential::new("supabase-prod", "supabase")
                .with_secret("service-role-key")
                .with_public("anon-key")
                .with_url("https://abc.supabase.co")
                .with_environment("prod")
                .with_config("project_ref", "abc"),
        )
        .await
        .unwrap();
    assert_eq!(created.last_rotated_at, None);

    let fetched = vault.get("supabase-prod").await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.provider_type, "supabase");
    assert_eq!(fetched.environment.as_deref(), Some("prod"));
    assert_eq!(
        fetched.secret_value.as_ref().map(|s| s.expose_secret().to_string()),
        Some("service-role-key".to_string())
    );
    assert_eq!(fetched.public_value.as_deref(), Some("anon-key"));
    assert_eq!(fetched.endpoint_url.as_deref(), Some("https://abc.supabase.co"));
    assert_eq!(
        fetched.extra_config.get("project_ref").map(String::as_str),
        Some("abc")
    );
}

#[tokio::test]
async fn public_only_credential_has_no_secret() {
    let (vault, _dir) = open_vault().await;
    vault
        .add(NewCredential::new("stripe-pk", "stripe").with_public("pk_live_123"))
        .await
        .unwrap();

    let fetched = vault.get("stripe-pk").await.unwrap();
    assert!(fetched.secret_value.is_none());
    assert!(fetched.has_public());

    let err = vault.retrieve_secret("stripe-pk").await.unwrap_err();
    assert!(matches!(err, VaultError::InvalidInput(_)));
}

#[tokio::test]
async fn add_rejects_invalid_input() {
    let (vault, _dir) = open_vault().await;
    let err = vault.add(NewCredential::new("  ", "openai").with_secret("x")).await;
    assert!(matches!(err, Err(VaultError::InvalidInput(_))));
    let err = vault.add(NewCredential::new("empty", "openai")).await;
    assert!(matches!(err, Err(VaultError::InvalidInput(_))));
}

#[tokio::test]
async fn duplicate_add_leaves_original_intact() {
    let (vault, _dir) = open_vault().await;
    vault
        .add(NewCredential::new("svc-a", "openai").with_secret("original"))
        .await
        .unwrap();

    let err = vault
        .add(NewCredential::new("svc-a", "openai").with_secret("replacement"))
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::Duplicate { ref name } if name == "svc-a"));
    assert_eq!(
        vault.retrieve_secret("svc-a").await.unwrap().expose_secret(),
        "original"
    );
}

#[tokio::test]
async fn legacy_secret_api_roundtrips() {
    let (vault, _dir) = open_vault().await;
    vault
        .store_secret("openai", &password("sk-abc"), "openai")
        .await
        .unwrap();
    assert_eq!(
        vault.retrieve_secret("openai").await.unwrap().expose_secret(),
        "sk-abc"
    );
    let err = vault.retrieve_secret("missing").await.unwrap_err();
    assert!(matches!(err, VaultError::NotFound { .. }));
}

#[tokio::test]
async fn list_is_sorted_and_carries_no_values() {
    let (vault, _dir) = open_vault().await;
    for name in ["zeta", "alpha", "mid"] {
        vault
            .add(NewCredential::new(name, "local").with_secret("value"))
            .await
            .unwrap();
    }
    let names: Vec<_> = vault
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}

#[tokio::test]
async fn delete_twice_is_not_found() {
    let (vault, _dir) = open_vault().await;
    vault
        .add(NewCredential::new("svc-a", "local").with_secret("v"))
        .await
        .unwrap();
    vault.delete("svc-a").await.unwrap();

    let err = vault.delete("svc-a").await.unwrap_err();
    assert!(matches!(err, VaultError::NotFound { ref name } if name == "svc-a"));
    assert!(matches!(
        vault.get("svc-a").await,
        Err(VaultError::NotFound { .. })
    ));
}

#[tokio::test]
async fn update_changes_metadata_only() {
    let (vault, _dir) = open_vault().await;
    vault
        .add(
            NewCredential::new("svc-a", "local")
                .with_secret("keep-me")
                .with_config("a", "1"),
        )
        .await
        .unwrap();

    let updated = vault
        .update(
            "svc-a",
            CredentialUpdate {
                environment: Some("staging".into()),
                notes: Some("owned by payments".into()),
                ..CredentialUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.environment.as_deref(), Some("staging"));
    assert_eq!(updated.notes.as_deref(), Some("owned by payments"));
    assert_eq!(updated.extra_config.get("a").map(String::as_str), Some("1"));
    assert_eq!(
        updated.secret_value.unwrap().expose_secret(),
        "keep-me"
    );
    assert!(vault.history("svc-a", 10).await.unwrap().is_empty());

    let cleared = vault
        .update(
            "svc-a",
            CredentialUpdate {
                extra_config: Some(Default::default()),
                ..CredentialUpdate::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.extra_config.is_empty());

    assert!(matches!(
        vault.update("svc-a", CredentialUpdate::default()).await,
        Err(VaultError::InvalidInput(_))
    ));
    assert!(matches!(
        vault
            .update(
                "ghost",
                CredentialUpdate {
                    notes: Some("x".into()),
                    ..CredentialUpdate::default()
                }
            )
            .await,
        Err(VaultError::NotFound { .. })
    ));
}

#[tokio::test]
async fn rotation_records_exactly_the_changed_fields() {
    let (vault, _dir) = open_vault().await;
    vault
        .add(
            NewCredential::new("svc-a", "supabase")
                .with_secret("old-secret")
                .with_public("anon")
                .with_url("https://old.example"),
        )
        .await
        .unwrap();

    let mut outcome = new_secret("new-secret");
    outcome.key_id = Some("key-2".into());
    outcome.grace_period = Some(Duration::from_secs(3600));
    outcome.metadata.insert("reason".into(), "scheduled".into());
    let record = vault
        .rotate("svc-a", &outcome, "supabase", &RotatedBy::Scheduled)
        .await
        .unwrap();

    assert_eq!(record.rotated_fields, vec![RotatedField::Secret]);
    assert_eq!(record.new_key_id.as_deref(), Some("key-2"));
    assert_eq!(record.old_key_id, None);

    let fetched = vault.get("svc-a").await.unwrap();
    assert_eq!(fetched.secret_value.unwrap().expose_secret(), "new-secret");
    assert_eq!(fetched.public_value.as_deref(), Some("anon"));
    assert_eq!(fetched.endpoint_url.as_deref(), Some("https://old.example"));
    assert_eq!(fetched.provider_key_id.as_deref(), Some("key-2"));
    assert_eq!(fetched.last_rotated_at, Some(record.rotated_at));

    let history = vault.history("svc-a", 10).await.unwrap();
    assert_eq!(history, vec![record]);
}

#[tokio::test]
async fn second_rotation_remembers_previous_key_id() {
    let (vault, _dir) = open_vault().await;
    vault
        .add(NewCredential::new("svc-a", "openai").with_secret("v0"))
        .await
        .unwrap();
    for (value, key_id) in [("v1", "k1"), ("v2", "k2")] {
        let mut outcome = new_secret(value);
        outcome.key_id = Some(key_id.into());
        vault
            .rotate("svc-a", &outcome, "openai", &RotatedBy::Agent)
            .await
            .unwrap();
    }

    let history = vault.history("svc-a", 1).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_key_id.as_deref(), Some("k1"));
    assert_eq!(history[0].new_key_id.as_deref(), Some("k2"));
    assert_eq!(vault.history("svc-a", 10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn empty_rotation_is_rejected() {
    let (vault, _dir) = open_vault().await;
    vault
        .add(NewCredential::new("svc-a", "local").with_secret("v0"))
        .await
        .unwrap();
    let err = vault
        .rotate("svc-a", &RotationOutcome::default(), "local", &RotatedBy::Cli)
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::InvalidInput(_)));
    assert!(vault.history("svc-a", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn rotating_missing_credential_is_not_found() {
    let (vault, _dir) = open_vault().await;
    let err = vault
        .rotate("ghost", &new_secret("x"), "local", &RotatedBy::Cli)
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::NotFound { ref name } if name == "ghost"));
}

#[tokio::test]
async fn failed_audit_write_keeps_old_values() {
    let (vault, _dir) = open_vault().await;
    vault
        .add(NewCredential::new("svc-a", "local").with_secret("before"))
        .await
        .unwrap();
    vault
        .database()
        .connection()
        .call(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER fail_audit BEFORE INSERT ON rotations
                 BEGIN SELECT RAISE(ABORT, 'injected fault'); END;",
            )
        })
        .await
        .unwrap();

    let err = vault
        .rotate("svc-a", &new_secret("after"), "local", &RotatedBy::Cli)
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::Store { .. }));

    let fetched = vault.get("svc-a").await.unwrap();
    assert_eq!(fetched.secret_value.unwrap().expose_secret(), "before");
    assert_eq!(fetched.last_rotated_at, None);
}

#[tokio::test]
async fn history_validates_limit_and_name() {
    let (vault, _dir) = open_vault().await;
    vault
        .add(NewCredential::new("svc-a", "local").with_secret("v"))
        .await
        .unwrap();
    assert!(matches!(
        vault.history("svc-a", 0).await,
        Err(VaultError::InvalidInput(_))
    ));
    assert!(matches!(
        vault.history("ghost", 5).await,
        Err(VaultError::NotFound { .. })
    ));
}

#[tokio::test]
async fn delete_removes_history() {
    let (vault, _dir) = open_vault().await;
    vault
        .add(NewCredential::new("svc-a", "local").with_secret("v"))
        .await
        .unwrap();
    vault
        .rotate("svc-a", &new_secret("v2"), "local", &RotatedBy::Cli)
        .await
        .unwrap();
    vault.delete("svc-a").await.unwrap();
    vault
        .add(NewCredential::new("svc-a", "local").with_secret("fresh"))
        .await
        .unwrap();
    assert!(vault.history("svc-a", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn reopen_with_same_password_reads_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let vault = Vault::open(&path, &password("pw"), &fast_config())
        .await
        .unwrap();
    vault
        .add(NewCredential::new("svc-a", "local").with_secret("persisted"))
        .await
        .unwrap();
    vault.close().await.unwrap();
    assert!(Vault::exists(&path));

    // Different KDF settings must not matter once the vault exists.
    let changed = VaultConfig {
        kdf_iterations: 2,
        ..fast_config()
    };
    let vault = Vault::open(&path, &password("pw"), &changed).await.unwrap();
    assert_eq!(
        vault.retrieve_secret("svc-a").await.unwrap().expose_secret(),
        "persisted"
    );
}

#[tokio::test]
async fn wrong_password_is_decrypt_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let vault = Vault::open(&path, &password("right"), &fast_config())
        .await
        .unwrap();
    vault
        .add(NewCredential::new("svc-a", "local").with_secret("v"))
        .await
        .unwrap();
    vault.close().await.unwrap();

    let err = Vault::open(&path, &password("wrong"), &fast_config())
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::DecryptFailure));
    assert_eq!(err.to_string(), "decryption failed");
}

#[tokio::test]
async fn empty_password_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = Vault::open(&dir.path().join("vault.db"), &password(""), &fast_config())
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::InvalidInput(_)));
    assert!(!Vault::exists(&dir.path().join("vault.db")));
}

#[tokio::test]
async fn concurrent_rotations_each_get_a_record() {
    let (vault, _dir) = open_vault().await;
    let vault = Arc::new(vault);
    vault
        .add(NewCredential::new("svc-a", "local").with_secret("v0"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let vault = Arc::clone(&vault);
        handles.push(tokio::spawn(async move {
            vault
                .rotate("svc-a", &new_secret(&format!("v{i}")), "local", &RotatedBy::Cli)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(vault.history("svc-a", 100).await.unwrap().len(), 8);
}

#[tokio::test]
async fn create_with_invalid_kdf_params_leaves_no_vault() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let invalid = VaultConfig {
        kdf_memory_cost: 1,
        ..fast_config()
    };

    let err = Vault::open(&path, &password("pw"), &invalid)
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::InvalidInput(_)));
    assert!(!Vault::exists(&path));

    let vault = Vault::open(&path, &password("pw"), &fast_config())
        .await
        .unwrap();
    vault
        .add(NewCredential::new("svc-a", "local").with_secret("v"))
        .await
        .unwrap();
    vault.close().await.unwrap();
}

#[tokio::test]
async fn invalid_kdf_params_are_never_recorded_in_a_saltless_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.db");
    let db = Database::open(&path, &password("pw")).await.unwrap();
    db.migrate().await.unwrap();
    db.close().await.unwrap();

    let invalid = VaultConfig {
        kdf_iterations: 0,
        ..fast_config()
    };
    assert!(matches!(
        Vault::open(&path, &password("pw"), &invalid).await,
        Err(VaultError::InvalidInput(_))
    ));

    let db = Database::open(&path, &password("pw")).await.unwrap();
    assert_eq!(config::load_keying(&db).await.unwrap(), None);
    db.close().await.unwrap();

    let vault = Vault::open(&path, &password("pw"), &fast_config())
        .await
        .unwrap();
    assert!(vault.list().await.unwrap().is_empty());
    vault.close().await.unwrap();
}

#[tokio::test]
async fn tampered_secret_blob_is_decrypt_failure() {
    let (vault, _dir) = open_vault().await;
    vault
        .add(NewCredential::new("svc-a", "local").with_secret("sk-untouched"))
        .await
        .unwrap();

    vault
        .database()
        .connection()
        .call(|conn| {
            let mut blob: Vec<u8> = conn.query_row(
                "SELECT api_key FROM credentials WHERE name = 'svc-a'",
                [],
                |row| row.get(0),
            )?;
            let last = blob.len() - 1;
            blob[last] ^= 0x01;
            conn.execute(
                "UPDATE credentials SET api_key = ?1 WHERE name = 'svc-a'",
                rusqlite::params![blob],
            )?;
            Ok::<_, rusqlite::Error>(())
        })
        .await
        .unwrap();

    assert!(matches!(
        vault.get("svc-a").await,
        Err(VaultError::DecryptFailure)
    ));
    assert!(matches!(
        vault.retrieve_secret("svc-a").await,
        Err(VaultError::DecryptFailure)
    ));
    assert_eq!(vault.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_environment_and_notes_are_absent() {
    let (vault, _dir) = open_vault().await;
    let mut new = NewCredential::new("svc-a", "local").with_secret("v");
    new.environment = Some(String::new());
    new.notes = Some(String::new());
    vault.add(new).await.unwrap();

    let stored = vault.get("svc-a").await.unwrap();
    assert_eq!(stored.environment, None);
    assert_eq!(stored.notes, None);

    vault
        .update(
            "svc-a",
            CredentialUpdate {
                environment: Some("prod".into()),
                notes: Some("rotate monthly".into()),
                ..CredentialUpdate::default()
            },
        )
        .await
        .unwrap();
    let cleared = vault
        .update(
            "svc-a",
            CredentialUpdate {
                environment: Some(String::new()),
                notes: Some(String::new()),
                ..CredentialUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.environment, None);
    assert_eq!(cleared.notes, None);
    assert_eq!(vault.list().await.unwrap()[0].environment, None);
}

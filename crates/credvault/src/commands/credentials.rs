// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `init`, `add`, `get`, `list`, `delete`, `update` and `set`.

use std::collections::BTreeMap;

use credvault_config::CredvaultConfig;
use credvault_core::{CredentialUpdate, NewCredential, RotatedBy, RotationOutcome, VaultError};
use credvault_rotation::MANUAL_PLUGIN;
use credvault_vault::Vault;
use secrecy::ExposeSecret;

use super::{confirm, open_vault, read_secret};
use crate::output::{self, Field};
use crate::{AddArgs, SetArgs, UpdateArgs};

pub async fn init(config: &CredvaultConfig) -> Result<(), VaultError> {
    let path = config.vault.path_buf();
    if Vault::exists(&path) {
        return Err(VaultError::InvalidInput(format!(
            "a vault already exists at {}",
            path.display()
        )));
    }
    let password = credvault_vault::read_new_master_password()?;
    let vault = Vault::open(&path, &password, &config.vault).await?;
    vault.close().await?;
    output::success(&format!("vault created at {}", path.display()));
    Ok(())
}

pub async fn add(config: &CredvaultConfig, args: AddArgs) -> Result<(), VaultError> {
    let vault = open_vault(config).await?;
    let secret = read_secret(args.secret, args.secret_stdin, args.public.is_none())?;

    let new = NewCredential {
        name: args.name,
        provider_type: args.provider_type,
        environment: args.environment,
        secret_value: secret,
        public_value: args.public,
        endpoint_url: args.url,
        extra_config: args.config_values.into_iter().collect(),
        provider_key_id: args.key_id,
        notes: args.notes,
    };
    let created = vault.add(new).await;
    vault.close().await?;
    let created = created?;

    output::success(&output::stored_message(&created));
    Ok(())
}

pub async fn get(config: &CredvaultConfig, name: &str, field: Field) -> Result<(), VaultError> {
    let vault = open_vault(config).await?;
    let credential = vault.get(name).await;
    vault.close().await?;
    let credential = credential?;

    let missing = |what: &str| {
        VaultError::InvalidInput(format!("credential `{name}` has no {what} value"))
    };
    match field {
        Field::Secret => {
            let secret = credential.secret_value.ok_or_else(|| missing("secret"))?;
            println!("{}", secret.expose_secret());
        }
        Field::Public => println!("{}", credential.public_value.ok_or_else(|| missing("public"))?),
        Field::Url => println!("{}", credential.endpoint_url.ok_or_else(|| missing("url"))?),
        Field::All => {
            println!("name: {}", credential.name);
            println!("type: {}", credential.provider_type);
            if let Some(env) = &credential.environment {
                println!("environment: {env}");
            }
            if let Some(secret) = &credential.secret_value {
                println!("secret: {}", secret.expose_secret());
            }
            if let Some(public) = &credential.public_value {
                println!("public: {public}");
            }
            if let Some(url) = &credential.endpoint_url {
                println!("url: {url}");
            }
            if let Some(key_id) = &credential.provider_key_id {
                println!("key_id: {key_id}");
            }
            for (key, value) in &credential.extra_config {
                println!("config.{key}: {value}");
            }
            if let Some(notes) = &credential.notes {
                println!("notes: {notes}");
            }
            println!("created: {}", output::format_time(credential.created_at));
            println!("updated: {}", output::format_time(credential.updated_at));
            if let Some(at) = credential.last_rotated_at {
                println!("last rotated: {}", output::format_time(at));
            }
        }
    }
    Ok(())
}

pub async fn list(config: &CredvaultConfig, json: bool) -> Result<(), VaultError> {
    let vault = open_vault(config).await?;
    let rows = vault.list().await;
    vault.close().await?;
    let rows = rows?;

    if json {
        let text = serde_json::to_string_pretty(&rows)
            .map_err(|e| VaultError::Internal(format!("failed to encode list: {e}")))?;
        println!("{text}");
    } else {
        print!("{}", output::credentials_table(&rows));
    }
    Ok(())
}

pub async fn delete(config: &CredvaultConfig, name: &str, yes: bool) -> Result<(), VaultError> {
    if !yes && !confirm(&format!("Delete `{name}` and its rotation history?"))? {
        return Err(VaultError::InvalidInput(
            "deletion not confirmed (pass --yes to skip the prompt)".to_string(),
        ));
    }
    let vault = open_vault(config).await?;
    let result = vault.delete(name).await;
    vault.close().await?;
    result?;
    output::success(&format!("deleted `{name}`"));
    Ok(())
}

pub async fn update(config: &CredvaultConfig, args: UpdateArgs) -> Result<(), VaultError> {
    let extra_config = if args.clear_config {
        Some(BTreeMap::new())
    } else if args.config_values.is_empty() {
        None
    } else {
        Some(args.config_values.into_iter().collect())
    };
    let change = CredentialUpdate {
        provider_type: args.provider_type,
        environment: args.environment,
        extra_config,
        notes: args.notes,
    };

    let vault = open_vault(config).await?;
    let result = vault.update(&args.name, change).await;
    vault.close().await?;
    result?;
    output::success(&format!("updated `{}`", args.name));
    Ok(())
}

pub async fn set(config: &CredvaultConfig, args: SetArgs) -> Result<(), VaultError> {
    let prompt = args.public.is_none() && args.url.is_none();
    let outcome = RotationOutcome {
        new_secret: read_secret(args.secret, args.secret_stdin, prompt)?,
        new_public: args.public,
        new_url: args.url,
        key_id: args.key_id,
        ..RotationOutcome::default()
    };

    let vault = open_vault(config).await?;
    let result = vault
        .rotate(&args.name, &outcome, MANUAL_PLUGIN, &RotatedBy::Manual)
        .await;
    vault.close().await?;
    let record = result?;

    let fields: Vec<String> = record.rotated_fields.iter().map(|f| f.to_string()).collect();
    output::success(&format!("updated {} of `{}`", fields.join(", "), args.name));
    Ok(())
}

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin configuration resolution.
//!
//! Sources, lowest priority first: the `[rotation.plugins.<name>]` table,
//! then the credential's own extra config. Only keys the plugin's schema
//! declares are kept. A value `vault:<credential>` is replaced by that
//! credential's secret.

use std::collections::BTreeMap;

use credvault_core::{ConfigSchema, PluginConfig, VaultError};
use credvault_vault::Vault;
use secrecy::ExposeSecret;

/// Prefix marking a config value as a reference to another credential.
pub const VAULT_REF_PREFIX: &str = "vault:";

/// Merge `table` and `extra` under `schema`, resolving vault references.
pub async fn resolve_config(
    vault: &Vault,
    plugin: &str,
    credential: &str,
    schema: &ConfigSchema,
    table: Option<&BTreeMap<String, String>>,
    extra: &BTreeMap<String, String>,
) -> Result<PluginConfig, VaultError> {
    let mut config = PluginConfig::new();

    for field in &schema.fields {
        let raw = extra
            .get(field.name)
            .or_else(|| table.and_then(|t| t.get(field.name)))
            .filter(|v| !v.is_empty());
        let Some(raw) = raw else {
            if field.required {
                return Err(VaultError::Validation {
                    plugin: plugin.to_string(),
                    name: credential.to_string(),
                    reason: format!("missing required config `{}`", field.name),
                });
            }
            continue;
        };

        match raw.strip_prefix(VAULT_REF_PREFIX) {
            Some(target) => {
                let target = target.trim();
                if target.is_empty() || target == credential {
                    return Err(VaultError::Validation {
                        plugin: plugin.to_string(),
                        name: credential.to_string(),
                        reason: format!("config `{}` has an invalid vault reference", field.name),
                    });
                }
                let secret = vault.retrieve_secret(target).await.map_err(|e| match e {
                    VaultError::NotFound { .. } | VaultError::InvalidInput(_) => {
                        VaultError::Validation {
                            plugin: plugin.to_string(),
                            name: credential.to_string(),
                            reason: format!(
                                "config `{}` refers to `{target}`, which has no secret",
                                field.name
                            ),
                        }
                    }
                    other => other,
                })?;
                // Referenced values are always treated as secret.
                config.insert(field.name, secret.expose_secret(), true);
            }
            None => config.insert(field.name, raw.as_str(), field.secret),
        }
    }

    Ok(config)
}

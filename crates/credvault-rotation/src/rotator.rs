// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rotation executor.
//!
//! Looks up the plugin for a credential, runs it under the context's
//! timeout and cancellation token with no vault lock held, then commits the
//! outcome through [`Vault::rotate`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use credvault_config::RotationConfig;
use credvault_core::{
    CredentialView, RotationAbort, RotationContext, RotationRecord, VaultError,
};
use credvault_vault::Vault;
use tracing::{info, warn};

use crate::registry::RotationRegistry;
use crate::resolve::resolve_config;

/// Result of a committed rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationReport {
    pub record: RotationRecord,
    /// How long the provider keeps the previous value valid, if it says.
    pub grace_period: Option<Duration>,
}

/// Drives plugins and persists their outcomes.
#[derive(Debug)]
pub struct Rotator {
    registry: Arc<RotationRegistry>,
    plugin_tables: BTreeMap<String, BTreeMap<String, String>>,
}

impl Rotator {
    pub fn new(registry: Arc<RotationRegistry>) -> Self {
        Self {
            registry,
            plugin_tables: BTreeMap::new(),
        }
    }

    /// Use the `[rotation.plugins]` tables from configuration.
    pub fn from_config(registry: Arc<RotationRegistry>, config: &RotationConfig) -> Self {
        Self {
            registry,
            plugin_tables: config.plugins.clone(),
        }
    }

    pub fn registry(&self) -> &RotationRegistry {
        &self.registry
    }

    /// Rotate the credential `name` with the plugin named by its provider type.
    ///
    /// A plugin error, time-out or cancellation fails with `RotationFailed`
    /// and leaves the vault untouched.
    pub async fn rotate(
        &self,
        vault: &Vault,
        name: &str,
        ctx: &RotationContext,
    ) -> Result<RotationReport, VaultError> {
        let credential = vault.get(name).await?;
        let plugin = self.registry.get(&credential.provider_type)?;
        let view = CredentialView::from(&credential);
        drop(credential);
        plugin.validate(&view)?;

        let config = resolve_config(
            vault,
            plugin.name(),
            name,
            &plugin.config_schema(),
            self.plugin_tables.get(plugin.name()),
            &view.extra_config,
        )
        .await?;

        let outcome = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                warn!(name, plugin = plugin.name(), "rotation cancelled");
                return Err(VaultError::rotation_failed(name, RotationAbort::Cancelled));
            }
            result = tokio::time::timeout(ctx.timeout, plugin.rotate(ctx, &view, &config)) => {
                match result {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(e)) => return Err(wrap_plugin_error(name, e)),
                    Err(_) => {
                        warn!(name, plugin = plugin.name(), timeout = ?ctx.timeout, "rotation timed out");
                        return Err(VaultError::rotation_failed(
                            name,
                            RotationAbort::TimedOut(ctx.timeout),
                        ));
                    }
                }
            }
        };

        if outcome.is_empty() {
            return Err(VaultError::rotation_failed(
                name,
                format!("{} plugin returned no new values", plugin.name()),
            ));
        }
        if let Some(field) = outcome
            .rotated_fields()
            .into_iter()
            .find(|f| !plugin.rotatable_fields().contains(f))
        {
            return Err(VaultError::rotation_failed(
                name,
                format!("{} plugin returned undeclared field `{field}`", plugin.name()),
            ));
        }

        let record = vault
            .rotate(name, &outcome, plugin.name(), &ctx.actor)
            .await?;
        info!(name, plugin = plugin.name(), record = %record.id, "rotation committed");
        Ok(RotationReport {
            grace_period: record.grace_period,
            record,
        })
    }
}

/// Plugin-side validation stays a validation error; everything else is a
/// rotation failure with the plugin error as its cause.
fn wrap_plugin_error(name: &str, err: VaultError) -> VaultError {
    match err {
        e @ (VaultError::RotationFailed { .. } | VaultError::Validation { .. }) => e,
        other => VaultError::rotation_failed(name, other),
    }
}

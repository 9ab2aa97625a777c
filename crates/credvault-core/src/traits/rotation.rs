// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rotation plugin contract.
//!
//! A plugin knows how to mint a replacement credential with one external
//! provider. It never touches storage: the vault persists the outcome and
//! the audit record together.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use crate::error::VaultError;
use crate::types::{Credential, RotatedBy, RotatedField, RotationOutcome};

/// Read-only copy of a credential handed to a plugin.
#[derive(Debug, Clone)]
pub struct CredentialView {
    pub name: String,
    pub provider_type: String,
    pub environment: Option<String>,
    pub secret_value: Option<SecretString>,
    pub public_value: Option<String>,
    pub endpoint_url: Option<String>,
    pub provider_key_id: Option<String>,
    pub extra_config: BTreeMap<String, String>,
}

impl From<&Credential> for CredentialView {
    fn from(cred: &Credential) -> Self {
        Self {
            name: cred.name.clone(),
            provider_type: cred.provider_type.clone(),
            environment: cred.environment.clone(),
            secret_value: cred.secret_value.clone(),
            public_value: cred.public_value.clone(),
            endpoint_url: cred.endpoint_url.clone(),
            provider_key_id: cred.provider_key_id.clone(),
            extra_config: cred.extra_config.clone(),
        }
    }
}

/// One configuration key a plugin understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigField {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    /// Secret keys are redacted in debug output and may use `vault:<name>` references.
    pub secret: bool,
}

impl ConfigField {
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: true,
            secret: false,
        }
    }

    pub const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: false,
            secret: false,
        }
    }

    pub const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

/// The full set of configuration keys a plugin declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSchema {
    pub fields: Vec<ConfigField>,
}

impl ConfigSchema {
    pub fn new(fields: impl IntoIterator<Item = ConfigField>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&ConfigField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required(&self) -> impl Iterator<Item = &ConfigField> {
        self.fields.iter().filter(|f| f.required)
    }
}

/// Resolved plugin configuration.
///
/// Values marked secret print as `[REDACTED]` in `Debug`.
#[derive(Clone, Default)]
pub struct PluginConfig {
    values: BTreeMap<String, String>,
    secret_keys: BTreeSet<String>,
}

impl PluginConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>, secret: bool) {
        let key = key.into();
        if secret {
            self.secret_keys.insert(key.clone());
        } else {
            self.secret_keys.remove(&key);
        }
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Fetch a key a plugin cannot run without.
    pub fn require(&self, key: &str) -> Result<&str, VaultError> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| VaultError::InvalidInput(format!("missing plugin config key `{key}`")))
    }

    /// Interpret a key as a boolean. Accepts `true/false`, `yes/no`, `1/0`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)?.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for PluginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            if self.secret_keys.contains(key) {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

/// Per-invocation context passed to [`RotationPlugin::rotate`].
#[derive(Debug, Clone)]
pub struct RotationContext {
    /// Triggered when the caller abandons the rotation.
    pub cancel: CancellationToken,
    /// Upper bound the executor enforces on the plugin call.
    pub timeout: Duration,
    pub actor: RotatedBy,
}

impl RotationContext {
    pub fn new(timeout: Duration, actor: RotatedBy) -> Self {
        Self {
            cancel: CancellationToken::new(),
            timeout,
            actor,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// A provider-specific strategy for minting replacement credentials.
///
/// Plugins are registered once at startup and shared behind `Arc`, so
/// implementations must be `Send + Sync`.
#[async_trait]
pub trait RotationPlugin: Send + Sync + 'static {
    /// Unique registry name; matched against a credential's provider type.
    fn name(&self) -> &str;

    /// Fields this plugin is able to replace.
    fn rotatable_fields(&self) -> &[RotatedField];

    /// Check that a credential carries what this plugin needs.
    fn validate(&self, credential: &CredentialView) -> Result<(), VaultError>;

    /// Configuration keys this plugin reads.
    fn config_schema(&self) -> ConfigSchema;

    /// Mint a replacement credential. Must not persist anything.
    async fn rotate(
        &self,
        ctx: &RotationContext,
        credential: &CredentialView,
        config: &PluginConfig,
    ) -> Result<RotationOutcome, VaultError>;
}

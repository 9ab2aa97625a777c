// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locally generated shared secrets (webhook signing keys, internal tokens).

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use credvault_core::{
    ConfigField, ConfigSchema, CredentialView, PluginConfig, RotatedField, RotationContext,
    RotationOutcome, RotationPlugin, VaultError,
};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::SecretString;

use super::{expect_provider, invalid};

const NAME: &str = "local";
const DEFAULT_LENGTH: usize = 32;
const MIN_LENGTH: usize = 16;
const MAX_LENGTH: usize = 256;

/// Mints a random base64url secret of `length` bytes, optionally prefixed.
#[derive(Debug, Default)]
pub struct LocalPlugin;

impl LocalPlugin {
    fn length(config: &PluginConfig, credential: &CredentialView) -> Result<usize, VaultError> {
        let Some(raw) = config.get("length") else {
            return Ok(DEFAULT_LENGTH);
        };
        match raw.trim().parse::<usize>() {
            Ok(n) if (MIN_LENGTH..=MAX_LENGTH).contains(&n) => Ok(n),
            _ => Err(invalid(
                NAME,
                credential,
                format!("`length` must be between {MIN_LENGTH} and {MAX_LENGTH}"),
            )),
        }
    }
}

fn random(len: usize) -> Result<Vec<u8>, VaultError> {
    let mut bytes = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| VaultError::Internal("system random source failed".to_string()))?;
    Ok(bytes)
}

#[async_trait]
impl RotationPlugin for LocalPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn rotatable_fields(&self) -> &[RotatedField] {
        &[RotatedField::Secret]
    }

    fn validate(&self, credential: &CredentialView) -> Result<(), VaultError> {
        expect_provider(NAME, credential)
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new([
            ConfigField::optional("length", "random bytes in the new secret (default 32)"),
            ConfigField::optional("prefix", "text prepended to the encoded secret"),
        ])
    }

    async fn rotate(
        &self,
        _ctx: &RotationContext,
        credential: &CredentialView,
        config: &PluginConfig,
    ) -> Result<RotationOutcome, VaultError> {
        let length = Self::length(config, credential)?;
        let encoded = URL_SAFE_NO_PAD.encode(random(length)?);
        let secret = match config.get("prefix") {
            Some(prefix) => format!("{prefix}{encoded}"),
            None => encoded,
        };
        let key_id = format!("local-{}", URL_SAFE_NO_PAD.encode(random(6)?));

        let mut outcome = RotationOutcome {
            new_secret: Some(SecretString::from(secret)),
            key_id: Some(key_id),
            ..RotationOutcome::default()
        };
        outcome
            .metadata
            .insert("length".to_string(), length.to_string());
        Ok(outcome)
    }
}

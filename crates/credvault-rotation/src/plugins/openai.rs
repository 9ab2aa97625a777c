// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI project keys, rotated by minting a fresh project service account.

use std::time::Duration;

use async_trait::async_trait;
use credvault_core::{
    ConfigField, ConfigSchema, CredentialView, PluginConfig, RotatedField, RotationContext,
    RotationOutcome, RotationPlugin, VaultError,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{expect_provider, has_secret, invalid};
use crate::http;

const NAME: &str = "openai";
const DEFAULT_API_BASE: &str = "https://api.openai.com";
const GRACE_PERIOD: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Default)]
pub struct OpenAiPlugin;

#[derive(Serialize)]
struct CreateServiceAccount<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct ServiceAccount {
    id: String,
    api_key: ServiceAccountKey,
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    id: String,
    value: String,
}

#[async_trait]
impl RotationPlugin for OpenAiPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn rotatable_fields(&self) -> &[RotatedField] {
        &[RotatedField::Secret]
    }

    fn validate(&self, credential: &CredentialView) -> Result<(), VaultError> {
        expect_provider(NAME, credential)?;
        if !has_secret(credential) {
            return Err(invalid(NAME, credential, "an OpenAI credential needs a secret key"));
        }
        Ok(())
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new([
            ConfigField::required("project_id", "OpenAI project that owns the key"),
            ConfigField::required("admin_key", "organization admin key for key management")
                .secret(),
            ConfigField::optional("organization_id", "OpenAI organization ID"),
            ConfigField::optional("api_base", "API base URL (default https://api.openai.com)"),
        ])
    }

    async fn rotate(
        &self,
        ctx: &RotationContext,
        credential: &CredentialView,
        config: &PluginConfig,
    ) -> Result<RotationOutcome, VaultError> {
        let project_id = config.require("project_id")?;
        let admin_key = config.require("admin_key")?;
        let mut headers = Vec::new();
        if let Some(org) = config.get("organization_id") {
            headers.push(("openai-organization", org));
        }
        let client = http::bearer_client(&credential.name, admin_key, ctx.timeout, &headers)?;

        let url = format!(
            "{}/v1/organization/projects/{project_id}/service_accounts",
            http::base_url(config.get("api_base"), DEFAULT_API_BASE)
        );
        let account_name = format!("credvault-{}", credential.name);
        debug!(name = %credential.name, project_id, "creating OpenAI service account");
        let account: ServiceAccount = http::send_json(
            &credential.name,
            "OpenAI",
            client.post(url).json(&CreateServiceAccount {
                name: &account_name,
            }),
        )
        .await?;

        let mut outcome = RotationOutcome {
            new_secret: Some(SecretString::from(account.api_key.value)),
            key_id: Some(account.api_key.id),
            grace_period: Some(GRACE_PERIOD),
            ..RotationOutcome::default()
        };
        outcome
            .metadata
            .insert("service_account_id".to_string(), account.id);
        outcome
            .metadata
            .insert("project_id".to_string(), project_id.to_string());
        Ok(outcome)
    }
}

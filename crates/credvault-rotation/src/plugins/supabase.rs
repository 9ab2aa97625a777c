// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supabase project API keys via the Management API.

use std::time::Duration;

use async_trait::async_trait;
use credvault_core::{
    ConfigField, ConfigSchema, CredentialView, PluginConfig, RotatedField, RotationContext,
    RotationOutcome, RotationPlugin, VaultError,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{expect_provider, has_public, has_secret, invalid};
use crate::http;

const NAME: &str = "supabase";
const DEFAULT_API_BASE: &str = "https://api.supabase.com";
const GRACE_PERIOD: Duration = Duration::from_secs(2 * 60);

#[derive(Debug, Default)]
pub struct SupabasePlugin;

#[derive(Serialize)]
struct CreateApiKey<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: String,
}

#[derive(Deserialize)]
struct ApiKey {
    id: String,
    api_key: String,
}

/// Supabase key names allow lowercase letters, digits and underscores.
fn key_name(credential: &str, kind: &str) -> String {
    let slug: String = credential
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("credvault_{slug}_{kind}")
}

async fn create_key(
    client: &reqwest::Client,
    base: &str,
    project_ref: &str,
    credential: &str,
    kind: &str,
) -> Result<ApiKey, VaultError> {
    let url = format!("{base}/v1/projects/{project_ref}/api-keys?reveal=true");
    debug!(name = credential, kind, "creating Supabase API key");
    http::send_json(
        credential,
        "Supabase",
        client.post(url).json(&CreateApiKey {
            kind,
            name: key_name(credential, kind),
        }),
    )
    .await
}

/// Revoke a secret key minted by a rotation that cannot complete, folding
/// the outcome into the returned error.
async fn abandon_secret_key(
    client: &reqwest::Client,
    base: &str,
    project_ref: &str,
    credential: &str,
    key_id: &str,
    cause: VaultError,
) -> VaultError {
    let cause = match cause {
        VaultError::RotationFailed { source, .. } => source.to_string(),
        other => other.to_string(),
    };
    let url = format!("{base}/v1/projects/{project_ref}/api-keys/{key_id}");
    let revoked = match client.delete(url).send().await {
        Ok(response) if response.status().is_success() => true,
        Ok(response) => {
            warn!(name = credential, key_id, status = %response.status(), "could not revoke Supabase secret key");
            false
        }
        Err(e) => {
            warn!(name = credential, key_id, error = %e.without_url(), "could not revoke Supabase secret key");
            false
        }
    };
    let fate = if revoked {
        "was revoked"
    } else {
        "could not be revoked and must be deleted by hand"
    };
    VaultError::rotation_failed(credential, format!("{cause}; new secret key `{key_id}` {fate}"))
}

#[async_trait]
impl RotationPlugin for SupabasePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn rotatable_fields(&self) -> &[RotatedField] {
        &[RotatedField::Secret, RotatedField::Public]
    }

    fn validate(&self, credential: &CredentialView) -> Result<(), VaultError> {
        expect_provider(NAME, credential)?;
        if credential.endpoint_url.as_deref().is_none_or(str::is_empty) {
            return Err(invalid(NAME, credential, "a Supabase credential needs a project URL"));
        }
        if !has_secret(credential) && !has_public(credential) {
            return Err(invalid(
                NAME,
                credential,
                "a Supabase credential needs a secret or publishable key",
            ));
        }
        Ok(())
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new([
            ConfigField::required("project_ref", "Supabase project reference"),
            ConfigField::required("access_token", "Management API access token").secret(),
            ConfigField::optional("rotate_publishable", "also mint a new publishable key"),
            ConfigField::optional("api_base", "API base URL (default https://api.supabase.com)"),
        ])
    }

    async fn rotate(
        &self,
        ctx: &RotationContext,
        credential: &CredentialView,
        config: &PluginConfig,
    ) -> Result<RotationOutcome, VaultError> {
        let project_ref = config.require("project_ref")?;
        let token = config.require("access_token")?;
        let rotate_publishable = match config.get("rotate_publishable") {
            None => false,
            Some(_) => config.get_bool("rotate_publishable").ok_or_else(|| {
                invalid(NAME, credential, "`rotate_publishable` must be true or false")
            })?,
        };
        let client = http::bearer_client(&credential.name, token, ctx.timeout, &[])?;
        let base = http::base_url(config.get("api_base"), DEFAULT_API_BASE);

        let mut outcome = RotationOutcome {
            grace_period: Some(GRACE_PERIOD),
            ..RotationOutcome::default()
        };
        outcome
            .metadata
            .insert("project_ref".to_string(), project_ref.to_string());

        if has_secret(credential) {
            let key = create_key(&client, &base, project_ref, &credential.name, "secret").await?;
            outcome.new_secret = Some(SecretString::from(key.api_key));
            outcome.key_id = Some(key.id);
        }
        if rotate_publishable || !has_secret(credential) {
            let key = match create_key(&client, &base, project_ref, &credential.name, "publishable")
                .await
            {
                Ok(key) => key,
                Err(err) => {
                    let Some(minted) = outcome.key_id.as_deref() else {
                        return Err(err);
                    };
                    return Err(abandon_secret_key(
                        &client,
                        &base,
                        project_ref,
                        &credential.name,
                        minted,
                        err,
                    )
                    .await);
                }
            };
            outcome
                .metadata
                .insert("publishable_key_id".to_string(), key.id.clone());
            outcome.new_public = Some(key.api_key);
            if outcome.key_id.is_none() {
                outcome.key_id = Some(key.id);
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credvault_core::RotatedBy;
    use secrecy::ExposeSecret;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn view() -> CredentialView {
        CredentialView {
            name: "supabase-prod".into(),
            provider_type: "supabase".into(),
            environment: None,
            secret_value: Some(SecretString::from("sb_secret_old".to_string())),
            public_value: Some("sb_publishable_old".into()),
            endpoint_url: Some("https://abc.supabase.co".into()),
            provider_key_id: None,
            extra_config: Default::default(),
        }
    }

    fn config(server: &MockServer, publishable: Option<&str>) -> PluginConfig {
        let mut config = PluginConfig::new();
        config.insert("project_ref", "abc", false);
        config.insert("access_token", "sbp_token", true);
        config.insert("api_base", server.uri(), false);
        if let Some(value) = publishable {
            config.insert("rotate_publishable", value, false);
        }
        config
    }

    fn ctx() -> RotationContext {
        RotationContext::new(Duration::from_secs(5), RotatedBy::Cli)
    }

    async fn mount_key(server: &MockServer, kind: &str, id: &str, value: &str, calls: u64) {
        Mock::given(method("POST"))
            .and(path("/v1/projects/abc/api-keys"))
            .and(query_param("reveal", "true"))
            .and(header("authorization", "Bearer sbp_token"))
            .and(body_partial_json(serde_json::json!({ "type": kind })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": id,
                "name": format!("credvault_supabase_prod_{kind}"),
                "type": kind,
                "api_key": value
            })))
            .expect(calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn rotates_secret_only_by_default() {
        let server = MockServer::start().await;
        mount_key(&server, "secret", "k-secret", "sb_secret_new", 1).await;
        mount_key(&server, "publishable", "k-pub", "sb_publishable_new", 0).await;

        let outcome = SupabasePlugin
            .rotate(&ctx(), &view(), &config(&server, None))
            .await
            .unwrap();
        assert_eq!(outcome.new_secret.unwrap().expose_secret(), "sb_secret_new");
        assert!(outcome.new_public.is_none());
        assert_eq!(outcome.key_id.as_deref(), Some("k-secret"));
        assert_eq!(outcome.grace_period, Some(GRACE_PERIOD));
    }

    #[tokio::test]
    async fn publishable_key_on_request() {
        let server = MockServer::start().await;
        mount_key(&server, "secret", "k-secret", "sb_secret_new", 1).await;
        mount_key(&server, "publishable", "k-pub", "sb_publishable_new", 1).await;

        let outcome = SupabasePlugin
            .rotate(&ctx(), &view(), &config(&server, Some("yes")))
            .await
            .unwrap();
        assert_eq!(
            outcome.rotated_fields(),
            vec![RotatedField::Secret, RotatedField::Public]
        );
        assert_eq!(outcome.new_public.as_deref(), Some("sb_publishable_new"));
        assert_eq!(outcome.key_id.as_deref(), Some("k-secret"));
    }

    #[tokio::test]
    async fn public_only_credential_rotates_publishable() {
        let server = MockServer::start().await;
        mount_key(&server, "publishable", "k-pub", "sb_publishable_new", 1).await;
        let mut public_only = view();
        public_only.secret_value = None;

        let outcome = SupabasePlugin
            .rotate(&ctx(), &public_only, &config(&server, None))
            .await
            .unwrap();
        assert_eq!(outcome.rotated_fields(), vec![RotatedField::Public]);
        assert_eq!(outcome.key_id.as_deref(), Some("k-pub"));
    }

    #[tokio::test]
    async fn bad_bool_is_validation() {
        let server = MockServer::start().await;
        let err = SupabasePlugin
            .rotate(&ctx(), &view(), &config(&server, Some("maybe")))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Validation { .. }));
    }

    #[tokio::test]
    async fn server_error_names_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let err = SupabasePlugin
            .rotate(&ctx(), &view(), &config(&server, None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    async fn fail_publishable(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v1/projects/abc/api-keys"))
            .and(body_partial_json(serde_json::json!({ "type": "publishable" })))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn failed_publishable_revokes_new_secret_key() {
        let server = MockServer::start().await;
        mount_key(&server, "secret", "k-secret", "sb_secret_new", 1).await;
        fail_publishable(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/v1/projects/abc/api-keys/k-secret"))
            .and(header("authorization", "Bearer sbp_token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let err = SupabasePlugin
            .rotate(&ctx(), &view(), &config(&server, Some("true")))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("`k-secret` was revoked"));
        assert!(!message.contains("sb_secret_new"));
    }

    #[tokio::test]
    async fn unrevokable_secret_key_is_named_in_error() {
        let server = MockServer::start().await;
        mount_key(&server, "secret", "k-secret", "sb_secret_new", 1).await;
        fail_publishable(&server).await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let err = SupabasePlugin
            .rotate(&ctx(), &view(), &config(&server, Some("true")))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::RotationFailed { .. }));
        assert!(err.to_string().contains("`k-secret` could not be revoked"));
    }

    #[test]
    fn validate_needs_url_and_a_key() {
        assert!(SupabasePlugin.validate(&view()).is_ok());

        let mut no_url = view();
        no_url.endpoint_url = None;
        assert!(SupabasePlugin.validate(&no_url).is_err());

        let mut no_keys = view();
        no_keys.secret_value = None;
        no_keys.public_value = None;
        assert!(SupabasePlugin.validate(&no_keys).is_err());
    }

    #[test]
    fn key_names_are_slugged() {
        assert_eq!(key_name("Supabase-Prod.1", "secret"), "credvault_supabase_prod_1_secret");
    }
}

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable rotation plugin for deterministic tests.
//!
//! Outcomes are popped from a FIFO queue; when it is empty a fresh secret
//! `mock-secret-<n>` is returned. A delay or a failure can be scripted to
//! exercise time-outs and error paths.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use credvault_core::{
    ConfigSchema, CredentialView, PluginConfig, RotatedField, RotationContext, RotationOutcome,
    RotationPlugin, VaultError,
};
use secrecy::SecretString;
use tokio::sync::Mutex;

const ALL_FIELDS: &[RotatedField] = &[RotatedField::Secret, RotatedField::Public, RotatedField::Url];

/// A rotation plugin with scripted behaviour.
///
/// Clones share the call counter, queue and captured config, so a test can
/// keep a handle after registering the plugin.
#[derive(Clone)]
pub struct MockRotationPlugin {
    name: String,
    schema: ConfigSchema,
    delay: Option<Duration>,
    failure: Option<String>,
    rejection: Option<String>,
    outcomes: Arc<Mutex<VecDeque<RotationOutcome>>>,
    calls: Arc<AtomicUsize>,
    last_config: Arc<Mutex<Option<PluginConfig>>>,
}

impl MockRotationPlugin {
    /// A plugin registered under `name` (match it with the credential's provider type).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: ConfigSchema::default(),
            delay: None,
            failure: None,
            rejection: None,
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            last_config: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_schema(mut self, schema: ConfigSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Sleep this long inside `rotate`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every `rotate` call with this message.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Reject every credential in `validate`.
    pub fn rejecting(mut self, reason: impl Into<String>) -> Self {
        self.rejection = Some(reason.into());
        self
    }

    pub async fn push_outcome(&self, outcome: RotationOutcome) {
        self.outcomes.lock().await.push_back(outcome);
    }

    /// Number of `rotate` calls that started.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The config passed to the most recent `rotate` call.
    pub async fn last_config(&self) -> Option<PluginConfig> {
        self.last_config.lock().await.clone()
    }
}

#[async_trait]
impl RotationPlugin for MockRotationPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn rotatable_fields(&self) -> &[RotatedField] {
        ALL_FIELDS
    }

    fn validate(&self, credential: &CredentialView) -> Result<(), VaultError> {
        match &self.rejection {
            Some(reason) => Err(VaultError::Validation {
                plugin: self.name.clone(),
                name: credential.name.clone(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn config_schema(&self) -> ConfigSchema {
        self.schema.clone()
    }

    async fn rotate(
        &self,
        _ctx: &RotationContext,
        credential: &CredentialView,
        config: &PluginConfig,
    ) -> Result<RotationOutcome, VaultError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_config.lock().await = Some(config.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(VaultError::rotation_failed(&credential.name, message.clone()));
        }

        let scripted = self.outcomes.lock().await.pop_front();
        Ok(scripted.unwrap_or_else(|| RotationOutcome {
            new_secret: Some(SecretString::from(format!("mock-secret-{n}"))),
            key_id: Some(format!("mock-key-{n}")),
            ..RotationOutcome::default()
        }))
    }
}

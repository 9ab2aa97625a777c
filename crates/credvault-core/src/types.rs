// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential data model and rotation audit types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::VaultError;

/// A named secret bundle as returned by a full fetch.
///
/// `Debug` never prints the secret value.
#[derive(Debug, Clone)]
pub struct Credential {
    pub id: String,
    pub name: String,
    /// Free-text tag used to select a rotation plugin.
    pub provider_type: String,
    pub environment: Option<String>,
    pub secret_value: Option<SecretString>,
    pub public_value: Option<String>,
    pub endpoint_url: Option<String>,
    pub extra_config: BTreeMap<String, String>,
    /// Identifier the external provider assigned to the active secret.
    pub provider_key_id: Option<String>,
    /// Free-text notes (the legacy `metadata` column).
    pub notes: Option<String>,
    pub last_rotated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn has_secret(&self) -> bool {
        non_empty_secret(self.secret_value.as_ref())
    }

    pub fn has_public(&self) -> bool {
        non_empty(self.public_value.as_deref())
    }
}

/// Input for creating a credential.
#[derive(Debug, Clone, Default)]
pub struct NewCredential {
    pub name: String,
    pub provider_type: String,
    pub environment: Option<String>,
    pub secret_value: Option<SecretString>,
    pub public_value: Option<String>,
    pub endpoint_url: Option<String>,
    pub extra_config: BTreeMap<String, String>,
    pub provider_key_id: Option<String>,
    pub notes: Option<String>,
}

impl NewCredential {
    /// Start a credential with a name and provider type; values are added with the builder methods.
    pub fn new(name: impl Into<String>, provider_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_type: provider_type.into(),
            ..Self::default()
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret_value = Some(SecretString::from(secret.into()));
        self
    }

    pub fn with_public(mut self, public: impl Into<String>) -> Self {
        self.public_value = Some(public.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_config.insert(key.into(), value.into());
        self
    }

    /// Check the creation invariants: a non-empty name and at least one of
    /// secret/public present.
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.name.trim().is_empty() {
            return Err(VaultError::InvalidInput("name is required".to_string()));
        }
        if !non_empty_secret(self.secret_value.as_ref()) && !non_empty(self.public_value.as_deref())
        {
            return Err(VaultError::InvalidInput(format!(
                "credential `{}` needs a secret or a public value",
                self.name
            )));
        }
        Ok(())
    }
}

/// Metadata-only update. `None` leaves a field untouched.
///
/// Secret, public and URL values change only through a rotation, which
/// records an audit entry. An empty `environment` or `notes` clears it.
#[derive(Debug, Clone, Default)]
pub struct CredentialUpdate {
    pub provider_type: Option<String>,
    pub environment: Option<String>,
    pub extra_config: Option<BTreeMap<String, String>>,
    pub notes: Option<String>,
}

impl CredentialUpdate {
    pub fn is_empty(&self) -> bool {
        self.provider_type.is_none()
            && self.environment.is_none()
            && self.extra_config.is_none()
            && self.notes.is_none()
    }
}

/// Non-secret listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialSummary {
    pub name: String,
    pub provider_type: String,
    pub environment: Option<String>,
    pub has_secret: bool,
    pub has_public: bool,
    pub last_rotated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A credential field that a rotation can replace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize,
)]
pub enum RotatedField {
    #[strum(serialize = "secret_key")]
    #[serde(rename = "secret_key")]
    Secret,
    #[strum(serialize = "public_key")]
    #[serde(rename = "public_key")]
    Public,
    #[strum(serialize = "url")]
    #[serde(rename = "url")]
    Url,
}

/// Who initiated a rotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RotatedBy {
    Scheduled,
    Manual,
    Agent,
    Cli,
    /// Any other actor tag found in the audit trail.
    Other(String),
}

impl fmt::Display for RotatedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotatedBy::Scheduled => write!(f, "scheduled"),
            RotatedBy::Manual => write!(f, "manual"),
            RotatedBy::Agent => write!(f, "agent"),
            RotatedBy::Cli => write!(f, "cli"),
            RotatedBy::Other(tag) => write!(f, "{tag}"),
        }
    }
}

impl FromStr for RotatedBy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "scheduled" => RotatedBy::Scheduled,
            "manual" => RotatedBy::Manual,
            "agent" => RotatedBy::Agent,
            "cli" => RotatedBy::Cli,
            _ => RotatedBy::Other(s.to_string()),
        })
    }
}

/// One immutable entry in a credential's rotation audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationRecord {
    pub id: String,
    pub credential_name: String,
    /// Fields the rotation actually replaced, in secret/public/url order.
    pub rotated_fields: Vec<RotatedField>,
    pub old_key_id: Option<String>,
    pub new_key_id: Option<String>,
    pub plugin_name: String,
    pub rotated_by: RotatedBy,
    pub rotated_at: DateTime<Utc>,
    pub grace_period: Option<Duration>,
    pub metadata: BTreeMap<String, String>,
}

/// What a rotation plugin produced.
///
/// Only the fields that changed are set. The grace period is informational:
/// the vault records it but does not enforce it.
#[derive(Debug, Clone, Default)]
pub struct RotationOutcome {
    pub new_secret: Option<SecretString>,
    pub new_public: Option<String>,
    pub new_url: Option<String>,
    pub key_id: Option<String>,
    pub grace_period: Option<Duration>,
    pub metadata: BTreeMap<String, String>,
}

impl RotationOutcome {
    /// The fields this outcome replaces. Empty strings count as absent.
    pub fn rotated_fields(&self) -> Vec<RotatedField> {
        let mut fields = Vec::with_capacity(3);
        if non_empty_secret(self.new_secret.as_ref()) {
            fields.push(RotatedField::Secret);
        }
        if non_empty(self.new_public.as_deref()) {
            fields.push(RotatedField::Public);
        }
        if non_empty(self.new_url.as_deref()) {
            fields.push(RotatedField::Url);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.rotated_fields().is_empty()
    }
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

fn non_empty_secret(value: Option<&SecretString>) -> bool {
    value.is_some_and(|v| !v.expose_secret().is_empty())
}

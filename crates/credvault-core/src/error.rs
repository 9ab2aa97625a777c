// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for credvault.
//!
//! Messages may name a credential but never carry secret or public values.

use std::time::Duration;

use thiserror::Error;

/// The error type returned by every credvault operation.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No credential with the given name exists.
    #[error("credential `{name}` not found")]
    NotFound { name: String },

    /// A credential with the given name already exists.
    #[error("credential `{name}` already exists")]
    Duplicate { name: String },

    /// A required field is missing or a value is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Authenticated decryption failed.
    ///
    /// Wrong password, corruption and tampering are reported identically.
    #[error("decryption failed")]
    DecryptFailure,

    /// The credential is not shaped for the plugin that would rotate it.
    #[error("credential `{name}` is not valid for the {plugin} plugin: {reason}")]
    Validation {
        plugin: String,
        name: String,
        reason: String,
    },

    /// No rotation plugin is registered under the credential's provider type.
    #[error("no rotation plugin registered for provider type `{provider_type}`")]
    PluginNotFound { provider_type: String },

    /// A rotation plugin failed, timed out, or was cancelled.
    #[error("rotation of `{name}` failed: {source}")]
    RotationFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The underlying persistence layer failed.
    #[error("storage error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// Wrap any storage-level error.
    pub fn store(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        VaultError::Store {
            source: Box::new(source),
        }
    }

    /// Wrap a plugin or network error as a rotation failure for `name`.
    pub fn rotation_failed(
        name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        VaultError::RotationFailed {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Why a rotation was abandoned before the plugin returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RotationAbort {
    #[error("plugin did not return within {0:?}")]
    TimedOut(Duration),

    #[error("rotation was cancelled")]
    Cancelled,
}

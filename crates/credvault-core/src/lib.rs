// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for credvault.
//!
//! Holds the error type, the credential data model, and the rotation plugin
//! contract shared by the storage, vault, and rotation crates.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{RotationAbort, VaultError};
pub use traits::{
    ConfigField, ConfigSchema, CredentialView, PluginConfig, RotationContext, RotationPlugin,
};
pub use types::{
    Credential, CredentialSummary, CredentialUpdate, NewCredential, RotatedBy, RotatedField,
    RotationOutcome, RotationRecord,
};

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in rotation plugins.

pub mod local;
pub mod openai;
pub mod supabase;

use credvault_core::{CredentialView, VaultError};
use secrecy::ExposeSecret;

pub use local::LocalPlugin;
pub use openai::OpenAiPlugin;
pub use supabase::SupabasePlugin;

pub(crate) fn invalid(plugin: &str, credential: &CredentialView, reason: impl Into<String>) -> VaultError {
    VaultError::Validation {
        plugin: plugin.to_string(),
        name: credential.name.clone(),
        reason: reason.into(),
    }
}

pub(crate) fn expect_provider(plugin: &str, credential: &CredentialView) -> Result<(), VaultError> {
    if credential.provider_type != plugin {
        return Err(invalid(
            plugin,
            credential,
            format!("expected provider type `{plugin}`, got `{}`", credential.provider_type),
        ));
    }
    Ok(())
}

pub(crate) fn has_secret(credential: &CredentialView) -> bool {
    credential
        .secret_value
        .as_ref()
        .is_some_and(|s| !s.expose_secret().is_empty())
}

pub(crate) fn has_public(credential: &CredentialView) -> bool {
    credential.public_value.as_deref().is_some_and(|p| !p.is_empty())
}

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential rotation for credvault.
//!
//! A [`RotationRegistry`] maps provider types to [`RotationPlugin`]s. The
//! [`Rotator`] resolves plugin configuration, bounds the plugin call by the
//! caller's timeout and cancellation token, and commits the outcome through
//! the vault's atomic rotation transaction.
//!
//! [`RotationPlugin`]: credvault_core::RotationPlugin

mod http;
pub mod plugins;
pub mod registry;
pub mod resolve;
pub mod rotator;

pub use plugins::{LocalPlugin, OpenAiPlugin, SupabasePlugin};
pub use registry::{PluginInfo, RotationRegistry};
pub use resolve::{VAULT_REF_PREFIX, resolve_config};
pub use rotator::{RotationReport, Rotator};

/// Pseudo-plugin name recorded for values set directly by an operator.
pub const MANUAL_PLUGIN: &str = "manual";

/// A registry holding every built-in plugin.
pub fn builtin_registry() -> RotationRegistry {
    let mut registry = RotationRegistry::new();
    registry.register(LocalPlugin);
    registry.register(OpenAiPlugin);
    registry.register(SupabasePlugin);
    registry
}

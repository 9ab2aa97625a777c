// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extension traits for credvault.

pub mod rotation;

pub use rotation::{
    ConfigField, ConfigSchema, CredentialView, PluginConfig, RotationContext, RotationPlugin,
};

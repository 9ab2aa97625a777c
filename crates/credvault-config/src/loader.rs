// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-based layered config loading.
//!
//! Merge order, later wins: compiled defaults, `/etc/credvault/credvault.toml`,
//! `<config dir>/credvault/credvault.toml`, `./credvault.toml`, then
//! `CREDVAULT_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CredvaultConfig;

/// Environment variable that carries the master password.
///
/// It is read by the passphrase prompt, never by the config layer.
pub const PASSWORD_ENV_VAR: &str = "CREDVAULT_PASSWORD";

pub const SYSTEM_CONFIG_PATH: &str = "/etc/credvault/credvault.toml";
pub const LOCAL_CONFIG_FILE: &str = "credvault.toml";

/// Paths searched for config files, lowest priority first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("credvault").join(LOCAL_CONFIG_FILE));
    }
    paths.push(PathBuf::from(LOCAL_CONFIG_FILE));
    paths
}

/// Build the full layered figment without extracting it.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(CredvaultConfig::default()));
    for path in config_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Load configuration from the standard hierarchy with env overrides.
pub fn load_config() -> Result<CredvaultConfig, figment::Error> {
    let found: Vec<_> = config_paths().into_iter().filter(|p| p.exists()).collect();
    tracing::debug!(files = ?found, "loading configuration");
    build_figment().extract()
}

/// Load configuration from an inline TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<CredvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CredvaultConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file plus env overrides.
pub fn load_config_from_path(path: &Path) -> Result<CredvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CredvaultConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// `CREDVAULT_*` provider with explicit section mapping.
///
/// Only the first underscore after a section name becomes a dot, so
/// `CREDVAULT_VAULT_KDF_MEMORY_COST` maps to `vault.kdf_memory_cost`.
fn env_provider() -> Env {
    Env::prefixed("CREDVAULT_")
        .ignore(&["password"])
        .map(|key| {
            let key_str = key.as_str().to_ascii_lowercase();
            let mapped = if let Some(rest) = key_str.strip_prefix("vault_") {
                format!("vault.{rest}")
            } else if let Some(rest) = key_str.strip_prefix("rotation_") {
                format!("rotation.{rest}")
            } else if let Some(rest) = key_str.strip_prefix("logging_") {
                format!("logging.{rest}")
            } else {
                key_str
            };
            mapped.into()
        })
}

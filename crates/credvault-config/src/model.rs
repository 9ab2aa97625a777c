// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for credvault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently ignored.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level credvault configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CredvaultConfig {
    /// Vault file and key-derivation settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Rotation executor and plugin settings.
    #[serde(default)]
    pub rotation: RotationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Vault file location and Argon2id parameters for newly created vaults.
///
/// The KDF parameters only apply when a vault file is first created; an
/// existing vault always unlocks with the parameters recorded inside it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Path of the encrypted vault file.
    #[serde(default = "default_vault_path")]
    pub path: String,

    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count (default: 3).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism lanes (default: 4).
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl VaultConfig {
    pub fn path_buf(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: default_vault_path(),
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_vault_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("credvault").join("vault.db"))
        .unwrap_or_else(|| PathBuf::from("credvault.db"))
        .display()
        .to_string()
}

fn default_kdf_memory_cost() -> u32 {
    65536
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}

/// Rotation executor settings and per-plugin configuration tables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RotationConfig {
    /// Upper bound on a single plugin call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Default number of rotation records shown by `history`.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// `[rotation.plugins.<name>]` tables, flat string key/value pairs.
    ///
    /// Values of the form `vault:<credential>` are resolved from the vault
    /// at rotation time.
    #[serde(default)]
    pub plugins: BTreeMap<String, BTreeMap<String, String>>,
}

impl RotationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            history_limit: default_history_limit(),
            plugins: BTreeMap::new(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_history_limit() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level for credvault crates (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

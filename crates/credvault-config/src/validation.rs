// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Collects every violation instead of stopping at the first.

use crate::diagnostic::ConfigError;
use crate::model::CredvaultConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Check semantic constraints serde cannot express.
pub fn validate_config(config: &CredvaultConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.vault.path.trim().is_empty() {
        errors.push(ConfigError::validation("vault.path must not be empty"));
    }

    if config.vault.kdf_memory_cost < 32768 {
        errors.push(ConfigError::validation(format!(
            "vault.kdf_memory_cost must be at least 32768 (32 MiB), got {}",
            config.vault.kdf_memory_cost
        )));
    }

    if config.vault.kdf_iterations < 2 {
        errors.push(ConfigError::validation(format!(
            "vault.kdf_iterations must be at least 2, got {}",
            config.vault.kdf_iterations
        )));
    }

    if config.vault.kdf_parallelism < 1 {
        errors.push(ConfigError::validation(format!(
            "vault.kdf_parallelism must be at least 1, got {}",
            config.vault.kdf_parallelism
        )));
    }

    if config.rotation.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "rotation.timeout_secs must be greater than 0",
        ));
    }

    if config.rotation.history_limit == 0 {
        errors.push(ConfigError::validation(
            "rotation.history_limit must be greater than 0",
        ));
    }

    for (plugin, table) in &config.rotation.plugins {
        if plugin.trim().is_empty() {
            errors.push(ConfigError::validation(
                "rotation.plugins table names must not be empty",
            ));
        }
        for (key, value) in table {
            if let Some(reference) = value.strip_prefix("vault:")
                && reference.trim().is_empty()
            {
                errors.push(ConfigError::validation(format!(
                    "rotation.plugins.{plugin}.{key} references an empty vault credential name"
                )));
            }
        }
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

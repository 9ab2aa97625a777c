// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for credvault.
//!
//! TOML files layered over compiled defaults, `CREDVAULT_*` environment
//! overrides, strict unknown-key rejection and miette diagnostics.
//!
//! ```no_run
//! let config = credvault_config::load_and_validate().expect("config errors");
//! println!("vault at {}", config.vault.path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{PASSWORD_ENV_VAR, load_config, load_config_from_path, load_config_from_str};
pub use model::{CredvaultConfig, LoggingConfig, RotationConfig, VaultConfig};

/// Load from the standard hierarchy and validate.
pub fn load_and_validate() -> Result<CredvaultConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = read_sources(loader::config_paths().iter().map(|p| p.as_path()));
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load one explicit file (plus env overrides) and validate.
pub fn load_and_validate_path(path: &Path) -> Result<CredvaultConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = read_sources(std::iter::once(path));
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load an inline TOML string and validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<CredvaultConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

fn read_sources<'a>(paths: impl Iterator<Item = &'a Path>) -> Vec<(String, String)> {
    paths
        .filter_map(|path| {
            // figment records the resolved absolute path as the error source.
            let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            std::fs::read_to_string(&resolved)
                .ok()
                .map(|content| (resolved.display().to_string(), content))
        })
        .collect()
}

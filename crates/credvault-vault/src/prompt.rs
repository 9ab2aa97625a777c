// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master password acquisition for the command line.

use std::io::IsTerminal;

use credvault_config::PASSWORD_ENV_VAR;
use credvault_core::VaultError;
use secrecy::{ExposeSecret, SecretString};

fn from_env() -> Option<SecretString> {
    std::env::var(PASSWORD_ENV_VAR)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

fn read_hidden(label: &str) -> Result<SecretString, VaultError> {
    eprint!("{label}: ");
    let value = rpassword::read_password()
        .map_err(|e| VaultError::InvalidInput(format!("failed to read password: {e}")))?;
    if value.is_empty() {
        return Err(VaultError::InvalidInput(
            "master password must not be empty".to_string(),
        ));
    }
    Ok(SecretString::from(value))
}

fn no_source() -> VaultError {
    VaultError::InvalidInput(format!(
        "no master password: set {PASSWORD_ENV_VAR} or run in a terminal"
    ))
}

/// The master password from `CREDVAULT_PASSWORD`, else a hidden TTY prompt.
pub fn read_master_password() -> Result<SecretString, VaultError> {
    if let Some(password) = from_env() {
        return Ok(password);
    }
    if !std::io::stdin().is_terminal() {
        return Err(no_source());
    }
    read_hidden("Master password")
}

/// Like [`read_master_password`], but an interactive entry must be typed
/// twice. Used when creating a vault.
pub fn read_new_master_password() -> Result<SecretString, VaultError> {
    if let Some(password) = from_env() {
        return Ok(password);
    }
    if !std::io::stdin().is_terminal() {
        return Err(no_source());
    }
    let first = read_hidden("New master password")?;
    let second = read_hidden("Confirm master password")?;
    if first.expose_secret() != second.expose_secret() {
        return Err(VaultError::InvalidInput(
            "passwords do not match".to_string(),
        ));
    }
    Ok(first)
}

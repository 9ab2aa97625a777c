// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.

pub mod credentials;
pub mod rotation;

use std::io::{BufRead, IsTerminal};

use credvault_config::CredvaultConfig;
use credvault_core::VaultError;
use credvault_vault::Vault;
use secrecy::SecretString;

/// Open the configured vault, refusing to create one implicitly.
pub(crate) async fn open_vault(config: &CredvaultConfig) -> Result<Vault, VaultError> {
    let path = config.vault.path_buf();
    if !Vault::exists(&path) {
        return Err(VaultError::InvalidInput(format!(
            "no vault at {}; run `credvault init` first",
            path.display()
        )));
    }
    let password = credvault_vault::read_master_password()?;
    Vault::open(&path, &password, &config.vault).await
}

/// Secret from `--secret`, `--secret-stdin`, or a hidden prompt when
/// `prompt` is set and stdin is a terminal.
pub(crate) fn read_secret(
    inline: Option<String>,
    from_stdin: bool,
    prompt: bool,
) -> Result<Option<SecretString>, VaultError> {
    if let Some(value) = inline {
        return Ok(Some(SecretString::from(value)));
    }
    if from_stdin {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| VaultError::InvalidInput(format!("failed to read stdin: {e}")))?;
        let value = line.trim_end_matches(['\r', '\n']).to_string();
        return Ok(Some(SecretString::from(value)));
    }
    if prompt && std::io::stdin().is_terminal() {
        let value = rpassword::prompt_password("Secret value (empty for none): ")
            .map_err(|e| VaultError::InvalidInput(format!("failed to read secret: {e}")))?;
        if !value.is_empty() {
            return Ok(Some(SecretString::from(value)));
        }
    }
    Ok(None)
}

/// Ask a yes/no question on stderr. Non-interactive sessions answer no.
pub(crate) fn confirm(question: &str) -> Result<bool, VaultError> {
    if !std::io::stdin().is_terminal() {
        return Ok(false);
    }
    eprint!("{question} [y/N] ");
    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| VaultError::InvalidInput(format!("failed to read answer: {e}")))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary vaults for tests.

use std::path::{Path, PathBuf};

use credvault_config::VaultConfig;
use credvault_core::VaultError;
use credvault_vault::Vault;
use secrecy::SecretString;
use tempfile::TempDir;

/// Master password every [`TestVault`] is opened with.
pub const TEST_PASSWORD: &str = "test-master-password";

/// A vault config whose Argon2id parameters derive in milliseconds.
pub fn fast_vault_config(path: &Path) -> VaultConfig {
    VaultConfig {
        path: path.display().to_string(),
        kdf_memory_cost: 1024,
        kdf_iterations: 1,
        kdf_parallelism: 1,
    }
}

/// An open vault backed by a file in a temp directory.
///
/// The directory lives as long as the `TestVault`.
pub struct TestVault {
    pub vault: Vault,
    pub config: VaultConfig,
    dir: TempDir,
}

impl TestVault {
    pub async fn new() -> Result<Self, VaultError> {
        let dir = TempDir::new().map_err(VaultError::store)?;
        let config = fast_vault_config(&dir.path().join("vault.db"));
        let vault = Vault::open(&config.path_buf(), &Self::password(), &config).await?;
        Ok(Self { vault, config, dir })
    }

    pub fn password() -> SecretString {
        SecretString::from(TEST_PASSWORD.to_string())
    }

    pub fn path(&self) -> PathBuf {
        self.config.path_buf()
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Close and reopen the same file, as a new process would.
    pub async fn reopen(self) -> Result<Self, VaultError> {
        let Self { vault, config, dir } = self;
        vault.close().await?;
        let vault = Vault::open(&config.path_buf(), &Self::password(), &config).await?;
        Ok(Self { vault, config, dir })
    }
}

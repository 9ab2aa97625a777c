// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id key derivation.
//!
//! Parameters are recorded in the vault when it is created, so a later
//! configuration change never locks an existing vault out.

use credvault_config::VaultConfig;
use credvault_core::VaultError;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl KdfParams {
    /// Parameters of vaults that predate recorded parameters.
    pub const LEGACY: KdfParams = KdfParams {
        memory_cost: 64 * 1024,
        iterations: 1,
        parallelism: 4,
    };

    pub fn to_json(&self) -> Result<Vec<u8>, VaultError> {
        serde_json::to_vec(self)
            .map_err(|e| VaultError::Internal(format!("failed to encode KDF parameters: {e}")))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, VaultError> {
        serde_json::from_slice(bytes)
            .map_err(|e| VaultError::Internal(format!("stored KDF parameters are malformed: {e}")))
    }

    /// Check the parameters against Argon2's bounds.
    pub fn to_argon2(&self) -> Result<argon2::Params, VaultError> {
        argon2::Params::new(self.memory_cost, self.iterations, self.parallelism, Some(32))
            .map_err(|e| VaultError::InvalidInput(format!("invalid Argon2id parameters: {e}")))
    }
}

impl From<&VaultConfig> for KdfParams {
    fn from(config: &VaultConfig) -> Self {
        Self {
            memory_cost: config.kdf_memory_cost,
            iterations: config.kdf_iterations,
            parallelism: config.kdf_parallelism,
        }
    }
}

/// Derive the 32-byte field key. The result zeroes itself on drop.
pub fn derive_key(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>, VaultError> {
    let argon_params = params.to_argon2()?;
    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon_params,
    );

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password, salt, key.as_mut())
        .map_err(|e| VaultError::Internal(format!("Argon2id key derivation failed: {e}")))?;
    Ok(key)
}

pub fn generate_salt() -> Result<[u8; SALT_LEN], VaultError> {
    crypto::random_bytes()
}

/// Interpret a stored salt. Anything but exactly 16 bytes cannot be the
/// salt this vault was created with, so opening must stop here.
pub fn parse_salt(stored: &[u8]) -> Result<[u8; SALT_LEN], VaultError> {
    stored.try_into().map_err(|_| VaultError::DecryptFailure)
}

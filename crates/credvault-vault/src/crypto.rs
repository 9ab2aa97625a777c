// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM field sealing.
//!
//! Blob layout: `nonce (12) || ciphertext || tag (16)`. Every [`seal`] draws a
//! fresh random nonce from the system CSPRNG; nonces are never derived or
//! counted.

use credvault_core::VaultError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Shortest blob that can possibly open: a nonce and a tag around empty plaintext.
pub const MIN_BLOB_LEN: usize = NONCE_LEN + TAG_LEN;

fn cipher_key(key: &[u8; 32]) -> Result<LessSafeKey, VaultError> {
    UnboundKey::new(&AES_256_GCM, key)
        .map(LessSafeKey::new)
        .map_err(|_| VaultError::Internal("failed to create AES-256-GCM key".to_string()))
}

/// Encrypt `plaintext`, returning the self-contained blob.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
    let cipher = cipher_key(key)?;
    let nonce_bytes: [u8; NONCE_LEN] = random_bytes()?;

    let mut blob = Vec::with_capacity(NONCE_LEN + plaintext.len() + TAG_LEN);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(plaintext);

    let mut in_out = blob.split_off(NONCE_LEN);
    cipher
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| VaultError::Internal("AES-256-GCM encryption failed".to_string()))?;
    blob.extend_from_slice(&in_out);
    Ok(blob)
}

/// Decrypt and authenticate a blob produced by [`seal`].
///
/// Truncation, a wrong key and tampering all fail with the same
/// [`VaultError::DecryptFailure`].
pub fn open(key: &[u8; 32], blob: &[u8]) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    if blob.len() < MIN_BLOB_LEN {
        return Err(VaultError::DecryptFailure);
    }
    let cipher = cipher_key(key).map_err(|_| VaultError::DecryptFailure)?;

    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let nonce =
        Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| VaultError::DecryptFailure)?;

    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let len = cipher
        .open_in_place(nonce, Aad::empty(), in_out.as_mut_slice())
        .map_err(|_| VaultError::DecryptFailure)?
        .len();
    in_out.truncate(len);
    Ok(in_out)
}

/// Fill an array from the system CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], VaultError> {
    let mut out = [0u8; N];
    SystemRandom::new()
        .fill(&mut out)
        .map_err(|_| VaultError::Internal("system random source failed".to_string()))?;
    Ok(out)
}

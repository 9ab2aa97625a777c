// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted credential vault.
//!
//! Secrets are sealed with AES-256-GCM under a key derived from the master
//! password with Argon2id, inside a SQLCipher file keyed by the same
//! password. The [`Vault`] type owns the field key and serializes writes.

pub mod crypto;
pub mod kdf;
pub mod prompt;
pub mod vault;

pub use kdf::KdfParams;
pub use prompt::{read_master_password, read_new_master_password};
pub use vault::Vault;

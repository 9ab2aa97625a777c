// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for credvault integration tests.
//!
//! - [`TestVault`] - a vault in a temp directory with cheap KDF parameters
//! - [`MockRotationPlugin`] - a scriptable rotation plugin

pub mod harness;
pub mod mock_plugin;

pub use harness::{TEST_PASSWORD, TestVault, fast_vault_config};
pub use mock_plugin::MockRotationPlugin;
